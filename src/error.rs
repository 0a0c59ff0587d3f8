//! Error types for configuration reads.

use std::num::ParseIntError;

use thiserror::Error;

/// Failure to read a typed value from the configuration store.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("param {key} is not set")]
    Missing { key: String },

    #[error("param {key} has invalid value {value:?}")]
    Invalid {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}
