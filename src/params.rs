//! Configuration store interface.
//!
//! Feature toggles and session parameters live in an external key-value store.
//! The pipeline only reads it, through [`ParamStore`]. Values are strings; a
//! boolean is set when its value is exactly `"1"`.
//!
//! # Keys
//!
//! | Key | Type | Read |
//! |-----|------|------|
//! | `IsMetric` | bool | every `5 × UI_FREQ` ticks |
//! | `OnePedalMode`, `DisableDisengageOnGas`, ... | bool | every `UI_FREQ` ticks |
//! | `EndToEndToggle`, `LanelessMode`, ... | mixed | on the onroad transition |

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ParamError;

// =============================================================================
// Keys
// =============================================================================

pub mod keys {
    pub const IS_METRIC: &str = "IsMetric";

    pub const ONE_PEDAL_MODE: &str = "OnePedalMode";
    pub const DISABLE_DISENGAGE_ON_GAS: &str = "DisableDisengageOnGas";
    pub const ONE_PEDAL_ENGAGE_ON_GAS: &str = "OnePedalModeEngageOnGas";
    pub const ONE_PEDAL_PAUSE_STEERING: &str = "OnePedalPauseBlinkerSteering";

    pub const END_TO_END: &str = "EndToEndToggle";
    pub const LANELESS_MODE: &str = "LanelessMode";
    pub const FRICTION_BRAKE_PERCENT: &str = "FrictionBrakePercent";
    pub const MEASURE_NUM_SLOTS: &str = "MeasureNumSlots";
    pub const ENABLE_WIDE_CAMERA: &str = "EnableWideCamera";
    pub const SPEED_LIMIT_CONTROL: &str = "SpeedLimitControl";
    pub const SPEED_LIMIT_PERC_OFFSET: &str = "SpeedLimitPercOffset";
    pub const SHOW_DEBUG_UI: &str = "ShowDebugUI";

    /// Number of measurement slot keys (`MeasureSlot00` .. `MeasureSlot09`).
    pub const MEASURE_SLOT_COUNT: usize = 10;

    /// Key for measurement slot `i`.
    pub fn measure_slot(i: usize) -> String {
        format!("MeasureSlot{i:02}")
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Read access to the configuration store.
pub trait ParamStore {
    /// Raw value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// `true` only when `key` is set to `"1"`.
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.trim() == "1")
    }

    /// Integer value of `key`.
    fn get_int(&self, key: &str) -> Result<i32, ParamError> {
        let value = self.get(key).ok_or_else(|| ParamError::Missing { key: key.to_owned() })?;
        value.trim().parse().map_err(|source| ParamError::Invalid {
            key: key.to_owned(),
            value,
            source,
        })
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store used by the replay host and tests.
///
/// Interior mutability lets a host flip toggles while the pipeline holds a
/// shared reference.
#[derive(Debug, Default)]
pub struct MemoryParams {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.put(key, value);
        self
    }

    /// Set `key` to `value`.
    pub fn put(&self, key: &str, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_owned(), value.into());
        }
    }

    /// Set a boolean toggle.
    pub fn put_bool(&self, key: &str, value: bool) {
        self.put(key, if value { "1" } else { "0" });
    }

    /// Remove `key`.
    pub fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

impl ParamStore for MemoryParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
