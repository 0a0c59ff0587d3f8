//! Shared projection, path and estimator logic for the onroad UI.
//!
//! This crate holds the pure, platform-agnostic part of the perception-to-screen
//! pipeline. Everything here is driven by explicit timestamps and inputs, so it
//! runs the same on the device and in host tests:
//!
//! - [`config`]: Tick rate, trajectory sizing, camera and timing constants
//! - [`thresholds`]: Decision thresholds (lead confidence, tap detection, one-pedal)
//! - [`platform`]: Hardware platform variants that select camera parameters
//! - [`geometry`]: Calibration rotation, camera intrinsics and screen projection
//! - [`path`]: Trajectory truncation and closed-ribbon polygon outlines
//! - [`fade`]: Time-driven bounded fades
//! - [`grade`]: Rolling road-grade estimator
//! - [`filter`]: First-order low-pass filter
//! - [`brightness`]: Ambient-light to backlight curve
//! - [`wakefulness`]: Display wake countdown and tap detection
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` outside of tests. Float helpers that live in `std`
//! go through `micromath`, and `glam` is built with its `libm` backend.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod brightness;
pub mod config;
pub mod fade;
pub mod filter;
pub mod geometry;
pub mod grade;
pub mod path;
pub mod platform;
pub mod thresholds;
pub mod wakefulness;

// Re-export commonly used items
pub use brightness::Backlight;
pub use fade::{Fade, FadeBounds};
pub use filter::FirstOrderFilter;
pub use geometry::{CalibrationTransform, CameraIntrinsics, Projection, Projector, ScreenTransform};
pub use grade::GradeEstimator;
pub use path::{PolygonOutline, Trajectory};
pub use platform::Platform;
pub use wakefulness::{WakeInputs, Wakefulness};
