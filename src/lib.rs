// Crate-level lints: numeric conversions between sensor units and pixels are pervasive
#![allow(clippy::cast_possible_truncation)] // f32->i32 for RPM and brightness
#![allow(clippy::cast_precision_loss)] // u32/u64->f32 for exposure and timings
#![allow(clippy::cast_sign_loss)] // non-negative f32->u32
#![allow(clippy::struct_excessive_bools)] // scene flags mirror the bus records
#![allow(clippy::module_name_repetitions)]

//! Onroad UI state pipeline.
//!
//! Turns the decoded telemetry bus into a single [`SceneSnapshot`] per tick:
//! road geometry projected to screen space, vehicle metrics with smoothed
//! indicators, engagement status, the onroad/offroad session lifecycle, and
//! display brightness/wakefulness control.
//!
//! # Architecture
//!
//! ```text
//!   MessageSource ──▶ TelemetryMux ──▶ SceneAggregator ──▶ SceneSnapshot
//!                                            │                  │
//!   ParamStore ──────────────────────────────┤                  ├──▶ Device ──▶ Hardware
//!                                            ▼                  │
//!                                       Lifecycle ──▶ VisionStreams
//! ```
//!
//! [`UiState`] drives the top row once per tick; [`Device`] runs at
//! [`UI_FREQ`](onroad_common::config::UI_FREQ) against the resulting scene.
//! The math that does not need `std` (projection, path outlines, fades,
//! grade, brightness curve, tap detection) lives in `onroad_common`.
//!
//! # Modules
//!
//! - [`telemetry`] / [`messages`]: topic bookkeeping and decoded records
//! - [`aggregator`] / [`scene`]: per-topic scene updates
//! - [`lifecycle`]: status, session start, tick cadence
//! - [`vision`]: camera stream selection and connect back-off
//! - [`device`] / [`hardware`]: backlight and display power
//! - [`params`] / [`error`]: runtime configuration
//! - [`profiling`]: host loop timing
//! - [`ui`]: the tick facade

pub mod aggregator;
pub mod device;
pub mod error;
pub mod hardware;
pub mod lifecycle;
pub mod messages;
pub mod params;
pub mod profiling;
pub mod scene;
pub mod telemetry;
pub mod ui;
pub mod vision;

pub use aggregator::SceneAggregator;
pub use device::Device;
pub use error::ParamError;
pub use hardware::Hardware;
pub use lifecycle::{Lifecycle, TimerChange, Transition};
pub use messages::Message;
pub use params::{MemoryParams, ParamStore};
pub use profiling::TickMetrics;
pub use scene::{SceneSnapshot, UiStatus};
pub use telemetry::{MessageSource, TelemetryMux, Topic};
pub use ui::{TickReport, UiState};
pub use vision::{StreamKind, VisionClient, VisionFrame, VisionStreams};
