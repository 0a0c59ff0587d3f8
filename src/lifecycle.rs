//! Onroad/offroad lifecycle, engagement status and tick cadence.
//!
//! # States
//!
//! ```text
//!            started ↑
//!   OFFROAD ───────────▶ ONROAD
//!      ▲                   │
//!      └───────────────────┘
//!            started ↓
//! ```
//!
//! Entering ONROAD starts a new session: the session clock and grade
//! estimator are reset and session parameters are reloaded. Leaving it
//! disconnects the camera stream. The host is also told to change its tick
//! period: as fast as possible while onroad (the camera stream paces the
//! loop), [`OFFROAD_TICK_MS`] otherwise.

use std::time::Duration;

use log::{info, warn};
use onroad_common::Platform;
use onroad_common::config::OFFROAD_TICK_MS;

use crate::messages::AlertStatus;
use crate::params::{ParamStore, keys};
use crate::scene::{SceneSnapshot, UiStatus};
use crate::telemetry::{TelemetryMux, Topic};

/// Lifecycle transition detected on a tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    Onroad,
    Offroad,
}

/// Request to the host to change its tick period.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimerChange {
    /// Whether the UI is now offroad.
    pub offroad: bool,
    /// New tick period; zero means run continuously.
    pub period: Duration,
}

/// Tracks `started` across ticks for the session and timer edges.
#[derive(Debug, Default)]
pub struct Lifecycle {
    started_prev: bool,
    timer_started_prev: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update engagement status and handle a session edge.
    ///
    /// Returns the transition, if `started` changed since the previous call.
    pub fn update_status(
        &mut self,
        scene: &mut SceneSnapshot,
        mux: &TelemetryMux,
        params: &dyn ParamStore,
        platform: Platform,
        now: f64,
    ) -> Option<Transition> {
        if scene.started && mux.updated(Topic::ControlsState) {
            let controls = mux.values().controls_state;
            scene.status = match controls.alert_status {
                AlertStatus::UserPrompt => UiStatus::Warning,
                AlertStatus::Critical => UiStatus::Alert,
                AlertStatus::Normal if controls.enabled => UiStatus::Engaged,
                AlertStatus::Normal => UiStatus::Disengaged,
            };
            scene.flags.speed_limit_control = params.get_bool(keys::SPEED_LIMIT_CONTROL);
        }

        if scene.started == self.started_prev {
            return None;
        }
        self.started_prev = scene.started;

        if scene.started {
            start_session(scene, mux.frame(), params, platform, now);
            info!("onroad at frame {}", mux.frame());
            Some(Transition::Onroad)
        } else {
            info!("offroad at frame {}", mux.frame());
            Some(Transition::Offroad)
        }
    }

    /// Report a timer change when `started` flips or on the first tick.
    pub fn update_timer(&mut self, started: bool, frame: u64) -> Option<TimerChange> {
        if started == self.timer_started_prev && frame != 1 {
            return None;
        }
        self.timer_started_prev = started;
        Some(TimerChange {
            offroad: !started,
            period: tick_period(started),
        })
    }
}

/// Host tick period for the given lifecycle state.
pub const fn tick_period(started: bool) -> Duration {
    if started { Duration::ZERO } else { Duration::from_millis(OFFROAD_TICK_MS) }
}

/// Reset per-drive state and reload session parameters.
fn start_session(scene: &mut SceneSnapshot, frame: u64, params: &dyn ParamStore, platform: Platform, now: f64) {
    scene.status = UiStatus::Disengaged;
    scene.started_frame = frame;
    scene.session_init_time = now;
    scene.vehicle.grade.reset(now);

    let session = &mut scene.session;
    session.end_to_end = params.get_bool(keys::END_TO_END);
    session.laneless_mode = read_int(params, keys::LANELESS_MODE, session.laneless_mode);
    session.brake_percent_baseline = read_int(params, keys::FRICTION_BRAKE_PERCENT, session.brake_percent_baseline);
    session.measure_num_slots = read_int(params, keys::MEASURE_NUM_SLOTS, session.measure_num_slots);

    let previous = session.measure_slots.clone();
    session.measure_slots = (0..keys::MEASURE_SLOT_COUNT)
        .map(|i| {
            let fallback = previous.get(i).copied().unwrap_or_default();
            read_int(params, &keys::measure_slot(i), fallback)
        })
        .collect();

    session.wide_camera = platform.is_tici() && params.get_bool(keys::ENABLE_WIDE_CAMERA);
    session.speed_limit_perc_offset = params.get_bool(keys::SPEED_LIMIT_PERC_OFFSET);
    session.show_debug_ui = params.get_bool(keys::SHOW_DEBUG_UI);
    scene.flags.speed_limit_control = params.get_bool(keys::SPEED_LIMIT_CONTROL);
}

/// Integer parameter, keeping `previous` when it is missing or malformed.
fn read_int(params: &dyn ParamStore, key: &str, previous: i32) -> i32 {
    params.get_int(key).unwrap_or_else(|err| {
        warn!("{err}, keeping {previous}");
        previous
    })
}

// =============================================================================
// Tests
// =============================================================================
