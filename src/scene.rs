//! The scene snapshot: every piece of derived UI state.
//!
//! One [`SceneSnapshot`] exists for the life of the process. The aggregator
//! and lifecycle overwrite its fields in place once per tick; rendering and
//! the device controller only read it.
//!
//! # Layout
//!
//! ```text
//! SceneSnapshot
//! ├── lifecycle        started, ignition, status, session start
//! ├── geometry         lane lines, road edges, path, lead markers
//! ├── vehicle          brake/one-pedal fades, steering, jerk, RPM, grade
//! ├── radar / plans    lead tracking, lane width, follow costs
//! ├── device           light, motion sensors, CPU, panda
//! ├── gnss             satellites, accuracy, altitude, fix
//! └── config           feature flags and session parameters
//! ```

use glam::Vec2;
use heapless::Vec;
use onroad_common::config::{FADE_RATE, LANE_LINE_COUNT, LEAD_COUNT, ROAD_EDGE_COUNT};
use onroad_common::{Fade, FadeBounds, GradeEstimator, PolygonOutline};

use crate::messages::{CarState, ControlsState, PandaType};
use crate::params::keys::MEASURE_SLOT_COUNT;

// =============================================================================
// Status
// =============================================================================

/// Engagement state shown by the UI border.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UiStatus {
    #[default]
    Disengaged,
    Engaged,
    Warning,
    Alert,
}

// =============================================================================
// Grouped State
// =============================================================================

/// Projected road geometry, rebuilt on every model update.
#[derive(Clone, Debug, Default)]
pub struct RoadGeometry {
    pub lane_lines: [PolygonOutline; LANE_LINE_COUNT],
    pub lane_line_probs: [f32; LANE_LINE_COUNT],
    pub road_edges: [PolygonOutline; ROAD_EDGE_COUNT],
    pub road_edge_stds: [f32; ROAD_EDGE_COUNT],
    pub track: PolygonOutline,
    /// Screen position of each confident lead; `None` when not drawn.
    pub leads: [Option<Vec2>; LEAD_COUNT],
}

/// Metrics derived from the vehicle state topic.
#[derive(Clone, Debug)]
pub struct VehicleMetrics {
    /// Brake-light indicator opacity, `[0, 1]`.
    pub brake_indicator: Fade,
    /// One-pedal indicator fade, `[-1, 1]`.
    pub one_pedal: Fade,
    pub brake_percent: f32,
    pub steer_override: bool,
    pub angle_steers: f32,
    /// Desired steering angle (PID error plus current angle).
    pub angle_steers_des: f32,
    pub steering_torque_eps: f32,
    /// Engine speed rounded to the nearest 100 RPM.
    pub engine_rpm: i32,
    pub a_ego: f32,
    pub j_ego: f32,
    pub v_cruise: f32,
    pub grade: GradeEstimator,
    /// Time of the previous vehicle state update, for jerk.
    pub last_update_t: f64,
}

impl VehicleMetrics {
    fn new(now: f64) -> Self {
        Self {
            brake_indicator: Fade::new(FadeBounds::Unit, FADE_RATE, now),
            one_pedal: Fade::new(FadeBounds::Signed, FADE_RATE, now),
            brake_percent: 0.0,
            steer_override: false,
            angle_steers: 0.0,
            angle_steers_des: 0.0,
            steering_torque_eps: 0.0,
            engine_rpm: 0,
            a_ego: 0.0,
            j_ego: 0.0,
            v_cruise: 0.0,
            grade: GradeEstimator::new(now),
            last_update_t: now,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct RadarLeadStatus {
    pub v_rel: f32,
    pub d_rel: f32,
    pub v_lead: f32,
    pub status: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PlanStatus {
    pub lane_width: f32,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub laneless_mode_status: bool,
    pub desired_follow_distance: f32,
    pub follow_distance_cost: f32,
    pub follow_accel_cost: f32,
    pub stopping_distance: f32,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct DeviceStats {
    /// Ambient light fraction, `[0, 1]`.
    pub light_sensor: f32,
    /// Accelerometer z reading, only tracked while not started.
    pub accel_sensor: f32,
    /// Gyroscope y reading, only tracked while not started.
    pub gyro_sensor: f32,
    pub cpu_temp: f32,
    pub cpu_perc: f32,
    pub panda_type: PandaType,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct GnssStatus {
    pub satellite_count: u16,
    pub accuracy: f32,
    pub altitude: f32,
    pub gps_ok: bool,
}

/// Toggles refreshed periodically while running.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FeatureFlags {
    pub one_pedal_mode: bool,
    pub disable_disengage_on_gas: bool,
    pub one_pedal_engage_on_gas: bool,
    pub one_pedal_pause_steering: bool,
    pub is_metric: bool,
    pub speed_limit_control: bool,
}

/// Parameters loaded once per drive, on the onroad transition.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SessionConfig {
    pub end_to_end: bool,
    pub laneless_mode: i32,
    pub brake_percent_baseline: i32,
    pub measure_num_slots: i32,
    pub measure_slots: Vec<i32, MEASURE_SLOT_COUNT>,
    pub wide_camera: bool,
    pub speed_limit_perc_offset: bool,
    pub show_debug_ui: bool,
}

// =============================================================================
// Snapshot
// =============================================================================

/// All derived UI state.
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    pub started: bool,
    pub ignition: bool,
    pub status: UiStatus,
    /// Frame of the last onroad transition.
    pub started_frame: u64,
    /// Time of the last onroad transition (s).
    pub session_init_time: f64,
    /// Set on calibration, cleared when the camera stream reconnects.
    pub world_objects_visible: bool,
    pub engageable: bool,
    pub dm_active: bool,
    pub longitudinal_control: bool,

    pub geometry: RoadGeometry,
    pub vehicle: VehicleMetrics,
    pub radar_lead: RadarLeadStatus,
    pub plan: PlanStatus,
    pub device: DeviceStats,
    pub gnss: GnssStatus,
    pub flags: FeatureFlags,
    pub session: SessionConfig,

    /// Latest decoded records kept for rendering.
    pub car_state: CarState,
    pub controls_state: ControlsState,
}

impl SceneSnapshot {
    /// Create an offroad snapshot whose clocks start at `now`.
    pub fn new(now: f64) -> Self {
        Self {
            started: false,
            ignition: false,
            status: UiStatus::Disengaged,
            started_frame: 0,
            session_init_time: now,
            world_objects_visible: false,
            engageable: false,
            dm_active: false,
            longitudinal_control: false,
            geometry: RoadGeometry::default(),
            vehicle: VehicleMetrics::new(now),
            radar_lead: RadarLeadStatus::default(),
            plan: PlanStatus::default(),
            device: DeviceStats::default(),
            gnss: GnssStatus::default(),
            flags: FeatureFlags::default(),
            session: SessionConfig::default(),
            car_state: CarState::default(),
            controls_state: ControlsState::default(),
        }
    }

    /// Published road grade in percent, once enough distance is covered.
    pub fn percent_grade(&self) -> Option<f32> {
        self.vehicle.grade.percent_grade()
    }
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot_is_offroad_and_hidden() {
        let scene = SceneSnapshot::new(12.5);
        assert!(!scene.started);
        assert!(!scene.world_objects_visible, "nothing drawn before calibration");
        assert_eq!(scene.status, UiStatus::Disengaged);
        assert_eq!(scene.session_init_time, 12.5);
        assert_eq!(scene.percent_grade(), None);
    }

    #[test]
    fn test_fades_start_at_rest() {
        let scene = SceneSnapshot::default();
        assert_eq!(scene.vehicle.brake_indicator.value(), 0.0);
        assert_eq!(scene.vehicle.one_pedal.value(), -1.0);
        assert!(scene.geometry.leads.iter().all(Option::is_none));
    }
}
