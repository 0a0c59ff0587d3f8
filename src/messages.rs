//! Decoded telemetry records.
//!
//! These are the already-decoded values the message bus hands to the pipeline.
//! Only the fields the UI reads are carried; the wire format never leaks past
//! the bus. Every record is `Default` so the multiplexer can hold a value for
//! each topic before its first message.

use onroad_common::Trajectory;
use onroad_common::config::{LANE_LINE_COUNT, LEAD_COUNT, ROAD_EDGE_COUNT};

use crate::telemetry::Topic;

// =============================================================================
// Model
// =============================================================================

/// First predicted position of a lead vehicle.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LeadPrediction {
    pub prob: f32,
    /// Forward distance (m).
    pub x: f32,
    /// Lateral offset (m).
    pub y: f32,
}

/// Driving model output.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ModelV2 {
    pub position: Trajectory,
    pub lane_lines: [Trajectory; LANE_LINE_COUNT],
    pub lane_line_probs: [f32; LANE_LINE_COUNT],
    pub road_edges: [Trajectory; ROAD_EDGE_COUNT],
    pub road_edge_stds: [f32; ROAD_EDGE_COUNT],
    pub leads: [LeadPrediction; LEAD_COUNT],
}

// =============================================================================
// Controls
// =============================================================================

/// Severity of the alert currently shown by the controls process.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ControlsState {
    pub enabled: bool,
    pub engageable: bool,
    pub alert_status: AlertStatus,
    /// Cruise set speed.
    pub v_cruise: f32,
    /// Lateral PID angle error (deg).
    pub angle_error: f32,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LiveCalibration {
    /// Roll, pitch, yaw (rad).
    pub rpy: [f32; 3],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DriverMonitoringState {
    pub is_active_mode: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CarParams {
    pub openpilot_longitudinal_control: bool,
}

// =============================================================================
// Vehicle
// =============================================================================

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct CarState {
    pub v_ego: f32,
    pub a_ego: f32,
    pub steering_angle_deg: f32,
    pub steering_pressed: bool,
    pub steering_torque_eps: f32,
    pub friction_brake_percent: f32,
    pub engine_rpm: f32,
    pub one_pedal_mode_active: bool,
    pub coast_one_pedal_mode_active: bool,
}

/// Lead vehicle as tracked by radar.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct RadarLead {
    pub d_rel: f32,
    pub v_rel: f32,
    pub v_lead: f32,
    pub status: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct RadarState {
    pub lead_one: RadarLead,
}

// =============================================================================
// Device
// =============================================================================

#[derive(Clone, PartialEq, Debug, Default)]
pub struct DeviceState {
    pub started: bool,
    pub cpu_temp_c: Vec<f32>,
    pub cpu_usage_percent: Vec<f32>,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct RoadCameraState {
    pub gain: f32,
    pub integ_lines: u32,
}

/// Safety-controller hardware variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PandaType {
    #[default]
    Unknown,
    WhitePanda,
    GreyPanda,
    BlackPanda,
    Pedal,
    Uno,
    Dos,
    RedPanda,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PandaState {
    pub panda_type: PandaType,
    pub ignition_line: bool,
    pub ignition_can: bool,
}

/// One reading from the device's motion sensors.
///
/// Vectors can arrive empty; consumers skip those.
#[derive(Clone, PartialEq, Debug)]
pub enum SensorEvent {
    Acceleration(Vec<f32>),
    GyroUncalibrated(Vec<f32>),
    Other,
}

// =============================================================================
// Localization
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LiveLocationKalman {
    pub gps_ok: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UbloxGnss {
    MeasurementReport {
        num_meas: u16,
    },
    #[default]
    Other,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct GpsLocationExternal {
    pub accuracy: f32,
    pub altitude: f32,
}

// =============================================================================
// Planning
// =============================================================================

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LongitudinalPlan {
    pub desired_follow_distance: f32,
    pub lead_dist_cost: f32,
    pub lead_accel_cost: f32,
    pub stopping_distance: f32,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LateralPlan {
    pub lane_width: f32,
    pub d_prob: f32,
    pub l_prob: f32,
    pub r_prob: f32,
    pub laneless_mode: bool,
}

// =============================================================================
// Message
// =============================================================================

/// One decoded record on one topic.
#[derive(Clone, PartialEq, Debug)]
pub enum Message {
    ModelV2(Box<ModelV2>),
    ControlsState(ControlsState),
    LiveCalibration(LiveCalibration),
    DeviceState(DeviceState),
    RoadCameraState(RoadCameraState),
    PandaState(PandaState),
    CarParams(CarParams),
    DriverMonitoringState(DriverMonitoringState),
    SensorEvents(Vec<SensorEvent>),
    CarState(CarState),
    RadarState(RadarState),
    LiveLocationKalman(LiveLocationKalman),
    UbloxGnss(UbloxGnss),
    GpsLocationExternal(GpsLocationExternal),
    LongitudinalPlan(LongitudinalPlan),
    LateralPlan(LateralPlan),
}

impl Message {
    /// Topic this record arrived on.
    pub const fn topic(&self) -> Topic {
        match self {
            Self::ModelV2(_) => Topic::ModelV2,
            Self::ControlsState(_) => Topic::ControlsState,
            Self::LiveCalibration(_) => Topic::LiveCalibration,
            Self::DeviceState(_) => Topic::DeviceState,
            Self::RoadCameraState(_) => Topic::RoadCameraState,
            Self::PandaState(_) => Topic::PandaState,
            Self::CarParams(_) => Topic::CarParams,
            Self::DriverMonitoringState(_) => Topic::DriverMonitoringState,
            Self::SensorEvents(_) => Topic::SensorEvents,
            Self::CarState(_) => Topic::CarState,
            Self::RadarState(_) => Topic::RadarState,
            Self::LiveLocationKalman(_) => Topic::LiveLocationKalman,
            Self::UbloxGnss(_) => Topic::UbloxGnss,
            Self::GpsLocationExternal(_) => Topic::GpsLocationExternal,
            Self::LongitudinalPlan(_) => Topic::LongitudinalPlan,
            Self::LateralPlan(_) => Topic::LateralPlan,
        }
    }
}
