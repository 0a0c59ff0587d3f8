//! Scene aggregator: folds one tick of telemetry into the scene snapshot.
//!
//! Each topic is handled independently and only when it updated on this tick.
//! The exceptions are:
//!
//! - `started` is recomputed every tick from the latest device state and
//!   ignition, whether or not anything updated
//! - engageability and driver-monitoring flags are sampled at 2 Hz from the
//!   latest values
//! - calibration is applied before the model in the same tick, so a tick that
//!   carries both projects with the new calibration
//!
//! # Staleness
//!
//! If the safety controller has been silent for more than
//! [`PANDA_STALE_TICKS`], its type is forced to [`PandaType::Unknown`] rather
//! than left at the last reported value.

use log::debug;
use onroad_common::config::{
    LANE_LINE_COUNT,
    LANE_LINE_WIDTH_SCALE,
    LEAD_COUNT,
    PATH_HALF_WIDTH,
    PATH_HEIGHT,
    ROAD_EDGE_COUNT,
    ROAD_EDGE_HALF_WIDTH,
    UI_FREQ,
};
use onroad_common::path::{draw_cutoff, lead_cutoff};
use onroad_common::thresholds::{ONE_PEDAL_MAX_CRUISE, ONE_PEDAL_SESSION_DELAY_S, PANDA_STALE_TICKS, is_confident_lead};
use onroad_common::{CalibrationTransform, Platform, PolygonOutline, Projector, brightness};

use crate::messages::{CarState, DeviceState, ModelV2, PandaType, SensorEvent, UbloxGnss};
use crate::params::{ParamStore, keys};
use crate::scene::{SceneSnapshot, UiStatus};
use crate::telemetry::{TelemetryMux, Topic};

/// Ticks between engageability / driver-monitoring samples (2 Hz).
const ENGAGEABLE_INTERVAL: u64 = (UI_FREQ / 2) as u64;

/// Ticks between feature-flag reads (1 Hz).
const FEATURE_FLAG_INTERVAL: u64 = UI_FREQ as u64;

/// Ticks between unit-system reads (every 5 s).
const METRIC_INTERVAL: u64 = 5 * UI_FREQ as u64;

/// Owner of the scene snapshot and the projector that fills its geometry.
#[derive(Debug)]
pub struct SceneAggregator {
    scene: SceneSnapshot,
    projector: Projector,
    platform: Platform,
}

impl SceneAggregator {
    pub fn new(platform: Platform, now: f64) -> Self {
        Self {
            scene: SceneSnapshot::new(now),
            projector: Projector::new(platform),
            platform,
        }
    }

    /// Read-only view for rendering and the device controller.
    #[inline]
    pub const fn scene(&self) -> &SceneSnapshot {
        &self.scene
    }

    #[inline]
    pub(crate) const fn scene_mut(&mut self) -> &mut SceneSnapshot {
        &mut self.scene
    }

    #[inline]
    pub const fn projector(&self) -> &Projector {
        &self.projector
    }

    #[inline]
    pub(crate) const fn projector_mut(&mut self) -> &mut Projector {
        &mut self.projector
    }

    #[inline]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    // =========================================================================
    // Periodic Parameters
    // =========================================================================

    /// Refresh toggles that are polled on a fixed tick cadence.
    ///
    /// Runs before the tick's telemetry poll, so `frame` is the previous tick.
    pub fn update_params(&mut self, frame: u64, params: &dyn ParamStore) {
        let flags = &mut self.scene.flags;
        if frame % FEATURE_FLAG_INTERVAL == 0 {
            flags.one_pedal_mode = params.get_bool(keys::ONE_PEDAL_MODE);
            flags.disable_disengage_on_gas = params.get_bool(keys::DISABLE_DISENGAGE_ON_GAS);
            flags.one_pedal_engage_on_gas = params.get_bool(keys::ONE_PEDAL_ENGAGE_ON_GAS);
            flags.one_pedal_pause_steering = params.get_bool(keys::ONE_PEDAL_PAUSE_STEERING);
        }
        if frame % METRIC_INTERVAL == 0 {
            flags.is_metric = params.get_bool(keys::IS_METRIC);
        }
    }

    // =========================================================================
    // Per-Tick Update
    // =========================================================================

    /// Fold this tick's updated topics into the scene.
    pub fn update_state(&mut self, mux: &TelemetryMux, now: f64) {
        let values = mux.values();

        if mux.frame() % ENGAGEABLE_INTERVAL == 0 {
            self.scene.engageable = values.controls_state.engageable;
            self.scene.dm_active = values.driver_monitoring.is_active_mode;
        }

        if self.scene.started && mux.updated(Topic::ControlsState) {
            let controls = values.controls_state;
            self.scene.controls_state = controls;
            self.scene.car_state = values.car_state;
            self.scene.vehicle.v_cruise = controls.v_cruise;
            self.scene.vehicle.angle_steers_des = controls.angle_error + values.car_state.steering_angle_deg;
        }

        if mux.updated(Topic::CarState) {
            self.update_car_state(&values.car_state, now);
        }

        if mux.updated(Topic::RadarState) {
            let lead = values.radar_state.lead_one;
            let radar = &mut self.scene.radar_lead;
            radar.v_rel = lead.v_rel;
            radar.d_rel = lead.d_rel;
            radar.v_lead = lead.v_lead;
            radar.status = lead.status;
        }

        if mux.updated(Topic::LiveCalibration) {
            let [roll, pitch, yaw] = values.live_calibration.rpy;
            self.projector.set_calibration(CalibrationTransform::from_rpy(roll, pitch, yaw));
            self.scene.world_objects_visible = true;
        }

        if mux.updated(Topic::ModelV2) && self.scene.world_objects_visible {
            self.update_model(&values.model);
            self.update_leads(&values.model);
        }

        if mux.updated(Topic::PandaState) {
            let panda = values.panda_state;
            self.scene.device.panda_type = panda.panda_type;
            self.scene.ignition = panda.ignition_line || panda.ignition_can;
        } else if mux.ticks_since(Topic::PandaState) > PANDA_STALE_TICKS {
            self.scene.device.panda_type = PandaType::Unknown;
        }

        if mux.updated(Topic::CarParams) {
            self.scene.longitudinal_control = values.car_params.openpilot_longitudinal_control;
        }

        if mux.updated(Topic::SensorEvents) && !self.scene.started {
            self.update_motion_sensors(&values.sensor_events);
        }

        if mux.updated(Topic::RoadCameraState) {
            let camera = values.road_camera_state;
            self.scene.device.light_sensor = brightness::light_from_exposure(camera.gain, camera.integ_lines, self.platform);
        }

        self.scene.started = values.device_state.started && self.scene.ignition;

        if mux.updated(Topic::DeviceState) {
            self.update_device_stats(&values.device_state);
        }

        if mux.updated(Topic::UbloxGnss)
            && let UbloxGnss::MeasurementReport { num_meas } = values.ublox_gnss
        {
            self.scene.gnss.satellite_count = num_meas;
        }
        if mux.updated(Topic::GpsLocationExternal) {
            self.scene.gnss.accuracy = values.gps_location.accuracy;
            self.scene.gnss.altitude = values.gps_location.altitude;
        }
        if mux.updated(Topic::LiveLocationKalman) {
            self.scene.gnss.gps_ok = values.live_location.gps_ok;
        }

        if mux.updated(Topic::LateralPlan) {
            let lateral = values.lateral_plan;
            let plan = &mut self.scene.plan;
            plan.lane_width = lateral.lane_width;
            plan.d_prob = lateral.d_prob;
            plan.l_prob = lateral.l_prob;
            plan.r_prob = lateral.r_prob;
            plan.laneless_mode_status = lateral.laneless_mode;
        }

        if mux.updated(Topic::LongitudinalPlan) {
            let longitudinal = values.longitudinal_plan;
            let plan = &mut self.scene.plan;
            plan.desired_follow_distance = longitudinal.desired_follow_distance;
            plan.follow_distance_cost = longitudinal.lead_dist_cost;
            plan.follow_accel_cost = longitudinal.lead_accel_cost;
            plan.stopping_distance = longitudinal.stopping_distance;
        }
    }

    // =========================================================================
    // Topic Handlers
    // =========================================================================

    fn update_car_state(&mut self, car: &CarState, now: f64) {
        let one_pedal_capable = self.one_pedal_condition(car);
        let session_age = now - self.scene.session_init_time;
        let vehicle = &mut self.scene.vehicle;

        vehicle.brake_percent = car.friction_brake_percent;
        vehicle.brake_indicator.update(car.friction_brake_percent > 0.0, now);

        if session_age > ONE_PEDAL_SESSION_DELAY_S {
            vehicle.one_pedal.update(one_pedal_capable, now);
        } else {
            vehicle.one_pedal.touch(now);
        }

        vehicle.steer_override = car.steering_pressed;
        vehicle.angle_steers = car.steering_angle_deg;
        vehicle.engine_rpm = round_rpm(car.engine_rpm);
        vehicle.steering_torque_eps = car.steering_torque_eps;

        let dt = (now - vehicle.last_update_t) as f32;
        vehicle.j_ego = if dt > 0.0 { (car.a_ego - vehicle.a_ego) / dt } else { 0.0 };
        vehicle.a_ego = car.a_ego;
        vehicle.last_update_t = now;

        vehicle.grade.update(car.v_ego, self.scene.gnss.altitude, now);
    }

    /// Whether the one-pedal indicator should fade in.
    fn one_pedal_condition(&self, car: &CarState) -> bool {
        let flags = &self.scene.flags;
        let disengaged_and_slow = self.scene.status == UiStatus::Disengaged
            && self.scene.controls_state.v_cruise < ONE_PEDAL_MAX_CRUISE
            && (flags.one_pedal_mode || flags.disable_disengage_on_gas);

        car.one_pedal_mode_active || car.coast_one_pedal_mode_active || disengaged_and_slow
    }

    fn update_model(&mut self, model: &ModelV2) {
        let projector = &self.projector;
        let geometry = &mut self.scene.geometry;

        let max_distance = draw_cutoff(&model.position);
        let lane_idx = model.lane_lines[0].truncation_index(max_distance);

        for i in 0..LANE_LINE_COUNT {
            let prob = model.lane_line_probs[i];
            geometry.lane_line_probs[i] = prob;
            geometry.lane_lines[i] =
                PolygonOutline::build(projector, &model.lane_lines[i], LANE_LINE_WIDTH_SCALE * prob, 0.0, lane_idx);
        }

        for i in 0..ROAD_EDGE_COUNT {
            geometry.road_edge_stds[i] = model.road_edge_stds[i];
            geometry.road_edges[i] =
                PolygonOutline::build(projector, &model.road_edges[i], ROAD_EDGE_HALF_WIDTH, 0.0, lane_idx);
        }

        let lead = model.leads[0];
        let path_distance = if is_confident_lead(lead.prob) {
            lead_cutoff(max_distance, lead.x)
        } else {
            max_distance
        };
        let path_idx = model.position.truncation_index(path_distance);
        geometry.track = PolygonOutline::build(projector, &model.position, PATH_HALF_WIDTH, PATH_HEIGHT, path_idx);
    }

    fn update_leads(&mut self, model: &ModelV2) {
        for i in 0..LEAD_COUNT {
            let lead = model.leads[i];
            self.scene.geometry.leads[i] = if is_confident_lead(lead.prob) {
                let z = model.position.z[model.position.truncation_index(lead.x)];
                let projection = self.projector.project(glam::Vec3::new(lead.x, lead.y, z + PATH_HEIGHT));
                projection.visible.then_some(projection.vertex)
            } else {
                None
            };
        }
    }

    fn update_motion_sensors(&mut self, events: &[SensorEvent]) {
        for event in events {
            match event {
                SensorEvent::Acceleration(v) => {
                    if let Some(&z) = v.get(2) {
                        self.scene.device.accel_sensor = z;
                    }
                }
                SensorEvent::GyroUncalibrated(v) => {
                    if let Some(&y) = v.get(1) {
                        self.scene.device.gyro_sensor = y;
                    }
                }
                SensorEvent::Other => {}
            }
        }
    }

    fn update_device_stats(&mut self, device: &DeviceState) {
        let stats = &mut self.scene.device;
        if let Some(&temp) = device.cpu_temp_c.first() {
            stats.cpu_temp = temp;
        } else {
            debug!("deviceState without CPU temperature");
        }

        let cores = device.cpu_usage_percent.len();
        let total: f32 = device.cpu_usage_percent.iter().sum();
        stats.cpu_perc = if cores > 1 { total / cores as f32 } else { total };
    }
}

/// Engine speed rounded to the nearest 100 RPM.
fn round_rpm(rpm: f32) -> i32 {
    (rpm / 100.0).round() as i32 * 100
}

// =============================================================================
// Tests
// =============================================================================
