// Crate-level lints: synthetic signal generation is all float math
#![allow(clippy::cast_possible_truncation)] // f32->u32 for exposure lines
#![allow(clippy::cast_precision_loss)] // u32/usize->f32 for trajectory sampling
#![allow(clippy::cast_sign_loss)] // non-negative f32->u32
#![allow(clippy::too_many_lines)] // main() is long but linear

//! Replay host for the onroad UI pipeline.
//!
//! Drives [`UiState`] and [`Device`] from a synthetic drive so the whole
//! pipeline can be exercised without a car, a bus, or a camera:
//!
//! ```text
//!   0s ─── parked ───┬─── driving ───────────────┬─── parked ─── exit
//!        (tap at 1s) │                           │
//!               ignition on                 ignition off
//! ```
//!
//! The drive length in seconds is set with `--drive-secs`. Set
//! `RUST_LOG=debug` to see brightness and display power changes.
//!
//! # Loop
//!
//! The host follows the cadence the pipeline asks for: a fixed period while
//! parked, back-to-back ticks while driving (the camera stream blocks on each
//! frame, which paces the loop), and a back-off sleep while the stream is
//! still coming up. The display controller runs at its own fixed rate.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, info};
use onroad_common::config::{TRAJECTORY_SIZE, UI_FREQ};
use onroad_common::{Platform, Trajectory};
use onroad_ui::lifecycle::tick_period;
use onroad_ui::messages::{
    AlertStatus,
    CarParams,
    CarState,
    ControlsState,
    DeviceState,
    DriverMonitoringState,
    GpsLocationExternal,
    LateralPlan,
    LeadPrediction,
    LiveCalibration,
    LiveLocationKalman,
    LongitudinalPlan,
    ModelV2,
    PandaState,
    PandaType,
    RadarLead,
    RadarState,
    RoadCameraState,
    SensorEvent,
    UbloxGnss,
};
use onroad_ui::params::keys;
use onroad_ui::{
    Device,
    Hardware,
    MemoryParams,
    Message,
    MessageSource,
    TickMetrics,
    UiState,
    VisionClient,
    VisionFrame,
};

// =============================================================================
// Replay Configuration
// =============================================================================

/// Parked time before ignition (s).
const PARKED_HEAD_S: f32 = 3.0;

/// Default drive length (s).
const DEFAULT_DRIVE_S: f32 = 20.0;

/// Parked time after ignition off (s).
const PARKED_TAIL_S: f32 = 3.0;

/// When the parked device gets tapped (s).
const TAP_AT_S: f32 = 1.0;

/// Camera frame period.
const FRAME_PERIOD: Duration = Duration::from_millis(1000 / UI_FREQ as u64);

/// Display controller period.
const DEVICE_PERIOD: Duration = Duration::from_millis(1000 / UI_FREQ as u64);

/// Interval between scene summaries.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Interval between timing summaries.
const METRICS_INTERVAL: Duration = Duration::from_secs(5);

/// Lateral offsets of the lane lines and road edges (m).
const LANE_LINE_Y: [f32; 4] = [-5.4, -1.8, 1.8, 5.4];
const ROAD_EDGE_Y: [f32; 2] = [-7.2, 7.2];

/// Height of the road below the camera (m).
const ROAD_Z: f32 = 1.2;

/// Road grade of the synthetic drive.
const DRIVE_SLOPE: f32 = 0.03;

// =============================================================================
// Synthetic Drive
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Parked,
    Driving,
    Finished,
}

/// Scripted bus traffic for one parked-drive-parked cycle.
struct SyntheticDrive {
    start: Instant,
    drive_s: f32,
}

impl SyntheticDrive {
    fn new(drive_s: f32) -> Self {
        Self {
            start: Instant::now(),
            drive_s,
        }
    }

    fn phase(&self, t: f32) -> Phase {
        if t < PARKED_HEAD_S {
            Phase::Parked
        } else if t < PARKED_HEAD_S + self.drive_s {
            Phase::Driving
        } else if t < PARKED_HEAD_S + self.drive_s + PARKED_TAIL_S {
            Phase::Parked
        } else {
            Phase::Finished
        }
    }

    fn finished(&self) -> bool {
        self.phase(self.start.elapsed().as_secs_f32()) == Phase::Finished
    }

    /// Records published by the car at time `t` since start.
    fn messages_at(&self, t: f32) -> Vec<Message> {
        match self.phase(t) {
            Phase::Driving => driving_messages(t - PARKED_HEAD_S),
            Phase::Parked | Phase::Finished => parked_messages(t),
        }
    }
}

impl MessageSource for SyntheticDrive {
    fn poll(&mut self) -> Vec<Message> {
        self.messages_at(self.start.elapsed().as_secs_f32())
    }
}

fn parked_messages(t: f32) -> Vec<Message> {
    let tapped = (TAP_AT_S..TAP_AT_S + 0.1).contains(&t);
    let bump = if tapped { 0.5 } else { 0.0 };

    vec![
        Message::DeviceState(device_state(false, t)),
        Message::PandaState(PandaState {
            panda_type: PandaType::RedPanda,
            ignition_line: false,
            ignition_can: false,
        }),
        Message::SensorEvents(vec![
            SensorEvent::Acceleration(vec![0.0, 0.0, 9.81 + bump]),
            SensorEvent::GyroUncalibrated(vec![0.0, bump, 0.0]),
            SensorEvent::Other,
        ]),
        Message::RoadCameraState(road_camera_state(t)),
    ]
}

fn driving_messages(t: f32) -> Vec<Message> {
    let v_ego = fake_signal(t, 18.0, 28.0, 0.2);
    let a_ego = fake_signal(t, -1.5, 1.5, 0.2);
    let braking = a_ego < -0.8;
    let curvature = fake_signal(t, -0.0005, 0.0005, 0.15);
    let lead_x = fake_signal(t, 20.0, 60.0, 0.1);
    let engaged = t > 1.0;

    let alert_status = if (8.0..9.0).contains(&t) {
        AlertStatus::UserPrompt
    } else {
        AlertStatus::Normal
    };

    vec![
        Message::DeviceState(device_state(true, t)),
        Message::PandaState(PandaState {
            panda_type: PandaType::RedPanda,
            ignition_line: true,
            ignition_can: false,
        }),
        Message::CarParams(CarParams {
            openpilot_longitudinal_control: true,
        }),
        Message::DriverMonitoringState(DriverMonitoringState { is_active_mode: true }),
        Message::LiveCalibration(LiveCalibration { rpy: [0.0, 0.02, 0.0] }),
        Message::ControlsState(ControlsState {
            enabled: engaged,
            engageable: true,
            alert_status,
            v_cruise: 100.0,
            angle_error: fake_signal(t, -0.5, 0.5, 1.3),
        }),
        Message::CarState(CarState {
            v_ego,
            a_ego,
            steering_angle_deg: curvature * 4000.0,
            steering_pressed: false,
            steering_torque_eps: fake_signal(t, -1.0, 1.0, 0.7),
            friction_brake_percent: if braking { 40.0 } else { 0.0 },
            engine_rpm: fake_signal(t, 1200.0, 3400.0, 0.4),
            one_pedal_mode_active: false,
            coast_one_pedal_mode_active: false,
        }),
        Message::ModelV2(Box::new(model(curvature, lead_x))),
        Message::RadarState(RadarState {
            lead_one: RadarLead {
                d_rel: lead_x,
                v_rel: fake_signal(t, -2.0, 2.0, 0.1),
                v_lead: v_ego,
                status: true,
            },
        }),
        Message::RoadCameraState(road_camera_state(t)),
        Message::LiveLocationKalman(LiveLocationKalman { gps_ok: true }),
        Message::UbloxGnss(UbloxGnss::MeasurementReport { num_meas: 14 }),
        Message::GpsLocationExternal(GpsLocationExternal {
            accuracy: fake_signal(t, 1.5, 4.0, 0.05),
            altitude: DRIVE_SLOPE.mul_add(23.0 * t, 120.0),
        }),
        Message::LongitudinalPlan(LongitudinalPlan {
            desired_follow_distance: 1.8 * v_ego,
            lead_dist_cost: 0.2,
            lead_accel_cost: 0.1,
            stopping_distance: 6.0,
        }),
        Message::LateralPlan(LateralPlan {
            lane_width: 3.6,
            d_prob: 0.9,
            l_prob: 0.85,
            r_prob: 0.8,
            laneless_mode: false,
        }),
    ]
}

fn device_state(started: bool, t: f32) -> DeviceState {
    DeviceState {
        started,
        cpu_temp_c: vec![fake_signal(t, 45.0, 60.0, 0.05), fake_signal(t, 44.0, 58.0, 0.07)],
        cpu_usage_percent: vec![fake_signal(t, 10.0, 70.0, 0.3), fake_signal(t, 5.0, 40.0, 0.2)],
    }
}

/// Exposure that slowly swings between dusk and daylight.
fn road_camera_state(t: f32) -> RoadCameraState {
    RoadCameraState {
        gain: fake_signal(t, 1.0, 4.0, 0.1),
        integ_lines: fake_signal(t, 100.0, 600.0, 0.1) as u32,
    }
}

/// Straight road bending by `curvature`, with a lead car at `lead_x`.
fn model(curvature: f32, lead_x: f32) -> ModelV2 {
    let line = |y: f32| {
        let mut traj = Trajectory::default();
        for i in 0..TRAJECTORY_SIZE {
            let s = i as f32 / (TRAJECTORY_SIZE - 1) as f32;
            let x = 192.0 * s * s;
            traj.x[i] = x;
            traj.y[i] = curvature.mul_add(x * x, y);
            traj.z[i] = ROAD_Z;
        }
        traj
    };

    ModelV2 {
        position: line(0.0),
        lane_lines: LANE_LINE_Y.map(line),
        lane_line_probs: [0.3, 0.9, 0.9, 0.3],
        road_edges: ROAD_EDGE_Y.map(line),
        road_edge_stds: [0.4, 0.4],
        leads: [
            LeadPrediction {
                prob: 0.9,
                x: lead_x,
                y: 0.0,
            },
            LeadPrediction {
                prob: 0.2,
                x: lead_x + 30.0,
                y: 3.6,
            },
        ],
    }
}

/// Generate a sinusoidal signal oscillating between min and max values.
fn fake_signal(t: f32, min: f32, max: f32, freq: f32) -> f32 {
    let normalized = (t * freq * TAU).sin().mul_add(0.5, 0.5);
    min + normalized * (max - min)
}

// =============================================================================
// Fake Collaborators
// =============================================================================

/// Camera stream that comes up after a few attempts and then delivers
/// frames at the camera rate.
struct PacedStream {
    name: &'static str,
    buffers: usize,
    warmup: u32,
    attempts: u32,
    connected: bool,
    next_frame: Instant,
    frame_id: u32,
}

impl PacedStream {
    fn new(name: &'static str, buffers: usize, warmup: u32) -> Self {
        Self {
            name,
            buffers,
            warmup,
            attempts: 0,
            connected: false,
            next_frame: Instant::now(),
            frame_id: 0,
        }
    }
}

impl VisionClient for PacedStream {
    fn connect(&mut self, _blocking: bool) -> bool {
        self.attempts += 1;
        if self.attempts > self.warmup {
            self.connected = true;
            self.next_frame = Instant::now();
            debug!("{} stream up after {} attempts", self.name, self.attempts);
        }
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.attempts = 0;
    }

    fn recv(&mut self) -> Option<VisionFrame> {
        let now = Instant::now();
        if let Some(wait) = self.next_frame.checked_duration_since(now) {
            thread::sleep(wait);
        } else {
            self.next_frame = now;
        }
        self.next_frame += FRAME_PERIOD;

        let frame = VisionFrame {
            buffer: self.frame_id as usize % self.buffers,
            frame_id: self.frame_id,
        };
        self.frame_id = self.frame_id.wrapping_add(1);
        Some(frame)
    }

    fn num_buffers(&self) -> usize {
        self.buffers
    }
}

/// Hardware that only logs what it is asked to do.
struct LogHardware {
    platform: Platform,
}

impl Hardware for LogHardware {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn set_display_power(&self, on: bool) {
        info!("display power {}", if on { "on" } else { "off" });
    }

    fn set_brightness(&self, percent: i32) {
        debug!("backlight {percent}%");
    }
}

fn replay_params() -> MemoryParams {
    let params = MemoryParams::new()
        .with(keys::IS_METRIC, "1")
        .with(keys::LANELESS_MODE, "2")
        .with(keys::FRICTION_BRAKE_PERCENT, "0")
        .with(keys::MEASURE_NUM_SLOTS, "4")
        .with(keys::SHOW_DEBUG_UI, "1");
    for i in 0..keys::MEASURE_SLOT_COUNT {
        params.put(&keys::measure_slot(i), i.to_string());
    }
    params
}

// =============================================================================
// Command Line
// =============================================================================

#[derive(Parser, Debug, Clone)]
#[command(name = "onroad-replay", version, about = "Replay a synthetic drive through the onroad UI pipeline")]
struct Args {
    /// Length of the driving phase, in seconds.
    #[arg(long, default_value_t = DEFAULT_DRIVE_S, value_parser = positive_secs)]
    drive_secs: f32,
}

/// Parse a strictly positive, finite number of seconds.
fn positive_secs(s: &str) -> Result<f32, String> {
    let secs: f32 = s.parse().map_err(|e| format!("{s:?} is not a number: {e}"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("drive length must be positive, got {secs}"))
    }
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let drive_s = args.drive_secs;

    let hw: Arc<dyn Hardware> = Arc::new(LogHardware {
        platform: Platform::Tici,
    });
    let platform = hw.platform();
    let mut ui = UiState::new(
        platform,
        Arc::new(replay_params()),
        Box::new(PacedStream::new("road", 4, 3)),
        Box::new(PacedStream::new("wide", 6, 3)),
        0.0,
    );
    let mut device = Device::new(Arc::clone(&hw));
    let mut source = SyntheticDrive::new(drive_s);

    info!("replaying {drive_s}s drive on {platform:?}");

    let start = Instant::now();
    let mut period = tick_period(false);
    let mut metrics = TickMetrics::new();
    let mut last_device = start;
    let mut last_summary = start;
    let mut last_metrics = start;

    // ==========================================================================
    // Tick Loop
    // ==========================================================================

    while !source.finished() {
        let tick_start = Instant::now();
        let report = ui.tick(&mut source, start.elapsed().as_secs_f64());

        if let Some(transition) = report.transition {
            info!("frame {}: {transition:?}", report.frame);
        }
        if let Some(timer) = report.timer {
            period = timer.period;
            info!("offroad={} tick period {:?}", timer.offroad, timer.period);
        }
        if report.started {
            metrics.inc_onroad_ticks();
        }

        if last_device.elapsed() >= DEVICE_PERIOD {
            device.update(ui.scene());
            last_device = Instant::now();
        }

        if last_summary.elapsed() >= SUMMARY_INTERVAL {
            let scene = ui.scene();
            info!(
                "{:?} v={:.1} m/s rpm={} brake={:.2} grade={:?} lead={:?} light={:.2} backlight={:?} awake={}",
                report.status,
                scene.car_state.v_ego,
                scene.vehicle.engine_rpm,
                scene.vehicle.brake_indicator.value(),
                scene.percent_grade(),
                scene.geometry.leads[0],
                scene.device.light_sensor,
                device.brightness(),
                device.is_awake(),
            );
            last_summary = Instant::now();
        }

        if last_metrics.elapsed() >= METRICS_INTERVAL {
            info!(
                "ticks={} onroad={} avg={}us work={}us min={}us max={}us uptime={}",
                metrics.total_ticks,
                metrics.onroad_ticks,
                metrics.tick_time_avg_us(),
                metrics.work_time_avg_us(),
                metrics.tick_time_min_us,
                metrics.tick_time_max_us,
                metrics.uptime_string(),
            );
            last_metrics = Instant::now();
        }

        let work = tick_start.elapsed();
        let target = report.backoff.map_or(period, |backoff| backoff.max(period));
        if let Some(rest) = target.checked_sub(work) {
            thread::sleep(rest);
        }
        let sleep = tick_start.elapsed().saturating_sub(work);
        metrics.record_tick(tick_start.elapsed(), work, sleep);
    }

    info!(
        "replay done: {} ticks ({} onroad) in {}",
        metrics.total_ticks,
        metrics.onroad_ticks,
        metrics.uptime_string()
    );
}

// =============================================================================
// Tests
// =============================================================================
