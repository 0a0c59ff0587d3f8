//! Telemetry multiplexer bookkeeping.
//!
//! The bus delivers decoded records asynchronously. Once per tick the host
//! drains them into a [`TelemetryMux`], which keeps:
//!
//! - a tick counter, incremented on every poll (the first poll is frame 1)
//! - per topic, whether it updated on this poll
//! - per topic, the frame it last updated on, for staleness checks
//! - per topic, its latest value (defaults until the first message)
//!
//! Values handed to the aggregator for a tick are only read, never written,
//! until the next poll.

use crate::messages::{
    CarParams,
    CarState,
    ControlsState,
    DeviceState,
    DriverMonitoringState,
    GpsLocationExternal,
    LateralPlan,
    LiveCalibration,
    LiveLocationKalman,
    LongitudinalPlan,
    Message,
    ModelV2,
    PandaState,
    RadarState,
    RoadCameraState,
    SensorEvent,
    UbloxGnss,
};

// =============================================================================
// Topics
// =============================================================================

/// Every topic the pipeline subscribes to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Topic {
    ModelV2,
    ControlsState,
    LiveCalibration,
    DeviceState,
    RoadCameraState,
    PandaState,
    CarParams,
    DriverMonitoringState,
    SensorEvents,
    CarState,
    RadarState,
    LiveLocationKalman,
    UbloxGnss,
    GpsLocationExternal,
    LongitudinalPlan,
    LateralPlan,
}

/// Number of subscribed topics.
pub const TOPIC_COUNT: usize = 16;

impl Topic {
    pub const ALL: [Self; TOPIC_COUNT] = [
        Self::ModelV2,
        Self::ControlsState,
        Self::LiveCalibration,
        Self::DeviceState,
        Self::RoadCameraState,
        Self::PandaState,
        Self::CarParams,
        Self::DriverMonitoringState,
        Self::SensorEvents,
        Self::CarState,
        Self::RadarState,
        Self::LiveLocationKalman,
        Self::UbloxGnss,
        Self::GpsLocationExternal,
        Self::LongitudinalPlan,
        Self::LateralPlan,
    ];

    /// Bus name of the topic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModelV2 => "modelV2",
            Self::ControlsState => "controlsState",
            Self::LiveCalibration => "liveCalibration",
            Self::DeviceState => "deviceState",
            Self::RoadCameraState => "roadCameraState",
            Self::PandaState => "pandaState",
            Self::CarParams => "carParams",
            Self::DriverMonitoringState => "driverMonitoringState",
            Self::SensorEvents => "sensorEvents",
            Self::CarState => "carState",
            Self::RadarState => "radarState",
            Self::LiveLocationKalman => "liveLocationKalman",
            Self::UbloxGnss => "ubloxGnss",
            Self::GpsLocationExternal => "gpsLocationExternal",
            Self::LongitudinalPlan => "longitudinalPlan",
            Self::LateralPlan => "lateralPlan",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// Latest Values
// =============================================================================

/// Latest decoded value of every topic.
#[derive(Clone, Debug, Default)]
pub struct TopicValues {
    pub model: ModelV2,
    pub controls_state: ControlsState,
    pub live_calibration: LiveCalibration,
    pub device_state: DeviceState,
    pub road_camera_state: RoadCameraState,
    pub panda_state: PandaState,
    pub car_params: CarParams,
    pub driver_monitoring: DriverMonitoringState,
    pub sensor_events: Vec<SensorEvent>,
    pub car_state: CarState,
    pub radar_state: RadarState,
    pub live_location: LiveLocationKalman,
    pub ublox_gnss: UbloxGnss,
    pub gps_location: GpsLocationExternal,
    pub longitudinal_plan: LongitudinalPlan,
    pub lateral_plan: LateralPlan,
}

impl TopicValues {
    fn store(&mut self, message: Message) {
        match message {
            Message::ModelV2(m) => self.model = *m,
            Message::ControlsState(m) => self.controls_state = m,
            Message::LiveCalibration(m) => self.live_calibration = m,
            Message::DeviceState(m) => self.device_state = m,
            Message::RoadCameraState(m) => self.road_camera_state = m,
            Message::PandaState(m) => self.panda_state = m,
            Message::CarParams(m) => self.car_params = m,
            Message::DriverMonitoringState(m) => self.driver_monitoring = m,
            Message::SensorEvents(m) => self.sensor_events = m,
            Message::CarState(m) => self.car_state = m,
            Message::RadarState(m) => self.radar_state = m,
            Message::LiveLocationKalman(m) => self.live_location = m,
            Message::UbloxGnss(m) => self.ublox_gnss = m,
            Message::GpsLocationExternal(m) => self.gps_location = m,
            Message::LongitudinalPlan(m) => self.longitudinal_plan = m,
            Message::LateralPlan(m) => self.lateral_plan = m,
        }
    }
}

// =============================================================================
// Source
// =============================================================================

/// Anything that can deliver the records that arrived since the last poll.
pub trait MessageSource {
    /// Drain pending records without blocking.
    fn poll(&mut self) -> Vec<Message>;
}

// =============================================================================
// Multiplexer
// =============================================================================

/// Per-tick view over all subscribed topics.
#[derive(Debug, Default)]
pub struct TelemetryMux {
    frame: u64,
    updated: [bool; TOPIC_COUNT],
    rcv_frame: [u64; TOPIC_COUNT],
    values: TopicValues,
}

impl TelemetryMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new tick with `messages` as everything that arrived since the last one.
    ///
    /// When a topic receives several records in one batch, the last one wins.
    pub fn update(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.frame += 1;
        self.updated = [false; TOPIC_COUNT];
        for message in messages {
            let i = message.topic().index();
            self.updated[i] = true;
            self.rcv_frame[i] = self.frame;
            self.values.store(message);
        }
    }

    /// Poll `source` and start a new tick.
    pub fn update_from(&mut self, source: &mut dyn MessageSource) {
        let messages = source.poll();
        self.update(messages);
    }

    /// Ticks polled so far.
    #[inline]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether `topic` received a record on this tick.
    #[inline]
    pub const fn updated(&self, topic: Topic) -> bool {
        self.updated[topic.index()]
    }

    /// Frame on which `topic` last received a record (0 if never).
    #[inline]
    pub const fn rcv_frame(&self, topic: Topic) -> u64 {
        self.rcv_frame[topic.index()]
    }

    /// Ticks since `topic` last received a record.
    #[inline]
    pub const fn ticks_since(&self, topic: Topic) -> u64 {
        self.frame - self.rcv_frame[topic.index()]
    }

    /// Latest value of every topic.
    #[inline]
    pub const fn values(&self) -> &TopicValues {
        &self.values
    }
}

// =============================================================================
// Tests
// =============================================================================
