//! The per-tick UI pipeline.
//!
//! # Tick Order
//!
//! ```text
//! 1. feature flags     (cadenced on the previous frame counter)
//! 2. telemetry poll    (frame counter advances)
//! 3. scene aggregation
//! 4. status/lifecycle  (session start, stream selection)
//! 5. vision            (connect, receive, back-off)
//! 6. timer cadence     (offroad notification, tick period)
//! ```
//!
//! [`UiState`] owns every stage. The host calls [`UiState::tick`] at the
//! period from the last reported [`TimerChange`], sleeping for any back-off
//! reported in the [`TickReport`], and runs [`Device`](crate::device::Device)
//! against [`UiState::scene`] at [`UI_FREQ`](onroad_common::config::UI_FREQ).

use std::sync::Arc;
use std::time::Duration;

use embedded_graphics::geometry::Size;
use onroad_common::Platform;
use onroad_common::config::VIEWPORT;

use crate::aggregator::SceneAggregator;
use crate::lifecycle::{Lifecycle, TimerChange, Transition};
use crate::messages::Message;
use crate::params::ParamStore;
use crate::scene::{SceneSnapshot, UiStatus};
use crate::telemetry::{MessageSource, TelemetryMux};
use crate::vision::{StreamKind, VisionClient, VisionStreams};

/// What happened on one tick, for the host loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TickReport {
    pub frame: u64,
    pub started: bool,
    pub status: UiStatus,
    /// Lifecycle edge crossed on this tick.
    pub transition: Option<Transition>,
    /// Wait before the next tick while the camera stream is coming up.
    pub backoff: Option<Duration>,
    /// New tick period and offroad notification.
    pub timer: Option<TimerChange>,
}

/// Top-level UI state.
pub struct UiState {
    mux: TelemetryMux,
    aggregator: SceneAggregator,
    lifecycle: Lifecycle,
    vision: VisionStreams,
    params: Arc<dyn ParamStore + Send + Sync>,
    platform: Platform,
    viewport: Size,
}

impl UiState {
    pub fn new(
        platform: Platform,
        params: Arc<dyn ParamStore + Send + Sync>,
        road: Box<dyn VisionClient>,
        wide: Box<dyn VisionClient>,
        now: f64,
    ) -> Self {
        Self {
            mux: TelemetryMux::new(),
            aggregator: SceneAggregator::new(platform, now),
            lifecycle: Lifecycle::new(),
            vision: VisionStreams::new(road, wide),
            params,
            platform,
            viewport: VIEWPORT,
        }
    }

    /// Poll `source` and run one tick.
    pub fn tick(&mut self, source: &mut dyn MessageSource, now: f64) -> TickReport {
        self.tick_with(source.poll(), now)
    }

    /// Run one tick over an already received batch.
    pub fn tick_with(&mut self, messages: impl IntoIterator<Item = Message>, now: f64) -> TickReport {
        self.aggregator.update_params(self.mux.frame(), self.params.as_ref());
        self.mux.update(messages);
        self.aggregator.update_state(&self.mux, now);

        let transition = self.lifecycle.update_status(
            self.aggregator.scene_mut(),
            &self.mux,
            self.params.as_ref(),
            self.platform,
            now,
        );
        match transition {
            Some(Transition::Onroad) => self.start_streams(),
            Some(Transition::Offroad) => self.vision.disconnect(),
            None => {}
        }

        let started = self.aggregator.scene().started;
        let vision = self.vision.update(started, self.platform);
        if vision.reinitialized {
            self.aggregator.scene_mut().world_objects_visible = false;
        }

        let frame = self.mux.frame();
        TickReport {
            frame,
            started,
            status: self.aggregator.scene().status,
            transition,
            backoff: vision.backoff,
            timer: self.lifecycle.update_timer(started, frame),
        }
    }

    #[inline]
    pub const fn scene(&self) -> &SceneSnapshot {
        self.aggregator.scene()
    }

    #[inline]
    pub const fn aggregator(&self) -> &SceneAggregator {
        &self.aggregator
    }

    #[inline]
    pub const fn telemetry(&self) -> &TelemetryMux {
        &self.mux
    }

    #[inline]
    pub const fn vision(&self) -> &VisionStreams {
        &self.vision
    }

    #[inline]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Framebuffer size the projector culls against.
    #[inline]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Rebuild the screen transform for a new framebuffer size.
    pub fn resize(&mut self, size: Size) {
        self.viewport = size;
        let wide = self.vision.active() == StreamKind::Wide;
        self.aggregator.projector_mut().set_camera(size, self.platform, wide);
    }

    /// Pick the stream for the new session and match the projector to it.
    fn start_streams(&mut self) {
        let wide = self.aggregator.scene().session.wide_camera;
        let kind = if wide { StreamKind::Wide } else { StreamKind::Road };
        if kind != self.vision.active() {
            self.vision.disconnect();
            self.vision.select(kind);
        }
        self.aggregator.projector_mut().set_camera(self.viewport, self.platform, wide);
    }
}

// =============================================================================
// Tests
// =============================================================================
