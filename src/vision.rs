//! Road-camera frame streams.
//!
//! Two stream clients exist, one for the narrow road camera and one for the
//! wide camera. Exactly one is active; the choice is made on each onroad
//! transition. While onroad and disconnected the active client is polled with
//! a non-blocking connect, and the host is told to back off between attempts.

use std::time::Duration;

use log::{error, info};
use onroad_common::Platform;
use onroad_common::config::UI_FREQ;

/// Back-off while waiting for the camera stream to come up.
pub const CONNECT_BACKOFF: Duration = Duration::from_millis(1000 / UI_FREQ as u64);

// =============================================================================
// Client Interface
// =============================================================================

/// Handle to a received frame buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VisionFrame {
    /// Index of the shared buffer holding the frame.
    pub buffer: usize,
    pub frame_id: u32,
}

/// Frame stream client.
pub trait VisionClient {
    /// Try to connect. Returns whether the client is now connected.
    fn connect(&mut self, blocking: bool) -> bool;

    fn is_connected(&self) -> bool;

    /// Drop the connection.
    fn disconnect(&mut self);

    /// Wait for the next frame. `None` on timeout.
    fn recv(&mut self) -> Option<VisionFrame>;

    /// Number of shared frame buffers the stream exposes.
    fn num_buffers(&self) -> usize;
}

// =============================================================================
// Stream Selection
// =============================================================================

/// Camera stream in use.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StreamKind {
    #[default]
    Road,
    Wide,
}

/// Outcome of one vision tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct VisionUpdate {
    /// The stream (re)connected this tick; world objects must be hidden until
    /// the next calibration.
    pub reinitialized: bool,
    /// How long the host should wait before the next tick.
    pub backoff: Option<Duration>,
}

/// Both stream clients and the state of the active one.
pub struct VisionStreams {
    road: Box<dyn VisionClient>,
    wide: Box<dyn VisionClient>,
    active: StreamKind,
    last_frame: Option<VisionFrame>,
    texture_slots: usize,
}

impl VisionStreams {
    pub fn new(road: Box<dyn VisionClient>, wide: Box<dyn VisionClient>) -> Self {
        Self {
            road,
            wide,
            active: StreamKind::Road,
            last_frame: None,
            texture_slots: 0,
        }
    }

    /// Make `kind` the active stream.
    pub fn select(&mut self, kind: StreamKind) {
        if kind != self.active {
            info!("switching camera stream to {kind:?}");
        }
        self.active = kind;
    }

    /// Mark the active stream disconnected.
    pub fn disconnect(&mut self) {
        self.active_client_mut().disconnect();
    }

    /// Run one tick: connect if needed, then receive.
    pub fn update(&mut self, started: bool, platform: Platform) -> VisionUpdate {
        let mut result = VisionUpdate::default();

        if started && !self.active_client().is_connected() && self.active_client_mut().connect(false) {
            self.texture_slots = self.active_client().num_buffers();
            result.reinitialized = true;
            info!(
                "{:?} stream connected with {} buffers",
                self.active, self.texture_slots
            );
        }

        if self.active_client().is_connected() {
            match self.active_client_mut().recv() {
                Some(frame) => self.last_frame = Some(frame),
                None if !platform.is_pc() => error!("vision stream receive timeout"),
                None => {}
            }
        } else if started {
            result.backoff = Some(CONNECT_BACKOFF);
        }
        result
    }

    #[inline]
    pub const fn active(&self) -> StreamKind {
        self.active
    }

    /// Most recent frame; kept across receive timeouts.
    #[inline]
    pub const fn last_frame(&self) -> Option<VisionFrame> {
        self.last_frame
    }

    /// Texture slots wired up on the last connect.
    #[inline]
    pub const fn texture_slots(&self) -> usize {
        self.texture_slots
    }

    pub fn is_connected(&self) -> bool {
        self.active_client().is_connected()
    }

    fn active_client(&self) -> &dyn VisionClient {
        match self.active {
            StreamKind::Road => self.road.as_ref(),
            StreamKind::Wide => self.wide.as_ref(),
        }
    }

    fn active_client_mut(&mut self) -> &mut dyn VisionClient {
        match self.active {
            StreamKind::Road => self.road.as_mut(),
            StreamKind::Wide => self.wide.as_mut(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Scripted client: connects once `available` is set, and delivers a frame
    /// on every receive unless `timeouts` is set.
    #[derive(Clone, Default)]
    pub(crate) struct FakeClient {
        pub available: Rc<Cell<bool>>,
        pub connected: Rc<Cell<bool>>,
        pub timeouts: Rc<Cell<bool>>,
        pub buffers: usize,
        next_id: Rc<Cell<u32>>,
    }

    impl FakeClient {
        pub(crate) fn new(buffers: usize) -> Self {
            Self {
                buffers,
                ..Self::default()
            }
        }
    }

    impl VisionClient for FakeClient {
        fn connect(&mut self, _blocking: bool) -> bool {
            if self.available.get() {
                self.connected.set(true);
            }
            self.connected.get()
        }

        fn is_connected(&self) -> bool {
            self.connected.get()
        }

        fn disconnect(&mut self) {
            self.connected.set(false);
        }

        fn recv(&mut self) -> Option<VisionFrame> {
            if self.timeouts.get() {
                return None;
            }
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            Some(VisionFrame {
                buffer: id as usize % self.buffers.max(1),
                frame_id: id,
            })
        }

        fn num_buffers(&self) -> usize {
            self.buffers
        }
    }

    fn streams() -> (VisionStreams, FakeClient, FakeClient) {
        let road = FakeClient::new(4);
        let wide = FakeClient::new(6);
        let streams = VisionStreams::new(Box::new(road.clone()), Box::new(wide.clone()));
        (streams, road, wide)
    }

    // -------------------------------------------------------------------------
    // Connect Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_offroad_never_connects() {
        let (mut streams, road, _) = streams();
        road.available.set(true);

        let result = streams.update(false, Platform::Tici);
        assert!(!road.connected.get());
        assert_eq!(result, VisionUpdate::default(), "no back-off offroad");
    }

    #[test]
    fn test_backoff_while_waiting_for_stream() {
        let (mut streams, _, _) = streams();
        let result = streams.update(true, Platform::Tici);
        assert_eq!(result.backoff, Some(CONNECT_BACKOFF));
        assert_eq!(CONNECT_BACKOFF, Duration::from_millis(50));
    }

    #[test]
    fn test_connect_initializes_textures_and_receives() {
        let (mut streams, road, _) = streams();
        road.available.set(true);

        let result = streams.update(true, Platform::Tici);
        assert!(result.reinitialized);
        assert_eq!(result.backoff, None);
        assert_eq!(streams.texture_slots(), 4);
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(0));

        let result = streams.update(true, Platform::Tici);
        assert!(!result.reinitialized, "already connected");
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(1));
    }

    #[test]
    fn test_timeout_keeps_previous_frame() {
        let (mut streams, road, _) = streams();
        road.available.set(true);
        streams.update(true, Platform::Pc);

        road.timeouts.set(true);
        streams.update(true, Platform::Pc);
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(0));
    }

    #[test]
    fn test_timeout_on_device_keeps_previous_frame() {
        let (mut streams, road, _) = streams();
        road.available.set(true);
        streams.update(true, Platform::Tici);
        streams.update(true, Platform::Tici);
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(1));

        road.timeouts.set(true);
        let result = streams.update(true, Platform::Tici);
        assert_eq!(result, VisionUpdate::default(), "timeout is not fatal and needs no back-off");
        assert!(streams.is_connected(), "timeout does not drop the stream");
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(1));

        road.timeouts.set(false);
        streams.update(true, Platform::Tici);
        assert_eq!(streams.last_frame().map(|f| f.frame_id), Some(2), "frames resume after timeout");
    }

    // -------------------------------------------------------------------------
    // Selection Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_select_wide_uses_wide_client() {
        let (mut streams, road, wide) = streams();
        road.available.set(true);
        wide.available.set(true);

        streams.select(StreamKind::Wide);
        streams.update(true, Platform::Tici);
        assert!(wide.connected.get());
        assert!(!road.connected.get());
        assert_eq!(streams.texture_slots(), 6);
    }

    #[test]
    fn test_disconnect_marks_active_client() {
        let (mut streams, road, _) = streams();
        road.available.set(true);
        streams.update(true, Platform::Tici);
        assert!(streams.is_connected());

        streams.disconnect();
        assert!(!streams.is_connected());
        assert!(!road.connected.get());
    }
}
