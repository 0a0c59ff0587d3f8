//! Display wake countdown and motion-tap detection.
//!
//! While the car is started (or ignition is on) the display stays awake. Once
//! it is off, a physical tap on the device wakes it: the tick must see both an
//! accelerometer jump away from its running baseline and a gyroscope jump away
//! from the previous sample.
//!
//! The accelerometer baseline is a running average over
//! [`ACCEL_BASELINE_SAMPLES`]; the gyroscope baseline is just the previous raw
//! reading. Both baselines only move while the display is not held awake by
//! the car.

use crate::config::{ACCEL_BASELINE_SAMPLES, AWAKE_TIMEOUT_TICKS};
use crate::thresholds::{ACCEL_TAP_DELTA, GYRO_TAP_DELTA};

/// Sensor and vehicle inputs for one wakefulness tick.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WakeInputs {
    pub started: bool,
    pub ignition: bool,
    /// Accelerometer z-axis reading.
    pub accel: f32,
    /// Uncalibrated gyroscope y-axis reading.
    pub gyro: f32,
}

/// Awake state of the display.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Wakefulness {
    countdown: u32,
    accel_prev: f32,
    gyro_prev: f32,
    awake: bool,
}

impl Wakefulness {
    /// Start asleep with an expired countdown.
    pub const fn new() -> Self {
        Self {
            countdown: 0,
            accel_prev: 0.0,
            gyro_prev: 0.0,
            awake: false,
        }
    }

    /// Run one tick.
    ///
    /// Returns `Some(awake)` when the awake state changed this tick.
    pub fn update(&mut self, inputs: WakeInputs) -> Option<bool> {
        self.countdown = self.countdown.saturating_sub(1);

        let should_wake = inputs.started || inputs.ignition || self.detect_tap(inputs.accel, inputs.gyro);
        if should_wake {
            self.countdown = AWAKE_TIMEOUT_TICKS;
        }

        let awake = self.countdown > 0 || should_wake;
        let changed = awake != self.awake;
        self.awake = awake;
        changed.then_some(awake)
    }

    /// Compare against both baselines, then move them.
    fn detect_tap(&mut self, accel: f32, gyro: f32) -> bool {
        let accel_trigger = micromath::F32(accel - self.accel_prev).abs().0 > ACCEL_TAP_DELTA;
        let gyro_trigger = micromath::F32(gyro - self.gyro_prev).abs().0 > GYRO_TAP_DELTA;

        self.gyro_prev = gyro;
        self.accel_prev = (self.accel_prev * (ACCEL_BASELINE_SAMPLES - 1.0) + accel) / ACCEL_BASELINE_SAMPLES;

        accel_trigger && gyro_trigger
    }

    #[inline]
    pub const fn is_awake(&self) -> bool {
        self.awake
    }

    /// Ticks left before the display may sleep.
    #[inline]
    pub const fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Running accelerometer baseline.
    #[inline]
    pub const fn accel_baseline(&self) -> f32 {
        self.accel_prev
    }
}

impl Default for Wakefulness {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> WakeInputs {
        WakeInputs::default()
    }

    fn tap() -> WakeInputs {
        WakeInputs {
            accel: 1.0,
            gyro: 1.0,
            ..WakeInputs::default()
        }
    }

    // -------------------------------------------------------------------------
    // Tap Detection Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tap_wakes_display() {
        let mut wake = Wakefulness::new();
        assert_eq!(wake.update(tap()), Some(true), "tap should wake");
        assert!(wake.is_awake());
        assert_eq!(wake.countdown(), AWAKE_TIMEOUT_TICKS);
    }

    #[test]
    fn test_single_axis_jump_is_not_a_tap() {
        let mut wake = Wakefulness::new();
        let accel_only = WakeInputs { accel: 1.0, ..idle() };
        assert_eq!(wake.update(accel_only), None);

        let mut wake = Wakefulness::new();
        let gyro_only = WakeInputs { gyro: 1.0, ..idle() };
        assert_eq!(wake.update(gyro_only), None);
        assert!(!wake.is_awake());
    }

    #[test]
    fn test_accel_baseline_is_running_average() {
        let mut wake = Wakefulness::new();
        wake.update(WakeInputs { accel: 10.0, ..idle() });
        let expected = 10.0 / ACCEL_BASELINE_SAMPLES;
        assert!((wake.accel_baseline() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_steady_offset_is_not_a_tap_for_gyro() {
        // Gyro baseline is the previous sample, so a held reading stops triggering
        let mut wake = Wakefulness::new();
        wake.update(WakeInputs { gyro: 1.0, ..idle() });
        assert_eq!(wake.update(WakeInputs { accel: 1.0, gyro: 1.0, ..idle() }), None);
    }

    // -------------------------------------------------------------------------
    // Countdown Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_countdown_expires_after_timeout() {
        let mut wake = Wakefulness::new();
        wake.update(tap());

        // Hold the sensors steady at the tap reading so no further taps trigger
        let steady = WakeInputs { accel: 1.0, gyro: 1.0, ..idle() };
        for tick in 1..AWAKE_TIMEOUT_TICKS {
            assert_eq!(wake.update(steady), None, "still awake at tick {tick}");
        }
        assert_eq!(wake.update(steady), Some(false), "should sleep after the timeout");
        assert_eq!(wake.countdown(), 0);
    }

    #[test]
    fn test_started_keeps_display_awake() {
        let mut wake = Wakefulness::new();
        let started = WakeInputs { started: true, ..idle() };
        assert_eq!(wake.update(started), Some(true));
        for _ in 0..(2 * AWAKE_TIMEOUT_TICKS) {
            assert_eq!(wake.update(started), None);
        }
        assert_eq!(wake.countdown(), AWAKE_TIMEOUT_TICKS, "each tick resets the countdown");
    }

    #[test]
    fn test_ignition_wakes_without_moving_baselines() {
        let mut wake = Wakefulness::new();
        let ignition = WakeInputs { ignition: true, accel: 5.0, gyro: 5.0, ..idle() };
        wake.update(ignition);
        assert_eq!(wake.accel_baseline(), 0.0, "baselines only move during tap detection");
    }
}
