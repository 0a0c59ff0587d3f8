//! Centralized decision thresholds.
//!
//! All thresholds are compile-time constants. Each group carries `const`
//! assertions so a bad edit fails the build instead of silently changing
//! behavior.
//!
//! # Usage
//!
//! ```ignore
//! use onroad_common::thresholds::{LEAD_PROB_MIN, is_confident_lead};
//! ```

// =============================================================================
// Lead Detection
// =============================================================================

/// Minimum model probability for a lead to be drawn or to shorten the path.
pub const LEAD_PROB_MIN: f32 = 0.5;

const _: () = assert!(LEAD_PROB_MIN > 0.0 && LEAD_PROB_MIN < 1.0);

/// Whether a lead prediction is confident enough to show.
#[inline]
pub fn is_confident_lead(prob: f32) -> bool {
    prob > LEAD_PROB_MIN
}

// =============================================================================
// One-Pedal Mode
// =============================================================================

/// Seconds after session start before the one-pedal indicator may fade.
pub const ONE_PEDAL_SESSION_DELAY_S: f64 = 10.0;

/// Cruise set speed below which a disengaged car counts as one-pedal capable.
pub const ONE_PEDAL_MAX_CRUISE: f32 = 5.0;

const _: () = assert!(ONE_PEDAL_SESSION_DELAY_S > 0.0);

// =============================================================================
// Tap Detection
// =============================================================================

/// Accelerometer delta from the running baseline that counts as a tap.
pub const ACCEL_TAP_DELTA: f32 = 0.2;

/// Gyroscope delta from the previous sample that counts as a tap.
pub const GYRO_TAP_DELTA: f32 = 0.15;

const _: () = assert!(ACCEL_TAP_DELTA > 0.0);
const _: () = assert!(GYRO_TAP_DELTA > 0.0);

// =============================================================================
// Panda Staleness
// =============================================================================

/// Ticks without a panda update after which its type is reported as unknown.
pub const PANDA_STALE_TICKS: u64 = 5 * crate::config::UI_FREQ as u64;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confident_lead() {
        assert!(is_confident_lead(0.9), "0.9 should be confident");
        assert!(!is_confident_lead(0.5), "0.5 is not strictly above the threshold");
        assert!(!is_confident_lead(0.1), "0.1 should not be confident");
    }

    #[test]
    fn test_panda_stale_ticks_is_five_seconds() {
        assert_eq!(PANDA_STALE_TICKS, 100);
    }

    #[test]
    fn test_tap_thresholds_ordering() {
        // Gyro is the more sensitive of the two triggers
        assert!(GYRO_TAP_DELTA < ACCEL_TAP_DELTA);
    }
}
