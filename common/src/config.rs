//! Pipeline configuration constants.
//!
//! Sizing constants (trajectory length, outline capacity) are compile-time so the
//! polygon buffers can live in fixed-size storage. Values derived from the tick
//! rate are pre-computed here instead of in the tick loop.

use embedded_graphics::geometry::Size;

// =============================================================================
// Tick Rate
// =============================================================================

/// Nominal UI tick rate in Hz. Offroad ticks run at this rate; onroad ticks
/// follow the vision stream.
pub const UI_FREQ: u32 = 20;

/// Offroad tick period in milliseconds.
pub const OFFROAD_TICK_MS: u64 = 1000 / UI_FREQ as u64;

// =============================================================================
// Trajectory and Outline Sizing
// =============================================================================

/// Number of samples in every model trajectory (path, lane lines, road edges).
pub const TRAJECTORY_SIZE: usize = 33;

/// Vertex capacity of a polygon outline: one pass forward, one pass back.
pub const OUTLINE_CAPACITY: usize = 2 * TRAJECTORY_SIZE;

/// Number of lane lines reported by the model.
pub const LANE_LINE_COUNT: usize = 4;

/// Number of road edges reported by the model.
pub const ROAD_EDGE_COUNT: usize = 2;

/// Number of lead predictions projected onto the screen.
pub const LEAD_COUNT: usize = 2;

// =============================================================================
// Draw Distance
// =============================================================================

/// Shortest distance the path is ever drawn to (meters).
pub const MIN_DRAW_DISTANCE: f32 = 10.0;

/// Furthest distance any line is drawn to (meters).
pub const MAX_DRAW_DISTANCE: f32 = 100.0;

/// Fraction of the lead-scaled distance cut from the path when a lead is present.
pub const LEAD_CUTOFF_FRACTION: f32 = 0.35;

/// Upper bound on the distance cut from the path in front of a lead (meters).
pub const LEAD_CUTOFF_MAX: f32 = 10.0;

const _: () = assert!(MIN_DRAW_DISTANCE < MAX_DRAW_DISTANCE);

// =============================================================================
// Line Geometry
// =============================================================================

/// Lane-line half-width per unit of detection probability (meters).
pub const LANE_LINE_WIDTH_SCALE: f32 = 0.025;

/// Road-edge half-width (meters).
pub const ROAD_EDGE_HALF_WIDTH: f32 = 0.025;

/// Travel-path half-width (meters).
pub const PATH_HALF_WIDTH: f32 = 0.5;

/// Height above the trajectory at which the path and lead markers are drawn (meters).
pub const PATH_HEIGHT: f32 = 1.22;

// =============================================================================
// Screen Projection
// =============================================================================

/// Default framebuffer size.
pub const VIEWPORT: Size = Size::new(1920, 1080);

/// Pixels beyond the framebuffer edge that still count as visible.
/// Keeps near-edge points so polygons stay continuous.
pub const VISIBLE_MARGIN: f32 = 500.0;

// =============================================================================
// Fades
// =============================================================================

/// Time for the brake indicator to fade fully in or out (seconds).
pub const FADE_DURATION_S: f32 = 0.3;

/// Fade rate in units per second.
pub const FADE_RATE: f32 = 1.0 / FADE_DURATION_S;

// =============================================================================
// Road Grade
// =============================================================================

/// Samples kept in the grade estimator ring buffer.
pub const GRADE_SAMPLES: usize = 5;

/// Distance travelled between grade samples (meters).
pub const GRADE_STEP_M: f32 = 7.5;

const _: () = assert!(GRADE_SAMPLES >= 2);

// =============================================================================
// Backlight
// =============================================================================

/// Backlight percent used whenever the car is not started.
pub const BACKLIGHT_OFFROAD: f32 = 75.0;

/// Brightness filter time constant (seconds).
pub const BACKLIGHT_TS: f32 = 10.0;

/// Brightness filter sample period (seconds).
pub const BACKLIGHT_DT: f32 = 0.05;

/// Lowest backlight percent while onroad.
pub const BACKLIGHT_MIN: f32 = 10.0;

/// Highest backlight percent.
pub const BACKLIGHT_MAX: f32 = 100.0;

const _: () = assert!(BACKLIGHT_MIN < BACKLIGHT_MAX);

// =============================================================================
// Wakefulness
// =============================================================================

/// Ticks the display stays awake after a wake event (30 seconds).
pub const AWAKE_TIMEOUT_TICKS: u32 = 30 * UI_FREQ;

/// Window of the running accelerometer baseline, in samples (5 seconds).
pub const ACCEL_BASELINE_SAMPLES: f32 = (5 * UI_FREQ) as f32;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_capacity_covers_both_passes() {
        assert_eq!(OUTLINE_CAPACITY, TRAJECTORY_SIZE * 2);
    }

    #[test]
    fn test_fade_rate_matches_duration() {
        assert!((FADE_RATE * FADE_DURATION_S - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_offroad_tick_period() {
        assert_eq!(OFFROAD_TICK_MS, 50, "20 Hz should give a 50 ms period");
    }

    #[test]
    fn test_awake_timeout_is_thirty_seconds() {
        assert_eq!(AWAKE_TIMEOUT_TICKS, 600);
    }

    #[test]
    fn test_backlight_offroad_within_range() {
        assert!(BACKLIGHT_OFFROAD >= BACKLIGHT_MIN);
        assert!(BACKLIGHT_OFFROAD <= BACKLIGHT_MAX);
    }
}
