//! Ambient light to backlight brightness.
//!
//! # Pipeline
//!
//! ```text
//! exposure ──▶ light fraction ──▶ lightness curve ──▶ clamp ──▶ low-pass ──▶ round
//!   (camera)       [0, 1]           CIE 1931        [10, 100]   ts = 10 s     percent
//! ```
//!
//! Offroad the target is pinned to [`BACKLIGHT_OFFROAD`]. A sleeping display
//! always gets 0. [`Backlight::update`] only returns a value when it differs
//! from the last one it returned, so callers can forward it straight to the
//! hardware.

use crate::config::{BACKLIGHT_DT, BACKLIGHT_MAX, BACKLIGHT_MIN, BACKLIGHT_OFFROAD, BACKLIGHT_TS};
use crate::filter::FirstOrderFilter;
use crate::platform::Platform;

// =============================================================================
// Light Sensing
// =============================================================================

/// Ambient light fraction from road-camera exposure.
///
/// A fully exposed sensor (long integration, high gain) means a dark scene.
pub fn light_from_exposure(gain: f32, integ_lines: u32, platform: Platform) -> f32 {
    let ev = gain * integ_lines as f32;
    (1.0 - ev / platform.max_exposure()).clamp(0.0, 1.0)
}

// =============================================================================
// Lightness Curve
// =============================================================================

/// Knee of the lightness curve, in percent.
const LIGHTNESS_KNEE: f32 = 8.0;

/// Linear-segment divisor below the knee.
const LIGHTNESS_LINEAR_DIVISOR: f32 = 903.3;

/// CIE 1931 lightness to relative luminance, both in `[0, 1]`.
pub fn lightness(light: f32) -> f32 {
    let l = 100.0 * light;
    if l <= LIGHTNESS_KNEE {
        l / LIGHTNESS_LINEAR_DIVISOR
    } else {
        let f = (l + 16.0) / 116.0;
        f * f * f
    }
}

/// Unfiltered backlight target in percent.
pub fn target(light: f32, started: bool) -> f32 {
    if !started {
        return BACKLIGHT_OFFROAD;
    }
    (100.0 * lightness(light)).clamp(BACKLIGHT_MIN, BACKLIGHT_MAX)
}

// =============================================================================
// Backlight
// =============================================================================

/// Smoothed backlight level with change detection.
#[derive(Clone, Copy, Debug)]
pub struct Backlight {
    filter: FirstOrderFilter,
    /// `None` until the first write; the panel level is unknown before it.
    last: Option<i32>,
}

impl Backlight {
    pub fn new() -> Self {
        Self {
            filter: FirstOrderFilter::new(BACKLIGHT_OFFROAD, BACKLIGHT_TS, BACKLIGHT_DT),
            last: None,
        }
    }

    /// Run one brightness tick.
    ///
    /// Returns the new percent when it differs from the previous tick's value,
    /// `None` otherwise. The first call always returns a value so the panel
    /// is synced to the filter on startup. The filter keeps running while the
    /// display sleeps.
    pub fn update(&mut self, light: f32, started: bool, awake: bool) -> Option<i32> {
        let filtered = self.filter.update(target(light, started));
        let brightness = if awake { round_percent(filtered) } else { 0 };

        let changed = self.last != Some(brightness);
        self.last = Some(brightness);
        changed.then_some(brightness)
    }

    /// Last brightness produced by [`update`](Self::update).
    #[inline]
    pub const fn last(&self) -> Option<i32> {
        self.last
    }

    /// Current filter output, before rounding.
    #[inline]
    pub const fn filtered(&self) -> f32 {
        self.filter.value()
    }
}

impl Default for Backlight {
    fn default() -> Self {
        Self::new()
    }
}

fn round_percent(value: f32) -> i32 {
    // Filter output is always within [0, 100]
    micromath::F32(value).round().0 as i32
}

// =============================================================================
// Tests
// =============================================================================
