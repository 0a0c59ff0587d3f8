//! Time-based fades for on-screen indicators.
//!
//! A fade moves its value toward the upper bound at `rate` units per second
//! while its condition holds, and back toward the lower bound otherwise. Time
//! deltas come from the caller's monotonic clock, so the fade speed does not
//! depend on tick rate.
//!
//! # Example
//!
//! ```ignore
//! let mut fade = Fade::new(FadeBounds::Unit, FADE_RATE, now);
//! fade.update(brake_lights_on, now);
//! let alpha = fade.value();
//! ```

// =============================================================================
// Bounds
// =============================================================================

/// Range a fade value is clamped to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FadeBounds {
    /// `[0, 1]`, used for plain show/hide indicators.
    Unit,
    /// `[-1, 1]`, used where "fully off" and "fully on" are both drawn.
    Signed,
}

impl FadeBounds {
    #[inline]
    pub const fn lower(self) -> f32 {
        match self {
            Self::Unit => 0.0,
            Self::Signed => -1.0,
        }
    }

    #[inline]
    pub const fn upper(self) -> f32 {
        1.0
    }
}

// =============================================================================
// Fade
// =============================================================================

/// A clamped value that moves linearly with elapsed time.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Fade {
    value: f32,
    bounds: FadeBounds,
    rate: f32,
    last_t: f64,
}

impl Fade {
    /// Create a fade resting at its lower bound.
    pub fn new(bounds: FadeBounds, rate: f32, now: f64) -> Self {
        Self {
            value: bounds.lower(),
            bounds,
            rate,
            last_t: now,
        }
    }

    /// Advance by the time elapsed since the previous update.
    ///
    /// Rising is unconditional while `condition` holds; falling only happens
    /// while the value is above the lower bound.
    pub fn update(&mut self, condition: bool, now: f64) {
        let dt = (now - self.last_t) as f32;
        self.last_t = now;

        let lower = self.bounds.lower();
        if condition {
            self.value += self.rate * dt;
        } else if self.value > lower {
            self.value -= self.rate * dt;
        }
        self.value = self.value.clamp(lower, self.bounds.upper());
    }

    /// Record the current time without moving the value.
    ///
    /// Keeps the next [`update`](Self::update) from seeing a large delta after
    /// a period where the fade was held.
    #[inline]
    pub fn touch(&mut self, now: f64) {
        self.last_t = now;
    }

    /// Current value, always within bounds.
    #[inline]
    pub const fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub const fn bounds(&self) -> FadeBounds {
        self.bounds
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FADE_RATE;

    const DT: f64 = 0.05;

    #[test]
    fn test_fade_starts_at_lower_bound() {
        assert_eq!(Fade::new(FadeBounds::Unit, FADE_RATE, 0.0).value(), 0.0);
        assert_eq!(Fade::new(FadeBounds::Signed, FADE_RATE, 0.0).value(), -1.0);
    }

    #[test]
    fn test_fade_reaches_upper_bound_in_expected_ticks() {
        let mut fade = Fade::new(FadeBounds::Unit, FADE_RATE, 0.0);
        let ticks = (1.0 / (FADE_RATE as f64 * DT)).ceil() as usize;

        let mut t = 0.0;
        for _ in 0..ticks {
            t += DT;
            fade.update(true, t);
        }
        assert_eq!(fade.value(), 1.0, "should be fully on after {ticks} ticks");

        t += DT;
        fade.update(true, t);
        assert_eq!(fade.value(), 1.0, "should stay clamped at the upper bound");
    }

    #[test]
    fn test_fade_falls_back_to_lower_bound() {
        let mut fade = Fade::new(FadeBounds::Signed, FADE_RATE, 0.0);
        fade.update(true, 10.0);
        assert_eq!(fade.value(), 1.0);

        fade.update(false, 20.0);
        assert_eq!(fade.value(), -1.0, "a long gap should clamp at the lower bound");
    }

    #[test]
    fn test_fade_does_not_fall_below_lower_bound() {
        let mut fade = Fade::new(FadeBounds::Unit, FADE_RATE, 0.0);
        fade.update(false, 1.0);
        assert_eq!(fade.value(), 0.0);
    }

    #[test]
    fn test_touch_prevents_catch_up() {
        let mut fade = Fade::new(FadeBounds::Unit, FADE_RATE, 0.0);
        fade.touch(100.0);
        fade.update(true, 100.0 + DT);

        let expected = FADE_RATE * DT as f32;
        assert!((fade.value() - expected).abs() < 1e-5, "got {}", fade.value());
    }

    #[test]
    fn test_fade_moves_monotonically_toward_target() {
        let mut fade = Fade::new(FadeBounds::Unit, FADE_RATE, 0.0);
        let mut t = 0.0;

        let mut prev = fade.value();
        for i in 0..20 {
            t += DT;
            fade.update(true, t);
            let next = fade.value();
            assert!(next >= prev && next <= 1.0, "rising tick {i}: {prev} -> {next}");
            prev = next;
        }
        assert_eq!(prev, 1.0, "held target reaches the upper bound");

        for i in 0..20 {
            t += DT;
            fade.update(false, t);
            let next = fade.value();
            assert!(next <= prev && next >= 0.0, "falling tick {i}: {prev} -> {next}");
            prev = next;
        }
        assert_eq!(prev, 0.0, "released target reaches the lower bound");
    }

    #[test]
    fn test_fade_value_always_within_bounds() {
        let mut fade = Fade::new(FadeBounds::Signed, FADE_RATE, 0.0);
        let mut t = 0.0;
        for i in 0..200 {
            t += DT * (i % 7) as f64;
            fade.update(i % 3 == 0, t);
            assert!((-1.0..=1.0).contains(&fade.value()), "tick {i}: {}", fade.value());
        }
    }
}
