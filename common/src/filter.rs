//! First-order low-pass filter.

/// Discrete first-order low-pass filter with a fixed sample period.
///
/// ```text
/// k = (dt / ts) / (1 + dt / ts)
/// x = (1 - k) · x + k · input
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FirstOrderFilter {
    x: f32,
    k: f32,
}

impl FirstOrderFilter {
    /// Create a filter starting at `x0` with time constant `ts` sampled every `dt` seconds.
    pub fn new(x0: f32, ts: f32, dt: f32) -> Self {
        let ratio = dt / ts;
        Self {
            x: x0,
            k: ratio / (1.0 + ratio),
        }
    }

    /// Feed one sample and return the new output.
    pub fn update(&mut self, input: f32) -> f32 {
        self.x = (1.0 - self.k) * self.x + self.k * input;
        self.x
    }

    /// Current output without feeding a sample.
    #[inline]
    pub const fn value(&self) -> f32 {
        self.x
    }

    /// Jump straight to `x` (no smoothing).
    #[inline]
    pub const fn reset(&mut self, x: f32) {
        self.x = x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_holds_steady_input() {
        let mut filter = FirstOrderFilter::new(75.0, 10.0, 0.05);
        for _ in 0..100 {
            assert!((filter.update(75.0) - 75.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_filter_first_step_gain() {
        let mut filter = FirstOrderFilter::new(0.0, 10.0, 0.05);
        let k = 0.005 / 1.005;
        assert!((filter.update(100.0) - 100.0 * k).abs() < 1e-4);
    }

    #[test]
    fn test_filter_converges_monotonically() {
        let mut filter = FirstOrderFilter::new(75.0, 1.0, 0.05);
        let mut prev = filter.value();
        for _ in 0..400 {
            let out = filter.update(10.0);
            assert!(out <= prev, "output should only fall toward the input");
            prev = out;
        }
        assert!((prev - 10.0).abs() < 0.01, "should settle near the input, got {prev}");
    }

    #[test]
    fn test_filter_reset() {
        let mut filter = FirstOrderFilter::new(75.0, 10.0, 0.05);
        filter.reset(20.0);
        assert_eq!(filter.value(), 20.0);
    }
}
