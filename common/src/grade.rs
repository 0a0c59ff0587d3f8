//! Rolling road-grade estimate from distance-spaced altitude samples.
//!
//! Speed is integrated over time into travelled distance. Each time the car
//! covers [`GRADE_STEP_M`], the current altitude is recorded at its cumulative
//! distance into a ring of [`GRADE_SAMPLES`] slots. Each slot's grade is the
//! rise over run between that slot and its ring neighbour.
//!
//! # Publishing
//!
//! Nothing is published until the ring has been filled once. At that point the
//! mean over every slot is computed. After that the mean is kept up to date in
//! O(1) per sample: the outgoing slot's share is subtracted and the new one's
//! added.

use crate::config::{GRADE_SAMPLES, GRADE_STEP_M};

/// Distance-sampled rolling road-grade estimator (percent).
#[derive(Clone, Debug, PartialEq)]
pub struct GradeEstimator {
    positions: [f32; GRADE_SAMPLES],
    altitudes: [f32; GRADE_SAMPLES],
    grades: [f32; GRADE_SAMPLES],

    /// Slot the next sample is written to.
    next: usize,
    /// Samples recorded since the last reset, saturating at capacity.
    count: usize,
    /// Distance covered since the last recorded sample.
    pending_distance: f32,
    last_t: f64,

    mean: Option<f32>,
}

impl GradeEstimator {
    /// Create an empty estimator whose clock starts at `now`.
    pub const fn new(now: f64) -> Self {
        Self {
            positions: [0.0; GRADE_SAMPLES],
            altitudes: [0.0; GRADE_SAMPLES],
            grades: [0.0; GRADE_SAMPLES],
            next: 0,
            count: 0,
            pending_distance: 0.0,
            last_t: now,
            mean: None,
        }
    }

    /// Drop all samples and the published mean.
    pub fn reset(&mut self, now: f64) {
        *self = Self::new(now);
    }

    /// Integrate travel since the previous update and record a sample once a
    /// full distance step is covered.
    ///
    /// Distance only accumulates while moving forward. The clock advances on
    /// every call.
    pub fn update(&mut self, v_ego: f32, altitude: f32, now: f64) {
        if v_ego > 0.0 {
            self.pending_distance += v_ego * (now - self.last_t) as f32;
            if self.pending_distance > GRADE_STEP_M {
                let position = self.last_position() + self.pending_distance;
                self.record(position, altitude);
                self.pending_distance = 0.0;
            }
        }
        self.last_t = now;
    }

    /// Record an altitude at a cumulative travelled distance.
    pub fn record(&mut self, position: f32, altitude: f32) {
        let slot = self.next;
        self.positions[slot] = position;
        self.altitudes[slot] = altitude;
        self.next = (slot + 1) % GRADE_SAMPLES;

        if self.mean.is_some() {
            self.replace_slot(slot);
        } else {
            self.count += 1;
            if self.count == GRADE_SAMPLES {
                self.publish_initial_mean();
            }
        }
    }

    /// Mean road grade in percent, once the ring has filled.
    #[inline]
    pub const fn percent_grade(&self) -> Option<f32> {
        self.mean
    }

    /// Number of samples recorded since the last reset, up to capacity.
    #[inline]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn last_position(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.positions[(self.next + GRADE_SAMPLES - 1) % GRADE_SAMPLES]
        }
    }

    /// Grade between `slot` and its ring neighbour, or `None` for a zero run.
    fn slot_grade(&self, slot: usize) -> Option<f32> {
        let other = (slot + 1) % GRADE_SAMPLES;
        let rise = self.altitudes[slot] - self.altitudes[other];
        let run = self.positions[slot] - self.positions[other];
        (run != 0.0).then(|| rise / run * 100.0)
    }

    fn publish_initial_mean(&mut self) {
        let mut sum = 0.0;
        for slot in 0..GRADE_SAMPLES {
            if let Some(grade) = self.slot_grade(slot) {
                self.grades[slot] = grade;
                sum += grade;
            }
        }
        self.mean = Some(sum / GRADE_SAMPLES as f32);
    }

    fn replace_slot(&mut self, slot: usize) {
        let Some(grade) = self.slot_grade(slot) else {
            return;
        };
        let n = GRADE_SAMPLES as f32;
        if let Some(mean) = self.mean.as_mut() {
            *mean += (grade - self.grades[slot]) / n;
        }
        self.grades[slot] = grade;
    }
}

impl Default for GradeEstimator {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    /// Record `n` samples on a constant slope, starting at distance 0.
    fn feed_slope(estimator: &mut GradeEstimator, slope: f32, n: usize) {
        for i in 0..n {
            let d = i as f32 * GRADE_STEP_M;
            estimator.record(d, slope * d);
        }
    }

    // -------------------------------------------------------------------------
    // Publishing Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_mean_before_ring_fills() {
        let mut estimator = GradeEstimator::default();
        feed_slope(&mut estimator, 0.05, GRADE_SAMPLES - 1);
        assert_eq!(estimator.percent_grade(), None, "ring not yet full");
        assert_eq!(estimator.len(), GRADE_SAMPLES - 1);
    }

    #[test]
    fn test_constant_slope_publishes_percent() {
        let mut estimator = GradeEstimator::default();
        feed_slope(&mut estimator, 0.04, GRADE_SAMPLES);

        let grade = estimator.percent_grade().expect("ring is full");
        assert!(close(grade, 4.0), "expected 4%, got {grade}");
    }

    #[test]
    fn test_further_sample_replaces_one_slot() {
        let (m, m2) = (0.02, 0.10);
        let mut estimator = GradeEstimator::default();
        feed_slope(&mut estimator, m, GRADE_SAMPLES);
        let before = estimator.percent_grade().expect("ring is full");

        // Next sample climbs at m2 from the newest one; it lands in slot 0
        let last_d = (GRADE_SAMPLES - 1) as f32 * GRADE_STEP_M;
        let d = last_d + GRADE_STEP_M;
        let alt = m * last_d + m2 * GRADE_STEP_M;
        estimator.record(d, alt);

        // Slot 0 now pairs with slot 1, the oldest remaining sample
        let oldest_d = GRADE_STEP_M;
        let new_slot = (alt - m * oldest_d) / (d - oldest_d) * 100.0;
        let expected = before - (m * 100.0) / GRADE_SAMPLES as f32 + new_slot / GRADE_SAMPLES as f32;

        let after = estimator.percent_grade().expect("still published");
        assert!(close(after, expected), "expected {expected}, got {after}");
        assert!(after > before, "steeper sample should raise the mean");
    }

    #[test]
    fn test_zero_run_slot_is_skipped() {
        let mut estimator = GradeEstimator::default();
        feed_slope(&mut estimator, 0.03, GRADE_SAMPLES);
        let before = estimator.percent_grade();

        // Same position as slot 1 gives a zero run: the mean is untouched
        estimator.record(GRADE_STEP_M, 100.0);
        assert_eq!(estimator.percent_grade(), before);
    }

    // -------------------------------------------------------------------------
    // Distance Integration Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_update_records_at_distance_steps() {
        let mut estimator = GradeEstimator::new(0.0);
        // 10 m/s for 0.5 s per call: 5 m per call, so a sample every second call
        let mut t = 0.0;
        for _ in 0..4 {
            t += 0.5;
            estimator.update(10.0, 0.0, t);
        }
        assert_eq!(estimator.len(), 2);
    }

    #[test]
    fn test_update_ignores_stationary_and_reverse() {
        let mut estimator = GradeEstimator::new(0.0);
        estimator.update(0.0, 10.0, 100.0);
        estimator.update(-3.0, 10.0, 200.0);
        assert!(estimator.is_empty());

        // Clock moved on, so the next forward update only sees a short delta
        estimator.update(1.0, 10.0, 201.0);
        assert!(estimator.is_empty(), "1 m is below one distance step");
    }

    #[test]
    fn test_update_publishes_uphill_grade() {
        let mut estimator = GradeEstimator::new(0.0);
        let mut t = 0.0;
        // 20 m/s, 1 s per call: one sample per call, climbing 1 m per sample
        for i in 1..=GRADE_SAMPLES {
            t += 1.0;
            estimator.update(20.0, i as f32, t);
        }
        let grade = estimator.percent_grade().expect("ring is full");
        assert!(close(grade, 5.0), "1 m per 20 m is 5%, got {grade}");
    }

    #[test]
    fn test_reset_clears_published_mean() {
        let mut estimator = GradeEstimator::default();
        feed_slope(&mut estimator, 0.01, GRADE_SAMPLES);
        assert!(estimator.percent_grade().is_some());

        estimator.reset(42.0);
        assert_eq!(estimator.percent_grade(), None);
        assert!(estimator.is_empty());
    }
}
