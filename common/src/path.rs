//! Trajectory truncation and closed-ribbon polygon outlines.
//!
//! Lane lines, road edges and the travel path all come from the model as
//! fixed-length trajectories. Each is drawn as a filled ribbon: the left edge is
//! projected from near to far, then the right edge from far back to near, which
//! closes the shape.
//!
//! ```text
//!   i=0 ──▶ i=1 ──▶ ... ──▶ i=k      (y − half_width)
//!                             │
//!   i=0 ◀── i=1 ◀── ... ◀── i=k      (y + half_width)
//! ```
//!
//! Only visible projections are kept, so an outline can be shorter than
//! `2(k+1)`. It can never be longer than [`OUTLINE_CAPACITY`]; exceeding it is
//! a programming error and asserts.

use glam::{Vec2, Vec3};
use heapless::Vec;

use crate::config::{LEAD_CUTOFF_FRACTION, LEAD_CUTOFF_MAX, MAX_DRAW_DISTANCE, MIN_DRAW_DISTANCE, OUTLINE_CAPACITY, TRAJECTORY_SIZE};
use crate::geometry::Projector;

// =============================================================================
// Trajectory
// =============================================================================

/// A model trajectory: `TRAJECTORY_SIZE` samples, non-decreasing in `x`.
#[derive(Clone, PartialEq, Debug)]
pub struct Trajectory {
    pub x: [f32; TRAJECTORY_SIZE],
    pub y: [f32; TRAJECTORY_SIZE],
    pub z: [f32; TRAJECTORY_SIZE],
}

impl Trajectory {
    /// Sample `i` as a 3D point.
    #[inline]
    pub fn point(&self, i: usize) -> Vec3 {
        Vec3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Forward distance of the last sample.
    #[inline]
    pub fn furthest(&self) -> f32 {
        self.x[TRAJECTORY_SIZE - 1]
    }

    /// Index of the last sample still short of `cutoff`.
    ///
    /// Returns 0 when even the first sample is past the cutoff. The result is
    /// always a valid index.
    pub fn truncation_index(&self, cutoff: f32) -> usize {
        self.x
            .iter()
            .take_while(|&&x| x < cutoff)
            .count()
            .saturating_sub(1)
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            x: [0.0; TRAJECTORY_SIZE],
            y: [0.0; TRAJECTORY_SIZE],
            z: [0.0; TRAJECTORY_SIZE],
        }
    }
}

// =============================================================================
// Draw Distance
// =============================================================================

/// Draw-distance cutoff for a trajectory, clamped to the drawable range.
#[inline]
pub fn draw_cutoff(trajectory: &Trajectory) -> f32 {
    trajectory.furthest().clamp(MIN_DRAW_DISTANCE, MAX_DRAW_DISTANCE)
}

/// Shorten a cutoff so the path stops short of a confident lead.
///
/// The lead distance is doubled, then reduced by a fraction of itself (at most
/// [`LEAD_CUTOFF_MAX`]). The result is floored at 0 and never exceeds `cutoff`.
pub fn lead_cutoff(cutoff: f32, lead_x: f32) -> f32 {
    let lead_d = lead_x * 2.0;
    let trimmed = lead_d - (lead_d * LEAD_CUTOFF_FRACTION).min(LEAD_CUTOFF_MAX);
    trimmed.clamp(0.0, cutoff.max(0.0))
}

// =============================================================================
// Polygon Outline
// =============================================================================

/// Screen-space outline of a ribbon, rebuilt wholesale on every model update.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct PolygonOutline {
    vertices: Vec<Vec2, OUTLINE_CAPACITY>,
}

impl PolygonOutline {
    /// Create an empty outline.
    pub const fn new() -> Self {
        Self { vertices: Vec::new() }
    }

    /// Build the closed ribbon for `line` up to and including `max_idx`.
    ///
    /// The left edge is offset by `-half_width` in `y`, the right edge by
    /// `+half_width`; both are raised by `z_offset`.
    ///
    /// # Panics
    ///
    /// Panics if `max_idx >= TRAJECTORY_SIZE`.
    pub fn build(projector: &Projector, line: &Trajectory, half_width: f32, z_offset: f32, max_idx: usize) -> Self {
        assert!(max_idx < TRAJECTORY_SIZE, "truncation index {max_idx} out of range");

        let mut outline = Self::new();
        for i in 0..=max_idx {
            outline.push_projected(projector, line, i, -half_width, z_offset);
        }
        for i in (0..=max_idx).rev() {
            outline.push_projected(projector, line, i, half_width, z_offset);
        }
        outline
    }

    fn push_projected(&mut self, projector: &Projector, line: &Trajectory, i: usize, y_offset: f32, z_offset: f32) {
        let point = line.point(i) + Vec3::new(0.0, y_offset, z_offset);
        let projection = projector.project(point);
        if projection.visible {
            assert!(
                self.vertices.push(projection.vertex).is_ok(),
                "polygon outline exceeded {OUTLINE_CAPACITY} vertices"
            );
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Drop all vertices.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    /// Straight road ahead: x from 0 to `far`, centered, flat.
    fn straight(far: f32) -> Trajectory {
        let mut line = Trajectory::default();
        for i in 0..TRAJECTORY_SIZE {
            line.x[i] = far * i as f32 / (TRAJECTORY_SIZE - 1) as f32;
        }
        line
    }

    /// Trajectory starting well ahead so every sample projects in front of the camera.
    fn ahead(near: f32, far: f32) -> Trajectory {
        let mut line = Trajectory::default();
        for i in 0..TRAJECTORY_SIZE {
            line.x[i] = near + (far - near) * i as f32 / (TRAJECTORY_SIZE - 1) as f32;
            line.z[i] = 1.2;
        }
        line
    }

    // -------------------------------------------------------------------------
    // Truncation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_truncation_index_stops_before_cutoff() {
        let line = straight(64.0); // x = 0, 2, 4, ...
        assert_eq!(line.truncation_index(5.0), 2, "x=4 is the last sample below 5");
        assert_eq!(line.truncation_index(4.0), 1, "cutoff is exclusive");
    }

    #[test]
    fn test_truncation_index_bounds() {
        let line = ahead(20.0, 180.0);
        assert_eq!(line.truncation_index(10.0), 0, "nothing below cutoff still yields 0");
        assert_eq!(line.truncation_index(1000.0), TRAJECTORY_SIZE - 1);
    }

    #[test]
    fn test_draw_cutoff_is_clamped() {
        assert_eq!(draw_cutoff(&straight(5.0)), MIN_DRAW_DISTANCE);
        assert_eq!(draw_cutoff(&straight(50.0)), 50.0);
        assert_eq!(draw_cutoff(&straight(250.0)), MAX_DRAW_DISTANCE);
    }

    #[test]
    fn test_lead_cutoff() {
        // Close lead: 2 * 10 = 20, minus 35% = 13
        assert!((lead_cutoff(100.0, 10.0) - 13.0).abs() < 1e-4);
        // Far lead: 2 * 40 = 80, minus capped 10 = 70
        assert!((lead_cutoff(100.0, 40.0) - 70.0).abs() < 1e-4);
        // Never beyond the prior cutoff
        assert_eq!(lead_cutoff(50.0, 40.0), 50.0);
        // Never negative
        assert_eq!(lead_cutoff(50.0, -3.0), 0.0);
    }

    // -------------------------------------------------------------------------
    // Outline Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_outline_count_bounded_by_truncation_index() {
        let projector = Projector::new(Platform::Tici);
        let line = ahead(6.0, 90.0);
        for k in [0, 1, 7, TRAJECTORY_SIZE - 1] {
            let outline = PolygonOutline::build(&projector, &line, 0.5, 0.0, k);
            assert!(outline.len() <= 2 * (k + 1), "k={k} gave {} vertices", outline.len());
            assert!(outline.len() <= OUTLINE_CAPACITY);
        }
    }

    #[test]
    fn test_outline_is_closed_ribbon() {
        let projector = Projector::new(Platform::Tici);
        let line = ahead(6.0, 90.0);
        let k = 10;
        let outline = PolygonOutline::build(&projector, &line, 0.5, 0.0, k);
        assert_eq!(outline.len(), 2 * (k + 1), "all samples ahead should be visible");

        let vertices = outline.vertices();
        let first = projector.project(line.point(0) + Vec3::new(0.0, -0.5, 0.0)).vertex;
        let last = projector.project(line.point(0) + Vec3::new(0.0, 0.5, 0.0)).vertex;
        assert_eq!(vertices[0], first, "outline starts on the near left edge");
        assert_eq!(vertices[vertices.len() - 1], last, "outline ends on the near right edge");

        // The turn-around happens at the far sample
        let far_left = projector.project(line.point(k) + Vec3::new(0.0, -0.5, 0.0)).vertex;
        let far_right = projector.project(line.point(k) + Vec3::new(0.0, 0.5, 0.0)).vertex;
        assert_eq!(vertices[k], far_left);
        assert_eq!(vertices[k + 1], far_right);
    }

    #[test]
    fn test_outline_skips_points_behind_camera() {
        let projector = Projector::new(Platform::Tici);
        let mut line = ahead(6.0, 90.0);
        line.x[0] = -1.0;
        let outline = PolygonOutline::build(&projector, &line, 0.5, 0.0, 3);
        assert_eq!(outline.len(), 6, "both passes drop the sample behind the camera");
    }

    #[test]
    fn test_full_trajectory_fits_capacity() {
        let projector = Projector::new(Platform::Tici);
        let outline = PolygonOutline::build(&projector, &ahead(6.0, 90.0), 0.5, 0.0, TRAJECTORY_SIZE - 1);
        assert_eq!(outline.len(), OUTLINE_CAPACITY);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_outline_rejects_bad_index() {
        let projector = Projector::new(Platform::Tici);
        let _ = PolygonOutline::build(&projector, &Trajectory::default(), 0.5, 0.0, TRAJECTORY_SIZE);
    }

    #[test]
    fn test_clear_empties_outline() {
        let projector = Projector::new(Platform::Tici);
        let mut outline = PolygonOutline::build(&projector, &ahead(6.0, 90.0), 0.5, 0.0, 4);
        assert!(!outline.is_empty());
        outline.clear();
        assert!(outline.is_empty());
    }
}
