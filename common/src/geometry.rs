//! Camera geometry: calibration rotation, intrinsics and screen projection.
//!
//! A point in vehicle-calibration space goes through four steps on its way to
//! the screen:
//!
//! ```text
//! calib ──view_from_calib──▶ view ──K──▶ image ──÷z──▶ normalized ──affine──▶ pixels
//! ```
//!
//! 1. [`CalibrationTransform`] rotates it into the camera's viewing frame
//! 2. [`CameraIntrinsics`] maps it into image space
//! 3. The perspective divide by depth gives image-plane coordinates
//! 4. [`ScreenTransform`] maps image pixels onto the framebuffer
//!
//! The projection reports a visibility flag alongside every vertex. A vertex is
//! visible when it lands inside the framebuffer grown by
//! [`VISIBLE_MARGIN`] on all sides, so points just off-screen still keep
//! filled polygons continuous. Points at or behind the camera are never visible.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use glam::{Affine2, Mat3, Vec2, Vec3};

use crate::config::{VIEWPORT, VISIBLE_MARGIN};
use crate::platform::Platform;

// =============================================================================
// Fixed Axis Permutation
// =============================================================================

/// Device frame (x forward, y right, z down) to camera view frame
/// (x right, y down, z forward).
///
/// Row form:
/// ```text
/// | 0 1 0 |
/// | 0 0 1 |
/// | 1 0 0 |
/// ```
const VIEW_FROM_DEVICE: Mat3 = Mat3::from_cols(
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
);

// =============================================================================
// Calibration
// =============================================================================

/// Rotation from vehicle-calibration space into the camera's viewing frame.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CalibrationTransform {
    view_from_calib: Mat3,
}

impl CalibrationTransform {
    /// Build from a roll/pitch/yaw calibration estimate (radians).
    ///
    /// The device-from-calibration rotation is `Rz(yaw) · Ry(pitch) · Rx(roll)`.
    pub fn from_rpy(roll: f32, pitch: f32, yaw: f32) -> Self {
        let device_from_calib = Mat3::from_rotation_z(yaw) * Mat3::from_rotation_y(pitch) * Mat3::from_rotation_x(roll);
        Self {
            view_from_calib: VIEW_FROM_DEVICE * device_from_calib,
        }
    }

    /// The composed view-from-calibration rotation.
    #[inline]
    pub const fn matrix(&self) -> Mat3 {
        self.view_from_calib
    }
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self::from_rpy(0.0, 0.0, 0.0)
    }
}

// =============================================================================
// Intrinsics
// =============================================================================

/// Pinhole camera matrix.
///
/// ```text
/// | f 0 cx |
/// | 0 f cy |
/// | 0 0  1 |
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CameraIntrinsics(Mat3);

impl CameraIntrinsics {
    /// Build from a focal length and principal point (pixels).
    pub const fn new(focal: f32, cx: f32, cy: f32) -> Self {
        Self(Mat3::from_cols(
            Vec3::new(focal, 0.0, 0.0),
            Vec3::new(0.0, focal, 0.0),
            Vec3::new(cx, cy, 1.0),
        ))
    }

    /// Narrow road camera for the given platform.
    pub const fn road(platform: Platform) -> Self {
        if platform.is_tici() {
            Self::new(2648.0, 1928.0 / 2.0, 1208.0 / 2.0)
        } else {
            Self::new(910.0, 582.0, 437.0)
        }
    }

    /// Wide road camera (reference board only).
    pub const fn wide() -> Self {
        Self::new(567.0, 1928.0 / 2.0, 1208.0 / 2.0)
    }

    /// Select the intrinsics for the active camera variant.
    pub const fn for_camera(platform: Platform, wide: bool) -> Self {
        if wide { Self::wide() } else { Self::road(platform) }
    }

    /// Focal length in pixels.
    #[inline]
    pub const fn focal(&self) -> f32 {
        self.0.x_axis.x
    }

    /// Principal point in image pixels.
    #[inline]
    pub const fn principal_point(&self) -> Vec2 {
        Vec2::new(self.0.z_axis.x, self.0.z_axis.y)
    }

    #[inline]
    pub const fn matrix(&self) -> Mat3 {
        self.0
    }
}

// =============================================================================
// Screen Transform
// =============================================================================

/// Affine map from image pixels to framebuffer pixels, plus the framebuffer
/// bounds used for culling.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ScreenTransform {
    affine: Affine2,
    framebuffer: Rectangle,
}

impl ScreenTransform {
    /// Build the transform for a framebuffer size and camera variant.
    ///
    /// The principal point lands at `(w/2, h/2 + y_offset)`; image pixels are
    /// scaled by `zoom / f` (halved for the wide camera).
    pub fn new(size: Size, intrinsics: &CameraIntrinsics, platform: Platform, wide: bool) -> Self {
        let mut zoom = platform.zoom() / intrinsics.focal();
        if wide {
            zoom *= 0.5;
        }
        let center = Vec2::new(
            size.width as f32 / 2.0,
            size.height as f32 / 2.0 + platform.y_offset(),
        );
        let affine = Affine2::from_translation(center)
            * Affine2::from_scale(Vec2::splat(zoom))
            * Affine2::from_translation(-intrinsics.principal_point());
        Self {
            affine,
            framebuffer: Rectangle::new(Point::zero(), size),
        }
    }

    /// Map an image-plane point to framebuffer pixels.
    #[inline]
    pub fn apply(&self, image: Vec2) -> Vec2 {
        self.affine.transform_point2(image)
    }

    /// Whether a pixel lies inside the framebuffer grown by the visibility margin.
    /// Both edges are inclusive.
    pub fn is_visible(&self, pixel: Vec2) -> bool {
        let left = self.framebuffer.top_left.x as f32 - VISIBLE_MARGIN;
        let top = self.framebuffer.top_left.y as f32 - VISIBLE_MARGIN;
        let right = self.framebuffer.top_left.x as f32 + self.framebuffer.size.width as f32 + VISIBLE_MARGIN;
        let bottom = self.framebuffer.top_left.y as f32 + self.framebuffer.size.height as f32 + VISIBLE_MARGIN;
        pixel.x >= left && pixel.x <= right && pixel.y >= top && pixel.y <= bottom
    }

    /// Framebuffer rectangle this transform targets.
    #[inline]
    pub const fn framebuffer(&self) -> Rectangle {
        self.framebuffer
    }
}

// =============================================================================
// Projector
// =============================================================================

/// A projected screen vertex and whether it should be drawn.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Projection {
    pub vertex: Vec2,
    pub visible: bool,
}

impl Projection {
    /// Result for points at or behind the camera. The vertex is meaningless.
    const BEHIND: Self = Self {
        vertex: Vec2::ZERO,
        visible: false,
    };
}

/// Calibration-space to screen-space projector.
///
/// Results are only meaningful after the first calibration update; callers gate
/// on their own "world objects visible" flag.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    calibration: CalibrationTransform,
    intrinsics: CameraIntrinsics,
    screen: ScreenTransform,
}

impl Projector {
    /// Create a projector for the narrow road camera on the default viewport.
    pub fn new(platform: Platform) -> Self {
        let intrinsics = CameraIntrinsics::road(platform);
        Self {
            calibration: CalibrationTransform::default(),
            intrinsics,
            screen: ScreenTransform::new(VIEWPORT, &intrinsics, platform, false),
        }
    }

    /// Replace the calibration rotation.
    #[inline]
    pub fn set_calibration(&mut self, calibration: CalibrationTransform) {
        self.calibration = calibration;
    }

    /// Switch camera variant and/or framebuffer size.
    pub fn set_camera(&mut self, size: Size, platform: Platform, wide: bool) {
        self.intrinsics = CameraIntrinsics::for_camera(platform, wide);
        self.screen = ScreenTransform::new(size, &self.intrinsics, platform, wide);
    }

    #[inline]
    pub const fn calibration(&self) -> &CalibrationTransform {
        &self.calibration
    }

    #[inline]
    pub const fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    #[inline]
    pub const fn screen(&self) -> &ScreenTransform {
        &self.screen
    }

    /// Project a calibration-space point onto the screen.
    pub fn project(&self, point: Vec3) -> Projection {
        let view = self.calibration.matrix() * point;
        let image = self.intrinsics.matrix() * view;
        if image.z <= 0.0 {
            return Projection::BEHIND;
        }

        let normalized = Vec2::new(image.x / image.z, image.y / image.z);
        let vertex = self.screen.apply(normalized);
        Projection {
            vertex,
            visible: self.screen.is_visible(vertex),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-2
    }

    // -------------------------------------------------------------------------
    // Calibration Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_zero_calibration_is_axis_permutation() {
        let calib = CalibrationTransform::default();
        let forward = calib.matrix() * Vec3::new(1.0, 0.0, 0.0);
        let right = calib.matrix() * Vec3::new(0.0, 1.0, 0.0);
        let down = calib.matrix() * Vec3::new(0.0, 0.0, 1.0);

        assert!((forward - Vec3::Z).length() < 1e-6, "forward should map to view depth");
        assert!((right - Vec3::X).length() < 1e-6, "right should map to view x");
        assert!((down - Vec3::Y).length() < 1e-6, "down should map to view y");
    }

    #[test]
    fn test_yaw_rotates_forward_axis() {
        let calib = CalibrationTransform::from_rpy(0.0, 0.0, core::f32::consts::FRAC_PI_2);
        // Yawing 90 degrees turns calibration-forward into device-right
        let forward = calib.matrix() * Vec3::new(1.0, 0.0, 0.0);
        assert!((forward - Vec3::X).length() < 1e-5, "got {forward:?}");
    }

    // -------------------------------------------------------------------------
    // Intrinsics Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_intrinsics_accessors() {
        let k = CameraIntrinsics::road(Platform::Tici);
        assert_eq!(k.focal(), 2648.0);
        assert_eq!(k.principal_point(), Vec2::new(964.0, 604.0));
    }

    #[test]
    fn test_for_camera_selects_wide() {
        assert_eq!(CameraIntrinsics::for_camera(Platform::Tici, true), CameraIntrinsics::wide());
        assert_eq!(
            CameraIntrinsics::for_camera(Platform::Tici, false),
            CameraIntrinsics::road(Platform::Tici)
        );
    }

    // -------------------------------------------------------------------------
    // Projection Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_principal_axis_maps_to_principal_point() {
        for platform in [Platform::Eon, Platform::Tici, Platform::Pc] {
            let projector = Projector::new(platform);
            let p = projector.project(Vec3::new(25.0, 0.0, 0.0));
            let expected = projector.screen().apply(projector.intrinsics().principal_point());

            assert!(p.visible, "on-axis point should be visible on {platform:?}");
            assert!(close(p.vertex, expected), "{platform:?}: {:?} != {expected:?}", p.vertex);
            assert!(close(
                expected,
                Vec2::new(960.0, 540.0 + platform.y_offset())
            ));
        }
    }

    #[test]
    fn test_point_behind_camera_is_not_visible() {
        let projector = Projector::new(Platform::Tici);
        assert!(!projector.project(Vec3::new(-5.0, 0.0, 0.0)).visible);
        assert!(!projector.project(Vec3::new(0.0, 1.0, 0.0)).visible, "zero depth");
    }

    #[test]
    fn test_far_lateral_point_is_culled() {
        let projector = Projector::new(Platform::Tici);
        // 1 m ahead and 50 m to the side lands far outside the margin
        assert!(!projector.project(Vec3::new(1.0, 50.0, 0.0)).visible);
    }

    #[test]
    fn test_visibility_margin_is_inclusive() {
        let screen = ScreenTransform::new(VIEWPORT, &CameraIntrinsics::road(Platform::Pc), Platform::Pc, false);
        assert!(screen.is_visible(Vec2::new(-VISIBLE_MARGIN, 0.0)));
        assert!(screen.is_visible(Vec2::new(1920.0 + VISIBLE_MARGIN, 1080.0 + VISIBLE_MARGIN)));
        assert!(!screen.is_visible(Vec2::new(-VISIBLE_MARGIN - 1.0, 0.0)));
        assert!(!screen.is_visible(Vec2::new(0.0, 1080.0 + VISIBLE_MARGIN + 1.0)));
    }

    #[test]
    fn test_wide_camera_halves_zoom() {
        let k = CameraIntrinsics::wide();
        let narrow = ScreenTransform::new(VIEWPORT, &k, Platform::Tici, false);
        let wide = ScreenTransform::new(VIEWPORT, &k, Platform::Tici, true);
        let offset = Vec2::new(100.0, 0.0);
        let c = k.principal_point();

        let narrow_dx = narrow.apply(c + offset).x - narrow.apply(c).x;
        let wide_dx = wide.apply(c + offset).x - wide.apply(c).x;
        assert!((narrow_dx - 2.0 * wide_dx).abs() < 1e-2);
    }

    #[test]
    fn test_set_camera_updates_framebuffer() {
        let mut projector = Projector::new(Platform::Tici);
        projector.set_camera(Size::new(800, 600), Platform::Tici, true);

        assert_eq!(projector.screen().framebuffer().size, Size::new(800, 600));
        assert_eq!(*projector.intrinsics(), CameraIntrinsics::wide());
    }
}
