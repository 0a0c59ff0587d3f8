//! Hardware platform variants.
//!
//! The platform decides which camera intrinsics, zoom and exposure limits the
//! pipeline uses. It is reported once by the hardware layer and never changes
//! for the life of the process.

/// Hardware platform the UI runs on.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Platform {
    /// Previous-generation device.
    Eon,
    /// Reference embedded board (has the wide road camera).
    Tici,
    /// Desktop or development build.
    #[default]
    Pc,
}

impl Platform {
    /// Whether this is the reference embedded board.
    #[inline]
    pub const fn is_tici(self) -> bool {
        matches!(self, Self::Tici)
    }

    /// Whether this is the previous-generation device.
    #[inline]
    pub const fn is_eon(self) -> bool {
        matches!(self, Self::Eon)
    }

    /// Whether this is a desktop/dev build.
    #[inline]
    pub const fn is_pc(self) -> bool {
        matches!(self, Self::Pc)
    }

    /// Maximum exposure value of the road camera (integration lines × gain).
    pub fn max_exposure(self) -> f32 {
        let (max_lines, max_gain) = if self.is_eon() { (5408.0, 1.0) } else { (1904.0, 10.0) };
        let max_ev = max_lines * max_gain;
        if self.is_tici() { max_ev / 6.0 } else { max_ev }
    }

    /// Camera-to-screen zoom factor.
    #[inline]
    pub const fn zoom(self) -> f32 {
        if self.is_tici() { 2912.8 } else { 2138.5 }
    }

    /// Vertical offset of the projected road image (pixels).
    #[inline]
    pub const fn y_offset(self) -> f32 {
        if self.is_eon() { 0.0 } else { 150.0 }
    }
}
