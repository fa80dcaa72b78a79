use super::Vec2;

/// Size of a view or surface in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Viewport covering a surface of `width` x `height` pixels.
    #[inline]
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Maps `p` from this viewport into `target`, scaling each axis independently.
    ///
    /// Returns `None` when either viewport is degenerate.
    pub fn map_to(self, p: Vec2, target: Viewport) -> Option<Vec2> {
        if !self.is_valid() || !target.is_valid() {
            return None;
        }
        Some(Vec2::new(
            p.x * target.width / self.width,
            p.y * target.height / self.height,
        ))
    }

    /// Maps normalized coordinates (`0..=1` on both axes) into this viewport.
    ///
    /// Out-of-range input is clamped to the viewport edges.
    pub fn denormalize(self, uv: Vec2) -> Vec2 {
        let uv = uv.clamp01();
        Vec2::new(uv.x * self.width, uv.y * self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_scales_each_axis() {
        let src = Viewport::new(200.0, 100.0);
        let dst = Viewport::new(1000.0, 1000.0);
        assert_eq!(src.map_to(Vec2::new(50.0, 25.0), dst), Some(Vec2::new(250.0, 250.0)));
    }

    #[test]
    fn map_to_rejects_degenerate_viewports() {
        let ok = Viewport::new(10.0, 10.0);
        assert!(Viewport::new(0.0, 10.0).map_to(Vec2::zero(), ok).is_none());
        assert!(ok.map_to(Vec2::zero(), Viewport::new(10.0, f32::NAN)).is_none());
    }

    #[test]
    fn denormalize_clamps_outside_unit_square() {
        let vp = Viewport::from_pixels(640, 480);
        assert_eq!(vp.denormalize(Vec2::new(0.5, 0.25)), Vec2::new(320.0, 120.0));
        assert_eq!(vp.denormalize(Vec2::new(1.5, -0.5)), Vec2::new(640.0, 0.0));
    }
}
