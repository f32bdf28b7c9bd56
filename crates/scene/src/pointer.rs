use foundation::math::Vec2;

use crate::camera::Viewport;

/// Pointer position in normalized device coordinates.
///
/// `x` grows to the right and `y` grows upward; both lie in [-1, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerState {
    pub ndc: Vec2,
}

impl PointerState {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            ndc: Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)),
        }
    }

    /// Converts device pixels (origin top-left, y down) to NDC.
    ///
    /// Positions outside the viewport are clamped to its edge.
    pub fn from_pixels(x_px: f64, y_px: f64, viewport: Viewport) -> Self {
        Self::new(
            2.0 * x_px / viewport.width - 1.0,
            1.0 - 2.0 * y_px / viewport.height,
        )
    }
}
