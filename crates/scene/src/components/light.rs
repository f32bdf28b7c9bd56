use foundation::math::Vec3;

use super::Color;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Ambient { color: Color, intensity: f64 },
    /// Light arriving from `position` toward the origin.
    Directional {
        color: Color,
        intensity: f64,
        position: Vec3,
    },
}
