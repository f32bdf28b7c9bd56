use serde::{Deserialize, Serialize};

use super::Transform;

/// sRGB color packed as `0xRRGGBB`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);

    pub fn rgb_f32(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }

    pub fn css(self) -> String {
        format!("#{:06x}", self.0 & 0xff_ffff)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    /// Point cloud, positions in local space.
    Points { positions: Vec<[f32; 3]> },
    /// Extruded text. Lines are separated by `\n`; the anchor is the
    /// baseline-left of the first line.
    Text { text: String, size: f64, depth: f64 },
}

impl Geometry {
    pub fn sphere(radius: f64, segments: u32) -> Self {
        Geometry::Sphere {
            radius,
            width_segments: segments,
            height_segments: segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Lit material, optionally textured from an image URL.
    Phong { color: Color, texture_url: Option<String> },
    /// Unlit flat color.
    Basic { color: Color },
    /// Screen-facing points of fixed world size.
    Points { color: Color, size: f64 },
}

impl Material {
    pub fn color(&self) -> Color {
        match self {
            Material::Phong { color, .. }
            | Material::Basic { color }
            | Material::Points { color, .. } => *color,
        }
    }
}

/// Everything a host needs to instantiate a mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDesc {
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
}

impl MeshDesc {
    pub fn new(geometry: Geometry, material: Material, transform: Transform) -> Self {
        Self {
            geometry,
            material,
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn color_channels() {
        assert_eq!(Color(0x006800).rgb_f32(), [0.0, 104.0 / 255.0, 0.0]);
        assert_eq!(Color(0x006800).css(), "#006800");
        assert_eq!(Color::WHITE.rgb_f32(), [1.0, 1.0, 1.0]);
    }
}
