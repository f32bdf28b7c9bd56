use serde::{Deserialize, Serialize};

use crate::components::{Color, Geometry, Material, MeshDesc, Transform};
use crate::host::{HostError, NodeId, SceneHost};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldStyle {
    pub count: u32,
    /// Edge length of the cube the stars fill, centered on the origin.
    pub spread: f64,
    pub size: f64,
    pub seed: u32,
}

impl Default for StarfieldStyle {
    fn default() -> Self {
        Self {
            count: 2000,
            spread: 100.0,
            size: 0.3,
            seed: 0x68bc_21eb,
        }
    }
}

fn hash_u32(x_in: u32) -> u32 {
    // 32-bit integer mix (non-linear) to avoid visible correlation patterns.
    let mut x = x_in;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn hash01(x: u32) -> f64 {
    hash_u32(x) as f64 / u32::MAX as f64
}

/// Deterministic star positions uniformly filling the style's cube.
pub fn star_positions(style: &StarfieldStyle) -> Vec<[f32; 3]> {
    (0..style.count)
        .map(|i| {
            let base = i.wrapping_mul(3) ^ style.seed;
            let coord = |salt: u32| ((hash01(base.wrapping_add(salt)) - 0.5) * style.spread) as f32;
            [coord(0), coord(0x02e5_be93), coord(0x9e37_79b9)]
        })
        .collect()
}

pub fn spawn_starfield(host: &mut dyn SceneHost, style: &StarfieldStyle) -> Result<NodeId, HostError> {
    let id = host.create_mesh(MeshDesc::new(
        Geometry::Points {
            positions: star_positions(style),
        },
        Material::Points {
            color: Color::WHITE,
            size: style.size,
        },
        Transform::identity(),
    ));
    host.add_to_scene(id)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::{StarfieldStyle, star_positions};

    #[test]
    fn stars_fill_the_cube_deterministically() {
        let style = StarfieldStyle::default();
        let a = star_positions(&style);
        let b = star_positions(&style);
        assert_eq!(a.len(), 2000);
        assert_eq!(a, b);
        let half = (style.spread / 2.0) as f32;
        assert!(a.iter().flatten().all(|c| c.abs() <= half));
        // Not collapsed onto a plane or a corner.
        assert!(a.iter().any(|p| p[0] > 10.0) && a.iter().any(|p| p[0] < -10.0));
        assert!(a.iter().any(|p| p[2] > 10.0) && a.iter().any(|p| p[2] < -10.0));
    }

    #[test]
    fn seed_changes_the_field() {
        let a = star_positions(&StarfieldStyle::default());
        let b = star_positions(&StarfieldStyle {
            seed: 7,
            ..StarfieldStyle::default()
        });
        assert_ne!(a, b);
    }
}
