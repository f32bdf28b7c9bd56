use serde::{Deserialize, Serialize};

use foundation::ids::RegionId;
use foundation::math::Vec3;

use crate::components::{Color, Geometry, Light, Material, MeshDesc, Transform};
use crate::host::{HostError, NodeId, SceneHost};
use crate::markers::MarkerPlacement;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeStyle {
    pub radius: f64,
    pub segments: u32,
    pub texture_url: Option<String>,
    /// Tint applied to the texture; the fallback color when it is missing.
    pub color: Color,
}

impl Default for GlobeStyle {
    fn default() -> Self {
        Self {
            radius: 1.0,
            segments: 64,
            texture_url: Some("assets/earth.jpg".to_string()),
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    /// Radius of the sphere markers are projected onto.
    pub altitude_radius: f64,
    /// Radius of the rendered marker.
    pub size: f64,
    pub segments: u32,
    pub color: Color,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            altitude_radius: 1.01,
            size: 0.05,
            segments: 16,
            color: Color(0x006800),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingStyle {
    pub ambient_intensity: f64,
    pub directional_intensity: f64,
    pub directional_position: [f64; 3],
}

impl Default for LightingStyle {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.6,
            directional_intensity: 1.0,
            directional_position: [5.0, 3.0, 5.0],
        }
    }
}

/// Handles to the nodes making up the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeNodes {
    pub globe: NodeId,
    /// One marker per placement, in placement order.
    pub markers: Vec<(RegionId, NodeId)>,
}

pub fn add_lights(host: &mut dyn SceneHost, style: &LightingStyle) {
    host.add_light(Light::Ambient {
        color: Color::WHITE,
        intensity: style.ambient_intensity,
    });
    host.add_light(Light::Directional {
        color: Color::WHITE,
        intensity: style.directional_intensity,
        position: Vec3::from_array(style.directional_position),
    });
}

/// Builds the globe with one marker child per placement.
///
/// Markers are parented to the globe so they follow its spin.
pub fn spawn_globe(
    host: &mut dyn SceneHost,
    globe: &GlobeStyle,
    marker: &MarkerStyle,
    placements: &[MarkerPlacement],
) -> Result<GlobeNodes, HostError> {
    let globe_id = host.create_mesh(MeshDesc::new(
        Geometry::sphere(globe.radius, globe.segments),
        Material::Phong {
            color: globe.color,
            texture_url: globe.texture_url.clone(),
        },
        Transform::identity(),
    ));
    host.add_to_scene(globe_id)?;

    let mut markers = Vec::with_capacity(placements.len());
    for p in placements {
        let id = host.create_mesh(MeshDesc::new(
            Geometry::sphere(marker.size, marker.segments),
            Material::Basic { color: marker.color },
            Transform::translate(p.position),
        ));
        host.add_to_parent(globe_id, id)?;
        markers.push((p.region, id));
    }

    tracing::debug!(markers = markers.len(), "globe spawned");
    Ok(GlobeNodes {
        globe: globe_id,
        markers,
    })
}
