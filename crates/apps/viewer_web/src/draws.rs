//! Per-frame draw list built from the scene graph.
//!
//! Kept free of browser and GPU types so it can be checked natively; the wgpu
//! renderer and the 2D text overlay only consume what is produced here.

use foundation::math::{Vec3, mat4_from_basis};
use layers::labels::LINE_SPACING;
use scene::camera::{PerspectiveCamera, Viewport};
use scene::components::{Color, Geometry, Light, Material};
use scene::graph::SceneGraph;
use scene::host::NodeId;

use crate::mesh::{PointVertex, srgb_to_linear};

/// Shininess used for Phong highlights.
pub const SHININESS: f32 = 30.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    /// Direction toward the directional light.
    pub light_dir: [f32; 4],
    /// x: ambient intensity, y: directional intensity, z: shininess.
    pub light: [f32; 4],
    pub camera_pos: [f32; 4],
}

/// Per-instance data of a sphere draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereInstance {
    pub model: [[f32; 4]; 4],
    /// Linear RGB, alpha unused.
    pub color: [f32; 4],
    /// x: 1 for lit materials, 0 for unlit.
    pub params: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SphereDraw {
    pub segments: (u32, u32),
    pub texture_url: Option<String>,
    pub instance: SphereInstance,
}

/// Point cloud in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsDraw {
    pub node: NodeId,
    pub vertices: Vec<PointVertex>,
}

/// Text block positioned in CSS pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub lines: Vec<String>,
    /// Baseline-left of the first line.
    pub x_px: f64,
    pub y_px: f64,
    pub font_px: f64,
    pub line_height_px: f64,
    pub color_css: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub globals: Globals,
    pub spheres: Vec<SphereDraw>,
    pub points: Vec<PointsDraw>,
    pub texts: Vec<TextDraw>,
}

fn linear_rgba(color: Color) -> [f32; 4] {
    let [r, g, b] = color.rgb_f32();
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), 1.0]
}

fn globals(lights: &[Light], camera: &PerspectiveCamera) -> Globals {
    let mut ambient = 0.0f32;
    let mut directional = 0.0f32;
    let mut light_dir = Vec3::Y;
    for light in lights {
        match *light {
            Light::Ambient { intensity, .. } => ambient += intensity as f32,
            Light::Directional {
                intensity, position, ..
            } => {
                directional += intensity as f32;
                light_dir = position.normalize().unwrap_or(Vec3::Y);
            }
        }
    }
    let eye = camera.position.to_f32();
    let dir = light_dir.to_f32();
    Globals {
        view_proj: camera.view_proj(),
        light_dir: [dir[0], dir[1], dir[2], 0.0],
        light: [ambient, directional, SHININESS, 0.0],
        camera_pos: [eye[0], eye[1], eye[2], 1.0],
    }
}

fn text_draw(
    text: &str,
    size: f64,
    anchor: Vec3,
    color: Color,
    camera: &PerspectiveCamera,
    viewport: Viewport,
) -> Option<TextDraw> {
    let depth = camera.depth_of(anchor);
    if depth <= camera.near {
        return None;
    }
    let ndc = camera.project_to_ndc(anchor)?;
    let font_px = size * camera.pixels_per_unit(viewport, depth);
    Some(TextDraw {
        lines: text.split('\n').map(str::to_string).collect(),
        x_px: (ndc.x + 1.0) * 0.5 * viewport.width,
        y_px: (1.0 - ndc.y) * 0.5 * viewport.height,
        font_px,
        line_height_px: font_px * LINE_SPACING,
        color_css: color.css(),
    })
}

/// Everything attached to the scene, ready to draw from `camera`.
pub fn collect_draws(graph: &SceneGraph, camera: &PerspectiveCamera, viewport: Viewport) -> DrawList {
    let mut list = DrawList {
        globals: globals(graph.lights(), camera),
        spheres: Vec::new(),
        points: Vec::new(),
        texts: Vec::new(),
    };

    for (id, node, world) in graph.attached() {
        let material = &node.mesh.material;
        match &node.mesh.geometry {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => {
                let (lit, texture_url) = match material {
                    Material::Phong { texture_url, .. } => (1.0, texture_url.clone()),
                    _ => (0.0, None),
                };
                list.spheres.push(SphereDraw {
                    segments: (*width_segments, *height_segments),
                    texture_url,
                    instance: SphereInstance {
                        model: mat4_from_basis(world.position, &world.rotation, world.scale * radius),
                        color: linear_rgba(material.color()),
                        params: [lit, 0.0, 0.0, 0.0],
                    },
                });
            }
            Geometry::Points { positions } => {
                let color = linear_rgba(material.color());
                let vertices = positions
                    .iter()
                    .map(|p| PointVertex {
                        position: world
                            .apply_point(Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
                            .to_f32(),
                        color: [color[0], color[1], color[2]],
                    })
                    .collect();
                list.points.push(PointsDraw { node: id, vertices });
            }
            Geometry::Text { text, size, .. } => {
                if let Some(draw) = text_draw(
                    text,
                    size * world.scale,
                    world.position,
                    material.color(),
                    camera,
                    viewport,
                ) {
                    list.texts.push(draw);
                }
            }
        }
    }

    list
}

#[cfg(test)]
mod tests {
    use super::collect_draws;
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;
    use scene::camera::{PerspectiveCamera, Viewport};
    use scene::components::{Color, Geometry, Light, Material, MeshDesc, Transform};
    use scene::graph::SceneGraph;
    use scene::host::SceneHost;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 200.0).looking_at(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO)
    }

    #[test]
    fn detached_nodes_are_not_drawn() {
        let mut graph = SceneGraph::new();
        let globe = graph.create_mesh(MeshDesc::new(
            Geometry::sphere(1.0, 64),
            Material::Phong {
                color: Color::WHITE,
                texture_url: Some("assets/earth.jpg".to_string()),
            },
            Transform::identity(),
        ));
        let _orphan = graph.create_mesh(MeshDesc::new(
            Geometry::sphere(0.05, 16),
            Material::Basic { color: Color(0x006800) },
            Transform::identity(),
        ));
        graph.add_to_scene(globe).unwrap();

        let list = collect_draws(&graph, &camera(), Viewport::new(800.0, 800.0));
        assert_eq!(list.spheres.len(), 1);
        assert_eq!(list.spheres[0].texture_url.as_deref(), Some("assets/earth.jpg"));
        assert_eq!(list.spheres[0].instance.params[0], 1.0);
    }

    #[test]
    fn marker_model_follows_parent_and_radius() {
        let mut graph = SceneGraph::new();
        let globe = graph.create_mesh(MeshDesc::new(
            Geometry::sphere(1.0, 64),
            Material::Phong {
                color: Color::WHITE,
                texture_url: None,
            },
            Transform::rotation_y(std::f64::consts::PI),
        ));
        let marker = graph.create_mesh(MeshDesc::new(
            Geometry::sphere(0.05, 16),
            Material::Basic { color: Color(0x006800) },
            Transform::translate(Vec3::new(1.01, 0.0, 0.0)),
        ));
        graph.add_to_scene(globe).unwrap();
        graph.add_to_parent(globe, marker).unwrap();

        let list = collect_draws(&graph, &camera(), Viewport::new(800.0, 800.0));
        let m = list.spheres[1].instance.model;
        assert!((m[3][0] + 1.01).abs() < 1e-5);
        assert!((m[0][0].abs() - 0.05).abs() < 1e-6);
        assert_eq!(list.spheres[1].instance.params[0], 0.0);
        assert_eq!(list.spheres[1].instance.color[0], 0.0);
    }

    #[test]
    fn lights_fold_into_globals() {
        let mut graph = SceneGraph::new();
        graph.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 0.6,
        });
        graph.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::new(0.0, 3.0, 4.0),
        });
        let list = collect_draws(&graph, &camera(), Viewport::new(800.0, 800.0));
        assert_eq!(list.globals.light[0], 0.6);
        assert_eq!(list.globals.light[1], 1.0);
        assert!((list.globals.light_dir[1] - 0.6).abs() < 1e-6);
        assert!((list.globals.light_dir[2] - 0.8).abs() < 1e-6);
        assert_eq!(list.globals.camera_pos, [0.0, 0.0, 4.0, 1.0]);
    }

    #[test]
    fn text_lands_at_projected_anchor() {
        let mut graph = SceneGraph::new();
        let text = graph.create_mesh(MeshDesc::new(
            Geometry::Text {
                text: "Rainforests\nsecond".to_string(),
                size: 0.18,
                depth: 0.05,
            },
            Material::Basic { color: Color(0x006800) },
            Transform::identity(),
        ));
        let behind = graph.create_mesh(MeshDesc::new(
            Geometry::Text {
                text: "hidden".to_string(),
                size: 0.1,
                depth: 0.0,
            },
            Material::Basic { color: Color::WHITE },
            Transform::translate(Vec3::new(0.0, 0.0, 10.0)),
        ));
        graph.add_to_scene(text).unwrap();
        graph.add_to_scene(behind).unwrap();

        let viewport = Viewport::new(800.0, 600.0);
        let list = collect_draws(&graph, &camera(), viewport);
        assert_eq!(list.texts.len(), 1);
        let draw = &list.texts[0];
        assert_eq!(draw.lines, vec!["Rainforests".to_string(), "second".to_string()]);
        assert!((draw.x_px - 400.0).abs() < 1e-6);
        assert!((draw.y_px - 300.0).abs() < 1e-6);
        assert_eq!(draw.color_css, "#006800");
        let expected = 0.18 * camera().pixels_per_unit(viewport, 4.0);
        assert!((draw.font_px - expected).abs() < 1e-9);
    }

    #[test]
    fn stars_become_world_space_points() {
        let mut graph = SceneGraph::new();
        let stars = graph.create_mesh(MeshDesc::new(
            Geometry::Points {
                positions: vec![[1.0, 2.0, 3.0]],
            },
            Material::Points {
                color: Color::WHITE,
                size: 0.3,
            },
            Transform::translate(Vec3::new(1.0, 0.0, 0.0)),
        ));
        graph.add_to_scene(stars).unwrap();
        let list = collect_draws(&graph, &camera(), Viewport::new(800.0, 800.0));
        assert_eq!(list.points[0].node, stars);
        assert_eq!(list.points[0].vertices[0].position, [2.0, 2.0, 3.0]);
        assert_eq!(list.points[0].vertices[0].color, [1.0, 1.0, 1.0]);
    }
}
