use serde::{Deserialize, Serialize};

use foundation::math::{Mat3, Vec3};
use scene::components::{Color, Geometry, Material, MeshDesc, Transform};
use scene::host::{HostError, NodeId, SceneHost};
use scene::picking::{HitVolume, Ray, pick_nearest};

/// Horizontal advance of one glyph, in units of font size.
pub const GLYPH_ADVANCE: f64 = 0.6;
/// Baseline-to-baseline distance, in units of font size.
pub const LINE_SPACING: f64 = 1.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub text: String,
    pub size: f64,
    pub depth: f64,
    pub position: [f64; 3],
    pub color: Color,
    /// Turns to face the camera every frame.
    #[serde(default)]
    pub billboard: bool,
    /// Opened in a new browsing context when the label is clicked.
    #[serde(default)]
    pub link: Option<String>,
}

pub const CREDIT_URL: &str = "https://earth.org/world-rainforest-day-worlds-great-rainforests/";

pub fn default_labels() -> Vec<LabelSpec> {
    vec![
        LabelSpec {
            text: "Rainforests".to_string(),
            size: 0.18,
            depth: 0.05,
            position: [-0.7, 1.2, 0.0],
            color: Color(0x006800),
            billboard: false,
            link: None,
        },
        LabelSpec {
            text: "All this info was found at:\nearth.org\n(double click to read more)".to_string(),
            size: 0.07,
            depth: 0.02,
            position: [-2.5, -0.5, 0.0],
            color: Color::WHITE,
            billboard: true,
            link: Some(CREDIT_URL.to_string()),
        },
        LabelSpec {
            text: "Rainforests are vital ecosystems that\nregulate climate, host immense biodiversity,\nand support human life.\nHover over the rainforests around\nthe world to see more information.".to_string(),
            size: 0.07,
            depth: 0.02,
            position: [1.2, 1.0, 0.0],
            color: Color::WHITE,
            billboard: true,
            link: None,
        },
    ]
}

/// Approximate extent of a text block in label-local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextLayout {
    pub width: f64,
    pub height: f64,
    /// Center of the block relative to the anchor (baseline-left of line one).
    pub center: Vec3,
}

pub fn layout_text(text: &str, size: f64, depth: f64) -> TextLayout {
    let (lines, widest) = text
        .split('\n')
        .fold((0usize, 0usize), |(n, w), line| (n + 1, w.max(line.chars().count())));
    let width = widest as f64 * size * GLYPH_ADVANCE;
    let height = size + (lines.saturating_sub(1)) as f64 * size * LINE_SPACING;
    TextLayout {
        width,
        height,
        center: Vec3::new(width * 0.5, size - height * 0.5, depth * 0.5),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub spec: LabelSpec,
    pub node: NodeId,
    pub layout: TextLayout,
    pub rotation: Mat3,
}

impl PlacedLabel {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.spec.position)
    }

    pub fn transform(&self) -> Transform {
        Transform::translate(self.position()).with_rotation(self.rotation)
    }

    pub fn hit_volume(&self) -> HitVolume {
        let t = self.transform();
        HitVolume::Quad {
            center: t.apply_point(self.layout.center),
            right: t.apply_vector(Vec3::X * (self.layout.width * 0.5)),
            up: t.apply_vector(Vec3::Y * (self.layout.height * 0.5)),
        }
    }
}

/// Text labels living in the scene root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<PlacedLabel>,
}

impl LabelSet {
    pub fn spawn(host: &mut dyn SceneHost, specs: &[LabelSpec]) -> Result<Self, HostError> {
        let mut labels = Vec::with_capacity(specs.len());
        for spec in specs {
            let placed_at = Transform::translate(Vec3::from_array(spec.position));
            let node = host.create_mesh(MeshDesc::new(
                Geometry::Text {
                    text: spec.text.clone(),
                    size: spec.size,
                    depth: spec.depth,
                },
                Material::Basic { color: spec.color },
                placed_at,
            ));
            host.add_to_scene(node)?;
            labels.push(PlacedLabel {
                spec: spec.clone(),
                node,
                layout: layout_text(&spec.text, spec.size, spec.depth),
                rotation: Mat3::IDENTITY,
            });
        }
        tracing::debug!(labels = labels.len(), "labels spawned");
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedLabel> {
        self.labels.iter()
    }

    /// Turns billboards toward `eye` and pushes their transforms to the host.
    pub fn face_camera(&mut self, host: &mut dyn SceneHost, eye: Vec3) -> Result<(), HostError> {
        for label in self.labels.iter_mut().filter(|l| l.spec.billboard) {
            // Camera straight above or below: keep the last orientation.
            let Some(rotation) = Mat3::look_at(label.position(), eye, Vec3::Y) else {
                continue;
            };
            label.rotation = rotation;
            host.set_transform(label.node, label.transform())?;
        }
        Ok(())
    }

    /// Link of the nearest clickable label under `ray`.
    pub fn link_under(&self, ray: &Ray) -> Option<&str> {
        let clickable = self
            .labels
            .iter()
            .filter_map(|l| l.spec.link.as_deref().map(|url| (url, l.hit_volume())));
        pick_nearest(ray, clickable).map(|hit| hit.key)
    }
}

#[cfg(test)]
mod tests {
    use super::{CREDIT_URL, LabelSet, default_labels, layout_text};
    use foundation::math::Vec3;
    use scene::graph::SceneGraph;
    use scene::picking::Ray;

    #[test]
    fn layout_grows_with_lines_and_width() {
        let one = layout_text("abcd", 0.1, 0.0);
        assert!((one.width - 0.24).abs() < 1e-12);
        assert!((one.height - 0.1).abs() < 1e-12);

        let three = layout_text("ab\nabcdef\na", 0.1, 0.0);
        assert!((three.width - 0.36).abs() < 1e-12);
        assert!((three.height - (0.1 + 2.0 * 0.13)).abs() < 1e-12);
        assert!(three.center.y < 0.0);
    }

    #[test]
    fn spawns_every_label_into_scene() {
        let mut host = SceneGraph::new();
        let labels = LabelSet::spawn(&mut host, &default_labels()).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(host.texts().len(), 3);
        assert!(host.texts().contains(&"Rainforests"));
    }

    #[test]
    fn billboards_face_camera_and_title_does_not() {
        let mut host = SceneGraph::new();
        let mut labels = LabelSet::spawn(&mut host, &default_labels()).unwrap();
        let eye = Vec3::new(0.0, 0.0, 4.0);
        labels.face_camera(&mut host, eye).unwrap();

        for label in labels.iter() {
            let world = host.world_transform(label.node).unwrap();
            let facing = world.rotation.column(2);
            if label.spec.billboard {
                let to_eye = (eye - label.position()).normalize().unwrap();
                assert!((facing.dot(to_eye) - 1.0).abs() < 1e-9);
            } else {
                assert_eq!(facing, Vec3::Z);
            }
        }
    }

    #[test]
    fn credit_click_resolves_link() {
        let mut host = SceneGraph::new();
        let mut labels = LabelSet::spawn(&mut host, &default_labels()).unwrap();
        let eye = Vec3::new(0.0, 0.0, 4.0);
        labels.face_camera(&mut host, eye).unwrap();

        let credit = labels.iter().find(|l| l.spec.link.is_some()).unwrap();
        let scene::picking::HitVolume::Quad { center, .. } = credit.hit_volume() else {
            panic!("labels use quads");
        };
        let ray = Ray::new(eye, (center - eye).normalize().unwrap());
        assert_eq!(labels.link_under(&ray), Some(CREDIT_URL));

        let intro = labels.iter().find(|l| l.spec.text.starts_with("Rainforests are")).unwrap();
        let scene::picking::HitVolume::Quad { center, .. } = intro.hit_volume() else {
            panic!("labels use quads");
        };
        let ray = Ray::new(eye, (center - eye).normalize().unwrap());
        assert_eq!(labels.link_under(&ray), None);
    }
}
