use foundation::handles::Handle;

use crate::camera::{PerspectiveCamera, Viewport};
use crate::components::{Geometry, Light, MeshDesc, Transform};
use crate::host::{HostError, NodeId, SceneHost};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub mesh: MeshDesc,
    pub parent: Option<NodeId>,
    pub in_scene: bool,
}

/// In-memory scene graph implementing `SceneHost`.
///
/// Headless runs and tests inspect it directly; GPU hosts keep one as their
/// node store and draw from it. `render` only counts frames and remembers the
/// camera.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    lights: Vec<Light>,
    camera_aspect: Option<f64>,
    viewport: Option<Viewport>,
    last_camera: Option<PerspectiveCamera>,
    frames_rendered: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index() as usize)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(Handle::new(i as u32, 0)), n))
    }

    pub fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, n)| n.parent == Some(parent))
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether `id` hangs, directly or through ancestors, off the scene root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(id) = cur {
            let Some(node) = self.node(id) else {
                return false;
            };
            if node.in_scene {
                return true;
            }
            cur = node.parent;
        }
        false
    }

    /// Attached nodes with their world transforms, in creation order.
    pub fn attached(&self) -> Vec<(NodeId, &Node, Transform)> {
        self.nodes()
            .filter(|(id, _)| self.is_attached(*id))
            .filter_map(|(id, n)| Some((id, n, self.world_transform(id)?)))
            .collect()
    }

    /// Text of every attached text node, in creation order.
    pub fn texts(&self) -> Vec<&str> {
        self.attached()
            .into_iter()
            .filter_map(|(_, n, _)| match &n.mesh.geometry {
                Geometry::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn camera_aspect(&self) -> Option<f64> {
        self.camera_aspect
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn last_camera(&self) -> Option<&PerspectiveCamera> {
        self.last_camera.as_ref()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Transform of `id` in world space, composed through its ancestors.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        let node = self.node(id)?;
        let local = node.mesh.transform;
        match node.parent {
            None => Some(local),
            Some(parent) => Some(self.world_transform(parent)?.then(&local)),
        }
    }

    fn check(&self, id: NodeId) -> Result<(), HostError> {
        if (id.index() as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(HostError::UnknownNode(id))
        }
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cur = Some(of);
        while let Some(id) = cur {
            if id == candidate {
                return true;
            }
            cur = self.node(id).and_then(|n| n.parent);
        }
        false
    }
}

impl SceneHost for SceneGraph {
    fn create_mesh(&mut self, mesh: MeshDesc) -> NodeId {
        let id = NodeId(Handle::new(self.nodes.len() as u32, 0));
        self.nodes.push(Node {
            mesh,
            parent: None,
            in_scene: false,
        });
        id
    }

    fn add_to_scene(&mut self, node: NodeId) -> Result<(), HostError> {
        self.check(node)?;
        let n = &mut self.nodes[node.index() as usize];
        n.in_scene = true;
        n.parent = None;
        Ok(())
    }

    fn add_to_parent(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.check(parent)?;
        self.check(child)?;
        if self.is_ancestor(child, parent) {
            return Err(HostError::Cycle { parent, child });
        }
        let n = &mut self.nodes[child.index() as usize];
        n.parent = Some(parent);
        n.in_scene = false;
        Ok(())
    }

    fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), HostError> {
        self.check(node)?;
        self.nodes[node.index() as usize].mesh.transform = transform;
        Ok(())
    }

    fn set_camera_aspect(&mut self, aspect: f64) {
        self.camera_aspect = Some(aspect);
    }

    fn resize_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), HostError> {
        self.last_camera = Some(*camera);
        self.frames_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SceneGraph;
    use crate::components::{Color, Geometry, Material, MeshDesc, Transform};
    use crate::host::{HostError, SceneHost};
    use foundation::math::Vec3;

    fn dot(host: &mut SceneGraph, at: Vec3) -> crate::host::NodeId {
        host.create_mesh(MeshDesc::new(
            Geometry::sphere(0.05, 16),
            Material::Basic { color: Color(0x006800) },
            Transform::translate(at),
        ))
    }

    #[test]
    fn children_inherit_parent_transform() {
        let mut host = SceneGraph::new();
        let parent = dot(&mut host, Vec3::new(1.0, 0.0, 0.0));
        let child = dot(&mut host, Vec3::new(0.0, 2.0, 0.0));
        host.add_to_scene(parent).unwrap();
        host.add_to_parent(parent, child).unwrap();

        let world = host.world_transform(child).unwrap();
        assert_eq!(world.position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(host.children_of(parent), vec![child]);
    }

    #[test]
    fn handles_follow_creation_order() {
        let mut host = SceneGraph::new();
        let ids: Vec<_> = (0..3).map(|_| dot(&mut host, Vec3::ZERO)).collect();
        let issued: Vec<(u32, u32)> = ids.iter().map(|id| (id.0.index(), id.0.generation())).collect();
        assert_eq!(issued, vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn rejects_cycles_and_unknown_nodes() {
        let mut host = SceneGraph::new();
        let a = dot(&mut host, Vec3::ZERO);
        let b = dot(&mut host, Vec3::ZERO);
        host.add_to_parent(a, b).unwrap();
        assert_eq!(host.add_to_parent(b, a), Err(HostError::Cycle { parent: b, child: a }));
        assert_eq!(host.add_to_parent(a, a), Err(HostError::Cycle { parent: a, child: a }));

        let mut other = SceneGraph::new();
        assert!(matches!(other.add_to_scene(a), Err(HostError::UnknownNode(_))));
    }

    #[test]
    fn texts_skip_detached_nodes() {
        let mut host = SceneGraph::new();
        let text = |s: &str| {
            MeshDesc::new(
                Geometry::Text { text: s.to_string(), size: 0.1, depth: 0.02 },
                Material::Basic { color: Color::WHITE },
                Transform::identity(),
            )
        };
        let shown = host.create_mesh(text("shown"));
        let _detached = host.create_mesh(text("detached"));
        let orphan_parent = host.create_mesh(text("orphan parent"));
        let orphan = host.create_mesh(text("orphan"));
        host.add_to_scene(shown).unwrap();
        host.add_to_parent(orphan_parent, orphan).unwrap();
        assert_eq!(host.texts(), vec!["shown"]);

        host.add_to_scene(orphan_parent).unwrap();
        assert!(host.is_attached(orphan));
        assert_eq!(host.texts(), vec!["shown", "orphan parent", "orphan"]);
    }
}
