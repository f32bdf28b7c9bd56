//! Boundary to the rendering engine.
//!
//! Scene construction and per-frame updates talk to the renderer only through
//! `SceneHost`. The browser build backs it with wgpu; tests and the headless
//! CLI use `SceneGraph`.

use foundation::handles::Handle;

use crate::camera::{PerspectiveCamera, Viewport};
use crate::components::{Light, MeshDesc, Transform};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Handle);

impl NodeId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    UnknownNode(NodeId),
    /// Attaching would make a node its own ancestor.
    Cycle { parent: NodeId, child: NodeId },
    Backend(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::UnknownNode(id) => write!(f, "unknown scene node {}", id.index()),
            HostError::Cycle { parent, child } => write!(
                f,
                "attaching node {} under {} would create a cycle",
                child.index(),
                parent.index()
            ),
            HostError::Backend(msg) => write!(f, "render backend error: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

pub trait SceneHost {
    /// Creates a detached mesh node.
    fn create_mesh(&mut self, mesh: MeshDesc) -> NodeId;

    /// Makes `node` a root of the rendered scene.
    fn add_to_scene(&mut self, node: NodeId) -> Result<(), HostError>;

    /// Attaches `child` under `parent`; the child inherits the parent's transform.
    fn add_to_parent(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    fn add_light(&mut self, light: Light);

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), HostError>;

    fn set_camera_aspect(&mut self, aspect: f64);

    fn resize_viewport(&mut self, viewport: Viewport);

    fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), HostError>;
}
