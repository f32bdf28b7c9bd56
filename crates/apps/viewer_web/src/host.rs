//! `SceneHost` backed by wgpu, with a 2D overlay for text.

use std::collections::HashSet;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement, Window};

use runtime::{AssetKind, HostEvent};
use scene::camera::{PerspectiveCamera, Viewport};
use scene::components::{Light, Material, MeshDesc, Transform};
use scene::graph::SceneGraph;
use scene::host::{HostError, NodeId, SceneHost};

use crate::dom::load_image_rgba;
use crate::draws::collect_draws;
use crate::inbox::{DecodedImage, Inbound, Inbox};
use crate::overlay::TextOverlay;
use crate::wgpu::GpuRenderer;

pub struct WgpuHost {
    graph: SceneGraph,
    gpu: GpuRenderer,
    overlay: TextOverlay,
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    inbox: Inbox,
    viewport: Viewport,
    requested_textures: HashSet<String>,
}

impl std::fmt::Debug for WgpuHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuHost")
            .field("nodes", &self.graph.node_count())
            .field("viewport", &self.viewport)
            .field("gpu", &self.gpu)
            .finish()
    }
}

impl WgpuHost {
    pub async fn new(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        inbox: &Inbox,
    ) -> Result<Self, JsValue> {
        let rect = canvas.get_bounding_client_rect();
        let viewport = Viewport::new(rect.width(), rect.height());
        let ratio = window.device_pixel_ratio().max(1.0);
        canvas.set_width((viewport.width * ratio).round() as u32);
        canvas.set_height((viewport.height * ratio).round() as u32);

        let gpu = GpuRenderer::from_canvas(canvas).await?;
        let mut overlay = TextOverlay::install(document, canvas)?;
        overlay.resize(viewport.width, viewport.height, ratio);

        Ok(Self {
            graph: SceneGraph::new(),
            gpu,
            overlay,
            window: window.clone(),
            document: document.clone(),
            canvas: canvas.clone(),
            inbox: inbox.clone(),
            viewport,
            requested_textures: HashSet::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn install_texture(&mut self, url: &str, image: &DecodedImage) {
        self.gpu.install_texture(url, image.width, image.height, &image.rgba);
        tracing::info!(url, width = image.width, height = image.height, "texture uploaded");
    }

    fn request_texture(&mut self, url: &str) {
        if !self.requested_textures.insert(url.to_string()) {
            return;
        }
        let document = self.document.clone();
        let inbox = self.inbox.clone();
        let url = url.to_string();
        let max_dim = self.gpu.max_texture_dimension();
        spawn_local(async move {
            match load_image_rgba(&document, &url, max_dim).await {
                Ok(image) => inbox.push(Inbound::Texture { url, image }),
                Err(err) => inbox.push_event(HostEvent::AssetFailed {
                    kind: AssetKind::GlobeTexture,
                    reason: format!("{url}: {err:?}"),
                }),
            }
        });
    }
}

impl SceneHost for WgpuHost {
    fn create_mesh(&mut self, mesh: MeshDesc) -> NodeId {
        if let Material::Phong {
            texture_url: Some(url),
            ..
        } = &mesh.material
        {
            let url = url.clone();
            self.request_texture(&url);
        }
        self.graph.create_mesh(mesh)
    }

    fn add_to_scene(&mut self, node: NodeId) -> Result<(), HostError> {
        self.graph.add_to_scene(node)
    }

    fn add_to_parent(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.graph.add_to_parent(parent, child)
    }

    fn add_light(&mut self, light: Light) {
        self.graph.add_light(light);
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), HostError> {
        self.graph.set_transform(node, transform)
    }

    fn set_camera_aspect(&mut self, aspect: f64) {
        self.graph.set_camera_aspect(aspect);
    }

    fn resize_viewport(&mut self, viewport: Viewport) {
        self.graph.resize_viewport(viewport);
        self.viewport = viewport;
        let ratio = self.window.device_pixel_ratio().max(1.0);
        let width = (viewport.width * ratio).round().max(1.0) as u32;
        let height = (viewport.height * ratio).round().max(1.0) as u32;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gpu.resize(width, height);
        self.overlay.resize(viewport.width, viewport.height, ratio);
    }

    fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), HostError> {
        self.graph.render(camera)?;
        let list = collect_draws(&self.graph, camera, self.viewport);
        for points in &list.points {
            self.gpu.ensure_points(points.node, &points.vertices);
        }
        let point_nodes: Vec<NodeId> = list.points.iter().map(|p| p.node).collect();
        self.gpu
            .render(&list.globals, &list.spheres, &point_nodes)
            .map_err(HostError::Backend)?;
        self.overlay.draw(&list.texts);
        Ok(())
    }
}
