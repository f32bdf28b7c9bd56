use catalog::{MarkerRegistry, PlacementCache};
use foundation::ids::RegionId;
use foundation::math::Vec3;
use foundation::time::Time;
use layers::info_panel::{InfoPanelPresenter, RenderInstruction};
use layers::labels::LabelSet;
use runtime::{
    AssetKind, Dispatcher, EventKind, Frame, FrameClock, HostEvent, PointerButton, RotationState,
    RotationToggle,
};
use scene::camera::{PerspectiveCamera, Viewport};
use scene::components::Transform;
use scene::host::SceneHost;
use scene::orbit::OrbitController;
use scene::picking::{PickResult, PickingController};
use scene::pointer::PointerState;
use scene::prefabs::{GlobeNodes, add_lights, spawn_globe, spawn_starfield};

use crate::config::ViewerConfig;
use crate::effects::Effect;
use crate::error::ViewerError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AssetStatus {
    #[default]
    Pending,
    Ready,
    Failed,
}

/// Application state shared by every event handler.
pub struct App<H> {
    host: H,
    config: ViewerConfig,
    registry: MarkerRegistry,
    placements: PlacementCache,
    camera: PerspectiveCamera,
    viewport: Viewport,
    orbit: OrbitController,
    rotation: RotationToggle,
    clock: FrameClock,
    picker: PickingController,
    globe: GlobeNodes,
    labels: Option<LabelSet>,
    texture: AssetStatus,
    font: AssetStatus,
    panel: RenderInstruction,
    hovered: Option<RegionId>,
    effects: Vec<Effect>,
}

impl<H: SceneHost> App<H> {
    fn new(
        mut host: H,
        config: ViewerConfig,
        registry: MarkerRegistry,
        viewport: Viewport,
    ) -> Result<Self, ViewerError> {
        config.validate()?;

        let mut placements = PlacementCache::new();
        let marker_positions = placements.get_or_compute(&registry, config.markers.altitude_radius)?;

        spawn_starfield(&mut host, &config.stars)?;
        add_lights(&mut host, &config.lighting);
        let globe = spawn_globe(&mut host, &config.globe, &config.markers, marker_positions)?;

        let cam = &config.camera;
        let camera = PerspectiveCamera::new(cam.fov_y_deg, viewport.aspect(), cam.near, cam.far)
            .looking_at(Vec3::from_array(cam.position), Vec3::ZERO);
        host.set_camera_aspect(camera.aspect);
        host.resize_viewport(viewport);

        let mut picker = PickingController::new(config.hit_radius);
        if config.occlude_far_side {
            picker = picker.with_occluder(Vec3::ZERO, config.globe.radius);
        }

        tracing::info!(
            regions = registry.len(),
            width = viewport.width,
            height = viewport.height,
            "viewer started"
        );

        Ok(Self {
            orbit: OrbitController::from_camera(&camera, config.orbit),
            rotation: RotationToggle::new(config.rotation_speed_rad_per_s),
            host,
            registry,
            placements,
            camera,
            viewport,
            clock: FrameClock::new(),
            picker,
            globe,
            labels: None,
            texture: AssetStatus::Pending,
            font: AssetStatus::Pending,
            panel: RenderInstruction::Hide,
            hovered: None,
            effects: Vec::new(),
            config,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn rotation(&self) -> &RotationToggle {
        &self.rotation
    }

    pub fn globe(&self) -> &GlobeNodes {
        &self.globe
    }

    pub fn labels(&self) -> Option<&LabelSet> {
        self.labels.as_ref()
    }

    pub fn texture_status(&self) -> AssetStatus {
        self.texture
    }

    pub fn font_status(&self) -> AssetStatus {
        self.font
    }

    pub fn panel(&self) -> &RenderInstruction {
        &self.panel
    }

    pub fn hovered(&self) -> Option<RegionId> {
        self.hovered
    }

    pub fn globe_transform(&self) -> Transform {
        Transform::rotation_y(self.rotation.angle_rad())
    }

    /// Swings the camera round so `region`'s marker sits at screen center.
    ///
    /// Keeps the current orbit distance and drops any pending orbit motion.
    pub fn focus_region(&mut self, region: RegionId) -> Result<(), ViewerError> {
        let radius = self.config.markers.altitude_radius;
        let placements = self.placements.get_or_compute(&self.registry, radius)?;
        let Some(placement) = placements.iter().find(|p| p.region == region).copied() else {
            tracing::warn!(%region, "cannot focus unknown region");
            return Ok(());
        };
        let world = self.globe_transform().apply_point(placement.position);
        let Some(dir) = world.normalize() else {
            return Ok(());
        };
        let distance = self.orbit.distance();
        self.camera = self.camera.looking_at(dir * distance, Vec3::ZERO);
        self.orbit = OrbitController::from_camera(&self.camera, self.config.orbit);
        Ok(())
    }

    /// Marker under the pointer, given in device pixels.
    pub fn pick_at(&mut self, x_px: f64, y_px: f64) -> Result<PickResult, ViewerError> {
        let pointer = PointerState::from_pixels(x_px, y_px, self.viewport);
        let parent = self.globe_transform();
        let placements = self
            .placements
            .get_or_compute(&self.registry, self.config.markers.altitude_radius)?;
        Ok(self.picker.pick(pointer, &self.camera, placements, &parent))
    }

    fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn show(&mut self, instruction: RenderInstruction) {
        if instruction != self.panel {
            self.panel = instruction.clone();
            self.emit(Effect::Panel(instruction));
        }
    }

    fn hover(&mut self, x_px: f64, y_px: f64) {
        let pick = match self.pick_at(x_px, y_px) {
            Ok(pick) => pick,
            Err(e) => {
                tracing::error!(error = %e, "pick failed");
                return;
            }
        };
        let region = pick.region();
        if region != self.hovered {
            tracing::debug!(?region, "hover changed");
            self.hovered = region;
        }
        let instruction = InfoPanelPresenter::present(pick, &self.registry);
        self.show(instruction);
    }

    fn spawn_labels(&mut self) {
        if self.labels.is_some() {
            return;
        }
        match LabelSet::spawn(&mut self.host, &self.config.labels) {
            Ok(labels) => self.labels = Some(labels),
            Err(e) => tracing::warn!(error = %e, "labels could not be added"),
        }
    }

    /// Per-frame update: spin, orbit, billboards, render.
    pub fn frame(&mut self, now: Time) -> Frame {
        let frame = self.clock.tick(now);
        let angle = self.rotation.advance(frame.dt_s);
        if let Err(e) = self.host.set_transform(self.globe.globe, Transform::rotation_y(angle)) {
            tracing::error!(error = %e, "globe transform update failed");
        }

        self.orbit.update(&mut self.camera);

        if let Some(labels) = self.labels.as_mut() {
            if let Err(e) = labels.face_camera(&mut self.host, self.camera.position) {
                tracing::error!(error = %e, "billboard update failed");
            }
        }

        if let Err(e) = self.host.render(&self.camera) {
            tracing::error!(error = %e, frame = frame.index, "render failed");
        }
        frame
    }
}

fn on_pointer_move<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    let HostEvent::PointerMove { x_px, y_px } = *event else {
        return;
    };
    if app.orbit.is_dragging() {
        app.orbit.drag_to([x_px, y_px], app.viewport);
    }
    app.hover(x_px, y_px);
}

fn on_pointer_down<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    if let HostEvent::PointerDown {
        x_px,
        y_px,
        button: PointerButton::Primary,
    } = *event
    {
        app.orbit.begin_drag([x_px, y_px]);
    }
}

fn on_pointer_up<H: SceneHost>(app: &mut App<H>, _event: &HostEvent) {
    app.orbit.end_drag();
}

fn on_click<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    let HostEvent::Click { x_px, y_px } = *event else {
        return;
    };
    let Some(labels) = app.labels.as_ref() else {
        return;
    };
    let pointer = PointerState::from_pixels(x_px, y_px, app.viewport);
    let ray = app.camera.ray_from_ndc(pointer.ndc);
    if let Some(url) = labels.link_under(&ray) {
        tracing::info!(url, "opening link");
        let url = url.to_string();
        app.emit(Effect::OpenUrl(url));
    }
}

fn on_wheel<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    if let HostEvent::Wheel { delta_y } = *event {
        app.orbit.zoom(delta_y);
    }
}

fn on_resize<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    let HostEvent::Resize {
        width_px,
        height_px,
    } = *event
    else {
        return;
    };
    app.viewport = Viewport::new(width_px, height_px);
    app.camera.set_aspect(app.viewport.aspect());
    app.host.set_camera_aspect(app.camera.aspect);
    app.host.resize_viewport(app.viewport);
}

fn on_toggle_rotation<H: SceneHost>(app: &mut App<H>, _event: &HostEvent) {
    let state = app.rotation.activate();
    app.emit(Effect::ToggleLabel(state.button_label()));
}

fn on_asset<H: SceneHost>(app: &mut App<H>, event: &HostEvent) {
    match event {
        HostEvent::AssetLoaded(AssetKind::GlobeTexture) => {
            app.texture = AssetStatus::Ready;
            tracing::info!("globe texture ready");
        }
        HostEvent::AssetLoaded(AssetKind::Font) => {
            app.font = AssetStatus::Ready;
            app.spawn_labels();
        }
        HostEvent::AssetFailed {
            kind: AssetKind::GlobeTexture,
            reason,
        } => {
            app.texture = AssetStatus::Failed;
            tracing::warn!(%reason, "globe texture failed to load; rendering untextured");
        }
        HostEvent::AssetFailed {
            kind: AssetKind::Font,
            reason,
        } => {
            app.font = AssetStatus::Failed;
            tracing::warn!(%reason, "font failed to load; labels disabled");
        }
        _ => {}
    }
}

/// The globe viewer: application state plus its event routing.
pub struct Viewer<H> {
    app: App<H>,
    dispatcher: Dispatcher<App<H>>,
}

impl<H: SceneHost> Viewer<H> {
    /// Builds the scene from the embedded region dataset.
    pub fn new(host: H, config: ViewerConfig, viewport: Viewport) -> Result<Self, ViewerError> {
        let registry = MarkerRegistry::load()?;
        Self::with_registry(host, config, registry, viewport)
    }

    pub fn with_registry(
        host: H,
        config: ViewerConfig,
        registry: MarkerRegistry,
        viewport: Viewport,
    ) -> Result<Self, ViewerError> {
        let app = App::new(host, config, registry, viewport)?;
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(EventKind::PointerMove, on_pointer_move::<H>)
            .register(EventKind::PointerDown, on_pointer_down::<H>)
            .register(EventKind::PointerUp, on_pointer_up::<H>)
            .register(EventKind::Click, on_click::<H>)
            .register(EventKind::Wheel, on_wheel::<H>)
            .register(EventKind::Resize, on_resize::<H>)
            .register(EventKind::ToggleRotation, on_toggle_rotation::<H>)
            .register(EventKind::Asset, on_asset::<H>);
        Ok(Self { app, dispatcher })
    }

    pub fn handle(&mut self, event: &HostEvent) -> usize {
        self.dispatcher.dispatch(&mut self.app, event)
    }

    pub fn frame(&mut self, now_s: f64) -> Frame {
        self.app.frame(Time(now_s))
    }

    /// Effects queued since the last call, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.app.effects)
    }

    pub fn rotation_state(&self) -> RotationState {
        self.app.rotation.state()
    }

    pub fn app(&self) -> &App<H> {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App<H> {
        &mut self.app
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetStatus, Viewer};
    use crate::config::ViewerConfig;
    use crate::effects::Effect;
    use foundation::ids::RegionId;
    use layers::info_panel::RenderInstruction;
    use layers::labels::CREDIT_URL;
    use runtime::{AssetKind, HostEvent, RotationState};
    use scene::camera::Viewport;
    use scene::graph::SceneGraph;
    use scene::picking::HitVolume;

    const W: f64 = 800.0;
    const H: f64 = 600.0;

    fn viewer() -> Viewer<SceneGraph> {
        Viewer::new(SceneGraph::new(), ViewerConfig::default(), Viewport::new(W, H)).unwrap()
    }

    fn center_move() -> HostEvent {
        HostEvent::PointerMove {
            x_px: W / 2.0,
            y_px: H / 2.0,
        }
    }

    #[test]
    fn startup_builds_the_scene() {
        let v = viewer();
        let host = v.app().host();
        // Stars, globe and ten markers.
        assert_eq!(host.node_count(), 12);
        assert_eq!(host.children_of(v.app().globe().globe).len(), 10);
        assert_eq!(host.lights().len(), 2);
        assert_eq!(host.camera_aspect(), Some(W / H));
        assert_eq!(v.rotation_state(), RotationState::Rotating);
    }

    #[test]
    fn hovering_amazon_shows_its_panel() {
        let mut v = viewer();
        let amazon = v.app().registry().find_by_name("Amazon Rainforest").unwrap();
        v.app_mut().focus_region(amazon).unwrap();

        assert_eq!(v.handle(&center_move()), 1);
        assert_eq!(v.app().hovered(), Some(amazon));

        let effects = v.drain_effects();
        let [Effect::Panel(RenderInstruction::Show(content))] = effects.as_slice() else {
            panic!("expected one panel effect, got {effects:?}");
        };
        assert_eq!(content.title, "Amazon Rainforest");
        assert!(content.fact.starts_with("World’s largest rainforest"));
        assert!(content.to_html().contains("Amazon Rainforest"));

        // Same marker again: no redundant panel update.
        v.handle(&center_move());
        assert!(v.drain_effects().is_empty());

        // Corner of the screen is empty space.
        v.handle(&HostEvent::PointerMove { x_px: 1.0, y_px: 1.0 });
        assert_eq!(v.drain_effects(), vec![Effect::Panel(RenderInstruction::Hide)]);
        assert_eq!(v.app().hovered(), None);
    }

    #[test]
    fn markers_behind_the_globe_are_not_picked() {
        let mut v = viewer();
        let amazon = v.app().registry().find_by_name("Amazon Rainforest").unwrap();
        v.app_mut().focus_region(amazon).unwrap();
        // Look from the opposite side; the Amazon marker is hidden.
        let cam = *v.app().camera();
        v.app_mut().camera = cam.looking_at(-cam.position, cam.target);
        let pick = v.app_mut().pick_at(W / 2.0, H / 2.0).unwrap();
        assert_ne!(pick.region(), Some(amazon));
    }

    #[test]
    fn far_side_markers_are_pickable_without_occlusion() {
        let config = ViewerConfig {
            occlude_far_side: false,
            ..ViewerConfig::default()
        };
        let mut v = Viewer::new(SceneGraph::new(), config, Viewport::new(W, H)).unwrap();
        let amazon = v.app().registry().find_by_name("Amazon Rainforest").unwrap();
        v.app_mut().focus_region(amazon).unwrap();
        let cam = *v.app().camera();
        v.app_mut().camera = cam.looking_at(-cam.position, cam.target);
        let pick = v.app_mut().pick_at(W / 2.0, H / 2.0).unwrap();
        assert_eq!(pick.region(), Some(amazon));
    }

    #[test]
    fn toggle_emits_button_captions_and_freezes_spin() {
        let mut v = viewer();
        v.frame(0.0);
        v.frame(0.05);
        let spun = v.app().rotation().angle_rad();
        assert!((spun - 0.005).abs() < 1e-12);

        for _ in 0..3 {
            v.handle(&HostEvent::ToggleRotation);
        }
        assert_eq!(v.rotation_state(), RotationState::Stopped);
        assert_eq!(
            v.drain_effects(),
            vec![
                Effect::ToggleLabel("Start Rotation"),
                Effect::ToggleLabel("Stop Rotation"),
                Effect::ToggleLabel("Start Rotation"),
            ]
        );

        v.frame(0.1);
        assert_eq!(v.app().rotation().angle_rad(), spun);
        let globe = v.app().globe().globe;
        let world = v.app().host().world_transform(globe).unwrap();
        assert_eq!(world, v.app().globe_transform());
    }

    #[test]
    fn long_pauses_are_clamped() {
        let mut v = viewer();
        v.frame(0.0);
        v.frame(30.0);
        assert!((v.app().rotation().angle_rad() - 0.01).abs() < 1e-12);
        assert_eq!(v.app().host().frames_rendered(), 2);
    }

    #[test]
    fn labels_wait_for_the_font() {
        let mut v = viewer();
        assert!(v.app().labels().is_none());
        v.handle(&HostEvent::AssetFailed {
            kind: AssetKind::GlobeTexture,
            reason: "404".to_string(),
        });
        assert_eq!(v.app().texture_status(), AssetStatus::Failed);

        v.handle(&HostEvent::AssetLoaded(AssetKind::Font));
        assert_eq!(v.app().labels().map(|l| l.len()), Some(3));
        // A second notification does not duplicate labels.
        v.handle(&HostEvent::AssetLoaded(AssetKind::Font));
        assert_eq!(v.app().host().texts().len(), 3);
    }

    #[test]
    fn clicking_the_credit_opens_the_source() {
        let mut v = viewer();
        v.handle(&HostEvent::AssetLoaded(AssetKind::Font));
        v.frame(0.0);

        let camera = *v.app().camera();
        let credit = v
            .app()
            .labels()
            .unwrap()
            .iter()
            .find(|l| l.spec.link.is_some())
            .unwrap();
        let HitVolume::Quad { center, .. } = credit.hit_volume() else {
            panic!("labels use quads");
        };
        let ndc = camera.project_to_ndc(center).unwrap();
        let x_px = (ndc.x + 1.0) * 0.5 * W;
        let y_px = (1.0 - ndc.y) * 0.5 * H;

        v.handle(&HostEvent::Click { x_px, y_px });
        assert_eq!(v.drain_effects(), vec![Effect::OpenUrl(CREDIT_URL.to_string())]);

        v.handle(&HostEvent::Click { x_px: W / 2.0, y_px: H / 2.0 });
        assert!(v.drain_effects().is_empty());
    }

    #[test]
    fn resize_updates_aspect_and_pointer_mapping() {
        let mut v = viewer();
        v.handle(&HostEvent::Resize {
            width_px: 1000.0,
            height_px: 500.0,
        });
        assert_eq!(v.app().camera().aspect, 2.0);
        assert_eq!(v.app().host().camera_aspect(), Some(2.0));
        assert_eq!(v.app().host().viewport(), Some(Viewport::new(1000.0, 500.0)));
    }

    #[test]
    fn invalid_config_aborts_startup() {
        let mut config = ViewerConfig::default();
        config.hit_radius = -1.0;
        assert!(Viewer::new(SceneGraph::new(), config, Viewport::new(W, H)).is_err());
    }

    #[test]
    fn unknown_region_focus_is_ignored() {
        let mut v = viewer();
        let before = *v.app().camera();
        v.app_mut().focus_region(RegionId::new(42)).unwrap();
        assert_eq!(*v.app().camera(), before);
    }
}
