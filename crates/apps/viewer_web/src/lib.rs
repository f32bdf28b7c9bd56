//! Browser entry point: a wgpu-backed rainforest globe.
//!
//! JavaScript creates the app with `create_globe` and drives it by calling
//! `frame` from `requestAnimationFrame`.

pub mod draws;
pub mod inbox;
pub mod mesh;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod overlay;
#[cfg(target_arch = "wasm32")]
mod wgpu;

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use gloo_net::http::Request;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    use runtime::{AssetKind, HostEvent};
    use viewer::{Viewer, ViewerConfig};

    use crate::dom::{Dom, LABEL_FONT_FAMILY, load_font};
    use crate::host::WgpuHost;
    use crate::inbox::{Inbound, Inbox};
    use crate::wgpu::canvas_by_id;

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
        Ok(())
    }

    async fn fetch_config(url: &str) -> Result<ViewerConfig, JsValue> {
        let resp = Request::get(url)
            .send()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let text = resp
            .text()
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        ViewerConfig::from_json_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    fn request_font(document: &web_sys::Document, inbox: &Inbox) {
        let document = document.clone();
        let inbox = inbox.clone();
        spawn_local(async move {
            let spec = format!("16px {LABEL_FONT_FAMILY}");
            match load_font(&document, &spec).await {
                Ok(()) => inbox.push_event(HostEvent::AssetLoaded(AssetKind::Font)),
                Err(err) => inbox.push_event(HostEvent::AssetFailed {
                    kind: AssetKind::Font,
                    reason: format!("{err:?}"),
                }),
            }
        });
    }

    /// The running globe, owned by JavaScript.
    #[wasm_bindgen]
    pub struct GlobeApp {
        viewer: Viewer<WgpuHost>,
        dom: Dom,
        inbox: Inbox,
    }

    /// Builds the scene in the canvas with id `canvas_id`.
    ///
    /// `config_url` optionally points at a JSON viewer configuration; missing
    /// fields keep their defaults.
    #[wasm_bindgen]
    pub async fn create_globe(canvas_id: String, config_url: Option<String>) -> Result<GlobeApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = canvas_by_id(&document, &canvas_id)?;

        let config = match config_url.as_deref() {
            Some(url) => fetch_config(url).await?,
            None => ViewerConfig::default(),
        };

        let inbox = Inbox::new();
        let host = WgpuHost::new(&window, &document, &canvas, &inbox).await?;
        let viewport = host.viewport();
        let dom = Dom::install(
            &window,
            &document,
            &canvas,
            &inbox,
            runtime::RotationState::default().button_label(),
        )?;

        let viewer = match Viewer::new(host, config, viewport) {
            Ok(viewer) => viewer,
            Err(err) => {
                tracing::error!(error = %err, "viewer failed to start");
                dom.show_error(&err.to_string());
                return Err(JsValue::from_str(&err.to_string()));
            }
        };
        request_font(&document, &inbox);

        Ok(GlobeApp { viewer, dom, inbox })
    }

    #[wasm_bindgen]
    impl GlobeApp {
        /// Applies queued input and loads, then advances and draws one frame.
        pub fn frame(&mut self, timestamp_ms: f64) {
            for item in self.inbox.drain_coalesced() {
                match item {
                    Inbound::Event(event) => {
                        self.viewer.handle(&event);
                    }
                    Inbound::Texture { url, image } => {
                        self.viewer.app_mut().host_mut().install_texture(&url, &image);
                        self.viewer.handle(&HostEvent::AssetLoaded(AssetKind::GlobeTexture));
                    }
                }
            }

            self.viewer.frame(timestamp_ms / 1000.0);

            for effect in self.viewer.drain_effects() {
                if let Err(err) = self.dom.apply(&effect) {
                    tracing::warn!(?effect, error = ?err, "effect could not be applied");
                }
            }
        }

        /// Same as clicking the rotation button.
        pub fn toggle_rotation(&mut self) {
            self.inbox.push_event(HostEvent::ToggleRotation);
        }

        /// Turns the globe so the named region faces the camera.
        pub fn focus(&mut self, name: &str) -> Result<(), JsValue> {
            let app = self.viewer.app_mut();
            let id = app
                .registry()
                .find_by_name(name)
                .ok_or_else(|| JsValue::from_str(&format!("unknown region {name}")))?;
            app.focus_region(id).map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }
}
