//! Page chrome around the canvas: info panel, rotation button, input
//! listeners and async asset loads.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, HtmlCanvasElement, HtmlElement, HtmlImageElement, MouseEvent,
    WheelEvent, Window,
};

use layers::info_panel::RenderInstruction;
use runtime::{HostEvent, PointerButton};
use viewer::Effect;

use crate::inbox::{DecodedImage, Inbox};

/// Family used by the text overlay; loaded before labels are spawned.
pub const LABEL_FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

type Listener = Closure<dyn FnMut(Event)>;

fn set_styles(el: &HtmlElement, styles: &[(&str, &str)]) -> Result<(), JsValue> {
    let style = el.style();
    for (name, value) in styles {
        style.set_property(name, value)?;
    }
    Ok(())
}

fn create_html_element(document: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    document
        .create_element(tag)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("<{tag}> is not an HtmlElement")))
}

/// Pointer position relative to the canvas, in CSS pixels.
fn canvas_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        event.client_x() as f64 - rect.left(),
        event.client_y() as f64 - rect.top(),
    )
}

pub struct Dom {
    window: Window,
    panel: HtmlElement,
    button: HtmlElement,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Dom {
    /// Adds the panel and button to the page and wires input into `inbox`.
    pub fn install(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        inbox: &Inbox,
        button_label: &str,
    ) -> Result<Self, JsValue> {
        let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

        let panel = create_html_element(document, "div")?;
        set_styles(
            &panel,
            &[
                ("position", "absolute"),
                ("top", "10px"),
                ("left", "10px"),
                ("max-width", "250px"),
                ("padding", "10px"),
                ("background", "rgba(0,0,0,0.6)"),
                ("color", "white"),
                ("font-size", "14px"),
                ("border-radius", "8px"),
                ("display", "none"),
            ],
        )?;
        body.append_child(&panel)?;

        let button = create_html_element(document, "button")?;
        button.set_inner_text(button_label);
        set_styles(
            &button,
            &[
                ("position", "absolute"),
                ("bottom", "20px"),
                ("left", "20px"),
                ("padding", "8px 12px"),
                ("border", "none"),
                ("border-radius", "6px"),
                ("background", "#00aa88"),
                ("color", "white"),
                ("cursor", "pointer"),
            ],
        )?;
        body.append_child(&button)?;

        let mut dom = Self {
            window: window.clone(),
            panel,
            button,
            listeners: Vec::new(),
        };
        dom.listen(window.as_ref(), "mousemove", pointer_listener(canvas, inbox, PointerKind::Move))?;
        dom.listen(window.as_ref(), "mouseup", pointer_listener(canvas, inbox, PointerKind::Up))?;
        dom.listen(canvas.as_ref(), "mousedown", pointer_listener(canvas, inbox, PointerKind::Down))?;
        dom.listen(canvas.as_ref(), "click", pointer_listener(canvas, inbox, PointerKind::Click))?;
        dom.listen(canvas.as_ref(), "wheel", wheel_listener(inbox))?;
        dom.listen(window.as_ref(), "resize", resize_listener(canvas, inbox))?;

        let toggle_inbox = inbox.clone();
        let toggle = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            toggle_inbox.push_event(HostEvent::ToggleRotation);
        });
        let button_target = dom.button.clone();
        dom.listen(button_target.as_ref(), "click", toggle)?;

        Ok(dom)
    }

    fn listen(&mut self, target: &web_sys::EventTarget, name: &str, listener: Listener) -> Result<(), JsValue> {
        target.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())?;
        self.listeners.push(listener);
        Ok(())
    }

    pub fn apply(&self, effect: &Effect) -> Result<(), JsValue> {
        match effect {
            Effect::Panel(RenderInstruction::Show(content)) => {
                self.panel.set_inner_html(&content.to_html());
                self.panel.style().set_property("display", "block")
            }
            Effect::Panel(RenderInstruction::Hide) => self.panel.style().set_property("display", "none"),
            Effect::ToggleLabel(label) => {
                self.button.set_inner_text(label);
                Ok(())
            }
            Effect::OpenUrl(url) => self.window.open_with_url_and_target(url, "_blank").map(|_| ()),
        }
    }

    /// Shows a fatal message where the info panel would be.
    pub fn show_error(&self, message: &str) {
        self.panel.set_inner_text(message);
        let _ = self.panel.style().set_property("display", "block");
    }
}

#[derive(Copy, Clone)]
enum PointerKind {
    Move,
    Down,
    Up,
    Click,
}

fn pointer_listener(canvas: &HtmlCanvasElement, inbox: &Inbox, kind: PointerKind) -> Listener {
    let canvas = canvas.clone();
    let inbox = inbox.clone();
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let (x_px, y_px) = canvas_point(&canvas, mouse);
        let event = match kind {
            PointerKind::Move => HostEvent::PointerMove { x_px, y_px },
            PointerKind::Click => HostEvent::Click { x_px, y_px },
            PointerKind::Down | PointerKind::Up => {
                let Some(button) = PointerButton::from_dom(mouse.button()) else {
                    return;
                };
                if matches!(kind, PointerKind::Down) {
                    HostEvent::PointerDown { x_px, y_px, button }
                } else {
                    HostEvent::PointerUp { x_px, y_px, button }
                }
            }
        };
        inbox.push_event(event);
    })
}

fn wheel_listener(inbox: &Inbox) -> Listener {
    let inbox = inbox.clone();
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        event.prevent_default();
        inbox.push_event(HostEvent::Wheel {
            delta_y: wheel.delta_y(),
        });
    })
}

fn resize_listener(canvas: &HtmlCanvasElement, inbox: &Inbox) -> Listener {
    let canvas = canvas.clone();
    let inbox = inbox.clone();
    Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let rect = canvas.get_bounding_client_rect();
        inbox.push_event(HostEvent::Resize {
            width_px: rect.width(),
            height_px: rect.height(),
        });
    })
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("2d context has unexpected type"))
}

/// Fetches and decodes an image, downscaled so neither side exceeds `max_dim`.
pub async fn load_image_rgba(document: &Document, url: &str, max_dim: u32) -> Result<DecodedImage, JsValue> {
    let img = HtmlImageElement::new()?;
    img.set_cross_origin(Some("anonymous"));
    img.set_src(url);
    JsFuture::from(img.decode()).await?;

    let (src_w, src_h) = (img.natural_width(), img.natural_height());
    if src_w == 0 || src_h == 0 {
        return Err(JsValue::from_str(&format!("{url} decoded to an empty image")));
    }
    let scale = (max_dim.max(1) as f64 / src_w.max(src_h) as f64).min(1.0);
    let width = ((src_w as f64 * scale).round() as u32).max(1);
    let height = ((src_h as f64 * scale).round() as u32).max(1);

    let scratch = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("scratch canvas has unexpected type"))?;
    scratch.set_width(width);
    scratch.set_height(height);
    let ctx = context_2d(&scratch)?;
    ctx.draw_image_with_html_image_element_and_dw_and_dh(&img, 0.0, 0.0, width as f64, height as f64)?;
    let data = ctx.get_image_data(0.0, 0.0, width as f64, height as f64)?;

    let image = DecodedImage {
        width,
        height,
        rgba: data.data().0,
    };
    if !image.is_complete() {
        return Err(JsValue::from_str(&format!("{url} pixel data is truncated")));
    }
    Ok(image)
}

/// Waits for the browser to make `font_spec` (CSS font shorthand) usable.
pub async fn load_font(document: &Document, font_spec: &str) -> Result<(), JsValue> {
    let fonts = js_sys::Reflect::get(document.as_ref(), &JsValue::from_str("fonts"))?;
    if fonts.is_undefined() {
        return Err(JsValue::from_str("document.fonts unavailable"));
    }
    let load = js_sys::Reflect::get(&fonts, &JsValue::from_str("load"))?.dyn_into::<js_sys::Function>()?;
    let promise = load
        .call1(&fonts, &JsValue::from_str(font_spec))?
        .dyn_into::<js_sys::Promise>()?;
    JsFuture::from(promise).await?;
    Ok(())
}
