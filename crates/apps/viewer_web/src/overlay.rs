//! 2D canvas layered over the GPU canvas for label text.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::dom::LABEL_FONT_FAMILY;
use crate::draws::TextDraw;

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

pub struct TextOverlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pixel_ratio: f64,
}

impl std::fmt::Debug for TextOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextOverlay")
            .field("width", &self.canvas.width())
            .field("height", &self.canvas.height())
            .finish()
    }
}

impl TextOverlay {
    /// Inserts a transparent canvas right after `under`, covering it.
    pub fn install(document: &Document, under: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("overlay canvas has unexpected type"))?;
        let style = canvas.style();
        style.set_property("position", "absolute")?;
        style.set_property("pointer-events", "none")?;
        style.set_property("left", &format!("{}px", under.offset_left()))?;
        style.set_property("top", &format!("{}px", under.offset_top()))?;
        under.after_with_node_1(&canvas)?;

        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("2d context has unexpected type"))?;

        Ok(Self {
            canvas,
            ctx,
            pixel_ratio: 1.0,
        })
    }

    /// Matches the overlay to the viewport (CSS pixels) at `pixel_ratio`.
    pub fn resize(&mut self, width_css: f64, height_css: f64, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio.max(1.0);
        self.canvas.set_width((width_css * self.pixel_ratio).round().max(1.0) as u32);
        self.canvas.set_height((height_css * self.pixel_ratio).round().max(1.0) as u32);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{width_css}px"));
        let _ = style.set_property("height", &format!("{height_css}px"));
    }

    pub fn draw(&self, texts: &[TextDraw]) {
        let ctx = &self.ctx;
        let _ = ctx.set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0);
        ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
        ctx.set_text_align("left");
        ctx.set_text_baseline("alphabetic");

        for text in texts {
            if text.font_px < 1.0 {
                continue;
            }
            ctx.set_font(&format!("{:.1}px {LABEL_FONT_FAMILY}", text.font_px));
            ctx_set_fill_style(ctx, &text.color_css);
            for (i, line) in text.lines.iter().enumerate() {
                let y = text.y_px + i as f64 * text.line_height_px;
                let _ = ctx.fill_text(line, text.x_px, y);
            }
        }
    }
}
