use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use scene::{Color, RenderSurface};

/// 2D canvas backing for the map render pass.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    size_px: f64,
}

impl CanvasSurface {
    /// Looks up `canvas_id` and sizes it to a `size_px` square. `size_px` must
    /// be a whole number of pixels, as `ClientConfig::validate` enforces.
    pub fn from_canvas_id(canvas_id: &str, size_px: f64) -> Result<Self, JsValue> {
        if size_px.fract() != 0.0 || !(1.0..=f64::from(u32::MAX)).contains(&size_px) {
            return Err(JsValue::from_str(&format!("canvas size {size_px} is not a pixel count")));
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing {canvas_id}")))?
            .dyn_into::<HtmlCanvasElement>()?;
        canvas.set_width(size_px as u32);
        canvas.set_height(size_px as u32);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { ctx, size_px })
    }
}

// `fillStyle`/`strokeStyle` take any JS value; set them as plain strings.
fn set_style(ctx: &CanvasRenderingContext2d, prop: &str, color: Color) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str(prop),
        &JsValue::from_str(&color.css()),
    );
}

impl RenderSurface for CanvasSurface {
    fn clear_rect(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.size_px, self.size_px);
    }

    fn draw_segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color, width: f64) {
        self.ctx.begin_path();
        self.ctx.move_to(x1, y1);
        self.ctx.line_to(x2, y2);
        set_style(&self.ctx, "strokeStyle", color);
        self.ctx.set_line_width(width);
        self.ctx.stroke();
    }

    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, color: Color) {
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius, 0.0, TAU).is_err() {
            return;
        }
        set_style(&self.ctx, "fillStyle", color);
        self.ctx.fill();
    }
}
