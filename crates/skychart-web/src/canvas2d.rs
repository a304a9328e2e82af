use std::f64::consts::TAU;

use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use skychart_engine::render::{Fill, Stroke, TextStyle};
use skychart_engine::{Color, DrawSurface, ScreenPos};

/// Log a failed canvas call and carry on.
fn check(op: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!("canvas {} failed: {:?}", op, err);
    }
}

/// [`DrawSurface`] over a browser `<canvas>` 2D context.
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas2dSurface {
    /// Look up `canvas_id` in the document and take its 2D context.
    pub fn from_element_id(canvas_id: &str) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("'{}' is not a canvas", canvas_id)))?;
        Self::from_canvas(canvas)
    }

    pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| JsValue::from_str("unexpected context type"))?;
        Ok(Self { canvas, ctx })
    }

    /// Match the canvas backing store to the chart size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width.max(0.0).round() as u32);
        self.canvas.set_height(height.max(0.0).round() as u32);
    }

    fn circle_path(&self, center: ScreenPos, radius: f64) -> bool {
        self.ctx.begin_path();
        match self.ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU) {
            Ok(()) => true,
            Err(err) => {
                warn!("canvas arc failed: {:?}", err);
                false
            }
        }
    }

    fn apply_stroke(&self, stroke: &Stroke) {
        self.ctx.set_stroke_style_str(&stroke.color.to_css());
        self.ctx.set_line_width(stroke.width);
        let dash = js_sys::Array::new();
        if let Some(d) = stroke.dash {
            dash.push(&JsValue::from_f64(d));
            dash.push(&JsValue::from_f64(d));
        }
        check("setLineDash", self.ctx.set_line_dash(&dash));
    }
}

impl DrawSurface for Canvas2dSurface {
    fn begin_frame(&mut self) {
        check("setTransform", self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        self.ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        check("translate", self.ctx.translate(dx, dy));
    }

    fn scale(&mut self, factor: f64) {
        check("scale", self.ctx.scale(factor, factor));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &Fill) {
        match fill {
            Fill::Solid(color) => self.ctx.set_fill_style_str(&color.to_css()),
            Fill::Radial(g) => {
                let gradient = match self.ctx.create_radial_gradient(
                    g.center.x, g.center.y, 0.0, g.center.x, g.center.y, g.radius,
                ) {
                    Ok(gradient) => gradient,
                    Err(err) => {
                        warn!("canvas createRadialGradient failed: {:?}", err);
                        return;
                    }
                };
                check("addColorStop", gradient.add_color_stop(0.0, &g.inner.to_css()));
                check("addColorStop", gradient.add_color_stop(1.0, &g.outer.to_css()));
                self.ctx.set_fill_style_canvas_gradient(&gradient);
            }
        }
        self.ctx.fill_rect(x, y, width, height);
    }

    fn fill_circle(&mut self, center: ScreenPos, radius: f64, color: Color) {
        if self.circle_path(center, radius) {
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill();
        }
    }

    fn stroke_circle(&mut self, center: ScreenPos, radius: f64, stroke: &Stroke) {
        if self.circle_path(center, radius) {
            self.apply_stroke(stroke);
            self.ctx.stroke();
        }
    }

    fn stroke_line(&mut self, from: ScreenPos, to: ScreenPos, stroke: &Stroke) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.apply_stroke(stroke);
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, at: ScreenPos, style: &TextStyle) {
        self.ctx.set_font(&style.css_font());
        self.ctx.set_text_align(style.align.as_str());
        self.ctx.set_text_baseline(style.baseline.as_str());
        self.ctx.set_fill_style_str(&style.color.to_css());
        check("fillText", self.ctx.fill_text(text, at.x, at.y));
    }
}
