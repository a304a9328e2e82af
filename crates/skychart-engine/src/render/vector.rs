//! Lyon-backed [`DrawSurface`].
//!
//! Tessellates every call into a flat triangle list of `[x, y, r, g, b, a]`
//! vertices in canvas pixels, ready to hand to a GPU or a JS rasterizer.
//! Text is not rasterized; it is collected as [`TextLabel`] records.
//!
//! Radial gradients become concentric rings and dashes are sampled along
//! the arc, so the output is an approximation of the canvas result.

use bytemuck::{Pod, Zeroable};
use glam::{DAffine2, DVec2};
use lyon::math::point;
use lyon::path::{Path, Winding};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};
use serde::Serialize;

use crate::sky::ScreenPos;
use super::color::Color;
use super::surface::{DrawSurface, Fill, RadialGradient, Stroke, TextAlign, TextBaseline, TextStyle};

/// Rings used to approximate a radial gradient.
const GRADIENT_RINGS: usize = 12;
/// Tessellation tolerance in output pixels.
const TOLERANCE: f32 = 0.25;

/// Per-vertex data.
/// 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorVertex {
    pub const FLOATS: usize = 6;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4; // 24
}

/// A label for the host to draw, already in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub color: Color,
}

struct FillVertexCtor {
    color: Color,
}

impl FillVertexConstructor<VectorVertex> for FillVertexCtor {
    fn new_vertex(&mut self, vertex: FillVertex) -> VectorVertex {
        VectorVertex {
            x: vertex.position().x,
            y: vertex.position().y,
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
            a: self.color.a,
        }
    }
}

struct StrokeVertexCtor {
    color: Color,
}

impl StrokeVertexConstructor<VectorVertex> for StrokeVertexCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> VectorVertex {
        VectorVertex {
            x: vertex.position().x,
            y: vertex.position().y,
            r: self.color.r,
            g: self.color.g,
            b: self.color.b,
            a: self.color.a,
        }
    }
}

/// Tessellating surface. Call [`VectorSurface::clear`] before each frame.
pub struct VectorSurface {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<VectorVertex, u32>,
    buffer: Vec<f32>,
    labels: Vec<TextLabel>,
    transform: DAffine2,
    stack: Vec<DAffine2>,
}

impl VectorSurface {
    pub fn new() -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            buffer: Vec::with_capacity(16384 * VectorVertex::FLOATS),
            labels: Vec::new(),
            transform: DAffine2::IDENTITY,
            stack: Vec::new(),
        }
    }

    /// Drop last frame's output and reset the transform.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.labels.clear();
        self.transform = DAffine2::IDENTITY;
        self.stack.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.buffer.len() / VectorVertex::FLOATS
    }

    /// Raw pointer to the flat float buffer (read from JS memory).
    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    pub fn vertices(&self) -> &[VectorVertex] {
        bytemuck::cast_slice(&self.buffer)
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn labels_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.labels)
    }

    /// Current local → canvas transform.
    pub fn transform(&self) -> DAffine2 {
        self.transform
    }

    fn to_canvas(&self, p: ScreenPos) -> DVec2 {
        self.transform.transform_point2(p.to_dvec2())
    }

    /// Length scale of the current transform (uniform scales only).
    fn scale_factor(&self) -> f64 {
        self.transform.matrix2.x_axis.length()
    }

    fn flush_geometry(&mut self) {
        for idx in &self.geometry.indices {
            let v = &self.geometry.vertices[*idx as usize];
            self.buffer.extend_from_slice(&[v.x, v.y, v.r, v.g, v.b, v.a]);
        }
        self.geometry.vertices.clear();
        self.geometry.indices.clear();
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(TOLERANCE),
            &mut BuffersBuilder::new(&mut self.geometry, FillVertexCtor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => {
                log::debug!("Fill tessellation failed: {:?}", e);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, width: f32, color: Color) {
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(TOLERANCE).with_line_width(width),
            &mut BuffersBuilder::new(&mut self.geometry, StrokeVertexCtor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(e) => {
                log::debug!("Stroke tessellation failed: {:?}", e);
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }

    /// Canvas-space polygon fill.
    fn fill_polygon(&mut self, points: &[DVec2], color: Color) {
        if points.len() < 3 || color.a <= 0.0 {
            return;
        }
        let mut builder = Path::builder();
        builder.begin(point(points[0].x as f32, points[0].y as f32));
        for p in &points[1..] {
            builder.line_to(point(p.x as f32, p.y as f32));
        }
        builder.close();
        let path = builder.build();
        self.fill_path(&path, color);
    }

    /// Canvas-space disc, or ring when `inner > 0`.
    fn fill_ring(&mut self, center: DVec2, outer: f64, inner: f64, color: Color) {
        if outer <= 0.0 || color.a <= 0.0 {
            return;
        }
        let c = point(center.x as f32, center.y as f32);
        let mut builder = Path::builder();
        builder.add_circle(c, outer as f32, Winding::Positive);
        if inner > 0.0 {
            builder.add_circle(c, inner as f32, Winding::Negative);
        }
        let path = builder.build();
        self.fill_path(&path, color);
    }

    /// Canvas-space open polyline.
    fn stroke_polyline(&mut self, points: &[DVec2], width: f64, color: Color) {
        if points.len() < 2 || width <= 0.0 || color.a <= 0.0 {
            return;
        }
        let mut builder = Path::builder();
        builder.begin(point(points[0].x as f32, points[0].y as f32));
        for p in &points[1..] {
            builder.line_to(point(p.x as f32, p.y as f32));
        }
        builder.end(false);
        let path = builder.build();
        self.stroke_path(&path, width as f32, color);
    }

    fn fill_radial(&mut self, corners: &[DVec2; 4], gradient: &RadialGradient) {
        if gradient.outer.a > 0.0 {
            self.fill_polygon(corners, gradient.outer);
        }
        let center = self.to_canvas(gradient.center);
        let radius = gradient.radius * self.scale_factor();
        let step = radius / GRADIENT_RINGS as f64;
        for k in 0..GRADIENT_RINGS {
            let inner_r = step * k as f64;
            let t = (k as f32 + 0.5) / GRADIENT_RINGS as f32;
            let color = gradient.inner.lerp(gradient.outer, t);
            self.fill_ring(center, inner_r + step, inner_r, color);
        }
    }
}

impl Default for VectorSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for VectorSurface {
    fn begin_frame(&mut self) {
        self.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform * DAffine2::from_translation(DVec2::new(dx, dy));
    }

    fn scale(&mut self, factor: f64) {
        self.transform = self.transform * DAffine2::from_scale(DVec2::splat(factor));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &Fill) {
        let corners = [
            self.to_canvas(ScreenPos::new(x, y)),
            self.to_canvas(ScreenPos::new(x + width, y)),
            self.to_canvas(ScreenPos::new(x + width, y + height)),
            self.to_canvas(ScreenPos::new(x, y + height)),
        ];
        match fill {
            Fill::Solid(color) => self.fill_polygon(&corners, *color),
            Fill::Radial(gradient) => self.fill_radial(&corners, gradient),
        }
    }

    fn fill_circle(&mut self, center: ScreenPos, radius: f64, color: Color) {
        let c = self.to_canvas(center);
        self.fill_ring(c, radius * self.scale_factor(), 0.0, color);
    }

    fn stroke_circle(&mut self, center: ScreenPos, radius: f64, stroke: &Stroke) {
        if radius <= 0.0 {
            return;
        }
        let scale = self.scale_factor();
        let c = self.to_canvas(center);
        let r = radius * scale;
        let width = stroke.width * scale;

        match stroke.dash {
            Some(dash) if dash > 0.0 => {
                // Dash and gap of equal length, measured along the arc
                let dash_angle = dash * scale / r;
                let count = (std::f64::consts::TAU / (2.0 * dash_angle)).floor() as usize;
                let samples = 4;
                for i in 0..count {
                    let start = 2.0 * dash_angle * i as f64;
                    let points: Vec<DVec2> = (0..=samples)
                        .map(|s| {
                            let a = start + dash_angle * s as f64 / samples as f64;
                            c + DVec2::new(a.cos(), a.sin()) * r
                        })
                        .collect();
                    self.stroke_polyline(&points, width, stroke.color);
                }
            }
            _ => {
                if stroke.color.a <= 0.0 || width <= 0.0 {
                    return;
                }
                let mut builder = Path::builder();
                builder.add_circle(point(c.x as f32, c.y as f32), r as f32, Winding::Positive);
                let path = builder.build();
                self.stroke_path(&path, width as f32, stroke.color);
            }
        }
    }

    fn stroke_line(&mut self, from: ScreenPos, to: ScreenPos, stroke: &Stroke) {
        let points = [self.to_canvas(from), self.to_canvas(to)];
        let width = stroke.width * self.scale_factor();
        self.stroke_polyline(&points, width, stroke.color);
    }

    fn fill_text(&mut self, text: &str, at: ScreenPos, style: &TextStyle) {
        let p = self.to_canvas(at);
        self.labels.push(TextLabel {
            text: text.to_string(),
            x: p.x as f32,
            y: p.y as f32,
            size: (style.size * self.scale_factor()) as f32,
            bold: style.bold,
            align: style.align,
            baseline: style.baseline,
            color: style.color,
        });
    }
}
