//! The drawing seam between the chart renderer and a backend.
//!
//! [`DrawSurface`] follows the shape of the HTML canvas 2D API closely enough
//! that the browser backend is a thin mapping, while the lyon backend can
//! tessellate the same calls into triangles.

use serde::{Deserialize, Serialize};

use crate::sky::ScreenPos;
use super::color::Color;

/// Font family for every label on the chart.
pub const FONT_FAMILY: &str = "'Share Tech Mono', monospace";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Alphabetic,
    Middle,
    Top,
}

impl TextBaseline {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextBaseline::Alphabetic => "alphabetic",
            TextBaseline::Middle => "middle",
            TextBaseline::Top => "top",
        }
    }
}

/// Font and placement for one `fill_text` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in local (pre-transform) units.
    pub size: f64,
    pub bold: bool,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub color: Color,
}

impl TextStyle {
    /// CSS font shorthand, e.g. `bold 14px 'Share Tech Mono', monospace`.
    pub fn css_font(&self) -> String {
        let weight = if self.bold { "bold " } else { "" };
        format!("{}{}px {}", weight, self.size, FONT_FAMILY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub center: ScreenPos,
    pub radius: f64,
    pub inner: Color,
    pub outer: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    Radial(RadialGradient),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// Line width in local units.
    pub width: f64,
    /// Dash and gap length in local units; `None` for a solid line.
    pub dash: Option<f64>,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self { color, width, dash: None }
    }

    pub fn dashed(color: Color, width: f64, dash: f64) -> Self {
        Self { color, width, dash: Some(dash) }
    }
}

/// A 2D target the chart renderer draws onto.
/// Transforms compose like the canvas API: each call post-multiplies.
pub trait DrawSurface {
    /// Called once before each frame is drawn.
    fn begin_frame(&mut self) {}

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, factor: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &Fill);
    fn fill_circle(&mut self, center: ScreenPos, radius: f64, color: Color);
    fn stroke_circle(&mut self, center: ScreenPos, radius: f64, stroke: &Stroke);
    fn stroke_line(&mut self, from: ScreenPos, to: ScreenPos, stroke: &Stroke);
    fn fill_text(&mut self, text: &str, at: ScreenPos, style: &TextStyle);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate(f64, f64),
    Scale(f64),
    FillRect { x: f64, y: f64, width: f64, height: f64, fill: Fill },
    FillCircle { center: ScreenPos, radius: f64, color: Color },
    StrokeCircle { center: ScreenPos, radius: f64, stroke: Stroke },
    StrokeLine { from: ScreenPos, to: ScreenPos, stroke: Stroke },
    FillText { text: String, at: ScreenPos, style: TextStyle },
}

/// Surface that only records what was drawn. Handy for tests and for
/// replaying a frame elsewhere.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every string passed to `fill_text`, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn begin_frame(&mut self) {
        self.commands.clear();
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.commands.push(DrawCommand::Translate(dx, dy));
    }

    fn scale(&mut self, factor: f64) {
        self.commands.push(DrawCommand::Scale(factor));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &Fill) {
        self.commands.push(DrawCommand::FillRect { x, y, width, height, fill: *fill });
    }

    fn fill_circle(&mut self, center: ScreenPos, radius: f64, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: ScreenPos, radius: f64, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, stroke: *stroke });
    }

    fn stroke_line(&mut self, from: ScreenPos, to: ScreenPos, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeLine { from, to, stroke: *stroke });
    }

    fn fill_text(&mut self, text: &str, at: ScreenPos, style: &TextStyle) {
        self.commands.push(DrawCommand::FillText { text: text.to_string(), at, style: *style });
    }
}
