pub mod color;
pub mod surface;
pub mod chart;
#[cfg(feature = "vectors")]
pub mod vector;

pub use color::Color;
pub use surface::{
    DrawCommand, DrawSurface, Fill, RadialGradient, RecordingSurface, Stroke, TextAlign,
    TextBaseline, TextStyle, FONT_FAMILY,
};
pub use chart::{ChartRenderer, DisplayOptions};
#[cfg(feature = "vectors")]
pub use vector::{TextLabel, VectorSurface, VectorVertex};
