pub mod projection;
pub mod model;

pub use projection::{project, chart_radius, altitude_radius, ScreenPos};
pub use model::{
    compute_frame, BodyKind, CanvasSize, CelestialPosition, ConstellationSegment, FrameModel,
    SkyModel, Visibility,
};
