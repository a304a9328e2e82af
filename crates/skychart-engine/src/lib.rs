pub mod api;
pub mod astro;
pub mod catalog;
pub mod sky;
pub mod view;
pub mod input;
pub mod render;

// Re-export key types at crate root for convenience
pub use api::chart::{
    ChartConfig, ChartListener, ConfigError, RedrawPolicy, SelectionReport, SkyChart,
    TIME_OFFSET_LIMIT_HOURS,
};
pub use astro::{
    Body, EphemerisError, EphemerisProvider, Instant, KeplerEphemeris, ManualClock, MinuteTicker,
    Observer, SystemClock, TimeSource,
};
pub use catalog::{CatalogError, ConstellationLines, Star, StarCatalog};
pub use sky::{
    compute_frame, BodyKind, CanvasSize, CelestialPosition, FrameModel, ScreenPos, SkyModel,
    Visibility,
};
pub use view::ViewTransform;
pub use glam::DVec2;
pub use input::{hit_test, InputEvent, InputOutcome, InputQueue, InteractionController};
pub use render::{
    ChartRenderer, Color, DisplayOptions, DrawCommand, DrawSurface, RecordingSurface,
};

#[cfg(feature = "vectors")]
pub use render::{TextLabel, VectorSurface, VectorVertex};
