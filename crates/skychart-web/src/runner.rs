use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use skychart_engine::render::{Fill, Stroke, TextStyle};
use skychart_engine::{
    CelestialPosition, ChartConfig, ChartListener, Color, DVec2, DisplayOptions, DrawSurface,
    InputEvent, Observer, ScreenPos, SelectionReport, SkyChart,
};
#[cfg(feature = "vectors")]
use skychart_engine::VectorSurface;

use crate::canvas2d::Canvas2dSurface;

/// Where the chart draws: straight onto a canvas, or into a vertex
/// buffer the host uploads itself.
pub enum Backend {
    Canvas(Canvas2dSurface),
    #[cfg(feature = "vectors")]
    Vectors(VectorSurface),
}

macro_rules! each_backend {
    ($self:ident, $s:ident => $body:expr) => {
        match $self {
            Backend::Canvas($s) => $body,
            #[cfg(feature = "vectors")]
            Backend::Vectors($s) => $body,
        }
    };
}

impl DrawSurface for Backend {
    fn begin_frame(&mut self) {
        each_backend!(self, s => s.begin_frame())
    }

    fn save(&mut self) {
        each_backend!(self, s => s.save())
    }

    fn restore(&mut self) {
        each_backend!(self, s => s.restore())
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        each_backend!(self, s => s.translate(dx, dy))
    }

    fn scale(&mut self, factor: f64) {
        each_backend!(self, s => s.scale(factor))
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &Fill) {
        each_backend!(self, s => s.fill_rect(x, y, width, height, fill))
    }

    fn fill_circle(&mut self, center: ScreenPos, radius: f64, color: Color) {
        each_backend!(self, s => s.fill_circle(center, radius, color))
    }

    fn stroke_circle(&mut self, center: ScreenPos, radius: f64, stroke: &Stroke) {
        each_backend!(self, s => s.stroke_circle(center, radius, stroke))
    }

    fn stroke_line(&mut self, from: ScreenPos, to: ScreenPos, stroke: &Stroke) {
        each_backend!(self, s => s.stroke_line(from, to, stroke))
    }

    fn fill_text(&mut self, text: &str, at: ScreenPos, style: &TextStyle) {
        each_backend!(self, s => s.fill_text(text, at, style))
    }
}

/// Something the host should hear about once the runner is released.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Selection as JSON, `"null"` for none.
    Selection(String),
    Zoom(f64),
}

/// Listener that queues notices instead of calling into JS while the
/// chart is mutably borrowed.
struct QueueListener(Rc<RefCell<Vec<Notice>>>);

impl ChartListener for QueueListener {
    fn selection_changed(&mut self, selection: Option<&CelestialPosition>) {
        let json = serde_json::to_string(&selection.map(SelectionReport::new)).unwrap_or_else(|err| {
            warn!("Failed to serialize selection: {}", err);
            "null".to_string()
        });
        self.0.borrow_mut().push(Notice::Selection(json));
    }

    fn zoom_changed(&mut self, zoom: f64) {
        self.0.borrow_mut().push(Notice::Zoom(zoom));
    }
}

/// Owns the page's chart. The exported free functions in `lib.rs`
/// reach it through a `thread_local!`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct ChartRunner {
    chart: SkyChart<Backend>,
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl ChartRunner {
    pub fn new(mut chart: SkyChart<Backend>) -> Self {
        let notices = Rc::new(RefCell::new(Vec::new()));
        chart.set_listener(Box::new(QueueListener(Rc::clone(&notices))));
        Self { chart, notices }
    }

    /// Chart on the built-in catalog and the system clock.
    pub fn with_config(config: &ChartConfig, backend: Backend) -> Result<Self, String> {
        let chart = SkyChart::with_builtin(config, Some(backend)).map_err(|e| e.to_string())?;
        Ok(Self::new(chart))
    }

    pub fn chart(&self) -> &SkyChart<Backend> {
        &self.chart
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }

    // ---- Host mutators ----

    pub fn set_observer(&mut self, latitude: f64, longitude: f64) {
        self.chart.set_observer(Observer::new(latitude, longitude));
    }

    pub fn set_location(&mut self, location: &str) {
        self.chart.set_location(location);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if let Some(Backend::Canvas(canvas)) = self.chart.surface_mut() {
            canvas.resize(width, height);
        }
        self.chart.resize(width, height);
    }

    /// Options as JSON; missing fields take their defaults.
    pub fn set_options_json(&mut self, json: &str) {
        match serde_json::from_str::<DisplayOptions>(json) {
            Ok(options) => self.chart.set_options(options),
            Err(err) => warn!("Ignoring invalid display options: {}", err),
        }
    }

    pub fn set_magnitude_limit(&mut self, limit: f64) {
        self.chart.set_magnitude_limit(limit);
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.chart.set_zoom_level(zoom);
    }

    pub fn set_time_offset_hours(&mut self, hours: f64) {
        self.chart.set_time_offset_hours(hours);
    }

    pub fn clear_selection(&mut self) {
        self.chart.clear_selection();
    }

    /// Queue an event and apply everything queued.
    pub fn input(&mut self, event: InputEvent) {
        self.chart.push_input(event);
        self.chart.process_input();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.chart.pan_by(DVec2::new(dx, dy));
    }

    pub fn tick(&mut self) -> bool {
        self.chart.tick()
    }

    pub fn frame(&mut self) -> bool {
        self.chart.frame_tick()
    }

    pub fn render(&mut self) {
        self.chart.render();
    }

    pub fn selection_json(&self) -> String {
        self.chart.selection_json().unwrap_or_else(|err| {
            warn!("Failed to serialize selection: {}", err);
            "null".to_string()
        })
    }

    pub fn dispose(&mut self) {
        self.chart.dispose();
        self.notices.borrow_mut().clear();
    }

    // ---- Vector accessors ----

    #[cfg(feature = "vectors")]
    fn vectors(&self) -> Option<&VectorSurface> {
        match self.chart.surface() {
            Some(Backend::Vectors(v)) => Some(v),
            _ => None,
        }
    }

    #[cfg(feature = "vectors")]
    pub fn vector_vertices_ptr(&self) -> *const f32 {
        self.vectors().map_or(std::ptr::null(), |v| v.buffer_ptr())
    }

    #[cfg(feature = "vectors")]
    pub fn vector_vertex_count(&self) -> u32 {
        self.vectors().map_or(0, |v| v.vertex_count() as u32)
    }

    #[cfg(feature = "vectors")]
    pub fn labels_json(&self) -> String {
        self.vectors()
            .map(|v| {
                v.labels_json().unwrap_or_else(|err| {
                    warn!("Failed to serialize labels: {}", err);
                    "[]".to_string()
                })
            })
            .unwrap_or_else(|| "[]".to_string())
    }
}
