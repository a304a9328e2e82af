pub mod canvas2d;
pub mod runner;

pub use canvas2d::Canvas2dSurface;
pub use runner::{Backend, ChartRunner, Notice};

use std::cell::RefCell;

use js_sys::Function;
use log::{info, warn};
use wasm_bindgen::prelude::*;

use skychart_engine::input::PRIMARY_BUTTON;
use skychart_engine::{ChartConfig, InputEvent};

thread_local! {
    static RUNNER: RefCell<Option<ChartRunner>> = const { RefCell::new(None) };
    static CALLBACKS: RefCell<Callbacks> = RefCell::new(Callbacks::default());
}

#[derive(Default)]
struct Callbacks {
    on_select: Option<Function>,
    on_zoom: Option<Function>,
}

/// Run `f` on the chart, then deliver whatever it raised to JS.
/// Before `chart_init` or after `chart_dispose` the call is logged and dropped.
fn with_runner<R>(op: &str, f: impl FnOnce(&mut ChartRunner) -> R) -> Option<R> {
    let (result, notices) = RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => {
                let result = f(runner);
                (Some(result), runner.take_notices())
            }
            None => {
                warn!("{}: chart not initialized, call ignored", op);
                (None, Vec::new())
            }
        }
    });
    deliver(notices);
    result
}

fn deliver(notices: Vec<Notice>) {
    if notices.is_empty() {
        return;
    }
    let (on_select, on_zoom) = CALLBACKS.with(|cell| {
        let callbacks = cell.borrow();
        (callbacks.on_select.clone(), callbacks.on_zoom.clone())
    });
    for notice in notices {
        let (callback, arg) = match notice {
            Notice::Selection(json) => (
                on_select.as_ref(),
                js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
            ),
            Notice::Zoom(zoom) => (on_zoom.as_ref(), JsValue::from_f64(zoom)),
        };
        if let Some(callback) = callback {
            if let Err(err) = callback.call1(&JsValue::NULL, &arg) {
                warn!("chart callback threw: {:?}", err);
            }
        }
    }
}

fn parse_config(config_json: &str) -> ChartConfig {
    if config_json.trim().is_empty() {
        return ChartConfig::default();
    }
    ChartConfig::from_json(config_json).unwrap_or_else(|err| {
        warn!("{}; using defaults", err);
        ChartConfig::default()
    })
}

fn install(config: &ChartConfig, backend: Backend) -> Result<(), JsValue> {
    let runner = ChartRunner::with_config(config, backend).map_err(|e| JsValue::from_str(&e))?;
    RUNNER.with(|cell| {
        if let Some(mut old) = cell.borrow_mut().replace(runner) {
            old.dispose();
        }
    });
    info!("skychart: initialized");
    Ok(())
}

fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Create the page's chart on the `<canvas>` with id `canvas_id`.
/// `config_json` may be empty; invalid JSON falls back to defaults.
#[wasm_bindgen]
pub fn chart_init(canvas_id: &str, config_json: &str) -> Result<(), JsValue> {
    init_logging();
    let config = parse_config(config_json);
    let mut surface = Canvas2dSurface::from_element_id(canvas_id)?;
    surface.resize(config.width, config.height);
    install(&config, Backend::Canvas(surface))
}

/// Create the page's chart drawing into the vector buffer instead of a canvas.
#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn chart_init_vectors(config_json: &str) -> Result<(), JsValue> {
    init_logging();
    let config = parse_config(config_json);
    install(&config, Backend::Vectors(skychart_engine::VectorSurface::new()))
}

#[wasm_bindgen]
pub fn chart_dispose() {
    let runner = RUNNER.with(|cell| cell.borrow_mut().take());
    match runner {
        Some(mut runner) => runner.dispose(),
        None => warn!("chart_dispose: chart not initialized, call ignored"),
    }
    CALLBACKS.with(|cell| *cell.borrow_mut() = Callbacks::default());
}

// ---- Callbacks ----

/// `callback(selection | null)` after every click, and when the selected
/// object sets.
#[wasm_bindgen]
pub fn chart_on_select(callback: Option<Function>) {
    CALLBACKS.with(|cell| cell.borrow_mut().on_select = callback);
}

/// `callback(zoom)` when wheel, buttons or reset change the zoom.
#[wasm_bindgen]
pub fn chart_on_zoom(callback: Option<Function>) {
    CALLBACKS.with(|cell| cell.borrow_mut().on_zoom = callback);
}

// ---- Host mutators ----

#[wasm_bindgen]
pub fn chart_set_observer(latitude: f64, longitude: f64) {
    with_runner("chart_set_observer", |r| r.set_observer(latitude, longitude));
}

#[wasm_bindgen]
pub fn chart_set_location(location: &str) {
    with_runner("chart_set_location", |r| r.set_location(location));
}

#[wasm_bindgen]
pub fn chart_resize(width: f64, height: f64) {
    with_runner("chart_resize", |r| r.resize(width, height));
}

#[wasm_bindgen]
pub fn chart_set_options(options_json: &str) {
    with_runner("chart_set_options", |r| r.set_options_json(options_json));
}

#[wasm_bindgen]
pub fn chart_set_magnitude_limit(limit: f64) {
    with_runner("chart_set_magnitude_limit", |r| r.set_magnitude_limit(limit));
}

#[wasm_bindgen]
pub fn chart_set_zoom_level(zoom: f64) {
    with_runner("chart_set_zoom_level", |r| r.set_zoom_level(zoom));
}

#[wasm_bindgen]
pub fn chart_set_time_offset(hours: f64) {
    with_runner("chart_set_time_offset", |r| r.set_time_offset_hours(hours));
}

#[wasm_bindgen]
pub fn chart_clear_selection() {
    with_runner("chart_clear_selection", |r| r.clear_selection());
}

// ---- Time and drawing ----

/// Call from `setInterval`; recomputes when a minute has passed.
#[wasm_bindgen]
pub fn chart_tick() -> bool {
    with_runner("chart_tick", |r| r.tick()).unwrap_or(false)
}

/// Call from `requestAnimationFrame`; draws if the chart is dirty.
#[wasm_bindgen]
pub fn chart_frame() -> bool {
    with_runner("chart_frame", |r| r.frame()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn chart_render() {
    with_runner("chart_render", |r| r.render());
}

// ---- Input ----

#[wasm_bindgen]
pub fn chart_pointer_down(x: f64, y: f64, button: i16) {
    with_runner("chart_pointer_down", |r| r.input(InputEvent::PointerDown { x, y, button }));
}

#[wasm_bindgen]
pub fn chart_pointer_move(x: f64, y: f64) {
    with_runner("chart_pointer_move", |r| r.input(InputEvent::PointerMove { x, y }));
}

#[wasm_bindgen]
pub fn chart_pointer_up(x: f64, y: f64) {
    with_runner("chart_pointer_up", |r| r.input(InputEvent::PointerUp { x, y }));
}

#[wasm_bindgen]
pub fn chart_pointer_leave() {
    with_runner("chart_pointer_leave", |r| r.input(InputEvent::PointerLeave));
}

/// Touch hosts have no buttons; treat a touch as the primary one.
#[wasm_bindgen]
pub fn chart_touch_start(x: f64, y: f64) {
    chart_pointer_down(x, y, PRIMARY_BUTTON);
}

#[wasm_bindgen]
pub fn chart_wheel(delta_y: f64) {
    with_runner("chart_wheel", |r| r.input(InputEvent::Wheel { delta_y }));
}

/// Pan by a base-pixel delta, for arrow keys or touch gestures the host
/// interprets itself.
#[wasm_bindgen]
pub fn chart_pan_by(dx: f64, dy: f64) {
    with_runner("chart_pan_by", |r| r.pan_by(dx, dy));
}

#[wasm_bindgen]
pub fn chart_zoom_in() {
    with_runner("chart_zoom_in", |r| r.input(InputEvent::ZoomIn));
}

#[wasm_bindgen]
pub fn chart_zoom_out() {
    with_runner("chart_zoom_out", |r| r.input(InputEvent::ZoomOut));
}

#[wasm_bindgen]
pub fn chart_reset_view() {
    with_runner("chart_reset_view", |r| r.input(InputEvent::ResetView));
}

// ---- Data accessors ----

/// Selected object as JSON, or `"null"`.
#[wasm_bindgen]
pub fn chart_selection_json() -> String {
    with_runner("chart_selection_json", |r| r.selection_json()).unwrap_or_else(|| "null".to_string())
}

#[wasm_bindgen]
pub fn chart_zoom() -> f64 {
    with_runner("chart_zoom", |r| r.chart().zoom()).unwrap_or(1.0)
}

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_vector_vertices_ptr() -> *const f32 {
    with_runner("get_vector_vertices_ptr", |r| r.vector_vertices_ptr()).unwrap_or(std::ptr::null())
}

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_vector_vertex_count() -> u32 {
    with_runner("get_vector_vertex_count", |r| r.vector_vertex_count()).unwrap_or(0)
}

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_labels_json() -> String {
    with_runner("get_labels_json", |r| r.labels_json()).unwrap_or_else(|| "[]".to_string())
}
