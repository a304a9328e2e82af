use chrono::Duration;
use glam::DVec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::astro::coords::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use crate::astro::{EphemerisProvider, Instant, KeplerEphemeris, MinuteTicker, Observer, SystemClock, TimeSource};
use crate::catalog::{CatalogError, StarCatalog};
use crate::input::{hit_test, InputEvent, InputQueue, InteractionController};
use crate::render::{ChartRenderer, DisplayOptions, DrawSurface};
use crate::sky::{CanvasSize, CelestialPosition, FrameModel, SkyModel, Visibility};
use crate::view::ViewTransform;

/// Hosts may shift the chart up to half a day either way.
pub const TIME_OFFSET_LIMIT_HOURS: f64 = 12.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid chart config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// When state changes reach the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedrawPolicy {
    /// Redraw synchronously on every state change, drag moves included.
    #[default]
    Immediate,
    /// Only mark the chart dirty; the host draws on its next animation frame.
    Coalesced,
}

/// Host configuration for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// `"lat, lng"`. Takes precedence over `latitude`/`longitude`;
    /// anything unparseable means London.
    pub location: Option<String>,
    pub width: f64,
    pub height: f64,
    pub show_constellations: bool,
    pub show_labels: bool,
    pub show_alt_az_grid: bool,
    pub show_eq_grid: bool,
    pub magnitude_limit: f64,
    pub zoom_level: f64,
    pub time_offset_hours: f64,
    /// Offset used for the on-chart clock readout.
    pub utc_offset_minutes: i32,
    pub redraw: RedrawPolicy,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let display = DisplayOptions::default();
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            location: None,
            width: 600.0,
            height: 600.0,
            show_constellations: display.show_constellations,
            show_labels: display.show_labels,
            show_alt_az_grid: display.show_alt_az_grid,
            show_eq_grid: display.show_eq_grid,
            magnitude_limit: display.magnitude_limit,
            zoom_level: 1.0,
            time_offset_hours: 0.0,
            utc_offset_minutes: 0,
            redraw: RedrawPolicy::Immediate,
        }
    }
}

impl ChartConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn observer(&self) -> Observer {
        match &self.location {
            Some(location) => Observer::from_location_or_default(location),
            None => Observer::new(self.latitude, self.longitude),
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_constellations: self.show_constellations,
            show_labels: self.show_labels,
            show_alt_az_grid: self.show_alt_az_grid,
            show_eq_grid: self.show_eq_grid,
            magnitude_limit: self.magnitude_limit,
        }
        .sanitized()
    }

    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

/// What the host hears back from the chart.
pub trait ChartListener {
    /// A click picked an object, or nothing. Also fires when the selected
    /// object drops below the horizon.
    fn selection_changed(&mut self, _selection: Option<&CelestialPosition>) {}

    /// Wheel, buttons or reset changed the zoom.
    fn zoom_changed(&mut self, _zoom: f64) {}
}

/// Selected object plus its visibility rating, for info panels.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport<'a> {
    #[serde(flatten)]
    pub body: &'a CelestialPosition,
    pub visibility: Visibility,
    pub visibility_text: &'static str,
}

impl<'a> SelectionReport<'a> {
    pub fn new(body: &'a CelestialPosition) -> Self {
        let visibility = body.visibility();
        Self {
            body,
            visibility,
            visibility_text: visibility.description(),
        }
    }
}

/// One interactive star chart: model, view, input and drawing target.
pub struct SkyChart<S: DrawSurface> {
    model: SkyModel,
    view: ViewTransform,
    controller: InteractionController,
    input: InputQueue,
    options: DisplayOptions,
    renderer: ChartRenderer,
    clock: Box<dyn TimeSource>,
    ticker: MinuteTicker,
    time_offset_hours: f64,
    utc_offset_minutes: i32,
    redraw: RedrawPolicy,
    surface: Option<S>,
    listener: Option<Box<dyn ChartListener>>,
    dirty: bool,
    disposed: bool,
    frames_drawn: u64,
}

impl<S: DrawSurface> SkyChart<S> {
    pub fn new(
        config: &ChartConfig,
        catalog: StarCatalog,
        provider: Box<dyn EphemerisProvider>,
        clock: Box<dyn TimeSource>,
        surface: Option<S>,
    ) -> Self {
        let observer = config.observer();
        let time_offset_hours = clamp_offset(config.time_offset_hours);
        let now = clock.now();
        let mut ticker = MinuteTicker::new();
        ticker.poll(now);

        let model = SkyModel::new(
            catalog,
            provider,
            observer,
            config.canvas(),
            shifted(now, time_offset_hours),
        );

        info!(
            "Sky chart created at ({:.4}, {:.4}), {}x{}, {} stars",
            observer.latitude,
            observer.longitude,
            config.width,
            config.height,
            model.catalog().len()
        );

        let mut chart = Self {
            model,
            view: ViewTransform::new(config.zoom_level),
            controller: InteractionController::new(),
            input: InputQueue::new(),
            options: config.display_options(),
            renderer: ChartRenderer::new(),
            clock,
            ticker,
            time_offset_hours,
            utc_offset_minutes: config.utc_offset_minutes,
            redraw: config.redraw,
            surface,
            listener: None,
            dirty: false,
            disposed: false,
            frames_drawn: 0,
        };
        chart.request_redraw();
        chart
    }

    /// Built-in catalog and ephemeris on the system clock.
    pub fn with_builtin(config: &ChartConfig, surface: Option<S>) -> Result<Self, CatalogError> {
        Ok(Self::new(
            config,
            StarCatalog::builtin()?,
            Box::new(KeplerEphemeris::new()),
            Box::new(SystemClock),
            surface,
        ))
    }

    pub fn set_listener(&mut self, listener: Box<dyn ChartListener>) {
        self.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn frame(&self) -> &FrameModel {
        self.model.frame()
    }

    pub fn selection(&self) -> Option<&CelestialPosition> {
        self.model.selection()
    }

    /// Selection as JSON (`null` when nothing is selected).
    pub fn selection_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.selection().map(SelectionReport::new))
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom()
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn observer(&self) -> Observer {
        self.model.observer()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.model.canvas()
    }

    /// Instant the current frame was computed for, offset included.
    pub fn instant(&self) -> Instant {
        self.model.instant()
    }

    pub fn time_offset_hours(&self) -> f64 {
        self.time_offset_hours
    }

    pub fn redraw_policy(&self) -> RedrawPolicy {
        self.redraw
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    // ── Host mutators ────────────────────────────────────────────────

    pub fn set_observer(&mut self, observer: Observer) {
        if self.disposed {
            return;
        }
        let dropped = self.model.set_observer(observer);
        self.after_recompute(dropped);
    }

    /// `"lat, lng"`; anything else falls back to London.
    pub fn set_location(&mut self, location: &str) {
        self.set_observer(Observer::from_location_or_default(location));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if self.disposed {
            return;
        }
        let dropped = self.model.resize(CanvasSize::new(width, height));
        self.after_recompute(dropped);
    }

    pub fn set_options(&mut self, options: DisplayOptions) {
        if self.disposed {
            return;
        }
        self.options = options.sanitized();
        self.request_redraw();
    }

    pub fn set_magnitude_limit(&mut self, limit: f64) {
        let options = DisplayOptions { magnitude_limit: limit, ..self.options };
        self.set_options(options);
    }

    /// Zoom pushed from the host's own controls. Not echoed back.
    pub fn set_zoom_level(&mut self, zoom: f64) {
        if self.disposed {
            return;
        }
        if self.view.set_zoom(zoom) {
            self.request_redraw();
        }
    }

    /// Show the sky `hours` from now (clamped to ±12h).
    pub fn set_time_offset_hours(&mut self, hours: f64) {
        if self.disposed {
            return;
        }
        self.time_offset_hours = clamp_offset(hours);
        let now = self.clock.now();
        let dropped = self.model.set_instant(shifted(now, self.time_offset_hours));
        self.after_recompute(dropped);
    }

    pub fn zoom_in(&mut self) {
        self.handle_input(InputEvent::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        self.handle_input(InputEvent::ZoomOut);
    }

    /// Zoom 1, pan (0, 0). The selection is kept.
    pub fn reset_view(&mut self) {
        self.handle_input(InputEvent::ResetView);
    }

    /// Drop the selection without notifying the listener.
    pub fn clear_selection(&mut self) {
        self.model.clear_selection();
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Queue an event for the next [`SkyChart::process_input`].
    pub fn push_input(&mut self, event: InputEvent) {
        if !self.disposed {
            self.input.push(event);
        }
    }

    pub fn process_input(&mut self) {
        for event in self.input.drain() {
            self.handle_input(event);
        }
    }

    /// Apply one event right away.
    pub fn handle_input(&mut self, event: InputEvent) {
        if self.disposed {
            return;
        }
        let outcome = self.controller.handle(event, &mut self.view);

        if let Some(point) = outcome.click {
            let hit = hit_test(
                self.model.frame(),
                &self.view,
                self.model.canvas(),
                self.options.magnitude_limit,
                point,
            )
            .cloned();
            debug!("Click at ({:.1}, {:.1}) selected {:?}", point.x, point.y, hit.as_ref().map(|b| &b.name));
            self.model.select(hit);
            self.notify_selection();
        }
        if let Some(zoom) = outcome.zoom {
            if let Some(listener) = self.listener.as_mut() {
                listener.zoom_changed(zoom);
            }
        }
        if outcome.redraw {
            self.request_redraw();
        }
    }

    /// Pan by a base-pixel delta, e.g. from arrow keys. Clamped like a drag.
    pub fn pan_by(&mut self, delta: DVec2) {
        if self.disposed {
            return;
        }
        if self.view.set_pan(self.view.pan() + delta) {
            self.request_redraw();
        }
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Poll the minute ticker. Returns true if the sky was recomputed.
    pub fn tick(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        let Some(now) = self.ticker.poll(self.clock.now()) else {
            return false;
        };
        let dropped = self.model.set_instant(shifted(now, self.time_offset_hours));
        self.after_recompute(dropped);
        true
    }

    // ── Drawing ──────────────────────────────────────────────────────

    /// Draw now, whatever the policy.
    pub fn render(&mut self) {
        if self.disposed {
            return;
        }
        self.dirty = false;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.begin_frame();
        self.renderer.draw(
            Some(surface as &mut dyn DrawSurface),
            self.model.frame(),
            &self.view,
            &self.options,
            self.model.canvas(),
            self.utc_offset_minutes,
        );
        self.frames_drawn += 1;
    }

    /// Animation-frame hook: draws if anything changed since the last draw.
    pub fn frame_tick(&mut self) -> bool {
        if self.dirty && !self.disposed {
            self.render();
            true
        } else {
            false
        }
    }

    /// Stop the ticker, release the surface and ignore everything after.
    pub fn dispose(&mut self) -> Option<S> {
        if self.disposed {
            return None;
        }
        self.ticker.stop();
        self.input.clear();
        self.controller.cancel();
        self.listener = None;
        self.dirty = false;
        self.disposed = true;
        info!("Sky chart disposed after {} frames", self.frames_drawn);
        self.surface.take()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn request_redraw(&mut self) {
        match self.redraw {
            RedrawPolicy::Immediate => self.render(),
            RedrawPolicy::Coalesced => self.dirty = true,
        }
    }

    fn after_recompute(&mut self, selection_dropped: bool) {
        if selection_dropped {
            self.notify_selection();
        }
        self.request_redraw();
    }

    fn notify_selection(&mut self) {
        let selection = self.model.selection().cloned();
        if let Some(listener) = self.listener.as_mut() {
            listener.selection_changed(selection.as_ref());
        }
    }
}

fn clamp_offset(hours: f64) -> f64 {
    if hours.is_finite() {
        hours.clamp(-TIME_OFFSET_LIMIT_HOURS, TIME_OFFSET_LIMIT_HOURS)
    } else {
        0.0
    }
}

fn shifted(now: Instant, hours: f64) -> Instant {
    now.offset_by(Duration::seconds((hours * 3600.0).round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::astro::ManualClock;
    use crate::input::PRIMARY_BUTTON;
    use crate::render::RecordingSurface;
    use crate::sky::BodyKind;

    #[derive(Debug, Clone, PartialEq)]
    enum Heard {
        Selected(Option<String>),
        Zoom(f64),
    }

    struct Recorder(Rc<RefCell<Vec<Heard>>>);

    impl ChartListener for Recorder {
        fn selection_changed(&mut self, selection: Option<&CelestialPosition>) {
            self.0.borrow_mut().push(Heard::Selected(selection.map(|s| s.name.clone())));
        }

        fn zoom_changed(&mut self, zoom: f64) {
            self.0.borrow_mut().push(Heard::Zoom(zoom));
        }
    }

    fn start() -> Instant {
        Instant::from_ymd_hms(2024, 1, 15, 22, 0, 0).unwrap()
    }

    fn chart_with(config: &ChartConfig) -> (SkyChart<RecordingSurface>, Rc<ManualClock>, Rc<RefCell<Vec<Heard>>>) {
        let clock = Rc::new(ManualClock::new(start()));
        let mut chart = SkyChart::new(
            config,
            StarCatalog::builtin().unwrap(),
            Box::new(KeplerEphemeris::new()),
            Box::new(Rc::clone(&clock)),
            Some(RecordingSurface::new()),
        );
        let heard = Rc::new(RefCell::new(Vec::new()));
        chart.set_listener(Box::new(Recorder(Rc::clone(&heard))));
        (chart, clock, heard)
    }

    fn chart() -> (SkyChart<RecordingSurface>, Rc<ManualClock>, Rc<RefCell<Vec<Heard>>>) {
        chart_with(&ChartConfig::default())
    }

    fn bright_star(chart: &SkyChart<RecordingSurface>) -> CelestialPosition {
        chart.frame().stars.iter().find(|s| s.within_magnitude(5.0)).unwrap().clone()
    }

    /// Where a body currently sits on screen.
    fn on_screen(chart: &SkyChart<RecordingSurface>, body: &CelestialPosition) -> (f64, f64) {
        let p = chart.view().apply(body.screen, chart.canvas().center());
        (p.x, p.y)
    }

    fn click(chart: &mut SkyChart<RecordingSurface>, x: f64, y: f64) {
        chart.handle_input(InputEvent::PointerDown { x, y, button: PRIMARY_BUTTON });
        chart.handle_input(InputEvent::PointerUp { x, y });
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let config = ChartConfig::from_json("{}").unwrap();
        assert_eq!(config, ChartConfig::default());
        assert_eq!(config.magnitude_limit, 5.0);
        assert_eq!(config.zoom_level, 1.0);
        assert!(config.show_constellations && config.show_labels);
        assert!(!config.show_alt_az_grid && !config.show_eq_grid);
        assert_eq!(config.redraw, RedrawPolicy::Immediate);
    }

    #[test]
    fn config_from_json() {
        let config = ChartConfig::from_json(
            r#"{ "latitude": 40.7, "longitude": -74.0, "magnitude_limit": 9, "redraw": "coalesced" }"#,
        )
        .unwrap();
        assert_eq!(config.observer(), Observer::new(40.7, -74.0));
        assert_eq!(config.display_options().magnitude_limit, 6.0);
        assert_eq!(config.redraw, RedrawPolicy::Coalesced);
    }

    #[test]
    fn config_location_string() {
        let config = ChartConfig::from_json(r#"{ "location": "-33.87, 151.21" }"#).unwrap();
        assert!((config.observer().latitude - -33.87).abs() < 1e-9);
        let config = ChartConfig::from_json(r#"{ "location": "Paris" }"#).unwrap();
        assert_eq!(config.observer(), Observer::default());
    }

    #[test]
    fn bad_config_json_is_an_error() {
        assert!(matches!(ChartConfig::from_json("{ \"zoom_level\": \"big\" }"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn creation_draws_once() {
        let (chart, _, _) = chart();
        assert_eq!(chart.frames_drawn(), 1);
        let texts = chart.surface().unwrap().texts();
        assert!(texts.contains(&"22:00"));
        assert!(texts.contains(&"N"));
    }

    #[test]
    fn tick_recomputes_once_per_minute() {
        let (mut chart, clock, _) = chart();
        assert!(!chart.tick());
        clock.advance(Duration::seconds(30));
        assert!(!chart.tick());
        clock.advance(Duration::seconds(30));
        assert!(chart.tick());
        assert_eq!(chart.instant(), start().offset_by(Duration::minutes(1)));
        assert_eq!(chart.frames_drawn(), 2);
    }

    #[test]
    fn click_on_star_selects_and_notifies() {
        let (mut chart, _, heard) = chart();
        let star = bright_star(&chart);
        let (x, y) = on_screen(&chart, &star);
        click(&mut chart, x, y);
        assert_eq!(chart.selection().map(|s| s.name.clone()), Some(star.name.clone()));
        assert_eq!(heard.borrow().as_slice(), &[Heard::Selected(Some(star.name))]);
        let json = chart.selection_json().unwrap();
        assert!(json.contains("\"visibility\""));
        assert!(json.contains("\"kind\":\"star\""));
    }

    #[test]
    fn click_on_empty_sky_clears() {
        let (mut chart, _, heard) = chart();
        click(&mut chart, 1.0, 1.0);
        assert!(chart.selection().is_none());
        assert_eq!(heard.borrow().as_slice(), &[Heard::Selected(None)]);
        assert_eq!(chart.selection_json().unwrap(), "null");
    }

    #[test]
    fn drag_pans_without_selecting() {
        let (mut chart, _, heard) = chart();
        chart.handle_input(InputEvent::PointerDown { x: 300.0, y: 300.0, button: PRIMARY_BUTTON });
        chart.handle_input(InputEvent::PointerMove { x: 340.0, y: 300.0 });
        chart.handle_input(InputEvent::PointerMove { x: 380.0, y: 300.0 });
        chart.handle_input(InputEvent::PointerUp { x: 380.0, y: 300.0 });
        assert_eq!(chart.view().pan(), DVec2::new(80.0, 0.0));
        assert!(heard.borrow().is_empty());
        // Initial draw plus one per move
        assert_eq!(chart.frames_drawn(), 3);
    }

    #[test]
    fn coalesced_redraws_wait_for_frame_tick() {
        let config = ChartConfig { redraw: RedrawPolicy::Coalesced, ..ChartConfig::default() };
        let (mut chart, _, _) = chart_with(&config);
        assert_eq!(chart.frames_drawn(), 0);
        assert!(chart.frame_tick());
        assert!(!chart.frame_tick());

        chart.handle_input(InputEvent::PointerDown { x: 300.0, y: 300.0, button: PRIMARY_BUTTON });
        for x in [310.0, 320.0, 330.0, 340.0] {
            chart.handle_input(InputEvent::PointerMove { x, y: 300.0 });
        }
        assert!(chart.is_dirty());
        assert_eq!(chart.frames_drawn(), 1);
        assert!(chart.frame_tick());
        assert_eq!(chart.frames_drawn(), 2);
    }

    #[test]
    fn wheel_and_buttons_report_zoom() {
        let (mut chart, _, heard) = chart();
        chart.handle_input(InputEvent::Wheel { delta_y: -53.0 });
        chart.zoom_in();
        chart.reset_view();
        assert_eq!(
            heard.borrow().as_slice(),
            &[Heard::Zoom(1.1), Heard::Zoom(1.1 + 0.2), Heard::Zoom(1.0)]
        );
        let texts = chart.surface().unwrap().texts();
        assert!(texts.contains(&"1.0x"));
    }

    #[test]
    fn reset_at_default_zoom_still_notifies() {
        let (mut chart, _, heard) = chart();
        chart.reset_view();
        assert_eq!(heard.borrow().as_slice(), &[Heard::Zoom(1.0)]);
    }

    #[test]
    fn pan_by_redraws_only_on_change() {
        let (mut chart, _, heard) = chart();
        chart.pan_by(DVec2::new(150.0, -20.0));
        assert_eq!(chart.view().pan(), DVec2::new(150.0, -20.0));
        assert_eq!(chart.frames_drawn(), 2);
        chart.pan_by(DVec2::new(100.0, 0.0));
        assert_eq!(chart.view().pan(), DVec2::new(200.0, -20.0));
        assert_eq!(chart.frames_drawn(), 3);
        // Pinned at the limit
        chart.pan_by(DVec2::new(100.0, 0.0));
        assert_eq!(chart.frames_drawn(), 3);
        assert!(heard.borrow().is_empty());
    }

    #[test]
    fn host_zoom_sync_is_silent() {
        let (mut chart, _, heard) = chart();
        chart.set_zoom_level(2.5);
        assert_eq!(chart.zoom(), 2.5);
        chart.set_zoom_level(40.0);
        assert_eq!(chart.zoom(), 3.0);
        assert!(heard.borrow().is_empty());
    }

    #[test]
    fn set_options_clamps_and_redraws() {
        let (mut chart, _, _) = chart();
        chart.set_magnitude_limit(0.2);
        assert_eq!(chart.options().magnitude_limit, 1.0);
        chart.set_options(DisplayOptions { show_alt_az_grid: true, ..*chart.options() });
        assert!(chart.surface().unwrap().texts().contains(&"45°"));
        assert_eq!(chart.frames_drawn(), 3);
    }

    #[test]
    fn time_offset_is_clamped() {
        let (mut chart, _, _) = chart();
        chart.set_time_offset_hours(30.0);
        assert_eq!(chart.time_offset_hours(), 12.0);
        assert_eq!(chart.instant(), start().offset_by(Duration::hours(12)));
        chart.set_time_offset_hours(-3.5);
        assert_eq!(chart.instant(), start().offset_by(Duration::minutes(-210)));
    }

    #[test]
    fn selection_dropped_when_body_sets() {
        let (mut chart, _, heard) = chart();
        let polaris = chart.frame().find("Polaris", BodyKind::Star).unwrap().clone();
        let (x, y) = on_screen(&chart, &polaris);
        click(&mut chart, x, y);
        assert_eq!(chart.selection().map(|s| s.name.as_str()), Some("Polaris"));

        chart.set_location("-51.5, 0");
        assert!(chart.selection().is_none());
        assert_eq!(
            heard.borrow().as_slice(),
            &[Heard::Selected(Some("Polaris".to_string())), Heard::Selected(None)]
        );
    }

    #[test]
    fn selection_refreshed_on_tick() {
        let (mut chart, clock, heard) = chart();
        let polaris = chart.frame().find("Polaris", BodyKind::Star).unwrap().clone();
        let (x, y) = on_screen(&chart, &polaris);
        click(&mut chart, x, y);
        clock.advance(Duration::minutes(5));
        assert!(chart.tick());
        let refreshed = chart.selection().unwrap();
        assert_eq!(refreshed.name, "Polaris");
        assert_ne!(refreshed.azimuth, polaris.azimuth);
        // Still visible, so nothing new to report
        assert_eq!(heard.borrow().len(), 1);
    }

    #[test]
    fn clear_selection_is_silent() {
        let (mut chart, _, heard) = chart();
        let star = bright_star(&chart);
        let (x, y) = on_screen(&chart, &star);
        click(&mut chart, x, y);
        chart.clear_selection();
        assert!(chart.selection().is_none());
        assert_eq!(heard.borrow().len(), 1);
    }

    #[test]
    fn queued_input_applies_in_order() {
        let (mut chart, _, heard) = chart();
        chart.push_input(InputEvent::ZoomIn);
        chart.push_input(InputEvent::ZoomOut);
        assert!(heard.borrow().is_empty());
        chart.process_input();
        assert_eq!(heard.borrow().len(), 2);
        assert!((chart.zoom() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn resize_recomputes_positions() {
        let (mut chart, _, _) = chart();
        let before = chart.frame().stars[0].screen;
        chart.resize(1000.0, 800.0);
        assert_eq!(chart.canvas(), CanvasSize::new(1000.0, 800.0));
        assert_ne!(chart.frame().stars[0].screen, before);
    }

    #[test]
    fn dispose_stops_everything() {
        let (mut chart, clock, heard) = chart();
        let surface = chart.dispose();
        assert!(surface.is_some());
        assert!(chart.is_disposed());
        assert!(chart.surface().is_none());

        clock.advance(Duration::minutes(10));
        assert!(!chart.tick());
        chart.zoom_in();
        click(&mut chart, 300.0, 300.0);
        chart.render();
        assert_eq!(chart.frames_drawn(), 1);
        assert!(heard.borrow().is_empty());
        assert!(chart.dispose().is_none());
    }

    #[test]
    fn no_surface_still_tracks_state() {
        let clock = ManualClock::new(start());
        let mut chart: SkyChart<RecordingSurface> = SkyChart::new(
            &ChartConfig::default(),
            StarCatalog::builtin().unwrap(),
            Box::new(KeplerEphemeris::new()),
            Box::new(clock),
            None,
        );
        chart.zoom_in();
        assert!((chart.zoom() - 1.2).abs() < 1e-12);
        assert_eq!(chart.frames_drawn(), 0);
    }
}
