//! Pointer interaction: drag-to-pan, wheel/button zoom, click-to-select.
//!
//! The controller only moves the [`ViewTransform`] and reports clicks;
//! resolving a click to an object is [`hit_test`]'s job.

use glam::DVec2;

use crate::sky::{CanvasSize, CelestialPosition, FrameModel, ScreenPos};
use crate::view::{ViewTransform, BUTTON_ZOOM_STEP, WHEEL_ZOOM_STEP};
use super::queue::{InputEvent, PRIMARY_BUTTON};

/// Screen-pixel movement before a press stops counting as a click.
pub const DRAG_THRESHOLD: f64 = 4.0;
/// Hit radius in screen pixels at zoom 1.
pub const HIT_RADIUS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        start: DVec2,
        pan_start: DVec2,
        moved: bool,
    },
}

/// What one event did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputOutcome {
    /// View changed; the chart needs a redraw.
    pub redraw: bool,
    /// New zoom, when it changed.
    pub zoom: Option<f64>,
    /// A click landed here.
    pub click: Option<ScreenPos>,
}

impl InputOutcome {
    fn view_changed() -> Self {
        Self { redraw: true, ..Self::default() }
    }

    fn zoomed(view: &ViewTransform, changed: bool) -> Self {
        if changed {
            Self { redraw: true, zoom: Some(view.zoom()), click: None }
        } else {
            Self::default()
        }
    }
}

/// `Idle → Dragging → Idle` state machine.
pub struct InteractionController {
    state: DragState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self { state: DragState::Idle }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Forget any drag in progress.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn handle(&mut self, event: InputEvent, view: &mut ViewTransform) -> InputOutcome {
        match event {
            InputEvent::PointerDown { x, y, button } => {
                if button != PRIMARY_BUTTON {
                    return InputOutcome::default();
                }
                self.state = DragState::Dragging {
                    start: DVec2::new(x, y),
                    pan_start: view.pan(),
                    moved: false,
                };
                InputOutcome::default()
            }
            InputEvent::PointerMove { x, y } => {
                let DragState::Dragging { start, pan_start, moved } = &mut self.state else {
                    return InputOutcome::default();
                };
                let delta = DVec2::new(x, y) - *start;
                if delta.length() > DRAG_THRESHOLD {
                    *moved = true;
                }
                // Content follows the pointer
                if view.set_pan(*pan_start + delta / view.zoom()) {
                    InputOutcome::view_changed()
                } else {
                    InputOutcome::default()
                }
            }
            InputEvent::PointerUp { x, y } => {
                let was = std::mem::replace(&mut self.state, DragState::Idle);
                match was {
                    DragState::Dragging { moved: false, .. } => InputOutcome {
                        click: Some(ScreenPos::new(x, y)),
                        ..InputOutcome::default()
                    },
                    _ => InputOutcome::default(),
                }
            }
            InputEvent::PointerLeave => {
                self.state = DragState::Idle;
                InputOutcome::default()
            }
            InputEvent::Wheel { delta_y } => {
                if delta_y == 0.0 || !delta_y.is_finite() {
                    return InputOutcome::default();
                }
                let step = if delta_y > 0.0 { -WHEEL_ZOOM_STEP } else { WHEEL_ZOOM_STEP };
                let changed = view.zoom_by(step);
                InputOutcome::zoomed(view, changed)
            }
            InputEvent::ZoomIn => {
                let changed = view.zoom_by(BUTTON_ZOOM_STEP);
                InputOutcome::zoomed(view, changed)
            }
            InputEvent::ZoomOut => {
                let changed = view.zoom_by(-BUTTON_ZOOM_STEP);
                InputOutcome::zoomed(view, changed)
            }
            // Zoom is reported even when it was already 1
            InputEvent::ResetView => {
                view.reset();
                InputOutcome {
                    redraw: true,
                    zoom: Some(view.zoom()),
                    click: None,
                }
            }
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest selectable object to `point` (screen pixels), within
/// `HIT_RADIUS / zoom`. Ties keep the first candidate seen.
pub fn hit_test<'a>(
    frame: &'a FrameModel,
    view: &ViewTransform,
    canvas: CanvasSize,
    magnitude_limit: f64,
    point: ScreenPos,
) -> Option<&'a CelestialPosition> {
    let center = canvas.center();
    let candidates = frame
        .stars
        .iter()
        .filter(|s| s.within_magnitude(magnitude_limit))
        .chain(frame.planets.iter())
        .chain(frame.moon.iter());

    let mut nearest = None;
    let mut nearest_dist = HIT_RADIUS / view.zoom();
    for body in candidates {
        let dist = view.apply(body.screen, center).distance(point);
        if dist < nearest_dist {
            nearest_dist = dist;
            nearest = Some(body);
        }
    }
    nearest
}
