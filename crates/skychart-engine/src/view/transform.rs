use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::sky::ScreenPos;

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 3.0;
/// Pan is clamped to ±PAN_LIMIT base pixels on each axis.
pub const PAN_LIMIT: f64 = 200.0;
/// Zoom change per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.1;
/// Zoom change per zoom-in/zoom-out button press.
pub const BUTTON_ZOOM_STEP: f64 = 0.2;

/// Zoom + pan applied on top of projected base positions.
/// Never folded back into the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    zoom: f64,
    pan: [f64; 2],
}

impl ViewTransform {
    pub fn new(zoom: f64) -> Self {
        let mut view = Self::default();
        view.set_zoom(zoom);
        view
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> DVec2 {
        DVec2::from_array(self.pan)
    }

    /// Set zoom, clamped. Non-finite input is ignored.
    /// Returns true if the zoom actually changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !zoom.is_finite() {
            return false;
        }
        let zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        let changed = (zoom - self.zoom).abs() > 1e-12;
        self.zoom = zoom;
        changed
    }

    /// Add `delta` to the zoom, clamped.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        self.set_zoom(self.zoom + delta)
    }

    /// Set pan, clamped per axis. Non-finite input is ignored.
    /// Returns true if the pan actually changed.
    pub fn set_pan(&mut self, pan: DVec2) -> bool {
        if !pan.is_finite() {
            return false;
        }
        let clamped = pan.clamp(DVec2::splat(-PAN_LIMIT), DVec2::splat(PAN_LIMIT)).to_array();
        let changed = clamped != self.pan;
        self.pan = clamped;
        changed
    }

    /// Back to zoom 1, no pan.
    pub fn reset(&mut self) {
        self.pan = [0.0, 0.0];
        self.zoom = 1.0;
    }

    /// Base position → on-screen position.
    pub fn apply(&self, base: ScreenPos, center: ScreenPos) -> ScreenPos {
        let c = center.to_dvec2();
        (c + (base.to_dvec2() - c + self.pan()) * self.zoom).into()
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: [0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_clamps_at_max() {
        let mut view = ViewTransform::new(2.95);
        assert!(view.zoom_by(WHEEL_ZOOM_STEP));
        assert_eq!(view.zoom(), 3.0);
        for _ in 0..5 {
            assert!(!view.zoom_by(WHEEL_ZOOM_STEP));
        }
        assert_eq!(view.zoom(), 3.0);
    }

    #[test]
    fn zoom_clamps_at_min() {
        let mut view = ViewTransform::new(0.55);
        view.zoom_by(-WHEEL_ZOOM_STEP);
        view.zoom_by(-WHEEL_ZOOM_STEP);
        assert_eq!(view.zoom(), 0.5);
    }

    #[test]
    fn out_of_range_zoom_is_clamped_not_rejected() {
        assert_eq!(ViewTransform::new(10.0).zoom(), 3.0);
        assert_eq!(ViewTransform::new(0.0).zoom(), 0.5);
        assert_eq!(ViewTransform::new(f64::NAN).zoom(), 1.0);
    }

    #[test]
    fn pan_clamps_per_axis() {
        let mut view = ViewTransform::default();
        view.set_pan(DVec2::new(5000.0, -120.0));
        assert_eq!(view.pan(), DVec2::new(200.0, -120.0));
        view.set_pan(DVec2::new(-1e9, -1e9));
        assert_eq!(view.pan(), DVec2::new(-200.0, -200.0));
    }

    #[test]
    fn set_pan_reports_change() {
        let mut view = ViewTransform::default();
        assert!(view.set_pan(DVec2::new(300.0, 0.0)));
        assert!(!view.set_pan(DVec2::new(900.0, 0.0)));
        assert!(!view.set_pan(DVec2::new(f64::NAN, 0.0)));
        assert!(view.set_pan(DVec2::new(900.0, 1.0)));
        assert_eq!(view.pan(), DVec2::new(200.0, 1.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut view = ViewTransform::new(2.0);
        view.set_pan(DVec2::new(50.0, 50.0));
        view.reset();
        assert_eq!(view, ViewTransform::default());
    }

    #[test]
    fn apply_scales_about_center() {
        let center = ScreenPos::new(300.0, 300.0);
        let base = ScreenPos::new(310.0, 280.0);

        assert_eq!(ViewTransform::default().apply(base, center), base);

        let zoomed = ViewTransform::new(2.0);
        assert_eq!(zoomed.apply(center, center), center);
        assert_eq!(zoomed.apply(base, center), ScreenPos::new(320.0, 260.0));

        let mut panned = ViewTransform::new(2.0);
        panned.set_pan(DVec2::new(10.0, 0.0));
        assert_eq!(panned.apply(base, center), ScreenPos::new(340.0, 260.0));
    }
}
