//! Horizontal → canvas projection.
//!
//! Zenith at the canvas center, horizon on a circle of radius `R`,
//! north up, east right. Radius is linear in zenith distance.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Gap between the horizon circle and the nearest canvas edge.
pub const HORIZON_MARGIN: f64 = 20.0;

/// Canvas-pixel position, origin top-left, y down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn distance(self, other: ScreenPos) -> f64 {
        self.to_dvec2().distance(other.to_dvec2())
    }
}

impl From<DVec2> for ScreenPos {
    fn from(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Horizon radius for a canvas.
pub fn chart_radius(width: f64, height: f64) -> f64 {
    width.min(height) / 2.0 - HORIZON_MARGIN
}

/// Distance from the center at which `altitude` is drawn.
pub fn altitude_radius(altitude: f64, radius: f64) -> f64 {
    radius * (90.0 - altitude) / 90.0
}

/// Project altitude/azimuth (degrees) to canvas pixels.
/// `None` below the horizon or for non-finite input.
pub fn project(altitude: f64, azimuth: f64, width: f64, height: f64) -> Option<ScreenPos> {
    if !altitude.is_finite() || altitude < 0.0 || !azimuth.is_finite() {
        return None;
    }
    let center = DVec2::new(width / 2.0, height / 2.0);
    let r = altitude_radius(altitude, chart_radius(width, height));
    let az = (azimuth - 90.0).to_radians();
    Some((center + DVec2::new(az.cos(), az.sin()) * r).into())
}
