//! Star chart renderer: one frame of the sky onto a [`DrawSurface`].
//!
//! Pure drawing. Reads the frame, view and options; mutates nothing.

use serde::{Deserialize, Serialize};

use crate::sky::{altitude_radius, CanvasSize, CelestialPosition, FrameModel, ScreenPos};
use crate::view::ViewTransform;
use super::color::Color;
use super::surface::{DrawSurface, Fill, RadialGradient, Stroke, TextAlign, TextBaseline, TextStyle};

// ── Layout ───────────────────────────────────────────────────────────

/// Altitude rings when the alt/az grid is on.
const GRID_ALTITUDES: [f64; 5] = [15.0, 30.0, 45.0, 60.0, 75.0];
/// Altitude rings when it is off.
const BASIC_ALTITUDES: [f64; 2] = [30.0, 60.0];
const AZIMUTH_SPOKE_STEP: usize = 30;
const EQ_DECLINATIONS: [f64; 5] = [-60.0, -30.0, 0.0, 30.0, 60.0];
/// Declination rings are squeezed inside the horizon.
const EQ_RING_SCALE: f64 = 0.8;
const CARDINALS: [(&str, f64); 4] = [("N", -90.0), ("E", 0.0), ("S", 90.0), ("W", 180.0)];
const CARDINAL_OFFSET: f64 = 12.0;
/// Bright-star label cutoff.
const LABEL_MAGNITUDE: f64 = 1.5;

/// Which overlays to draw and how faint a star may be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub show_constellations: bool,
    pub show_labels: bool,
    pub show_alt_az_grid: bool,
    pub show_eq_grid: bool,
    pub magnitude_limit: f64,
}

pub const MAGNITUDE_LIMIT_MIN: f64 = 1.0;
pub const MAGNITUDE_LIMIT_MAX: f64 = 6.0;

impl DisplayOptions {
    /// Clamp the magnitude limit into its slider range.
    pub fn sanitized(mut self) -> Self {
        self.magnitude_limit = if self.magnitude_limit.is_finite() {
            self.magnitude_limit.clamp(MAGNITUDE_LIMIT_MIN, MAGNITUDE_LIMIT_MAX)
        } else {
            Self::default().magnitude_limit
        };
        self
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_constellations: true,
            show_labels: true,
            show_alt_az_grid: false,
            show_eq_grid: false,
            magnitude_limit: 5.0,
        }
    }
}

/// Chart colors, resolved once.
#[derive(Debug, Clone, Copy)]
struct Palette {
    sky_center: Color,
    sky_edge: Color,
    horizon: Color,
    grid: Color,
    grid_faint: Color,
    grid_label: Color,
    eq_grid: Color,
    constellation: Color,
    star: Color,
    star_glow: Color,
    star_label: Color,
    moon: Color,
    moon_glow: Color,
    time_text: Color,
    zoom_text: Color,
    planet_default: Color,
    mercury: Color,
    venus: Color,
    mars: Color,
    jupiter: Color,
    saturn: Color,
}

impl Palette {
    fn new() -> Self {
        Self {
            sky_center: Color::hsl(222.0, 47.0, 8.0),
            sky_edge: Color::hsl(222.0, 47.0, 4.0),
            horizon: Color::hsl(217.0, 91.0, 60.0),
            grid: Color::hsla(217.0, 91.0, 60.0, 0.3),
            grid_faint: Color::hsla(217.0, 91.0, 60.0, 0.2),
            grid_label: Color::hsla(217.0, 91.0, 60.0, 0.5),
            eq_grid: Color::hsla(45.0, 70.0, 50.0, 0.25),
            constellation: Color::hsla(217.0, 91.0, 60.0, 0.3),
            star: Color::hsl(210.0, 40.0, 98.0),
            star_glow: Color::hsla(210.0, 40.0, 98.0, 0.8),
            star_label: Color::hsla(210.0, 40.0, 98.0, 0.7),
            moon: Color::hsl(45.0, 15.0, 85.0),
            moon_glow: Color::hsla(45.0, 20.0, 90.0, 0.5),
            time_text: Color::hsla(210.0, 40.0, 98.0, 0.8),
            zoom_text: Color::hsla(210.0, 40.0, 98.0, 0.6),
            planet_default: Color::hsl(45.0, 70.0, 70.0),
            mercury: Color::hsl(30.0, 40.0, 60.0),
            venus: Color::hsl(45.0, 80.0, 70.0),
            mars: Color::hsl(10.0, 70.0, 55.0),
            jupiter: Color::hsl(35.0, 50.0, 65.0),
            saturn: Color::hsl(45.0, 40.0, 60.0),
        }
    }

    fn planet(&self, name: &str) -> Color {
        match name {
            "Mercury" => self.mercury,
            "Venus" => self.venus,
            "Mars" => self.mars,
            "Jupiter" => self.jupiter,
            "Saturn" => self.saturn,
            _ => self.planet_default,
        }
    }
}

fn text(size: f64, bold: bool, align: TextAlign, baseline: TextBaseline, color: Color) -> TextStyle {
    TextStyle { size, bold, align, baseline, color }
}

/// Glow square centred on `at`, fading from `color` to clear.
fn draw_glow(surface: &mut dyn DrawSurface, at: ScreenPos, radius: f64, color: Color) {
    let gradient = RadialGradient {
        center: at,
        radius,
        inner: color,
        outer: color.with_alpha(0.0),
    };
    surface.fill_rect(at.x - radius, at.y - radius, radius * 2.0, radius * 2.0, &Fill::Radial(gradient));
}

pub struct ChartRenderer {
    palette: Palette,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self { palette: Palette::new() }
    }

    /// Draw one frame. Without a surface this does nothing.
    pub fn draw(
        &self,
        surface: Option<&mut dyn DrawSurface>,
        frame: &FrameModel,
        view: &ViewTransform,
        options: &DisplayOptions,
        canvas: CanvasSize,
        utc_offset_minutes: i32,
    ) {
        let Some(surface) = surface else {
            return;
        };
        let p = &self.palette;
        let zoom = view.zoom();
        let pan = view.pan();
        let center = canvas.center();
        let radius = canvas.radius();

        // Background
        let sky = RadialGradient {
            center,
            radius: radius * zoom,
            inner: p.sky_center,
            outer: p.sky_edge,
        };
        surface.fill_rect(0.0, 0.0, canvas.width, canvas.height, &Fill::Radial(sky));

        surface.save();
        surface.translate(center.x, center.y);
        surface.scale(zoom);
        surface.translate(-center.x + pan.x, -center.y + pan.y);

        surface.stroke_circle(center, radius, &Stroke::solid(p.horizon, 2.0 / zoom));

        self.draw_grid(surface, options, center, radius, zoom);
        if options.show_eq_grid {
            self.draw_eq_grid(surface, center, radius, zoom);
        }
        self.draw_cardinals(surface, center, radius, zoom);

        if options.show_constellations {
            let line = Stroke::solid(p.constellation, 1.0 / zoom);
            for segment in &frame.segments {
                surface.stroke_line(segment.from, segment.to, &line);
            }
        }

        for star in frame.stars.iter().filter(|s| s.within_magnitude(options.magnitude_limit)) {
            self.draw_star(surface, star, options.show_labels, zoom);
        }
        for planet in &frame.planets {
            self.draw_planet(surface, planet, options.show_labels, zoom);
        }
        if let Some(moon) = &frame.moon {
            self.draw_moon(surface, moon, options.show_labels, zoom);
        }

        surface.restore();

        // Readouts, unaffected by zoom and pan
        surface.fill_text(
            &frame.instant.format_hhmm(utc_offset_minutes),
            ScreenPos::new(10.0, 10.0),
            &text(12.0, false, TextAlign::Left, TextBaseline::Top, p.time_text),
        );
        surface.fill_text(
            &format!("{:.1}x", zoom),
            ScreenPos::new(canvas.width - 10.0, 12.0),
            &text(10.0, false, TextAlign::Right, TextBaseline::Top, p.zoom_text),
        );
    }

    fn draw_grid(&self, surface: &mut dyn DrawSurface, options: &DisplayOptions, center: ScreenPos, radius: f64, zoom: f64) {
        let p = &self.palette;
        if !options.show_alt_az_grid {
            let ring = Stroke::solid(p.grid_faint, 1.0 / zoom);
            for alt in BASIC_ALTITUDES {
                surface.stroke_circle(center, altitude_radius(alt, radius), &ring);
            }
            return;
        }

        let ring = Stroke::solid(p.grid, 1.0 / zoom);
        let label = text(10.0 / zoom, false, TextAlign::Center, TextBaseline::Alphabetic, p.grid_label);
        for alt in GRID_ALTITUDES {
            let r = altitude_radius(alt, radius);
            surface.stroke_circle(center, r, &ring);
            surface.fill_text(
                &format!("{}°", alt),
                ScreenPos::new(center.x, center.y - r - 3.0 / zoom),
                &label,
            );
        }
        for az in (0..360).step_by(AZIMUTH_SPOKE_STEP) {
            let rad = (az as f64 - 90.0).to_radians();
            let end = ScreenPos::new(center.x + radius * rad.cos(), center.y + radius * rad.sin());
            surface.stroke_line(center, end, &ring);
        }
    }

    fn draw_eq_grid(&self, surface: &mut dyn DrawSurface, center: ScreenPos, radius: f64, zoom: f64) {
        let ring = Stroke::dashed(self.palette.eq_grid, 1.0 / zoom, 3.0 / zoom);
        for dec in EQ_DECLINATIONS {
            let r = radius * (1.0 - (dec + 90.0) / 180.0) * EQ_RING_SCALE;
            if r > 0.0 && r < radius {
                surface.stroke_circle(center, r, &ring);
            }
        }
    }

    fn draw_cardinals(&self, surface: &mut dyn DrawSurface, center: ScreenPos, radius: f64, zoom: f64) {
        let style = text(14.0 / zoom, true, TextAlign::Center, TextBaseline::Middle, self.palette.horizon);
        let r = radius + CARDINAL_OFFSET / zoom;
        for (label, angle) in CARDINALS {
            let rad = angle.to_radians();
            surface.fill_text(label, ScreenPos::new(center.x + r * rad.cos(), center.y + r * rad.sin()), &style);
        }
    }

    fn draw_star(&self, surface: &mut dyn DrawSurface, star: &CelestialPosition, labels: bool, zoom: f64) {
        let p = &self.palette;
        let magnitude = star.magnitude.unwrap_or(0.0);
        let size = (4.0 - magnitude * 0.5).max(1.0) / zoom;

        draw_glow(surface, star.screen, size * 3.0, p.star_glow);
        surface.fill_circle(star.screen, size, p.star);

        if labels && magnitude < LABEL_MAGNITUDE {
            surface.fill_text(
                &star.name,
                ScreenPos::new(star.screen.x + size + 4.0 / zoom, star.screen.y + 3.0 / zoom),
                &text(10.0 / zoom, false, TextAlign::Left, TextBaseline::Middle, p.star_label),
            );
        }
    }

    fn draw_planet(&self, surface: &mut dyn DrawSurface, planet: &CelestialPosition, labels: bool, zoom: f64) {
        let color = self.palette.planet(&planet.name);
        draw_glow(surface, planet.screen, 12.0 / zoom, color);
        surface.fill_circle(planet.screen, 5.0 / zoom, color);
        if labels {
            surface.fill_text(
                &planet.name,
                ScreenPos::new(planet.screen.x + 8.0 / zoom, planet.screen.y + 4.0 / zoom),
                &text(11.0 / zoom, true, TextAlign::Left, TextBaseline::Middle, color),
            );
        }
    }

    fn draw_moon(&self, surface: &mut dyn DrawSurface, moon: &CelestialPosition, labels: bool, zoom: f64) {
        let p = &self.palette;
        draw_glow(surface, moon.screen, 20.0 / zoom, p.moon_glow);
        surface.fill_circle(moon.screen, 8.0 / zoom, p.moon);
        if labels {
            surface.fill_text(
                &moon.name,
                ScreenPos::new(moon.screen.x + 12.0 / zoom, moon.screen.y + 4.0 / zoom),
                &text(11.0 / zoom, true, TextAlign::Left, TextBaseline::Middle, p.moon),
            );
        }
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}
