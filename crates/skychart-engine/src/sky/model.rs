//! Sky model: everything visible for one observer, instant and canvas size.
//!
//! A frame is rebuilt from scratch whenever an input changes; nothing is
//! patched incrementally. Zoom and pan never touch the stored positions.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::astro::{Body, EphemerisError, EphemerisProvider, Horizontal, Instant, Observer};
use crate::catalog::StarCatalog;
use super::projection::{chart_radius, project, ScreenPos};

// ── Types ────────────────────────────────────────────────────────────

/// Canvas size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(&self) -> ScreenPos {
        ScreenPos::new(self.width / 2.0, self.height / 2.0)
    }

    /// Horizon radius.
    pub fn radius(&self) -> f64 {
        chart_radius(self.width, self.height)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(600.0, 600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
    Sun,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Star => "star",
            BodyKind::Planet => "planet",
            BodyKind::Moon => "moon",
            BodyKind::Sun => "sun",
        }
    }
}

/// How comfortably an object can be observed, judged by altitude alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Excellent,
    Good,
    Low,
}

impl Visibility {
    pub fn from_altitude(altitude: f64) -> Self {
        if altitude > 30.0 {
            Visibility::Excellent
        } else if altitude > 10.0 {
            Visibility::Good
        } else {
            Visibility::Low
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Visibility::Excellent => "Excellent visibility - high in the sky",
            Visibility::Good => "Good visibility - may be affected by horizon haze",
            Visibility::Low => "Low on horizon - may be difficult to observe",
        }
    }
}

/// One visible object with its base (untransformed) screen position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    pub name: String,
    pub kind: BodyKind,
    pub altitude: f64,
    pub azimuth: f64,
    pub screen: ScreenPos,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constellation: Option<String>,
}

impl CelestialPosition {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_altitude(self.altitude)
    }

    /// Objects without a magnitude (planets, Moon) always pass.
    pub fn within_magnitude(&self, limit: f64) -> bool {
        self.magnitude.map_or(true, |m| m <= limit)
    }

    /// Same object, possibly at a different position.
    pub fn same_object(&self, other: &CelestialPosition) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

/// Constellation line between two visible stars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationSegment {
    pub from: ScreenPos,
    pub to: ScreenPos,
    pub name: String,
}

/// Snapshot of the visible sky.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameModel {
    pub instant: Instant,
    pub stars: Vec<CelestialPosition>,
    pub planets: Vec<CelestialPosition>,
    pub moon: Option<CelestialPosition>,
    pub segments: Vec<ConstellationSegment>,
}

impl FrameModel {
    pub fn empty(instant: Instant) -> Self {
        Self {
            instant,
            stars: Vec::new(),
            planets: Vec::new(),
            moon: None,
            segments: Vec::new(),
        }
    }

    /// Every visible object, stars first.
    pub fn bodies(&self) -> impl Iterator<Item = &CelestialPosition> {
        self.stars
            .iter()
            .chain(self.planets.iter())
            .chain(self.moon.iter())
    }

    pub fn find(&self, name: &str, kind: BodyKind) -> Option<&CelestialPosition> {
        self.bodies().find(|b| b.kind == kind && b.name == name)
    }
}

// ── Recompute ────────────────────────────────────────────────────────

/// Screen position of a provider result. Errors and non-finite positions
/// are logged and dropped, as is anything below the horizon.
fn place(
    name: &str,
    result: Result<Horizontal, EphemerisError>,
    canvas: CanvasSize,
) -> Option<(Horizontal, ScreenPos)> {
    let hor = match result {
        Ok(hor) if hor.is_finite() => hor,
        Ok(_) => {
            warn!("Skipping {}: position is not finite", name);
            return None;
        }
        Err(e) => {
            warn!("Skipping {}: {}", name, e);
            return None;
        }
    };
    let screen = project(hor.altitude, hor.azimuth, canvas.width, canvas.height)?;
    Some((hor, screen))
}

fn body_position(
    provider: &dyn EphemerisProvider,
    body: Body,
    kind: BodyKind,
    observer: &Observer,
    instant: Instant,
    canvas: CanvasSize,
) -> Option<CelestialPosition> {
    let (hor, screen) = place(body.name(), provider.horizontal(body, instant, observer), canvas)?;
    Some(CelestialPosition {
        name: body.name().to_string(),
        kind,
        altitude: hor.altitude,
        azimuth: hor.azimuth,
        screen,
        magnitude: None,
        constellation: None,
    })
}

/// Build the full visible set. A failing body is logged and left out;
/// it never affects the others.
pub fn compute_frame(
    catalog: &StarCatalog,
    provider: &dyn EphemerisProvider,
    observer: &Observer,
    instant: Instant,
    canvas: CanvasSize,
) -> FrameModel {
    let stars: Vec<CelestialPosition> = catalog
        .stars()
        .iter()
        .filter_map(|star| {
            let result = provider.star_horizontal(star.ra, star.dec, instant, observer);
            let (hor, screen) = place(&star.name, result, canvas)?;
            Some(CelestialPosition {
                name: star.name.clone(),
                kind: BodyKind::Star,
                altitude: hor.altitude,
                azimuth: hor.azimuth,
                screen,
                magnitude: Some(star.magnitude),
                constellation: Some(star.constellation.clone()),
            })
        })
        .collect();

    let planets: Vec<CelestialPosition> = Body::PLANETS
        .iter()
        .filter_map(|&body| body_position(provider, body, BodyKind::Planet, observer, instant, canvas))
        .collect();

    let moon = body_position(provider, Body::Moon, BodyKind::Moon, observer, instant, canvas);

    // First visible star with a given name wins.
    let mut by_name: HashMap<&str, ScreenPos> = HashMap::with_capacity(stars.len());
    for star in &stars {
        by_name.entry(star.name.as_str()).or_insert(star.screen);
    }
    let segments: Vec<ConstellationSegment> = catalog
        .constellations()
        .iter()
        .flat_map(|figure| {
            let by_name = &by_name;
            figure.lines.iter().filter_map(move |(a, b)| {
                Some(ConstellationSegment {
                    from: *by_name.get(a.as_str())?,
                    to: *by_name.get(b.as_str())?,
                    name: figure.name.clone(),
                })
            })
        })
        .collect();

    debug!(
        "Sky recomputed at {:?}: {} stars, {} planets, moon {}, {} segments",
        instant.datetime(),
        stars.len(),
        planets.len(),
        if moon.is_some() { "up" } else { "down" },
        segments.len()
    );

    FrameModel {
        instant,
        stars,
        planets,
        moon,
        segments,
    }
}

// ── Model ────────────────────────────────────────────────────────────

/// Owns the inputs of a frame and keeps the frame current.
pub struct SkyModel {
    catalog: StarCatalog,
    provider: Box<dyn EphemerisProvider>,
    observer: Observer,
    canvas: CanvasSize,
    instant: Instant,
    frame: FrameModel,
    selection: Option<CelestialPosition>,
}

impl SkyModel {
    pub fn new(
        catalog: StarCatalog,
        provider: Box<dyn EphemerisProvider>,
        observer: Observer,
        canvas: CanvasSize,
        instant: Instant,
    ) -> Self {
        let frame = compute_frame(&catalog, provider.as_ref(), &observer, instant, canvas);
        Self {
            catalog,
            provider,
            observer,
            canvas,
            instant,
            frame,
            selection: None,
        }
    }

    pub fn observer(&self) -> Observer {
        self.observer
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn instant(&self) -> Instant {
        self.instant
    }

    pub fn frame(&self) -> &FrameModel {
        &self.frame
    }

    pub fn catalog(&self) -> &StarCatalog {
        &self.catalog
    }

    /// Returns true if the selection was dropped.
    pub fn set_observer(&mut self, observer: Observer) -> bool {
        self.observer = observer;
        self.recompute()
    }

    /// Returns true if the selection was dropped.
    pub fn resize(&mut self, canvas: CanvasSize) -> bool {
        self.canvas = canvas;
        self.recompute()
    }

    /// Returns true if the selection was dropped.
    pub fn set_instant(&mut self, instant: Instant) -> bool {
        self.instant = instant;
        self.recompute()
    }

    /// Rebuild the frame and carry the selection over by name and kind.
    /// Returns true if the selected object is no longer visible.
    pub fn recompute(&mut self) -> bool {
        self.frame = compute_frame(
            &self.catalog,
            self.provider.as_ref(),
            &self.observer,
            self.instant,
            self.canvas,
        );

        let Some(selected) = self.selection.take() else {
            return false;
        };
        match self.frame.find(&selected.name, selected.kind) {
            Some(current) => {
                self.selection = Some(current.clone());
                false
            }
            None => {
                debug!("Selection {} left the visible sky", selected.name);
                true
            }
        }
    }

    pub fn selection(&self) -> Option<&CelestialPosition> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, selection: Option<CelestialPosition>) {
        self.selection = selection;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::{Equatorial, KeplerEphemeris};
    use crate::catalog::{ConstellationLines, Star};

    /// Stars sit at altitude = dec + latitude, azimuth = ra * 15.
    /// Every solar-system body fails.
    struct FlatSky;

    impl EphemerisProvider for FlatSky {
        fn equatorial(&self, body: Body, _: Instant, _: &Observer) -> Result<Equatorial, EphemerisError> {
            Err(EphemerisError::Unsupported(body))
        }

        fn star_horizontal(
            &self,
            ra: f64,
            dec: f64,
            _: Instant,
            observer: &Observer,
        ) -> Result<Horizontal, EphemerisError> {
            Ok(Horizontal {
                altitude: dec + observer.latitude,
                azimuth: ra * 15.0,
            })
        }
    }

    /// FlatSky stars; every body 30° up at its own azimuth, except Mars, which fails.
    struct MarsFails;

    impl EphemerisProvider for MarsFails {
        fn equatorial(&self, body: Body, _: Instant, _: &Observer) -> Result<Equatorial, EphemerisError> {
            Err(EphemerisError::Unsupported(body))
        }

        fn horizontal(&self, body: Body, _: Instant, _: &Observer) -> Result<Horizontal, EphemerisError> {
            if body == Body::Mars {
                return Err(EphemerisError::NonFinite { body });
            }
            Ok(Horizontal {
                altitude: 30.0,
                azimuth: body as u8 as f64 * 40.0,
            })
        }

        fn star_horizontal(
            &self,
            ra: f64,
            dec: f64,
            instant: Instant,
            observer: &Observer,
        ) -> Result<Horizontal, EphemerisError> {
            FlatSky.star_horizontal(ra, dec, instant, observer)
        }
    }

    /// Like MarsFails, but Venus and star B come back NaN instead of failing.
    struct NanSky;

    impl EphemerisProvider for NanSky {
        fn equatorial(&self, body: Body, _: Instant, _: &Observer) -> Result<Equatorial, EphemerisError> {
            Err(EphemerisError::Unsupported(body))
        }

        fn horizontal(&self, body: Body, _: Instant, _: &Observer) -> Result<Horizontal, EphemerisError> {
            let altitude = if body == Body::Venus { f64::NAN } else { 30.0 };
            Ok(Horizontal { altitude, azimuth: 90.0 })
        }

        fn star_horizontal(
            &self,
            ra: f64,
            dec: f64,
            instant: Instant,
            observer: &Observer,
        ) -> Result<Horizontal, EphemerisError> {
            let mut hor = FlatSky.star_horizontal(ra, dec, instant, observer)?;
            if ra == 2.0 {
                hor.altitude = f64::NAN;
            }
            Ok(hor)
        }
    }

    /// Real ephemeris, except Mars always fails.
    struct NoMars(KeplerEphemeris);

    impl EphemerisProvider for NoMars {
        fn equatorial(&self, body: Body, instant: Instant, observer: &Observer) -> Result<Equatorial, EphemerisError> {
            if body == Body::Mars {
                return Err(EphemerisError::NonFinite { body });
            }
            self.0.equatorial(body, instant, observer)
        }
    }

    fn star(name: &str, ra: f64, dec: f64, magnitude: f64) -> Star {
        Star {
            name: name.to_string(),
            ra,
            dec,
            magnitude,
            constellation: "Test".to_string(),
        }
    }

    fn flat_catalog() -> StarCatalog {
        StarCatalog::new(
            vec![
                star("A", 1.0, 10.0, 1.0),
                star("B", 2.0, 20.0, 2.0),
                star("C", 3.0, -5.0, 3.0),
            ],
            vec![ConstellationLines {
                name: "Test".to_string(),
                lines: vec![
                    ("A".to_string(), "B".to_string()),
                    ("B".to_string(), "C".to_string()),
                    ("A".to_string(), "Nowhere".to_string()),
                ],
            }],
        )
    }

    fn instant() -> Instant {
        Instant::from_ymd_hms(2024, 1, 15, 22, 0, 0).unwrap()
    }

    #[test]
    fn polaris_from_london() {
        let catalog = StarCatalog::builtin().unwrap();
        let frame = compute_frame(
            &catalog,
            &KeplerEphemeris::new(),
            &Observer::new(51.5074, -0.1278),
            instant(),
            CanvasSize::new(600.0, 600.0),
        );
        let polaris = frame.find("Polaris", BodyKind::Star).unwrap();
        assert!((polaris.altitude - 51.5).abs() < 1.0, "alt = {}", polaris.altitude);
        assert_eq!(polaris.magnitude, Some(1.98));
        assert_eq!(polaris.constellation.as_deref(), Some("Ursa Minor"));
    }

    #[test]
    fn nothing_below_the_horizon() {
        let catalog = StarCatalog::builtin().unwrap();
        let frame = compute_frame(
            &catalog,
            &KeplerEphemeris::new(),
            &Observer::new(-33.9, 151.2),
            instant(),
            CanvasSize::new(800.0, 600.0),
        );
        assert!(!frame.stars.is_empty());
        assert!(frame.stars.len() < catalog.len());
        assert!(frame.bodies().all(|b| b.altitude >= 0.0));
    }

    #[test]
    fn failing_body_only_drops_itself() {
        let frame = compute_frame(&flat_catalog(), &MarsFails, &Observer::new(0.0, 0.0), instant(), CanvasSize::default());
        assert!(frame.find("Mars", BodyKind::Planet).is_none());
        for name in ["Mercury", "Venus", "Jupiter", "Saturn"] {
            assert!(frame.find(name, BodyKind::Planet).is_some(), "{name} missing");
        }
        assert_eq!(frame.planets.len(), 4);
        assert_eq!(frame.moon.as_ref().map(|m| m.name.as_str()), Some("Moon"));
        assert_eq!(frame.stars.len(), 2);
    }

    #[test]
    fn non_finite_positions_are_dropped() {
        let frame = compute_frame(&flat_catalog(), &NanSky, &Observer::new(0.0, 0.0), instant(), CanvasSize::default());
        assert!(frame.find("Venus", BodyKind::Planet).is_none());
        assert!(frame.find("Jupiter", BodyKind::Planet).is_some());
        assert!(frame.moon.is_some());
        // B is NaN and C is below the horizon
        assert_eq!(frame.stars.len(), 1);
        assert!(frame.find("A", BodyKind::Star).is_some());
        assert!(frame.segments.is_empty());
        assert!(frame.bodies().all(|b| b.screen.x.is_finite() && b.screen.y.is_finite()));
    }

    #[test]
    fn failing_body_matches_reference_elsewhere() {
        let catalog = StarCatalog::builtin().unwrap();
        let observer = Observer::default();
        let canvas = CanvasSize::default();
        let reference = KeplerEphemeris::new();
        let frame = compute_frame(&catalog, &NoMars(reference), &observer, instant(), canvas);

        assert!(frame.find("Mars", BodyKind::Planet).is_none());
        for body in [Body::Mercury, Body::Venus, Body::Jupiter, Body::Saturn] {
            let up = reference.horizontal(body, instant(), &observer).unwrap().altitude >= 0.0;
            assert_eq!(frame.find(body.name(), BodyKind::Planet).is_some(), up, "{body}");
        }
        let moon_up = reference.horizontal(Body::Moon, instant(), &observer).unwrap().altitude >= 0.0;
        assert_eq!(frame.moon.is_some(), moon_up);
    }

    #[test]
    fn all_bodies_failing_leaves_stars() {
        let frame = compute_frame(&flat_catalog(), &FlatSky, &Observer::new(0.0, 0.0), instant(), CanvasSize::default());
        assert!(frame.planets.is_empty());
        assert!(frame.moon.is_none());
        assert_eq!(frame.stars.len(), 2);
    }

    #[test]
    fn segment_needs_both_endpoints() {
        let frame = compute_frame(&flat_catalog(), &FlatSky, &Observer::new(0.0, 0.0), instant(), CanvasSize::default());
        assert_eq!(frame.segments.len(), 1);
        let a = frame.find("A", BodyKind::Star).unwrap();
        let b = frame.find("B", BodyKind::Star).unwrap();
        assert_eq!(frame.segments[0].from, a.screen);
        assert_eq!(frame.segments[0].to, b.screen);
        assert_eq!(frame.segments[0].name, "Test");
    }

    #[test]
    fn builtin_segments_match_visible_pairs() {
        let catalog = StarCatalog::builtin().unwrap();
        let frame = compute_frame(&catalog, &KeplerEphemeris::new(), &Observer::default(), instant(), CanvasSize::default());
        let visible = |name: &str| frame.find(name, BodyKind::Star).is_some();
        let expected = catalog
            .constellations()
            .iter()
            .flat_map(|c| c.lines.iter())
            .filter(|(a, b)| visible(a) && visible(b))
            .count();
        assert_eq!(frame.segments.len(), expected);
    }

    #[test]
    fn selection_follows_the_object() {
        let mut model = SkyModel::new(
            flat_catalog(),
            Box::new(FlatSky),
            Observer::new(0.0, 0.0),
            CanvasSize::default(),
            instant(),
        );
        let a = model.frame().find("A", BodyKind::Star).cloned();
        model.select(a);

        assert!(!model.set_observer(Observer::new(5.0, 0.0)));
        assert_eq!(model.selection().map(|s| s.altitude), Some(15.0));

        // A drops to -5°
        assert!(model.set_observer(Observer::new(-15.0, 0.0)));
        assert!(model.selection().is_none());
        assert!(!model.set_observer(Observer::new(0.0, 0.0)));
    }

    #[test]
    fn resize_moves_base_positions() {
        let mut model = SkyModel::new(
            flat_catalog(),
            Box::new(FlatSky),
            Observer::new(0.0, 0.0),
            CanvasSize::new(600.0, 600.0),
            instant(),
        );
        let before = model.frame().stars[0].screen;
        model.resize(CanvasSize::new(1000.0, 1000.0));
        let after = model.frame().stars[0].screen;
        assert_ne!(before, after);
        assert_eq!(model.canvas().radius(), 480.0);
    }

    #[test]
    fn visibility_bands() {
        assert_eq!(Visibility::from_altitude(45.0), Visibility::Excellent);
        assert_eq!(Visibility::from_altitude(30.0), Visibility::Good);
        assert_eq!(Visibility::from_altitude(10.0), Visibility::Low);
        assert!(Visibility::Good.description().contains("haze"));
    }
}
