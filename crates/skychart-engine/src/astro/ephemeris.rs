//! Apparent positions of the Sun, Moon and naked-eye planets.
//!
//! [`EphemerisProvider`] is the seam: the chart only ever asks a provider for
//! coordinates, so hosts and tests can swap in their own model.
//! [`KeplerEphemeris`] is the built-in one: JPL mean elements for the planets
//! and a truncated Meeus series for the Moon. Good to a few arcminutes, which
//! is plenty at chart scale.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::coords::{
    ecliptic_to_equatorial_vector, equatorial_to_horizontal, Equatorial, Horizontal, Observer,
};
use super::orbit::{heliocentric_position, EclipticVector, OrbitalElements};
use super::time::Instant;

const KM_PER_AU: f64 = 149_597_870.7;

/// Validity window of the mean elements (1800–2050), in Julian centuries from J2000.
pub const VALID_CENTURIES: RangeInclusive<f64> = -2.0..=0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl Body {
    /// The planets plotted on the chart, innermost first.
    pub const PLANETS: [Body; 5] = [
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
        }
    }

}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-body failure. Always recoverable: the body is left off the chart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EphemerisError {
    #[error("{body} requested {centuries:.2} centuries from J2000, outside the model's range")]
    OutOfRange { body: Body, centuries: f64 },
    #[error("{body} position did not converge to a finite value")]
    NonFinite { body: Body },
    #[error("{0} is not supported by this ephemeris")]
    Unsupported(Body),
    #[error("star at RA {ra}h, Dec {dec}° has no finite position")]
    StarNonFinite { ra: f64, dec: f64 },
}

/// Source of apparent body positions.
pub trait EphemerisProvider {
    /// Apparent equatorial coordinates of date for `body`.
    fn equatorial(
        &self,
        body: Body,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Equatorial, EphemerisError>;

    fn horizontal(
        &self,
        body: Body,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Horizontal, EphemerisError> {
        let eq = self.equatorial(body, instant, observer)?;
        let hor = equatorial_to_horizontal(eq, instant, observer);
        if hor.is_finite() {
            Ok(hor)
        } else {
            Err(EphemerisError::NonFinite { body })
        }
    }

    /// Fixed catalog position (RA hours, Dec degrees) to horizontal.
    fn star_horizontal(
        &self,
        ra: f64,
        dec: f64,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Horizontal, EphemerisError> {
        let hor = equatorial_to_horizontal(Equatorial::new(ra, dec), instant, observer);
        if hor.is_finite() {
            Ok(hor)
        } else {
            Err(EphemerisError::StarNonFinite { ra, dec })
        }
    }
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for Box<P> {
    fn equatorial(
        &self,
        body: Body,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Equatorial, EphemerisError> {
        (**self).equatorial(body, instant, observer)
    }

    fn horizontal(
        &self,
        body: Body,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Horizontal, EphemerisError> {
        (**self).horizontal(body, instant, observer)
    }

    fn star_horizontal(
        &self,
        ra: f64,
        dec: f64,
        instant: Instant,
        observer: &Observer,
    ) -> Result<Horizontal, EphemerisError> {
        (**self).star_horizontal(ra, dec, instant, observer)
    }
}

// ── Mean elements ───────────────────────────────────────────────────

// JPL approximate elements, table 1 (1800–2050). Rates per Julian century.
const MERCURY: OrbitalElements = OrbitalElements {
    a0: 0.38709927, a_dot: 0.00000037,
    e0: 0.20563593, e_dot: 0.00001906,
    i0: 7.00497902, i_dot: -0.00594749,
    l0: 252.25032350, l_dot: 149472.67411175,
    w0: 77.45779628, w_dot: 0.16047689,
    node0: 48.33076593, node_dot: -0.12534081,
};

const VENUS: OrbitalElements = OrbitalElements {
    a0: 0.72333566, a_dot: 0.00000390,
    e0: 0.00677672, e_dot: -0.00004107,
    i0: 3.39467605, i_dot: -0.00078890,
    l0: 181.97909950, l_dot: 58517.81538729,
    w0: 131.60246718, w_dot: 0.00268329,
    node0: 76.67984255, node_dot: -0.27769418,
};

// Earth-Moon barycenter
const EARTH: OrbitalElements = OrbitalElements {
    a0: 1.00000261, a_dot: 0.00000562,
    e0: 0.01671123, e_dot: -0.00004392,
    i0: -0.00001531, i_dot: -0.01294668,
    l0: 100.46457166, l_dot: 35999.37244981,
    w0: 102.93768193, w_dot: 0.32327364,
    node0: 0.0, node_dot: 0.0,
};

const MARS: OrbitalElements = OrbitalElements {
    a0: 1.52371034, a_dot: 0.00001847,
    e0: 0.09339410, e_dot: 0.00007882,
    i0: 1.84969142, i_dot: -0.00813131,
    l0: -4.55343205, l_dot: 19140.30268499,
    w0: -23.94362959, w_dot: 0.44441088,
    node0: 49.55953891, node_dot: -0.29257343,
};

const JUPITER: OrbitalElements = OrbitalElements {
    a0: 5.20288700, a_dot: -0.00011607,
    e0: 0.04838624, e_dot: -0.00013253,
    i0: 1.30439695, i_dot: -0.00183714,
    l0: 34.39644051, l_dot: 3034.74612775,
    w0: 14.72847983, w_dot: 0.21252668,
    node0: 100.47390909, node_dot: 0.20469106,
};

const SATURN: OrbitalElements = OrbitalElements {
    a0: 9.53667594, a_dot: -0.00125060,
    e0: 0.05386179, e_dot: -0.00050991,
    i0: 2.48599187, i_dot: 0.00193609,
    l0: 49.95424423, l_dot: 1222.49362201,
    w0: 92.59887831, w_dot: -0.41897216,
    node0: 113.66242448, node_dot: -0.28867794,
};

fn planet_elements(body: Body) -> Option<&'static OrbitalElements> {
    match body {
        Body::Mercury => Some(&MERCURY),
        Body::Venus => Some(&VENUS),
        Body::Mars => Some(&MARS),
        Body::Jupiter => Some(&JUPITER),
        Body::Saturn => Some(&SATURN),
        Body::Sun | Body::Moon => None,
    }
}

// ── Moon ─────────────────────────────────────────────────────────────

/// Geocentric ecliptic longitude, latitude (degrees) and distance (km).
/// Largest terms of Meeus ch. 47.
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let lp = 218.3164477 + 481267.88123421 * t;
    let d = (297.8501921 + 445267.1114034 * t).to_radians();
    let m = (357.5291092 + 35999.0502909 * t).to_radians();
    let mp = (134.9633964 + 477198.8675055 * t).to_radians();
    let f = (93.2720950 + 483202.0175233 * t).to_radians();

    let lon = lp
        + 6.288774 * mp.sin()
        + 1.274027 * (2.0 * d - mp).sin()
        + 0.658314 * (2.0 * d).sin()
        + 0.213618 * (2.0 * mp).sin()
        - 0.185116 * m.sin()
        - 0.114332 * (2.0 * f).sin();

    let lat = 5.128122 * f.sin()
        + 0.280602 * (mp + f).sin()
        + 0.277693 * (mp - f).sin()
        + 0.173237 * (2.0 * d - f).sin();

    let dist = 385000.56
        - 20905.355 * mp.cos()
        - 3699.111 * (2.0 * d - mp).cos()
        - 2955.968 * (2.0 * d).cos()
        - 569.925 * (2.0 * mp).cos();

    (lon.rem_euclid(360.0), lat, dist)
}

// ── Provider ─────────────────────────────────────────────────────────

/// Built-in analytic ephemeris. Geocentric; light time, aberration,
/// precession and lunar parallax are ignored.
/// Instants outside [`VALID_CENTURIES`] are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeplerEphemeris;

impl KeplerEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Geocentric ecliptic position in AU.
    pub fn geocentric(&self, body: Body, instant: Instant) -> Result<EclipticVector, EphemerisError> {
        let t = instant.centuries_since_j2000();
        if !VALID_CENTURIES.contains(&t) {
            return Err(EphemerisError::OutOfRange { body, centuries: t });
        }

        let pos = match body {
            Body::Moon => {
                let (lon, lat, km) = moon_ecliptic(t);
                let (lon, lat) = (lon.to_radians(), lat.to_radians());
                let r = km / KM_PER_AU;
                EclipticVector {
                    x: r * lat.cos() * lon.cos(),
                    y: r * lat.cos() * lon.sin(),
                    z: r * lat.sin(),
                }
            }
            Body::Sun => {
                let earth = heliocentric_position(&EARTH, t);
                EclipticVector { x: -earth.x, y: -earth.y, z: -earth.z }
            }
            planet => {
                let elements = planet_elements(planet).ok_or(EphemerisError::Unsupported(planet))?;
                let earth = heliocentric_position(&EARTH, t);
                heliocentric_position(elements, t).sub(&earth)
            }
        };

        if pos.is_finite() && pos.length() > 0.0 {
            Ok(pos)
        } else {
            Err(EphemerisError::NonFinite { body })
        }
    }

    /// Earth distance in AU.
    pub fn distance_au(&self, body: Body, instant: Instant) -> Result<f64, EphemerisError> {
        self.geocentric(body, instant).map(|p| p.length())
    }
}

impl EphemerisProvider for KeplerEphemeris {
    fn equatorial(
        &self,
        body: Body,
        instant: Instant,
        _observer: &Observer,
    ) -> Result<Equatorial, EphemerisError> {
        let ecl = self.geocentric(body, instant)?;
        let (x, y, z) = ecliptic_to_equatorial_vector(ecl.x, ecl.y, ecl.z);
        Ok(Equatorial::from_vector(x, y, z))
    }
}
