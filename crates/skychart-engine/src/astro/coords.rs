//! Observer location and the equatorial → horizontal conversion.
//!
//! Angles are degrees at the API boundary; radians only inside the math.

use serde::{Deserialize, Serialize};

use super::time::Instant;

/// Mean obliquity of the ecliptic at J2000 (degrees).
pub const OBLIQUITY_J2000_DEG: f64 = 23.43928;

/// Location shown when the host has none.
pub const DEFAULT_LATITUDE: f64 = 51.5074;
pub const DEFAULT_LONGITUDE: f64 = -0.1278;

/// A point on Earth. Elevation is always sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    /// Degrees, north positive, -90..90.
    pub latitude: f64,
    /// Degrees, east positive, -180..180.
    pub longitude: f64,
}

impl Observer {
    /// Latitude is clamped, longitude wrapped into -180..180.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let lon = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: lon,
        }
    }

    /// Parse `"lat, lng"`. Only the leading number of the first two fields
    /// counts, so `"40.7N, -74 W"` and `"40.7, -74, NYC"` both parse.
    pub fn parse(location: &str) -> Option<Self> {
        let mut fields = location.split(',');
        let lat = leading_number(fields.next()?)?;
        let lng = leading_number(fields.next()?)?;
        Some(Self::new(lat, lng))
    }

    /// Place names and malformed strings fall back to London.
    pub fn from_location_or_default(location: &str) -> Self {
        Self::parse(location).unwrap_or_default()
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}

/// Longest decimal prefix of `s` after leading whitespace.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut seen_digit = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        seen_digit |= frac_end > end + 1;
        end = frac_end;
    }
    if !seen_digit {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Equatorial coordinates of date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    /// Right ascension in hours, 0..24.
    pub ra: f64,
    /// Declination in degrees.
    pub dec: f64,
}

impl Equatorial {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// From a rectangular equatorial vector (any length).
    pub fn from_vector(x: f64, y: f64, z: f64) -> Self {
        let ra = y.atan2(x).to_degrees().rem_euclid(360.0) / 15.0;
        let dec = z.atan2((x * x + y * y).sqrt()).to_degrees();
        Self { ra, dec }
    }
}

/// Altitude/azimuth as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Horizontal {
    /// Degrees above the horizon, -90..90.
    pub altitude: f64,
    /// Degrees from north, clockwise, 0..360.
    pub azimuth: f64,
}

impl Horizontal {
    pub fn is_finite(&self) -> bool {
        self.altitude.is_finite() && self.azimuth.is_finite()
    }
}

/// Rotate an ecliptic vector into the equatorial frame.
pub fn ecliptic_to_equatorial_vector(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let eps = OBLIQUITY_J2000_DEG.to_radians();
    (x, y * eps.cos() - z * eps.sin(), y * eps.sin() + z * eps.cos())
}

/// Convert equatorial coordinates to horizontal for an observer at an instant.
/// No refraction.
pub fn equatorial_to_horizontal(eq: Equatorial, instant: Instant, observer: &Observer) -> Horizontal {
    let lst = instant.local_sidereal_degrees(observer.longitude);
    let hour_angle = (lst - eq.ra * 15.0).to_radians();
    let dec = eq.dec.to_radians();
    let lat = observer.latitude.to_radians();

    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

    let y = -dec.cos() * hour_angle.sin();
    let x = dec.sin() * lat.cos() - dec.cos() * lat.sin() * hour_angle.cos();
    let azimuth = y.atan2(x).to_degrees().rem_euclid(360.0);

    Horizontal { altitude, azimuth }
}
