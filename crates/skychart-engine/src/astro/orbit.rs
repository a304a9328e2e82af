//! Keplerian orbital mechanics. Pure math with no chart types.
//!
//! Angles are degrees at the API and f64 throughout; element rates are per Julian century.

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Keplerian elements at J2000 with secular rates per Julian century.
/// Source: Standish, JPL "Approximate Positions of the Planets", table 1
/// (valid 1800–2050).
#[derive(Debug, Clone, Copy)]
pub struct OrbitalElements {
    /// Semi-major axis (AU)
    pub a0: f64,
    pub a_dot: f64,
    /// Eccentricity
    pub e0: f64,
    pub e_dot: f64,
    /// Inclination to the ecliptic (degrees)
    pub i0: f64,
    pub i_dot: f64,
    /// Mean longitude (degrees)
    pub l0: f64,
    pub l_dot: f64,
    /// Longitude of perihelion (degrees)
    pub w0: f64,
    pub w_dot: f64,
    /// Longitude of the ascending node (degrees)
    pub node0: f64,
    pub node_dot: f64,
}

/// Heliocentric ecliptic position in AU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipticVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EclipticVector {
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn sub(&self, other: &EclipticVector) -> EclipticVector {
        EclipticVector {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Solve Kepler's equation: E - e·sin(E) = M
/// Using Newton-Raphson iteration.
/// `mean_anomaly` in radians, returns eccentric anomaly in radians.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut ea = mean_anomaly; // initial guess
    for _ in 0..15 {
        let delta = ea - eccentricity * ea.sin() - mean_anomaly;
        let derivative = 1.0 - eccentricity * ea.cos();
        ea -= delta / derivative;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ea
}

/// Heliocentric ecliptic (J2000) position for the given elements
/// at `t_centuries` Julian centuries from J2000.
pub fn heliocentric_position(elements: &OrbitalElements, t_centuries: f64) -> EclipticVector {
    let a = elements.a0 + elements.a_dot * t_centuries;
    let e = elements.e0 + elements.e_dot * t_centuries;
    let i = (elements.i0 + elements.i_dot * t_centuries) * DEG_TO_RAD;
    let l = elements.l0 + elements.l_dot * t_centuries;
    let w = elements.w0 + elements.w_dot * t_centuries;
    let node = (elements.node0 + elements.node_dot * t_centuries) * DEG_TO_RAD;

    // Argument of perihelion and mean anomaly (wrapped to ±180°)
    let arg_peri = w * DEG_TO_RAD - node;
    let m = ((l - w + 180.0).rem_euclid(360.0) - 180.0) * DEG_TO_RAD;

    let ea = solve_kepler(m, e);

    // Position in the orbital plane, x toward perihelion
    let xp = a * (ea.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ea.sin();

    let (so, co) = arg_peri.sin_cos();
    let (sn, cn) = node.sin_cos();
    let (si, ci) = i.sin_cos();

    EclipticVector {
        x: (co * cn - so * sn * ci) * xp + (-so * cn - co * sn * ci) * yp,
        y: (co * sn + so * cn * ci) * xp + (-so * sn + co * cn * ci) * yp,
        z: (so * si) * xp + (co * si) * yp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> OrbitalElements {
        OrbitalElements {
            a0: 1.00000261, a_dot: 0.00000562,
            e0: 0.01671123, e_dot: -0.00004392,
            i0: -0.00001531, i_dot: -0.01294668,
            l0: 100.46457166, l_dot: 35999.37244981,
            w0: 102.93768193, w_dot: 0.32327364,
            node0: 0.0, node_dot: 0.0,
        }
    }

    #[test]
    fn kepler_circular_orbit() {
        // For e=0, eccentric anomaly = mean anomaly
        let ea = solve_kepler(1.0, 0.0);
        assert!((ea - 1.0).abs() < 1e-10);
    }

    #[test]
    fn kepler_mercury_eccentricity() {
        let m = 1.5;
        let ea = solve_kepler(m, 0.2056);
        let residual = ea - 0.2056 * ea.sin() - m;
        assert!(residual.abs() < 1e-12, "residual = {residual}");
    }

    #[test]
    fn earth_at_j2000() {
        let pos = heliocentric_position(&earth(), 0.0);
        let dist = pos.length();
        assert!((dist - 0.983).abs() < 0.01, "Earth distance = {dist} AU");
        // Earth stays in the ecliptic plane
        assert!(pos.z.abs() < 1e-5);
    }

    #[test]
    fn inclined_orbit_leaves_the_ecliptic() {
        let mut elements = earth();
        elements.i0 = 10.0;
        elements.i_dot = 0.0;
        let max_z = (0..36)
            .map(|k| heliocentric_position(&elements, k as f64 / 36.0 / 100.0).z.abs())
            .fold(0.0_f64, f64::max);
        assert!(max_z > 0.1, "max |z| = {max_z}");
    }

    #[test]
    fn vector_helpers() {
        let a = EclipticVector { x: 3.0, y: 4.0, z: 0.0 };
        let b = EclipticVector { x: 1.0, y: 1.0, z: 1.0 };
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.sub(&b), EclipticVector { x: 2.0, y: 3.0, z: -1.0 });
        assert!(a.is_finite());
    }
}
