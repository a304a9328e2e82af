//! Static star catalog and constellation line definitions.
//!
//! The built-in catalog is embedded JSON, parsed once when a chart is created.
//! Hosts can supply their own catalog in the same format via [`StarCatalog::from_json`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded bright-star catalog.
const BRIGHT_STARS_JSON: &str = include_str!("../../data/bright_stars.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse star catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One catalog star. Positions are J2000 and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub name: String,
    /// Right ascension in hours (0..24).
    pub ra: f64,
    /// Declination in degrees (-90..90).
    pub dec: f64,
    pub magnitude: f64,
    pub constellation: String,
}

/// Line figure for one constellation: pairs of star names to connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationLines {
    pub name: String,
    pub lines: Vec<(String, String)>,
}

/// Immutable, ordered star list plus constellation figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarCatalog {
    stars: Vec<Star>,
    #[serde(default)]
    constellations: Vec<ConstellationLines>,
}

impl StarCatalog {
    /// Load the embedded bright-star catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BRIGHT_STARS_JSON)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn new(stars: Vec<Star>, constellations: Vec<ConstellationLines>) -> Self {
        Self { stars, constellations }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn constellations(&self) -> &[ConstellationLines] {
        &self.constellations
    }

    /// Look up a star by exact name.
    pub fn find(&self, name: &str) -> Option<&Star> {
        self.stars.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = StarCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 41);
        assert_eq!(catalog.constellations().len(), 4);
    }

    #[test]
    fn builtin_stars_in_range() {
        let catalog = StarCatalog::builtin().unwrap();
        for star in catalog.stars() {
            assert!(star.ra >= 0.0 && star.ra < 24.0, "{} ra = {}", star.name, star.ra);
            assert!(star.dec >= -90.0 && star.dec <= 90.0, "{} dec = {}", star.name, star.dec);
            assert!(star.magnitude < 6.0, "{} too faint", star.name);
        }
    }

    #[test]
    fn constellation_lines_reference_catalog_stars() {
        let catalog = StarCatalog::builtin().unwrap();
        for figure in catalog.constellations() {
            for (a, b) in &figure.lines {
                assert!(catalog.find(a).is_some(), "{}: unknown star {}", figure.name, a);
                assert!(catalog.find(b).is_some(), "{}: unknown star {}", figure.name, b);
            }
        }
    }

    #[test]
    fn polaris_is_near_the_pole() {
        let catalog = StarCatalog::builtin().unwrap();
        let polaris = catalog.find("Polaris").unwrap();
        assert!(polaris.dec > 89.0);
        assert_eq!(polaris.constellation, "Ursa Minor");
    }

    #[test]
    fn custom_catalog_without_constellations() {
        let json = r#"{
            "stars": [
                { "name": "Test", "ra": 1.0, "dec": 2.0, "magnitude": 3.0, "constellation": "Nowhere" }
            ]
        }"#;
        let catalog = StarCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.constellations().is_empty());
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        assert!(matches!(StarCatalog::from_json("{ nope"), Err(CatalogError::Parse(_))));
    }
}
