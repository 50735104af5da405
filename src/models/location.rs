//! Location model: coordinates and resolved place names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic coordinates of the alert location
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether both components are within the WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Human readable name of the alert location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName(String);

impl PlaceName {
    /// Used whenever reverse geocoding does not produce a name
    pub const FALLBACK: &'static str = "your location";

    /// Build a place name from a full address, keeping its most specific segment.
    ///
    /// Returns `None` when the first comma-delimited segment is empty.
    #[must_use]
    pub fn from_address(address: &str) -> Option<Self> {
        let first = address.split(',').next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(Self(first.to_string()))
        }
    }

    /// Place name used when no address could be resolved
    #[must_use]
    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    /// Whether this is the fallback rather than a resolved name
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.0 == Self::FALLBACK
    }

    /// The place name as displayed in the alert header
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
