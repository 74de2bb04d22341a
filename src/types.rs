//! Core types for the marker store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage key of the user's own marker.
pub const USER_MARKER_KEY: &str = "USER_MARKER";

/// Storage key of the nearby marker list.
pub const NEARBY_MARKERS_KEY: &str = "NEARBY_MARKERS";

/// Latitude of the seeded user marker.
pub const DEFAULT_LATITUDE: f64 = 59.429813;

/// Longitude of the seeded user marker.
pub const DEFAULT_LONGITUDE: f64 = 24.849374;

/// Label of the seeded user marker.
pub const DEFAULT_NAME: &str = "Milrem Robotics";

/// A named geographic point of interest.
///
/// Coordinates are signed degrees and are not range checked. The JSON shape is
/// `{ "latitude": number, "longitude": number, "name": string }`; all three
/// fields are required when decoding, extra fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl Marker {
    pub fn new(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: name.into(),
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Marker::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_NAME)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.latitude, self.longitude)
    }
}
