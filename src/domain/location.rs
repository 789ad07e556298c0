use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Geographic point supplied by the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A location for which a forecast artifact may have been trained
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceLocation {
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
}

impl ReferenceLocation {
    pub fn new(longitude: f64, latitude: f64, name: impl Into<String>) -> Self {
        Self {
            longitude,
            latitude,
            name: name.into(),
        }
    }

    /// L1 (Manhattan) distance in degrees
    pub fn l1_distance(&self, point: GeoPoint) -> f64 {
        (point.latitude - self.latitude).abs() + (point.longitude - self.longitude).abs()
    }

    pub fn key(&self) -> LocationKey {
        LocationKey::new(self)
    }
}

/// Artifact lookup key: `{lon}-{lat}-{name}` with coordinates rounded to two
/// decimals, e.g. `-74.01-40.71-New York` or `13.4-52.52-Berlin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(location: &ReferenceLocation) -> Self {
        Self(format!(
            "{}-{}-{}",
            format_coordinate(location.longitude),
            format_coordinate(location.latitude),
            location.name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shortest decimal form of `value` rounded to 2 places, always with a
/// fractional part (`40.0`, not `40`).
fn format_coordinate(value: f64) -> String {
    // rounds the exact binary value: 13.405 -> 13.40
    let rounded: f64 = format!("{value:.2}").parse().unwrap_or(value);
    let s = rounded.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}
