//! Data models for Airpulse.
//!
//! These are the records that flow between the upstream clients, the
//! favorites store and the views: coordinates, the latest air sample for a
//! location, geocoding matches, saved favorites and the PM2.5 status scale.

use serde::{Deserialize, Serialize};

/// Two coordinate values closer than this (in degrees, ~11m) name the same place.
pub const COORDINATE_TOLERANCE: f64 = 0.0001;

/// A geographic position in decimal degrees.
///
/// No range validation is performed; values are handed to the upstream
/// APIs exactly as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both axes are within [`COORDINATE_TOLERANCE`] of `other`.
    pub fn is_near(&self, other: &Coordinates) -> bool {
        (self.latitude - other.latitude).abs() < COORDINATE_TOLERANCE
            && (self.longitude - other.longitude).abs() < COORDINATE_TOLERANCE
    }
}

/// The most recent hourly reading for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirSample {
    /// PM10 concentration in µg/m³.
    pub pm10: f64,

    /// PM2.5 concentration in µg/m³.
    pub pm25: f64,

    /// Upstream timestamp of the reading (e.g. `2024-05-01T13:00`).
    ///
    /// Left empty when the time series does not line up with the
    /// measurement series.
    pub observed_at: Option<String>,
}

/// A city match returned by a geocoding search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultCity {
    /// Upstream id, or `<name>-<latitude>-<longitude>-<index>` when absent.
    pub id: String,
    pub name: String,
    /// Empty when the upstream omits the country.
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl SearchResultCity {
    /// Display label: `"<name>, <country>"`, or just the name.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A saved city.
///
/// Favorites are immutable once stored; replacing one means removing it and
/// adding a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    /// Assigned on persistence as one more than the largest stored id.
    #[serde(default)]
    pub id: Option<i64>,
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Favorite {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Request body for POST /favorites.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFavorite {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A named place the views can load.
#[derive(Debug, Clone, PartialEq)]
pub struct CityTarget {
    pub label: String,
    pub coordinates: Coordinates,
}

impl CityTarget {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            label: label.into(),
            coordinates: Coordinates::new(latitude, longitude),
        }
    }
}

/// Navigation parameters accepted by the home view (`lat`, `lon`, `label`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub label: Option<String>,
}

impl NavigationParams {
    /// Label used when the parameters carry coordinates but no label.
    pub const FALLBACK_LABEL: &'static str = "Selected location";

    /// Resolve the parameters into a target.
    ///
    /// Returns `None` unless both `lat` and `lon` parse as numbers; callers
    /// then fall back to their default city.
    pub fn target(&self) -> Option<CityTarget> {
        let latitude = parse_coordinate(self.lat.as_deref()?)?;
        let longitude = parse_coordinate(self.lon.as_deref()?)?;
        let label = match self.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => Self::FALLBACK_LABEL.to_string(),
        };
        Some(CityTarget {
            label,
            coordinates: Coordinates::new(latitude, longitude),
        })
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Air-quality band derived from a PM2.5 concentration.
///
/// Bands use inclusive upper bounds and are evaluated in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirStatus {
    /// PM2.5 at or below 12 µg/m³.
    Good,
    /// PM2.5 above 12 and at or below 35 µg/m³.
    Moderate,
    /// PM2.5 above 35 and at or below 55 µg/m³.
    UnhealthyForSensitiveGroups,
    /// PM2.5 above 55 µg/m³.
    Unhealthy,
}

impl AirStatus {
    /// Classify a PM2.5 concentration.
    ///
    /// NaN compares false against every bound and lands in `Unhealthy`.
    pub fn from_pm25(pm25: f64) -> Self {
        if pm25 <= 12.0 {
            AirStatus::Good
        } else if pm25 <= 35.0 {
            AirStatus::Moderate
        } else if pm25 <= 55.0 {
            AirStatus::UnhealthyForSensitiveGroups
        } else {
            AirStatus::Unhealthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AirStatus::Good => "Good",
            AirStatus::Moderate => "Moderate",
            AirStatus::UnhealthyForSensitiveGroups => "Unhealthy for sensitive groups",
            AirStatus::Unhealthy => "Unhealthy",
        }
    }

    /// Style tag a renderer attaches to the status badge.
    pub fn style_tag(&self) -> &'static str {
        match self {
            AirStatus::Good => "status-good",
            AirStatus::Moderate => "status-moderate",
            AirStatus::UnhealthyForSensitiveGroups => "status-usg",
            AirStatus::Unhealthy => "status-unhealthy",
        }
    }

    /// Health advice shown on the home card.
    pub fn advice(&self) -> &'static str {
        match self {
            AirStatus::Good => "Air quality is good. Enjoy outdoor activities.",
            AirStatus::Moderate => {
                "Air quality is acceptable. Sensitive groups should limit long outdoor exertion."
            }
            AirStatus::UnhealthyForSensitiveGroups => {
                "Sensitive groups should avoid prolonged outdoor exertion; others should reduce it if possible."
            }
            AirStatus::Unhealthy => {
                "Everyone should reduce outdoor exertion and consider staying indoors with windows closed."
            }
        }
    }
}

/// Label and style tag for an optional PM2.5 value.
///
/// An absent value yields `(None, "")`.
pub fn classify_pm25(pm25: Option<f64>) -> (Option<&'static str>, &'static str) {
    match pm25.map(AirStatus::from_pm25) {
        Some(status) => (Some(status.label()), status.style_tag()),
        None => (None, ""),
    }
}

/// An entry in the preset city catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    pub id: &'static str,
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn target(&self) -> CityTarget {
        CityTarget::new(self.name, self.latitude, self.longitude)
    }
}

/// Preset cities, grouped loosely by region.
pub const CITIES: &[City] = &[
    City { id: "skopje", name: "Skopje", latitude: 41.9981, longitude: 21.4254 },
    City { id: "london", name: "London", latitude: 51.5072, longitude: -0.1276 },
    City { id: "newyork", name: "New York", latitude: 40.7128, longitude: -74.0060 },
    City { id: "tokyo", name: "Tokyo", latitude: 35.6762, longitude: 139.6503 },
    City { id: "paris", name: "Paris", latitude: 48.8566, longitude: 2.3522 },
    City { id: "berlin", name: "Berlin", latitude: 52.5200, longitude: 13.4050 },
    City { id: "madrid", name: "Madrid", latitude: 40.4168, longitude: -3.7038 },
    City { id: "rome", name: "Rome", latitude: 41.9028, longitude: 12.4964 },
    City { id: "vienna", name: "Vienna", latitude: 48.2082, longitude: 16.3738 },
    City { id: "zurich", name: "Zürich", latitude: 47.3769, longitude: 8.5417 },
    City { id: "la", name: "Los Angeles", latitude: 34.0522, longitude: -118.2437 },
    City { id: "chicago", name: "Chicago", latitude: 41.8781, longitude: -87.6298 },
    City { id: "toronto", name: "Toronto", latitude: 43.6532, longitude: -79.3832 },
    City { id: "mexico", name: "Mexico City", latitude: 19.4326, longitude: -99.1332 },
    City { id: "santiago", name: "Santiago", latitude: -33.4489, longitude: -70.6693 },
    City { id: "seoul", name: "Seoul", latitude: 37.5665, longitude: 126.9780 },
    City { id: "beijing", name: "Beijing", latitude: 39.9042, longitude: 116.4074 },
    City { id: "delhi", name: "Delhi", latitude: 28.7041, longitude: 77.1025 },
    City { id: "sydney", name: "Sydney", latitude: -33.8688, longitude: 151.2093 },
    City { id: "melbourne", name: "Melbourne", latitude: -37.8136, longitude: 144.9631 },
    City { id: "cairo", name: "Cairo", latitude: 30.0444, longitude: 31.2357 },
    City { id: "johannesburg", name: "Johannesburg", latitude: -26.2041, longitude: 28.0473 },
    City { id: "dubai", name: "Dubai", latitude: 25.2048, longitude: 55.2708 },
];

/// Look up a preset city by id.
pub fn city(id: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.id == id)
}
