//! View state and orchestration.
//!
//! Each view owns an explicit state record that a renderer reads. Triggers
//! (initial load, picking a city, a geolocation fix) reset the affected card
//! synchronously and then issue one upstream request; the response replaces
//! the card in one assignment.
//!
//! # Stale completions
//!
//! A card load is split into [`LoadTicket`]-issuing `begin_*` and a
//! `finish_*` that applies a result only if no newer load has begun on the
//! same card since. A slow response for a city the user already navigated
//! away from is discarded instead of overwriting the newer one.
//!
//! # Views
//!
//! - [`home`]: one featured city with history, search, location and favorites
//! - [`compare`]: two independent cities side by side
//! - [`favorites`]: every stored favorite with its current reading

pub mod compare;
pub mod favorites;
pub mod home;

pub use compare::{ComparePane, CompareView, Side};
pub use favorites::{FavoriteRow, FavoritesView};
pub use home::{HomeCard, HomeView};

use serde::Serialize;
use tracing::warn;

use crate::data_sources::{AirQualityClient, AirQualityReport, ClientError, GeocodingClient};
use crate::favorites::FavoritesStore;
use crate::geolocation::GeolocationProvider;
use crate::model::{Coordinates, SearchResultCity, classify_pm25};

/// Collaborators shared by every view.
#[derive(Clone)]
pub struct Services {
    pub air_quality: AirQualityClient,
    pub geocoding: GeocodingClient,
    pub favorites: FavoritesStore,
    pub geolocation: GeolocationProvider,
}

/// Wording used for a card's error field.
#[derive(Debug, Clone, Copy)]
pub struct CardMessages {
    pub failed: &'static str,
    pub no_data: &'static str,
    pub parse: &'static str,
}

impl CardMessages {
    /// Messages on the home and compare cards.
    pub const CITY: CardMessages = CardMessages {
        failed: "Failed to load air quality data",
        no_data: "No air quality data available",
        parse: "Failed to parse air quality data",
    };

    /// Messages on the favorites list rows.
    pub const FAVORITE: CardMessages = CardMessages {
        failed: "Failed to load air data.",
        no_data: "No air quality data available.",
        parse: "Failed to load air data.",
    };

    pub fn for_error(&self, error: &ClientError) -> &'static str {
        match error {
            ClientError::Transport(_) | ClientError::Status(_) => self.failed,
            ClientError::NoData => self.no_data,
            ClientError::Parse(_) => self.parse,
        }
    }
}

/// Per-city working set shown on a card.
///
/// After a load completes exactly one of the readings or `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardState {
    pub loading: bool,
    pub error: Option<String>,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub last_updated: Option<String>,
    pub status_label: Option<&'static str>,
    pub status_class: &'static str,
}

impl CardState {
    /// A fresh card waiting for its first response.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// The settled card for a load result.
    pub fn from_result(
        result: &Result<AirQualityReport, ClientError>,
        messages: &CardMessages,
    ) -> Self {
        match result {
            Ok(report) => {
                let (status_label, status_class) = classify_pm25(Some(report.sample.pm25));
                Self {
                    loading: false,
                    error: None,
                    pm10: Some(report.sample.pm10),
                    pm25: Some(report.sample.pm25),
                    last_updated: report.sample.observed_at.clone(),
                    status_label,
                    status_class,
                }
            }
            Err(e) => Self {
                loading: false,
                error: Some(messages.for_error(e).to_string()),
                ..Self::default()
            },
        }
    }
}

/// Handle for one in-flight card load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadTicket {
    generation: u64,
    pub coordinates: Coordinates,
}

/// Hands out tickets and recognizes the newest one.
#[derive(Debug, Clone, Copy, Default)]
struct LoadCounter {
    current: u64,
}

impl LoadCounter {
    fn issue(&mut self, coordinates: Coordinates) -> LoadTicket {
        self.current += 1;
        LoadTicket {
            generation: self.current,
            coordinates,
        }
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.current
    }
}

/// State of a city search box and its result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPanel {
    pub loading: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub results: Vec<SearchResultCity>,
}

impl SearchPanel {
    pub const NO_RESULTS: &'static str = "No cities found.";
    pub const FAILED: &'static str = "Failed to search city. Please try again.";

    /// Run one search.
    ///
    /// A blank query leaves the panel untouched and issues no request.
    pub async fn search(&mut self, geocoding: &GeocodingClient, raw_query: &str) {
        let Some(query) = self.begin_search(raw_query) else {
            return;
        };
        let result = geocoding.search(&query).await;
        self.finish_search(&query, result);
    }

    /// Clear the panel and mark it loading.
    ///
    /// Returns the trimmed query to send, or `None` for a blank query, in
    /// which case the panel is left as it was.
    pub fn begin_search(&mut self, raw_query: &str) -> Option<String> {
        let query = raw_query.trim();
        if query.is_empty() {
            return None;
        }

        *self = SearchPanel {
            loading: true,
            ..SearchPanel::default()
        };
        Some(query.to_string())
    }

    /// Apply the outcome of a search started with [`SearchPanel::begin_search`].
    pub fn finish_search(
        &mut self,
        query: &str,
        result: Result<Vec<SearchResultCity>, ClientError>,
    ) {
        *self = match result {
            Ok(results) if results.is_empty() => SearchPanel {
                message: Some(Self::NO_RESULTS.to_string()),
                ..SearchPanel::default()
            },
            Ok(results) => SearchPanel {
                message: Some(format!("Found {} option(s).", results.len())),
                results,
                ..SearchPanel::default()
            },
            Err(e) => {
                warn!(query, error = %e, "City search failed");
                SearchPanel {
                    error: Some(Self::FAILED.to_string()),
                    ..SearchPanel::default()
                }
            }
        };
    }

    /// Hide the result list after a result was picked.
    pub fn dismiss(&mut self) {
        self.results.clear();
        self.message = None;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::model::AirSample;
    use crate::storage::Storage;

    /// Nothing listens on the discard port, so any upstream request fails fast.
    pub const UNREACHABLE: &str = "http://127.0.0.1:9";

    pub async fn offline_services() -> Services {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        Services {
            air_quality: AirQualityClient::with_base_url(UNREACHABLE),
            geocoding: GeocodingClient::with_base_url(UNREACHABLE),
            favorites: FavoritesStore::new(storage),
            geolocation: GeolocationProvider::unsupported(),
        }
    }

    pub fn report(pm10: f64, pm25_series: &[f64]) -> Result<AirQualityReport, ClientError> {
        Ok(AirQualityReport {
            sample: AirSample {
                pm10,
                pm25: *pm25_series.last().unwrap(),
                observed_at: Some("2024-05-01T12:00".to_string()),
            },
            pm25_series: pm25_series.to_vec(),
        })
    }
}
