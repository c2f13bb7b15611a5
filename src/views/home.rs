//! Featured-city view.
//!
//! Shows one city card with its status advice and a 12-hour PM2.5
//! sparkline, plus the city search box, "use my location", and a favorite
//! toggle for the current coordinates.
//!
//! Card lifecycle: `idle -> loading -> {displayed | errored}`, restarted on
//! every new city selection.

use serde::Serialize;
use tracing::{info, warn};

use super::{CardMessages, CardState, LoadCounter, LoadTicket, SearchPanel, Services};
use crate::data_sources::{AirQualityReport, ClientError};
use crate::geolocation::GeolocationError;
use crate::model::{
    AirStatus, CityTarget, Coordinates, Favorite, NavigationParams, SearchResultCity, city,
};
use crate::sparkline::{build_sparkline, recent_window};

/// Label shown after a successful geolocation fix.
pub const OWN_LOCATION_LABEL: &str = "Your location";

/// The home card: a city card plus advice and recent history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeCard {
    #[serde(flatten)]
    pub card: CardState,
    pub status_advice: Option<&'static str>,
    pub pm25_history: Vec<f64>,
    pub pm25_min: Option<f64>,
    pub pm25_max: Option<f64>,
    pub sparkline_points: Option<String>,
}

impl HomeCard {
    pub fn loading() -> Self {
        Self {
            card: CardState::loading(),
            ..Self::default()
        }
    }

    pub fn from_result(result: &Result<AirQualityReport, ClientError>) -> Self {
        let card = CardState::from_result(result, &CardMessages::CITY);
        let Ok(report) = result else {
            return Self {
                card,
                ..Self::default()
            };
        };

        let history = recent_window(&report.pm25_series).to_vec();
        let sparkline = build_sparkline(&history);

        Self {
            card,
            status_advice: Some(AirStatus::from_pm25(report.sample.pm25).advice()),
            pm25_min: sparkline.min,
            pm25_max: sparkline.max,
            sparkline_points: sparkline.polyline(),
            pm25_history: history,
        }
    }
}

/// State of the home view.
#[derive(Clone, Serialize)]
pub struct HomeView {
    #[serde(skip)]
    services: Services,
    #[serde(skip)]
    loads: LoadCounter,

    pub city_name: String,
    pub current: Option<Coordinates>,
    pub card: HomeCard,
    pub favorites: Vec<Favorite>,

    pub location_loading: bool,
    pub location_message: Option<String>,

    pub search: SearchPanel,
}

impl HomeView {
    pub const LOCATION_FOUND: &'static str = "Using your device location.";
    pub const LOCATION_DENIED: &'static str = "Location permission was denied.";
    pub const LOCATION_UNSUPPORTED: &'static str =
        "Location detection is not supported on this device.";
    pub const LOCATION_FAILED: &'static str = "Could not detect your location.";

    /// A view positioned on the default city, before anything is loaded.
    pub fn new(services: Services) -> Self {
        let default = default_city();
        Self {
            services,
            loads: LoadCounter::default(),
            city_name: default.label,
            current: Some(default.coordinates),
            card: HomeCard::loading(),
            favorites: Vec::new(),
            location_loading: false,
            location_message: None,
            search: SearchPanel::default(),
        }
    }

    /// Load favorites, then the city named by `params` or the default city.
    pub async fn init(&mut self, params: &NavigationParams) {
        self.refresh_favorites().await;

        let target = params.target().unwrap_or_else(|| CityTarget {
            label: self.city_name.clone(),
            coordinates: self.current.unwrap_or(default_city().coordinates),
        });
        self.location_message = None;
        self.load(target).await;
    }

    /// Re-read the stored favorites.
    pub async fn refresh_favorites(&mut self) {
        self.favorites = self.services.favorites.list().await;
    }

    /// Switch to `target` and fetch its readings.
    pub async fn load(&mut self, target: CityTarget) {
        let ticket = self.begin_load(target);
        let result = self
            .services
            .air_quality
            .fetch_air_quality(ticket.coordinates.latitude, ticket.coordinates.longitude)
            .await;
        self.finish_load(ticket, result);
    }

    /// Switch to `target` and reset every derived field.
    ///
    /// The returned ticket must be passed to [`HomeView::finish_load`].
    pub fn begin_load(&mut self, target: CityTarget) -> LoadTicket {
        self.city_name = target.label;
        self.current = Some(target.coordinates);
        self.card = HomeCard::loading();
        self.loads.issue(target.coordinates)
    }

    /// Apply a load result.
    ///
    /// Returns false, leaving the view untouched, when a newer load began
    /// after `ticket` was issued.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<AirQualityReport, ClientError>,
    ) -> bool {
        if !self.loads.is_current(&ticket) {
            info!(
                latitude = ticket.coordinates.latitude,
                longitude = ticket.coordinates.longitude,
                "Discarding stale air quality response"
            );
            return false;
        }

        self.card = HomeCard::from_result(&result);
        true
    }

    /// Open a stored favorite.
    pub async fn select_favorite(&mut self, favorite: &Favorite) {
        self.location_message = None;
        self.load(CityTarget {
            label: favorite.label.clone(),
            coordinates: favorite.coordinates(),
        })
        .await;
    }

    /// Open a search result.
    pub async fn select_search_result(&mut self, city: &SearchResultCity) {
        self.load(CityTarget {
            label: city.label(),
            coordinates: city.coordinates(),
        })
        .await;
    }

    /// Search for a city by name.
    pub async fn search(&mut self, raw_query: &str) {
        self.search.search(&self.services.geocoding, raw_query).await;
    }

    /// Load the device's current position.
    ///
    /// Ignored while a previous detection is still running.
    pub async fn detect_my_location(&mut self) {
        if self.location_loading {
            return;
        }

        self.location_message = None;
        self.location_loading = true;

        match self.services.geolocation.get_current_position().await {
            Ok(coordinates) => {
                self.location_message = Some(Self::LOCATION_FOUND.to_string());
                let ticket = self.begin_load(CityTarget {
                    label: OWN_LOCATION_LABEL.to_string(),
                    coordinates,
                });
                self.location_loading = false;

                let result = self
                    .services
                    .air_quality
                    .fetch_air_quality(coordinates.latitude, coordinates.longitude)
                    .await;
                self.finish_load(ticket, result);
            }
            Err(e) => {
                warn!(error = %e, "Could not detect location");
                self.location_message = Some(location_message(&e).to_string());
                self.location_loading = false;
            }
        }
    }

    /// The stored favorite at the current coordinates, if any.
    pub fn current_favorite(&self) -> Option<&Favorite> {
        let current = self.current?;
        self.favorites
            .iter()
            .find(|f| f.coordinates().is_near(&current))
    }

    pub fn is_current_favorite(&self) -> bool {
        self.current_favorite().is_some()
    }

    /// Remove the current coordinates from favorites if stored, else add them.
    ///
    /// Returns whether the current location is a favorite afterwards.
    pub async fn toggle_favorite(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };

        if let Some(id) = self.current_favorite().and_then(|f| f.id) {
            self.services.favorites.remove(id).await;
            self.favorites.retain(|f| f.id != Some(id));
            info!(id, "Removed current location from favorites");
            return false;
        }

        let created = self
            .services
            .favorites
            .add(&self.city_name, current.latitude, current.longitude)
            .await;
        info!(id = ?created.id, label = %created.label, "Added current location to favorites");
        self.favorites.push(created);
        true
    }
}

fn default_city() -> CityTarget {
    city("skopje")
        .map(|c| c.target())
        .unwrap_or_else(|| CityTarget::new("Skopje", 41.9981, 21.4254))
}

fn location_message(error: &GeolocationError) -> &'static str {
    match error {
        GeolocationError::PermissionDenied => HomeView::LOCATION_DENIED,
        GeolocationError::Unsupported => HomeView::LOCATION_UNSUPPORTED,
        GeolocationError::Timeout | GeolocationError::Unavailable(_) => HomeView::LOCATION_FAILED,
    }
}
