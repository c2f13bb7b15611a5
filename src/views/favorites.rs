//! Favorites list with live readings.
//!
//! After the list is read, one air-quality request per favorite is started
//! at once (no cap, no batching). Rows settle independently in whatever
//! order their responses arrive.

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{CardMessages, Services};
use crate::model::{Favorite, NavigationParams};

/// A favorite together with its latest reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteRow {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub pm10: Option<f64>,
    pub pm25: Option<f64>,
    pub last_updated: Option<String>,
    pub loading_data: bool,
    pub data_error: Option<String>,
}

impl FavoriteRow {
    fn pending(favorite: Favorite) -> Self {
        Self {
            favorite,
            pm10: None,
            pm25: None,
            last_updated: None,
            loading_data: true,
            data_error: None,
        }
    }

    /// Navigation parameters that open this favorite on the home view.
    pub fn home_params(&self) -> NavigationParams {
        NavigationParams {
            lat: Some(self.favorite.latitude.to_string()),
            lon: Some(self.favorite.longitude.to_string()),
            label: Some(self.favorite.label.clone()),
        }
    }
}

/// State of the favorites view.
#[derive(Clone, Serialize)]
pub struct FavoritesView {
    #[serde(skip)]
    services: Services,
    pub loading: bool,
    pub favorites: Vec<FavoriteRow>,
}

impl FavoritesView {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            loading: true,
            favorites: Vec::new(),
        }
    }

    /// Read the list, then fetch readings for every row.
    pub async fn init(&mut self) {
        self.load().await;
        self.fetch_all(|_| {}).await;
    }

    /// Read the stored favorites; every row starts out loading.
    pub async fn load(&mut self) {
        self.loading = true;
        self.favorites = self
            .services
            .favorites
            .list()
            .await
            .into_iter()
            .map(FavoriteRow::pending)
            .collect();
        self.loading = false;
    }

    /// Fetch readings for all rows concurrently.
    ///
    /// `on_update` sees each row as soon as its own response is applied.
    pub async fn fetch_all(&mut self, mut on_update: impl FnMut(&FavoriteRow)) {
        let mut requests = JoinSet::new();

        for (index, row) in self.favorites.iter_mut().enumerate() {
            row.loading_data = true;
            row.data_error = None;

            let client = self.services.air_quality.clone();
            let (latitude, longitude) = (row.favorite.latitude, row.favorite.longitude);
            requests.spawn(async move {
                (index, client.fetch_air_quality(latitude, longitude).await)
            });
        }

        while let Some(joined) = requests.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "Favorite fetch task did not complete");
                    continue;
                }
            };
            let Some(row) = self.favorites.get_mut(index) else {
                continue;
            };

            match result {
                Ok(report) => {
                    row.pm10 = Some(report.sample.pm10);
                    row.pm25 = Some(report.sample.pm25);
                    row.last_updated = report.sample.observed_at;
                }
                Err(e) => {
                    row.data_error = Some(CardMessages::FAVORITE.for_error(&e).to_string());
                }
            }
            row.loading_data = false;

            debug!(label = %row.favorite.label, "Favorite reading settled");
            on_update(row);
        }
    }

    /// Delete a favorite from the store and from this list.
    pub async fn remove(&mut self, id: i64) {
        self.services.favorites.remove(id).await;
        self.favorites.retain(|row| row.favorite.id != Some(id));
    }
}
