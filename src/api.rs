//! HTTP API handlers for Airpulse.
//!
//! Every handler builds a fresh view, runs the trigger its route names and
//! returns the resulting view state as JSON. Upstream failures never become
//! HTTP errors; they are carried in the card and panel error fields.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::model::{CITIES, City, CityTarget, Favorite, NavigationParams, NewFavorite};
use crate::views::{CompareView, FavoritesView, HomeView, SearchPanel, Services};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cities", get(get_cities))
        .route("/home", get(get_home))
        .route("/home/locate", post(post_locate))
        .route("/home/favorite", post(post_toggle_favorite))
        .route("/search", get(get_search))
        .route("/compare", get(get_compare))
        .route("/favorites", get(get_favorites).post(post_favorite))
        .route("/favorites/:id", delete(delete_favorite))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /cities - The preset city catalog.
pub async fn get_cities() -> Json<&'static [City]> {
    Json(CITIES)
}

/// Home view state plus whether its city is a favorite.
#[derive(Serialize)]
pub struct HomeResponse {
    #[serde(flatten)]
    pub view: HomeView,
    pub is_current_favorite: bool,
}

impl From<HomeView> for HomeResponse {
    fn from(view: HomeView) -> Self {
        let is_current_favorite = view.is_current_favorite();
        Self {
            view,
            is_current_favorite,
        }
    }
}

/// GET /home - Load the featured city.
///
/// # Query Parameters
///
/// - `lat`, `lon` (optional): coordinates overriding the default city
/// - `label` (optional): display name for those coordinates
#[instrument(skip(state))]
pub async fn get_home(
    State(state): State<AppState>,
    Query(params): Query<NavigationParams>,
) -> Json<HomeResponse> {
    let mut view = HomeView::new(state.services);
    view.init(&params).await;

    info!(
        city = %view.city_name,
        error = ?view.card.card.error,
        "Home view loaded"
    );
    Json(view.into())
}

/// POST /home/locate - Load the device's current position.
#[instrument(skip(state))]
pub async fn post_locate(State(state): State<AppState>) -> Json<HomeResponse> {
    let mut view = HomeView::new(state.services);
    view.refresh_favorites().await;
    view.detect_my_location().await;

    info!(message = ?view.location_message, "Location detection finished");
    Json(view.into())
}

/// POST /home/favorite - Toggle the favorite for a location.
#[instrument(skip(state))]
pub async fn post_toggle_favorite(
    State(state): State<AppState>,
    Query(params): Query<NavigationParams>,
) -> Json<HomeResponse> {
    let mut view = HomeView::new(state.services);
    view.init(&params).await;
    let favorited = view.toggle_favorite().await;

    info!(city = %view.city_name, favorited, "Favorite toggled");
    Json(view.into())
}

/// Query parameters for GET /search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /search - Look up cities by name.
#[instrument(skip(state))]
pub async fn get_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchPanel> {
    let mut panel = SearchPanel::default();
    panel.search(&state.services.geocoding, &query.q).await;

    info!(results = panel.results.len(), "City search served");
    Json(panel)
}

/// Query parameters for GET /compare.
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub top_lat: Option<f64>,
    pub top_lon: Option<f64>,
    pub top_label: Option<String>,
    pub bottom_lat: Option<f64>,
    pub bottom_lon: Option<f64>,
    pub bottom_label: Option<String>,
}

impl CompareQuery {
    /// The requested pair, falling back per side to the reference cities.
    pub fn targets(&self) -> (CityTarget, CityTarget) {
        let (default_top, default_bottom) = CompareView::default_pair();
        (
            side_target(self.top_lat, self.top_lon, &self.top_label, default_top),
            side_target(
                self.bottom_lat,
                self.bottom_lon,
                &self.bottom_label,
                default_bottom,
            ),
        )
    }
}

fn side_target(
    lat: Option<f64>,
    lon: Option<f64>,
    label: &Option<String>,
    fallback: CityTarget,
) -> CityTarget {
    match (lat, lon) {
        (Some(lat), Some(lon)) => CityTarget::new(
            label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| NavigationParams::FALLBACK_LABEL.to_string()),
            lat,
            lon,
        ),
        _ => fallback,
    }
}

/// Comparison state plus the derived verdict.
#[derive(Serialize)]
pub struct CompareResponse {
    #[serde(flatten)]
    pub view: CompareView,
    pub pm25_difference: Option<f64>,
    pub summary: Option<String>,
}

/// GET /compare - Compare two cities.
#[instrument(skip(state))]
pub async fn get_compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Json<CompareResponse> {
    let mut view = CompareView::new(state.services);
    let (top, bottom) = query.targets();
    view.load_pair(top, bottom).await;

    let summary = view.summary_sentence();
    info!(summary = ?summary, "Comparison served");
    Json(CompareResponse {
        pm25_difference: view.pm25_difference(),
        summary,
        view,
    })
}

/// GET /favorites - All favorites with their current readings.
#[instrument(skip(state))]
pub async fn get_favorites(State(state): State<AppState>) -> Json<FavoritesView> {
    let mut view = FavoritesView::new(state.services);
    view.init().await;

    info!(count = view.favorites.len(), "Favorites served");
    Json(view)
}

/// POST /favorites - Save a favorite.
///
/// # Request Body
///
/// ```json
/// { "label": "Skopje", "latitude": 41.9981, "longitude": 21.4254 }
/// ```
#[instrument(skip(state))]
pub async fn post_favorite(
    State(state): State<AppState>,
    Json(request): Json<NewFavorite>,
) -> (StatusCode, Json<Favorite>) {
    let created = state
        .services
        .favorites
        .add(&request.label, request.latitude, request.longitude)
        .await;

    info!(id = ?created.id, label = %created.label, "Favorite created");
    (StatusCode::CREATED, Json(created))
}

/// DELETE /favorites/:id - Remove a favorite; unknown ids are not an error.
#[instrument(skip(state))]
pub async fn delete_favorite(State(state): State<AppState>, Path(id): Path<i64>) -> StatusCode {
    state.services.favorites.remove(id).await;

    info!(id, "Favorite removed");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_query_defaults() {
        let (top, bottom) = CompareQuery::default().targets();

        assert_eq!(top.label, "Skopje");
        assert_eq!(bottom.label, "London");
    }

    #[test]
    fn test_compare_query_needs_both_coordinates() {
        let query = CompareQuery {
            top_lat: Some(35.6762),
            top_lon: Some(139.6503),
            top_label: Some("Tokyo".to_string()),
            bottom_lat: Some(1.0),
            ..CompareQuery::default()
        };

        let (top, bottom) = query.targets();

        assert_eq!(top.label, "Tokyo");
        assert_eq!(top.coordinates.longitude, 139.6503);
        assert_eq!(bottom.label, "London");
    }
}
