//! Airpulse - air-quality readings for any city.
//!
//! # Overview
//!
//! Serves the home, compare and favorites views as JSON over HTTP. Readings
//! and city search come from the public Open-Meteo APIs; favorites are kept
//! in a local SQLite file.
//!
//! # API Endpoints
//!
//! - `GET /home` - Featured city (`lat`, `lon`, `label` override the default)
//! - `POST /home/locate` - Featured city at the device location
//! - `POST /home/favorite` - Toggle a favorite for a location
//! - `GET /search` - City search
//! - `GET /compare` - Two cities side by side
//! - `GET /favorites`, `POST /favorites`, `DELETE /favorites/:id`
//! - `GET /cities` - Preset city catalog
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use airpulse::api::{AppState, router};
use airpulse::data_sources::{AirQualityClient, GeocodingClient};
use airpulse::favorites::FavoritesStore;
use airpulse::geolocation::{FixedPosition, GeolocationProvider};
use airpulse::storage::Storage;
use airpulse::views::Services;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:airpulse.db?mode=rwc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("airpulse=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("AIRPULSE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url = env::var("AIRPULSE_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let air_quality = match env::var("AIRPULSE_AIR_QUALITY_URL") {
        Ok(url) => AirQualityClient::with_base_url(&url),
        Err(_) => AirQualityClient::new(),
    };

    let geocoding = match env::var("AIRPULSE_GEOCODING_URL") {
        Ok(url) => GeocodingClient::with_base_url(&url),
        Err(_) => GeocodingClient::new(),
    };

    let geolocation = match env::var("AIRPULSE_DEVICE_LOCATION") {
        Ok(raw) => match FixedPosition::parse(&raw) {
            Some(position) => GeolocationProvider::new(Arc::new(position)),
            None => {
                warn!(value = %raw, "Ignoring unparseable AIRPULSE_DEVICE_LOCATION");
                GeolocationProvider::unsupported()
            }
        },
        Err(_) => GeolocationProvider::unsupported(),
    };

    info!(
        port,
        db_url = %db_url,
        location_supported = geolocation.is_supported(),
        "Starting Airpulse server"
    );

    // Initialize storage
    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    let state = AppState {
        services: Services {
            air_quality,
            geocoding,
            favorites: FavoritesStore::new(storage),
            geolocation,
        },
    };

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Airpulse is listening");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
