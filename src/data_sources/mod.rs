//! Upstream data sources.
//!
//! Both sources are public Open-Meteo endpoints queried without
//! authentication. Every call is a single fresh round trip: no retries,
//! no caching, no client-side timeout beyond the transport default.
//!
//! # Data Sources
//!
//! - [`air_quality`]: hourly PM10 / PM2.5 series for a coordinate pair
//! - [`geocoding`]: free-text city search

pub mod air_quality;
pub mod geocoding;

pub use air_quality::{AirQualityClient, AirQualityReport};
pub use geocoding::GeocodingClient;

use thiserror::Error;

/// Failure of an upstream request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    /// The body was not the expected JSON shape.
    #[error("unexpected response shape: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request succeeded but carried no usable measurements.
    #[error("no data available")]
    NoData,
}

/// Send a GET request and decode the JSON body.
///
/// Transport failures, non-2xx statuses and undecodable bodies are kept
/// apart so callers can word them differently.
async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, ClientError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
