//! Open-Meteo geocoding client.
//!
//! Resolves a free-text place name to at most five candidate cities. The
//! cap is applied by the request (`count=5`), not by truncating locally.
//!
//! # API Reference
//!
//! See: <https://open-meteo.com/en/docs/geocoding-api>

use serde::Deserialize;
use tracing::{debug, warn};

use super::{ClientError, get_json};
use crate::model::SearchResultCity;

/// Endpoint for the Open-Meteo geocoding API.
const GEOCODING_API: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Maximum number of matches requested per search.
pub const MAX_RESULTS: usize = 5;

/// Client for city name lookups.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingClient {
    /// Create a new client against the public endpoint.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GEOCODING_API.to_string(),
        }
    }

    /// Create a client with a custom endpoint URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Search for cities matching `query`.
    ///
    /// A blank query returns an empty list without contacting the upstream.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = GeocodingClient::new();
    /// let cities = client.search("Skopje").await?;
    /// ```
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultCity>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}?name={}&count={}&language=en&format=json",
            self.base_url,
            urlencoding::encode(query),
            MAX_RESULTS
        );

        match get_json::<GeocodingResponse>(&self.client, &url).await {
            Ok(response) => {
                let cities = response.into_cities();
                debug!(query, matches = cities.len(), "Geocoding search completed");
                Ok(cities)
            }
            Err(e) => {
                warn!(query, error = %e, "Geocoding search failed");
                Err(e)
            }
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Body of the geocoding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResponse {
    /// Matches; the upstream omits the field entirely when nothing matched.
    #[serde(default)]
    pub results: Vec<GeocodingResult>,
}

/// A single upstream match.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResult {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeocodingResponse {
    /// Normalize upstream matches, preserving their order.
    ///
    /// Matches without an upstream id get one synthesized from their
    /// position in this response, so those ids are only stable for
    /// identical responses.
    pub fn into_cities(self) -> Vec<SearchResultCity> {
        self.results
            .into_iter()
            .enumerate()
            .map(|(index, r)| SearchResultCity {
                id: r.id.map(|id| id.to_string()).unwrap_or_else(|| {
                    format!("{}-{}-{}-{}", r.name, r.latitude, r.longitude, index)
                }),
                name: r.name,
                country: r.country.unwrap_or_default(),
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_results() {
        let response: GeocodingResponse = serde_json::from_str(
            r#"{"results": [
                {"id": 785842, "name": "Skopje", "country": "North Macedonia",
                 "latitude": 41.99646, "longitude": 21.43141},
                {"name": "Skopje", "latitude": 42.1, "longitude": 21.5}
            ]}"#,
        )
        .unwrap();

        let cities = response.into_cities();

        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].id, "785842");
        assert_eq!(cities[0].country, "North Macedonia");
        assert_eq!(cities[1].id, "Skopje-42.1-21.5-1");
        assert_eq!(cities[1].country, "");
    }

    #[test]
    fn test_missing_results_is_empty() {
        let response: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms": 0.5}"#).unwrap();
        assert!(response.into_cities().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        // Nothing listens here; a request would fail with a transport error.
        let client = GeocodingClient::with_base_url("http://127.0.0.1:9/v1/search");

        assert!(client.search("").await.unwrap().is_empty());
        assert!(client.search("   \t").await.unwrap().is_empty());
        assert!(matches!(
            client.search("Skopje").await,
            Err(ClientError::Transport(_))
        ));
    }
}
