//! Open-Meteo air-quality client.
//!
//! Requests hourly `pm10` and `pm2_5` series for a coordinate pair. Only the
//! last element of each series is treated as "current"; the PM2.5 series is
//! also kept for the home view's history chart.
//!
//! # API Reference
//!
//! See: <https://open-meteo.com/en/docs/air-quality-api>

use serde::Deserialize;
use tracing::{debug, warn};

use super::{ClientError, get_json};
use crate::model::AirSample;

/// Endpoint for the Open-Meteo air-quality API.
const AIR_QUALITY_API: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Client for hourly particulate-matter readings.
#[derive(Clone)]
pub struct AirQualityClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for AirQualityClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AirQualityClient {
    /// Create a new client against the public endpoint.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: AIR_QUALITY_API.to_string(),
        }
    }

    /// Create a client with a custom endpoint URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the hourly series for a location and decode the latest reading.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] / [`ClientError::Status`] when the request fails
    /// - [`ClientError::Parse`] when the body is not the documented shape
    /// - [`ClientError::NoData`] when the series are missing or empty
    pub async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirQualityReport, ClientError> {
        let url = format!(
            "{}?latitude={}&longitude={}&hourly=pm10,pm2_5",
            self.base_url, latitude, longitude
        );

        let result = get_json::<AirQualityResponse>(&self.client, &url)
            .await
            .and_then(AirQualityReport::try_from);

        match &result {
            Ok(report) => debug!(
                latitude,
                longitude,
                pm25 = report.sample.pm25,
                "Air quality fetched"
            ),
            Err(e) => warn!(latitude, longitude, error = %e, "Air quality fetch failed"),
        }

        result
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Body of the air-quality endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AirQualityResponse {
    /// Hourly series; absent when the upstream has nothing for the location.
    pub hourly: Option<HourlySeries>,
}

/// Parallel hourly arrays, oldest first.
///
/// A whole series may be absent or `null`, and so may individual hours.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Option<Vec<String>>,

    #[serde(default)]
    pub pm10: Option<Vec<Option<f64>>>,

    #[serde(default)]
    pub pm2_5: Option<Vec<Option<f64>>>,
}

impl HourlySeries {
    /// The last entry of each series as a sample.
    ///
    /// `observed_at` is only filled when the time series has the same length
    /// as the PM10 series.
    pub fn latest_sample(&self) -> Result<AirSample, ClientError> {
        let (Some(pm10_series), Some(pm25_series)) = (&self.pm10, &self.pm2_5) else {
            return Err(ClientError::NoData);
        };
        let (Some(Some(pm10)), Some(Some(pm25))) = (pm10_series.last(), pm25_series.last()) else {
            return Err(ClientError::NoData);
        };

        let observed_at = self
            .time
            .as_ref()
            .filter(|time| time.len() == pm10_series.len())
            .and_then(|time| time.last().cloned());

        Ok(AirSample {
            pm10: *pm10,
            pm25: *pm25,
            observed_at,
        })
    }

    /// All non-null PM2.5 values, oldest first.
    pub fn pm25_series(&self) -> Vec<f64> {
        self.pm2_5.iter().flatten().flatten().copied().collect()
    }
}

/// Decoded result of one air-quality request.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityReport {
    /// Latest reading.
    pub sample: AirSample,

    /// Full non-null PM2.5 series, oldest first.
    pub pm25_series: Vec<f64>,
}

impl TryFrom<AirQualityResponse> for AirQualityReport {
    type Error = ClientError;

    fn try_from(response: AirQualityResponse) -> Result<Self, Self::Error> {
        let hourly = response.hourly.ok_or(ClientError::NoData)?;
        let sample = hourly.latest_sample()?;
        Ok(Self {
            sample,
            pm25_series: hourly.pm25_series(),
        })
    }
}
