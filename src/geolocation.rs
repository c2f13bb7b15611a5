//! Single-shot device location.
//!
//! [`GeolocationProvider`] wraps whatever position capability the host has
//! (a [`PositionSource`]) and answers one query at a time with exactly one
//! position or one error. It never streams updates.
//!
//! The provider applies [`PositionOptions`]: a fix taken within
//! `maximum_age` is reused without asking the source again, and a source
//! that takes longer than `timeout` fails with [`GeolocationError::Timeout`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Coordinates;

/// Why a position could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeolocationError {
    /// The host has no location capability.
    #[error("geolocation is not supported on this host")]
    Unsupported,

    /// The user refused to share their location.
    #[error("location permission was denied")]
    PermissionDenied,

    /// No fix arrived within the configured timeout.
    #[error("timed out waiting for a position")]
    Timeout,

    /// Any other failure reported by the source.
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Query options, mirroring the platform geolocation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    /// Ask the source for its most precise (and slowest) fix.
    pub enable_high_accuracy: bool,
    /// Longest time to wait for the source.
    pub timeout: Duration,
    /// Oldest cached fix that may be returned instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

/// A host capability able to report the device position.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Produce one position fix.
    async fn request_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// A source that always reports the same configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn request_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

impl FixedPosition {
    /// Parse `"<lat>,<lon>"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (lat, lon) = raw.split_once(',')?;
        let latitude = lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        let longitude = lon.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self(Coordinates::new(latitude, longitude)))
    }
}

#[derive(Debug, Clone, Copy)]
struct Fix {
    coordinates: Coordinates,
    taken_at: DateTime<Utc>,
}

/// One-shot position queries over an optional host capability.
#[derive(Clone)]
pub struct GeolocationProvider {
    source: Option<Arc<dyn PositionSource>>,
    options: PositionOptions,
    last_fix: Arc<Mutex<Option<Fix>>>,
}

impl GeolocationProvider {
    /// A provider backed by `source` with default options.
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self {
            source: Some(source),
            options: PositionOptions::default(),
            last_fix: Arc::new(Mutex::new(None)),
        }
    }

    /// A provider for a host without any location capability.
    pub fn unsupported() -> Self {
        Self {
            source: None,
            options: PositionOptions::default(),
            last_fix: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the query options.
    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    /// Ask for the current position.
    pub async fn get_current_position(&self) -> Result<Coordinates, GeolocationError> {
        let Some(source) = &self.source else {
            return Err(GeolocationError::Unsupported);
        };

        if let Some(cached) = self.cached_fix() {
            debug!("Reusing cached position fix");
            return Ok(cached);
        }

        let result = match tokio::time::timeout(
            self.options.timeout,
            source.request_position(&self.options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout),
        };

        match &result {
            Ok(coordinates) => self.store_fix(*coordinates),
            Err(e) => warn!(error = %e, "Geolocation failed"),
        }

        result
    }

    fn cached_fix(&self) -> Option<Coordinates> {
        let max_age = chrono::Duration::from_std(self.options.maximum_age).ok()?;
        let guard = self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        (*guard)
            .filter(|fix| Utc::now() - fix.taken_at <= max_age)
            .map(|fix| fix.coordinates)
    }

    fn store_fix(&self, coordinates: Coordinates) {
        let mut guard = self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Fix {
            coordinates,
            taken_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        result: Result<Coordinates, GeolocationError>,
    }

    #[async_trait]
    impl PositionSource for CountingSource {
        async fn request_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct SlowSource;

    #[async_trait]
    impl PositionSource for SlowSource {
        async fn request_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Coordinates::new(0.0, 0.0))
        }
    }

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(!options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::from_secs(60));
    }

    #[test]
    fn test_fixed_position_parse() {
        let fixed = FixedPosition::parse(" 41.99 , 21.42 ").unwrap();
        assert_eq!(fixed.0, Coordinates::new(41.99, 21.42));

        assert!(FixedPosition::parse("41.99").is_none());
        assert!(FixedPosition::parse("here,there").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_host() {
        let provider = GeolocationProvider::unsupported();

        assert!(!provider.is_supported());
        assert_eq!(
            provider.get_current_position().await,
            Err(GeolocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn test_permission_denied_is_distinct() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            result: Err(GeolocationError::PermissionDenied),
        });
        let provider = GeolocationProvider::new(source);

        assert_eq!(
            provider.get_current_position().await,
            Err(GeolocationError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_recent_fix_is_reused() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            result: Ok(Coordinates::new(51.5, -0.12)),
        });
        let provider = GeolocationProvider::new(source.clone());

        let first = provider.get_current_position().await.unwrap();
        let second = provider.get_current_position().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_maximum_age_always_asks_source() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            result: Ok(Coordinates::new(51.5, -0.12)),
        });
        let provider = GeolocationProvider::new(source.clone()).with_options(PositionOptions {
            maximum_age: Duration::ZERO,
            ..PositionOptions::default()
        });

        provider.get_current_position().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        provider.get_current_position().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let provider = GeolocationProvider::new(Arc::new(SlowSource)).with_options(PositionOptions {
            timeout: Duration::from_millis(20),
            ..PositionOptions::default()
        });

        assert_eq!(
            provider.get_current_position().await,
            Err(GeolocationError::Timeout)
        );
    }
}
