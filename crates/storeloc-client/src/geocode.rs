//! Forward geocoding.
//!
//! Providers implement [`GeocodingProvider`]; the engine only ever talks to
//! the [`Geocoder`] adapter, which turns every failure into "no coordinates"
//! and never calls an unavailable provider.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use storeloc_core::LatLng;

use crate::error::GeocodeError;

/// A forward geocoding capability.
pub trait GeocodingProvider: Send + Sync + 'static {
    /// Whether the provider can be called at all in this runtime.
    fn is_available(&self) -> bool;

    /// Resolve `address` to a point.
    ///
    /// `Ok(None)` means the service answered but found no match.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<LatLng>, GeocodeError>> + Send;
}

/// Provider used when no geocoding service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeocoder;

impl GeocodingProvider for NoopGeocoder {
    fn is_available(&self) -> bool {
        false
    }

    async fn geocode(&self, _address: &str) -> Result<Option<LatLng>, GeocodeError> {
        Ok(None)
    }
}

/// An optional provider: `None` behaves like [`NoopGeocoder`].
impl<P: GeocodingProvider> GeocodingProvider for Option<P> {
    fn is_available(&self) -> bool {
        self.as_ref().is_some_and(|p| p.is_available())
    }

    async fn geocode(&self, address: &str) -> Result<Option<LatLng>, GeocodeError> {
        match self {
            Some(provider) => provider.geocode(address).await,
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP provider (Google Geocoding JSON shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

/// Geocoder for services speaking the Google Geocoding JSON format:
/// `GET {endpoint}?address=..&key=..` returning `{status, results}`.
pub struct HttpGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`GeocodeError::InvalidEndpoint`] for a malformed URL.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let endpoint = Url::parse(endpoint).map_err(|e| GeocodeError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_owned(),
        })
    }

    fn build_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);
        url
    }

    /// Maps a decoded response onto the provider contract.
    fn interpret(response: GeocodeResponse) -> Result<Option<LatLng>, GeocodeError> {
        match response.status.as_str() {
            "OK" => Ok(response.results.first().map(|r| r.geometry.location)),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(GeocodeError::Service {
                message: response
                    .error_message
                    .unwrap_or_else(|| "no error message".to_string()),
                status: response.status,
            }),
        }
    }
}

impl GeocodingProvider for HttpGeocoder {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn geocode(&self, address: &str) -> Result<Option<LatLng>, GeocodeError> {
        let url = self.build_url(address);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let decoded: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: format!("geocode({address})"),
                source: e,
            })?;
        Self::interpret(decoded)
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Failure-tolerant front for a [`GeocodingProvider`].
///
/// Successful lookups are memoized per trimmed address; misses and errors are
/// not, so a later call tries again.
pub struct Geocoder<P> {
    provider: P,
    memo: Mutex<HashMap<String, LatLng>>,
}

impl<P: GeocodingProvider> Geocoder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve `address`, or `None` when it is blank, the provider is
    /// unavailable, nothing matched, or the call failed.
    pub async fn geocode(&self, address: &str) -> Option<LatLng> {
        let address = address.trim();
        if address.is_empty() || !self.provider.is_available() {
            return None;
        }
        if let Some(hit) = self.cached(address) {
            return Some(hit);
        }

        match self.provider.geocode(address).await {
            Ok(Some(point)) => {
                if let Ok(mut memo) = self.memo.lock() {
                    memo.insert(address.to_string(), point);
                }
                Some(point)
            }
            Ok(None) => {
                tracing::debug!(address, "geocoder found no match");
                None
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "geocoding failed; continuing without coordinates");
                None
            }
        }
    }

    fn cached(&self, address: &str) -> Option<LatLng> {
        self.memo.lock().ok()?.get(address).copied()
    }
}

impl Default for Geocoder<NoopGeocoder> {
    fn default() -> Self {
        Self::new(NoopGeocoder)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Counts calls; resolves addresses containing "ok", errors on "boom".
    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicU32,
    }

    impl GeocodingProvider for CountingProvider {
        fn is_available(&self) -> bool {
            true
        }

        async fn geocode(&self, address: &str) -> Result<Option<LatLng>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if address.contains("boom") {
                return Err(GeocodeError::Service {
                    status: "REQUEST_DENIED".to_string(),
                    message: "key not provisioned".to_string(),
                });
            }
            Ok(address.contains("ok").then_some(LatLng::new(19.0, 72.8)))
        }
    }

    #[tokio::test]
    async fn blank_address_skips_provider() {
        let geocoder = Geocoder::new(CountingProvider::default());
        assert!(geocoder.geocode("   ").await.is_none());
        assert_eq!(geocoder.provider().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_provider_is_never_called() {
        let geocoder = Geocoder::new(None::<CountingProvider>);
        assert!(!geocoder.is_available());
        assert!(geocoder.geocode("ok street").await.is_none());
        assert!(Geocoder::default().geocode("ok street").await.is_none());
    }

    #[tokio::test]
    async fn errors_become_none() {
        let geocoder = Geocoder::new(CountingProvider::default());
        assert!(geocoder.geocode("boom road").await.is_none());
        assert!(geocoder.geocode("nowhere").await.is_none());
    }

    #[tokio::test]
    async fn successes_are_memoized_failures_are_not() {
        let geocoder = Geocoder::new(CountingProvider::default());
        assert!(geocoder.geocode("ok street").await.is_some());
        assert!(geocoder.geocode(" ok street ").await.is_some());
        assert_eq!(geocoder.provider().calls.load(Ordering::SeqCst), 1);

        geocoder.geocode("nowhere").await;
        geocoder.geocode("nowhere").await;
        assert_eq!(geocoder.provider().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn interpret_maps_statuses() {
        let ok = GeocodeResponse {
            status: "OK".to_string(),
            results: vec![GeocodeResult {
                geometry: Geometry {
                    location: LatLng::new(18.52, 73.85),
                },
            }],
            error_message: None,
        };
        assert_eq!(
            HttpGeocoder::interpret(ok).unwrap(),
            Some(LatLng::new(18.52, 73.85))
        );

        let zero = GeocodeResponse {
            status: "ZERO_RESULTS".to_string(),
            results: vec![],
            error_message: None,
        };
        assert_eq!(HttpGeocoder::interpret(zero).unwrap(), None);

        let denied = GeocodeResponse {
            status: "REQUEST_DENIED".to_string(),
            results: vec![],
            error_message: Some("API key invalid".to_string()),
        };
        let err = HttpGeocoder::interpret(denied).unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[test]
    fn build_url_encodes_address_and_key() {
        let geocoder = HttpGeocoder::new(
            "https://geo.example.com/json",
            "k3y",
            5,
            "storeloc-test/0.1",
        )
        .expect("valid geocoder");
        let url = geocoder.build_url("12 Hill Rd, Mumbai");
        assert!(url.as_str().starts_with("https://geo.example.com/json?address=12+Hill+Rd%2C+Mumbai"));
        assert!(url.as_str().ends_with("&key=k3y"));
    }
}
