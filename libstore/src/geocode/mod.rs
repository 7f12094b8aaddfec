//! Resolving postal addresses to coordinates through a remote geocoding service
use crate::record::Coordinate;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Duration;
use tracing::info;

pub mod google;
pub mod nominatim;

pub use google::GoogleGeocoder;
pub use nominatim::NominatimGeocoder;

/// Failures reported by a geocoding provider. Neither is fatal for an enrichment pass.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("the geocoding service did not respond in time")]
    Timeout,

    #[error("the geocoding service returned an error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            // the request url carries the api key
            Self::Service(value.without_url().to_string())
        }
    }
}

/// Something that can turn an address into a coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// A short human-readable name of the provider
    fn name(&self) -> &str;

    /// Look up `address`. `Ok(None)` means the provider knows no such place.
    async fn resolve(&self, address: &str) -> Result<Option<Coordinate>, Error>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn resolve(&self, address: &str) -> Result<Option<Coordinate>, Error> {
        (**self).resolve(address).await
    }
}

/// Settings shared by all providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Upper bound for a single HTTP request
    pub timeout: Duration,
    /// Sent as `User-Agent`; the public Nominatim instance refuses anonymous clients
    pub user_agent: String,
    pub google_endpoint: String,
    pub nominatim_endpoint: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("storemap/", env!("CARGO_PKG_VERSION")).to_string(),
            google_endpoint: google::DEFAULT_ENDPOINT.to_string(),
            nominatim_endpoint: nominatim::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

fn http_client(settings: &ProviderSettings) -> crate::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()?)
}

/// Pick a provider once, based on whether an API key is available.
///
/// With a key the authenticated Google service is used, otherwise the free Nominatim service.
pub fn from_credential(
    api_key: Option<SecretString>,
    settings: &ProviderSettings,
) -> crate::Result<Box<dyn Geocoder>> {
    let client = http_client(settings)?;
    match api_key {
        Some(key) => {
            info!("Using Google geocoding service");
            Ok(Box::new(GoogleGeocoder::new(
                client,
                key,
                settings.google_endpoint.clone(),
            )))
        }
        None => {
            info!("Using Nominatim geocoding service");
            Ok(Box::new(NominatimGeocoder::new(
                client,
                settings.nominatim_endpoint.clone(),
            )))
        }
    }
}

/// Turn a pair of degrees reported by a provider into a [Coordinate]
pub(crate) fn provider_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, Error> {
    Coordinate::try_new(latitude, longitude).map_err(|e| Error::Service(e.to_string()))
}
