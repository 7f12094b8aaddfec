//! The Google Maps geocoding API, which requires an API key
use super::{Error, Geocoder, provider_coordinate};
use crate::record::Coordinate;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, trace};

pub const NAME: &str = "Google";
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl Response {
    fn into_coordinate(self) -> Result<Option<Coordinate>, Error> {
        match self.status.as_str() {
            "OK" => match self.results.first() {
                Some(result) => {
                    let loc = &result.geometry.location;
                    provider_coordinate(loc.lat, loc.lng).map(Some)
                }
                None => Ok(None),
            },
            "ZERO_RESULTS" => Ok(None),
            status => Err(Error::Service(match self.error_message {
                Some(msg) => format!("{status}: {msg}"),
                None => status.to_string(),
            })),
        }
    }
}

impl GoogleGeocoder {
    pub fn new(client: reqwest::Client, api_key: SecretString, endpoint: String) -> Self {
        Self {
            client,
            api_key,
            endpoint,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, address: &str) -> Result<Option<Coordinate>, Error> {
        debug!(address, "Requesting geocode from Google");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.expose_secret())])
            .send()
            .await?
            .error_for_status()?
            .json::<Response>()
            .await?;
        trace!(?response);
        response.into_coordinate()
    }
}
