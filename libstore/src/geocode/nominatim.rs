//! The OpenStreetMap Nominatim search API. No key is needed, but the public instance is slow and
//! rate-limited.
use super::{Error, Geocoder, provider_coordinate};
use crate::record::Coordinate;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

pub const NAME: &str = "Nominatim";
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

// nominatim reports degrees as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn into_coordinate(places: Vec<Place>) -> Result<Option<Coordinate>, Error> {
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| Error::Service(format!("invalid coordinate '{s}': {e}")))
    };
    provider_coordinate(parse(&place.lat)?, parse(&place.lon)?).map(Some)
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, address: &str) -> Result<Option<Coordinate>, Error> {
        debug!(address, "Requesting geocode from Nominatim");
        let places = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Place>>()
            .await?;
        trace!(?places);
        into_coordinate(places)
    }
}
