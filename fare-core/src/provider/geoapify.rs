use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::ServiceError,
    model::{Coordinate, Place},
    provider::read_body,
};

use super::Geocoder;

const GEOAPIFY_URL: &str = "https://api.geoapify.com/v1/geocode/search";
const SERVICE: &str = "geoapify";

/// Forward geocoding through the Geoapify search endpoint.
#[derive(Clone)]
pub struct GeoapifyGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeoapifyGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: GEOAPIFY_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn first_feature(&self, address: &str) -> Result<GeoFeature, ServiceError> {
        let request = self
            .http
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .query(&[("text", address), ("apiKey", self.api_key.as_str())]);

        let body = read_body(SERVICE, request).await?;
        first_feature(&body, address)
    }
}

impl std::fmt::Debug for GeoapifyGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoapifyGeocoder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    geometry: Option<GeoGeometry>,
    properties: Option<GeoProperties>,
}

#[derive(Debug, Deserialize)]
struct GeoGeometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct GeoProperties {
    city: Option<String>,
}

/// An absent or empty `features` array is a miss, not a parse failure.
fn first_feature(body: &str, address: &str) -> Result<GeoFeature, ServiceError> {
    let parsed: GeoResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::parse(SERVICE, e))?;

    parsed
        .features
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::NoMatch {
            address: address.to_string(),
        })
}

impl GeoFeature {
    fn coordinate(&self) -> Result<Coordinate, ServiceError> {
        match self.geometry.as_ref().map(|g| g.coordinates.as_slice()) {
            Some([lon, lat, ..]) => Ok(Coordinate::new(*lon, *lat)),
            _ => Err(ServiceError::missing(
                SERVICE,
                "features[0].geometry.coordinates",
            )),
        }
    }

    fn into_place(self) -> Result<Place, ServiceError> {
        Ok(Place {
            coordinate: self.coordinate()?,
            city: self.properties.and_then(|p| p.city),
        })
    }

    fn into_city(self) -> Result<String, ServiceError> {
        self.properties
            .and_then(|p| p.city)
            .ok_or_else(|| ServiceError::missing(SERVICE, "features[0].properties.city"))
    }
}

#[async_trait]
impl Geocoder for GeoapifyGeocoder {
    #[instrument(skip(self), fields(service = SERVICE))]
    async fn coordinate(&self, address: &str) -> Result<Coordinate, ServiceError> {
        let coordinate = self.first_feature(address).await?.coordinate()?;
        tracing::info!(%coordinate, "address resolved");
        Ok(coordinate)
    }

    #[instrument(skip(self), fields(service = SERVICE))]
    async fn city(&self, address: &str) -> Result<String, ServiceError> {
        let city = self.first_feature(address).await?.into_city()?;
        tracing::info!(%city, "address resolved to city");
        Ok(city)
    }

    #[instrument(skip(self), fields(service = SERVICE))]
    async fn locate(&self, address: &str) -> Result<Place, ServiceError> {
        let place = self.first_feature(address).await?.into_place()?;
        tracing::info!(coordinate = %place.coordinate, city = ?place.city, "address located");
        Ok(place)
    }
}
