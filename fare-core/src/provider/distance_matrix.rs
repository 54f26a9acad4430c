use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    error::ServiceError,
    model::{Coordinate, RouteEstimate, TravelMode},
    provider::read_body,
};

use super::RouteEstimator;

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
const SERVICE: &str = "google";

/// Single-pair lookups against the Google Distance Matrix API.
#[derive(Clone)]
pub struct DistanceMatrixClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl DistanceMatrixClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DISTANCE_MATRIX_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for DistanceMatrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrixClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct DmResponse {
    status: Option<String>,
    #[serde(default)]
    rows: Vec<DmRow>,
}

#[derive(Debug, Deserialize)]
struct DmRow {
    #[serde(default)]
    elements: Vec<DmElement>,
}

#[derive(Debug, Deserialize)]
struct DmElement {
    status: Option<String>,
    distance: Option<DmValue>,
    duration: Option<DmValue>,
}

#[derive(Debug, Deserialize)]
struct DmValue {
    value: f64,
}

fn check_status(status: Option<&str>) -> Result<(), ServiceError> {
    match status {
        None | Some("OK") => Ok(()),
        Some(other) => Err(ServiceError::Rejected {
            service: SERVICE,
            status: other.to_string(),
        }),
    }
}

/// Reads `rows[0].elements[0]`, converting meters to kilometers.
fn parse_route(body: &str) -> Result<RouteEstimate, ServiceError> {
    let parsed: DmResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::parse(SERVICE, e))?;
    check_status(parsed.status.as_deref())?;

    let element = parsed
        .rows
        .first()
        .and_then(|row| row.elements.first())
        .ok_or_else(|| ServiceError::missing(SERVICE, "rows[0].elements[0]"))?;
    check_status(element.status.as_deref())?;

    let distance = element
        .distance
        .as_ref()
        .ok_or_else(|| ServiceError::missing(SERVICE, "rows[0].elements[0].distance.value"))?;
    let duration = element
        .duration
        .as_ref()
        .ok_or_else(|| ServiceError::missing(SERVICE, "rows[0].elements[0].duration.value"))?;

    Ok(RouteEstimate {
        distance_km: distance.value * 0.001,
        duration_secs: duration.value,
    })
}

#[async_trait]
impl RouteEstimator for DistanceMatrixClient {
    #[instrument(skip(self), fields(service = SERVICE))]
    async fn estimate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<RouteEstimate, ServiceError> {
        let origins = origin.to_lat_lon();
        let destinations = destination.to_lat_lon();

        let request = self.http.get(&self.base_url).query(&[
            ("origins", origins.as_str()),
            ("destinations", destinations.as_str()),
            ("mode", mode.as_str()),
            ("key", self.api_key.as_str()),
        ]);

        let body = read_body(SERVICE, request).await?;
        let route = parse_route(&body)?;

        tracing::info!(
            distance_km = route.distance_km,
            duration_secs = route.duration_secs,
            "route estimated"
        );
        Ok(route)
    }
}
