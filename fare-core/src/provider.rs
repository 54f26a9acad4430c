use crate::{
    Config,
    error::ServiceError,
    model::{Coordinate, Place, RouteEstimate, TravelMode, WeatherSnapshot},
    provider::{
        distance_matrix::DistanceMatrixClient, geoapify::GeoapifyGeocoder,
        openweather::OpenWeatherFetcher,
    },
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use std::fmt::Debug;

pub mod distance_matrix;
pub mod geoapify;
pub mod openweather;

/// The external services this crate talks to, one per concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// Geoapify geocoding.
    Geoapify,
    /// Google distance matrix.
    Google,
    /// OpenWeather current weather.
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Geoapify => "geoapify",
            ProviderId::Google => "google",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// What the provider is used for, for prompts and messages.
    pub fn purpose(&self) -> &'static str {
        match self {
            ProviderId::Geoapify => "geocoding",
            ProviderId::Google => "distance matrix",
            ProviderId::OpenWeather => "weather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Geoapify,
            ProviderId::Google,
            ProviderId::OpenWeather,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "geoapify" => Ok(ProviderId::Geoapify),
            "google" => Ok(ProviderId::Google),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: geoapify, google, openweather."
            )),
        }
    }
}

/// What a geocoding lookup produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Coordinate(Coordinate),
    City(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Coordinates of the best match for `address`.
    async fn coordinate(&self, address: &str) -> Result<Coordinate, ServiceError>;

    /// City of the best match for `address`.
    async fn city(&self, address: &str) -> Result<String, ServiceError>;

    /// Coordinates and city of the best match, from a single lookup.
    async fn locate(&self, address: &str) -> Result<Place, ServiceError>;

    /// Coordinates, or the city name when `want_city_name` is set.
    ///
    /// An address with no match yields [`ServiceError::NoMatch`].
    async fn resolve(&self, address: &str, want_city_name: bool) -> Result<Resolved, ServiceError> {
        if want_city_name {
            self.city(address).await.map(Resolved::City)
        } else {
            self.coordinate(address).await.map(Resolved::Coordinate)
        }
    }
}

#[async_trait]
pub trait RouteEstimator: Send + Sync + Debug {
    async fn estimate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<RouteEstimate, ServiceError>;
}

#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, ServiceError>;
}

fn api_key_for(id: ProviderId, config: &Config) -> anyhow::Result<String> {
    if !config.is_provider_configured(id) {
        return Err(anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `fare configure {id}` and enter your API key."
        ));
    }

    Ok(config.provider_api_key(id).unwrap_or_default().to_owned())
}

fn base_url_for(id: ProviderId, config: &Config) -> Option<String> {
    config.provider_config(id).and_then(|cfg| cfg.base_url.clone())
}

/// Construct the Geoapify geocoder from config.
pub fn geocoder_from_config(config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    let id = ProviderId::Geoapify;
    let mut geocoder = GeoapifyGeocoder::new(api_key_for(id, config)?);
    if let Some(url) = base_url_for(id, config) {
        geocoder = geocoder.with_base_url(url);
    }
    Ok(Box::new(geocoder))
}

/// Construct the Google distance-matrix client from config.
pub fn route_estimator_from_config(config: &Config) -> anyhow::Result<Box<dyn RouteEstimator>> {
    let id = ProviderId::Google;
    let mut client = DistanceMatrixClient::new(api_key_for(id, config)?);
    if let Some(url) = base_url_for(id, config) {
        client = client.with_base_url(url);
    }
    Ok(Box::new(client))
}

/// Construct the OpenWeather fetcher from config, writing to the configured snapshot file.
pub fn weather_fetcher_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherFetcher>> {
    let id = ProviderId::OpenWeather;
    let mut fetcher = OpenWeatherFetcher::new(api_key_for(id, config)?, config.weather_file());
    if let Some(url) = base_url_for(id, config) {
        fetcher = fetcher.with_base_url(url);
    }
    Ok(Box::new(fetcher))
}

/// Send `request` and return the body of a successful response.
pub(crate) async fn read_body(
    service: &'static str,
    request: RequestBuilder,
) -> Result<String, ServiceError> {
    let res = request
        .send()
        .await
        .map_err(|source| ServiceError::Transport { service, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ServiceError::Transport { service, source })?;

    if !status.is_success() {
        tracing::warn!(service, %status, "non-success response");
        return Err(ServiceError::Status {
            service,
            status,
            body: truncate_body(&body),
        });
    }

    tracing::debug!(service, %status, bytes = body.len(), "response received");
    Ok(body)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ProviderConfig};

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("OpenWeather").unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn constructors_error_when_missing_api_key() {
        let cfg = Config::default();

        let err = geocoder_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider 'geoapify'"));
        assert!(err.to_string().contains("Hint: run `fare configure geoapify`"));

        let err = route_estimator_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("'google'"));

        let err = weather_fetcher_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("'openweather'"));
    }

    #[test]
    fn constructors_work_when_configured() {
        let mut cfg = Config::default();
        for id in ProviderId::all() {
            cfg.upsert_provider_api_key(*id, "KEY".to_string());
        }
        cfg.providers.insert(
            "google".into(),
            ProviderConfig {
                api_key: "KEY".into(),
                base_url: Some("http://127.0.0.1:1/matrix".into()),
            },
        );

        assert!(geocoder_from_config(&cfg).is_ok());
        assert!(route_estimator_from_config(&cfg).is_ok());
        assert!(weather_fetcher_from_config(&cfg).is_ok());
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "台".repeat(250);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
