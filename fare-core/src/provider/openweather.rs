use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::{error::ServiceError, model::WeatherSnapshot, provider::read_body};

use super::WeatherFetcher;

const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const SERVICE: &str = "openweather";

/// Current weather from OpenWeather, persisted to a local snapshot file.
///
/// The raw response is written to `snapshot_path` and then read back, so the
/// returned document is always what is on disk. Concurrent fetchers sharing a
/// path overwrite each other; give each its own path if that matters.
#[derive(Clone)]
pub struct OpenWeatherFetcher {
    api_key: String,
    base_url: String,
    snapshot_path: PathBuf,
    http: Client,
}

impl OpenWeatherFetcher {
    pub fn new(api_key: String, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            api_key,
            base_url: OPENWEATHER_URL.to_string(),
            snapshot_path: snapshot_path.into(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    async fn persist(&self, body: &str) -> Result<(), ServiceError> {
        tokio::fs::write(&self.snapshot_path, body)
            .await
            .map_err(|source| self.io_error(source))
    }

    async fn read_back(&self) -> Result<WeatherSnapshot, ServiceError> {
        let contents = tokio::fs::read_to_string(&self.snapshot_path)
            .await
            .map_err(|source| self.io_error(source))?;

        serde_json::from_str(&contents)
            .map(WeatherSnapshot)
            .map_err(|e| ServiceError::parse(SERVICE, e))
    }

    fn io_error(&self, source: std::io::Error) -> ServiceError {
        ServiceError::Io {
            path: self.snapshot_path.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for OpenWeatherFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherFetcher")
            .field("base_url", &self.base_url)
            .field("snapshot_path", &self.snapshot_path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherFetcher {
    #[instrument(skip(self), fields(service = SERVICE))]
    async fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, ServiceError> {
        let lat = lat.to_string();
        let lon = lon.to_string();

        let request = self.http.get(&self.base_url).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.as_str()),
        ]);

        let body = read_body(SERVICE, request).await?;

        // Refuse to overwrite the last good snapshot with something that isn't JSON.
        serde_json::from_str::<serde_json::Value>(&body)
            .map_err(|e| ServiceError::parse(SERVICE, e))?;

        self.persist(&body).await?;
        let snapshot = self.read_back().await?;

        tracing::info!(path = %self.snapshot_path.display(), "weather snapshot stored");
        Ok(snapshot)
    }
}
