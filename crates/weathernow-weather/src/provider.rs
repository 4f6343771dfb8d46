use reqwest::Client;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use weathernow_core::http::{build_client, decode_json, join_path, parse_base_url};
use weathernow_core::{BackendConfig, FetchError, ReqwestErrorExt, WeatherConfig};

use crate::types::{WeatherPayload, WeatherSnapshot};

/// Weather fetch adapter over the backend's `getWeather` endpoint.
///
/// One request per call: no retry, no caching between calls.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: Url,
    hourly_limit: usize,
}

impl WeatherProvider {
    pub fn new(backend: &BackendConfig, weather: &WeatherConfig) -> Result<Self, FetchError> {
        let client = build_client(backend.request_timeout())?;

        Ok(Self {
            client: Arc::new(client),
            base_url: parse_base_url(&backend.base_url)?,
            hourly_limit: weather.hourly_limit,
        })
    }

    /// Fetch current, hourly, daily, and alert data for a coordinate pair.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, lat_coords: f64, long_coords: f64) -> Result<WeatherSnapshot, FetchError> {
        let lat = lat_coords.to_string();
        let lon = long_coords.to_string();
        let url = join_path(&self.base_url, &["search", "getWeather", &lat, &lon]);

        tracing::debug!("Weather data request for {}, {}", lat, lon);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.into_fetch_error())?;

        let payload: WeatherPayload = decode_json(response).await.map_err(|e| {
            tracing::warn!("Error retrieving weather data for {}, {}: {}", lat, lon, e);
            e
        })?;

        Ok(WeatherSnapshot::from_payload(payload, self.hourly_limit))
    }
}
