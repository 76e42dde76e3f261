use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::ApiError,
    model::{CityMatch, GeoPlace, WeatherReading},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const DIRECT_GEOCODING_PATH: &str = "/geo/1.0/direct";
const REVERSE_GEOCODING_PATH: &str = "/geo/1.0/reverse";
const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// The three lookups a widget needs. Every call is a single request with no
/// caching or retry; failures propagate to the caller.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// Forward geocoding. `Ok(None)` when the service knows no such place.
    async fn find_city(&self, query: &str) -> Result<Option<CityMatch>, ApiError>;

    /// Current conditions in metric units, returned as the unmodified body.
    async fn get_weather(&self, lat: f64, lon: f64) -> Result<WeatherReading, ApiError>;

    /// Reverse geocoding. `Ok(None)` when nothing is near the coordinate.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<GeoPlace>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another host, e.g. a proxy or a mock server.
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One GET against the service. The body is parsed whatever the HTTP
    /// status; only transport failures and non-JSON bodies are errors.
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?params, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        tracing::debug!(%status, bytes = body.len(), "OpenWeather response");

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn find_city(&self, query: &str) -> Result<Option<CityMatch>, ApiError> {
        let body = self
            .fetch(
                DIRECT_GEOCODING_PATH,
                &[("q", query.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        first_entry(body)
    }

    async fn get_weather(&self, lat: f64, lon: f64) -> Result<WeatherReading, ApiError> {
        let body = self
            .fetch(
                CURRENT_WEATHER_PATH,
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("units", "metric".to_string()),
                ],
            )
            .await?;

        Ok(WeatherReading::new(body))
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<GeoPlace>, ApiError> {
        let body = self
            .fetch(
                REVERSE_GEOCODING_PATH,
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        first_entry(body)
    }
}

/// First element of a geocoding array. Anything else the service may send
/// back (an empty array, an error object such as `{"cod":401}`) is no match.
fn first_entry<T: DeserializeOwned>(body: Value) -> Result<Option<T>, ApiError> {
    let Value::Array(entries) = body else {
        return Ok(None);
    };

    match entries.into_iter().next() {
        Some(Value::Null) | None => Ok(None),
        Some(entry) => Ok(Some(serde_json::from_value(entry)?)),
    }
}
