use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt};

/// One forward-geocoding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_names: Option<HashMap<String, String>>,
}

/// Reverse-geocoding result; the endpoint returns the same shape as a city search.
pub type GeoPlace = CityMatch;

impl CityMatch {
    pub fn display_name(&self) -> String {
        let mut out = self.name.clone();
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(", ");
            out.push_str(state);
        }
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(", ");
            out.push_str(country);
        }
        out
    }
}

impl fmt::Display for CityMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.display_name(), self.lat, self.lon)
    }
}

/// Current conditions as returned by the weather endpoint.
///
/// The body is kept exactly as received. The accessors only peek at the
/// well-known OpenWeather fields and return `None` when a field is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherReading(Value);

impl WeatherReading {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// Temperature in degrees Celsius (requests are made in metric units).
    pub fn temperature_c(&self) -> Option<f64> {
        self.0.pointer("/main/temp").and_then(Value::as_f64)
    }

    pub fn feels_like_c(&self) -> Option<f64> {
        self.0.pointer("/main/feels_like").and_then(Value::as_f64)
    }

    pub fn humidity_pct(&self) -> Option<u8> {
        self.0
            .pointer("/main/humidity")
            .and_then(Value::as_u64)
            .and_then(|h| u8::try_from(h).ok())
    }

    pub fn wind_speed_mps(&self) -> Option<f64> {
        self.0.pointer("/wind/speed").and_then(Value::as_f64)
    }

    pub fn condition(&self) -> Option<&str> {
        self.0.pointer("/weather/0/description").and_then(Value::as_str)
    }

    pub fn location_name(&self) -> Option<&str> {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.0
            .get("dt")
            .and_then(Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

impl From<Value> for WeatherReading {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}
