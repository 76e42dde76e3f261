//! The weather widget component mounted on each placeholder.

use std::{fmt::Write as _, sync::Arc};

use crate::{
    client::WeatherApi,
    dom::{Document, ElementId},
    error::ApiError,
    model::{CityMatch, WeatherReading},
    mount::WidgetFactory,
};

/// What the host element asked for through its `data-*` attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialQuery {
    City(String),
    Coords { lat: f64, lon: f64 },
}

impl InitialQuery {
    /// `data-city` wins over `data-lat`/`data-lon`; unparsable coordinates are ignored.
    pub fn from_host(doc: &Document, host: ElementId) -> Option<Self> {
        if let Some(city) = doc.data(host, "city").map(str::trim).filter(|c| !c.is_empty()) {
            return Some(Self::City(city.to_string()));
        }

        let lat = doc.data(host, "lat")?.trim().parse().ok()?;
        let lon = doc.data(host, "lon")?.trim().parse().ok()?;
        Some(Self::Coords { lat, lon })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Idle,
    NotFound { query: String },
    Loaded {
        place: Option<CityMatch>,
        reading: WeatherReading,
    },
    Failed(String),
}

#[derive(Debug)]
pub struct WeatherWidget {
    host: ElementId,
    api: Arc<dyn WeatherApi>,
    initial: Option<InitialQuery>,
    state: WidgetState,
}

impl WeatherWidget {
    pub fn new(api: Arc<dyn WeatherApi>, host: ElementId) -> Self {
        Self {
            host,
            api,
            initial: None,
            state: WidgetState::Idle,
        }
    }

    pub fn with_initial(mut self, initial: Option<InitialQuery>) -> Self {
        self.initial = initial;
        self
    }

    pub fn host(&self) -> ElementId {
        self.host
    }

    pub fn initial(&self) -> Option<&InitialQuery> {
        self.initial.as_ref()
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Look a city up by name and load its current weather.
    pub async fn search(&mut self, query: &str) -> Result<(), ApiError> {
        let result = self.lookup_city(query).await;
        self.settle(result)
    }

    async fn lookup_city(&self, query: &str) -> Result<WidgetState, ApiError> {
        let Some(city) = self.api.find_city(query).await? else {
            return Ok(WidgetState::NotFound {
                query: query.to_string(),
            });
        };

        let reading = self.api.get_weather(city.lat, city.lon).await?;
        Ok(WidgetState::Loaded {
            place: Some(city),
            reading,
        })
    }

    /// Load weather for a coordinate, resolving its place name alongside.
    pub async fn locate(&mut self, lat: f64, lon: f64) -> Result<(), ApiError> {
        let result = tokio::try_join!(
            self.api.reverse_geocode(lat, lon),
            self.api.get_weather(lat, lon)
        )
        .map(|(place, reading)| WidgetState::Loaded { place, reading });

        self.settle(result)
    }

    /// Re-run the query the host element asked for. Does nothing without one.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        match self.initial.clone() {
            Some(InitialQuery::City(city)) => self.search(&city).await,
            Some(InitialQuery::Coords { lat, lon }) => self.locate(lat, lon).await,
            None => Ok(()),
        }
    }

    fn settle(&mut self, result: Result<WidgetState, ApiError>) -> Result<(), ApiError> {
        match result {
            Ok(state) => {
                self.state = state;
                Ok(())
            }
            Err(err) => {
                self.state = WidgetState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<div class=\"weather-widget\">");

        match &self.state {
            WidgetState::Idle => out.push_str("<p class=\"hint\">Search for a city</p>"),
            WidgetState::NotFound { query } => {
                let _ = write!(
                    out,
                    "<p class=\"not-found\">No city found for \u{201c}{}\u{201d}</p>",
                    escape_html(query)
                );
            }
            WidgetState::Failed(msg) => {
                let _ = write!(out, "<p class=\"error\">{}</p>", escape_html(msg));
            }
            WidgetState::Loaded { place, reading } => {
                let title = place
                    .as_ref()
                    .map(CityMatch::display_name)
                    .or_else(|| reading.location_name().map(str::to_string))
                    .unwrap_or_else(|| "Unknown location".to_string());
                let _ = write!(out, "<h2>{}</h2>", escape_html(&title));

                if let Some(temp) = reading.temperature_c() {
                    let _ = write!(out, "<p class=\"temp\">{temp:.1} \u{b0}C</p>");
                }
                if let Some(condition) = reading.condition() {
                    let _ = write!(out, "<p class=\"condition\">{}</p>", escape_html(condition));
                }
                if let Some(humidity) = reading.humidity_pct() {
                    let _ = write!(out, "<p class=\"humidity\">Humidity {humidity}%</p>");
                }
                if let Some(wind) = reading.wind_speed_mps() {
                    let _ = write!(out, "<p class=\"wind\">Wind {wind:.1} m/s</p>");
                }
            }
        }

        out.push_str("</div>");
        out
    }

    pub fn render_into(&self, doc: &mut Document) {
        if let Some(el) = doc.element_mut(self.host) {
            el.set_content(self.render());
        }
    }
}

/// Builds a [`WeatherWidget`] for each host, sharing one API client.
#[derive(Debug, Clone)]
pub struct WeatherWidgetFactory {
    api: Arc<dyn WeatherApi>,
}

impl WeatherWidgetFactory {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }
}

impl WidgetFactory for WeatherWidgetFactory {
    type Widget = WeatherWidget;

    fn create(&self, doc: &Document, host: ElementId) -> WeatherWidget {
        WeatherWidget::new(Arc::clone(&self.api), host)
            .with_initial(InitialQuery::from_host(doc, host))
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
