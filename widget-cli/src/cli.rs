use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_widget_core::{
    CityMatch, Config, Document, WeatherApi, WeatherReading, WeatherWidgetFactory, WidgetMounter,
    client_from_config, install,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Weather widget host")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Look a city up by name.
    City {
        /// Free-text city name, e.g. "Paris" or "Springfield, US".
        query: String,
    },

    /// Show current weather for a city or a coordinate.
    Weather {
        /// City name; omit when passing --lat/--lon.
        #[arg(required_unless_present = "lat", conflicts_with = "lat")]
        query: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Print the raw response body instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Find the place name for a coordinate.
    Reverse {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Mount widgets on every <weather-widget> in an HTML page and render them.
    Mount {
        /// Path to the HTML page.
        page: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::City { query } => {
                let client = client_from_config(&Config::load()?)?;
                match client.find_city(&query).await? {
                    Some(city) => println!("{city}"),
                    None => println!("No city found for '{query}'."),
                }
                Ok(())
            }
            Command::Weather {
                query,
                lat,
                lon,
                json,
            } => {
                let client = client_from_config(&Config::load()?)?;

                let (place, reading) = match (query, lat, lon) {
                    (Some(query), _, _) => match client.find_city(&query).await? {
                        Some(city) => {
                            let reading = client.get_weather(city.lat, city.lon).await?;
                            (Some(city), reading)
                        }
                        None => {
                            println!("No city found for '{query}'.");
                            return Ok(());
                        }
                    },
                    (None, Some(lat), Some(lon)) => (None, client.get_weather(lat, lon).await?),
                    _ => anyhow::bail!("Pass a city name or both --lat and --lon."),
                };

                if json {
                    let body = serde_json::to_string_pretty(reading.raw())
                        .context("Failed to format weather JSON")?;
                    println!("{body}");
                } else {
                    print_reading(place.as_ref(), &reading);
                }
                Ok(())
            }
            Command::Reverse { lat, lon } => {
                let client = client_from_config(&Config::load()?)?;
                match client.reverse_geocode(lat, lon).await? {
                    Some(place) => println!("{place}"),
                    None => println!("No place found near ({lat}, {lon})."),
                }
                Ok(())
            }
            Command::Mount { page } => mount_page(&page).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    cfg.set_api_key(api_key);
    cfg.api_key()?;
    cfg.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn mount_page(page: &Path) -> Result<()> {
    let html = fs::read_to_string(page)
        .with_context(|| format!("Failed to read page: {}", page.display()))?;

    let api: Arc<dyn WeatherApi> = Arc::new(client_from_config(&Config::load()?)?);
    let mut doc = Document::parse_html(&html);
    let mounter = Rc::new(RefCell::new(WidgetMounter::new(WeatherWidgetFactory::new(api))));

    install(Rc::clone(&mounter), &mut doc);
    doc.finish_loading();

    let mut widgets = mounter.borrow_mut().take_instances();
    if widgets.is_empty() {
        println!("No unmounted <weather-widget> elements in {}.", page.display());
        return Ok(());
    }

    for (idx, widget) in widgets.iter_mut().enumerate() {
        // A failing widget is rendered with its error; the others still load.
        if let Err(err) = widget.refresh().await {
            tracing::warn!(widget = idx, error = %err, "Widget failed to load");
        }
        widget.render_into(&mut doc);

        let content = doc
            .element(widget.host())
            .map(|el| el.content().to_string())
            .unwrap_or_default();
        println!("#{} {content}", idx + 1);
    }

    Ok(())
}

fn print_reading(place: Option<&CityMatch>, reading: &WeatherReading) {
    let title = place
        .map(CityMatch::display_name)
        .or_else(|| reading.location_name().map(str::to_string))
        .unwrap_or_else(|| "Unknown location".to_string());
    println!("{title}");

    // Error payloads (bad key, unknown coordinate) come back as the reading.
    if reading.temperature_c().is_none()
        && let Some(message) = reading.raw().get("message").and_then(|m| m.as_str())
    {
        println!("  Service said: {message}");
    }

    if let Some(temp) = reading.temperature_c() {
        match reading.feels_like_c() {
            Some(feels) => println!("  Temperature: {temp:.1} °C (feels like {feels:.1} °C)"),
            None => println!("  Temperature: {temp:.1} °C"),
        }
    }
    if let Some(condition) = reading.condition() {
        println!("  Conditions:  {condition}");
    }
    if let Some(humidity) = reading.humidity_pct() {
        println!("  Humidity:    {humidity}%");
    }
    if let Some(wind) = reading.wind_speed_mps() {
        println!("  Wind:        {wind:.1} m/s");
    }
    if let Some(observed) = reading.observed_at() {
        println!(
            "  Observed:    {}",
            observed.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
}
