//! Core library for the embeddable weather widget.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client (city search, current weather, reverse geocoding)
//! - A small document model and the widget mounter that attaches components
//!   to `<weather-widget>` placeholders
//! - The weather widget component itself
//!
//! It is used by `weather-widget-cli`, but can also be embedded by other hosts.

pub mod client;
pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod mount;
pub mod widget;

pub use client::{OpenWeatherClient, WeatherApi};
pub use config::{Config, client_from_config};
pub use dom::{Document, Element, ElementId, ReadyState};
pub use error::ApiError;
pub use model::{CityMatch, GeoPlace, WeatherReading};
pub use mount::{WIDGET_TAG, WidgetFactory, WidgetMounter, install};
pub use widget::{InitialQuery, WeatherWidget, WeatherWidgetFactory, WidgetState};
