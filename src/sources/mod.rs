//! Weather source adapters
//!
//! Every external provider is represented by one [`WeatherSource`]. Adapters own
//! the provider-specific request flow and normalize responses into
//! [`ForecastPoint`]s; the orchestrator treats all of them alike.
//!
//! - Open-Meteo: one request per named model, points tagged `openmeteo_<model>`
//! - Weather.gov: grid point resolution followed by the hourly forecast
//! - Placeholders: registered providers without credentials

pub mod error;
pub mod factory;
pub mod http;
pub mod open_meteo;
pub mod placeholder;
pub mod weather_gov;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::ForecastPoint;

pub use error::SourceError;
pub use factory::create_source;
pub use http::HttpSettings;
pub use open_meteo::OpenMeteoSource;
pub use placeholder::UnimplementedSource;
pub use weather_gov::WeatherGovSource;

/// Names accepted in `sources.enabled`
pub const KNOWN_SOURCES: [&str; 5] = [
    OpenMeteoSource::NAME,
    WeatherGovSource::NAME,
    placeholder::WEATHERAPI,
    placeholder::OPENWEATHERMAP,
    placeholder::METEOMATICS_FREE,
];

/// Nominal refresh interval for sources that do not declare one
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Capability set every provider adapter implements
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Unique source name, used as the key of the per-source map
    fn name(&self) -> &str;

    /// Advisory refresh interval, reported in status only
    fn refresh_interval(&self) -> Duration {
        DEFAULT_REFRESH_INTERVAL
    }

    /// Fetch and normalize the forecast for a location, ordered as the provider reports it
    async fn fetch(&self, latitude: f64, longitude: f64)
    -> Result<Vec<ForecastPoint>, SourceError>;
}

/// Parse a provider timestamp into UTC
///
/// Values carrying an offset are converted; offset-less values are taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.with_timezone(&Utc));
    }

    let naive = value.strip_suffix('Z').unwrap_or(value);
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|dt| dt.and_utc())
}
