//! Adapter construction from configured source names

use std::sync::Arc;

use crate::config::SourcesConfig;
use crate::sources::open_meteo::OpenMeteoSource;
use crate::sources::placeholder::{self, UnimplementedSource};
use crate::sources::weather_gov::WeatherGovSource;
use crate::sources::{HttpSettings, KNOWN_SOURCES, WeatherSource};
use crate::{OneWeatherError, Result};

/// Build the adapter registered under `name`
pub fn create_source(name: &str, config: &SourcesConfig) -> Result<Arc<dyn WeatherSource>> {
    let http = HttpSettings {
        user_agent: config.user_agent.clone(),
        timeout: config.fetch_timeout(),
    };

    match name {
        OpenMeteoSource::NAME => Ok(Arc::new(OpenMeteoSource::new(&config.open_meteo, http))),
        WeatherGovSource::NAME => Ok(Arc::new(WeatherGovSource::new(&config.weather_gov, http))),
        placeholder::WEATHERAPI => Ok(Arc::new(UnimplementedSource::weatherapi())),
        placeholder::OPENWEATHERMAP => Ok(Arc::new(UnimplementedSource::openweathermap())),
        placeholder::METEOMATICS_FREE => Ok(Arc::new(UnimplementedSource::meteomatics_free())),
        _ => Err(OneWeatherError::config(format!(
            "Unknown weather source: '{}'. Valid options: {}",
            name,
            KNOWN_SOURCES.join(", ")
        ))),
    }
}
