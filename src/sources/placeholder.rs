//! Providers that are registered but have no implementation yet
//!
//! All of them need an API key; until one is wired up they report
//! [`SourceError::Unimplemented`] and contribute nothing.

use async_trait::async_trait;
use tracing::debug;

use super::{SourceError, WeatherSource};
use crate::models::ForecastPoint;

pub const WEATHERAPI: &str = "weatherapi";
pub const OPENWEATHERMAP: &str = "openweathermap";
pub const METEOMATICS_FREE: &str = "meteomatics_free";

/// Inert source standing in for a provider without credentials
#[derive(Debug, Clone)]
pub struct UnimplementedSource {
    name: &'static str,
    display_name: &'static str,
}

impl UnimplementedSource {
    #[must_use]
    pub const fn new(name: &'static str, display_name: &'static str) -> Self {
        Self { name, display_name }
    }

    /// WeatherAPI.com free tier (1M calls/month, 3-day forecast)
    #[must_use]
    pub const fn weatherapi() -> Self {
        Self::new(WEATHERAPI, "WeatherAPI.com")
    }

    /// OpenWeatherMap free tier (1K calls/day, 5-day forecast)
    #[must_use]
    pub const fn openweathermap() -> Self {
        Self::new(OPENWEATHERMAP, "OpenWeatherMap")
    }

    #[must_use]
    pub const fn meteomatics_free() -> Self {
        Self::new(METEOMATICS_FREE, "Meteomatics")
    }
}

#[async_trait]
impl WeatherSource for UnimplementedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<ForecastPoint>, SourceError> {
        debug!("{} requires API key registration", self.display_name);
        Err(SourceError::Unimplemented {
            provider: self.name.to_string(),
        })
    }
}
