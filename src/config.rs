//! Configuration management for the `OneWeather` engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::OneWeatherError;
use crate::sources::KNOWN_SOURCES;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `OneWeather` engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneWeatherConfig {
    /// Weather source configuration
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather source registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Sources to register, in registration order
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,
    /// Deadline for a single source fetch in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u32,
    /// User agent sent to every provider
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,
    #[serde(default)]
    pub weather_gov: WeatherGovConfig,
}

/// Open-Meteo multi-model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoConfig {
    #[serde(default = "default_open_meteo_base_url")]
    pub base_url: String,
    /// Named forecast models, one request each
    #[serde(default = "default_open_meteo_models")]
    pub models: Vec<String>,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

/// Weather.gov settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherGovConfig {
    #[serde(default = "default_weather_gov_base_url")]
    pub base_url: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_enabled_sources() -> Vec<String> {
    vec!["openmeteo".to_string(), "noaa_weathergov".to_string()]
}

fn default_fetch_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("OneWeather/{} (oneweather)", env!("CARGO_PKG_VERSION"))
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_open_meteo_models() -> Vec<String> {
    vec!["gfs".to_string(), "ecmwf".to_string(), "gem".to_string()]
}

fn default_forecast_days() -> u8 {
    3
}

fn default_weather_gov_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            fetch_timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
            open_meteo: OpenMeteoConfig::default(),
            weather_gov: WeatherGovConfig::default(),
        }
    }
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_meteo_base_url(),
            models: default_open_meteo_models(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for WeatherGovConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_gov_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SourcesConfig {
    /// Deadline applied to each source fetch
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds.into())
    }
}

impl OneWeatherConfig {
    /// Load configuration from a file (or the default locations) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. ONEWEATHER_SOURCES__FETCH_TIMEOUT_SECONDS=10
        builder = builder.add_source(
            Environment::with_prefix("ONEWEATHER")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("sources.enabled")
                .with_list_parse_key("sources.open_meteo.models")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: OneWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("oneweather").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.sources.fetch_timeout_seconds == 0 {
            self.sources.fetch_timeout_seconds = default_fetch_timeout();
        }
        if self.sources.user_agent.is_empty() {
            self.sources.user_agent = default_user_agent();
        }
        if self.sources.open_meteo.base_url.is_empty() {
            self.sources.open_meteo.base_url = default_open_meteo_base_url();
        }
        if self.sources.open_meteo.forecast_days == 0 {
            self.sources.open_meteo.forecast_days = default_forecast_days();
        }
        if self.sources.weather_gov.base_url.is_empty() {
            self.sources.weather_gov.base_url = default_weather_gov_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_sources()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the enabled source list
    fn validate_sources(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in &self.sources.enabled {
            if !KNOWN_SOURCES.contains(&name.as_str()) {
                return Err(OneWeatherError::config(format!(
                    "Unknown weather source '{}'. Valid options: {}",
                    name,
                    KNOWN_SOURCES.join(", ")
                ))
                .into());
            }
            if !seen.insert(name.as_str()) {
                return Err(OneWeatherError::config(format!(
                    "Weather source '{name}' is enabled more than once"
                ))
                .into());
            }
        }

        let open_meteo_enabled = self.sources.enabled.iter().any(|name| name == "openmeteo");
        if open_meteo_enabled && self.sources.open_meteo.models.is_empty() {
            return Err(OneWeatherError::config(
                "Open-Meteo is enabled but no models are configured",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.sources.fetch_timeout_seconds > 300 {
            return Err(
                OneWeatherError::config("Source fetch timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.sources.open_meteo.forecast_days > 16 {
            return Err(
                OneWeatherError::config("Open-Meteo forecast days cannot exceed 16").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(OneWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(OneWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (label, url) in [
            ("Open-Meteo", &self.sources.open_meteo.base_url),
            ("Weather.gov", &self.sources.weather_gov.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(OneWeatherError::config(format!(
                    "{label} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
