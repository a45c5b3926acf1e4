//! `OneWeather` - Multi-source weather forecast acquisition and blending
//!
//! This library fetches hourly forecasts for a point from several independent
//! providers concurrently, normalizes them into one point representation, and
//! merges them into a single consensus time series.

pub mod blending;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod orchestrator;
pub mod sources;

// Re-export core types for public API
pub use blending::blend;
pub use config::{LoggingConfig, OneWeatherConfig, SourcesConfig};
pub use error::OneWeatherError;
pub use manager::SourceManager;
pub use models::{
    BlendedForecast, FetchOutcome, ForecastPoint, Location, SourceDescriptor, SourceForecasts,
    SourceSummary,
};
pub use orchestrator::{FetchOrchestrator, SourceReport};
pub use sources::{SourceError, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, OneWeatherError>;
