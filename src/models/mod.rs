//! Data models for the `OneWeather` engine
//!
//! This module contains the core domain models organized by concern:
//! - Location: Queried geographic coordinates
//! - Point: The normalized forecast point shared by every source
//! - Forecast: Per-source collections and the blended result
//! - Source: Observational state of registered sources

pub mod forecast;
pub mod location;
pub mod point;
pub mod source;

// Re-export all public types for convenient access
pub use forecast::{BLENDED_SOURCE, BlendedForecast, SourceForecasts, SourceSummary};
pub use location::Location;
pub use point::ForecastPoint;
pub use source::{FetchOutcome, SourceDescriptor};
