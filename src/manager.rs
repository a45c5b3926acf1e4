//! Source registry and the public fetch and blend entry points

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::blending;
use crate::config::SourcesConfig;
use crate::models::{BlendedForecast, ForecastPoint, SourceDescriptor, SourceForecasts};
use crate::orchestrator::FetchOrchestrator;
use crate::sources::{WeatherSource, create_source};
use crate::{OneWeatherError, Result};

/// Registry of weather sources and the entry point for fetching and blending
///
/// Registration order is significant: it is the order of [`SourceForecasts`]
/// and therefore decides which source supplies the blended wind direction.
pub struct SourceManager {
    sources: Vec<Arc<dyn WeatherSource>>,
    descriptors: RwLock<Vec<SourceDescriptor>>,
    orchestrator: FetchOrchestrator,
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new(FetchOrchestrator::default())
    }
}

impl SourceManager {
    #[must_use]
    pub fn new(orchestrator: FetchOrchestrator) -> Self {
        Self {
            sources: Vec::new(),
            descriptors: RwLock::new(Vec::new()),
            orchestrator,
        }
    }

    /// Build a manager with every enabled source, in configured order
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let mut manager = Self::new(FetchOrchestrator::new(config.fetch_timeout()));
        for name in &config.enabled {
            manager.register(create_source(name, config)?)?;
        }

        info!(
            "Initialized {} weather sources: {}",
            manager.len(),
            manager.source_names().join(", ")
        );
        Ok(manager)
    }

    /// Add a source; names must be unique
    pub fn register(&mut self, source: Arc<dyn WeatherSource>) -> Result<()> {
        if self.sources.iter().any(|s| s.name() == source.name()) {
            return Err(OneWeatherError::config(format!(
                "Weather source '{}' is already registered",
                source.name()
            )));
        }

        self.descriptors
            .get_mut()
            .push(SourceDescriptor::new(source.name(), source.refresh_interval()));
        self.sources.push(source);
        Ok(())
    }

    pub fn with_source(mut self, source: Arc<dyn WeatherSource>) -> Result<Self> {
        self.register(source)?;
        Ok(self)
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[must_use]
    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    /// Fetch every registered source concurrently
    ///
    /// Every registered source appears in the result; a source that failed, timed
    /// out or is unimplemented maps to an empty sequence.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, latitude: f64, longitude: f64) -> SourceForecasts {
        let reports = self.orchestrator.run(&self.sources, latitude, longitude).await;

        {
            let mut descriptors = self.descriptors.write().await;
            for (descriptor, report) in descriptors.iter_mut().zip(&reports) {
                descriptor.record(report.finished_at, report.outcome.clone());
            }
        }

        reports
            .into_iter()
            .map(|report| (report.name, report.points))
            .collect()
    }

    /// Merge per-source forecasts into one consensus sequence
    #[must_use]
    pub fn blend(&self, forecasts: &SourceForecasts) -> Vec<ForecastPoint> {
        blending::blend(forecasts)
    }

    /// Fetch, blend and summarise per-source coverage
    #[instrument(skip(self))]
    pub async fn forecast(&self, latitude: f64, longitude: f64) -> BlendedForecast {
        let forecasts = self.fetch_all(latitude, longitude).await;
        let points = self.blend(&forecasts);
        BlendedForecast::new(latitude, longitude, &forecasts, points)
    }

    /// Snapshot of every registered source, in registration order
    pub async fn status(&self) -> Vec<SourceDescriptor> {
        self.descriptors.read().await.clone()
    }
}
