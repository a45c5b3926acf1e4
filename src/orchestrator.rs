//! Concurrent, fault-isolated fetching across all registered sources
//!
//! Every source fetch runs as its own future inside one `join_all`, wrapped in a
//! deadline and a fault barrier. Nothing is spawned, so no fetch outlives the
//! batch. Retries are deliberately absent at this layer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::models::{FetchOutcome, ForecastPoint, SourceForecasts};
use crate::sources::WeatherSource;

/// Deadline applied to each source fetch unless configured otherwise
pub const DEFAULT_FETCH_DEADLINE: Duration = Duration::from_secs(30);

/// Terminal state of one source within a batch
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub name: String,
    /// Points on success, empty for every other outcome
    pub points: Vec<ForecastPoint>,
    pub outcome: FetchOutcome,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Runs one fetch per source concurrently with independent deadlines
#[derive(Debug, Clone, Copy)]
pub struct FetchOrchestrator {
    deadline: Duration,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_DEADLINE)
    }
}

impl FetchOrchestrator {
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Fetch every source and report each outcome, in the order of `sources`
    #[instrument(name = "fetch_batch", skip(self, sources), fields(sources = sources.len()))]
    pub async fn run(
        &self,
        sources: &[Arc<dyn WeatherSource>],
        latitude: f64,
        longitude: f64,
    ) -> Vec<SourceReport> {
        let reports = join_all(
            sources
                .iter()
                .map(|source| self.run_one(source.as_ref(), latitude, longitude)),
        )
        .await;

        let succeeded = reports
            .iter()
            .filter(|report| matches!(report.outcome, FetchOutcome::Fetched { .. }))
            .count();
        info!(
            "Fetched {} of {} sources for {:.4}, {:.4}",
            succeeded,
            reports.len(),
            latitude,
            longitude
        );

        reports
    }

    /// Fetch every source into a per-source map; failed sources map to no points
    pub async fn fetch_all(
        &self,
        sources: &[Arc<dyn WeatherSource>],
        latitude: f64,
        longitude: f64,
    ) -> SourceForecasts {
        self.run(sources, latitude, longitude)
            .await
            .into_iter()
            .map(|report| (report.name, report.points))
            .collect()
    }

    async fn run_one(&self, source: &dyn WeatherSource, latitude: f64, longitude: f64) -> SourceReport {
        let name = source.name().to_string();
        let started = Instant::now();

        let guarded = AssertUnwindSafe(source.fetch(latitude, longitude)).catch_unwind();
        let (points, outcome) = match tokio::time::timeout(self.deadline, guarded).await {
            Err(_) => {
                warn!("Source {} timed out after {}s", name, self.deadline.as_secs_f64());
                (Vec::new(), FetchOutcome::TimedOut)
            }
            Ok(Err(panic)) => {
                let reason = format!("panicked: {}", panic_message(panic.as_ref()));
                warn!("Source {} error: {}", name, reason);
                (Vec::new(), FetchOutcome::Failed { reason })
            }
            Ok(Ok(Err(e))) if !e.is_fault() => {
                info!("Source {} is unimplemented: {}", name, e);
                (Vec::new(), FetchOutcome::Unimplemented)
            }
            Ok(Ok(Err(e))) => {
                warn!("Source {} error: {}", name, e);
                (
                    Vec::new(),
                    FetchOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
            Ok(Ok(Ok(points))) => {
                let outcome = if points.is_empty() {
                    FetchOutcome::Empty
                } else {
                    FetchOutcome::Fetched {
                        points: points.len(),
                    }
                };
                (points, outcome)
            }
        };

        let elapsed = started.elapsed();
        debug!(
            "Source {} finished in {:.3}s: {:?}",
            name,
            elapsed.as_secs_f64(),
            outcome
        );

        SourceReport {
            name,
            points,
            outcome,
            finished_at: Utc::now(),
            elapsed,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
