//! Observational state for registered sources

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Terminal state of the most recent fetch for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The source returned at least one point
    Fetched { points: usize },
    /// The source was reached but reported nothing
    Empty,
    /// The source failed with a network, HTTP or schema error
    Failed { reason: String },
    /// The source did not finish before the fetch deadline
    TimedOut,
    /// The source is registered but has no implementation (credentials absent)
    Unimplemented,
}

/// Introspectable state of one registered source
///
/// Refresh interval and last fetch time are advisory; nothing in the fetch path
/// reads them back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(serialize_with = "as_seconds")]
    pub nominal_refresh_interval: Duration,
    pub last_fetch_time: Option<DateTime<Utc>>,
    pub last_outcome: Option<FetchOutcome>,
}

impl SourceDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, nominal_refresh_interval: Duration) -> Self {
        Self {
            name: name.into(),
            nominal_refresh_interval,
            last_fetch_time: None,
            last_outcome: None,
        }
    }

    /// Record the end of a fetch attempt
    pub fn record(&mut self, finished_at: DateTime<Utc>, outcome: FetchOutcome) {
        self.last_fetch_time = Some(finished_at);
        self.last_outcome = Some(outcome);
    }
}

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}
