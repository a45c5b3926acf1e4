//! Per-source forecast collections and the blended forecast

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::ForecastPoint;

/// Source tag carried by every merged point
pub const BLENDED_SOURCE: &str = "blended";

/// Blending method reported alongside blended output
pub const BLENDING_METHOD: &str = "simple_average";

/// Mapping of source name to that source's ordered points
///
/// Entries keep insertion order, which is the registration order when produced by
/// the manager. Blending relies on this order to pick the first contributor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceForecasts {
    entries: Vec<(String, Vec<ForecastPoint>)>,
}

impl SourceForecasts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the points for a source, replacing any previous entry in place
    pub fn insert(&mut self, name: impl Into<String>, points: Vec<ForecastPoint>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing_points)) => *existing_points = points,
            None => self.entries.push((name, points)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[ForecastPoint]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, points)| points.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ForecastPoint])> {
        self.entries
            .iter()
            .map(|(name, points)| (name.as_str(), points.as_slice()))
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of sources, including sources with no points
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn total_points(&self) -> usize {
        self.entries.iter().map(|(_, points)| points.len()).sum()
    }
}

impl FromIterator<(String, Vec<ForecastPoint>)> for SourceForecasts {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ForecastPoint>)>>(iter: I) -> Self {
        let mut forecasts = Self::new();
        for (name, points) in iter {
            forecasts.insert(name, points);
        }
        forecasts
    }
}

impl Serialize for SourceForecasts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, points) in &self.entries {
            map.serialize_entry(name, points)?;
        }
        map.end()
    }
}

/// Coverage summary for one source's points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub count: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
}

impl SourceSummary {
    /// Summarize a source's points, `None` when it reported nothing
    #[must_use]
    pub fn from_points(points: &[ForecastPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        Some(Self {
            count: points.len(),
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
        })
    }
}

/// Blended forecast for one location together with provenance at source level
#[derive(Debug, Clone, Serialize)]
pub struct BlendedForecast {
    pub latitude: f64,
    pub longitude: f64,
    pub generated_at: DateTime<Utc>,
    /// Merged points, strictly ascending by timestamp
    pub points: Vec<ForecastPoint>,
    /// Every source that took part in the request, in registration order
    pub sources_used: Vec<String>,
    /// Coverage of each source that reported at least one point
    pub source_details: BTreeMap<String, SourceSummary>,
    pub blending_method: String,
}

impl BlendedForecast {
    #[must_use]
    pub fn new(
        latitude: f64,
        longitude: f64,
        forecasts: &SourceForecasts,
        points: Vec<ForecastPoint>,
    ) -> Self {
        let source_details = forecasts
            .iter()
            .filter_map(|(name, points)| {
                SourceSummary::from_points(points).map(|summary| (name.to_string(), summary))
            })
            .collect();

        Self {
            latitude,
            longitude,
            generated_at: Utc::now(),
            points,
            sources_used: forecasts.source_names(),
            source_details,
            blending_method: BLENDING_METHOD.to_string(),
        }
    }

    /// Keep only the first `hours` points
    #[must_use]
    pub fn limit_hours(mut self, hours: usize) -> Self {
        self.points.truncate(hours);
        self
    }
}
