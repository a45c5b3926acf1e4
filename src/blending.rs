//! Timestamp-keyed blending of per-source forecasts
//!
//! Points from all sources are grouped by exact UTC timestamp. Within a group each
//! numeric field is the mean over the points that report it, and absent when none
//! do. Wind direction is not averaged: the first point of the group (in source
//! order) supplies it as-is. Output is strictly ascending by timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{BLENDED_SOURCE, ForecastPoint, SourceForecasts};

/// Merge every source's points into one consensus sequence
#[must_use]
pub fn blend(forecasts: &SourceForecasts) -> Vec<ForecastPoint> {
    let mut groups: BTreeMap<DateTime<Utc>, Vec<&ForecastPoint>> = BTreeMap::new();
    for (_, points) in forecasts.iter() {
        for point in points {
            groups.entry(point.timestamp).or_default().push(point);
        }
    }

    let blended: Vec<ForecastPoint> = groups
        .into_iter()
        .filter_map(|(timestamp, group)| merge_group(timestamp, &group))
        .collect();

    info!(
        "Blended {} forecast points from {} sources",
        blended.len(),
        forecasts.len()
    );
    blended
}

fn merge_group(timestamp: DateTime<Utc>, group: &[&ForecastPoint]) -> Option<ForecastPoint> {
    let first = group.first()?;

    Some(ForecastPoint {
        timestamp,
        temperature: mean(group, |p| p.temperature),
        precipitation_amount: mean(group, |p| p.precipitation_amount),
        precipitation_probability: mean(group, |p| p.precipitation_probability),
        wind_speed: mean(group, |p| p.wind_speed),
        wind_direction: first.wind_direction,
        humidity: mean(group, |p| p.humidity),
        cloud_cover: mean(group, |p| p.cloud_cover),
        pressure: mean(group, |p| p.pressure),
        source: BLENDED_SOURCE.to_string(),
        latitude: first.latitude,
        longitude: first.longitude,
    })
}

/// Partial average over the points that report the field
fn mean(group: &[&ForecastPoint], field: impl Fn(&ForecastPoint) -> Option<f64>) -> Option<f64> {
    let (sum, count) = group
        .iter()
        .filter_map(|point| field(point))
        .fold((0.0, 0_u32), |(sum, count), value| (sum + value, count + 1));

    (count > 0).then(|| sum / f64::from(count))
}
