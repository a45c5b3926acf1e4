//! Integration tests for the OneWeather engine and CLI

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use oneweather::{
    FetchOrchestrator, FetchOutcome, ForecastPoint, SourceError, SourceManager, WeatherSource,
    blend,
};

fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, 0, 0).unwrap()
}

/// Source that answers with a fixed series after an optional delay
struct ScriptedSource {
    name: &'static str,
    delay: Duration,
    result: Result<Vec<(u32, f64, Option<f64>)>, SourceError>,
}

impl ScriptedSource {
    fn points(name: &'static str, rows: Vec<(u32, f64, Option<f64>)>) -> Arc<dyn WeatherSource> {
        Arc::new(Self {
            name,
            delay: Duration::ZERO,
            result: Ok(rows),
        })
    }

    fn slow(name: &'static str, delay: Duration) -> Arc<dyn WeatherSource> {
        Arc::new(Self {
            name,
            delay,
            result: Ok(vec![(0, 30.0, None)]),
        })
    }

    fn failing(name: &'static str, error: SourceError) -> Arc<dyn WeatherSource> {
        Arc::new(Self {
            name,
            delay: Duration::ZERO,
            result: Err(error),
        })
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Vec<ForecastPoint>, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let rows = self.result.clone()?;
        Ok(rows
            .into_iter()
            .map(|(h, temperature, wind_direction)| {
                ForecastPoint::new(hour(h), self.name, latitude, longitude)
                    .with_temperature(Some(temperature))
                    .with_wind_direction(wind_direction)
            })
            .collect())
    }
}

#[tokio::test]
async fn test_two_sources_blend_end_to_end() {
    let manager = SourceManager::default()
        .with_source(ScriptedSource::points("a", vec![(0, 10.0, Some(90.0))]))
        .unwrap()
        .with_source(ScriptedSource::points("b", vec![(0, 20.0, Some(270.0))]))
        .unwrap();

    let forecasts = manager.fetch_all(40.7, -74.0).await;
    let blended = manager.blend(&forecasts);

    assert_eq!(blended.len(), 1);
    assert_eq!(blended[0].timestamp, hour(0));
    assert_eq!(blended[0].temperature, Some(15.0));
    assert_eq!(blended[0].wind_direction, Some(90.0));
    assert_eq!(blended[0].source, "blended");
}

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let manager = SourceManager::default()
        .with_source(ScriptedSource::points("a", vec![(0, 10.0, None), (1, 11.0, None)]))
        .unwrap()
        .with_source(ScriptedSource::failing(
            "b",
            SourceError::unavailable("b", "HTTP 500: internal error"),
        ))
        .unwrap()
        .with_source(ScriptedSource::failing(
            "c",
            SourceError::schema("c", "missing forecastHourly"),
        ))
        .unwrap();

    let forecasts = manager.fetch_all(40.7, -74.0).await;
    assert_eq!(forecasts.source_names(), vec!["a", "b", "c"]);
    assert_eq!(forecasts.get("b"), Some(&[][..]));
    assert_eq!(forecasts.get("c"), Some(&[][..]));

    let blended = blend(&forecasts);
    let temperatures: Vec<_> = blended.iter().map(|p| p.temperature).collect();
    assert_eq!(temperatures, vec![Some(10.0), Some(11.0)]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_bounded_by_deadline() {
    let manager = SourceManager::new(FetchOrchestrator::new(Duration::from_secs(30)))
        .with_source(ScriptedSource::slow("slow", Duration::from_secs(120)))
        .unwrap()
        .with_source(ScriptedSource::points("fast", vec![(0, 12.0, None)]))
        .unwrap();

    let started = tokio::time::Instant::now();
    let forecast = manager.forecast(40.7, -74.0).await;
    assert!(started.elapsed() < Duration::from_secs(31));

    assert_eq!(forecast.points.len(), 1);
    assert_eq!(forecast.points[0].temperature, Some(12.0));
    assert_eq!(forecast.sources_used, vec!["slow", "fast"]);
    assert!(!forecast.source_details.contains_key("slow"));

    let status = manager.status().await;
    assert_eq!(status[0].last_outcome, Some(FetchOutcome::TimedOut));
    assert_eq!(status[1].last_outcome, Some(FetchOutcome::Fetched { points: 1 }));
}

#[tokio::test]
async fn test_unimplemented_source_contributes_nothing() {
    let manager = SourceManager::default()
        .with_source(Arc::new(oneweather::sources::UnimplementedSource::weatherapi()))
        .unwrap()
        .with_source(ScriptedSource::points("a", vec![(3, 8.0, None)]))
        .unwrap();

    let forecast = manager.forecast(40.7, -74.0).await;
    assert_eq!(forecast.sources_used, vec!["weatherapi", "a"]);
    assert_eq!(forecast.points.len(), 1);

    let status = manager.status().await;
    assert_eq!(status[0].last_outcome, Some(FetchOutcome::Unimplemented));
}

#[tokio::test]
async fn test_forecast_details_and_hour_limit() {
    let manager = SourceManager::default()
        .with_source(ScriptedSource::points(
            "a",
            vec![(0, 10.0, None), (1, 11.0, None), (2, 12.0, None), (3, 13.0, None)],
        ))
        .unwrap()
        .with_source(ScriptedSource::points("b", vec![(2, 14.0, None)]))
        .unwrap();

    let forecast = manager.forecast(40.7, -74.0).await;
    let details = &forecast.source_details["a"];
    assert_eq!(details.count, 4);
    assert_eq!(details.first_timestamp, hour(0));
    assert_eq!(details.last_timestamp, hour(3));
    assert_eq!(forecast.source_details["b"].count, 1);

    let limited = forecast.limit_hours(2);
    assert_eq!(limited.points.len(), 2);
    assert_eq!(limited.points[1].timestamp, hour(1));

    let json = serde_json::to_value(&limited).unwrap();
    assert_eq!(json["blending_method"], "simple_average");
    assert_eq!(json["points"][0]["source"], "blended");
}

#[tokio::test]
async fn test_no_sources_yields_empty_forecast() {
    let manager = SourceManager::default();
    let forecast = manager.forecast(0.0, 0.0).await;
    assert!(forecast.points.is_empty());
    assert!(forecast.sources_used.is_empty());
    assert!(manager.status().await.is_empty());
}

/// Test that the CLI shows help with the expected flags
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_oneweather"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--lat"));
    assert!(stdout.contains("--hours"));
}

/// Test that out-of-range coordinates fail before any provider is contacted
#[test]
fn test_cli_rejects_invalid_latitude() {
    let output = Command::new(env!("CARGO_BIN_EXE_oneweather"))
        .args(["--lat", "95", "--lon", "10"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Invalid input: latitude 95 must be between -90 and 90"));
}
