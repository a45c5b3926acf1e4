//! Open-Meteo multi-model source
//!
//! Fans out one hourly forecast request per configured model and concatenates
//! the parsed points. A failing model is logged and skipped; the others are
//! still used.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::http::{HttpSettings, get_json};
use super::{SourceError, WeatherSource, parse_timestamp};
use crate::config::OpenMeteoConfig;
use crate::models::ForecastPoint;

const HOURLY_VARIABLES: &str = "temperature_2m,precipitation,rain,showers,snowfall,pressure_msl,cloud_cover,wind_speed_10m,wind_direction_10m,relative_humidity_2m";

/// Open-Meteo forecast API client
pub struct OpenMeteoSource {
    base_url: String,
    models: Vec<String>,
    forecast_days: u8,
    http: HttpSettings,
}

/// Hourly forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub hourly: Option<HourlyData>,
}

/// Hourly weather data from `OpenMeteo`
///
/// Entries stay untyped so a single malformed value only affects its own point.
#[derive(Debug, Default, Deserialize)]
pub struct HourlyData {
    #[serde(default)]
    pub time: Option<Vec<Value>>,
    #[serde(default, rename = "temperature_2m")]
    pub temperature: Option<Vec<Value>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Value>>,
    #[serde(default)]
    pub rain: Option<Vec<Value>>,
    #[serde(default)]
    pub snowfall: Option<Vec<Value>>,
    #[serde(default, rename = "pressure_msl")]
    pub pressure: Option<Vec<Value>>,
    #[serde(default)]
    pub cloud_cover: Option<Vec<Value>>,
    #[serde(default, rename = "wind_speed_10m")]
    pub wind_speed: Option<Vec<Value>>,
    #[serde(default, rename = "wind_direction_10m")]
    pub wind_direction: Option<Vec<Value>>,
    #[serde(default, rename = "relative_humidity_2m")]
    pub humidity: Option<Vec<Value>>,
}

impl OpenMeteoSource {
    pub const NAME: &'static str = "openmeteo";

    #[must_use]
    pub fn new(config: &OpenMeteoConfig, http: HttpSettings) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            forecast_days: config.forecast_days,
            http,
        }
    }

    /// Source tag for points produced by one model
    #[must_use]
    pub fn model_tag(model: &str) -> String {
        format!("{}_{model}", Self::NAME)
    }

    fn build_url(&self, latitude: f64, longitude: f64, model: &str) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&models={}&forecast_days={}&wind_speed_unit=ms&timezone=GMT",
            self.base_url, latitude, longitude, HOURLY_VARIABLES, model, self.forecast_days
        )
    }

    async fn fetch_model(
        &self,
        client: &Client,
        model: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastPoint>, SourceError> {
        let url = self.build_url(latitude, longitude, model);
        let response: ForecastResponse = get_json(client, &Self::model_tag(model), &url).await?;
        Ok(parse_response(&response, &Self::model_tag(model), latitude, longitude))
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(name = "open_meteo_fetch", skip(self), fields(models = self.models.len()))]
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastPoint>, SourceError> {
        let client = self.http.client(Self::NAME)?;

        let results = join_all(
            self.models
                .iter()
                .map(|model| self.fetch_model(&client, model, latitude, longitude)),
        )
        .await;

        let mut forecasts = Vec::new();
        let mut failures = Vec::new();
        for (model, result) in self.models.iter().zip(results) {
            match result {
                Ok(points) => {
                    info!("Open-Meteo {}: got {} forecast points", model, points.len());
                    forecasts.extend(points);
                }
                Err(e) => {
                    warn!("Open-Meteo {} failed: {}", model, e);
                    failures.push(e.to_string());
                }
            }
        }

        if !self.models.is_empty() && failures.len() == self.models.len() {
            return Err(SourceError::unavailable(
                Self::NAME,
                format!("all {} models failed: {}", failures.len(), failures.join("; ")),
            ));
        }

        Ok(forecasts)
    }
}

/// Convert an Open-Meteo hourly response into points tagged with `tag`
///
/// Missing or non-numeric entries make the corresponding field absent. A point is
/// skipped only when its timestamp cannot be read.
#[must_use]
pub fn parse_response(
    response: &ForecastResponse,
    tag: &str,
    latitude: f64,
    longitude: f64,
) -> Vec<ForecastPoint> {
    let Some(hourly) = &response.hourly else {
        return Vec::new();
    };
    let Some(times) = &hourly.time else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(times.len());
    for (i, time) in times.iter().enumerate() {
        let Some(timestamp) = time.as_str().and_then(parse_timestamp) else {
            warn!("Error parsing Open-Meteo point {} for {}: bad timestamp {}", i, tag, time);
            continue;
        };

        let precipitation = derive_precipitation(
            number_at(&hourly.precipitation, i),
            number_at(&hourly.rain, i),
            number_at(&hourly.snowfall, i),
        );

        points.push(
            ForecastPoint::new(timestamp, tag, latitude, longitude)
                .with_temperature(number_at(&hourly.temperature, i))
                .with_precipitation_amount(precipitation)
                // Open-Meteo does not report precipitation probability
                .with_precipitation_probability(None)
                .with_wind_speed(number_at(&hourly.wind_speed, i))
                .with_wind_direction(number_at(&hourly.wind_direction, i))
                .with_humidity(number_at(&hourly.humidity, i))
                .with_cloud_cover(number_at(&hourly.cloud_cover, i))
                .with_pressure(number_at(&hourly.pressure, i)),
        );
    }

    points
}

/// Larger of `rain + snowfall` and the reported precipitation; the provider is
/// not consistent about which of these it fills in
#[must_use]
pub fn derive_precipitation(
    precipitation: Option<f64>,
    rain: Option<f64>,
    snowfall: Option<f64>,
) -> Option<f64> {
    if precipitation.is_none() && rain.is_none() && snowfall.is_none() {
        return None;
    }
    let combined = rain.unwrap_or(0.0) + snowfall.unwrap_or(0.0);
    Some(combined.max(precipitation.unwrap_or(0.0)))
}

fn number_at(series: &Option<Vec<Value>>, index: usize) -> Option<f64> {
    series.as_ref()?.get(index)?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;

    fn response(value: Value) -> ForecastResponse {
        serde_json::from_value(value).unwrap()
    }

    fn source(base_url: &str, models: &[&str]) -> OpenMeteoSource {
        let config = OpenMeteoConfig {
            base_url: base_url.to_string(),
            models: models.iter().map(ToString::to_string).collect(),
            forecast_days: 3,
        };
        OpenMeteoSource::new(
            &config,
            HttpSettings {
                user_agent: "OneWeather/test".to_string(),
                timeout: Duration::from_secs(2),
            },
        )
    }

    #[test]
    fn test_build_url() {
        let url = source("https://api.open-meteo.com/v1/forecast/", &["gfs"])
            .build_url(40.7128, -74.006, "gfs");
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=40.7128&longitude=-74.006"));
        assert!(url.contains("&models=gfs"));
        assert!(url.contains("&forecast_days=3"));
        assert!(url.contains("wind_speed_unit=ms"));
        assert!(url.contains("timezone=GMT"));
        assert!(url.contains("relative_humidity_2m"));
    }

    #[test]
    fn test_parse_hourly_response() {
        let data = response(json!({
            "hourly": {
                "time": ["2024-06-01T00:00", "2024-06-01T01:00"],
                "temperature_2m": [18.2, 17.9],
                "precipitation": [0.0, 0.4],
                "rain": [0.0, 0.3],
                "snowfall": [0.0, 0.0],
                "pressure_msl": [1012.5, 1012.1],
                "cloud_cover": [20, 35],
                "wind_speed_10m": [3.1, 2.8],
                "wind_direction_10m": [180, 190],
                "relative_humidity_2m": [60, 64]
            }
        }));

        let points = parse_response(&data, "openmeteo_gfs", 40.7, -74.0);
        assert_eq!(points.len(), 2);

        let first = &points[0];
        assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(first.source, "openmeteo_gfs");
        assert_eq!(first.temperature, Some(18.2));
        assert_eq!(first.precipitation_amount, Some(0.0));
        assert!(first.precipitation_probability.is_none());
        assert_eq!(first.wind_speed, Some(3.1));
        assert_eq!(first.wind_direction, Some(180.0));
        assert_eq!(first.humidity, Some(60.0));
        assert_eq!(first.cloud_cover, Some(20.0));
        assert_eq!(first.pressure, Some(1012.5));
        assert_eq!(first.latitude, 40.7);
        assert_eq!(first.longitude, -74.0);

        assert_eq!(points[1].precipitation_amount, Some(0.4));
    }

    #[test]
    fn test_parse_short_and_null_arrays() {
        let data = response(json!({
            "hourly": {
                "time": ["2024-06-01T00:00", "2024-06-01T01:00", "2024-06-01T02:00"],
                "temperature_2m": [18.2, null],
                "cloud_cover": null
            }
        }));

        let points = parse_response(&data, "openmeteo_ecmwf", 0.0, 0.0);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].temperature, Some(18.2));
        assert!(points[1].temperature.is_none());
        assert!(points[2].temperature.is_none());
        assert!(points.iter().all(|p| p.cloud_cover.is_none()));
        assert!(points.iter().all(|p| p.precipitation_amount.is_none()));
    }

    #[test]
    fn test_parse_skips_bad_timestamps() {
        let data = response(json!({
            "hourly": {
                "time": ["2024-06-01T00:00", "not a time", 12, "2024-06-01T03:00"],
                "temperature_2m": [1.0, 2.0, 3.0, 4.0]
            }
        }));

        let points = parse_response(&data, "openmeteo_gem", 0.0, 0.0);
        let temperatures: Vec<_> = points.iter().map(|p| p.temperature).collect();
        assert_eq!(temperatures, vec![Some(1.0), Some(4.0)]);
    }

    #[test]
    fn test_parse_without_hourly() {
        let data = response(json!({ "latitude": 40.7 }));
        assert!(parse_response(&data, "openmeteo_gfs", 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_parse_drops_non_numeric_and_sentinel_values() {
        let data = response(json!({
            "hourly": {
                "time": ["2024-06-01T00:00"],
                "temperature_2m": ["warm"],
                "pressure_msl": [-999.0]
            }
        }));

        let points = parse_response(&data, "openmeteo_gfs", 0.0, 0.0);
        assert_eq!(points.len(), 1);
        assert!(points[0].temperature.is_none());
        assert!(points[0].pressure.is_none());
    }

    #[rstest]
    #[case(Some(0.5), Some(0.2), Some(0.1), Some(0.5))]
    #[case(Some(0.1), Some(0.4), Some(0.3), Some(0.7))]
    #[case(None, Some(0.4), None, Some(0.4))]
    #[case(Some(1.2), None, None, Some(1.2))]
    #[case(None, None, None, None)]
    fn test_derive_precipitation(
        #[case] precipitation: Option<f64>,
        #[case] rain: Option<f64>,
        #[case] snowfall: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        let derived = derive_precipitation(precipitation, rain, snowfall);
        match (derived, expected) {
            (Some(d), Some(e)) => assert!((d - e).abs() < 1e-9),
            (d, e) => assert_eq!(d, e),
        }
    }

    #[test]
    fn test_model_tag() {
        assert_eq!(OpenMeteoSource::model_tag("ecmwf"), "openmeteo_ecmwf");
    }

    #[tokio::test]
    async fn test_all_models_failing_is_unavailable() {
        let source = source("http://127.0.0.1:1/v1/forecast", &["gfs", "gem"]);
        let result = source.fetch(40.7, -74.0).await;
        match result {
            Err(SourceError::Unavailable { provider, reason }) => {
                assert_eq!(provider, "openmeteo");
                assert!(reason.contains("all 2 models failed"));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }
}
