//! NOAA Weather.gov source
//!
//! Weather.gov serves forecasts per grid cell, so a fetch is two calls:
//! `/points/{lat},{lon}` resolves the cell and yields the `forecastHourly`
//! endpoint, which is then requested for the hourly periods.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::http::{HttpSettings, get_json};
use super::{SourceError, WeatherSource, parse_timestamp};
use crate::config::WeatherGovConfig;
use crate::models::ForecastPoint;

static WIND_SPEED_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("wind speed pattern is valid"));

#[rustfmt::skip]
const COMPASS_POINTS: [(&str, f64); 16] = [
    ("N", 0.0), ("NNE", 22.5), ("NE", 45.0), ("ENE", 67.5),
    ("E", 90.0), ("ESE", 112.5), ("SE", 135.0), ("SSE", 157.5),
    ("S", 180.0), ("SSW", 202.5), ("SW", 225.0), ("WSW", 247.5),
    ("W", 270.0), ("WNW", 292.5), ("NW", 315.0), ("NNW", 337.5),
];

/// Weather.gov API client
pub struct WeatherGovSource {
    base_url: String,
    http: HttpSettings,
}

/// Grid point resolution response
#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub properties: Option<PointsProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsProperties {
    pub forecast_hourly: Option<String>,
}

/// Hourly forecast response
#[derive(Debug, Deserialize)]
pub struct HourlyForecastResponse {
    pub properties: Option<ForecastProperties>,
}

/// Periods stay untyped until parsed one by one
#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<Value>,
}

/// One hourly forecast period
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_time: String,
    /// Either a bare number or a quantitative value object
    pub temperature: Option<Value>,
    pub temperature_unit: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_direction: Option<String>,
    pub probability_of_precipitation: Option<QuantitativeValue>,
    pub relative_humidity: Option<QuantitativeValue>,
}

#[derive(Debug, Deserialize)]
pub struct QuantitativeValue {
    pub value: Option<f64>,
}

impl WeatherGovSource {
    pub const NAME: &'static str = "noaa_weathergov";

    #[must_use]
    pub fn new(config: &WeatherGovConfig, http: HttpSettings) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn points_url(&self, latitude: f64, longitude: f64) -> String {
        // The API redirects requests with more than four decimals
        format!("{}/points/{:.4},{:.4}", self.base_url, latitude, longitude)
    }
}

#[async_trait]
impl WeatherSource for WeatherGovSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(600)
    }

    #[instrument(name = "weather_gov_fetch", skip(self))]
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastPoint>, SourceError> {
        let client = self.http.client(Self::NAME)?;

        let grid_point: PointsResponse =
            get_json(&client, Self::NAME, &self.points_url(latitude, longitude)).await?;
        let forecast_url = grid_point
            .properties
            .and_then(|properties| properties.forecast_hourly)
            .ok_or_else(|| {
                SourceError::schema(Self::NAME, "grid point response has no forecastHourly endpoint")
            })?;

        let forecast: HourlyForecastResponse = get_json(&client, Self::NAME, &forecast_url).await?;
        let periods = forecast
            .properties
            .map(|properties| properties.periods)
            .unwrap_or_default();

        let points = parse_periods(&periods, latitude, longitude);
        info!("Weather.gov: got {} forecast points", points.len());
        Ok(points)
    }
}

/// Convert hourly periods into points, skipping periods that cannot be read
#[must_use]
pub fn parse_periods(periods: &[Value], latitude: f64, longitude: f64) -> Vec<ForecastPoint> {
    periods
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match parse_period(raw, latitude, longitude) {
            Ok(point) => Some(point),
            Err(reason) => {
                warn!("Error parsing Weather.gov period {}: {}", i, reason);
                None
            }
        })
        .collect()
}

fn parse_period(raw: &Value, latitude: f64, longitude: f64) -> Result<ForecastPoint, String> {
    let period = Period::deserialize(raw).map_err(|e| e.to_string())?;
    let timestamp = parse_timestamp(&period.start_time)
        .ok_or_else(|| format!("invalid startTime '{}'", period.start_time))?;

    let temperature = match period.temperature.as_ref() {
        Some(reported) => quantity(reported).map_err(|_| format!("non-numeric temperature {reported}"))?,
        None => None,
    }
    .map(|value| match period.temperature_unit.as_deref() {
        Some("C") => value,
        _ => ForecastPoint::fahrenheit_to_celsius(value),
    });

    let probability = period
        .probability_of_precipitation
        .and_then(|p| p.value)
        .map(|percent| percent / 100.0);

    Ok(ForecastPoint::new(timestamp, WeatherGovSource::NAME, latitude, longitude)
        .with_temperature(temperature)
        // Hourly periods carry probability only, never an amount
        .with_precipitation_amount(None)
        .with_precipitation_probability(probability)
        .with_wind_speed(period.wind_speed.as_deref().and_then(parse_wind_speed))
        .with_wind_direction(period.wind_direction.as_deref().and_then(cardinal_to_degrees))
        .with_humidity(period.relative_humidity.and_then(|h| h.value)))
}

/// A bare number or `{ "value": number }`; null means absent, anything else is malformed
fn quantity(value: &Value) -> Result<Option<f64>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        Value::Object(fields) => match fields.get("value") {
            None | Some(Value::Null) => Ok(None),
            Some(inner) => inner.as_f64().map(Some).ok_or(()),
        },
        _ => Err(()),
    }
}

/// Parse strings like "10 mph" or "5 to 10 mph" into m/s using the first numeral
#[must_use]
pub fn parse_wind_speed(wind_speed: &str) -> Option<f64> {
    let numeral = WIND_SPEED_NUMERAL.captures(wind_speed)?.get(1)?;
    let mph: f64 = numeral.as_str().parse().ok()?;
    Some(ForecastPoint::mph_to_ms(mph))
}

/// Convert a 16-point compass direction into degrees
#[must_use]
pub fn cardinal_to_degrees(direction: &str) -> Option<f64> {
    let direction = direction.trim().to_uppercase();
    COMPASS_POINTS
        .iter()
        .find(|(name, _)| *name == direction)
        .map(|(_, degrees)| *degrees)
}
