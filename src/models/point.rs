//! Normalized forecast point and unit conversions

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meters per second in one mile per hour
pub const MPH_TO_MS: f64 = 0.44704;

const TEMPERATURE_RANGE_C: RangeInclusive<f64> = -100.0..=70.0;
const PERCENT_RANGE: RangeInclusive<f64> = 0.0..=100.0;
const FRACTION_RANGE: RangeInclusive<f64> = 0.0..=1.0;
const BEARING_RANGE: RangeInclusive<f64> = 0.0..=360.0;
const NON_NEGATIVE: RangeInclusive<f64> = 0.0..=f64::MAX;
const POSITIVE: RangeInclusive<f64> = f64::MIN_POSITIVE..=f64::MAX;

/// One forecast value set for a single UTC instant, produced by one source
///
/// Optional fields are either a validated value in the documented unit or `None`.
/// The `with_*` setters enforce this, so adapters should always go through them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPoint {
    /// Instant of this forecast value, in UTC
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Precipitation amount in mm
    pub precipitation_amount: Option<f64>,
    /// Precipitation probability as a fraction (0-1)
    pub precipitation_probability: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Option<f64>,
    /// Relative humidity percentage (0-100)
    pub humidity: Option<f64>,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: Option<f64>,
    /// Atmospheric pressure in hPa
    pub pressure: Option<f64>,
    /// Provider identifier, or `blended` for merged output
    pub source: String,
    /// Queried latitude
    pub latitude: f64,
    /// Queried longitude
    pub longitude: f64,
}

impl ForecastPoint {
    /// Create an empty point with every optional field absent
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature: None,
            precipitation_amount: None,
            precipitation_probability: None,
            wind_speed: None,
            wind_direction: None,
            humidity: None,
            cloud_cover: None,
            pressure: None,
            source: source.into(),
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, celsius: Option<f64>) -> Self {
        self.temperature = within(celsius, &TEMPERATURE_RANGE_C);
        self
    }

    #[must_use]
    pub fn with_precipitation_amount(mut self, mm: Option<f64>) -> Self {
        self.precipitation_amount = within(mm, &NON_NEGATIVE);
        self
    }

    #[must_use]
    pub fn with_precipitation_probability(mut self, fraction: Option<f64>) -> Self {
        self.precipitation_probability = within(fraction, &FRACTION_RANGE);
        self
    }

    #[must_use]
    pub fn with_wind_speed(mut self, ms: Option<f64>) -> Self {
        self.wind_speed = within(ms, &NON_NEGATIVE);
        self
    }

    #[must_use]
    pub fn with_wind_direction(mut self, degrees: Option<f64>) -> Self {
        self.wind_direction = within(degrees, &BEARING_RANGE);
        self
    }

    #[must_use]
    pub fn with_humidity(mut self, percent: Option<f64>) -> Self {
        self.humidity = within(percent, &PERCENT_RANGE);
        self
    }

    #[must_use]
    pub fn with_cloud_cover(mut self, percent: Option<f64>) -> Self {
        self.cloud_cover = within(percent, &PERCENT_RANGE);
        self
    }

    #[must_use]
    pub fn with_pressure(mut self, hpa: Option<f64>) -> Self {
        self.pressure = within(hpa, &POSITIVE);
        self
    }

    /// Convert temperature from Fahrenheit to Celsius
    #[must_use]
    pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
        (fahrenheit - 32.0) * 5.0 / 9.0
    }

    /// Convert speed from miles per hour to meters per second
    #[must_use]
    pub fn mph_to_ms(mph: f64) -> f64 {
        mph * MPH_TO_MS
    }
}

fn within(value: Option<f64>, range: &RangeInclusive<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && range.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn point() -> ForecastPoint {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        ForecastPoint::new(timestamp, "test", 40.71, -74.01)
    }

    #[test]
    fn test_new_point_has_no_values() {
        let p = point();
        assert_eq!(p.source, "test");
        assert!(p.temperature.is_none());
        assert!(p.precipitation_amount.is_none());
        assert!(p.precipitation_probability.is_none());
        assert!(p.wind_speed.is_none());
        assert!(p.wind_direction.is_none());
        assert!(p.humidity.is_none());
        assert!(p.cloud_cover.is_none());
        assert!(p.pressure.is_none());
    }

    #[test]
    fn test_sentinels_are_rejected() {
        let p = point()
            .with_temperature(Some(-999.0))
            .with_wind_speed(Some(-999.0))
            .with_pressure(Some(-999.0))
            .with_precipitation_amount(Some(-999.0));
        assert!(p.temperature.is_none());
        assert!(p.wind_speed.is_none());
        assert!(p.pressure.is_none());
        assert!(p.precipitation_amount.is_none());
    }

    #[test]
    fn test_valid_values_are_kept() {
        let p = point()
            .with_temperature(Some(21.5))
            .with_precipitation_amount(Some(0.0))
            .with_precipitation_probability(Some(0.4))
            .with_wind_speed(Some(3.2))
            .with_wind_direction(Some(360.0))
            .with_humidity(Some(100.0))
            .with_cloud_cover(Some(0.0))
            .with_pressure(Some(1013.2));
        assert_eq!(p.temperature, Some(21.5));
        assert_eq!(p.precipitation_amount, Some(0.0));
        assert_eq!(p.precipitation_probability, Some(0.4));
        assert_eq!(p.wind_speed, Some(3.2));
        assert_eq!(p.wind_direction, Some(360.0));
        assert_eq!(p.humidity, Some(100.0));
        assert_eq!(p.cloud_cover, Some(0.0));
        assert_eq!(p.pressure, Some(1013.2));
    }

    #[rstest]
    #[case(Some(f64::NAN))]
    #[case(Some(f64::INFINITY))]
    #[case(Some(101.0))]
    #[case(Some(-0.5))]
    #[case(None)]
    fn test_invalid_humidity_is_absent(#[case] value: Option<f64>) {
        assert!(point().with_humidity(value).humidity.is_none());
    }

    #[test]
    fn test_probability_outside_fraction_is_absent() {
        // A percentage that was never normalized must not leak through
        assert!(point().with_precipitation_probability(Some(40.0)).precipitation_probability.is_none());
    }

    #[rstest]
    #[case(32.0, 0.0)]
    #[case(212.0, 100.0)]
    #[case(-40.0, -40.0)]
    fn test_fahrenheit_to_celsius(#[case] fahrenheit: f64, #[case] celsius: f64) {
        assert!((ForecastPoint::fahrenheit_to_celsius(fahrenheit) - celsius).abs() < 1e-9);
    }

    #[test]
    fn test_mph_to_ms() {
        assert!((ForecastPoint::mph_to_ms(10.0) - 4.4704).abs() < 1e-9);
    }
}
