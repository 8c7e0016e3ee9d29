//! Weather observation model and query modes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Where an observation came from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Live real-time provider
    Live,
    /// Historical archive provider
    Archive,
    /// Fallback or configured simulator
    Simulated,
}

/// Weather conditions at one point, consumed by the ice risk model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Temperature in Celsius
    #[serde(rename = "temp")]
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Liquid precipitation in mm
    pub precipitation: f64,
    /// Snowfall in mm
    pub snowfall: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Human-readable description of weather conditions
    pub description: String,
    pub source: ObservationSource,
}

impl WeatherObservation {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Apparent temperature after wind chill, using the same rough factor as the simulator
    #[must_use]
    pub fn feels_like(&self) -> f64 {
        self.temperature - self.wind_speed * 0.2
    }
}

/// A named severe-weather time window over a region
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoricalWindow {
    /// Region key, used for caching the archive dataset
    pub region: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bounds: BoundingBox,
}

impl HistoricalWindow {
    /// Cache key for the archive dataset of this window
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("archive:{}:{}:{}", self.region, self.start, self.end)
    }
}

/// Temporal mode of a weather query
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalMode {
    Current,
    Historical(HistoricalWindow),
}

impl TemporalMode {
    #[must_use]
    pub fn is_historical(&self) -> bool {
        matches!(self, TemporalMode::Historical(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    #[test]
    fn test_window_cache_key() {
        let window = HistoricalWindow {
            region: "minneapolis-duluth".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            bounds: BoundingBox::new(Coordinate::new(44.8, -93.5), Coordinate::new(46.9, -91.9)),
        };
        assert_eq!(
            window.cache_key(),
            "archive:minneapolis-duluth:2024-01-14:2024-01-16"
        );
        assert!(TemporalMode::Historical(window).is_historical());
        assert!(!TemporalMode::Current.is_historical());
    }

    #[test]
    fn test_feels_like() {
        let observation = WeatherObservation {
            temperature: -2.0,
            humidity: 80.0,
            precipitation: 0.0,
            snowfall: None,
            wind_speed: 20.0,
            description: "clear, cold".to_string(),
            source: ObservationSource::Simulated,
        };
        assert!((observation.feels_like() - -6.0).abs() < 1e-9);
        assert_eq!(observation.format_temperature(), "-2.0°C");
    }
}
