//! Simulated weather
//!
//! Used when no live provider is configured and as the fallback whenever a live
//! call fails. Output is plausible winter weather, colder at high latitude and
//! during historical storm windows. Seeding makes it reproducible.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use super::WeatherProvider;
use crate::models::{Coordinate, ObservationSource, TemporalMode, WeatherObservation};

pub struct SimulatedWeather {
    rng: Mutex<StdRng>,
    /// Fixed month for the seasonal offset, defaults to the current month
    month: Option<u32>,
}

impl SimulatedWeather {
    /// Simulator seeded from `seed`, or from the thread RNG when `None`
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random_range(0..u64::MAX));
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            month: None,
        }
    }

    /// Pin the month used for the current-mode seasonal offset
    #[must_use]
    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    /// Produce one observation, never fails
    pub fn simulate(&self, location: &Coordinate, mode: &TemporalMode) -> WeatherObservation {
        let base_temp = -5.0 + (45.0 - location.latitude.abs()) * 0.5;
        let (mode_offset, precipitation_chance) = match mode {
            TemporalMode::Historical(_) => (-4.0, 0.6),
            TemporalMode::Current => {
                let month = self.month.unwrap_or_else(|| Utc::now().month());
                (season_offset(month, location.latitude), 0.3)
            }
        };

        // poisoning only means another thread panicked mid-draw; the RNG state is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let temperature = base_temp + mode_offset + rng.random_range(-3.0..3.0);
        let precipitation = if rng.random_range(0.0..1.0) < precipitation_chance {
            rng.random_range(0.0..2.0)
        } else {
            0.0
        };
        let humidity = rng.random_range(60.0..95.0);
        let wind_speed = rng.random_range(5.0..25.0);
        drop(rng);

        // roughly 10:1 snow to liquid ratio
        let snowfall =
            (temperature < 0.0 && precipitation > 0.0).then(|| round(precipitation * 10.0, 1));
        let description = describe(temperature, precipitation, humidity);

        WeatherObservation {
            temperature: round(temperature, 1),
            humidity: round(humidity, 1),
            precipitation: round(precipitation, 2),
            snowfall,
            wind_speed: round(wind_speed, 1),
            description: description.to_string(),
            source: ObservationSource::Simulated,
        }
    }
}

#[async_trait]
impl WeatherProvider for SimulatedWeather {
    fn source(&self) -> ObservationSource {
        ObservationSource::Simulated
    }

    async fn observe(
        &self,
        location: &Coordinate,
        mode: &TemporalMode,
    ) -> Result<WeatherObservation> {
        Ok(self.simulate(location, mode))
    }
}

/// Degrees added to the winter baseline for the given month, hemisphere aware
fn season_offset(month: u32, latitude: f64) -> f64 {
    let month = if latitude < 0.0 { (month + 5) % 12 + 1 } else { month };
    match month {
        12 | 1 | 2 => 0.0,
        3 | 11 => 6.0,
        4 | 10 => 12.0,
        _ => 20.0,
    }
}

fn describe(temperature: f64, precipitation: f64, humidity: f64) -> &'static str {
    if temperature < -2.0 && precipitation > 0.0 {
        if temperature > -5.0 { "freezing rain" } else { "snow" }
    } else if temperature < 2.0 && humidity > 80.0 {
        "overcast, potential ice"
    } else if temperature < 0.0 {
        "clear, cold"
    } else {
        "partly cloudy"
    }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
