//! Weather providers
//!
//! Live and archive observations come from Open-Meteo. The [`WeatherAdapter`]
//! hides provider failures from the rest of the pipeline: whatever goes wrong,
//! a caller always gets an observation back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::WeatherCache;
use crate::config::{IcyRouteConfig, WeatherProviderKind};
use crate::models::{Coordinate, ObservationSource, TemporalMode, WeatherObservation};

pub mod open_meteo;
pub mod simulator;

pub use open_meteo::{ArchiveWeather, ForecastWeather};
pub use simulator::SimulatedWeather;

/// Source of weather observations for a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn source(&self) -> ObservationSource;

    async fn observe(
        &self,
        location: &Coordinate,
        mode: &TemporalMode,
    ) -> Result<WeatherObservation>;
}

/// Dispatches observations by temporal mode and falls back to the simulator
pub struct WeatherAdapter {
    current: Arc<dyn WeatherProvider>,
    historical: Arc<dyn WeatherProvider>,
    simulator: Arc<SimulatedWeather>,
    timeout: Duration,
}

impl WeatherAdapter {
    pub fn new(
        current: Arc<dyn WeatherProvider>,
        historical: Arc<dyn WeatherProvider>,
        simulator: Arc<SimulatedWeather>,
        timeout: Duration,
    ) -> Self {
        Self {
            current,
            historical,
            simulator,
            timeout,
        }
    }

    /// Adapter that serves every mode from the simulator
    pub fn simulated(simulator: Arc<SimulatedWeather>) -> Self {
        Self {
            current: simulator.clone(),
            historical: simulator.clone(),
            simulator,
            timeout: Duration::from_secs(1),
        }
    }

    /// Build the adapter described by the weather section of the configuration
    pub fn from_config(config: &IcyRouteConfig, cache: Option<WeatherCache>) -> Result<Self> {
        let settings = &config.weather;
        let simulator = Arc::new(SimulatedWeather::new(settings.simulator_seed));

        match settings.provider {
            WeatherProviderKind::Simulated => Ok(Self::simulated(simulator)),
            WeatherProviderKind::Live => {
                let current = ForecastWeather::new(settings, &config.cache, cache.clone())?;
                let historical = ArchiveWeather::new(settings, &config.cache, cache)?;
                // the HTTP client retries inside this budget
                let budget = settings.timeout_seconds * (u64::from(settings.max_retries) + 1);
                Ok(Self::new(
                    Arc::new(current),
                    Arc::new(historical),
                    simulator,
                    Duration::from_secs(budget),
                ))
            }
        }
    }

    /// Observe the weather at `location`, never fails
    pub async fn observe(&self, location: &Coordinate, mode: &TemporalMode) -> WeatherObservation {
        let provider = match mode {
            TemporalMode::Current => &self.current,
            TemporalMode::Historical(_) => &self.historical,
        };

        match tokio::time::timeout(self.timeout, provider.observe(location, mode)).await {
            Ok(Ok(observation)) => {
                debug!(
                    "Observed {} at {} ({:?})",
                    observation.format_temperature(),
                    location.format_coordinates(),
                    observation.source
                );
                observation
            }
            Ok(Err(e)) => {
                warn!(
                    "Weather provider {:?} failed at {}, using simulator: {e:#}",
                    provider.source(),
                    location.format_coordinates()
                );
                self.simulator.simulate(location, mode)
            }
            Err(_) => {
                warn!(
                    "Weather provider {:?} timed out after {:?} at {}, using simulator",
                    provider.source(),
                    self.timeout,
                    location.format_coordinates()
                );
                self.simulator.simulate(location, mode)
            }
        }
    }
}
