//! Open-Meteo forecast and archive providers

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use super::WeatherProvider;
use crate::cache::WeatherCache;
use crate::config::{CacheConfig, WeatherConfig};
use crate::geo;
use crate::http;
use crate::models::{
    Coordinate, HistoricalWindow, ObservationSource, TemporalMode, WeatherObservation,
};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,rain,showers,\
                              snowfall,wind_speed_10m,weather_code";
const DAILY_FIELDS: &str = "temperature_2m_mean,relative_humidity_2m_mean,precipitation_sum,\
                            rain_sum,snowfall_sum,wind_speed_10m_max,weather_code";

/// Current conditions from the Open-Meteo forecast endpoint
pub struct ForecastWeather {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<WeatherCache>,
    ttl: Duration,
}

impl ForecastWeather {
    pub fn new(
        settings: &WeatherConfig,
        cache_settings: &CacheConfig,
        cache: Option<WeatherCache>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        Ok(Self {
            client: http::build_client(timeout, settings.max_retries)?,
            base_url: settings.forecast_url.trim_end_matches('/').to_string(),
            cache,
            ttl: Duration::from_secs(cache_settings.current_ttl_minutes * 60),
        })
    }

    fn url(&self, location: &Coordinate) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&current={}&wind_speed_unit=kmh&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            CURRENT_FIELDS,
            urlencoding::encode("GMT")
        )
    }
}

#[async_trait]
impl WeatherProvider for ForecastWeather {
    fn source(&self) -> ObservationSource {
        ObservationSource::Live
    }

    #[instrument(name = "forecast_observe", level = "debug", skip(self, _mode))]
    async fn observe(
        &self,
        location: &Coordinate,
        _mode: &TemporalMode,
    ) -> Result<WeatherObservation> {
        let key = location.cache_key(&Utc::now().format("%Y-%m-%dT%H").to_string());

        if let Some(cache) = &self.cache {
            match cache.get::<WeatherObservation>(&key).await {
                Ok(Some(observation)) => return Ok(observation),
                Ok(None) => {}
                Err(e) => warn!("Ignoring weather cache read failure: {e:#}"),
            }
        }

        let response: ForecastResponse = get_json(&self.client, &self.url(location)).await?;
        let observation = response
            .current
            .ok_or_else(|| anyhow!("Open-Meteo response has no current conditions"))?
            .into_observation();

        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(&key, observation.clone(), self.ttl).await
        {
            warn!("Ignoring weather cache write failure: {e:#}");
        }

        Ok(observation)
    }
}

type Dataset = Arc<Vec<ArchiveStation>>;

/// Historical conditions from the Open-Meteo archive, sampled on a station grid
pub struct ArchiveWeather {
    client: ClientWithMiddleware,
    base_url: String,
    grid_size: usize,
    cache: Option<WeatherCache>,
    ttl: Duration,
    /// One load per window even when many route points ask at once
    datasets: Mutex<HashMap<String, Arc<OnceCell<Dataset>>>>,
}

impl ArchiveWeather {
    pub fn new(
        settings: &WeatherConfig,
        cache_settings: &CacheConfig,
        cache: Option<WeatherCache>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        Ok(Self {
            client: http::build_client(timeout, settings.max_retries)?,
            base_url: settings.archive_url.trim_end_matches('/').to_string(),
            grid_size: settings.archive_grid_size,
            cache,
            ttl: Duration::from_secs(cache_settings.archive_ttl_hours * 3600),
            datasets: Mutex::new(HashMap::new()),
        })
    }

    async fn dataset(&self, window: &HistoricalWindow) -> Result<Dataset> {
        let cell = {
            let mut datasets = self.datasets.lock().unwrap_or_else(|e| e.into_inner());
            datasets.entry(window.cache_key()).or_default().clone()
        };
        let dataset = cell.get_or_try_init(|| self.load_dataset(window)).await?;
        Ok(dataset.clone())
    }

    #[instrument(name = "archive_dataset", skip(self), fields(region = %window.region))]
    async fn load_dataset(&self, window: &HistoricalWindow) -> Result<Dataset> {
        let key = window.cache_key();

        if let Some(cache) = &self.cache {
            match cache.get::<Vec<ArchiveStation>>(&key).await {
                Ok(Some(stations)) if !stations.is_empty() => return Ok(Arc::new(stations)),
                Ok(_) => {}
                Err(e) => warn!("Ignoring archive cache read failure: {e:#}"),
            }
        }

        let grid = window.bounds.grid(self.grid_size);
        let results = join_all(grid.iter().map(|point| self.fetch_station(*point, window))).await;

        let expected = results.len();
        let stations: Vec<ArchiveStation> = results
            .into_iter()
            .filter_map(|result| {
                result
                    .inspect_err(|e| warn!("Skipping archive station: {e:#}"))
                    .ok()
            })
            .collect();

        if stations.is_empty() {
            bail!("No archive station could be fetched for {}", window.region);
        }
        debug!("Fetched {}/{} archive stations", stations.len(), expected);

        // a partial grid is still usable for this process but is not worth keeping for weeks
        if stations.len() == expected
            && let Some(cache) = &self.cache
            && let Err(e) = cache.put(&key, stations.clone(), self.ttl).await
        {
            warn!("Ignoring archive cache write failure: {e:#}");
        }

        Ok(Arc::new(stations))
    }

    async fn fetch_station(
        &self,
        location: Coordinate,
        window: &HistoricalWindow,
    ) -> Result<ArchiveStation> {
        let url = format!(
            "{}/archive?latitude={}&longitude={}&start_date={}&end_date={}\
             &daily={}&wind_speed_unit=kmh&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            window.start,
            window.end,
            DAILY_FIELDS,
            urlencoding::encode("auto")
        );
        let response: ArchiveResponse = get_json(&self.client, &url).await?;
        let daily = response.daily.ok_or_else(|| {
            anyhow!(
                "Archive response for {} has no daily data",
                location.format_coordinates()
            )
        })?;

        Ok(ArchiveStation {
            location,
            days: daily.into_days(),
        })
    }
}

#[async_trait]
impl WeatherProvider for ArchiveWeather {
    fn source(&self) -> ObservationSource {
        ObservationSource::Archive
    }

    async fn observe(
        &self,
        location: &Coordinate,
        mode: &TemporalMode,
    ) -> Result<WeatherObservation> {
        let TemporalMode::Historical(window) = mode else {
            bail!("Archive weather needs a historical window");
        };

        let dataset = self.dataset(window).await?;
        let station = geo::nearest(location, &dataset, |station| station.location)
            .ok_or_else(|| anyhow!("Empty archive dataset for {}", window.region))?;

        station.summarize()
    }
}

async fn get_json<T: DeserializeOwned>(client: &ClientWithMiddleware, url: &str) -> Result<T> {
    debug!("Open-Meteo request URL: {}", url);
    client
        .get(url)
        .send()
        .await
        .with_context(|| "Open-Meteo request failed")?
        .error_for_status()
        .with_context(|| "Open-Meteo returned an error status")?
        .json()
        .await
        .with_context(|| "Failed to parse Open-Meteo response")
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    #[serde(rename = "temperature_2m")]
    temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    humidity: Option<f64>,
    precipitation: Option<f64>,
    rain: Option<f64>,
    showers: Option<f64>,
    /// Centimeters
    snowfall: Option<f64>,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: Option<f64>,
    weather_code: Option<u8>,
}

impl CurrentData {
    fn into_observation(self) -> WeatherObservation {
        let liquid = match (self.rain, self.showers) {
            (None, None) => self.precipitation.unwrap_or(0.0),
            (rain, showers) => rain.unwrap_or(0.0) + showers.unwrap_or(0.0),
        };

        WeatherObservation {
            temperature: self.temperature,
            humidity: self.humidity.unwrap_or(0.0),
            precipitation: liquid,
            snowfall: self.snowfall.map(|cm| cm * 10.0),
            wind_speed: self.wind_speed.unwrap_or(0.0),
            description: self
                .weather_code
                .map_or("Unknown", weather_code_to_description)
                .to_string(),
            source: ObservationSource::Live,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailyData>,
}

#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m_mean")]
    temperature_mean: Option<Vec<Option<f64>>>,
    #[serde(rename = "relative_humidity_2m_mean")]
    humidity_mean: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
    rain_sum: Option<Vec<Option<f64>>>,
    snowfall_sum: Option<Vec<Option<f64>>>,
    #[serde(rename = "wind_speed_10m_max")]
    wind_speed_max: Option<Vec<Option<f64>>>,
    weather_code: Option<Vec<Option<u8>>>,
}

impl DailyData {
    fn into_days(self) -> Vec<ArchiveDay> {
        fn at<T: Copy>(series: &Option<Vec<Option<T>>>, i: usize) -> Option<T> {
            series.as_ref().and_then(|values| values.get(i).copied().flatten())
        }

        (0..self.time.len())
            .map(|i| ArchiveDay {
                temperature_mean: at(&self.temperature_mean, i),
                humidity_mean: at(&self.humidity_mean, i),
                precipitation: at(&self.precipitation_sum, i),
                rain: at(&self.rain_sum, i),
                snowfall_cm: at(&self.snowfall_sum, i),
                wind_speed_max: at(&self.wind_speed_max, i),
                weather_code: at(&self.weather_code, i),
            })
            .collect()
    }
}

/// One grid point of an archive dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ArchiveStation {
    location: Coordinate,
    days: Vec<ArchiveDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ArchiveDay {
    temperature_mean: Option<f64>,
    humidity_mean: Option<f64>,
    precipitation: Option<f64>,
    rain: Option<f64>,
    snowfall_cm: Option<f64>,
    wind_speed_max: Option<f64>,
    weather_code: Option<u8>,
}

impl ArchiveStation {
    /// Reduce the window to one observation: means for temperature and humidity,
    /// daily maxima for precipitation, snowfall and wind
    fn summarize(&self) -> Result<WeatherObservation> {
        let station = self.location.format_coordinates();
        let temperature = mean(self.days.iter().filter_map(|d| d.temperature_mean))
            .ok_or_else(|| anyhow!("Archive station {station} has no temperatures"))?;
        let humidity = mean(self.days.iter().filter_map(|d| d.humidity_mean))
            .ok_or_else(|| anyhow!("Archive station {station} has no humidity"))?;

        let precipitation =
            max(self.days.iter().filter_map(|d| d.rain.or(d.precipitation))).unwrap_or(0.0);
        let snowfall =
            max(self.days.iter().filter_map(|d| d.snowfall_cm)).map(|cm| round(cm * 10.0));
        let wind_speed =
            max(self.days.iter().filter_map(|d| d.wind_speed_max)).unwrap_or(0.0);
        let description = self
            .days
            .iter()
            .filter_map(|d| d.weather_code)
            .max()
            .map_or("Unknown", weather_code_to_description);

        Ok(WeatherObservation {
            temperature: round(temperature),
            humidity: round(humidity),
            precipitation: round(precipitation),
            snowfall,
            wind_speed: round(wind_speed),
            description: description.to_string(),
            source: ObservationSource::Archive,
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

fn round(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
