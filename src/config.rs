//! Configuration management for IcyRoute
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::IcyRouteError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for IcyRoute
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IcyRouteConfig {
    /// Web server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Routing provider settings
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Route sampling intervals
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Routing provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directions API key, without one no routes are returned
    pub api_key: Option<String>,
    #[serde(default = "default_routing_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_routing_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of distinct base routes to assess
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    /// Also request routes avoiding highways and tolls
    #[serde(default = "default_distinct_geometries")]
    pub distinct_geometries: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProviderKind {
    #[default]
    Simulated,
    Live,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub provider: WeatherProviderKind,
    /// Base URL of the forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Base URL of the historical archive API
    #[serde(default = "default_archive_url")]
    pub archive_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// Stations per side of the archive sampling grid
    #[serde(default = "default_archive_grid_size")]
    pub archive_grid_size: usize,
    /// Fixed simulator seed for reproducible runs
    pub simulator_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Spacing for historical event corridors
    #[serde(default = "default_fine_interval")]
    pub fine_interval_km: f64,
    /// Spacing for everything else
    #[serde(default = "default_coarse_interval")]
    pub coarse_interval_km: f64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// TTL of live current observations in minutes
    #[serde(default = "default_current_ttl")]
    pub current_ttl_minutes: u64,
    /// TTL of archive datasets in hours
    #[serde(default = "default_archive_ttl")]
    pub archive_ttl_hours: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

fn default_routing_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_routing_timeout() -> u64 {
    10
}

fn default_max_alternatives() -> usize {
    3
}

fn default_distinct_geometries() -> bool {
    true
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_archive_url() -> String {
    "https://archive-api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u64 {
    5
}

fn default_weather_max_retries() -> u32 {
    2
}

fn default_archive_grid_size() -> usize {
    3
}

fn default_fine_interval() -> f64 {
    25.0
}

fn default_coarse_interval() -> f64 {
    50.0
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_location() -> String {
    "~/.cache/icyroute".to_string()
}

fn default_current_ttl() -> u64 {
    30
}

fn default_archive_ttl() -> u64 {
    720
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_routing_base_url(),
            timeout_seconds: default_routing_timeout(),
            max_alternatives: default_max_alternatives(),
            distinct_geometries: default_distinct_geometries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: WeatherProviderKind::default(),
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: default_weather_max_retries(),
            archive_grid_size: default_archive_grid_size(),
            simulator_seed: None,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            fine_interval_km: default_fine_interval(),
            coarse_interval_km: default_coarse_interval(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            location: default_cache_location(),
            current_ttl_minutes: default_current_ttl(),
            archive_ttl_hours: default_archive_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl IcyRouteConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ICYROUTE_ROUTING__API_KEY -> routing.api_key
        builder = builder.add_source(
            Environment::with_prefix("ICYROUTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: IcyRouteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("icyroute").join("config.toml"))
    }

    /// Apply default values to empty or zero configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
        if self.routing.base_url.is_empty() {
            self.routing.base_url = default_routing_base_url();
        }
        if self.routing.timeout_seconds == 0 {
            self.routing.timeout_seconds = default_routing_timeout();
        }
        if self.routing.max_alternatives == 0 {
            self.routing.max_alternatives = default_max_alternatives();
        }
        if self.weather.forecast_url.is_empty() {
            self.weather.forecast_url = default_forecast_url();
        }
        if self.weather.archive_url.is_empty() {
            self.weather.archive_url = default_archive_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.archive_grid_size == 0 {
            self.weather.archive_grid_size = default_archive_grid_size();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.current_ttl_minutes == 0 {
            self.cache.current_ttl_minutes = default_current_ttl();
        }
        if self.cache.archive_ttl_hours == 0 {
            self.cache.archive_ttl_hours = default_archive_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.routing.api_key {
            if api_key.is_empty() {
                return Err(IcyRouteError::config(
                    "Routing API key cannot be empty if provided. Remove it or set a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(IcyRouteError::config(
                    "Routing API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, seconds) in [
            ("Routing", self.routing.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
        ] {
            if !(1..=60).contains(&seconds) {
                return Err(IcyRouteError::config(format!(
                    "{name} API timeout must be between 1 and 60 seconds"
                ))
                .into());
            }
        }

        if !(1..=5).contains(&self.routing.max_alternatives) {
            return Err(
                IcyRouteError::config("Routing max alternatives must be between 1 and 5").into(),
            );
        }

        if self.weather.max_retries > 5 {
            return Err(IcyRouteError::config("Weather API max retries cannot exceed 5").into());
        }

        if !(1..=5).contains(&self.weather.archive_grid_size) {
            return Err(IcyRouteError::config("Archive grid size must be between 1 and 5").into());
        }

        if self.sampling.fine_interval_km <= 0.0 || self.sampling.coarse_interval_km <= 0.0 {
            return Err(IcyRouteError::config("Sampling intervals must be positive").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(IcyRouteError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(IcyRouteError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Routing", &self.routing.base_url),
            ("Forecast", &self.weather.forecast_url),
            ("Archive", &self.weather.archive_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(IcyRouteError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
