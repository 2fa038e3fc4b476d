//! Configuration management for `flightcheck`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::FlightCheckError;
use crate::evaluator::{Freshness, Thresholds};
use crate::models::Location;
use crate::weather::WeatherProviderKind;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightCheckConfig {
    /// Aircraft profile name shown in reports
    #[serde(default = "default_aircraft")]
    pub aircraft: String,
    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Surface observation provider
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Kp index provider
    #[serde(default)]
    pub space_weather: SpaceWeatherConfig,
    /// Flight rule limits
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Report display settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Default coordinates when none are given on the command line
    #[serde(default)]
    pub location: Option<Location>,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent with every request (required by api.weather.gov)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further attempt
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

/// Weather observation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Which provider to query
    #[serde(default)]
    pub provider: WeatherProviderKind,
    /// Base URL of the Aviation Weather Center data API
    #[serde(default = "default_aviationweather_url")]
    pub aviationweather_url: String,
    /// Base URL of the NWS API
    #[serde(default = "default_nws_url")]
    pub nws_url: String,
    /// Maximum distance to the reporting station in kilometers.
    /// Searches crossing the antimeridian are split into two queries.
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,
    /// Stations whose latest observation is older than this are skipped;
    /// when no station is fresh the check cannot be evaluated
    #[serde(default = "default_observation_age")]
    pub max_observation_age_minutes: u32,
}

/// Kp index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceWeatherConfig {
    /// NOAA SWPC planetary K-index feed
    #[serde(default = "default_kp_url")]
    pub kp_url: String,
    /// Readings older than this are rejected
    #[serde(default = "default_kp_age")]
    pub max_age_minutes: u32,
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

/// Report display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA timezone for sunrise, sunset and observation times
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

// Default value functions
fn default_aircraft() -> String {
    "DJI Mavic Pro".to_string()
}

fn default_user_agent() -> String {
    concat!("flightcheck/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> u32 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_aviationweather_url() -> String {
    "https://aviationweather.gov".to_string()
}

fn default_nws_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_search_radius() -> f64 {
    50.0
}

fn default_observation_age() -> u32 {
    Freshness::default().max_observation_age_minutes
}

fn default_kp_url() -> String {
    "https://services.swpc.noaa.gov/json/planetary_k_index_1m.json".to_string()
}

fn default_kp_age() -> u32 {
    Freshness::default().max_kp_age_minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: WeatherProviderKind::default(),
            aviationweather_url: default_aviationweather_url(),
            nws_url: default_nws_url(),
            search_radius_km: default_search_radius(),
            max_observation_age_minutes: default_observation_age(),
        }
    }
}

impl Default for SpaceWeatherConfig {
    fn default() -> Self {
        Self {
            kp_url: default_kp_url(),
            max_age_minutes: default_kp_age(),
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

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for FlightCheckConfig {
    fn default() -> Self {
        Self {
            aircraft: default_aircraft(),
            http: HttpConfig::default(),
            weather: WeatherConfig::default(),
            space_weather: SpaceWeatherConfig::default(),
            thresholds: Thresholds::default(),
            logging: LoggingConfig::default(),
            display: DisplayConfig::default(),
            location: None,
        }
    }
}

impl FlightCheckConfig {
    /// Load configuration from `config_path`, or the default file when `None`,
    /// then apply `FLIGHTCHECK_*` environment overrides.
    pub fn load_from_path(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = Self::resolve_path(config_path);
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        } else if config_path.is_some() {
            return Err(FlightCheckError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        // Environment overrides, e.g. FLIGHTCHECK_HTTP__TIMEOUT_SECONDS=30
        builder = builder.add_source(
            Environment::with_prefix("FLIGHTCHECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FlightCheckConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// The file `load_from_path` reads for the given override
    #[must_use]
    pub fn resolve_path(config_path: Option<&Path>) -> PathBuf {
        config_path.map_or_else(
            || Self::get_config_path().unwrap_or_else(|| PathBuf::from("flightcheck.toml")),
            Path::to_path_buf,
        )
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flightcheck").join("config.toml"))
    }

    /// Apply default values to empty or zero configuration fields
    pub fn apply_defaults(&mut self) {
        if self.aircraft.trim().is_empty() {
            self.aircraft = default_aircraft();
        }
        if self.http.user_agent.trim().is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_timeout();
        }
        if self.weather.aviationweather_url.is_empty() {
            self.weather.aviationweather_url = default_aviationweather_url();
        }
        if self.weather.nws_url.is_empty() {
            self.weather.nws_url = default_nws_url();
        }
        if self.space_weather.kp_url.is_empty() {
            self.space_weather.kp_url = default_kp_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.display.timezone.is_empty() {
            self.display.timezone = default_timezone();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.thresholds
            .check_consistency()
            .with_context(|| "Invalid [thresholds] section")?;
        if let Some(location) = &self.location {
            location
                .validate()
                .with_context(|| "Invalid [location] section")?;
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(FlightCheckError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(FlightCheckError::config("HTTP max retries cannot exceed 10").into());
        }

        if !self.weather.search_radius_km.is_finite()
            || self.weather.search_radius_km <= 0.0
            || self.weather.search_radius_km > 500.0
        {
            return Err(FlightCheckError::config(format!(
                "Search radius must be between 0 and 500 km, got {}",
                self.weather.search_radius_km
            ))
            .into());
        }

        if self.weather.max_observation_age_minutes == 0
            || self.space_weather.max_age_minutes == 0
        {
            return Err(FlightCheckError::config("Maximum data ages must be at least one minute").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FlightCheckError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FlightCheckError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("weather.aviationweather_url", &self.weather.aviationweather_url),
            ("weather.nws_url", &self.weather.nws_url),
            ("space_weather.kp_url", &self.space_weather.kp_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FlightCheckError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        self.timezone()?;
        Ok(())
    }

    /// Display timezone parsed from `[display] timezone`
    pub fn timezone(&self) -> Result<Tz> {
        self.display
            .timezone
            .parse::<Tz>()
            .map_err(|_| FlightCheckError::config(format!("Unknown timezone '{}'", self.display.timezone)).into())
    }

    /// Maximum input ages for the evaluator
    #[must_use]
    pub fn freshness(&self) -> Freshness {
        Freshness {
            max_observation_age_minutes: self.weather.max_observation_age_minutes,
            max_kp_age_minutes: self.space_weather.max_age_minutes,
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration")
    }
}
