//! Surface weather observation providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::api::HttpClient;
use crate::config::WeatherConfig;
use crate::models::{Location, WeatherObservation};

pub mod aviation_weather;
pub mod metar;
pub mod nws;

pub use aviation_weather::AviationWeatherClient;
pub use nws::NwsClient;

/// Source of the latest surface observation near a location
pub trait WeatherProvider {
    /// Nearest station report within the search radius that is fresh at `now`
    fn nearest_observation(&self, location: &Location, now: DateTime<Utc>) -> Result<WeatherObservation>;
}

/// Which stations count as candidates for a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationSearch {
    pub radius_km: f64,
    /// Reports older than this are skipped in favour of farther stations
    pub max_age_minutes: u32,
}

impl From<&WeatherConfig> for StationSearch {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            radius_km: config.search_radius_km,
            max_age_minutes: config.max_observation_age_minutes,
        }
    }
}

/// Which observation service to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProviderKind {
    /// Aviation Weather Center METAR feed, worldwide
    #[default]
    AviationWeather,
    /// api.weather.gov station observations, US only
    Nws,
}

impl std::fmt::Display for WeatherProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherProviderKind::AviationWeather => write!(f, "aviationweather"),
            WeatherProviderKind::Nws => write!(f, "nws"),
        }
    }
}

/// The provider chosen by the `[weather]` configuration section
pub enum ConfiguredWeather {
    AviationWeather(AviationWeatherClient),
    Nws(NwsClient),
}

impl ConfiguredWeather {
    #[must_use]
    pub fn from_config(config: &WeatherConfig, http: HttpClient) -> Self {
        let search = StationSearch::from(config);
        match config.provider {
            WeatherProviderKind::AviationWeather => Self::AviationWeather(
                AviationWeatherClient::new(http, &config.aviationweather_url, search),
            ),
            WeatherProviderKind::Nws => Self::Nws(NwsClient::new(http, &config.nws_url, search)),
        }
    }
}

impl WeatherProvider for ConfiguredWeather {
    fn nearest_observation(&self, location: &Location, now: DateTime<Utc>) -> Result<WeatherObservation> {
        match self {
            ConfiguredWeather::AviationWeather(client) => client.nearest_observation(location, now),
            ConfiguredWeather::Nws(client) => client.nearest_observation(location, now),
        }
    }
}
