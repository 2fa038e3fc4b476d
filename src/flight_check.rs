//! Flight check pipeline
//!
//! Collects every input the evaluator needs for one location and instant and
//! returns the full report. Provider failures are passed through unchanged;
//! there is no fallback to default readings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::Result;
use crate::api::HttpClient;
use crate::config::FlightCheckConfig;
use crate::daylight::{DaylightCalculator, SolarDaylight};
use crate::evaluator::FlightSafetyEvaluator;
use crate::models::{Assessment, DaylightStatus, Location, SpaceWeather, WeatherObservation};
use crate::space_weather::{SpaceWeatherProvider, SwpcKpClient};
use crate::weather::{ConfiguredWeather, WeatherProvider};

/// Everything that went into one verdict
#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub location: Location,
    pub aircraft: String,
    pub evaluated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub assessment: Assessment,
    pub weather: WeatherObservation,
    /// Reported wind scaled to flight altitude
    pub adjusted_wind_kt: f64,
    pub adjusted_gust_kt: Option<f64>,
    pub space_weather: SpaceWeather,
    pub daylight: DaylightStatus,
}

pub struct FlightCheck<W, S, D> {
    weather: W,
    space_weather: S,
    daylight: D,
    evaluator: FlightSafetyEvaluator,
    aircraft: String,
}

/// The pipeline wired to the live providers
pub type LiveFlightCheck = FlightCheck<ConfiguredWeather, SwpcKpClient, SolarDaylight>;

impl<W, S, D> FlightCheck<W, S, D>
where
    W: WeatherProvider,
    S: SpaceWeatherProvider,
    D: DaylightCalculator,
{
    pub fn new(weather: W, space_weather: S, daylight: D, evaluator: FlightSafetyEvaluator) -> Self {
        Self {
            weather,
            space_weather,
            daylight,
            evaluator,
            aircraft: String::new(),
        }
    }

    #[must_use]
    pub fn with_aircraft<N: Into<String>>(mut self, aircraft: N) -> Self {
        self.aircraft = aircraft.into();
        self
    }

    #[must_use]
    pub fn evaluator(&self) -> &FlightSafetyEvaluator {
        &self.evaluator
    }

    /// Run one check for `location` at `now`.
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    pub fn run(&self, location: Location, now: DateTime<Utc>) -> Result<FlightReport> {
        location.validate()?;

        let space_weather = self.space_weather.current_kp()?;
        debug!("Space weather: {}", space_weather.format_kp());

        let weather = self.weather.nearest_observation(&location, now)?;
        debug!(
            "Weather from {} ({:.1} km): wind {}, visibility {}",
            weather.station_id,
            weather.distance_km,
            weather.format_wind(),
            weather.format_visibility()
        );

        let daylight = self.daylight.daylight(&location, now)?;
        debug!("Daylight: {}", daylight.is_daylight);

        let assessment = self
            .evaluator
            .evaluate(&location, &weather, &space_weather, &daylight, now)?;
        info!(
            "Verdict {} for {} ({} reasons)",
            assessment.verdict,
            location.format_coordinates(),
            assessment.reasons.len()
        );

        let wind = &self.evaluator.thresholds().wind;
        Ok(FlightReport {
            location,
            aircraft: self.aircraft.clone(),
            evaluated_at: now,
            assessment,
            adjusted_wind_kt: wind.adjusted_kt(weather.wind_speed_kt),
            adjusted_gust_kt: weather.wind_gust_kt.map(|g| wind.adjusted_kt(g)),
            weather,
            space_weather,
            daylight,
        })
    }
}

impl LiveFlightCheck {
    /// Build the pipeline from configuration.
    ///
    /// `allow_night_flight` turns the night rule into a caution on top of
    /// whatever the config file says.
    pub fn from_config(config: &FlightCheckConfig, allow_night_flight: bool) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;

        let mut thresholds = config.thresholds.clone();
        thresholds.daylight.allow_night_flight |= allow_night_flight;
        let evaluator = FlightSafetyEvaluator::new(thresholds, config.freshness());

        let weather = ConfiguredWeather::from_config(&config.weather, http.clone());
        let space_weather = SwpcKpClient::new(http, &config.space_weather.kp_url);

        Ok(FlightCheck::new(weather, space_weather, SolarDaylight, evaluator)
            .with_aircraft(config.aircraft.clone()))
    }
}
