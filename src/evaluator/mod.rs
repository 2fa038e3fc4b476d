//! Flight Safety Evaluator
//!
//! Pure rule evaluation: given a location, the latest surface observation, a Kp
//! reading, the daylight status and the evaluation instant, produce an
//! [`Assessment`]. No I/O and no clock reads happen here.
//!
//! Rules run in a fixed order (wind, gusts, visibility, present weather,
//! temperature, Kp, daylight) and every triggered rule is kept. The verdict is
//! the most severe severity among them.

pub mod thresholds;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    Assessment, DaylightStatus, Location, Reason, Rule, SpaceWeather, Verdict, WeatherObservation,
};
use crate::{FlightCheckError, Result};

pub use thresholds::Thresholds;

/// Tolerated clock difference for readings timestamped slightly in the future
const CLOCK_SKEW_MINUTES: i64 = 10;

/// Maximum accepted age of each input, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub max_observation_age_minutes: u32,
    pub max_kp_age_minutes: u32,
}

impl Default for Freshness {
    fn default() -> Self {
        Self {
            max_observation_age_minutes: 60,
            max_kp_age_minutes: 180,
        }
    }
}

/// Returns `true` if `observed_at` is strictly older than `max_age_minutes`.
///
/// A reading exactly at the threshold is still fresh.
#[must_use]
pub fn is_stale_at(observed_at: DateTime<Utc>, max_age_minutes: u32, now: DateTime<Utc>) -> bool {
    now - observed_at > Duration::minutes(i64::from(max_age_minutes))
}

#[derive(Debug, Clone, Default)]
pub struct FlightSafetyEvaluator {
    thresholds: Thresholds,
    freshness: Freshness,
}

impl FlightSafetyEvaluator {
    #[must_use]
    pub fn new(thresholds: Thresholds, freshness: Freshness) -> Self {
        Self {
            thresholds,
            freshness,
        }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Evaluate every rule and aggregate the result.
    ///
    /// Fails with `InvalidInput` for bad coordinates, `DataUnavailable` for
    /// stale or implausible readings and `Evaluation` for an inconsistent
    /// threshold set. Never returns a verdict for inputs it could not check.
    pub fn evaluate(
        &self,
        location: &Location,
        weather: &WeatherObservation,
        space_weather: &SpaceWeather,
        daylight: &DaylightStatus,
        now: DateTime<Utc>,
    ) -> Result<Assessment> {
        location.validate()?;
        self.thresholds.check_consistency()?;
        self.check_observation(weather, now)?;
        self.check_space_weather(space_weather, now)?;

        let mut reasons = Vec::new();
        self.wind_rules(weather, &mut reasons);
        self.visibility_rules(weather, &mut reasons);
        self.weather_rules(weather, &mut reasons);
        self.temperature_rules(weather, &mut reasons);
        self.kp_rules(space_weather, &mut reasons);
        self.daylight_rules(daylight, &mut reasons);

        let assessment = Assessment::from_reasons(reasons);
        debug!(
            verdict = %assessment.verdict,
            reasons = ?assessment.labels(),
            "evaluation complete"
        );
        Ok(assessment)
    }

    fn check_observation(&self, weather: &WeatherObservation, now: DateTime<Utc>) -> Result<()> {
        let source = format!("weather station {}", weather.station_id);
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if !non_negative(weather.wind_speed_kt) {
            return Err(FlightCheckError::data_unavailable(
                source,
                format!("implausible wind speed {}", weather.wind_speed_kt),
            ));
        }
        if let Some(gust) = weather.wind_gust_kt.filter(|g| !non_negative(*g)) {
            return Err(FlightCheckError::data_unavailable(
                source,
                format!("implausible wind gust {gust}"),
            ));
        }
        if !non_negative(weather.visibility_km) {
            return Err(FlightCheckError::data_unavailable(
                source,
                format!("implausible visibility {}", weather.visibility_km),
            ));
        }
        if weather.temperature_c.is_some_and(|t| !t.is_finite()) {
            return Err(FlightCheckError::data_unavailable(
                source,
                "temperature is not a number",
            ));
        }

        check_age(
            &source,
            weather.observed_at,
            self.freshness.max_observation_age_minutes,
            now,
        )
    }

    fn check_space_weather(&self, space_weather: &SpaceWeather, now: DateTime<Utc>) -> Result<()> {
        if space_weather.kp_index > SpaceWeather::MAX_KP {
            return Err(FlightCheckError::data_unavailable(
                "Kp index",
                format!("Kp {} is outside 0-9", space_weather.kp_index),
            ));
        }
        check_age(
            "Kp index",
            space_weather.observed_at,
            self.freshness.max_kp_age_minutes,
            now,
        )
    }

    fn wind_rules(&self, weather: &WeatherObservation, reasons: &mut Vec<Reason>) {
        let limits = &self.thresholds.wind;
        let adjusted = limits.adjusted_kt(weather.wind_speed_kt);

        if adjusted > limits.no_fly_above_kt {
            reasons.push(Reason::new(
                Rule::HighWind,
                Verdict::NoFly,
                format!(
                    "wind {adjusted:.1} kt at altitude ({:.1} kt reported) exceeds {:.1} kt",
                    weather.wind_speed_kt, limits.no_fly_above_kt
                ),
            ));
        } else if adjusted > limits.caution_above_kt {
            reasons.push(Reason::new(
                Rule::ElevatedWind,
                Verdict::Caution,
                format!(
                    "wind {adjusted:.1} kt at altitude ({:.1} kt reported) exceeds {:.1} kt",
                    weather.wind_speed_kt, limits.caution_above_kt
                ),
            ));
        }

        if let Some(gust) = weather.wind_gust_kt {
            let adjusted_gust = limits.adjusted_kt(gust);
            if adjusted_gust > limits.gust_no_fly_above_kt {
                reasons.push(Reason::new(
                    Rule::HighGusts,
                    Verdict::NoFly,
                    format!(
                        "gusts {adjusted_gust:.1} kt at altitude ({gust:.1} kt reported) exceed {:.1} kt",
                        limits.gust_no_fly_above_kt
                    ),
                ));
            }
        }
    }

    fn visibility_rules(&self, weather: &WeatherObservation, reasons: &mut Vec<Reason>) {
        let limits = &self.thresholds.visibility;
        if weather.visibility_km < limits.no_fly_below_km {
            reasons.push(Reason::new(
                Rule::LowVisibility,
                Verdict::NoFly,
                format!(
                    "visibility {:.1} km is below {:.1} km",
                    weather.visibility_km, limits.no_fly_below_km
                ),
            ));
        } else if weather.visibility_km < limits.caution_below_km {
            reasons.push(Reason::new(
                Rule::ReducedVisibility,
                Verdict::Caution,
                format!(
                    "visibility {:.1} km is below {:.1} km",
                    weather.visibility_km, limits.caution_below_km
                ),
            ));
        }
    }

    fn weather_rules(&self, weather: &WeatherObservation, reasons: &mut Vec<Reason>) {
        let lists = &self.thresholds.phenomena;
        for phenomenon in &weather.phenomena {
            let severity = if lists.no_fly.contains(phenomenon) {
                Verdict::NoFly
            } else if lists.caution.contains(phenomenon) {
                Verdict::Caution
            } else {
                continue;
            };
            reasons.push(Reason::new(
                Rule::Weather(*phenomenon),
                severity,
                format!("{phenomenon} reported at {}", weather.station_id),
            ));
        }
    }

    fn temperature_rules(&self, weather: &WeatherObservation, reasons: &mut Vec<Reason>) {
        let limits = &self.thresholds.temperature;
        if let Some(t) = weather
            .temperature_c
            .filter(|t| !(limits.min_c..=limits.max_c).contains(t))
        {
            reasons.push(Reason::new(
                Rule::TemperatureOutOfRange,
                Verdict::NoFly,
                format!(
                    "temperature {t:.1} °C is outside {:.0}..{:.0} °C",
                    limits.min_c, limits.max_c
                ),
            ));
        }
    }

    fn kp_rules(&self, space_weather: &SpaceWeather, reasons: &mut Vec<Reason>) {
        let limits = &self.thresholds.kp;
        let kp = space_weather.kp_index;
        if kp >= limits.no_fly_at {
            reasons.push(Reason::new(
                Rule::HighKp,
                Verdict::NoFly,
                format!(
                    "Kp {kp} reaches {}; compass and GPS interference likely",
                    limits.no_fly_at
                ),
            ));
        } else if kp >= limits.caution_at {
            reasons.push(Reason::new(
                Rule::ElevatedKp,
                Verdict::Caution,
                format!(
                    "Kp {kp} reaches {}; GPS accuracy may degrade",
                    limits.caution_at
                ),
            ));
        }
    }

    fn daylight_rules(&self, daylight: &DaylightStatus, reasons: &mut Vec<Reason>) {
        if daylight.is_daylight {
            return;
        }
        let detail = match (daylight.sunrise, daylight.sunset) {
            (Some(sunrise), Some(sunset)) => format!(
                "sun is below the horizon (sunrise {}, sunset {} UTC)",
                sunrise.format("%H:%M"),
                sunset.format("%H:%M")
            ),
            _ => "sun does not rise today".to_string(),
        };
        if self.thresholds.daylight.allow_night_flight {
            reasons.push(Reason::new(Rule::NightFlight, Verdict::Caution, detail));
        } else {
            reasons.push(Reason::new(Rule::NoDaylight, Verdict::NoFly, detail));
        }
    }
}

fn check_age(source: &str, observed_at: DateTime<Utc>, max_age_minutes: u32, now: DateTime<Utc>) -> Result<()> {
    if is_stale_at(observed_at, max_age_minutes, now) {
        return Err(FlightCheckError::data_unavailable(
            source,
            format!(
                "latest reading is {} minutes old (limit {max_age_minutes})",
                (now - observed_at).num_minutes()
            ),
        ));
    }
    if observed_at - now > Duration::minutes(CLOCK_SKEW_MINUTES) {
        return Err(FlightCheckError::data_unavailable(
            source,
            format!("reading is timestamped in the future ({observed_at})"),
        ));
    }
    Ok(())
}
