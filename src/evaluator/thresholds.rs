//! Named limits for every flight rule
//!
//! Defaults follow the published envelope of a small consumer quadcopter
//! (12 m/s wind resistance, -10..40 °C operating range) with reported surface
//! wind scaled up for flight altitude.

use serde::{Deserialize, Serialize};

use crate::models::Phenomenon;
use crate::{FlightCheckError, Result};

/// Complete rule configuration passed to the evaluator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub wind: WindThresholds,
    pub visibility: VisibilityThresholds,
    pub temperature: TemperatureThresholds,
    pub kp: KpThresholds,
    pub phenomena: PhenomenaThresholds,
    pub daylight: DaylightPolicy,
}

/// Wind limits in knots, compared against altitude-adjusted wind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindThresholds {
    /// Multiplier applied to reported surface wind and gusts
    pub altitude_factor: f64,
    /// Adjusted wind above this is CAUTION
    pub caution_above_kt: f64,
    /// Adjusted wind above this is NO-FLY
    pub no_fly_above_kt: f64,
    /// Adjusted gust above this is NO-FLY
    pub gust_no_fly_above_kt: f64,
}

impl Default for WindThresholds {
    fn default() -> Self {
        Self {
            altitude_factor: 1.25,
            caution_above_kt: 15.0,
            no_fly_above_kt: 23.5,
            gust_no_fly_above_kt: 26.0,
        }
    }
}

impl WindThresholds {
    /// Surface wind scaled to flight altitude
    #[must_use]
    pub fn adjusted_kt(&self, surface_kt: f64) -> f64 {
        surface_kt * self.altitude_factor
    }
}

/// Visibility limits in kilometers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityThresholds {
    /// Visibility below this is NO-FLY (3 statute miles)
    pub no_fly_below_km: f64,
    /// Visibility below this is CAUTION (5 statute miles)
    pub caution_below_km: f64,
}

impl Default for VisibilityThresholds {
    fn default() -> Self {
        Self {
            no_fly_below_km: 4.8,
            caution_below_km: 8.0,
        }
    }
}

/// Operating temperature range in Celsius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureThresholds {
    pub min_c: f64,
    pub max_c: f64,
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            min_c: -10.0,
            max_c: 40.0,
        }
    }
}

/// Kp limits, inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpThresholds {
    /// Kp at or above this is CAUTION
    pub caution_at: u8,
    /// Kp at or above this is NO-FLY
    pub no_fly_at: u8,
}

impl Default for KpThresholds {
    fn default() -> Self {
        Self {
            caution_at: 5,
            no_fly_at: 7,
        }
    }
}

/// Which present-weather categories ground the aircraft or call for caution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenomenaThresholds {
    pub no_fly: Vec<Phenomenon>,
    pub caution: Vec<Phenomenon>,
}

impl Default for PhenomenaThresholds {
    fn default() -> Self {
        Self {
            no_fly: vec![
                Phenomenon::Thunderstorm,
                Phenomenon::FreezingPrecipitation,
                Phenomenon::DenseFog,
                Phenomenon::Hail,
                Phenomenon::Squall,
                Phenomenon::FunnelCloud,
                Phenomenon::VolcanicAsh,
                Phenomenon::Duststorm,
            ],
            caution: vec![
                Phenomenon::Rain,
                Phenomenon::Drizzle,
                Phenomenon::Snow,
                Phenomenon::IcePellets,
                Phenomenon::UnknownPrecipitation,
                Phenomenon::ShallowFog,
                Phenomenon::Mist,
                Phenomenon::Smoke,
                Phenomenon::DustOrSand,
            ],
        }
    }
}

/// Night operations policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaylightPolicy {
    /// Downgrade "no daylight" from NO-FLY to CAUTION
    pub allow_night_flight: bool,
}

impl Thresholds {
    /// Reject threshold sets that cannot be evaluated meaningfully.
    pub fn check_consistency(&self) -> Result<()> {
        let wind = &self.wind;
        let all_finite = [
            wind.altitude_factor,
            wind.caution_above_kt,
            wind.no_fly_above_kt,
            wind.gust_no_fly_above_kt,
            self.visibility.no_fly_below_km,
            self.visibility.caution_below_km,
            self.temperature.min_c,
            self.temperature.max_c,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(FlightCheckError::evaluation(
                "thresholds must be finite numbers",
            ));
        }

        if wind.altitude_factor <= 0.0 {
            return Err(FlightCheckError::evaluation(format!(
                "wind altitude factor must be positive, got {}",
                wind.altitude_factor
            )));
        }
        if wind.caution_above_kt > wind.no_fly_above_kt {
            return Err(FlightCheckError::evaluation(format!(
                "wind caution limit {} kt is above the no-fly limit {} kt",
                wind.caution_above_kt, wind.no_fly_above_kt
            )));
        }
        if self.visibility.caution_below_km < self.visibility.no_fly_below_km {
            return Err(FlightCheckError::evaluation(format!(
                "visibility caution limit {} km is below the no-fly limit {} km",
                self.visibility.caution_below_km, self.visibility.no_fly_below_km
            )));
        }
        if self.temperature.min_c > self.temperature.max_c {
            return Err(FlightCheckError::evaluation(format!(
                "minimum temperature {} °C is above maximum {} °C",
                self.temperature.min_c, self.temperature.max_c
            )));
        }
        if self.kp.caution_at > self.kp.no_fly_at {
            return Err(FlightCheckError::evaluation(format!(
                "Kp caution level {} is above the no-fly level {}",
                self.kp.caution_at, self.kp.no_fly_at
            )));
        }
        if let Some(p) = self
            .phenomena
            .no_fly
            .iter()
            .find(|p| self.phenomena.caution.contains(p))
        {
            return Err(FlightCheckError::evaluation(format!(
                "'{p}' is listed as both no-fly and caution"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        assert!(Thresholds::default().check_consistency().is_ok());
    }

    #[test]
    fn test_inverted_wind_limits_rejected() {
        let mut thresholds = Thresholds::default();
        thresholds.wind.caution_above_kt = 30.0;
        let err = thresholds.check_consistency().unwrap_err();
        assert!(matches!(err, FlightCheckError::Evaluation { .. }));
        assert!(err.to_string().contains("wind caution limit"));
    }

    #[test]
    fn test_non_positive_factor_rejected() {
        let mut thresholds = Thresholds::default();
        thresholds.wind.altitude_factor = 0.0;
        assert!(thresholds.check_consistency().is_err());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut thresholds = Thresholds::default();
        thresholds.visibility.no_fly_below_km = f64::NAN;
        assert!(thresholds.check_consistency().is_err());
    }

    #[test]
    fn test_phenomenon_in_both_lists_rejected() {
        let mut thresholds = Thresholds::default();
        thresholds.phenomena.caution.push(Phenomenon::Thunderstorm);
        let err = thresholds.check_consistency().unwrap_err();
        assert!(err.to_string().contains("thunderstorm"));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let thresholds: Thresholds = toml::from_str(
            r#"
            [wind]
            no_fly_above_kt = 20.0

            [phenomena]
            no_fly = ["thunderstorm", "rain"]
            caution = []
            "#,
        )
        .unwrap();
        assert_eq!(thresholds.wind.no_fly_above_kt, 20.0);
        assert_eq!(thresholds.wind.caution_above_kt, 15.0);
        assert_eq!(thresholds.kp, KpThresholds::default());
        assert_eq!(
            thresholds.phenomena.no_fly,
            vec![Phenomenon::Thunderstorm, Phenomenon::Rain]
        );
    }
}
