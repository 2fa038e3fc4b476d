//! Weather observation model and display methods

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Knots per meter/second
pub const KNOTS_PER_MS: f64 = 1.943_844;
/// Kilometers per statute mile
pub const KM_PER_STATUTE_MILE: f64 = 1.609_344;

/// Present-weather category derived from coded METAR weather groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phenomenon {
    Thunderstorm,
    FreezingPrecipitation,
    DenseFog,
    ShallowFog,
    Mist,
    Haze,
    Smoke,
    DustOrSand,
    VolcanicAsh,
    Rain,
    Drizzle,
    Snow,
    Hail,
    IcePellets,
    UnknownPrecipitation,
    Squall,
    FunnelCloud,
    Duststorm,
}

impl Phenomenon {
    /// Short label used in reason lists
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Phenomenon::Thunderstorm => "thunderstorm",
            Phenomenon::FreezingPrecipitation => "freezing precipitation",
            Phenomenon::DenseFog => "dense fog",
            Phenomenon::ShallowFog => "patchy fog",
            Phenomenon::Mist => "mist",
            Phenomenon::Haze => "haze",
            Phenomenon::Smoke => "smoke",
            Phenomenon::DustOrSand => "dust or sand",
            Phenomenon::VolcanicAsh => "volcanic ash",
            Phenomenon::Rain => "rain",
            Phenomenon::Drizzle => "drizzle",
            Phenomenon::Snow => "snow",
            Phenomenon::Hail => "hail",
            Phenomenon::IcePellets => "ice pellets",
            Phenomenon::UnknownPrecipitation => "unknown precipitation",
            Phenomenon::Squall => "squall",
            Phenomenon::FunnelCloud => "funnel cloud",
            Phenomenon::Duststorm => "duststorm",
        }
    }
}

impl fmt::Display for Phenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Latest surface observation from the nearest reporting station
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Station identifier (ICAO code for METAR stations)
    pub station_id: String,
    /// Station name, when the provider reports one
    pub station_name: Option<String>,
    /// Distance from the requested location in kilometers
    pub distance_km: f64,
    /// Time the observation was made
    pub observed_at: DateTime<Utc>,
    /// Sustained wind speed in knots
    pub wind_speed_kt: f64,
    /// Wind gust speed in knots
    pub wind_gust_kt: Option<f64>,
    /// Wind direction in degrees, `None` for variable or calm wind
    pub wind_direction_deg: Option<u16>,
    /// Prevailing visibility in kilometers
    pub visibility_km: f64,
    /// Air temperature in Celsius
    pub temperature_c: Option<f64>,
    /// Classified present weather
    pub phenomena: BTreeSet<Phenomenon>,
    /// Raw METAR text
    pub raw_report: Option<String>,
    /// Human-readable description of weather conditions
    pub description: Option<String>,
}

impl WeatherObservation {
    /// Convert m/s to knots
    #[must_use]
    pub fn ms_to_knots(ms: f64) -> f64 {
        ms * KNOTS_PER_MS
    }

    /// Convert km/h to knots
    #[must_use]
    pub fn kmh_to_knots(kmh: f64) -> f64 {
        kmh / 1.852
    }

    /// Convert knots to statute miles per hour
    #[must_use]
    pub fn knots_to_mph(knots: f64) -> f64 {
        knots * 1.150_779
    }

    /// Convert statute miles to kilometers
    #[must_use]
    pub fn statute_miles_to_km(miles: f64) -> f64 {
        miles * KM_PER_STATUTE_MILE
    }

    /// Convert Fahrenheit to Celsius
    #[must_use]
    pub fn fahrenheit_to_celsius(f: f64) -> f64 {
        (f - 32.0) * 5.0 / 9.0
    }

    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = self
            .wind_direction_deg
            .map_or("VRB", Self::wind_direction_to_cardinal);
        match self.wind_gust_kt {
            Some(gust) => format!(
                "{:.0} kt {} (gusts {:.0} kt)",
                self.wind_speed_kt, direction, gust
            ),
            None => format!("{:.0} kt {}", self.wind_speed_kt, direction),
        }
    }

    /// Format visibility with unit
    #[must_use]
    pub fn format_visibility(&self) -> String {
        format!("{:.1} km", self.visibility_km)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        self.temperature_c
            .map_or_else(|| "not reported".to_string(), |t| format!("{t:.1}°C"))
    }

    /// Comma-separated phenomena, or "none"
    #[must_use]
    pub fn format_phenomena(&self) -> String {
        if self.phenomena.is_empty() {
            "none".to_string()
        } else {
            self.phenomena
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    /// Age of the observation relative to `now`, in whole minutes
    #[must_use]
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.observed_at).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn observation() -> WeatherObservation {
        WeatherObservation {
            station_id: "KORD".to_string(),
            station_name: Some("Chicago O'Hare".to_string()),
            distance_km: 3.2,
            observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 51, 0).unwrap(),
            wind_speed_kt: 12.0,
            wind_gust_kt: Some(21.0),
            wind_direction_deg: Some(270),
            visibility_km: 16.09,
            temperature_c: Some(18.3),
            phenomena: BTreeSet::from([Phenomenon::Rain, Phenomenon::Mist]),
            raw_report: None,
            description: None,
        }
    }

    #[test]
    fn test_unit_conversions() {
        assert!((WeatherObservation::ms_to_knots(10.0) - 19.438).abs() < 0.01);
        assert!((WeatherObservation::kmh_to_knots(18.52) - 10.0).abs() < 1e-9);
        assert!((WeatherObservation::statute_miles_to_km(10.0) - 16.093).abs() < 0.01);
        assert!((WeatherObservation::fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
        assert!((WeatherObservation::knots_to_mph(10.0) - 11.508).abs() < 0.01);
    }

    #[test]
    fn test_wind_direction_to_cardinal() {
        assert_eq!(WeatherObservation::wind_direction_to_cardinal(0), "N");
        assert_eq!(WeatherObservation::wind_direction_to_cardinal(90), "E");
        assert_eq!(WeatherObservation::wind_direction_to_cardinal(225), "SW");
        assert_eq!(WeatherObservation::wind_direction_to_cardinal(400), "Unknown");
    }

    #[test]
    fn test_format_wind() {
        let mut obs = observation();
        assert_eq!(obs.format_wind(), "12 kt W (gusts 21 kt)");
        obs.wind_gust_kt = None;
        obs.wind_direction_deg = None;
        assert_eq!(obs.format_wind(), "12 kt VRB");
    }

    #[test]
    fn test_format_phenomena_is_ordered() {
        let obs = observation();
        assert_eq!(obs.format_phenomena(), "mist, rain");

        let mut calm = observation();
        calm.phenomena.clear();
        assert_eq!(calm.format_phenomena(), "none");
    }

    #[test]
    fn test_age_minutes() {
        let obs = observation();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 51, 0).unwrap();
        assert_eq!(obs.age_minutes(now), 60);
    }

    #[test]
    fn test_phenomenon_serializes_snake_case() {
        let json = serde_json::to_string(&Phenomenon::FreezingPrecipitation).unwrap();
        assert_eq!(json, "\"freezing_precipitation\"");
    }
}
