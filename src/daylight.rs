//! Sunrise and sunset for the flight location

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::debug;

use crate::models::{DaylightStatus, Location};
use crate::{FlightCheckError, Result};

/// Sun altitude at sunrise and sunset, accounting for refraction and disc size
const HORIZON_ALTITUDE_DEG: f64 = -0.833;

/// Decides whether the sun is up at a location and instant
pub trait DaylightCalculator {
    fn daylight(&self, location: &Location, at: DateTime<Utc>) -> Result<DaylightStatus>;
}

/// Astronomical daylight from the `sunrise` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarDaylight;

/// Calendar date at the location's mean solar time
#[must_use]
pub fn local_solar_date(location: &Location, at: DateTime<Utc>) -> NaiveDate {
    let offset = Duration::seconds((location.longitude / 15.0 * 3600.0).round() as i64);
    (at + offset).date_naive()
}

/// Approximate solar declination in degrees for a day of the year
fn solar_declination_deg(date: NaiveDate) -> f64 {
    let day = f64::from(date.ordinal());
    -23.44 * (360.0 / 365.0 * (day + 10.0)).to_radians().cos()
}

/// Some(true) for polar day, Some(false) for polar night, None when the sun
/// rises and sets on `date`.
fn polar_state(latitude: f64, date: NaiveDate) -> Option<bool> {
    let phi = latitude.to_radians();
    let delta = solar_declination_deg(date).to_radians();
    let denominator = phi.cos() * delta.cos();
    if denominator.abs() < f64::EPSILON {
        return Some(latitude * solar_declination_deg(date) > 0.0);
    }
    let cos_hour_angle = (HORIZON_ALTITUDE_DEG.to_radians().sin() - phi.sin() * delta.sin()) / denominator;
    if cos_hour_angle > 1.0 {
        Some(false)
    } else if cos_hour_angle < -1.0 {
        Some(true)
    } else {
        None
    }
}

impl DaylightCalculator for SolarDaylight {
    fn daylight(&self, location: &Location, at: DateTime<Utc>) -> Result<DaylightStatus> {
        let coordinates = Coordinates::new(location.latitude, location.longitude).ok_or_else(|| {
            FlightCheckError::invalid_input(format!(
                "Invalid coordinates: lat={}, lon={}",
                location.latitude, location.longitude
            ))
        })?;

        let date = local_solar_date(location, at);
        if let Some(polar_day) = polar_state(location.latitude, date) {
            debug!(
                "Polar {} at {} on {}",
                if polar_day { "day" } else { "night" },
                location.format_coordinates(),
                date
            );
            return Ok(DaylightStatus::from_flag(polar_day));
        }

        let solar_day = SolarDay::new(coordinates, date);
        let sunrise = solar_day.event_time(SolarEvent::Sunrise);
        let sunset = solar_day.event_time(SolarEvent::Sunset);

        let is_daylight = match (sunrise, sunset) {
            (Some(rise), Some(set)) if rise < set => rise <= at && at < set,
            (Some(rise), Some(set)) => at >= rise || at < set,
            (Some(rise), None) => at >= rise,
            (None, Some(set)) => at < set,
            (None, None) => location.latitude * solar_declination_deg(date) > 0.0,
        };
        debug!(
            "Sunrise {:?}, sunset {:?}, daylight: {}",
            sunrise, sunset, is_daylight
        );

        Ok(DaylightStatus {
            is_daylight,
            sunrise,
            sunset,
        })
    }
}
