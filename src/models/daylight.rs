//! Daylight status for a location and instant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the sun is up, with the day's sunrise and sunset when they exist
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DaylightStatus {
    pub is_daylight: bool,
    /// `None` during polar day or polar night
    pub sunrise: Option<DateTime<Utc>>,
    /// `None` during polar day or polar night
    pub sunset: Option<DateTime<Utc>>,
}

impl DaylightStatus {
    /// Status with no sunrise/sunset times, for callers that only know the flag
    #[must_use]
    pub fn from_flag(is_daylight: bool) -> Self {
        Self {
            is_daylight,
            sunrise: None,
            sunset: None,
        }
    }
}
