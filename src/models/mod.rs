//! Data models for flightcheck
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Weather: Surface observation and present-weather categories
//! - Space weather: Planetary Kp index
//! - Daylight: Sunrise/sunset status
//! - Verdict: Rules, reasons and the aggregated assessment

pub mod daylight;
pub mod location;
pub mod space_weather;
pub mod verdict;
pub mod weather;

// Re-export all public types for convenient access
pub use daylight::DaylightStatus;
pub use location::{BoundingBox, Location};
pub use space_weather::SpaceWeather;
pub use verdict::{Assessment, Reason, Rule, Verdict};
pub use weather::{Phenomenon, WeatherObservation};
