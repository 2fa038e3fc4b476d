//! `flightcheck` - go/no-go flight conditions for small drones
//!
//! This library combines the latest surface observation near a location, the
//! planetary Kp index and astronomical daylight into a SAFE / CAUTION / NO-FLY
//! verdict with the list of rules that triggered it.

pub mod api;
pub mod config;
pub mod daylight;
pub mod error;
pub mod evaluator;
pub mod flight_check;
pub mod logging;
pub mod models;
pub mod report;
pub mod space_weather;
pub mod weather;

// Re-export core types for public API
pub use config::FlightCheckConfig;
pub use daylight::{DaylightCalculator, SolarDaylight};
pub use error::FlightCheckError;
pub use evaluator::{FlightSafetyEvaluator, Freshness, Thresholds};
pub use flight_check::{FlightCheck, FlightReport, LiveFlightCheck};
pub use models::{
    Assessment, DaylightStatus, Location, Phenomenon, Reason, Rule, SpaceWeather, Verdict,
    WeatherObservation,
};
pub use space_weather::{SpaceWeatherProvider, SwpcKpClient};
pub use weather::{ConfiguredWeather, WeatherProvider, WeatherProviderKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FlightCheckError>;
