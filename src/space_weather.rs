//! Planetary K-index from the NOAA Space Weather Prediction Center

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::HttpClient;
use crate::models::SpaceWeather;
use crate::{FlightCheckError, Result};

const SOURCE: &str = "NOAA SWPC Kp";

/// Source of the current geomagnetic Kp index
pub trait SpaceWeatherProvider {
    fn current_kp(&self) -> Result<SpaceWeather>;
}

/// One entry of `planetary_k_index_1m.json`
#[derive(Debug, Clone, Deserialize)]
pub struct KpRecord {
    /// UTC without offset, e.g. `2024-05-01T14:53:00`
    pub time_tag: NaiveDateTime,
    pub kp_index: i64,
    pub estimated_kp: Option<f64>,
    /// Kp in thirds notation, e.g. `2P`
    pub kp: Option<String>,
}

pub struct SwpcKpClient {
    http: HttpClient,
    url: String,
}

impl SwpcKpClient {
    #[must_use]
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

impl SpaceWeatherProvider for SwpcKpClient {
    #[instrument(skip(self))]
    fn current_kp(&self) -> Result<SpaceWeather> {
        let records: Vec<KpRecord> = self.http.get_json(SOURCE, &self.url)?;
        let reading = latest_reading(records)?;
        info!("Current {} at {}", reading.format_kp(), reading.observed_at);
        Ok(reading)
    }
}

/// Take the most recent entry of the feed.
pub fn latest_reading(records: Vec<KpRecord>) -> Result<SpaceWeather> {
    let latest = records
        .into_iter()
        .max_by_key(|r| r.time_tag)
        .ok_or_else(|| FlightCheckError::data_unavailable(SOURCE, "feed contained no readings"))?;

    let kp_index = u8::try_from(latest.kp_index)
        .ok()
        .filter(|kp| *kp <= SpaceWeather::MAX_KP)
        .ok_or_else(|| {
            FlightCheckError::data_unavailable(
                SOURCE,
                format!("Kp index {} is outside 0-9", latest.kp_index),
            )
        })?;

    Ok(SpaceWeather {
        kp_index,
        estimated_kp: latest.estimated_kp.filter(|e| e.is_finite()),
        observed_at: latest.time_tag.and_utc(),
    })
}
