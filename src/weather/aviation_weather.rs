//! aviationweather.gov METAR provider
//!
//! Queries the Aviation Weather Center data API for every METAR inside a
//! bounding box around the location, keeps the latest report per station and
//! picks the nearest station with a fresh report of both wind and visibility.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{StationSearch, WeatherProvider, metar};
use crate::api::HttpClient;
use crate::evaluator::is_stale_at;
use crate::models::{Location, WeatherObservation};
use crate::{FlightCheckError, Result};

const SOURCE: &str = "aviationweather.gov METAR";

/// One record of `GET /api/data/metar?format=json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetarRecord {
    pub icao_id: String,
    /// Observation time, unix seconds
    pub obs_time: i64,
    pub temp: Option<f64>,
    pub wdir: Option<WindDirection>,
    /// Knots
    pub wspd: Option<f64>,
    /// Knots
    pub wgst: Option<f64>,
    /// Statute miles, either a number or text such as `"10+"`
    pub visib: Option<Visibility>,
    pub wx_string: Option<String>,
    pub raw_ob: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WindDirection {
    Degrees(u16),
    Variable(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Visibility {
    Miles(f64),
    Text(String),
}

impl Visibility {
    fn statute_miles(&self) -> Option<f64> {
        match self {
            Visibility::Miles(m) => Some(*m),
            Visibility::Text(text) => parse_visibility_miles(text),
        }
    }
}

/// Parse METAR-style visibility text: `10+`, `P6`, `M1/4`, `1 1/2`, `3/4SM`.
#[must_use]
pub fn parse_visibility_miles(text: &str) -> Option<f64> {
    let cleaned = text
        .trim()
        .trim_end_matches("SM")
        .trim_end_matches('+')
        .trim_start_matches(['P', 'M']);

    let mut total = 0.0;
    let mut parsed_any = false;
    for part in cleaned.split_whitespace() {
        let value = match part.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => part.parse().ok()?,
        };
        total += value;
        parsed_any = true;
    }
    parsed_any.then_some(total)
}

pub struct AviationWeatherClient {
    http: HttpClient,
    base_url: String,
    search: StationSearch,
}

impl AviationWeatherClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, search: StationSearch) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            search,
        }
    }

    /// One METAR query per bounding box; two near the antimeridian
    fn metar_urls(&self, location: &Location) -> Vec<String> {
        location
            .bounding_boxes(self.search.radius_km)
            .into_iter()
            .map(|b| {
                let bbox = format!(
                    "{:.4},{:.4},{:.4},{:.4}",
                    b.min_lat, b.min_lon, b.max_lat, b.max_lon
                );
                format!(
                    "{}/api/data/metar?bbox={}&format=json",
                    self.base_url,
                    urlencoding::encode(&bbox)
                )
            })
            .collect()
    }
}

impl WeatherProvider for AviationWeatherClient {
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    fn nearest_observation(&self, location: &Location, now: DateTime<Utc>) -> Result<WeatherObservation> {
        let mut records: Vec<MetarRecord> = Vec::new();
        for url in self.metar_urls(location) {
            records.extend(self.http.get_json::<Vec<MetarRecord>>(SOURCE, &url)?);
        }
        info!("Received {} METAR records", records.len());

        let observation = select_nearest(records, location, &self.search, now)?;
        debug!(
            "Selected {} at {:.1} km: {:?}",
            observation.station_id, observation.distance_km, observation.raw_report
        );
        Ok(observation)
    }
}

/// Pick the nearest station within the search radius with a usable report.
///
/// Stations whose latest report is older than `search.max_age_minutes` at
/// `now` are passed over in favour of farther stations with fresh data.
pub fn select_nearest(
    records: Vec<MetarRecord>,
    location: &Location,
    search: &StationSearch,
    now: DateTime<Utc>,
) -> Result<WeatherObservation> {
    let radius_km = search.radius_km;
    let mut latest: HashMap<String, MetarRecord> = HashMap::new();
    for record in records {
        match latest.get(&record.icao_id) {
            Some(existing) if existing.obs_time >= record.obs_time => {}
            _ => {
                latest.insert(record.icao_id.clone(), record);
            }
        }
    }

    let mut candidates: Vec<(f64, MetarRecord)> = latest
        .into_values()
        .map(|r| (location.distance_km(r.lat, r.lon), r))
        .filter(|(d, _)| *d <= radius_km)
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    if candidates.is_empty() {
        return Err(FlightCheckError::data_unavailable(
            SOURCE,
            format!("no reporting station within {radius_km:.0} km"),
        ));
    }

    for (distance_km, record) in candidates {
        match to_observation(&record, distance_km) {
            Some(observation) if is_stale_at(observation.observed_at, search.max_age_minutes, now) => {
                warn!(
                    "Skipping {}: report is {} minutes old",
                    record.icao_id,
                    (now - observation.observed_at).num_minutes()
                );
            }
            Some(observation) => return Ok(observation),
            None => warn!(
                "Skipping {}: report lacks wind or visibility",
                record.icao_id
            ),
        }
    }

    Err(FlightCheckError::data_unavailable(
        SOURCE,
        format!(
            "no station within {radius_km:.0} km has a report of wind and visibility from the last {} minutes",
            search.max_age_minutes
        ),
    ))
}

fn to_observation(record: &MetarRecord, distance_km: f64) -> Option<WeatherObservation> {
    let wind_speed_kt = record.wspd?;
    let visibility_mi = record.visib.as_ref()?.statute_miles()?;
    let observed_at = DateTime::from_timestamp(record.obs_time, 0)?;

    let phenomena = match (&record.wx_string, &record.raw_ob) {
        (Some(wx), _) => metar::phenomena_from_groups(wx),
        (None, Some(raw)) => metar::phenomena_from_report(raw),
        (None, None) => Default::default(),
    };

    let wind_direction_deg = match &record.wdir {
        Some(WindDirection::Degrees(d)) if wind_speed_kt > 0.0 => Some(*d),
        _ => None,
    };

    Some(WeatherObservation {
        station_id: record.icao_id.clone(),
        station_name: record.name.clone(),
        distance_km,
        observed_at,
        wind_speed_kt,
        wind_gust_kt: record.wgst,
        wind_direction_deg,
        visibility_km: WeatherObservation::statute_miles_to_km(visibility_mi),
        temperature_c: record.temp,
        phenomena,
        raw_report: record.raw_ob.clone(),
        description: record.wx_string.clone(),
    })
}
