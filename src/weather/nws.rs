//! api.weather.gov (National Weather Service) observation provider
//!
//! Two lookups: the `/points` metadata for the location names the URL of the
//! nearby observation stations, then the latest observation of the nearest
//! stations is fetched until one is fresh and carries both wind speed and
//! visibility.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{StationSearch, WeatherProvider, metar};
use crate::api::HttpClient;
use crate::evaluator::is_stale_at;
use crate::models::{Location, WeatherObservation};
use crate::{FlightCheckError, Result};

const SOURCE: &str = "api.weather.gov";

/// Stations tried before giving up
const MAX_STATIONS_TRIED: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    observation_stations: String,
}

#[derive(Debug, Deserialize)]
pub struct StationCollection {
    #[serde(default)]
    pub features: Vec<StationFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationFeature {
    pub geometry: Geometry,
    pub properties: StationProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationProperties {
    pub station_identifier: String,
    pub name: Option<String>,
}

impl StationFeature {
    fn position(&self) -> Option<(f64, f64)> {
        match self.geometry.coordinates.as_slice() {
            [lon, lat, ..] => Some((*lat, *lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ObservationResponse {
    pub properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationProperties {
    pub timestamp: DateTime<Utc>,
    pub raw_message: Option<String>,
    pub text_description: Option<String>,
    #[serde(default)]
    pub temperature: Option<Quantity>,
    #[serde(default)]
    pub wind_direction: Option<Quantity>,
    #[serde(default)]
    pub wind_speed: Option<Quantity>,
    #[serde(default)]
    pub wind_gust: Option<Quantity>,
    #[serde(default)]
    pub visibility: Option<Quantity>,
    #[serde(default)]
    pub present_weather: Vec<PresentWeather>,
}

/// A value with a WMO unit code such as `wmoUnit:km_h-1`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    pub unit_code: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentWeather {
    pub raw_string: Option<String>,
}

impl Quantity {
    fn unit(&self) -> &str {
        self.unit_code
            .rsplit_once(':')
            .map_or(self.unit_code.as_str(), |(_, unit)| unit)
    }

    /// Speed in knots, `None` when missing or in an unknown unit
    #[must_use]
    pub fn knots(&self) -> Option<f64> {
        let value = self.value?;
        match self.unit() {
            "km_h-1" => Some(WeatherObservation::kmh_to_knots(value)),
            "m_s-1" => Some(WeatherObservation::ms_to_knots(value)),
            "kt" => Some(value),
            "mi_h-1" => Some(value / WeatherObservation::knots_to_mph(1.0)),
            unit => {
                warn!("Unknown speed unit {}", unit);
                None
            }
        }
    }

    /// Distance in kilometers
    #[must_use]
    pub fn kilometers(&self) -> Option<f64> {
        let value = self.value?;
        match self.unit() {
            "m" => Some(value / 1000.0),
            "km" => Some(value),
            "mi" => Some(WeatherObservation::statute_miles_to_km(value)),
            unit => {
                warn!("Unknown distance unit {}", unit);
                None
            }
        }
    }

    /// Temperature in degrees Celsius
    #[must_use]
    pub fn celsius(&self) -> Option<f64> {
        let value = self.value?;
        match self.unit() {
            "degC" => Some(value),
            "degF" => Some(WeatherObservation::fahrenheit_to_celsius(value)),
            "K" => Some(value - 273.15),
            unit => {
                warn!("Unknown temperature unit {}", unit);
                None
            }
        }
    }

    /// Direction in whole degrees
    #[must_use]
    pub fn degrees(&self) -> Option<u16> {
        self.value
            .filter(|v| (0.0..=360.0).contains(v))
            .map(|v| (v.round() as u16) % 360)
    }
}

pub struct NwsClient {
    http: HttpClient,
    base_url: String,
    search: StationSearch,
}

impl NwsClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: &str, search: StationSearch) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            search,
        }
    }

    fn points_url(&self, location: &Location) -> String {
        format!(
            "{}/points/{:.4},{:.4}",
            self.base_url, location.latitude, location.longitude
        )
    }

    fn latest_observation_url(&self, station_id: &str) -> String {
        format!(
            "{}/stations/{}/observations/latest",
            self.base_url,
            urlencoding::encode(station_id)
        )
    }

    fn fetch_station_observation(
        &self,
        station: &StationFeature,
        distance_km: f64,
    ) -> Result<WeatherObservation> {
        let url = self.latest_observation_url(&station.properties.station_identifier);
        let response: ObservationResponse = self.http.get_json(SOURCE, &url)?;
        to_observation(response.properties, station, distance_km)
    }
}

impl WeatherProvider for NwsClient {
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    fn nearest_observation(&self, location: &Location, now: DateTime<Utc>) -> Result<WeatherObservation> {
        let point: PointResponse = self.http.get_json(SOURCE, &self.points_url(location))?;
        let stations: StationCollection = self
            .http
            .get_json(SOURCE, &point.properties.observation_stations)?;
        info!("Received {} NWS stations", stations.features.len());

        let candidates = nearest_stations(stations, location, self.search.radius_km);
        let observation = first_usable_observation(&candidates, &self.search, now, |station, distance_km| {
            self.fetch_station_observation(station, distance_km)
        })?;
        debug!(
            "Selected {} at {:.1} km",
            observation.station_id, observation.distance_km
        );
        Ok(observation)
    }
}

/// Walk the nearest stations until one returns a fresh, complete observation.
///
/// At most `MAX_STATIONS_TRIED` stations are fetched. A station whose latest
/// observation is older than `search.max_age_minutes` counts as a failure.
pub fn first_usable_observation<F>(
    candidates: &[(f64, StationFeature)],
    search: &StationSearch,
    now: DateTime<Utc>,
    mut fetch: F,
) -> Result<WeatherObservation>
where
    F: FnMut(&StationFeature, f64) -> Result<WeatherObservation>,
{
    if candidates.is_empty() {
        return Err(FlightCheckError::data_unavailable(
            SOURCE,
            format!("no observation station within {:.0} km", search.radius_km),
        ));
    }

    let mut last_error = None;
    for (distance_km, station) in candidates.iter().take(MAX_STATIONS_TRIED) {
        let result = fetch(station, *distance_km).and_then(|observation| {
            if is_stale_at(observation.observed_at, search.max_age_minutes, now) {
                Err(FlightCheckError::data_unavailable(
                    SOURCE,
                    format!(
                        "station {} last reported {} minutes ago (limit {})",
                        observation.station_id,
                        (now - observation.observed_at).num_minutes(),
                        search.max_age_minutes
                    ),
                ))
            } else {
                Ok(observation)
            }
        });
        match result {
            Ok(observation) => return Ok(observation),
            Err(e) => {
                warn!(
                    "Skipping station {}: {}",
                    station.properties.station_identifier, e
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        FlightCheckError::data_unavailable(SOURCE, "no usable station observation")
    }))
}

/// Stations within `radius_km`, nearest first
pub fn nearest_stations(
    collection: StationCollection,
    location: &Location,
    radius_km: f64,
) -> Vec<(f64, StationFeature)> {
    let mut stations: Vec<(f64, StationFeature)> = collection
        .features
        .into_iter()
        .filter_map(|station| {
            let (lat, lon) = station.position()?;
            Some((location.distance_km(lat, lon), station))
        })
        .filter(|(d, _)| *d <= radius_km)
        .collect();
    stations.sort_by(|a, b| a.0.total_cmp(&b.0));
    stations
}

/// Convert a station's latest observation, requiring wind speed and visibility.
pub fn to_observation(
    props: ObservationProperties,
    station: &StationFeature,
    distance_km: f64,
) -> Result<WeatherObservation> {
    let station_id = station.properties.station_identifier.clone();
    let missing = |what: &str| {
        FlightCheckError::data_unavailable(
            SOURCE,
            format!("station {station_id} reported no {what}"),
        )
    };

    let wind_speed_kt = props
        .wind_speed
        .as_ref()
        .and_then(Quantity::knots)
        .ok_or_else(|| missing("wind speed"))?;
    let visibility_km = props
        .visibility
        .as_ref()
        .and_then(Quantity::kilometers)
        .ok_or_else(|| missing("visibility"))?;

    let raw_report = props.raw_message.filter(|m| !m.trim().is_empty());
    let present_weather: Vec<&str> = props
        .present_weather
        .iter()
        .filter_map(|w| w.raw_string.as_deref())
        .collect();

    let phenomena = if !present_weather.is_empty() {
        metar::phenomena_from_groups(&present_weather.join(" "))
    } else if let Some(raw) = &raw_report {
        metar::phenomena_from_report(raw)
    } else {
        props
            .text_description
            .as_deref()
            .map(metar::phenomena_from_description)
            .unwrap_or_default()
    };

    let wind_direction_deg = if wind_speed_kt > 0.0 {
        props.wind_direction.as_ref().and_then(Quantity::degrees)
    } else {
        None
    };

    Ok(WeatherObservation {
        station_id,
        station_name: station.properties.name.clone(),
        distance_km,
        observed_at: props.timestamp,
        wind_speed_kt,
        wind_gust_kt: props.wind_gust.as_ref().and_then(Quantity::knots),
        wind_direction_deg,
        visibility_km,
        temperature_c: props.temperature.as_ref().and_then(Quantity::celsius),
        phenomena,
        raw_report,
        description: props.text_description.filter(|d| !d.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phenomenon;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use std::collections::BTreeSet;

    const STATIONS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"id": "https://api.weather.gov/stations/KDEN",
             "geometry": {"type": "Point", "coordinates": [-104.65622, 39.84657]},
             "properties": {"stationIdentifier": "KDEN", "name": "Denver International Airport"}},
            {"id": "https://api.weather.gov/stations/KBKF",
             "geometry": {"type": "Point", "coordinates": [-104.75, 39.71667]},
             "properties": {"stationIdentifier": "KBKF", "name": "Aurora / Buckley AFB"}},
            {"id": "https://api.weather.gov/stations/KCOS",
             "geometry": {"type": "Point", "coordinates": [-104.70025, 38.80581]},
             "properties": {"stationIdentifier": "KCOS", "name": "Colorado Springs Municipal Airport"}},
            {"id": "https://api.weather.gov/stations/BROKEN",
             "geometry": {"type": "Point", "coordinates": []},
             "properties": {"stationIdentifier": "BROKEN"}}
        ]
    }"#;

    const OBSERVATION: &str = r#"{
        "properties": {
            "timestamp": "2024-05-01T14:53:00+00:00",
            "rawMessage": "KBKF 011453Z 18012G22KT 3SM -SHRA BR SCT050 12/09 A3002",
            "textDescription": "Light Rain Showers and Mist",
            "temperature": {"unitCode": "wmoUnit:degC", "value": 12.2, "qualityControl": "V"},
            "windDirection": {"unitCode": "wmoUnit:degree_(angle)", "value": 180},
            "windSpeed": {"unitCode": "wmoUnit:km_h-1", "value": 22.2},
            "windGust": {"unitCode": "wmoUnit:km_h-1", "value": 40.7},
            "visibility": {"unitCode": "wmoUnit:m", "value": 4830},
            "presentWeather": [
                {"intensity": "light", "weather": "rain", "rawString": "-SHRA"},
                {"intensity": null, "weather": "fog_mist", "rawString": "BR"}
            ]
        }
    }"#;

    fn station(id: &str) -> StationFeature {
        let collection: StationCollection = serde_json::from_str(STATIONS).unwrap();
        collection
            .features
            .into_iter()
            .find(|s| s.properties.station_identifier == id)
            .unwrap()
    }

    fn observation() -> ObservationProperties {
        serde_json::from_str::<ObservationResponse>(OBSERVATION)
            .unwrap()
            .properties
    }

    #[test]
    fn test_nearest_stations_sorted_and_filtered() {
        let collection: StationCollection = serde_json::from_str(STATIONS).unwrap();
        let aurora = Location::new(39.72, -104.76).unwrap();
        let stations = nearest_stations(collection, &aurora, 50.0);

        let ids: Vec<&str> = stations
            .iter()
            .map(|(_, s)| s.properties.station_identifier.as_str())
            .collect();
        // KCOS is ~100 km away, BROKEN has no position
        assert_eq!(ids, vec!["KBKF", "KDEN"]);
        assert!(stations[0].0 < stations[1].0);
    }

    fn search() -> StationSearch {
        StationSearch {
            radius_km: 50.0,
            max_age_minutes: 60,
        }
    }

    fn aurora_candidates() -> Vec<(f64, StationFeature)> {
        let collection: StationCollection = serde_json::from_str(STATIONS).unwrap();
        nearest_stations(collection, &Location::new(39.72, -104.76).unwrap(), 50.0)
    }

    /// Fixture observation for `station`, reported `age_minutes` before `now`
    fn observed(station: &StationFeature, distance_km: f64, now: DateTime<Utc>, age_minutes: i64) -> WeatherObservation {
        let mut props = observation();
        props.timestamp = now - Duration::minutes(age_minutes);
        to_observation(props, station, distance_km).unwrap()
    }

    #[test]
    fn test_stale_nearest_station_is_skipped() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        let mut fetched = Vec::new();
        let obs = first_usable_observation(&aurora_candidates(), &search(), now, |station, distance_km| {
            let id = station.properties.station_identifier.clone();
            let age = if id == "KBKF" { 180 } else { 10 };
            fetched.push(id);
            Ok(observed(station, distance_km, now, age))
        })
        .unwrap();

        assert_eq!(fetched, vec!["KBKF", "KDEN"]);
        assert_eq!(obs.station_id, "KDEN");
        assert_eq!(obs.observed_at, now - Duration::minutes(10));
    }

    #[test]
    fn test_all_stations_stale_is_data_unavailable() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        let err = first_usable_observation(&aurora_candidates(), &search(), now, |station, distance_km| {
            Ok(observed(station, distance_km, now, 61))
        })
        .unwrap_err();
        assert!(matches!(err, FlightCheckError::DataUnavailable { .. }));
        assert!(err.to_string().contains("61 minutes ago"));
    }

    #[test]
    fn test_failed_station_falls_through_to_next() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        let obs = first_usable_observation(&aurora_candidates(), &search(), now, |station, distance_km| {
            if station.properties.station_identifier == "KBKF" {
                Err(FlightCheckError::data_unavailable(SOURCE, "HTTP 500"))
            } else {
                Ok(observed(station, distance_km, now, 5))
            }
        })
        .unwrap();
        assert_eq!(obs.station_id, "KDEN");
    }

    #[test]
    fn test_no_candidates_is_data_unavailable() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        let err = first_usable_observation(&[], &search(), now, |_, _| unreachable!()).unwrap_err();
        assert!(err.to_string().contains("no observation station within 50 km"));
    }

    #[test]
    fn test_observation_unit_conversion() {
        let obs = to_observation(observation(), &station("KBKF"), 1.0).unwrap();

        assert_eq!(obs.station_id, "KBKF");
        assert_eq!(obs.station_name.as_deref(), Some("Aurora / Buckley AFB"));
        assert!((obs.wind_speed_kt - 11.99).abs() < 0.05);
        assert!((obs.wind_gust_kt.unwrap() - 21.98).abs() < 0.05);
        assert_eq!(obs.wind_direction_deg, Some(180));
        assert!((obs.visibility_km - 4.83).abs() < 1e-9);
        assert_eq!(obs.temperature_c, Some(12.2));
        assert_eq!(
            obs.phenomena,
            BTreeSet::from([Phenomenon::Rain, Phenomenon::Mist])
        );
        assert_eq!(obs.observed_at.to_rfc3339(), "2024-05-01T14:53:00+00:00");
    }

    #[test]
    fn test_raw_message_fallback_for_phenomena() {
        let mut props = observation();
        props.present_weather.clear();
        props.raw_message = Some("KBKF 011453Z 18012KT 1/2SM +TSRA FG OVC008 12/11 A3002".into());
        let obs = to_observation(props, &station("KBKF"), 1.0).unwrap();
        assert!(obs.phenomena.contains(&Phenomenon::Thunderstorm));
        assert!(obs.phenomena.contains(&Phenomenon::DenseFog));
    }

    #[test]
    fn test_text_description_fallback_for_phenomena() {
        let mut props = observation();
        props.present_weather.clear();
        props.raw_message = Some(String::new());
        props.text_description = Some("Thunderstorms and Rain".into());
        let obs = to_observation(props, &station("KBKF"), 1.0).unwrap();
        assert!(obs.phenomena.contains(&Phenomenon::Thunderstorm));
        assert!(obs.raw_report.is_none());
    }

    #[test]
    fn test_null_wind_speed_is_data_unavailable() {
        let mut props = observation();
        props.wind_speed = Some(Quantity {
            unit_code: "wmoUnit:km_h-1".into(),
            value: None,
        });
        let err = to_observation(props, &station("KBKF"), 1.0).unwrap_err();
        assert!(matches!(err, FlightCheckError::DataUnavailable { .. }));
        assert!(err.to_string().contains("wind speed"));
    }

    #[test]
    fn test_missing_visibility_is_data_unavailable() {
        let mut props = observation();
        props.visibility = None;
        let err = to_observation(props, &station("KBKF"), 1.0).unwrap_err();
        assert!(err.to_string().contains("visibility"));
    }

    #[test]
    fn test_calm_wind_has_no_direction() {
        let mut props = observation();
        props.wind_speed = Some(Quantity {
            unit_code: "wmoUnit:km_h-1".into(),
            value: Some(0.0),
        });
        let obs = to_observation(props, &station("KBKF"), 1.0).unwrap();
        assert_eq!(obs.wind_direction_deg, None);
    }

    #[rstest]
    #[case("wmoUnit:kt", 10.0, Some(10.0))]
    #[case("wmoUnit:m_s-1", 10.0, Some(19.43844))]
    #[case("wmoUnit:km_h-1", 1.852, Some(1.0))]
    #[case("wmoUnit:furlong", 1.0, None)]
    fn test_speed_units(#[case] unit: &str, #[case] value: f64, #[case] expected: Option<f64>) {
        let quantity = Quantity {
            unit_code: unit.to_string(),
            value: Some(value),
        };
        match (quantity.knots(), expected) {
            (Some(actual), Some(expected)) => assert!((actual - expected).abs() < 1e-3),
            (actual, expected) => assert_eq!(actual, expected),
        }
    }

    #[rstest]
    #[case("wmoUnit:degC", 20.0, 20.0)]
    #[case("wmoUnit:degF", 50.0, 10.0)]
    #[case("wmoUnit:K", 273.15, 0.0)]
    fn test_temperature_units(#[case] unit: &str, #[case] value: f64, #[case] expected: f64) {
        let quantity = Quantity {
            unit_code: unit.to_string(),
            value: Some(value),
        };
        assert!((quantity.celsius().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_urls() {
        let http = HttpClient::new(&crate::config::HttpConfig::default()).unwrap();
        let client = NwsClient::new(http, "https://api.weather.gov/", search());
        let location = Location::new(39.7456, -97.0892).unwrap();
        assert_eq!(
            client.points_url(&location),
            "https://api.weather.gov/points/39.7456,-97.0892"
        );
        assert_eq!(
            client.latest_observation_url("KBKF"),
            "https://api.weather.gov/stations/KBKF/observations/latest"
        );
    }
}
