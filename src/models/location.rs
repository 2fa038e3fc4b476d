//! Location model for geographic coordinates

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::{FlightCheckError, Result};

/// Location coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees (-90..=90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180..=180)
    pub longitude: f64,
}

impl Location {
    /// Create a validated location
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let location = Self {
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    /// Check that both coordinates are finite and in range.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(FlightCheckError::invalid_input(format!(
                "latitude {} is outside -90..90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(FlightCheckError::invalid_input(format!(
                "longitude {} is outside -180..180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude,
            longitude,
        };
        distance(from, to, Units::Kilometers)
    }

    /// Latitude/longitude boxes covering `radius_km` around the location.
    ///
    /// Latitude is clamped at the poles. A box crossing the antimeridian is
    /// split into one box on each side of it.
    #[must_use]
    pub fn bounding_boxes(&self, radius_km: f64) -> Vec<BoundingBox> {
        let dlat = radius_km / 111.32;
        let cos_lat = self.latitude.to_radians().cos().abs().max(0.01);
        let dlon = radius_km / (111.32 * cos_lat);
        let min_lat = (self.latitude - dlat).max(-90.0);
        let max_lat = (self.latitude + dlat).min(90.0);
        let span = |min_lon: f64, max_lon: f64| BoundingBox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        };

        let west = self.longitude - dlon;
        let east = self.longitude + dlon;
        if dlon >= 180.0 {
            vec![span(-180.0, 180.0)]
        } else if west < -180.0 {
            vec![span(west + 360.0, 180.0), span(-180.0, east)]
        } else if east > 180.0 {
            vec![span(west, 180.0), span(-180.0, east - 360.0)]
        } else {
            vec![span(west, east)]
        }
    }
}

/// Query box in decimal degrees with `min_lon <= max_lon`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(41.8781, -87.6298)]
    fn test_valid_coordinates(#[case] lat: f64, #[case] lon: f64) {
        assert!(Location::new(lat, lon).is_ok());
    }

    #[rstest]
    #[case(90.5, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(0.0, 180.1)]
    #[case(0.0, -200.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_invalid_coordinates(#[case] lat: f64, #[case] lon: f64) {
        let err = Location::new(lat, lon).unwrap_err();
        assert!(matches!(err, FlightCheckError::InvalidInput { .. }));
    }

    #[test]
    fn test_format_coordinates() {
        let location = Location::new(46.818_234, 8.227_456).unwrap();
        assert_eq!(location.format_coordinates(), "46.8182, 8.2275");
    }

    #[test]
    fn test_distance_km() {
        // Chicago O'Hare to Midway is roughly 25 km
        let ohare = Location::new(41.9786, -87.9048).unwrap();
        let d = ohare.distance_km(41.7868, -87.7522);
        assert!((20.0..30.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn test_bounding_box_contains_center() {
        let location = Location::new(48.0, 11.0).unwrap();
        let boxes = location.bounding_boxes(50.0);
        assert_eq!(boxes.len(), 1);
        let bbox = boxes[0];
        assert!(bbox.contains(48.0, 11.0));
        // longitude span widens away from the equator
        assert!(bbox.max_lon - bbox.min_lon > bbox.max_lat - bbox.min_lat);
    }

    #[test]
    fn test_bounding_box_clamped_at_pole() {
        let location = Location::new(89.9, 0.0).unwrap();
        for bbox in location.bounding_boxes(100.0) {
            assert_eq!(bbox.max_lat, 90.0);
            assert!(bbox.min_lon >= -180.0 && bbox.max_lon <= 180.0);
        }
    }

    #[rstest]
    #[case::east_of_antimeridian(-179.9)]
    #[case::west_of_antimeridian(179.9)]
    fn test_bounding_box_split_at_antimeridian(#[case] longitude: f64) {
        let location = Location::new(-16.0, longitude).unwrap();
        let boxes = location.bounding_boxes(50.0);

        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().all(|b| b.min_lon >= -180.0 && b.max_lon <= 180.0));
        // stations ~20 km away on both sides of the 180th meridian are covered
        assert!(boxes.iter().any(|b| b.contains(-16.0, 179.8)));
        assert!(boxes.iter().any(|b| b.contains(-16.0, -179.8)));
    }
}
