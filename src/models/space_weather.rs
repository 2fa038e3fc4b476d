//! Geomagnetic activity reading

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Planetary K-index reading
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpaceWeather {
    /// Kp index on the 0-9 scale
    pub kp_index: u8,
    /// Fractional Kp estimate, when the feed provides one
    pub estimated_kp: Option<f64>,
    /// Time of the reading
    pub observed_at: DateTime<Utc>,
}

impl SpaceWeather {
    /// Highest value on the Kp scale
    pub const MAX_KP: u8 = 9;

    /// NOAA G-scale storm level for this reading (G1 starts at Kp 5)
    #[must_use]
    pub fn storm_level(&self) -> Option<u8> {
        self.kp_index.checked_sub(4).filter(|g| *g > 0).map(|g| g.min(5))
    }

    /// Format the reading, e.g. `Kp 5 (4.67, G1 storm)`
    #[must_use]
    pub fn format_kp(&self) -> String {
        let estimate = self.estimated_kp.map(|e| format!("{e:.2}"));
        let storm = self.storm_level().map(|g| format!("G{g} storm"));
        let details: Vec<String> = estimate.into_iter().chain(storm).collect();
        if details.is_empty() {
            format!("Kp {}", self.kp_index)
        } else {
            format!("Kp {} ({})", self.kp_index, details.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reading(kp_index: u8, estimated_kp: Option<f64>) -> SpaceWeather {
        SpaceWeather {
            kp_index,
            estimated_kp,
            observed_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0, None)]
    #[case(4, None)]
    #[case(5, Some(1))]
    #[case(7, Some(3))]
    #[case(9, Some(5))]
    fn test_storm_level(#[case] kp: u8, #[case] expected: Option<u8>) {
        assert_eq!(reading(kp, None).storm_level(), expected);
    }

    #[test]
    fn test_format_kp() {
        assert_eq!(reading(2, None).format_kp(), "Kp 2");
        assert_eq!(reading(2, Some(2.33)).format_kp(), "Kp 2 (2.33)");
        assert_eq!(reading(5, Some(4.67)).format_kp(), "Kp 5 (4.67, G1 storm)");
    }
}
