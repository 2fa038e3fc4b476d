//! METAR present-weather groups
//!
//! A weather group is an optional intensity (`-`, `+`) or proximity (`VC`)
//! prefix followed by two-letter codes: at most one descriptor (`TS`, `FZ`,
//! `SH`, ...) and any number of precipitation, obscuration or other codes.
//! Tokens that are not made entirely of known codes are not weather groups.

use std::collections::BTreeSet;

use crate::models::Phenomenon;

const DESCRIPTORS: [&str; 8] = ["MI", "PR", "BC", "DR", "BL", "SH", "TS", "FZ"];
const PHENOMENA: [&str; 22] = [
    "DZ", "RA", "SN", "SG", "IC", "PL", "GR", "GS", "UP", // precipitation
    "BR", "FG", "FU", "VA", "DU", "SA", "HZ", "PY", // obscuration
    "PO", "SQ", "FC", "SS", "DS", // other
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
}

/// One decoded weather group such as `-FZRA` or `VCTS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherGroup {
    pub intensity: Intensity,
    pub in_vicinity: bool,
    pub descriptor: Option<&'static str>,
    pub codes: Vec<&'static str>,
}

impl WeatherGroup {
    /// Decode a single token, `None` if it is not a weather group.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (intensity, rest) = if let Some(rest) = token.strip_prefix('+') {
            (Intensity::Heavy, rest)
        } else if let Some(rest) = token.strip_prefix('-') {
            (Intensity::Light, rest)
        } else {
            (Intensity::Moderate, token)
        };
        let (in_vicinity, rest) = match rest.strip_prefix("VC") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        if rest.is_empty() || rest.len() % 2 != 0 || !rest.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }

        let mut descriptor = None;
        let mut codes = Vec::new();
        for i in (0..rest.len()).step_by(2) {
            let pair = &rest[i..i + 2];
            if let Some(d) = DESCRIPTORS.iter().find(|d| **d == pair) {
                // descriptor must come first and only once
                if descriptor.is_some() || !codes.is_empty() {
                    return None;
                }
                descriptor = Some(*d);
            } else if let Some(code) = PHENOMENA.iter().find(|c| **c == pair) {
                codes.push(*code);
            } else {
                return None;
            }
        }

        // a bare descriptor is only meaningful for TS (and VCSH)
        if codes.is_empty() && !matches!(descriptor, Some("TS")) && !(in_vicinity && descriptor == Some("SH")) {
            return None;
        }
        // intensity applies to precipitation, not to proximity groups
        if in_vicinity && intensity != Intensity::Moderate {
            return None;
        }

        Some(Self {
            intensity,
            in_vicinity,
            descriptor,
            codes,
        })
    }

    /// Map the group onto the categories used by the flight rules
    #[must_use]
    pub fn phenomena(&self) -> BTreeSet<Phenomenon> {
        let mut out = BTreeSet::new();
        let freezing = self.descriptor == Some("FZ");

        match self.descriptor {
            Some("TS") => {
                out.insert(Phenomenon::Thunderstorm);
            }
            Some("SH") if self.codes.is_empty() => {
                out.insert(Phenomenon::Rain);
            }
            _ => {}
        }

        for code in &self.codes {
            let phenomenon = match *code {
                "DZ" | "RA" | "UP" if freezing => Phenomenon::FreezingPrecipitation,
                "DZ" => Phenomenon::Drizzle,
                "RA" => Phenomenon::Rain,
                "SN" | "SG" => Phenomenon::Snow,
                "IC" | "PL" => Phenomenon::IcePellets,
                "GR" | "GS" => Phenomenon::Hail,
                "UP" => Phenomenon::UnknownPrecipitation,
                "FG" => {
                    let partial = matches!(self.descriptor, Some("MI" | "BC" | "PR"));
                    if partial || self.in_vicinity {
                        Phenomenon::ShallowFog
                    } else {
                        Phenomenon::DenseFog
                    }
                }
                "BR" => Phenomenon::Mist,
                "HZ" => Phenomenon::Haze,
                "FU" => Phenomenon::Smoke,
                "VA" => Phenomenon::VolcanicAsh,
                "DU" | "SA" | "PY" | "PO" => Phenomenon::DustOrSand,
                "SQ" => Phenomenon::Squall,
                "FC" => Phenomenon::FunnelCloud,
                "SS" | "DS" => Phenomenon::Duststorm,
                _ => continue,
            };
            out.insert(phenomenon);
        }
        out
    }
}

/// Classify a whitespace-separated list of weather groups, e.g. `-TSRA BR`.
#[must_use]
pub fn phenomena_from_groups(groups: &str) -> BTreeSet<Phenomenon> {
    groups
        .split_whitespace()
        .filter_map(WeatherGroup::parse)
        .flat_map(|g| g.phenomena())
        .collect()
}

/// Classify the present weather of a full METAR/SPECI report.
///
/// Skips the report type and station identifier, and stops at remarks or a
/// trend forecast so that forecast weather is not taken as observed.
#[must_use]
pub fn phenomena_from_report(report: &str) -> BTreeSet<Phenomenon> {
    let mut tokens = report.split_whitespace().peekable();
    if matches!(tokens.peek(), Some(&"METAR" | &"SPECI")) {
        tokens.next();
    }
    tokens.next(); // station

    tokens
        .take_while(|t| !matches!(*t, "RMK" | "TEMPO" | "BECMG" | "NOSIG"))
        .filter_map(WeatherGroup::parse)
        .flat_map(|g| g.phenomena())
        .collect()
}

/// Keyword fallback for plain-text descriptions such as "Light Rain and Fog/Mist".
#[must_use]
pub fn phenomena_from_description(description: &str) -> BTreeSet<Phenomenon> {
    let text = description.to_lowercase();
    let mut out = BTreeSet::new();

    if text.contains("thunder") {
        out.insert(Phenomenon::Thunderstorm);
    }
    if text.contains("freezing rain") || text.contains("freezing drizzle") {
        out.insert(Phenomenon::FreezingPrecipitation);
    }
    if text.contains("mist") {
        out.insert(Phenomenon::Mist);
    }
    if text.contains("freezing fog") {
        out.insert(Phenomenon::DenseFog);
    } else if text.contains("patches of fog") || text.contains("shallow fog") {
        out.insert(Phenomenon::ShallowFog);
    } else if text.replace("fog/mist", "").contains("fog") {
        out.insert(Phenomenon::DenseFog);
    }
    if text.contains("hail") {
        out.insert(Phenomenon::Hail);
    }
    if text.contains("ice pellets") {
        out.insert(Phenomenon::IcePellets);
    }
    if text.contains("snow") {
        out.insert(Phenomenon::Snow);
    }
    if text.contains("drizzle") && !text.contains("freezing drizzle") {
        out.insert(Phenomenon::Drizzle);
    }
    if (text.contains("rain") && !text.contains("freezing rain")) || text.contains("shower") {
        out.insert(Phenomenon::Rain);
    }
    if text.contains("haze") {
        out.insert(Phenomenon::Haze);
    }
    if text.contains("smoke") {
        out.insert(Phenomenon::Smoke);
    }
    if text.contains("funnel cloud") || text.contains("tornado") {
        out.insert(Phenomenon::FunnelCloud);
    }
    if text.contains("squall") {
        out.insert(Phenomenon::Squall);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(items: &[Phenomenon]) -> BTreeSet<Phenomenon> {
        items.iter().copied().collect()
    }

    #[rstest]
    #[case("-TSRA", &[Phenomenon::Thunderstorm, Phenomenon::Rain])]
    #[case("VCTS", &[Phenomenon::Thunderstorm])]
    #[case("TS", &[Phenomenon::Thunderstorm])]
    #[case("-FZRA", &[Phenomenon::FreezingPrecipitation])]
    #[case("FZDZ", &[Phenomenon::FreezingPrecipitation])]
    #[case("FZFG", &[Phenomenon::DenseFog])]
    #[case("FG", &[Phenomenon::DenseFog])]
    #[case("BCFG", &[Phenomenon::ShallowFog])]
    #[case("MIFG", &[Phenomenon::ShallowFog])]
    #[case("VCFG", &[Phenomenon::ShallowFog])]
    #[case("BR", &[Phenomenon::Mist])]
    #[case("+SHRASN", &[Phenomenon::Rain, Phenomenon::Snow])]
    #[case("BLSN", &[Phenomenon::Snow])]
    #[case("VCSH", &[Phenomenon::Rain])]
    #[case("GR", &[Phenomenon::Hail])]
    #[case("-PL", &[Phenomenon::IcePellets])]
    #[case("+FC", &[Phenomenon::FunnelCloud])]
    #[case("SQ", &[Phenomenon::Squall])]
    #[case("HZ", &[Phenomenon::Haze])]
    #[case("UP", &[Phenomenon::UnknownPrecipitation])]
    fn test_group_classification(#[case] token: &str, #[case] expected: &[Phenomenon]) {
        let group = WeatherGroup::parse(token).expect("should parse as weather group");
        assert_eq!(group.phenomena(), set(expected));
    }

    #[rstest]
    #[case("KORD")]
    #[case("AUTO")]
    #[case("RMK")]
    #[case("FEW020")]
    #[case("CLR")]
    #[case("CAVOK")]
    #[case("10SM")]
    #[case("SH")]
    #[case("RATS")]
    #[case("+VCTS")]
    #[case("")]
    fn test_non_weather_tokens(#[case] token: &str) {
        assert!(WeatherGroup::parse(token).is_none(), "{token} parsed as weather");
    }

    #[test]
    fn test_parse_intensity() {
        let group = WeatherGroup::parse("+TSRA").unwrap();
        assert_eq!(group.intensity, Intensity::Heavy);
        assert_eq!(group.descriptor, Some("TS"));
        assert_eq!(group.codes, vec!["RA"]);
        assert!(!group.in_vicinity);
    }

    #[test]
    fn test_groups_string() {
        assert_eq!(
            phenomena_from_groups("-RA BR"),
            set(&[Phenomenon::Mist, Phenomenon::Rain])
        );
        assert!(phenomena_from_groups("").is_empty());
    }

    #[test]
    fn test_full_report() {
        let raw = "METAR KORD 011451Z 24012G21KT 3SM -TSRA BR BKN015CB OVC030 18/16 A2992 RMK AO2 TSB32 FG";
        assert_eq!(
            phenomena_from_report(raw),
            set(&[Phenomenon::Thunderstorm, Phenomenon::Mist, Phenomenon::Rain])
        );
    }

    #[test]
    fn test_report_trend_is_ignored() {
        let raw = "EGLL 011450Z 22010KT 9999 FEW030 15/08 Q1012 TEMPO 4000 SHRA";
        assert!(phenomena_from_report(raw).is_empty());
    }

    #[test]
    fn test_report_without_type_prefix() {
        let raw = "KSEA 011453Z 00000KT 1/4SM FG VV002 08/08 A3011";
        assert_eq!(phenomena_from_report(raw), set(&[Phenomenon::DenseFog]));
    }

    #[rstest]
    #[case("Light Rain and Fog/Mist", &[Phenomenon::Mist, Phenomenon::Rain])]
    #[case("Thunderstorms and Rain", &[Phenomenon::Thunderstorm, Phenomenon::Rain])]
    #[case("Freezing Rain", &[Phenomenon::FreezingPrecipitation])]
    #[case("Fog", &[Phenomenon::DenseFog])]
    #[case("Patches of Fog", &[Phenomenon::ShallowFog])]
    #[case("Light Snow Showers", &[Phenomenon::Snow, Phenomenon::Rain])]
    #[case("Mostly Cloudy", &[])]
    #[case("", &[])]
    fn test_description_fallback(#[case] text: &str, #[case] expected: &[Phenomenon]) {
        assert_eq!(phenomena_from_description(text), set(expected));
    }
}
