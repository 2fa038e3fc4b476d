//! Verdict, triggered rules and the aggregated assessment

use std::fmt;

use serde::{Deserialize, Serialize};

use super::weather::Phenomenon;

/// Overall go/no-go decision, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "NO-FLY")]
    NoFly,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Caution => write!(f, "CAUTION"),
            Verdict::NoFly => write!(f, "NO-FLY"),
        }
    }
}

/// A rule that can trigger during evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "phenomenon")]
pub enum Rule {
    HighWind,
    ElevatedWind,
    HighGusts,
    LowVisibility,
    ReducedVisibility,
    Weather(Phenomenon),
    TemperatureOutOfRange,
    HighKp,
    ElevatedKp,
    NoDaylight,
    NightFlight,
}

impl Rule {
    /// Short, stable label shown to the operator
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Rule::HighWind => "high wind",
            Rule::ElevatedWind => "elevated wind",
            Rule::HighGusts => "high gusts",
            Rule::LowVisibility => "low visibility",
            Rule::ReducedVisibility => "reduced visibility",
            Rule::Weather(phenomenon) => phenomenon.label(),
            Rule::TemperatureOutOfRange => "temperature out of range",
            Rule::HighKp => "high Kp index",
            Rule::ElevatedKp => "elevated Kp index",
            Rule::NoDaylight => "no daylight",
            Rule::NightFlight => "night flight",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A triggered rule with the severity it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub rule: Rule,
    pub severity: Verdict,
    /// Measured value against its limit
    pub detail: String,
}

impl Reason {
    #[must_use]
    pub fn new<S: Into<String>>(rule: Rule, severity: Verdict, detail: S) -> Self {
        Self {
            rule,
            severity,
            detail: detail.into(),
        }
    }
}

/// Aggregated result of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub verdict: Verdict,
    pub reasons: Vec<Reason>,
}

impl Assessment {
    /// Aggregate reasons: the verdict is the most severe one, `Safe` when empty.
    #[must_use]
    pub fn from_reasons(reasons: Vec<Reason>) -> Self {
        let verdict = reasons
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Verdict::Safe);
        Self { verdict, reasons }
    }

    /// Labels of every triggered rule, in evaluation order
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.reasons.iter().map(|r| r.rule.label()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::Safe < Verdict::Caution);
        assert!(Verdict::Caution < Verdict::NoFly);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::NoFly).unwrap(), "\"NO-FLY\"");
        assert_eq!(Verdict::Caution.to_string(), "CAUTION");
    }

    #[test]
    fn test_empty_reasons_is_safe() {
        let assessment = Assessment::from_reasons(Vec::new());
        assert_eq!(assessment.verdict, Verdict::Safe);
        assert!(assessment.labels().is_empty());
    }

    #[test]
    fn test_most_severe_reason_wins() {
        let assessment = Assessment::from_reasons(vec![
            Reason::new(Rule::ElevatedWind, Verdict::Caution, "20 kt"),
            Reason::new(Rule::NoDaylight, Verdict::NoFly, "after sunset"),
            Reason::new(Rule::ElevatedKp, Verdict::Caution, "Kp 5"),
        ]);
        assert_eq!(assessment.verdict, Verdict::NoFly);
        assert_eq!(
            assessment.labels(),
            vec!["elevated wind", "no daylight", "elevated Kp index"]
        );
    }

    #[test]
    fn test_weather_rule_uses_phenomenon_label() {
        assert_eq!(Rule::Weather(Phenomenon::Thunderstorm).label(), "thunderstorm");
        let json = serde_json::to_value(Rule::Weather(Phenomenon::DenseFog)).unwrap();
        assert_eq!(json["rule"], "weather");
        assert_eq!(json["phenomenon"], "dense_fog");
    }
}
