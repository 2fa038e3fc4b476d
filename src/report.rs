//! Rendering of flight reports for the terminal and for scripts

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::FlightCheckError;
use crate::flight_check::FlightReport;
use crate::models::Verdict;

const DISCLAIMER: &str = "Advisory only. The remote pilot remains responsible for checking airspace, \
                          local regulations and conditions on site before every flight.";

/// Envelope for JSON output
#[derive(Debug, Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Debug, Serialize)]
pub struct JsonError {
    /// `cannot_evaluate` or `error`
    pub kind: &'static str,
    pub message: String,
}

fn local_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%H:%M %Z").to_string()
}

fn headline(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Safe => "SAFE to fly",
        Verdict::Caution => "CAUTION: fly only with extra care",
        Verdict::NoFly => "NO-FLY: do not launch",
    }
}

/// Human-readable report
#[must_use]
pub fn render_text(report: &FlightReport, tz: Tz) -> String {
    let weather = &report.weather;
    let mut lines = Vec::new();

    if report.aircraft.is_empty() {
        lines.push(format!(
            "Flight check at {}",
            report.location.format_coordinates()
        ));
    } else {
        lines.push(format!(
            "Flight check for {} at {}",
            report.aircraft,
            report.location.format_coordinates()
        ));
    }
    lines.push(format!(
        "Verdict: {}",
        headline(report.assessment.verdict)
    ));
    lines.push(String::new());

    let station = match &weather.station_name {
        Some(name) => format!("{} {}", weather.station_id, name),
        None => weather.station_id.clone(),
    };
    lines.push(format!(
        "Station:      {} ({:.1} km away, observed {}, {} min ago)",
        station,
        weather.distance_km,
        local_time(weather.observed_at, tz),
        weather.age_minutes(report.evaluated_at)
    ));
    lines.push(format!(
        "Wind:         {:.1} kt at altitude, {} reported",
        report.adjusted_wind_kt,
        weather.format_wind()
    ));
    if let Some(gust) = report.adjusted_gust_kt {
        lines.push(format!("Gusts:        {gust:.1} kt at altitude"));
    }
    lines.push(format!("Visibility:   {}", weather.format_visibility()));
    lines.push(format!("Temperature:  {}", weather.format_temperature()));
    lines.push(format!("Weather:      {}", weather.format_phenomena()));
    if let Some(raw) = &weather.raw_report {
        lines.push(format!("METAR:        {raw}"));
    }
    lines.push(format!(
        "Space wx:     {}",
        report.space_weather.format_kp()
    ));

    let daylight = &report.daylight;
    let sun = match (daylight.sunrise, daylight.sunset) {
        (Some(rise), Some(set)) => format!(
            " (sunrise {}, sunset {})",
            local_time(rise, tz),
            local_time(set, tz)
        ),
        _ if daylight.is_daylight => " (polar day)".to_string(),
        _ => " (polar night)".to_string(),
    };
    lines.push(format!(
        "Daylight:     {}{}",
        if daylight.is_daylight { "yes" } else { "no" },
        sun
    ));

    lines.push(String::new());
    if report.assessment.reasons.is_empty() {
        lines.push("Reasons: none, all checks passed".to_string());
    } else {
        lines.push("Reasons:".to_string());
        for reason in &report.assessment.reasons {
            lines.push(format!(
                "  [{}] {}: {}",
                reason.severity,
                reason.rule.label(),
                reason.detail
            ));
        }
    }

    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());
    lines.join("\n")
}

/// Pretty-printed JSON report
pub fn render_json(report: &FlightReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonOut {
        ok: true,
        data: Some(report),
        error: None,
    })
}

/// Text shown when no verdict could be produced
#[must_use]
pub fn render_cannot_evaluate(error: &FlightCheckError) -> String {
    format!(
        "Verdict: CANNOT EVALUATE\n{}\nDo not fly until current conditions can be verified.",
        error.user_message()
    )
}

/// JSON error envelope for any failure
pub fn render_error_json(error: &FlightCheckError) -> serde_json::Result<String> {
    let kind = if error.is_cannot_evaluate() {
        "cannot_evaluate"
    } else {
        "error"
    };
    serde_json::to_string_pretty(&JsonOut::<()> {
        ok: false,
        data: None,
        error: Some(JsonError {
            kind,
            message: error.to_string(),
        }),
    })
}
