use crate::accuracy::AccuracyQuality;
use crate::args::{Action, Format};
use crate::capture::Capture;
use crate::selector::Selection;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct CaptureOutput<'a> {
    pub action: Action,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub address: &'a str,
    pub timestamp: DateTime<Utc>,
    pub quality: AccuracyQuality,
    pub selection: Selection,
    pub attempts: usize,
    pub failures: usize,
    pub provider: &'a str,
}

impl<'a> CaptureOutput<'a> {
    pub fn new(action: Action, capture: &'a Capture, provider: &'a str) -> Self {
        Self {
            action,
            latitude: capture.reading.latitude,
            longitude: capture.reading.longitude,
            accuracy_m: capture.reading.accuracy,
            address: &capture.reading.address,
            timestamp: capture.reading.timestamp,
            quality: capture.quality,
            selection: capture.selection,
            attempts: capture.attempts,
            failures: capture.failures,
            provider,
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn render(format: &Format, out: &CaptureOutput<'_>) -> Result<String, serde_json::Error> {
    let rendered = match format {
        Format::Json => serde_json::to_string(out)?,
        Format::Csv => format!(
            "{},{},{},{},{},{},{}",
            out.latitude,
            out.longitude,
            out.accuracy_m,
            out.timestamp.to_rfc3339(),
            out.provider,
            out.quality,
            csv_field(out.address)
        ),
        Format::Env => [
            format!("LAT={}", out.latitude),
            format!("LON={}", out.longitude),
            format!("ACC={}", out.accuracy_m),
            format!("ADDRESS={}", shell_quote(out.address)),
            format!("QUALITY={}", out.quality),
            format!("PROVIDER={}", out.provider),
            format!("TS={}", out.timestamp.to_rfc3339()),
        ]
        .join("\n"),
        Format::Plain => format!(
            "{} {} (±{} m @ {}) {}",
            out.latitude,
            out.longitude,
            (out.accuracy_m * 10.0).round() / 10.0,
            out.timestamp.to_rfc3339(),
            out.address
        ),
    };
    Ok(rendered)
}
