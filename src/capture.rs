use crate::accuracy::{AccuracyQuality, AccuracyThresholds};
use crate::clock::Clock;
use crate::error::CaptureError;
use crate::geocode::ReverseGeocoder;
use crate::location::LocationReading;
use crate::providers::LocationProvider;
use crate::sampler::{Sampler, SamplingReport};
use crate::selector::{select_reading, Selection, SelectionPolicy};
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub reading: LocationReading,
    pub selection: Selection,
    pub quality: AccuracyQuality,
    pub attempts: usize,
    pub failures: usize,
}

impl Capture {
    pub fn warning(&self) -> Option<String> {
        self.quality.warning(self.reading.accuracy)
    }

    pub fn is_rejected(&self) -> bool {
        self.quality == AccuracyQuality::Rejected
    }
}

pub async fn capture<P, G, C>(
    sampler: &Sampler<P, G, C>,
    policy: &SelectionPolicy,
    thresholds: &AccuracyThresholds,
) -> Result<Capture, CaptureError>
where
    P: LocationProvider,
    G: ReverseGeocoder,
    C: Clock,
{
    let report = sampler.sample().await?;
    debug!(
        "sampled {} attempt(s) in {} ms",
        report.attempts.len(),
        (report.finished_at - report.started_at).num_milliseconds()
    );
    reconcile(&report, policy, thresholds)
}

pub fn reconcile(
    report: &SamplingReport,
    policy: &SelectionPolicy,
    thresholds: &AccuracyThresholds,
) -> Result<Capture, CaptureError> {
    let readings = report.readings();
    if readings.is_empty() {
        return Err(CaptureError::LocationCaptureFailed {
            attempts: report.attempts.len(),
            last_error: report.last_error().cloned(),
        });
    }

    let (reading, selection) =
        select_reading(&readings, policy).ok_or(CaptureError::LocationCaptureFailed {
            attempts: report.attempts.len(),
            last_error: None,
        })?;
    let quality = thresholds.assess(reading.accuracy);
    info!(
        "selected {:.6}, {:.6} ±{:.1} m ({:?}, {} of {} readings, {})",
        reading.latitude,
        reading.longitude,
        reading.accuracy,
        selection,
        readings.len(),
        report.attempts.len(),
        quality
    );

    let capture = Capture {
        reading: reading.clone(),
        selection,
        quality,
        attempts: report.attempts.len(),
        failures: report.failures().count(),
    };
    if let Some(message) = capture.warning() {
        warn!("{message}");
    }
    Ok(capture)
}
