use crate::clock::Clock;
use crate::error::{CaptureError, GeocodeError, PositionError};
use crate::geocode::ReverseGeocoder;
use crate::location::{coordinate_address, Fix, LocationReading};
use crate::providers::{LocationProvider, PositionRequest};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub max_readings: usize,
    pub attempt_timeout: Duration,
    pub attempt_interval: Duration,
    pub geocode_timeout: Duration,
    // A reading this accurate ends sampling, except on the first attempt.
    pub early_stop_accuracy_m: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_readings: 3,
            attempt_timeout: Duration::from_secs(15),
            attempt_interval: Duration::from_millis(2000),
            geocode_timeout: Duration::from_secs(5),
            early_stop_accuracy_m: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub index: usize,
    pub result: Result<LocationReading, PositionError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingReport {
    pub attempts: Vec<Attempt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SamplingReport {
    pub fn readings(&self) -> Vec<LocationReading> {
        self.attempts
            .iter()
            .filter_map(|a| a.result.as_ref().ok().cloned())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PositionError> {
        self.attempts.iter().filter_map(|a| a.result.as_ref().err())
    }

    pub fn last_error(&self) -> Option<&PositionError> {
        self.failures().last()
    }
}

pub struct Sampler<P, G, C> {
    provider: P,
    geocoder: G,
    clock: C,
    config: SamplerConfig,
}

impl<P, G, C> Sampler<P, G, C>
where
    P: LocationProvider,
    G: ReverseGeocoder,
    C: Clock,
{
    pub fn new(provider: P, geocoder: G, clock: C, config: SamplerConfig) -> Self {
        Self {
            provider,
            geocoder,
            clock,
            config,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn sample(&self) -> Result<SamplingReport, CaptureError> {
        if !self.provider.is_available() {
            return Err(CaptureError::PositioningUnavailable);
        }

        let started_at = self.clock.now();
        let request = PositionRequest::fresh(self.config.attempt_timeout);
        let mut attempts = Vec::with_capacity(self.config.max_readings);

        for index in 0..self.config.max_readings {
            let attempt = Attempt {
                index,
                result: self.attempt(&request).await,
            };
            match &attempt.result {
                Ok(reading) => debug!(
                    "attempt {}: {:.6}, {:.6} ±{:.1} m",
                    attempt.index + 1,
                    reading.latitude,
                    reading.longitude,
                    reading.accuracy
                ),
                Err(err) => warn!("attempt {} failed: {}", attempt.index + 1, err),
            }

            let stop = matches!(
                &attempt.result,
                Ok(r) if index > 0 && r.accuracy <= self.config.early_stop_accuracy_m
            );
            attempts.push(attempt);
            if stop {
                debug!("accurate fix on attempt {}, stopping early", index + 1);
                break;
            }
            if index + 1 < self.config.max_readings {
                self.clock.sleep(self.config.attempt_interval).await;
            }
        }

        Ok(SamplingReport {
            attempts,
            started_at,
            finished_at: self.clock.now(),
        })
    }

    async fn attempt(&self, request: &PositionRequest) -> Result<LocationReading, PositionError> {
        let pending = self.provider.request_location(request);
        let fix = match tokio::time::timeout(request.timeout, pending).await {
            Ok(result) => result?,
            Err(_) => return Err(PositionError::Timeout),
        };
        let fix = fix.validate()?;
        let address = self.resolve_address(&fix).await;
        Ok(LocationReading::from_fix(fix, address))
    }

    async fn resolve_address(&self, fix: &Fix) -> String {
        let lookup = self.geocoder.reverse_geocode(fix.latitude, fix.longitude);
        let result = match tokio::time::timeout(self.config.geocode_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Timeout),
        };
        match result {
            Ok(address) => address,
            Err(err) => {
                debug!("reverse geocoding failed: {err}");
                coordinate_address(fix.latitude, fix.longitude)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fix, FailingGeocoder, FakeClock, HangingGeocoder, ScriptedProvider, StaticGeocoder,
    };

    fn sampler(
        script: Vec<Result<Fix, PositionError>>,
    ) -> Sampler<ScriptedProvider, StaticGeocoder, FakeClock> {
        Sampler::new(
            ScriptedProvider::new(script),
            StaticGeocoder("Somewhere".into()),
            FakeClock::default(),
            SamplerConfig::default(),
        )
    }

    #[tokio::test]
    async fn collects_all_attempts_when_none_are_excellent() {
        let s = sampler(vec![
            Ok(fix(1.0, 1.0, 80.0)),
            Ok(fix(1.0, 1.0, 120.0)),
            Ok(fix(1.0, 1.0, 60.0)),
        ]);
        let report = s.sample().await.unwrap();
        assert_eq!(report.readings().len(), 3);
        assert_eq!(s.provider.calls(), 3);
        assert_eq!(s.clock.sleeps(), vec![Duration::from_millis(2000); 2]);
    }

    #[tokio::test]
    async fn excellent_second_reading_stops_early() {
        let s = sampler(vec![
            Ok(fix(1.0, 1.0, 80.0)),
            Ok(fix(1.0, 1.0, 50.0)),
            Ok(fix(1.0, 1.0, 10.0)),
        ]);
        let report = s.sample().await.unwrap();
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[1].index, 1);
        assert_eq!(s.provider.calls(), 2);
        assert_eq!(s.clock.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn excellent_first_reading_does_not_stop() {
        let s = sampler(vec![
            Ok(fix(1.0, 1.0, 5.0)),
            Ok(fix(1.0, 1.0, 300.0)),
            Ok(fix(1.0, 1.0, 300.0)),
        ]);
        let report = s.sample().await.unwrap();
        assert_eq!(report.attempts.len(), 3);
    }

    #[tokio::test]
    async fn failed_attempts_are_recorded_and_skipped() {
        let s = sampler(vec![
            Err(PositionError::Timeout),
            Ok(fix(1.0, 1.0, 200.0)),
            Err(PositionError::Denied),
        ]);
        let report = s.sample().await.unwrap();
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(report.readings().len(), 1);
        assert_eq!(
            report.failures().cloned().collect::<Vec<_>>(),
            vec![PositionError::Timeout, PositionError::Denied]
        );
        assert_eq!(report.last_error(), Some(&PositionError::Denied));
    }

    #[tokio::test]
    async fn invalid_fix_is_an_attempt_failure() {
        let s = Sampler::new(
            ScriptedProvider::new(vec![Ok(fix(1.0, 1.0, -1.0))]),
            StaticGeocoder("Somewhere".into()),
            FakeClock::default(),
            SamplerConfig {
                max_readings: 1,
                ..SamplerConfig::default()
            },
        );
        let report = s.sample().await.unwrap();
        assert_eq!(report.attempts.len(), 1);
        assert!(report.readings().is_empty());
        assert!(matches!(report.last_error(), Some(PositionError::InvalidFix(_))));
    }

    #[tokio::test]
    async fn unavailable_provider_fails_without_requests() {
        let s = Sampler::new(
            ScriptedProvider::unavailable(),
            StaticGeocoder("Somewhere".into()),
            FakeClock::default(),
            SamplerConfig::default(),
        );
        let err = s.sample().await.unwrap_err();
        assert!(matches!(err, CaptureError::PositioningUnavailable));
        assert_eq!(s.provider.calls(), 0);
        assert!(s.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn geocoded_address_is_attached() {
        let s = sampler(vec![Ok(fix(12.9716, 77.5946, 80.0))]);
        let report = s.sample().await.unwrap();
        assert_eq!(report.readings()[0].address, "Somewhere");
    }

    #[tokio::test]
    async fn geocode_failure_falls_back_to_coordinates() {
        let s = Sampler::new(
            ScriptedProvider::new(vec![Ok(fix(12.9716, 77.5946, 80.0))]),
            FailingGeocoder,
            FakeClock::default(),
            SamplerConfig {
                max_readings: 1,
                ..SamplerConfig::default()
            },
        );
        let report = s.sample().await.unwrap();
        assert_eq!(report.readings()[0].address, "12.971600, 77.594600");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geocoder_times_out_to_coordinates() {
        let s = Sampler::new(
            ScriptedProvider::new(vec![Ok(fix(12.9716, 77.5946, 80.0))]),
            HangingGeocoder,
            FakeClock::default(),
            SamplerConfig {
                max_readings: 1,
                ..SamplerConfig::default()
            },
        );
        let started = tokio::time::Instant::now();
        let report = s.sample().await.unwrap();
        assert_eq!(report.readings()[0].address, "12.971600, 77.594600");
        assert!(started.elapsed() >= s.config.geocode_timeout);
    }

    #[tokio::test]
    async fn single_attempt_never_sleeps() {
        let s = Sampler::new(
            ScriptedProvider::new(vec![Ok(fix(1.0, 1.0, 500.0))]),
            FailingGeocoder,
            FakeClock::default(),
            SamplerConfig {
                max_readings: 1,
                ..SamplerConfig::default()
            },
        );
        s.sample().await.unwrap();
        assert!(s.clock.sleeps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_times_out() {
        let s = Sampler::new(
            ScriptedProvider::hanging(),
            FailingGeocoder,
            FakeClock::default(),
            SamplerConfig {
                max_readings: 2,
                ..SamplerConfig::default()
            },
        );
        let report = s.sample().await.unwrap();
        assert_eq!(
            report.failures().cloned().collect::<Vec<_>>(),
            vec![PositionError::Timeout, PositionError::Timeout]
        );
    }
}
