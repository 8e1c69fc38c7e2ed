use crate::clock::Clock;
use crate::error::{GeocodeError, PositionError};
use crate::geocode::ReverseGeocoder;
use crate::location::{coordinate_address, Fix, LocationReading};
use crate::providers::{LocationProvider, PositionRequest};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}

pub fn fix(lat: f64, lon: f64, accuracy: f64) -> Fix {
    Fix::new(lat, lon, accuracy, test_time())
}

pub fn reading(lat: f64, lon: f64, accuracy: f64) -> LocationReading {
    LocationReading::from_fix(fix(lat, lon, accuracy), coordinate_address(lat, lon))
}

enum Behaviour {
    Script,
    Unavailable,
    Hang,
}

pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Fix, PositionError>>>,
    calls: Mutex<usize>,
    behaviour: Behaviour,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Fix, PositionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
            behaviour: Behaviour::Script,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            behaviour: Behaviour::Unavailable,
            ..Self::new(Vec::new())
        }
    }

    pub fn hanging() -> Self {
        Self {
            behaviour: Behaviour::Hang,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl LocationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Unavailable)
    }

    async fn request_location(&self, _request: &PositionRequest) -> Result<Fix, PositionError> {
        *self.calls.lock().unwrap() += 1;
        if let Behaviour::Hang = self.behaviour {
            std::future::pending::<()>().await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Err(PositionError::Unavailable))
    }
}

pub struct StaticGeocoder(pub String);

impl ReverseGeocoder for StaticGeocoder {
    async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        Ok(self.0.clone())
    }
}

pub struct HangingGeocoder;

impl ReverseGeocoder for HangingGeocoder {
    async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        std::future::pending().await
    }
}

pub struct FailingGeocoder;

impl ReverseGeocoder for FailingGeocoder {
    async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        Err(GeocodeError::MissingAddress)
    }
}

#[derive(Default)]
pub struct FakeClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        test_time()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
