use crate::error::PositionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: lat,
            longitude: lon,
            accuracy,
            timestamp,
        }
    }

    pub fn validate(self) -> Result<Self, PositionError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(PositionError::InvalidFix(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(PositionError::InvalidFix(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        if !self.accuracy.is_finite() || self.accuracy < 0.0 {
            return Err(PositionError::InvalidFix(format!(
                "accuracy {} is not a radius",
                self.accuracy
            )));
        }
        Ok(self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub address: String,
    pub timestamp: DateTime<Utc>,
}

impl LocationReading {
    pub fn from_fix(fix: Fix, address: String) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            address,
            timestamp: fix.timestamp,
        }
    }
}

pub fn coordinate_address(lat: f64, lon: f64) -> String {
    format!("{:.6}, {:.6}", lat, lon)
}
