use crate::distance::distance_between;
use crate::location::LocationReading;

pub const DEFAULT_CONSISTENCY_RADIUS_M: f64 = 500.0;

pub fn consistent_readings(readings: &[LocationReading], radius_m: f64) -> Vec<&LocationReading> {
    if readings.len() < 2 {
        return readings.iter().collect();
    }

    readings
        .iter()
        .enumerate()
        .filter(|(i, candidate)| {
            readings
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && distance_between(candidate, other) <= radius_m)
        })
        .map(|(_, r)| r)
        .collect()
}
