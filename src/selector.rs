use crate::consistency::{consistent_readings, DEFAULT_CONSISTENCY_RADIUS_M};
use crate::location::LocationReading;
use log::debug;
use serde::Serialize;

pub const DEFAULT_EXCELLENT_ACCURACY_M: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub excellent_accuracy_m: f64,
    pub consistency_radius_m: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            excellent_accuracy_m: DEFAULT_EXCELLENT_ACCURACY_M,
            consistency_radius_m: DEFAULT_CONSISTENCY_RADIUS_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Only,
    Excellent,
    Consistent,
    BestAvailable,
}

// Equal accuracies resolve to the earliest reading. Returns `None` only for
// an empty set.
pub fn select_reading<'a>(
    readings: &'a [LocationReading],
    policy: &SelectionPolicy,
) -> Option<(&'a LocationReading, Selection)> {
    if let [only] = readings {
        return Some((only, Selection::Only));
    }

    let excellent = most_accurate(
        readings
            .iter()
            .filter(|r| r.accuracy <= policy.excellent_accuracy_m),
    );
    if let Some(best) = excellent {
        return Some((best, Selection::Excellent));
    }

    let consistent = consistent_readings(readings, policy.consistency_radius_m);
    debug!(
        "{} of {} readings agree within {} m",
        consistent.len(),
        readings.len(),
        policy.consistency_radius_m
    );
    if let Some(best) = most_accurate(consistent.into_iter()) {
        return Some((best, Selection::Consistent));
    }

    most_accurate(readings.iter()).map(|best| (best, Selection::BestAvailable))
}

fn most_accurate<'a>(
    readings: impl Iterator<Item = &'a LocationReading>,
) -> Option<&'a LocationReading> {
    readings.min_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
}
