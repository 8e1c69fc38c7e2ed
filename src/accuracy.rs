use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyThresholds {
    pub excellent_m: f64,
    pub good_m: f64,
    pub poor_m: f64,
    pub reject_m: f64,
}

impl Default for AccuracyThresholds {
    fn default() -> Self {
        Self {
            excellent_m: 50.0,
            good_m: 100.0,
            poor_m: 500.0,
            reject_m: 2_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyQuality {
    Excellent,
    Good,
    Poor,
    VeryPoor,
    Rejected,
}

impl AccuracyThresholds {
    pub fn assess(&self, accuracy_m: f64) -> AccuracyQuality {
        if accuracy_m <= self.excellent_m {
            AccuracyQuality::Excellent
        } else if accuracy_m <= self.good_m {
            AccuracyQuality::Good
        } else if accuracy_m <= self.poor_m {
            AccuracyQuality::Poor
        } else if accuracy_m <= self.reject_m {
            AccuracyQuality::VeryPoor
        } else {
            AccuracyQuality::Rejected
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let steps = [
            ("excellent", self.excellent_m),
            ("good", self.good_m),
            ("poor", self.poor_m),
            ("reject", self.reject_m),
        ];
        if let Some((name, value)) = steps.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(format!("{name} threshold {value} must be a non-negative number"));
        }
        for pair in steps.windows(2) {
            let ((lo_name, lo), (hi_name, hi)) = (pair[0], pair[1]);
            if lo > hi {
                return Err(format!(
                    "{lo_name} threshold ({lo} m) exceeds {hi_name} threshold ({hi} m)"
                ));
            }
        }
        Ok(())
    }
}

impl AccuracyQuality {
    pub fn warning(&self, accuracy_m: f64) -> Option<String> {
        match self {
            AccuracyQuality::Excellent | AccuracyQuality::Good => None,
            AccuracyQuality::Poor => Some(format!(
                "location accuracy is poor (±{:.0} m); retry outdoors for a better fix",
                accuracy_m
            )),
            AccuracyQuality::VeryPoor => Some(format!(
                "location accuracy is very poor (±{:.0} m); consider retrying before submitting",
                accuracy_m
            )),
            AccuracyQuality::Rejected => Some(format!(
                "location accuracy ±{:.0} m is too low to record attendance",
                accuracy_m
            )),
        }
    }
}

impl fmt::Display for AccuracyQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccuracyQuality::Excellent => "excellent",
            AccuracyQuality::Good => "good",
            AccuracyQuality::Poor => "poor",
            AccuracyQuality::VeryPoor => "very_poor",
            AccuracyQuality::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        let t = AccuracyThresholds::default();
        assert_eq!(t.assess(0.0), AccuracyQuality::Excellent);
        assert_eq!(t.assess(50.0), AccuracyQuality::Excellent);
        assert_eq!(t.assess(50.1), AccuracyQuality::Good);
        assert_eq!(t.assess(100.0), AccuracyQuality::Good);
        assert_eq!(t.assess(500.0), AccuracyQuality::Poor);
        assert_eq!(t.assess(2_000.0), AccuracyQuality::VeryPoor);
        assert_eq!(t.assess(2_000.5), AccuracyQuality::Rejected);
    }

    #[test]
    fn only_degraded_fixes_warn() {
        assert!(AccuracyQuality::Good.warning(80.0).is_none());
        let warning = AccuracyQuality::Poor.warning(250.4).unwrap();
        assert!(warning.contains("±250 m"), "{warning}");
        assert!(AccuracyQuality::Rejected.warning(5_000.0).is_some());
    }

    #[test]
    fn validate_rejects_out_of_order_thresholds() {
        let t = AccuracyThresholds {
            poor_m: 3_000.0,
            ..AccuracyThresholds::default()
        };
        let err = t.validate().unwrap_err();
        assert!(err.contains("poor threshold"), "{err}");
        assert!(AccuracyThresholds::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_thresholds() {
        let t = AccuracyThresholds {
            excellent_m: -1.0,
            ..AccuracyThresholds::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn display_matches_serialized_name() {
        let json = serde_json::to_string(&AccuracyQuality::VeryPoor).unwrap();
        assert_eq!(json, format!("\"{}\"", AccuracyQuality::VeryPoor));
    }
}
