use crate::accuracy::AccuracyThresholds;
use crate::geocode::NOMINATIM_URL;
use crate::sampler::SamplerConfig;
use crate::selector::SelectionPolicy;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "geo-checkin")]
#[command(about = "Capture the most trustworthy location fix for an attendance check-in")]
#[command(
    after_help = "The ip provider reports a coarse ±5000 m fix, beyond the default reject \
threshold; raise --reject-accuracy or pass --allow-inaccurate when relying on it."
)]
#[command(version = "geo-checkin 0.1.0\nProviders: corelocation (macOS), ip (portable fallback)")]
pub struct Args {
    #[arg(long, value_enum, default_value = "check-in")]
    pub action: Action,

    #[arg(long, value_enum, default_value = "plain", env = "GEO_CHECKIN_FORMAT")]
    pub format: Format,

    #[arg(long, value_enum, default_value = "auto", env = "GEO_CHECKIN_PROVIDER")]
    pub provider: Provider,

    /// Maximum number of fixes to sample
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub readings: u32,

    /// Seconds to wait for each fix
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    #[arg(long, default_value = "2000")]
    pub interval_ms: u64,

    /// Seconds to wait for each address lookup
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub geocode_timeout: u64,

    #[arg(long)]
    pub no_geocode: bool,

    #[arg(long, default_value = NOMINATIM_URL, env = "GEO_CHECKIN_GEOCODER_URL")]
    pub geocoder_url: String,

    #[arg(long, default_value = "50", env = "GEO_CHECKIN_EXCELLENT_ACCURACY")]
    pub excellent_accuracy: f64,

    #[arg(long, default_value = "100", env = "GEO_CHECKIN_GOOD_ACCURACY")]
    pub good_accuracy: f64,

    #[arg(long, default_value = "500", env = "GEO_CHECKIN_POOR_ACCURACY")]
    pub poor_accuracy: f64,

    #[arg(long, default_value = "2000", env = "GEO_CHECKIN_REJECT_ACCURACY")]
    pub reject_accuracy: f64,

    /// Readings within this many metres of each other agree
    #[arg(long, default_value = "500", env = "GEO_CHECKIN_CONSISTENCY_RADIUS")]
    pub consistency_radius: f64,

    /// Print and exit successfully even when accuracy is beyond the reject threshold
    #[arg(long)]
    pub allow_inaccurate: bool,

    #[arg(long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    CheckIn,
    CheckOut,
    ReCheckIn,
}

#[derive(Clone, ValueEnum)]
pub enum Format {
    Json,
    Csv,
    Env,
    Plain,
}

#[derive(Clone, ValueEnum)]
pub enum Provider {
    Auto,
    Corelocation,
    Ip,
}

impl Args {
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            max_readings: self.readings as usize,
            attempt_timeout: Duration::from_secs(self.timeout),
            attempt_interval: Duration::from_millis(self.interval_ms),
            geocode_timeout: Duration::from_secs(self.geocode_timeout),
            early_stop_accuracy_m: self.excellent_accuracy,
        }
    }

    pub fn selection_policy(&self) -> Result<SelectionPolicy, String> {
        if !self.consistency_radius.is_finite() || self.consistency_radius < 0.0 {
            return Err(format!(
                "consistency radius {} must be a non-negative number",
                self.consistency_radius
            ));
        }
        Ok(SelectionPolicy {
            excellent_accuracy_m: self.excellent_accuracy,
            consistency_radius_m: self.consistency_radius,
        })
    }

    pub fn thresholds(&self) -> Result<AccuracyThresholds, String> {
        let thresholds = AccuracyThresholds {
            excellent_m: self.excellent_accuracy,
            good_m: self.good_accuracy,
            poor_m: self.poor_accuracy,
            reject_m: self.reject_accuracy,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }
}
