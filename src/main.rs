mod accuracy;
mod args;
mod capture;
mod clock;
mod consistency;
mod distance;
mod error;
mod geocode;
mod location;
mod output;
mod providers;
mod sampler;
mod selector;
#[cfg(test)]
mod testing;

use args::Args;
use clap::Parser;
use clock::SystemClock;
use geocode::{Geocoder, NoGeocoder, Nominatim};
use output::CaptureOutput;
use providers::{DeviceProvider, LocationProvider};
use sampler::Sampler;
use std::process::ExitCode;

const EXIT_INTERRUPTED: u8 = 130;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn build_geocoder(args: &Args) -> Geocoder {
    if args.no_geocode {
        return Geocoder::Disabled(NoGeocoder);
    }
    match Nominatim::new(&args.geocoder_url, args.sampler_config().geocode_timeout) {
        Ok(nominatim) => Geocoder::Nominatim(nominatim),
        Err(e) => {
            log::warn!("reverse geocoding disabled: {}", e);
            Geocoder::Disabled(NoGeocoder)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let thresholds = match args.thresholds() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("geo-checkin: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let policy = match args.selection_policy() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("geo-checkin: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider = DeviceProvider::resolve(&args.provider);
    let provider_name = provider.name();
    let sampler = Sampler::new(
        provider,
        build_geocoder(&args),
        SystemClock,
        args.sampler_config(),
    );
    log::info!(
        "capturing location for {:?} with {} provider",
        args.action,
        sampler.provider_name()
    );

    // dropping the capture future on Ctrl-C abandons any in-flight request
    let result = tokio::select! {
        result = capture::capture(&sampler, &policy, &thresholds) => result,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("location capture cancelled");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    let capture = match result {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("geo-checkin: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let out = CaptureOutput::new(args.action, &capture, provider_name);
    match output::render(&args.format, &out) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("geo-checkin: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if refuse_capture(&capture, args.allow_inaccurate) {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

// the warning itself is logged once while reconciling
fn refuse_capture(capture: &capture::Capture, allow_inaccurate: bool) -> bool {
    capture.is_rejected() && !allow_inaccurate
}
