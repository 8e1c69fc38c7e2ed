use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("positioning unavailable")]
    Unavailable,
    #[error("timed out waiting for a location fix")]
    Timeout,
    #[error("location permission denied")]
    Denied,
    #[error("invalid fix: {0}")]
    InvalidFix(String),
    #[error("positioning error: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timed out waiting for geocoding response")]
    Timeout,
    #[error("geocoding response carried no address")]
    MissingAddress,
    #[error("reverse geocoding disabled")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("positioning is not available on this device")]
    PositioningUnavailable,
    #[error("{}", capture_failed_message(.attempts, .last_error))]
    LocationCaptureFailed {
        attempts: usize,
        last_error: Option<PositionError>,
    },
}

fn capture_failed_message(attempts: &usize, last_error: &Option<PositionError>) -> String {
    match last_error {
        Some(err) => format!("could not capture location after {attempts} attempt(s): {err}"),
        None => format!("could not capture location after {attempts} attempt(s)"),
    }
}
