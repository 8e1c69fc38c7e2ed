use super::{LocationProvider, PositionRequest};
use crate::error::PositionError;
use crate::location::Fix;
use chrono::Utc;
use serde::Deserialize;

const IP_API_URL: &str = "http://ip-api.com/json";

// ip-api reports no radius; city-level lookups are good to a few km at best.
pub const IP_ACCURACY_M: f64 = 5_000.0;

#[derive(Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

pub struct IpProvider {
    client: reqwest::Client,
    url: String,
}

impl IpProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            url: IP_API_URL.to_string(),
        }
    }
}

fn fix_from_response(resp: IpApiResponse) -> Result<Fix, PositionError> {
    if let Some(status) = resp.status.as_deref() {
        if status != "success" {
            let reason = resp.message.unwrap_or_else(|| status.to_string());
            return Err(PositionError::Failed(format!("ip-api: {reason}")));
        }
    }
    let lat = resp
        .lat
        .ok_or_else(|| PositionError::InvalidFix("missing latitude".into()))?;
    let lon = resp
        .lon
        .ok_or_else(|| PositionError::InvalidFix("missing longitude".into()))?;
    Ok(Fix::new(lat, lon, IP_ACCURACY_M, Utc::now()))
}

impl LocationProvider for IpProvider {
    fn name(&self) -> &'static str {
        "ip"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn request_location(&self, request: &PositionRequest) -> Result<Fix, PositionError> {
        log::debug!(
            "requesting IP-based geolocation from {} (high accuracy: {}, max age: {:?})",
            self.url,
            request.high_accuracy,
            request.max_cache_age
        );
        let resp = self
            .client
            .get(&self.url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(map_http_error)?;
        let body: IpApiResponse = resp.json().await.map_err(map_http_error)?;
        fix_from_response(body)
    }
}

fn map_http_error(err: reqwest::Error) -> PositionError {
    if err.is_timeout() {
        PositionError::Timeout
    } else {
        PositionError::Failed(err.to_string())
    }
}
