use crate::error::GeocodeError;
use serde::Deserialize;
use std::time::Duration;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const USER_AGENT: &str = concat!("geo-checkin/", env!("CARGO_PKG_VERSION"));

pub trait ReverseGeocoder {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, GeocodeError>;
}

#[derive(Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    error: Option<String>,
}

pub struct Nominatim {
    client: reqwest::Client,
    url: String,
}

impl Nominatim {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

fn address_from_response(resp: NominatimResponse) -> Result<String, GeocodeError> {
    if let Some(err) = resp.error {
        log::debug!("nominatim: {err}");
        return Err(GeocodeError::MissingAddress);
    }
    resp.display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(GeocodeError::MissingAddress)
}

impl ReverseGeocoder for Nominatim {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: NominatimResponse = resp.json().await?;
        address_from_response(body)
    }
}

pub struct NoGeocoder;

impl ReverseGeocoder for NoGeocoder {
    async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        Err(GeocodeError::Disabled)
    }
}

pub enum Geocoder {
    Nominatim(Nominatim),
    Disabled(NoGeocoder),
}

impl ReverseGeocoder for Geocoder {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        match self {
            Geocoder::Nominatim(g) => g.reverse_geocode(lat, lon).await,
            Geocoder::Disabled(g) => g.reverse_geocode(lat, lon).await,
        }
    }
}
