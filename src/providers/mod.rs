use crate::error::PositionError;
use crate::location::Fix;
use std::time::Duration;

#[cfg(target_os = "macos")]
pub mod corelocation;
pub mod ip;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    // Zero forces a fresh fix.
    pub max_cache_age: Duration,
}

impl PositionRequest {
    pub fn fresh(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            max_cache_age: Duration::ZERO,
        }
    }
}

pub trait LocationProvider {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    async fn request_location(&self, request: &PositionRequest) -> Result<Fix, PositionError>;
}

#[cfg(not(target_os = "macos"))]
pub mod corelocation {
    use super::{LocationProvider, PositionRequest};
    use crate::error::PositionError;
    use crate::location::Fix;

    pub struct CoreLocationProvider;

    impl LocationProvider for CoreLocationProvider {
        fn name(&self) -> &'static str {
            "corelocation"
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn request_location(&self, _request: &PositionRequest) -> Result<Fix, PositionError> {
            log::debug!("CoreLocation provider requires macOS");
            Err(PositionError::Unavailable)
        }
    }
}

pub enum DeviceProvider {
    CoreLocation(corelocation::CoreLocationProvider),
    Ip(ip::IpProvider),
}

impl DeviceProvider {
    pub fn resolve(requested: &crate::args::Provider) -> Self {
        use crate::args::Provider;

        match requested {
            Provider::Corelocation => DeviceProvider::CoreLocation(corelocation::CoreLocationProvider),
            Provider::Ip => DeviceProvider::Ip(ip::IpProvider::new()),
            Provider::Auto => {
                let native = corelocation::CoreLocationProvider;
                if native.is_available() {
                    DeviceProvider::CoreLocation(native)
                } else {
                    log::warn!(
                        "CoreLocation unavailable, using IP geolocation (±{} m)",
                        ip::IP_ACCURACY_M
                    );
                    DeviceProvider::Ip(ip::IpProvider::new())
                }
            }
        }
    }
}

impl LocationProvider for DeviceProvider {
    fn name(&self) -> &'static str {
        match self {
            DeviceProvider::CoreLocation(p) => p.name(),
            DeviceProvider::Ip(p) => p.name(),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            DeviceProvider::CoreLocation(p) => p.is_available(),
            DeviceProvider::Ip(p) => p.is_available(),
        }
    }

    async fn request_location(&self, request: &PositionRequest) -> Result<Fix, PositionError> {
        match self {
            DeviceProvider::CoreLocation(p) => p.request_location(request).await,
            DeviceProvider::Ip(p) => p.request_location(request).await,
        }
    }
}
