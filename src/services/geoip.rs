use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving an IP location
#[derive(Debug, Error)]
pub enum GeoIpError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl GeoIpError {
    pub fn is_unreachable(&self) -> bool {
        match self {
            GeoIpError::RequestError(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Raw geolocation API payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpResponse {
    pub status: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "regionName", default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// The IP the service resolved, echoed back
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A successful geolocation result
#[derive(Debug, Clone)]
pub struct GeoIpLocation {
    pub lat: f64,
    pub lon: f64,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub ip: Option<String>,
}

/// Client for the third-party IP-geolocation API
pub struct IpGeoClient {
    base_url: String,
    client: Client,
}

impl IpGeoClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }

    /// Resolve a location for `ip`, or for the service's own vantage point
    /// when `ip` is None (private/loopback callers)
    pub async fn lookup(&self, ip: Option<&str>) -> Result<GeoIpLocation, GeoIpError> {
        let base = self.base_url.trim_end_matches('/');
        let url = match ip {
            Some(ip) => format!("{}/{}", base, ip),
            None => base.to_string(),
        };

        tracing::debug!("Geolocation lookup: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeoIpError::LookupFailed(format!(
                "geolocation service returned {}",
                response.status()
            )));
        }

        let payload: GeoIpResponse = response.json().await?;

        if payload.status != "success" {
            let message = payload
                .message
                .unwrap_or_else(|| "unknown geolocation failure".to_string());
            return Err(GeoIpError::LookupFailed(message));
        }

        let (Some(lat), Some(lon)) = (payload.lat, payload.lon) else {
            return Err(GeoIpError::InvalidResponse(
                "success payload missing coordinates".to_string(),
            ));
        };

        Ok(GeoIpLocation {
            lat,
            lon,
            city: payload.city,
            region: payload.region_name,
            country: payload.country,
            ip: payload.query,
        })
    }
}

/// Normalize a forwarded client IP for geolocation.
///
/// IPv6-mapped IPv4 prefixes are stripped. Returns None for private,
/// loopback, link-local, and unparseable addresses; the lookup then omits
/// the IP parameter and the geolocation service resolves its own vantage
/// point.
pub fn normalize_client_ip(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let candidate = trimmed.strip_prefix("::ffff:").unwrap_or(trimmed);

    let addr: IpAddr = candidate.parse().ok()?;
    let addr = match addr {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    };

    if is_non_routable(addr) {
        None
    } else {
        Some(addr.to_string())
    }
}

fn is_non_routable(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local plus loopback/unspecified
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}
