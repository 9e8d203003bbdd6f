use crate::core::geo::{distance_between, round_distance_km, validate_coordinates};
use crate::models::{
    CoordinateSource, GeoPoint, ItemKind, ResolvedLocation, ScoredCandidate,
};
use crate::services::{normalize_client_ip, CandidateRepository, GeoIpError, IpGeoClient, StoreError};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by nearby resolution
#[derive(Debug, Error)]
pub enum NearbyError {
    #[error("{0}")]
    Validation(String),

    #[error("Unable to determine your location. Please provide latitude and longitude manually.")]
    Unresolvable,

    #[error("listing store error: {0}")]
    Store(#[from] StoreError),

    #[error("geolocation service error: {0}")]
    GeoIp(GeoIpError),
}

/// Which listing kinds a nearby query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearbyScope {
    Properties,
    Vehicles,
    All,
}

impl FromStr for NearbyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "properties" | "property" => Ok(NearbyScope::Properties),
            "vehicles" | "vehicle" => Ok(NearbyScope::Vehicles),
            "all" => Ok(NearbyScope::All),
            other => Err(format!("unknown nearby type: {}", other)),
        }
    }
}

/// Per-kind result caps for proximity queries
#[derive(Debug, Clone, Copy)]
pub struct NearbyLimits {
    pub property_limit: usize,
    pub vehicle_limit: usize,
}

impl Default for NearbyLimits {
    fn default() -> Self {
        Self {
            property_limit: 10,
            vehicle_limit: 50,
        }
    }
}

/// Proximity results, each list in the store's native order
#[derive(Debug, Default)]
pub struct NearbyListings {
    pub properties: Vec<ScoredCandidate>,
    pub vehicles: Vec<ScoredCandidate>,
}

impl NearbyListings {
    pub fn total(&self) -> usize {
        self.properties.len() + self.vehicles.len()
    }
}

/// Resolves caller coordinates and queries the store for nearby listings
pub struct NearbyLocator {
    repo: Arc<dyn CandidateRepository>,
    geoip: Arc<IpGeoClient>,
    limits: NearbyLimits,
}

impl NearbyLocator {
    pub fn new(
        repo: Arc<dyn CandidateRepository>,
        geoip: Arc<IpGeoClient>,
        limits: NearbyLimits,
    ) -> Self {
        Self {
            repo,
            geoip,
            limits,
        }
    }

    /// Resolve caller coordinates from explicit query parameters, falling
    /// back to IP geolocation.
    ///
    /// Explicit coordinates must arrive as a complete, in-range pair. For the
    /// fallback, private and loopback addresses omit the IP parameter so the
    /// geolocation service resolves its own vantage point.
    pub async fn resolve_coordinates(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
        client_ip: Option<&str>,
    ) -> Result<ResolvedLocation, NearbyError> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => {
                let point = validate_coordinates(lat, lng).map_err(NearbyError::Validation)?;
                Ok(ResolvedLocation {
                    latitude: point.lat,
                    longitude: point.lng,
                    city: None,
                    region: None,
                    country: None,
                    ip: None,
                    source: CoordinateSource::Query,
                })
            }
            (None, None) => {
                let ip = client_ip.and_then(normalize_client_ip);
                match self.geoip.lookup(ip.as_deref()).await {
                    Ok(location) => Ok(ResolvedLocation {
                        latitude: location.lat,
                        longitude: location.lon,
                        city: location.city,
                        region: location.region,
                        country: location.country,
                        ip: location.ip,
                        source: CoordinateSource::Geoip,
                    }),
                    Err(e) if e.is_unreachable() => Err(NearbyError::GeoIp(e)),
                    Err(e) => {
                        tracing::debug!("Geolocation fallback failed: {}", e);
                        Err(NearbyError::Unresolvable)
                    }
                }
            }
            _ => Err(NearbyError::Validation(
                "latitude and longitude must be provided together".to_string(),
            )),
        }
    }

    /// Nearby listings around `center` within `max_distance_km`
    ///
    /// `type=all` queries both kinds concurrently; one failure fails the
    /// whole request.
    pub async fn find_nearby(
        &self,
        center: GeoPoint,
        scope: NearbyScope,
        max_distance_km: f64,
    ) -> Result<NearbyListings, NearbyError> {
        if !max_distance_km.is_finite() || max_distance_km <= 0.0 {
            return Err(NearbyError::Validation(format!(
                "maxDistance must be a positive number of kilometers, got {}",
                max_distance_km
            )));
        }
        let radius_m = max_distance_km * 1000.0;

        let listings = match scope {
            NearbyScope::Properties => NearbyListings {
                properties: self.near_kind(ItemKind::Property, center, radius_m).await?,
                vehicles: Vec::new(),
            },
            NearbyScope::Vehicles => NearbyListings {
                properties: Vec::new(),
                vehicles: self.near_kind(ItemKind::Vehicle, center, radius_m).await?,
            },
            NearbyScope::All => {
                let (properties, vehicles) = tokio::try_join!(
                    self.near_kind(ItemKind::Property, center, radius_m),
                    self.near_kind(ItemKind::Vehicle, center, radius_m),
                )?;
                NearbyListings {
                    properties,
                    vehicles,
                }
            }
        };

        tracing::debug!(
            "Nearby query at ({}, {}) within {} km returned {} listings",
            center.lat,
            center.lng,
            max_distance_km,
            listings.total()
        );
        Ok(listings)
    }

    /// One kind's proximity query. The store's native proximity order is
    /// preserved; distances are annotated and rounded to 2 decimals.
    async fn near_kind(
        &self,
        kind: ItemKind,
        center: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<ScoredCandidate>, StoreError> {
        let limit = match kind {
            ItemKind::Property => self.limits.property_limit,
            ItemKind::Vehicle => self.limits.vehicle_limit,
        };

        let items = self.repo.find_near(kind, center, radius_m, limit).await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let distance_km = item
                    .coordinates()
                    .map(|c| round_distance_km(distance_between(center, c)));
                ScoredCandidate {
                    item,
                    score: 0.0,
                    distance_km,
                }
            })
            .collect())
    }
}
