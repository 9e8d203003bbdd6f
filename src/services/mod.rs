// Service exports
pub mod auth;
pub mod cache;
pub mod geoip;
pub mod store;

pub use auth::TokenVerifier;
pub use cache::{CacheError, CachedItems, RecommendationKey, ResultCache};
pub use geoip::{normalize_client_ip, GeoIpError, IpGeoClient};
pub use store::{CandidateRepository, ListingStoreClient, StoreError};
