use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub geoip: GeoIpSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Listing store collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

/// IP-geolocation collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct GeoIpSettings {
    #[serde(default = "default_geoip_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_geoip_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeoIpSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geoip_endpoint(),
            timeout_secs: default_geoip_timeout(),
        }
    }
}

fn default_geoip_endpoint() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_geoip_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_entries() -> u64 {
    10_000
}

/// Discovery caps and quotas
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_recommendation_quota")]
    pub recommendation_quota: usize,
    #[serde(default = "default_category_cap")]
    pub recommendation_category_cap: usize,
    #[serde(default = "default_visited_capacity")]
    pub visited_capacity: usize,
    #[serde(default = "default_max_search_candidates")]
    pub max_search_candidates: usize,
    #[serde(default = "default_nearby_property_limit")]
    pub nearby_property_limit: usize,
    #[serde(default = "default_nearby_vehicle_limit")]
    pub nearby_vehicle_limit: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            recommendation_quota: default_recommendation_quota(),
            recommendation_category_cap: default_category_cap(),
            visited_capacity: default_visited_capacity(),
            max_search_candidates: default_max_search_candidates(),
            nearby_property_limit: default_nearby_property_limit(),
            nearby_vehicle_limit: default_nearby_vehicle_limit(),
        }
    }
}

fn default_recommendation_quota() -> usize { 20 }
fn default_category_cap() -> usize { 10 }
fn default_visited_capacity() -> usize { 20 }
fn default_max_search_candidates() -> usize { 2000 }
fn default_nearby_property_limit() -> usize { 10 }
fn default_nearby_vehicle_limit() -> usize { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with NESTDRIVE_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with NESTDRIVE_)
            // e.g., NESTDRIVE_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("NESTDRIVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("NESTDRIVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the short environment-variable overrides used in deployment
/// (STORE_ENDPOINT, STORE_API_KEY, JWT_SECRET)
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let store_endpoint = env::var("STORE_ENDPOINT")
        .or_else(|_| env::var("NESTDRIVE_STORE__ENDPOINT"))
        .ok();
    let store_api_key = env::var("STORE_API_KEY")
        .or_else(|_| env::var("NESTDRIVE_STORE__API_KEY"))
        .ok();
    let jwt_secret = env::var("JWT_SECRET")
        .or_else(|_| env::var("NESTDRIVE_AUTH__JWT_SECRET"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(endpoint) = store_endpoint {
        builder = builder.set_override("store.endpoint", endpoint)?;
    }
    if let Some(api_key) = store_api_key {
        builder = builder.set_override("store.api_key", api_key)?;
    }
    if let Some(secret) = jwt_secret {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_defaults() {
        let discovery = DiscoverySettings::default();
        assert_eq!(discovery.recommendation_quota, 20);
        assert_eq!(discovery.recommendation_category_cap, 10);
        assert_eq!(discovery.visited_capacity, 20);
        assert_eq!(discovery.max_search_candidates, 2000);
        assert_eq!(discovery.nearby_property_limit, 10);
        assert_eq!(discovery.nearby_vehicle_limit, 50);
    }

    #[test]
    fn test_cache_defaults() {
        let cache = CacheSettings::default();
        assert_eq!(cache.ttl_secs, 300);
        assert_eq!(cache.max_entries, 10_000);
    }

    #[test]
    fn test_geoip_defaults() {
        let geoip = GeoIpSettings::default();
        assert_eq!(geoip.endpoint, "http://ip-api.com/json");
        assert_eq!(geoip.timeout_secs, 10);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
