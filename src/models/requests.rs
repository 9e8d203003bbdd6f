use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::SortMode;

/// Query parameters for the recommended-items endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedQuery {
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "all".to_string()
}

/// Query parameters for paginated search
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    /// Listing kind: `property` or `vehicle`
    #[serde(rename = "type")]
    pub item_type: String,
    /// Zero-based page index
    #[serde(default)]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Comma-separated listing ids to exclude
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

fn default_limit() -> u32 {
    20
}

impl SearchQuery {
    /// Parsed exclude list, empty entries dropped
    pub fn exclude_ids(&self) -> Vec<String> {
        self.exclude
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Query parameters for the nearby endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyQuery {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Search radius in kilometers
    #[serde(rename = "maxDistance", default = "default_max_distance_km")]
    pub max_distance_km: f64,
    /// `properties`, `vehicles`, or `all`
    #[serde(rename = "type", default = "default_nearby_type")]
    pub item_type: String,
}

fn default_max_distance_km() -> f64 {
    10.0
}

fn default_nearby_type() -> String {
    "all".to_string()
}

/// Query parameters for coordinate resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesQuery {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Query parameters for the featured-listings rail
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeaturedQuery {
    /// Listing kind: `property` or `vehicle`
    #[serde(rename = "type")]
    pub item_type: String,
    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_featured_limit")]
    pub limit: u32,
}

fn default_featured_limit() -> u32 {
    10
}

/// Body for recording a listing visit
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordVisitRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "item_id", rename = "itemId")]
    pub item_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "item_type", rename = "itemType")]
    pub item_type: String,
}
