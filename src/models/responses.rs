use serde::{Deserialize, Serialize};

use crate::models::domain::{
    CandidateItem, ItemKind, ResolvedLocation, ScoredCandidate, SortMode,
};

/// Error payload shared by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Simple acknowledgement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Uniform search-result item, identical shape for both listing kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub price: Option<f64>,
    pub rating: f64,
    #[serde(rename = "reviewCount")]
    pub review_count: u32,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub images: Vec<String>,
    pub location: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub category: String,
    #[serde(rename = "itemType")]
    pub item_type: ItemKind,
    #[serde(rename = "isFeatured")]
    pub is_featured: bool,
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(rename = "fuelType", skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
}

impl SearchResultItem {
    /// Flatten a candidate into the uniform wire shape
    pub fn from_item(item: &CandidateItem, distance_km: Option<f64>) -> Self {
        let rating = item.rating();
        let (bedrooms, bathrooms, seats, transmission, fuel_type) = match item {
            CandidateItem::Property(p) => (p.bedrooms, p.bathrooms, None, None, None),
            CandidateItem::Vehicle(v) => (
                None,
                None,
                v.seats,
                v.transmission.clone(),
                v.fuel_type.clone(),
            ),
        };

        Self {
            id: item.id().to_string(),
            title: item.title().to_string(),
            price: item.resolved_price(),
            rating: item.resolved_rating(),
            review_count: rating.count,
            image_url: item.images().first().cloned(),
            images: item.images().to_vec(),
            location: item.address().map(str::to_string),
            city: item.city().to_string(),
            state: item.state().map(str::to_string),
            category: item.category().to_string(),
            item_type: item.kind(),
            is_featured: item.featured(),
            distance: distance_km,
            bedrooms,
            bathrooms,
            seats,
            transmission,
            fuel_type,
        }
    }
}

impl From<&ScoredCandidate> for SearchResultItem {
    fn from(scored: &ScoredCandidate) -> Self {
        Self::from_item(&scored.item, scored.distance_km)
    }
}

/// Response for the recommended-items endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedResponse {
    pub success: bool,
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Pagination block for search responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    pub sort: SortMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchData {
    pub results: Vec<SearchResultItem>,
    pub pagination: Pagination,
}

/// Response for paginated search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchData,
}

/// Coordinates echoed in nearby responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSummary {
    pub latitude: f64,
    pub longitude: f64,
    pub source: crate::models::domain::CoordinateSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyData {
    pub location: LocationSummary,
    pub properties: Vec<SearchResultItem>,
    pub vehicles: Vec<SearchResultItem>,
    pub total: usize,
}

/// Response for the nearby endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyResponse {
    pub success: bool,
    pub data: NearbyData,
}

/// Response for coordinate resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesResponse {
    pub success: bool,
    pub data: ResolvedLocation,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{PropertyListing, PropertyPrice, Rating, VehicleListing, VehiclePrice};

    #[test]
    fn test_uniform_shape_for_property() {
        let item = CandidateItem::Property(PropertyListing {
            id: "p1".to_string(),
            title: "Loft".to_string(),
            description: None,
            city: "Mumbai".to_string(),
            state: Some("MH".to_string()),
            address: Some("12 Marine Drive".to_string()),
            category: "apartment".to_string(),
            price: PropertyPrice {
                per_month: None,
                per_week: None,
                per_day: Some(80.0),
            },
            rating: Rating { avg: 4.5, count: 3 },
            featured: true,
            available: true,
            coordinates: None,
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            bedrooms: Some(1),
            bathrooms: Some(1),
            created_at: None,
        });

        let result = SearchResultItem::from_item(&item, Some(2.5));
        assert_eq!(result.price, Some(80.0));
        assert_eq!(result.image_url.as_deref(), Some("a.jpg"));
        assert_eq!(result.location.as_deref(), Some("12 Marine Drive"));
        assert_eq!(result.item_type, ItemKind::Property);
        assert_eq!(result.distance, Some(2.5));
        assert_eq!(result.bedrooms, Some(1));
        assert!(result.seats.is_none());
    }

    #[test]
    fn test_uniform_shape_for_vehicle() {
        let item = CandidateItem::Vehicle(VehicleListing {
            id: "v1".to_string(),
            name: "City Hatchback".to_string(),
            description: None,
            city: "Pune".to_string(),
            state: None,
            address: None,
            category: "car".to_string(),
            price: VehiclePrice::default(),
            rating: Rating::default(),
            featured: false,
            available: true,
            coordinates: None,
            images: vec![],
            seats: Some(5),
            transmission: Some("manual".to_string()),
            fuel_type: Some("petrol".to_string()),
            created_at: None,
        });

        let result = SearchResultItem::from_item(&item, None);
        assert_eq!(result.title, "City Hatchback");
        assert_eq!(result.price, None);
        assert_eq!(result.rating, 0.0);
        assert!(result.image_url.is_none());
        assert_eq!(result.seats, Some(5));
        assert!(result.bedrooms.is_none());
    }
}
