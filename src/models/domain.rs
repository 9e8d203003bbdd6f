use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Aggregated review rating
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub avg: f64,
    #[serde(default)]
    pub count: u32,
}

/// Property rental price tiers
///
/// Listings fill in whichever tiers the owner offers; the resolver below
/// picks the first available tier instead of defaulting missing ones to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PropertyPrice {
    #[serde(rename = "perMonth", default)]
    pub per_month: Option<f64>,
    #[serde(rename = "perWeek", default)]
    pub per_week: Option<f64>,
    #[serde(rename = "perDay", default)]
    pub per_day: Option<f64>,
}

impl PropertyPrice {
    /// Resolve the listing price: monthly rate first, then weekly, then daily
    pub fn resolve(&self) -> Option<f64> {
        self.per_month.or(self.per_week).or(self.per_day)
    }
}

/// Vehicle rental price tiers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VehiclePrice {
    #[serde(rename = "perDay", default)]
    pub per_day: Option<f64>,
    #[serde(rename = "perHour", default)]
    pub per_hour: Option<f64>,
    #[serde(rename = "perWeek", default)]
    pub per_week: Option<f64>,
}

impl VehiclePrice {
    /// Resolve the listing price: daily rate first, then hourly, then weekly
    pub fn resolve(&self) -> Option<f64> {
        self.per_day.or(self.per_hour).or(self.per_week)
    }
}

/// A property listing as returned by the listing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub category: String,
    #[serde(default)]
    pub price: PropertyPrice,
    #[serde(default)]
    pub rating: Rating,
    #[serde(rename = "isFeatured", default)]
    pub featured: bool,
    #[serde(rename = "isAvailable", default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A vehicle listing as returned by the listing store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleListing {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub category: String,
    #[serde(rename = "rentalPrice", default)]
    pub price: VehiclePrice,
    #[serde(default)]
    pub rating: Rating,
    #[serde(rename = "isFeatured", default)]
    pub featured: bool,
    #[serde(rename = "isAvailable", default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(rename = "fuelType", default)]
    pub fuel_type: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Discovery candidate: either listing kind behind one scoring surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase")]
pub enum CandidateItem {
    Property(PropertyListing),
    Vehicle(VehicleListing),
}

impl CandidateItem {
    pub fn id(&self) -> &str {
        match self {
            CandidateItem::Property(p) => &p.id,
            CandidateItem::Vehicle(v) => &v.id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            CandidateItem::Property(_) => ItemKind::Property,
            CandidateItem::Vehicle(_) => ItemKind::Vehicle,
        }
    }

    /// Display title (properties carry a title, vehicles a name)
    pub fn title(&self) -> &str {
        match self {
            CandidateItem::Property(p) => &p.title,
            CandidateItem::Vehicle(v) => &v.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            CandidateItem::Property(p) => p.description.as_deref(),
            CandidateItem::Vehicle(v) => v.description.as_deref(),
        }
    }

    pub fn city(&self) -> &str {
        match self {
            CandidateItem::Property(p) => &p.city,
            CandidateItem::Vehicle(v) => &v.city,
        }
    }

    pub fn state(&self) -> Option<&str> {
        match self {
            CandidateItem::Property(p) => p.state.as_deref(),
            CandidateItem::Vehicle(v) => v.state.as_deref(),
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            CandidateItem::Property(p) => p.address.as_deref(),
            CandidateItem::Vehicle(v) => v.address.as_deref(),
        }
    }

    pub fn category(&self) -> &str {
        match self {
            CandidateItem::Property(p) => &p.category,
            CandidateItem::Vehicle(v) => &v.category,
        }
    }

    pub fn featured(&self) -> bool {
        match self {
            CandidateItem::Property(p) => p.featured,
            CandidateItem::Vehicle(v) => v.featured,
        }
    }

    pub fn available(&self) -> bool {
        match self {
            CandidateItem::Property(p) => p.available,
            CandidateItem::Vehicle(v) => v.available,
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            CandidateItem::Property(p) => p.rating,
            CandidateItem::Vehicle(v) => v.rating,
        }
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        match self {
            CandidateItem::Property(p) => p.coordinates,
            CandidateItem::Vehicle(v) => v.coordinates,
        }
    }

    pub fn images(&self) -> &[String] {
        match self {
            CandidateItem::Property(p) => &p.images,
            CandidateItem::Vehicle(v) => &v.images,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CandidateItem::Property(p) => p.created_at,
            CandidateItem::Vehicle(v) => v.created_at,
        }
    }

    /// Resolved listing price via the per-kind fallback chain.
    ///
    /// `None` means no tier is priced; sorting places such items last rather
    /// than treating them as free.
    pub fn resolved_price(&self) -> Option<f64> {
        match self {
            CandidateItem::Property(p) => p.price.resolve(),
            CandidateItem::Vehicle(v) => v.price.resolve(),
        }
    }

    /// Resolved rating: the average when reviews exist, zero otherwise
    pub fn resolved_rating(&self) -> f64 {
        let rating = self.rating();
        if rating.count > 0 {
            rating.avg
        } else {
            0.0
        }
    }

    /// Category match check; `"all"` matches every listing
    pub fn matches_category(&self, category: &str) -> bool {
        category == "all" || self.category().eq_ignore_ascii_case(category)
    }
}

/// Listing kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Property,
    Vehicle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Property => "property",
            ItemKind::Vehicle => "vehicle",
        }
    }

    /// Store collection name for this kind
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Property => "properties",
            ItemKind::Vehicle => "vehicles",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "property" | "properties" => Ok(ItemKind::Property),
            "vehicle" | "vehicles" => Ok(ItemKind::Vehicle),
            other => Err(format!("unknown item type: {}", other)),
        }
    }
}

/// Search sort modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Rating,
    Nearest,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::PriceAsc => "price_asc",
            SortMode::PriceDesc => "price_desc",
            SortMode::Rating => "rating",
            SortMode::Nearest => "nearest",
        }
    }
}

/// One entry in a user's recently-visited list, most recent first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitedEntry {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "visitedAt")]
    pub visited_at: DateTime<Utc>,
}

/// Insert a visit at the front of the list with LRU semantics.
///
/// A re-visited id is removed from its old position first, so the list never
/// holds duplicates and stays capped at `capacity`.
pub fn push_visit(
    visited: &mut Vec<VisitedEntry>,
    item_id: &str,
    visited_at: DateTime<Utc>,
    capacity: usize,
) {
    visited.retain(|entry| entry.item_id != item_id);
    visited.insert(
        0,
        VisitedEntry {
            item_id: item_id.to_string(),
            visited_at,
        },
    );
    visited.truncate(capacity);
}

/// Marketplace user profile, read from the listing store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "homeCity", default)]
    pub home_city: Option<String>,
    #[serde(rename = "favoritePropertyIds", default)]
    pub favorite_property_ids: Vec<String>,
    #[serde(rename = "favoriteVehicleIds", default)]
    pub favorite_vehicle_ids: Vec<String>,
    #[serde(rename = "bookedPropertyIds", default)]
    pub booked_property_ids: Vec<String>,
    #[serde(rename = "bookedVehicleIds", default)]
    pub booked_vehicle_ids: Vec<String>,
    #[serde(default)]
    pub visited: Vec<VisitedEntry>,
}

impl UserProfile {
    pub fn favorites_for(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Property => &self.favorite_property_ids,
            ItemKind::Vehicle => &self.favorite_vehicle_ids,
        }
    }

    pub fn booked_for(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Property => &self.booked_property_ids,
            ItemKind::Vehicle => &self.booked_vehicle_ids,
        }
    }
}

/// Search predicate applied to the candidate set
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub kind: ItemKind,
    pub query: Option<String>,
    pub exclude_ids: Vec<String>,
}

impl SearchFilter {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            query: None,
            exclude_ids: Vec::new(),
        }
    }

    /// available AND not excluded AND, when a query is set, case-insensitive
    /// substring match across title/name, description, city, state, address
    pub fn matches(&self, item: &CandidateItem) -> bool {
        if item.kind() != self.kind || !item.available() {
            return false;
        }
        if self.exclude_ids.iter().any(|id| id == item.id()) {
            return false;
        }

        let Some(query) = self.query.as_deref() else {
            return true;
        };
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(item.title()),
            item.description(),
            Some(item.city()),
            item.state(),
            item.address(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Personalization signals resolved from an optional bearer token
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    pub user_id: Option<String>,
    pub favorite_ids: HashSet<String>,
    pub booked_ids: HashSet<String>,
    pub home_city: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

impl ViewerContext {
    /// Context for an unauthenticated caller, optionally with coordinates
    pub fn anonymous(coordinates: Option<GeoPoint>) -> Self {
        Self {
            coordinates,
            ..Self::default()
        }
    }
}

/// A candidate annotated with its score and distance, discarded after the
/// response is built
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item: CandidateItem,
    pub score: f64,
    pub distance_km: Option<f64>,
}

/// Where a resolved coordinate pair came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    /// Explicit latitude/longitude query parameters
    Query,
    /// IP-geolocation fallback
    Geoip,
}

/// Caller coordinates resolved from query parameters or IP geolocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub source: CoordinateSource,
}

impl ResolvedLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}
