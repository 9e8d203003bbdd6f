//! Shared fixtures for integration tests: listing builders and an in-memory
//! candidate store.

use async_trait::async_trait;
use chrono::Utc;
use nestdrive_discovery::core::geo::distance_between;
use nestdrive_discovery::models::{
    CandidateItem, GeoPoint, ItemKind, PropertyListing, PropertyPrice, Rating, SearchFilter,
    UserProfile, VehicleListing, VehiclePrice, VisitedEntry,
};
use nestdrive_discovery::services::{CandidateRepository, StoreError};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Property fixture with sensible defaults; tests mutate what they need
pub fn property(id: &str) -> PropertyListing {
    PropertyListing {
        id: id.to_string(),
        title: format!("Property {}", id),
        description: Some("Bright rental close to transit".to_string()),
        city: "Delhi".to_string(),
        state: Some("DL".to_string()),
        address: Some(format!("{} Ring Road", id)),
        category: "apartment".to_string(),
        price: PropertyPrice {
            per_month: Some(1000.0),
            per_week: None,
            per_day: None,
        },
        rating: Rating { avg: 4.0, count: 5 },
        featured: false,
        available: true,
        coordinates: Some(GeoPoint {
            lat: 28.6139,
            lng: 77.2090,
        }),
        images: vec![format!("{}.jpg", id)],
        bedrooms: Some(2),
        bathrooms: Some(1),
        created_at: Some(Utc::now()),
    }
}

/// Vehicle fixture with sensible defaults
pub fn vehicle(id: &str) -> VehicleListing {
    VehicleListing {
        id: id.to_string(),
        name: format!("Vehicle {}", id),
        description: Some("Well-maintained rental".to_string()),
        city: "Delhi".to_string(),
        state: Some("DL".to_string()),
        address: None,
        category: "car".to_string(),
        price: VehiclePrice {
            per_day: Some(45.0),
            per_hour: None,
            per_week: None,
        },
        rating: Rating { avg: 4.2, count: 8 },
        featured: false,
        available: true,
        coordinates: Some(GeoPoint {
            lat: 28.6139,
            lng: 77.2090,
        }),
        images: vec![],
        seats: Some(5),
        transmission: Some("manual".to_string()),
        fuel_type: Some("petrol".to_string()),
        created_at: Some(Utc::now()),
    }
}

/// How the in-memory store should misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    None,
    /// Profile reads fail with a degradable error; everything else works
    ProfileLoad,
    /// Id lookups fail with a degradable error; random fill still works
    DegradedLookups,
    /// Every call fails as unreachable
    Unreachable,
}

/// In-memory candidate store standing in for the listing-store collaborator
pub struct InMemoryStore {
    items: Mutex<Vec<CandidateItem>>,
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail_mode: Mutex<FailMode>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
            fail_mode: Mutex::new(FailMode::None),
        }
    }

    pub fn add_property(&self, listing: PropertyListing) {
        self.items
            .lock()
            .unwrap()
            .push(CandidateItem::Property(listing));
    }

    pub fn add_vehicle(&self, listing: VehicleListing) {
        self.items
            .lock()
            .unwrap()
            .push(CandidateItem::Vehicle(listing));
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile);
    }

    pub fn set_fail_mode(&self, mode: FailMode) {
        *self.fail_mode.lock().unwrap() = mode;
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(user_id).cloned()
    }

    fn fail_mode(&self) -> FailMode {
        *self.fail_mode.lock().unwrap()
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.fail_mode() == FailMode::Unreachable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_lookup(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.fail_mode() == FailMode::DegradedLookups {
            return Err(StoreError::ApiError("lookup shard offline".to_string()));
        }
        Ok(())
    }

    fn check_profile(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        if self.fail_mode() == FailMode::ProfileLoad {
            return Err(StoreError::ApiError("profile shard offline".to_string()));
        }
        Ok(())
    }

    fn items_of_kind(&self, kind: ItemKind) -> Vec<CandidateItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.kind() == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CandidateRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> Result<Option<CandidateItem>, StoreError> {
        self.check_lookup()?;
        Ok(self
            .items_of_kind(kind)
            .into_iter()
            .find(|item| item.id() == id))
    }

    async fn find_by_ids(
        &self,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<Vec<CandidateItem>, StoreError> {
        self.check_lookup()?;
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .items_of_kind(kind)
            .into_iter()
            .filter(|item| wanted.contains(item.id()))
            .collect())
    }

    async fn find_featured(
        &self,
        kind: ItemKind,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        self.check_lookup()?;
        Ok(self
            .items_of_kind(kind)
            .into_iter()
            .filter(|item| item.featured() && item.available())
            .take(limit)
            .collect())
    }

    async fn find_random(
        &self,
        kind: ItemKind,
        count: usize,
        exclude: &HashSet<String>,
        category: Option<&str>,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        self.check_reachable()?;
        let mut pool: Vec<CandidateItem> = self
            .items_of_kind(kind)
            .into_iter()
            .filter(|item| item.available())
            .filter(|item| !exclude.contains(item.id()))
            .filter(|item| category.map_or(true, |c| item.matches_category(c)))
            .collect();
        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        Ok(pool)
    }

    async fn text_search(
        &self,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        self.check_reachable()?;
        Ok(self
            .items_of_kind(filter.kind)
            .into_iter()
            .filter(|item| filter.matches(item))
            .take(limit)
            .collect())
    }

    async fn count_matching(&self, filter: &SearchFilter) -> Result<u64, StoreError> {
        self.check_reachable()?;
        Ok(self
            .items_of_kind(filter.kind)
            .iter()
            .filter(|item| filter.matches(item))
            .count() as u64)
    }

    async fn find_near(
        &self,
        kind: ItemKind,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        self.check_reachable()?;
        let mut within: Vec<(f64, CandidateItem)> = self
            .items_of_kind(kind)
            .into_iter()
            .filter(|item| item.available())
            .filter_map(|item| {
                let coords = item.coordinates()?;
                let distance_km = distance_between(center, coords);
                (distance_km * 1000.0 <= radius_m).then_some((distance_km, item))
            })
            .collect();
        // Native proximity order: closest first
        within.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(within
            .into_iter()
            .take(limit)
            .map(|(_, item)| item)
            .collect())
    }

    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.check_profile()?;
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn update_visited(
        &self,
        user_id: &str,
        visited: &[VisitedEntry],
    ) -> Result<(), StoreError> {
        self.check_lookup()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        profile.visited = visited.to_vec();
        Ok(())
    }
}
