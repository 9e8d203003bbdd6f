use crate::core::dedup::DeduplicationTracker;
use crate::models::{push_visit, CandidateItem, ItemKind, UserProfile};
use crate::services::{CacheError, CandidateRepository, RecommendationKey, ResultCache, StoreError};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the recommendation engine
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("listing store error: {0}")]
    Store(Arc<StoreError>),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),
}

impl From<StoreError> for RecommendError {
    fn from(e: StoreError) -> Self {
        RecommendError::Store(Arc::new(e))
    }
}

/// Quotas governing the cascade
#[derive(Debug, Clone, Copy)]
pub struct RecommendationLimits {
    /// Items collected across stages and returned for category="all"
    pub quota: usize,
    /// Final cap for a specific category
    pub category_cap: usize,
    /// Recently-visited list capacity
    pub visited_capacity: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            quota: 20,
            category_cap: 10,
            visited_capacity: 20,
        }
    }
}

/// Outcome of one recommendation request
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub items: Vec<CandidateItem>,
    pub cached: bool,
    /// True when the cascade failed and random fill substituted
    pub fallback: bool,
}

/// Composes the favorites → visited → random-fill cascade
///
/// Results for authenticated users are cached per (user, kind, category);
/// concurrent misses coalesce on one cascade run. A failing cascade degrades
/// to random fill unless the store is unreachable outright.
pub struct RecommendationEngine {
    repo: Arc<dyn CandidateRepository>,
    cache: Arc<ResultCache>,
    limits: RecommendationLimits,
}

impl RecommendationEngine {
    pub fn new(
        repo: Arc<dyn CandidateRepository>,
        cache: Arc<ResultCache>,
        limits: RecommendationLimits,
    ) -> Self {
        Self {
            repo,
            cache,
            limits,
        }
    }

    /// Recommend listings of `kind` for an optionally-authenticated user
    pub async fn recommend(
        &self,
        user_id: Option<&str>,
        kind: ItemKind,
        category: &str,
    ) -> Result<Recommendations, RecommendError> {
        // Anonymous callers have no favorites or history and would all pool
        // under one cache entry, so they get uncached random fill
        let Some(user_id) = user_id else {
            let items = self.random_fill(kind, category).await?;
            return Ok(Recommendations {
                items,
                cached: false,
                fallback: false,
            });
        };

        let key = RecommendationKey::new(user_id, kind, category);
        let attempt = self
            .cache
            .get_or_try_compute(key, self.assemble(user_id, kind, category))
            .await;

        match attempt {
            Ok((items, cached)) => Ok(Recommendations {
                items: items.as_ref().clone(),
                cached,
                fallback: false,
            }),
            Err(err) if err.is_unreachable() => Err(RecommendError::Store(err)),
            Err(err) => {
                tracing::warn!(
                    "Recommendation cascade failed for {} ({}/{}), substituting random fill: {}",
                    user_id,
                    kind,
                    category,
                    err
                );
                let items = self.random_fill(kind, category).await?;
                Ok(Recommendations {
                    items,
                    cached: false,
                    fallback: true,
                })
            }
        }
    }

    /// Drop all cached recommendations for one user
    pub async fn clear_cache(&self, user_id: &str) -> Result<(), CacheError> {
        self.cache.invalidate_user(user_id).await
    }

    /// Record a listing visit with LRU semantics on the capped visited list
    pub async fn record_visit(
        &self,
        user_id: &str,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<(), RecommendError> {
        let item = self.repo.find_by_id(kind, item_id).await?;
        if item.is_none() {
            return Err(RecommendError::ItemNotFound(item_id.to_string()));
        }

        let mut profile = self
            .repo
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| RecommendError::UserNotFound(user_id.to_string()))?;

        push_visit(
            &mut profile.visited,
            item_id,
            Utc::now(),
            self.limits.visited_capacity,
        );
        self.repo.update_visited(user_id, &profile.visited).await?;

        tracing::debug!("Recorded visit: {} -> {}/{}", user_id, kind, item_id);
        Ok(())
    }

    /// The three-stage cascade; any store error propagates to the caller,
    /// which decides between degrade and hard failure
    async fn assemble(
        &self,
        user_id: &str,
        kind: ItemKind,
        category: &str,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let quota = self.limits.quota;
        let mut tracker = DeduplicationTracker::new();
        let mut collected: Vec<CandidateItem> = Vec::with_capacity(quota);

        let profile = match self.repo.get_user_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::debug!("Unknown user {}, recommending as anonymous", user_id);
                UserProfile::default()
            }
            Err(e) if e.is_unreachable() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    "Profile load failed for {}, continuing with empty defaults: {}",
                    user_id,
                    e
                );
                UserProfile::default()
            }
        };

        // Stage A: favorites, featured first, favorite order within each group
        let favorite_ids = profile.favorites_for(kind).to_vec();
        if !favorite_ids.is_empty() {
            let fetched = self.repo.find_by_ids(kind, &favorite_ids).await?;
            let by_id: HashMap<&str, &CandidateItem> =
                fetched.iter().map(|item| (item.id(), item)).collect();

            let mut favorites: Vec<CandidateItem> = favorite_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|item| (*item).clone()))
                .collect();
            favorites.sort_by_key(|item| !item.featured());

            for item in favorites {
                if collected.len() >= quota {
                    break;
                }
                if tracker.claim(item.id()) {
                    collected.push(item);
                }
            }
        }

        // Stage B: visit history, most recent first; ids the store no longer
        // resolves are skipped
        if collected.len() < quota && !profile.visited.is_empty() {
            let pending: Vec<String> = profile
                .visited
                .iter()
                .map(|entry| entry.item_id.clone())
                .filter(|id| !tracker.contains(id))
                .collect();

            if !pending.is_empty() {
                let fetched = self.repo.find_by_ids(kind, &pending).await?;
                let by_id: HashMap<&str, &CandidateItem> =
                    fetched.iter().map(|item| (item.id(), item)).collect();

                for entry in &profile.visited {
                    if collected.len() >= quota {
                        break;
                    }
                    let Some(item) = by_id.get(entry.item_id.as_str()) else {
                        continue;
                    };
                    if tracker.claim(entry.item_id.as_str()) {
                        collected.push((*item).clone());
                    }
                }
            }
        }

        // Stage C: random fill up to the quota
        if collected.len() < quota {
            let need = quota - collected.len();
            let category_filter = (category != "all").then_some(category);
            let random = self
                .repo
                .find_random(kind, need, tracker.consumed_ids(), category_filter)
                .await?;

            for item in random {
                if collected.len() >= quota {
                    break;
                }
                if tracker.claim(item.id()) {
                    collected.push(item);
                }
            }
        }

        // Favorites and history ignore category, so the filter is re-applied
        // over the assembled list before capping
        if category != "all" {
            collected.retain(|item| item.matches_category(category));
        }
        collected.truncate(self.cap_for(category));

        tracing::debug!(
            "Assembled {} recommendations for {} ({}/{})",
            collected.len(),
            user_id,
            kind,
            category
        );
        Ok(collected)
    }

    /// Degraded/anonymous path: random listings only
    async fn random_fill(
        &self,
        kind: ItemKind,
        category: &str,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let category_filter = (category != "all").then_some(category);
        let mut items = self
            .repo
            .find_random(kind, self.limits.quota, &HashSet::new(), category_filter)
            .await?;

        if category != "all" {
            items.retain(|item| item.matches_category(category));
        }
        items.truncate(self.cap_for(category));
        Ok(items)
    }

    fn cap_for(&self, category: &str) -> usize {
        if category == "all" {
            self.limits.quota
        } else {
            self.limits.category_cap
        }
    }
}
