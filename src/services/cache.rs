use crate::models::{CandidateItem, ItemKind};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalidation error: {0}")]
    InvalidationError(String),
}

/// Cache key for one user's recommendations of one kind/category
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecommendationKey {
    pub user_id: String,
    pub kind: ItemKind,
    pub category: String,
}

impl RecommendationKey {
    pub fn new(user_id: &str, kind: ItemKind, category: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            category: category.to_string(),
        }
    }
}

pub type CachedItems = Arc<Vec<CandidateItem>>;

/// TTL-keyed cache for recommendation results
///
/// Injected rather than module-global so engines stay testable, backed by a
/// single in-process moka tier. Entries expire after the configured TTL;
/// concurrent misses for the same key coalesce onto one computation through
/// the entry API.
pub struct ResultCache {
    inner: moka::future::Cache<RecommendationKey, CachedItems>,
}

impl ResultCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let inner = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { inner }
    }

    pub async fn get(&self, key: &RecommendationKey) -> Option<CachedItems> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: RecommendationKey, items: Vec<CandidateItem>) {
        self.inner.insert(key, Arc::new(items)).await;
    }

    /// Return the cached value for `key`, or run `init` to populate it.
    ///
    /// Concurrent callers of the same key share one `init` run. Failed runs
    /// are not cached. The second tuple element is true on a cache hit.
    pub async fn get_or_try_compute<F, E>(
        &self,
        key: RecommendationKey,
        init: F,
    ) -> Result<(CachedItems, bool), Arc<E>>
    where
        F: Future<Output = Result<Vec<CandidateItem>, E>>,
        E: Send + Sync + 'static,
    {
        let entry = self
            .inner
            .entry(key)
            .or_try_insert_with(async { init.await.map(Arc::new) })
            .await?;

        let cached = !entry.is_fresh();
        Ok((entry.into_value(), cached))
    }

    /// Drop every cached entry belonging to one user
    pub async fn invalidate_user(&self, user_id: &str) -> Result<(), CacheError> {
        let user_id = user_id.to_string();
        self.inner
            .invalidate_entries_if(move |key, _| key.user_id == user_id)
            .map_err(|e| CacheError::InvalidationError(e.to_string()))?;

        tracing::debug!("Invalidated recommendation cache entries");
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyListing, PropertyPrice, Rating};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(id: &str) -> CandidateItem {
        CandidateItem::Property(PropertyListing {
            id: id.to_string(),
            title: format!("Listing {}", id),
            description: None,
            city: "Delhi".to_string(),
            state: None,
            address: None,
            category: "apartment".to_string(),
            price: PropertyPrice::default(),
            rating: Rating::default(),
            featured: false,
            available: true,
            coordinates: None,
            images: vec![],
            bedrooms: None,
            bathrooms: None,
            created_at: None,
        })
    }

    #[tokio::test]
    async fn test_second_compute_is_a_hit() {
        let cache = ResultCache::new(100, Duration::from_secs(60));
        let key = RecommendationKey::new("u1", ItemKind::Property, "all");
        let calls = AtomicUsize::new(0);

        let (first, cached) = cache
            .get_or_try_compute::<_, std::convert::Infallible>(key.clone(), async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![item("p1")])
            })
            .await
            .unwrap();
        assert!(!cached);
        assert_eq!(first.len(), 1);

        let (second, cached) = cache
            .get_or_try_compute::<_, std::convert::Infallible>(key, async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![item("p2")])
            })
            .await
            .unwrap();
        assert!(cached);
        assert_eq!(second[0].id(), "p1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache = ResultCache::new(100, Duration::from_secs(60));
        let key = RecommendationKey::new("u1", ItemKind::Property, "all");

        let result = cache
            .get_or_try_compute::<_, String>(key.clone(), async { Err("boom".to_string()) })
            .await;
        assert!(result.is_err());

        let (items, cached) = cache
            .get_or_try_compute::<_, String>(key, async { Ok(vec![item("p1")]) })
            .await
            .unwrap();
        assert!(!cached);
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_user_only_hits_that_user() {
        let cache = ResultCache::new(100, Duration::from_secs(60));
        let mine = RecommendationKey::new("u1", ItemKind::Property, "all");
        let theirs = RecommendationKey::new("u2", ItemKind::Property, "all");

        cache.insert(mine.clone(), vec![item("p1")]).await;
        cache.insert(theirs.clone(), vec![item("p2")]).await;

        cache.invalidate_user("u1").await.unwrap();
        // Invalidation closures apply lazily; reads observe the removal
        assert!(cache.get(&mine).await.is_none());
        assert!(cache.get(&theirs).await.is_some());
    }
}
