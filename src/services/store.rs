use crate::models::{
    CandidateItem, GeoPoint, ItemKind, PropertyListing, SearchFilter, UserProfile, VehicleListing,
    VisitedEntry,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the listing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Store unreachable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True when the store could not be reached at all (connect/timeout).
    ///
    /// The recommendation cascade degrades on every other store failure but
    /// propagates these.
    pub fn is_unreachable(&self) -> bool {
        match self {
            StoreError::RequestError(e) => e.is_connect() || e.is_timeout(),
            StoreError::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Candidate store interface
///
/// The discovery core never touches a persistence-specific shape; everything
/// it reads or writes goes through this trait. The production implementation
/// is [`ListingStoreClient`]; tests substitute an in-memory store.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> Result<Option<CandidateItem>, StoreError>;

    async fn find_by_ids(
        &self,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<Vec<CandidateItem>, StoreError>;

    async fn find_featured(
        &self,
        kind: ItemKind,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError>;

    /// Random available listings, excluding the given ids, optionally
    /// restricted to one category
    async fn find_random(
        &self,
        kind: ItemKind,
        count: usize,
        exclude: &HashSet<String>,
        category: Option<&str>,
    ) -> Result<Vec<CandidateItem>, StoreError>;

    /// All listings matching the filter, up to `limit` (no store-side
    /// pagination)
    async fn text_search(
        &self,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError>;

    async fn count_matching(&self, filter: &SearchFilter) -> Result<u64, StoreError>;

    /// Listings within `radius_m` of `center`, in the store's native
    /// proximity order
    async fn find_near(
        &self,
        kind: ItemKind,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError>;

    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Replace the user's recently-visited list in one atomic update
    async fn update_visited(
        &self,
        user_id: &str,
        visited: &[VisitedEntry],
    ) -> Result<(), StoreError>;
}

/// HTTP client for the listing store's document API
///
/// Queries are expressed as a JSON array of filter strings, URL-encoded into
/// a `query` parameter; responses arrive as `{documents: [...], total}`
/// envelopes.
pub struct ListingStoreClient {
    base_url: String,
    api_key: String,
    client: Client,
}

const USER_PROFILES_COLLECTION: &str = "user_profiles";

impl ListingStoreClient {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn documents_url(&self, collection: &str, queries: &[String]) -> String {
        let queries_json = serde_json::to_string(queries).unwrap_or_else(|_| "[]".to_string());
        let encoded = urlencoding::encode(&queries_json);
        format!(
            "{}/v1/collections/{}/documents?query={}",
            self.base_url.trim_end_matches('/'),
            collection,
            encoded
        )
    }

    async fn fetch_documents(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<(Vec<Value>, u64), StoreError> {
        let url = self.documents_url(collection, queries);
        tracing::debug!("Querying listing store: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StoreError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StoreError::ApiError(format!(
                "store query failed: {}",
                status
            )));
        }

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("missing documents array".into()))?
            .clone();

        Ok((documents, total))
    }

    /// Parse a store document into a candidate; unparseable documents are
    /// skipped, matching how the store tolerates partially-migrated records
    fn parse_item(kind: ItemKind, doc: &Value) -> Option<CandidateItem> {
        let data = doc.get("data").unwrap_or(doc);
        match kind {
            ItemKind::Property => serde_json::from_value::<PropertyListing>(data.clone())
                .ok()
                .map(CandidateItem::Property),
            ItemKind::Vehicle => serde_json::from_value::<VehicleListing>(data.clone())
                .ok()
                .map(CandidateItem::Vehicle),
        }
    }

    fn parse_items(kind: ItemKind, documents: &[Value]) -> Vec<CandidateItem> {
        documents
            .iter()
            .filter_map(|doc| Self::parse_item(kind, doc))
            .collect()
    }

    fn filter_queries(filter: &SearchFilter) -> Vec<String> {
        let mut queries = vec![r#"equal("isAvailable", true)"#.to_string()];

        if let Some(query) = filter.query.as_deref() {
            let trimmed = query.trim();
            if !trimmed.is_empty() {
                queries.push(format!(
                    "search(\"text\", {})",
                    Value::String(trimmed.to_string())
                ));
            }
        }

        if !filter.exclude_ids.is_empty() {
            let ids = filter
                .exclude_ids
                .iter()
                .map(|id| format!("\"{}\"", id))
                .collect::<Vec<_>>()
                .join(",");
            queries.push(format!("notIn(\"id\", [{}])", ids));
        }

        queries
    }
}

#[async_trait]
impl CandidateRepository for ListingStoreClient {
    async fn find_by_id(
        &self,
        kind: ItemKind,
        id: &str,
    ) -> Result<Option<CandidateItem>, StoreError> {
        let queries = vec![format!("equal(\"id\", \"{}\")", id), "limit(1)".to_string()];
        let (documents, _) = self.fetch_documents(kind.collection(), &queries).await?;
        Ok(documents.first().and_then(|doc| Self::parse_item(kind, doc)))
    }

    async fn find_by_ids(
        &self,
        kind: ItemKind,
        ids: &[String],
    ) -> Result<Vec<CandidateItem>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids
            .iter()
            .map(|id| format!("\"{}\"", id))
            .collect::<Vec<_>>()
            .join(",");
        let queries = vec![format!("in(\"id\", [{}])", id_list)];

        let (documents, _) = self.fetch_documents(kind.collection(), &queries).await?;
        Ok(Self::parse_items(kind, &documents))
    }

    async fn find_featured(
        &self,
        kind: ItemKind,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let queries = vec![
            r#"equal("isFeatured", true)"#.to_string(),
            r#"equal("isAvailable", true)"#.to_string(),
            format!("limit({})", limit),
        ];

        let (documents, _) = self.fetch_documents(kind.collection(), &queries).await?;
        Ok(Self::parse_items(kind, &documents))
    }

    async fn find_random(
        &self,
        kind: ItemKind,
        count: usize,
        exclude: &HashSet<String>,
        category: Option<&str>,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut queries = vec![r#"equal("isAvailable", true)"#.to_string()];
        if let Some(category) = category {
            queries.push(format!(
                "equal(\"category\", {})",
                Value::String(category.to_string())
            ));
        }
        if !exclude.is_empty() {
            let ids = exclude
                .iter()
                .map(|id| format!("\"{}\"", id))
                .collect::<Vec<_>>()
                .join(",");
            queries.push(format!("notIn(\"id\", [{}])", ids));
        }
        queries.push(format!("sample({})", count));

        let (documents, _) = self.fetch_documents(kind.collection(), &queries).await?;
        Ok(Self::parse_items(kind, &documents))
    }

    async fn text_search(
        &self,
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let mut queries = Self::filter_queries(filter);
        queries.push(format!("limit({})", limit));

        let (documents, _) = self
            .fetch_documents(filter.kind.collection(), &queries)
            .await?;
        Ok(Self::parse_items(filter.kind, &documents))
    }

    async fn count_matching(&self, filter: &SearchFilter) -> Result<u64, StoreError> {
        let mut queries = Self::filter_queries(filter);
        queries.push("limit(1)".to_string());

        let (_, total) = self
            .fetch_documents(filter.kind.collection(), &queries)
            .await?;
        Ok(total)
    }

    async fn find_near(
        &self,
        kind: ItemKind,
        center: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Result<Vec<CandidateItem>, StoreError> {
        let queries = vec![
            r#"equal("isAvailable", true)"#.to_string(),
            format!("near({}, {}, {})", center.lat, center.lng, radius_m),
            format!("limit({})", limit),
        ];

        let (documents, _) = self.fetch_documents(kind.collection(), &queries).await?;
        Ok(Self::parse_items(kind, &documents))
    }

    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let queries = vec![
            format!("equal(\"userId\", \"{}\")", user_id),
            "limit(1)".to_string(),
        ];

        let (documents, _) = self
            .fetch_documents(USER_PROFILES_COLLECTION, &queries)
            .await?;

        let Some(doc) = documents.first() else {
            return Ok(None);
        };
        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| StoreError::InvalidResponse(format!("failed to parse profile: {}", e)))
    }

    async fn update_visited(
        &self,
        user_id: &str,
        visited: &[VisitedEntry],
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/v1/collections/{}/documents/{}",
            self.base_url.trim_end_matches('/'),
            USER_PROFILES_COLLECTION,
            user_id
        );

        let payload = serde_json::json!({ "visited": visited });

        let response = self
            .client
            .patch(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        if !status.is_success() {
            return Err(StoreError::ApiError(format!(
                "failed to update visited list: {}",
                status
            )));
        }

        tracing::debug!("Updated visited list for {} ({} entries)", user_id, visited.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    #[test]
    fn test_documents_url_encodes_queries() {
        let client = ListingStoreClient::new(
            "https://store.test/".to_string(),
            "key".to_string(),
            30,
        );
        let url = client.documents_url("properties", &["limit(1)".to_string()]);
        assert!(url.starts_with("https://store.test/v1/collections/properties/documents?query="));
        assert!(url.contains("limit%281%29"));
    }

    #[test]
    fn test_parse_item_skips_garbage() {
        let good = serde_json::json!({
            "id": "p1",
            "title": "Flat",
            "city": "Delhi",
            "category": "apartment"
        });
        let bad = serde_json::json!({ "id": 42 });

        let parsed = ListingStoreClient::parse_items(
            ItemKind::Property,
            &[good, bad],
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id(), "p1");
        assert_eq!(parsed[0].rating().count, Rating::default().count);
    }

    #[test]
    fn test_filter_queries_include_exclusions() {
        let mut filter = SearchFilter::new(ItemKind::Vehicle);
        filter.query = Some("sedan".to_string());
        filter.exclude_ids = vec!["v1".to_string(), "v2".to_string()];

        let queries = ListingStoreClient::filter_queries(&filter);
        assert!(queries.iter().any(|q| q.contains("isAvailable")));
        assert!(queries.iter().any(|q| q.contains("search")));
        assert!(queries.iter().any(|q| q.contains("notIn")));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_short_circuits() {
        let client = ListingStoreClient::new(
            "http://127.0.0.1:1".to_string(),
            "key".to_string(),
            1,
        );
        // No HTTP round-trip for an empty id list
        let items = client.find_by_ids(ItemKind::Property, &[]).await.unwrap();
        assert!(items.is_empty());
    }
}
