use crate::core::geo::distance_between;
use crate::core::scoring::{relevance_score, TIE_BREAK_RANGE};
use crate::models::{GeoPoint, ScoredCandidate, SearchFilter, SortMode, ViewerContext};
use crate::services::{CandidateRepository, StoreError};
use rand::Rng;
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by ranked search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("listing store error: {0}")]
    Store(#[from] StoreError),
}

/// One page of ranked results
#[derive(Debug)]
pub struct SearchOutcome {
    pub items: Vec<ScoredCandidate>,
    pub total: u64,
    pub has_more: bool,
}

/// Scores, sorts, and paginates the full predicate-matching candidate set
///
/// The whole matching set is fetched and sorted in-process (no store-side
/// pagination); `max_candidates` bounds that set to cap worst-case latency.
pub struct RankedSearchEngine {
    repo: Arc<dyn CandidateRepository>,
    max_candidates: usize,
}

impl RankedSearchEngine {
    pub fn new(repo: Arc<dyn CandidateRepository>, max_candidates: usize) -> Self {
        Self {
            repo,
            max_candidates,
        }
    }

    /// Resolve personalization signals for an optionally-authenticated caller
    ///
    /// A missing or unknown user degrades to an anonymous context; search
    /// never fails because personalization did.
    pub async fn resolve_viewer(
        &self,
        user_id: Option<String>,
        coordinates: Option<GeoPoint>,
    ) -> ViewerContext {
        let Some(user_id) = user_id else {
            return ViewerContext::anonymous(coordinates);
        };

        match self.repo.get_user_profile(&user_id).await {
            Ok(Some(profile)) => ViewerContext {
                favorite_ids: profile
                    .favorite_property_ids
                    .iter()
                    .chain(profile.favorite_vehicle_ids.iter())
                    .cloned()
                    .collect(),
                booked_ids: profile
                    .booked_property_ids
                    .iter()
                    .chain(profile.booked_vehicle_ids.iter())
                    .cloned()
                    .collect(),
                home_city: profile.home_city.clone(),
                coordinates,
                user_id: Some(user_id),
            },
            Ok(None) => ViewerContext::anonymous(coordinates),
            Err(e) => {
                tracing::warn!(
                    "Viewer profile load failed for {}, searching unpersonalized: {}",
                    user_id,
                    e
                );
                ViewerContext::anonymous(coordinates)
            }
        }
    }

    pub async fn search(
        &self,
        filter: &SearchFilter,
        sort: SortMode,
        page: u32,
        page_size: u32,
        viewer: &ViewerContext,
    ) -> Result<SearchOutcome, SearchError> {
        // One past the bound detects truncation
        let mut items = self.repo.text_search(filter, self.max_candidates + 1).await?;

        let mut total = items.len() as u64;
        if items.len() > self.max_candidates {
            total = self.repo.count_matching(filter).await?;
            items.truncate(self.max_candidates);
            tracing::warn!(
                "Search candidate set truncated to {} of {} matches",
                self.max_candidates,
                total
            );
        }

        let mut rng = rand::thread_rng();
        let mut scored: Vec<ScoredCandidate> = items
            .into_iter()
            .map(|item| {
                let distance_km = match (viewer.coordinates, item.coordinates()) {
                    (Some(caller), Some(listing)) => Some(distance_between(caller, listing)),
                    _ => None,
                };
                // Scoring only feeds relevance ordering
                let score = if sort == SortMode::Relevance {
                    relevance_score(&item, viewer, rng.gen_range(0.0..TIE_BREAK_RANGE))
                } else {
                    0.0
                };
                ScoredCandidate {
                    item,
                    score,
                    distance_km,
                }
            })
            .collect();

        sort_candidates(&mut scored, sort);

        let offset = page as usize * page_size as usize;
        let page_items: Vec<ScoredCandidate> = scored
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        let has_more = offset + page_items.len() < total as usize;

        Ok(SearchOutcome {
            items: page_items,
            total,
            has_more,
        })
    }
}

/// Sort the full candidate set by the requested mode.
///
/// Every mode except relevance is deterministic for stable input: the sort is
/// stable and ties keep the store's order. Items missing a price or distance
/// always sort last.
pub fn sort_candidates(scored: &mut [ScoredCandidate], sort: SortMode) {
    match sort {
        SortMode::Relevance => {
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        SortMode::PriceAsc => {
            scored.sort_by(|a, b| {
                cmp_optional(a.item.resolved_price(), b.item.resolved_price(), true)
            });
        }
        SortMode::PriceDesc => {
            scored.sort_by(|a, b| {
                cmp_optional(a.item.resolved_price(), b.item.resolved_price(), false)
            });
        }
        SortMode::Rating => {
            scored.sort_by(|a, b| b.item.resolved_rating().total_cmp(&a.item.resolved_rating()));
        }
        SortMode::Nearest => {
            scored.sort_by(|a, b| cmp_optional(a.distance_km, b.distance_km, true));
        }
    }
}

fn cmp_optional(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            if ascending {
                x.total_cmp(&y)
            } else {
                y.total_cmp(&x)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
