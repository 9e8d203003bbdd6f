use crate::models::{CandidateItem, ViewerContext};

/// Weight for a listing the viewer has booked before
const BOOKED_WEIGHT: f64 = 1000.0;
/// Weight for a favorited listing
const FAVORITE_WEIGHT: f64 = 500.0;
/// Weight for a listing in the viewer's home city
const SAME_CITY_WEIGHT: f64 = 100.0;
/// Weight for a featured listing
const FEATURED_WEIGHT: f64 = 50.0;
/// Upper bound (exclusive) of the random tie-break component
pub const TIE_BREAK_RANGE: f64 = 10.0;

/// Relevance score for one candidate
///
/// score = 1000·booked + 500·favorited + 100·same-city + 50·featured + jitter
///
/// `jitter` is the caller-supplied tie-break in [0, 10); passing 0 makes the
/// score deterministic for tests. City comparison is literal case-insensitive
/// equality with no locale normalization.
pub fn relevance_score(item: &CandidateItem, viewer: &ViewerContext, jitter: f64) -> f64 {
    let mut score = 0.0;

    if viewer.booked_ids.contains(item.id()) {
        score += BOOKED_WEIGHT;
    }
    if viewer.favorite_ids.contains(item.id()) {
        score += FAVORITE_WEIGHT;
    }
    if let Some(home_city) = viewer.home_city.as_deref() {
        if item.city().eq_ignore_ascii_case(home_city) {
            score += SAME_CITY_WEIGHT;
        }
    }
    if item.featured() {
        score += FEATURED_WEIGHT;
    }

    score + jitter
}
