// Core algorithm exports
pub mod dedup;
pub mod geo;
pub mod nearby;
pub mod recommend;
pub mod scoring;
pub mod search;

pub use dedup::DeduplicationTracker;
pub use geo::{distance_between, haversine_distance, round_distance_km, validate_coordinates};
pub use nearby::{NearbyError, NearbyLimits, NearbyListings, NearbyLocator, NearbyScope};
pub use recommend::{
    RecommendError, RecommendationEngine, RecommendationLimits, Recommendations,
};
pub use scoring::relevance_score;
pub use search::{RankedSearchEngine, SearchError, SearchOutcome, sort_candidates};
