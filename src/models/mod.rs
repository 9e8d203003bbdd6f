// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateItem, CoordinateSource, GeoPoint, ItemKind, PropertyListing, PropertyPrice, Rating,
    ResolvedLocation, ScoredCandidate, SearchFilter, SortMode, UserProfile, VehicleListing,
    VehiclePrice, ViewerContext, VisitedEntry, push_visit,
};
pub use requests::{
    CoordinatesQuery, FeaturedQuery, NearbyQuery, RecommendedQuery, RecordVisitRequest,
    SearchQuery,
};
pub use responses::{
    ApiError, CoordinatesResponse, HealthResponse, LocationSummary, MessageResponse, NearbyData,
    NearbyResponse, Pagination, RecommendedResponse, SearchData, SearchResponse, SearchResultItem,
};
