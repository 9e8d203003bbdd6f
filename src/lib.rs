//! NestDrive Discovery - personalized discovery service for the NestDrive
//! rental marketplace
//!
//! This library provides the discovery core shared by the marketplace
//! backend: the recommendation cascade, multi-mode ranked search, and
//! geospatial nearby resolution.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    haversine_distance, NearbyLocator, RankedSearchEngine, RecommendationEngine,
};
pub use models::{CandidateItem, ItemKind, SearchFilter, SortMode, UserProfile, ViewerContext};
