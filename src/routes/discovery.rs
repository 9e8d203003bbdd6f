use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{
    NearbyError, NearbyLocator, NearbyScope, RankedSearchEngine, RecommendError,
    RecommendationEngine,
};
use crate::models::{
    ApiError, CoordinatesQuery, CoordinatesResponse, FeaturedQuery, HealthResponse, ItemKind,
    LocationSummary, MessageResponse, NearbyData, NearbyQuery, NearbyResponse, Pagination,
    RecommendedQuery, RecommendedResponse, RecordVisitRequest, SearchData, SearchFilter,
    SearchQuery, SearchResponse, SearchResultItem,
};
use crate::services::{CandidateRepository, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommendationEngine>,
    pub searcher: Arc<RankedSearchEngine>,
    pub locator: Arc<NearbyLocator>,
    pub verifier: Arc<TokenVerifier>,
    pub repo: Arc<dyn CandidateRepository>,
}

/// Configure all discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/recommended/cache", web::delete().to(clear_recommendation_cache))
        .route("/recommended/visit", web::post().to(record_visit))
        .route("/recommended/featured", web::get().to(featured_listings))
        .route("/recommended/{kind}", web::get().to(recommended_items))
        .route("/search/paginated", web::get().to(search_paginated))
        .route("/nearby", web::get().to(nearby_listings))
        .route("/nearby/coordinates", web::get().to(nearby_coordinates));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// User id from the optional Authorization header, soft-failing
fn bearer_user(state: &AppState, req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    state.verifier.user_id_from_header(header)
}

/// Forwarded client IP, preferring X-Forwarded-For over the peer address
fn client_ip(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// Recommended listings endpoint
///
/// GET /api/v1/recommended/{properties|vehicles}?category=all
///
/// Personalized when a valid bearer token is present; anonymous callers get
/// random fill. A degraded cascade still answers 200 with `fallback: true`.
async fn recommended_items(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RecommendedQuery>,
    req: HttpRequest,
) -> impl Responder {
    let kind: ItemKind = match path.parse() {
        Ok(kind) => kind,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    let user_id = bearer_user(&state, &req);
    let raw_category = query.category.trim();
    let category = if raw_category.is_empty() || raw_category.eq_ignore_ascii_case("all") {
        "all"
    } else {
        raw_category
    };

    match state
        .recommender
        .recommend(user_id.as_deref(), kind, category)
        .await
    {
        Ok(recommendations) => {
            let results: Vec<SearchResultItem> = recommendations
                .items
                .iter()
                .map(|item| SearchResultItem::from_item(item, None))
                .collect();

            tracing::info!(
                "Returning {} recommended {} (category: {}, cached: {}, fallback: {})",
                results.len(),
                kind.collection(),
                category,
                recommendations.cached,
                recommendations.fallback
            );

            HttpResponse::Ok().json(RecommendedResponse {
                success: true,
                total: results.len(),
                results,
                cached: recommendations.cached,
                fallback: recommendations.fallback.then_some(true),
            })
        }
        Err(e) => {
            tracing::error!("Recommendation request failed: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// Clear the authenticated user's recommendation cache entries
///
/// DELETE /api/v1/recommended/cache
async fn clear_recommendation_cache(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> impl Responder {
    let Some(user_id) = bearer_user(&state, &req) else {
        return HttpResponse::Unauthorized()
            .json(ApiError::new("Authentication required to clear the cache"));
    };

    match state.recommender.clear_cache(&user_id).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::ok("Recommendation cache cleared")),
        Err(e) => {
            tracing::error!("Cache invalidation failed for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// Record a listing visit on the authenticated user's history
///
/// POST /api/v1/recommended/visit
///
/// Request body:
/// ```json
/// {
///   "itemId": "string",
///   "itemType": "property|vehicle"
/// }
/// ```
async fn record_visit(
    state: web::Data<AppState>,
    body: web::Json<RecordVisitRequest>,
    req: HttpRequest,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(ApiError::new(errors.to_string()));
    }

    let Some(user_id) = bearer_user(&state, &req) else {
        return HttpResponse::Unauthorized()
            .json(ApiError::new("Authentication required to record a visit"));
    };

    let kind: ItemKind = match body.item_type.parse() {
        Ok(kind) => kind,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    match state
        .recommender
        .record_visit(&user_id, kind, &body.item_id)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::ok("Visit recorded")),
        Err(e @ (RecommendError::ItemNotFound(_) | RecommendError::UserNotFound(_))) => {
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to record visit for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// Featured listings rail
///
/// GET /api/v1/recommended/featured?type=properties&limit=10
async fn featured_listings(
    state: web::Data<AppState>,
    query: web::Query<FeaturedQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ApiError::new(errors.to_string()));
    }

    let kind: ItemKind = match query.item_type.parse() {
        Ok(kind) => kind,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    match state.repo.find_featured(kind, query.limit as usize).await {
        Ok(items) => {
            let results: Vec<SearchResultItem> = items
                .iter()
                .map(|item| SearchResultItem::from_item(item, None))
                .collect();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "total": results.len(),
                "results": results,
            }))
        }
        Err(e) => {
            tracing::error!("Featured listings query failed: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// Paginated ranked search endpoint
///
/// GET /api/v1/search/paginated?type=property&page=0&limit=20&sort=relevance
async fn search_paginated(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
    req: HttpRequest,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ApiError::new(errors.to_string()));
    }

    let kind: ItemKind = match query.item_type.parse() {
        Ok(kind) => kind,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    let coordinates = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => match crate::core::validate_coordinates(lat, lng) {
            Ok(point) => Some(point),
            Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
        },
        (None, None) => None,
        _ => {
            return HttpResponse::BadRequest()
                .json(ApiError::new("lat and lng must be provided together"));
        }
    };

    let user_id = bearer_user(&state, &req);
    let viewer = state.searcher.resolve_viewer(user_id, coordinates).await;

    let mut filter = SearchFilter::new(kind);
    filter.query = query.query.clone();
    filter.exclude_ids = query.exclude_ids();

    match state
        .searcher
        .search(&filter, query.sort, query.page, query.limit, &viewer)
        .await
    {
        Ok(outcome) => {
            let results: Vec<SearchResultItem> =
                outcome.items.iter().map(SearchResultItem::from).collect();
            let total_pages = outcome.total.div_ceil(query.limit as u64);

            tracing::info!(
                "Search returned {} of {} {} results (page {}, sort {})",
                results.len(),
                outcome.total,
                kind.collection(),
                query.page,
                query.sort.as_str()
            );

            HttpResponse::Ok().json(SearchResponse {
                success: true,
                data: SearchData {
                    results,
                    pagination: Pagination {
                        page: query.page,
                        limit: query.limit,
                        total: outcome.total,
                        has_more: outcome.has_more,
                        total_pages,
                        sort: query.sort,
                    },
                },
            })
        }
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

fn nearby_error_response(err: NearbyError) -> HttpResponse {
    match err {
        NearbyError::Validation(message) => HttpResponse::BadRequest().json(ApiError::new(message)),
        NearbyError::Unresolvable => {
            HttpResponse::BadRequest().json(ApiError::new(NearbyError::Unresolvable.to_string()))
        }
        NearbyError::Store(e) => {
            tracing::error!("Nearby store query failed: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
        NearbyError::GeoIp(e) => {
            tracing::error!("Geolocation lookup failed: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}

/// Nearby listings endpoint
///
/// GET /api/v1/nearby?latitude=..&longitude=..&maxDistance=10&type=all
///
/// Falls back to IP geolocation when coordinates are omitted.
async fn nearby_listings(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
    req: HttpRequest,
) -> impl Responder {
    let scope: NearbyScope = match query.item_type.parse() {
        Ok(scope) => scope,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    let ip = client_ip(&req);
    let location = match state
        .locator
        .resolve_coordinates(query.latitude, query.longitude, ip.as_deref())
        .await
    {
        Ok(location) => location,
        Err(e) => return nearby_error_response(e),
    };

    match state
        .locator
        .find_nearby(location.point(), scope, query.max_distance_km)
        .await
    {
        Ok(listings) => {
            let properties: Vec<SearchResultItem> =
                listings.properties.iter().map(SearchResultItem::from).collect();
            let vehicles: Vec<SearchResultItem> =
                listings.vehicles.iter().map(SearchResultItem::from).collect();

            HttpResponse::Ok().json(NearbyResponse {
                success: true,
                data: NearbyData {
                    location: LocationSummary {
                        latitude: location.latitude,
                        longitude: location.longitude,
                        source: location.source,
                    },
                    total: properties.len() + vehicles.len(),
                    properties,
                    vehicles,
                },
            })
        }
        Err(e) => nearby_error_response(e),
    }
}

/// Coordinate resolution endpoint
///
/// GET /api/v1/nearby/coordinates[?latitude=..&longitude=..]
async fn nearby_coordinates(
    state: web::Data<AppState>,
    query: web::Query<CoordinatesQuery>,
    req: HttpRequest,
) -> impl Responder {
    let ip = client_ip(&req);

    match state
        .locator
        .resolve_coordinates(query.latitude, query.longitude, ip.as_deref())
        .await
    {
        Ok(location) => HttpResponse::Ok().json(CoordinatesResponse {
            success: true,
            data: location,
        }),
        Err(e) => nearby_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
