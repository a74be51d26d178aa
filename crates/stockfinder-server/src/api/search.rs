use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use stockfinder_core::Coordinates;
use stockfinder_search::{SearchError, SearchResult};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearedData {
    cleared: &'static str,
}

/// `lat` and `lng` are all-or-nothing and must be in range.
pub(super) fn parse_location(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<Coordinates>, &'static str> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
            .map(Some)
            .map_err(|_| "lat must be within [-90, 90] and lng within [-180, 180]"),
        _ => Err("lat and lng must be provided together"),
    }
}

fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::Unavailable => {
            ApiError::new(request_id, "search_unavailable", "search temporarily unavailable")
        }
        SearchError::Upstream(e) => {
            tracing::error!(error = %e, "search failed upstream");
            ApiError::new(request_id, "internal_error", "search failed")
        }
    }
}

pub(super) async fn search_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SearchResult>>>, ApiError> {
    let location = parse_location(params.lat, params.lng)
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;
    let query = params.q.unwrap_or_default();

    let data = state
        .engine
        .search_items(&query, location)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn recent_queries(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RecentParams>,
) -> Json<ApiResponse<Vec<String>>> {
    let limit = params.limit.map(|n| n.clamp(1, state.history_max.max(1)));
    let data = state.engine.recent_queries(limit).await;

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn clear_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ClearedData>> {
    state.engine.clear_history().await;
    tracing::info!("search history cleared via api");

    Json(ApiResponse {
        data: ClearedData { cleared: "history" },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn clear_result_cache(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ClearedData>> {
    state.engine.clear_result_cache();

    Json(ApiResponse {
        data: ClearedData { cleared: "cache" },
        meta: ResponseMeta::new(req_id.0),
    })
}
