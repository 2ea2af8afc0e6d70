use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Location, LocationDraft};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::LocationType;

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
}

pub async fn location_post(
    State(state): State<AppState>,
    Json(draft): Json<LocationDraft>,
) -> ApiResult<Location> {
    let location = state.locations.create(draft).await?;
    Ok(ApiResponse::created(location))
}

/// GET /api/locations[?type=RESTAURANT]
pub async fn location_list(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> ApiResult<Vec<Location>> {
    let locations = state.locations.list(query.location_type).await?;
    Ok(ApiResponse::success(locations))
}

pub async fn location_get(State(state): State<AppState>, Path(location_id): Path<Uuid>) -> ApiResult<Location> {
    let location = state.locations.get(location_id).await?;
    Ok(ApiResponse::success(location))
}

pub async fn location_put(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Json(draft): Json<LocationDraft>,
) -> ApiResult<Location> {
    let location = state.locations.update(location_id, draft).await?;
    Ok(ApiResponse::success(location))
}

pub async fn location_delete(State(state): State<AppState>, Path(location_id): Path<Uuid>) -> ApiResult<()> {
    state.locations.delete(location_id).await?;
    Ok(ApiResponse::no_content())
}
