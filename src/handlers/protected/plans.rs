use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::TripPlanResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AddMemberRequest, CreatePlanRequest};
use crate::state::AppState;

/// POST /api/plans - create a plan owned by the caller
pub async fn plan_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreatePlanRequest>,
) -> ApiResult<TripPlanResponse> {
    let plan = state.plans.create(request, &user).await?;
    Ok(ApiResponse::created(TripPlanResponse::from(&plan)))
}

/// GET /api/plans - plans the caller belongs to
pub async fn plan_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<TripPlanResponse>> {
    let plans = state.plans.list_mine(&user).await?;
    Ok(ApiResponse::success(plans.iter().map(TripPlanResponse::from).collect()))
}

/// GET /api/plans/:plan_id
pub async fn plan_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<TripPlanResponse> {
    let plan = state.plans.get(plan_id, &user).await?;
    Ok(ApiResponse::success(TripPlanResponse::from(&plan)))
}

/// DELETE /api/plans/:plan_id - owner only; daily plans go with it
pub async fn plan_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<()> {
    state.plans.delete(plan_id, &user).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/plans/:plan_id/members - owner adds a MEMBER
pub async fn member_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> ApiResult<TripPlanResponse> {
    let plan = state.plans.add_member(plan_id, request.user_id, &user).await?;
    Ok(ApiResponse::created(TripPlanResponse::from(&plan)))
}
