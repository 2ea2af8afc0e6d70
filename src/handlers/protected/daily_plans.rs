use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{DailySchedule, ScheduleSlot};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ScheduleUpdate;
use crate::state::AppState;

/// POST /api/plans/:plan_id/daily-plans - overview row plus one row per trip day
///
/// Owner only, and at most once while any row of the plan is active. A 2025-06-01..03 trip yields:
/// ```json
/// { "success": true, "data": [
///   { "date": "2025-06-01", "trip_day_number": 0 },
///   { "date": "2025-06-01", "trip_day_number": 1 },
///   { "date": "2025-06-02", "trip_day_number": 2 },
///   { "date": "2025-06-03", "trip_day_number": 3 } ] }
/// ```
pub async fn daily_plan_generate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<Vec<ScheduleSlot>> {
    let slots = state.schedules.generate(plan_id, &user).await?;
    Ok(ApiResponse::created(slots))
}

/// GET /api/plans/:plan_id/daily-plans - plan members only
pub async fn daily_plan_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<Vec<DailySchedule>> {
    state.plans.get(plan_id, &user).await?;
    let schedules = state.schedules.list(plan_id).await?;
    Ok(ApiResponse::success(schedules))
}

/// GET /api/plans/:plan_id/daily-plans/:daily_plan_id
pub async fn daily_plan_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, daily_plan_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<DailySchedule> {
    state.plans.get(plan_id, &user).await?;
    let schedule = state.schedules.get(plan_id, daily_plan_id).await?;
    Ok(ApiResponse::success(schedule))
}

/// PUT /api/plans/:plan_id/daily-plans/:daily_plan_id
pub async fn daily_plan_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, daily_plan_id)): Path<(Uuid, Uuid)>,
    Json(change): Json<ScheduleUpdate>,
) -> ApiResult<ScheduleSlot> {
    let slot = state.schedules.update(plan_id, daily_plan_id, change, &user).await?;
    Ok(ApiResponse::success(slot))
}

/// DELETE /api/plans/:plan_id/daily-plans/:daily_plan_id - soft delete
pub async fn daily_plan_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, daily_plan_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.schedules.retire(plan_id, daily_plan_id, &user).await?;
    Ok(ApiResponse::no_content())
}
