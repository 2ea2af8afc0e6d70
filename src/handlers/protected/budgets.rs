use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Budget, BudgetDraft, BudgetFilter};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/plans/:plan_id/budgets - attach a budget line to one of the plan's daily plans
pub async fn budget_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    Json(draft): Json<BudgetDraft>,
) -> ApiResult<Budget> {
    let budget = state.budgets.create(plan_id, draft, &user).await?;
    Ok(ApiResponse::created(budget))
}

/// GET /api/plans/:plan_id/budgets[?daily_plan_id=…][&type=SPENT]
pub async fn budget_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<Uuid>,
    Query(filter): Query<BudgetFilter>,
) -> ApiResult<Vec<Budget>> {
    let budgets = state.budgets.list(plan_id, filter, &user).await?;
    Ok(ApiResponse::success(budgets))
}

pub async fn budget_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, budget_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Budget> {
    let budget = state.budgets.get(plan_id, budget_id, &user).await?;
    Ok(ApiResponse::success(budget))
}

pub async fn budget_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, budget_id)): Path<(Uuid, Uuid)>,
    Json(draft): Json<BudgetDraft>,
) -> ApiResult<Budget> {
    let budget = state.budgets.update(plan_id, budget_id, draft, &user).await?;
    Ok(ApiResponse::success(budget))
}

pub async fn budget_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((plan_id, budget_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    state.budgets.delete(plan_id, budget_id, &user).await?;
    Ok(ApiResponse::no_content())
}
