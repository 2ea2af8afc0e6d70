// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service metadata, the liveness probe used by deployments and tests, and the
// nickname availability check offered before sign-up.
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NicknameQuery {
    pub nickname: String,
}

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Trip Planner API",
            "version": version,
            "description": "Trip plans, daily schedules, budgets, locations and friends over HTTP",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/whoami (protected)",
                "plans": "/api/plans[/:plan_id[/members]] (protected)",
                "daily_plans": "/api/plans/:plan_id/daily-plans[/:daily_plan_id] (protected)",
                "budgets": "/api/plans/:plan_id/budgets[/:budget_id] (protected)",
                "locations": "/api/locations[/:location_id] (protected)",
                "users": "/api/users/me[/nickname], /api/users/:user_id (protected)",
                "nickname_check": "/api/users/nickname-check?nickname= (public)",
                "friends": "/api/friends[/requests[/accept|/reject]] (protected)",
            }
        }
    }))
}

/// GET /health - store ping, 503 when the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// GET /api/users/nickname-check?nickname= - true when the nickname is free
pub async fn nickname_check(
    State(state): State<AppState>,
    Query(query): Query<NicknameQuery>,
) -> ApiResult<bool> {
    let available = state.users.nickname_available(&query.nickname).await?;
    Ok(ApiResponse::success(available))
}
