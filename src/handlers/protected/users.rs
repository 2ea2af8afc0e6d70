use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

/// GET /api/users/me - the caller's profile, registered on first call
pub async fn me_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserProfile> {
    let profile = state.users.me(&user).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/users/me/nickname - 409 when another user holds the nickname
pub async fn nickname_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<NicknameRequest>,
) -> ApiResult<UserProfile> {
    let profile = state.users.update_nickname(&user, &request.nickname).await?;
    Ok(ApiResponse::success(profile))
}

/// GET /api/users/:user_id
pub async fn user_get(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> ApiResult<UserProfile> {
    let profile = state.users.get(user_id).await?;
    Ok(ApiResponse::success(profile))
}
