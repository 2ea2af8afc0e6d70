use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Friendship, UserProfile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReceiverQuery {
    pub receiver_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SenderQuery {
    pub sender_id: Uuid,
}

/// POST /api/friends/requests?receiver_id=
pub async fn request_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReceiverQuery>,
) -> ApiResult<Friendship> {
    let friendship = state.friends.send_request(&user, query.receiver_id).await?;
    Ok(ApiResponse::created(friendship))
}

/// GET /api/friends/requests - users waiting on the caller's answer
pub async fn request_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<UserProfile>> {
    let senders = state.friends.list_incoming(&user).await?;
    Ok(ApiResponse::success(senders))
}

/// POST /api/friends/requests/accept?sender_id=
pub async fn request_accept(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SenderQuery>,
) -> ApiResult<Friendship> {
    let friendship = state.friends.accept(&user, query.sender_id).await?;
    Ok(ApiResponse::success(friendship))
}

/// POST /api/friends/requests/reject?sender_id=
pub async fn request_reject(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SenderQuery>,
) -> ApiResult<Friendship> {
    let friendship = state.friends.reject(&user, query.sender_id).await?;
    Ok(ApiResponse::success(friendship))
}

/// GET /api/friends
pub async fn friend_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<UserProfile>> {
    let friends = state.friends.list_friends(&user).await?;
    Ok(ApiResponse::success(friends))
}
