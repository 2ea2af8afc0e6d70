use axum::Extension;

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - identity carried by the caller's token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
