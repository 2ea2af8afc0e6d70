// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::services::{BudgetError, FriendError, LocationError, PlanError, ScheduleError, UserError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure on a single named field
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.into());
        ApiError::validation_error("Invalid field value", Some(field_errors))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Sqlx(e @ (sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))) => {
                tracing::error!("Database unavailable: {}", e);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Migration(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::PlanNotFound(_) | ScheduleError::ScheduleNotFound(_) => ApiError::not_found(err.to_string()),
            ScheduleError::ScheduleNotInPlan { .. } => ApiError::bad_request(err.to_string()),
            ScheduleError::ScheduleAlreadyExists(_) | ScheduleError::ScheduleRetired(_) => {
                ApiError::conflict(err.to_string())
            }
            ScheduleError::AccessDenied => ApiError::forbidden(err.to_string()),
            ScheduleError::InvalidDayNumber(_) => ApiError::field_error("trip_day_number", err.to_string()),
            ScheduleError::Database(db) => db.into(),
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::PlanNotFound(_) => ApiError::not_found(err.to_string()),
            PlanError::AccessDenied(_) => ApiError::forbidden(err.to_string()),
            PlanError::MemberAlreadyExists { .. } => ApiError::conflict(err.to_string()),
            PlanError::Validation { field, message } => ApiError::field_error(field, message),
            PlanError::Database(db) => db.into(),
        }
    }
}

impl From<LocationError> for ApiError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::LocationNotFound(_) => ApiError::not_found(err.to_string()),
            LocationError::Validation { field, message } => ApiError::field_error(field, message),
            LocationError::Database(db) => db.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(_) => ApiError::not_found(err.to_string()),
            UserError::DuplicatedNickname(_) => ApiError::conflict(err.to_string()),
            UserError::Validation { field, message } => ApiError::field_error(field, message),
            UserError::Database(db) => db.into(),
        }
    }
}

impl From<FriendError> for ApiError {
    fn from(err: FriendError) -> Self {
        match err {
            FriendError::UserNotFound(_) | FriendError::RequestNotFound(_) => ApiError::not_found(err.to_string()),
            FriendError::AlreadyRequested => ApiError::conflict(err.to_string()),
            FriendError::SelfRequest => ApiError::field_error("receiver_id", err.to_string()),
            FriendError::Database(db) => db.into(),
        }
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::PlanNotFound(_) | BudgetError::BudgetNotFound(_) | BudgetError::DailyPlanNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            BudgetError::AccessDenied(_) => ApiError::forbidden(err.to_string()),
            BudgetError::DailyPlanNotInPlan { .. } => ApiError::bad_request(err.to_string()),
            BudgetError::DailyPlanRetired(_) => ApiError::conflict(err.to_string()),
            BudgetError::Validation { field, message } => ApiError::field_error(field, message),
            BudgetError::Database(db) => db.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn schedule_errors_map_to_distinct_statuses() {
        let id = Uuid::new_v4();
        let cases = [
            (ScheduleError::PlanNotFound(id), StatusCode::NOT_FOUND),
            (ScheduleError::ScheduleNotFound(id), StatusCode::NOT_FOUND),
            (ScheduleError::ScheduleNotInPlan { plan_id: id, schedule_id: id }, StatusCode::BAD_REQUEST),
            (ScheduleError::ScheduleAlreadyExists(id), StatusCode::CONFLICT),
            (ScheduleError::AccessDenied, StatusCode::FORBIDDEN),
            (ScheduleError::ScheduleRetired(id), StatusCode::CONFLICT),
            (ScheduleError::InvalidDayNumber(-2), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn friend_and_profile_errors_map_to_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(ApiError::from(FriendError::AlreadyRequested).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(FriendError::RequestNotFound(id)).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(FriendError::UserNotFound(id)).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(FriendError::SelfRequest).to_json()["field_errors"]["receiver_id"],
            "Cannot send a friend request to yourself"
        );
        assert_eq!(
            ApiError::from(UserError::DuplicatedNickname("mina".to_string())).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn budget_errors_map_to_statuses() {
        let id = Uuid::new_v4();
        let cases = [
            (BudgetError::BudgetNotFound(id), StatusCode::NOT_FOUND),
            (BudgetError::DailyPlanNotFound(id), StatusCode::NOT_FOUND),
            (BudgetError::AccessDenied(id), StatusCode::FORBIDDEN),
            (BudgetError::DailyPlanNotInPlan { plan_id: id, daily_plan_id: id }, StatusCode::BAD_REQUEST),
            (BudgetError::DailyPlanRetired(id), StatusCode::CONFLICT),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn validation_reports_field() {
        let err = ApiError::from(PlanError::Validation {
            field: "title",
            message: "must not be blank".to_string(),
        });
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["title"], "must not be blank");
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("row"));
    }
}
