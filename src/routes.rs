use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router: public routes, protected /api routes and global layers
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(plan_routes())
        .merge(daily_plan_routes())
        .merge(budget_routes())
        .merge(location_routes())
        .merge(user_routes())
        .merge(friend_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/users/nickname-check", get(public::nickname_check))
        // Protected API
        .merge(protected)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes));

    let router = match cors_layer(config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    if config.api.enable_request_logging {
        router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    } else {
        router
    }
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    if matches!(config.environment, Environment::Development) {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn plan_routes() -> Router<AppState> {
    use protected::plans;

    Router::new()
        .route("/api/plans", post(plans::plan_post).get(plans::plan_list))
        .route("/api/plans/:plan_id", get(plans::plan_get).delete(plans::plan_delete))
        .route("/api/plans/:plan_id/members", post(plans::member_post))
}

fn daily_plan_routes() -> Router<AppState> {
    use protected::daily_plans;

    Router::new()
        .route(
            "/api/plans/:plan_id/daily-plans",
            post(daily_plans::daily_plan_generate).get(daily_plans::daily_plan_list),
        )
        .route(
            "/api/plans/:plan_id/daily-plans/:daily_plan_id",
            get(daily_plans::daily_plan_get)
                .put(daily_plans::daily_plan_put)
                .delete(daily_plans::daily_plan_delete),
        )
}

fn budget_routes() -> Router<AppState> {
    use protected::budgets;

    Router::new()
        .route(
            "/api/plans/:plan_id/budgets",
            post(budgets::budget_post).get(budgets::budget_list),
        )
        .route(
            "/api/plans/:plan_id/budgets/:budget_id",
            get(budgets::budget_get)
                .put(budgets::budget_put)
                .delete(budgets::budget_delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users/me", get(users::me_get))
        .route("/api/users/me/nickname", put(users::nickname_put))
        .route("/api/users/:user_id", get(users::user_get))
}

fn friend_routes() -> Router<AppState> {
    use protected::friends;

    Router::new()
        .route("/api/friends", get(friends::friend_list))
        .route(
            "/api/friends/requests",
            post(friends::request_post).get(friends::request_list),
        )
        .route("/api/friends/requests/accept", post(friends::request_accept))
        .route("/api/friends/requests/reject", post(friends::request_reject))
}

fn location_routes() -> Router<AppState> {
    use protected::locations;

    Router::new()
        .route("/api/locations", post(locations::location_post).get(locations::location_list))
        .route(
            "/api/locations/:location_id",
            get(locations::location_get)
                .put(locations::location_put)
                .delete(locations::location_delete),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::state::State;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn token_for(config: &AppConfig, username: &str) -> String {
        generate_jwt(&Claims::new(Uuid::new_v4(), username, 1), &config.security.jwt_secret).unwrap()
    }

    fn test_app() -> (Router, String) {
        let config = AppConfig::development();
        let token = token_for(&config, "mina");
        (app(State::in_memory(&config), &config), token)
    }

    async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let (app, _) = test_app();

        let (status, body) = send(&app, Method::GET, "/api/plans", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing Authorization header");

        let (status, _) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn plan_then_daily_plans() {
        let (app, token) = test_app();

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/plans",
            Some(&token),
            Some(json!({ "title": "Busan", "start_date": "2025-06-01", "end_date": "2025-06-03" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let plan_id = created["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/plans/{}/daily-plans", plan_id);
        let (status, generated) = send(&app, Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(generated["data"].as_array().map(Vec::len), Some(4));
        assert_eq!(generated["data"][0], json!({ "date": "2025-06-01", "trip_day_number": 0 }));

        let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn daily_plans_hidden_from_non_members() {
        let (app, token) = test_app();
        let stranger = token_for(&AppConfig::development(), "stranger");

        let (_, created) = send(
            &app,
            Method::POST,
            "/api/plans",
            Some(&token),
            Some(json!({ "title": "Gangneung", "start_date": "2025-06-01", "end_date": "2025-06-02" })),
        )
        .await;
        let plan_id = created["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/plans/{}/daily-plans", plan_id);
        let (_, generated) = send(&app, Method::POST, &uri, Some(&token), None).await;
        assert_eq!(generated["data"].as_array().map(Vec::len), Some(3));

        let (status, listed) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let row_id = listed["data"][0]["id"].as_str().unwrap().to_string();
        let row_uri = format!("{}/{}", uri, row_id);

        let (status, body) = send(&app, Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
        let (status, _) = send(&app, Method::GET, &row_uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, &row_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn nickname_check_is_public() {
        let (app, token) = test_app();

        let (status, body) = send(&app, Method::GET, "/api/users/nickname-check?nickname=mina", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], true);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/users/me/nickname",
            Some(&token),
            Some(json!({ "nickname": "mina" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/api/users/nickname-check?nickname=mina", None, None).await;
        assert_eq!(body["data"], false);

        // the rest of /api/users stays behind the token
        let (status, _) = send(&app, Method::GET, "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let (app, token) = test_app();
        let (status, _) = send(&app, Method::GET, "/api/plans/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
