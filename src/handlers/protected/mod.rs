// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Every handler receives the caller as `Extension<AuthUser>` from jwt_auth_middleware.
pub mod auth;
pub mod budgets;
pub mod daily_plans;
pub mod friends;
pub mod locations;
pub mod plans;
pub mod users;
