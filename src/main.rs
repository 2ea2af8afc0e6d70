use tracing::info;
use tracing_subscriber::EnvFilter;

use trip_planner_api::{config, is_development, routes, state::State};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    info!("Starting Trip Planner API in {:?} mode", config.environment);
    if is_development!() {
        info!("Development mode: permissive CORS and a built-in JWT secret are active");
    }

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let state = State::from_config(config).await?;
    let app = routes::app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("Trip Planner API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
