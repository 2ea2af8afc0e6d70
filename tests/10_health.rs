mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::ensure_server().await?;

    let body: Value = reqwest::get(server.url("/")).await?.json().await?;
    assert_eq!(body["data"]["name"], "Trip Planner API");
    assert!(body["data"]["endpoints"]["daily_plans"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/plans")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = client.get(server.url("/api/plans")).bearer_auth("not.a.jwt").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_echoes_token_identity() -> Result<()> {
    let server = common::ensure_server().await?;
    let user = common::TestUser::new("alice")?;

    let res = reqwest::Client::new()
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&user.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["user_id"], user.id.to_string());
    Ok(())
}
