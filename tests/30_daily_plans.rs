mod common;

use anyhow::{Context, Result};
use futures::future::join;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{create_plan, ensure_server, id_of, TestServer, TestUser};

async fn generate(server: &TestServer, user: &TestUser, plan_id: &str) -> Result<reqwest::Response> {
    Ok(Client::new()
        .post(server.url(&format!("/api/plans/{}/daily-plans", plan_id)))
        .bearer_auth(&user.token)
        .send()
        .await?)
}

async fn list(server: &TestServer, user: &TestUser, plan_id: &str) -> Result<Vec<Value>> {
    let body: Value = Client::new()
        .get(server.url(&format!("/api/plans/{}/daily-plans", plan_id)))
        .bearer_auth(&user.token)
        .send()
        .await?
        .json()
        .await?;
    body["data"].as_array().cloned().context("daily plan list")
}

#[tokio::test]
async fn generates_preparation_day_and_every_trip_day() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let plan = create_plan(server, &owner, "2025-06-01", "2025-06-03").await?;
    let plan_id = id_of(&plan)?;

    let res = generate(server, &owner, &plan_id).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    assert_eq!(
        body["data"],
        json!([
            { "date": "2025-06-01", "trip_day_number": 0 },
            { "date": "2025-06-01", "trip_day_number": 1 },
            { "date": "2025-06-02", "trip_day_number": 2 },
            { "date": "2025-06-03", "trip_day_number": 3 },
        ])
    );

    let rows = list(server, &owner, &plan_id).await?;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["status"] == "ACTIVE" && row["plan_id"] == plan_id.as_str()));
    Ok(())
}

#[tokio::test]
async fn second_generation_conflicts() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-06-01", "2025-06-01").await?)?;

    assert_eq!(generate(server, &owner, &plan_id).await?.status(), StatusCode::CREATED);

    let res = generate(server, &owner, &plan_id).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(list(server, &owner, &plan_id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn concurrent_generation_has_one_winner() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-09-01", "2025-09-05").await?)?;

    let (a, b) = join(generate(server, &owner, &plan_id), generate(server, &owner, &plan_id)).await;
    let mut statuses = vec![a?.status(), b?.status()];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(list(server, &owner, &plan_id).await?.len(), 6);
    Ok(())
}

#[tokio::test]
async fn only_owner_generates() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let member = TestUser::new("member")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-06-01", "2025-06-02").await?)?;

    let res = Client::new()
        .post(server.url(&format!("/api/plans/{}/members", plan_id)))
        .bearer_auth(&owner.token)
        .json(&json!({ "user_id": member.id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(generate(server, &member, &plan_id).await?.status(), StatusCode::FORBIDDEN);
    assert!(list(server, &owner, &plan_id).await?.is_empty());

    let res = generate(server, &owner, &Uuid::new_v4().to_string()).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn rows_are_scoped_to_their_plan() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let first = id_of(&create_plan(server, &owner, "2025-06-01", "2025-06-01").await?)?;
    let second = id_of(&create_plan(server, &owner, "2025-07-01", "2025-07-01").await?)?;
    generate(server, &owner, &first).await?;

    let row_id = id_of(&list(server, &owner, &first).await?[0])?;
    let client = Client::new();

    let res = client
        .get(server.url(&format!("/api/plans/{}/daily-plans/{}", second, row_id)))
        .bearer_auth(&owner.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(server.url(&format!("/api/plans/{}/daily-plans/{}", first, Uuid::new_v4())))
        .bearer_auth(&owner.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_then_retire() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let stranger = TestUser::new("stranger")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-06-01", "2025-06-03").await?)?;
    generate(server, &owner, &plan_id).await?;

    let row_id = id_of(&list(server, &owner, &plan_id).await?[1])?;
    let row_url = server.url(&format!("/api/plans/{}/daily-plans/{}", plan_id, row_id));
    let client = Client::new();

    let change = json!({ "date": "2025-06-10", "trip_day_number": 7 });
    let res = client.put(&row_url).bearer_auth(&stranger.token).json(&change).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(&row_url)
        .bearer_auth(&owner.token)
        .json(&json!({ "date": "2025-06-10", "trip_day_number": -1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.put(&row_url).bearer_auth(&owner.token).json(&change).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"], change);

    let res = client.delete(&row_url).bearer_auth(&owner.token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body: Value = client.get(&row_url).bearer_auth(&owner.token).send().await?.json().await?;
    assert_eq!(body["data"]["status"], "DELETED");
    assert_eq!(body["data"]["trip_day_number"], 7);

    let res = client.delete(&row_url).bearer_auth(&owner.token).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = client.put(&row_url).bearer_auth(&owner.token).json(&change).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn deleting_plan_removes_daily_plans() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-06-01", "2025-06-02").await?)?;
    generate(server, &owner, &plan_id).await?;
    let row_id = id_of(&list(server, &owner, &plan_id).await?[0])?;
    let client = Client::new();

    let res = client
        .delete(server.url(&format!("/api/plans/{}", plan_id)))
        .bearer_auth(&owner.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url(&format!("/api/plans/{}/daily-plans/{}", plan_id, row_id)))
        .bearer_auth(&owner.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn non_members_cannot_read_daily_plans() -> Result<()> {
    let server = ensure_server().await?;
    let owner = TestUser::new("owner")?;
    let stranger = TestUser::new("stranger")?;
    let plan_id = id_of(&create_plan(server, &owner, "2025-08-01", "2025-08-03").await?)?;
    generate(server, &owner, &plan_id).await?;
    let row_id = id_of(&list(server, &owner, &plan_id).await?[0])?;
    let client = Client::new();

    let res = client
        .get(server.url(&format!("/api/plans/{}", plan_id)))
        .bearer_auth(&stranger.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url(&format!("/api/plans/{}/daily-plans", plan_id)))
        .bearer_auth(&stranger.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url(&format!("/api/plans/{}/daily-plans/{}", plan_id, row_id)))
        .bearer_auth(&stranger.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
