#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use trip_planner_api::auth::{generate_jwt, Claims};

pub const SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory store so the suite needs no database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_trip-planner-api"));
        cmd.env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("JWT_SECRET", SECRET)
            .env("TRIP_API_PORT", port.to_string())
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// A fresh identity and its bearer token
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new(username: &str) -> Result<Self> {
        let id = Uuid::new_v4();
        let token = generate_jwt(&Claims::new(id, username, 1), SECRET)?;
        Ok(Self { id, token })
    }
}

/// POST /api/plans and return the created plan's data
pub async fn create_plan(server: &TestServer, user: &TestUser, start: &str, end: &str) -> Result<Value> {
    let res = Client::new()
        .post(server.url("/api/plans"))
        .bearer_auth(&user.token)
        .json(&json!({
            "title": "Jeju",
            "description": "Island trip",
            "start_date": start,
            "end_date": end,
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create plan returned {}", res.status());

    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}

/// The `id` of a response object as a string
pub fn id_of(value: &Value) -> Result<String> {
    value["id"].as_str().map(str::to_string).context("missing id")
}

/// GET /api/users/me so the user has a profile others can find
pub async fn register(server: &TestServer, user: &TestUser) -> Result<Value> {
    let res = Client::new()
        .get(server.url("/api/users/me"))
        .bearer_auth(&user.token)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "register returned {}", res.status());

    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}
