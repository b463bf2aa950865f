#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

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
        let uploads = std::env::temp_dir().join(format!("mission-control-uploads-{}", port));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mission-control-api"));
        cmd.env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STORAGE_BACKEND", "local")
            .env("STORAGE_LOCAL_ROOT", &uploads)
            .env("STORAGE_PUBLIC_URL", format!("{}/uploads", base_url))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL
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

/// The shared server, or `None` when no database is configured for this run.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").map(|v| v.is_empty()).unwrap_or(true) {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// A freshly registered account.
pub struct Account {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub async fn register(server: &TestServer, role: &str) -> Result<Account> {
    let email = format!("{}@example.com", unique(role));
    let res = Client::new()
        .post(server.url("/api/v1/auth/register"))
        .json(&json!({"name": format!("{} tester", role), "email": email, "password": "password123", "role": role}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "register failed: {}", res.status());
    let token = res.json::<Value>().await?["token"]
        .as_str()
        .context("token missing")?
        .to_string();

    let me = Client::new()
        .get(server.url("/api/v1/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = me["data"]["id"].as_str().context("user id missing")?.to_string();

    Ok(Account { id, email, token })
}

pub async fn create_mission(server: &TestServer, account: &Account, name: &str, status: &str) -> Result<Value> {
    let res = Client::new()
        .post(server.url("/api/missions"))
        .bearer_auth(&account.token)
        .json(&json!({"name": name, "description": "test mission", "status": status, "commander": "Tester"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create mission failed: {}", res.status());
    Ok(res.json().await?)
}

pub async fn create_incident(server: &TestServer, account: &Account, mission_id: &str) -> Result<Value> {
    let res = Client::new()
        .post(server.url(&format!("/api/missions/{}/incidents", mission_id)))
        .bearer_auth(&account.token)
        .json(&json!({"title": "Sensor fault", "description": "Readings dropped", "status": "pending"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create incident failed: {}", res.status());
    Ok(res.json().await?)
}

pub async fn create_report(server: &TestServer, account: &Account, mission_id: &str, incident_id: &str) -> Result<Value> {
    let res = Client::new()
        .post(server.url(&format!("/api/missions/{}/incidents/{}/reports", mission_id, incident_id)))
        .bearer_auth(&account.token)
        .json(&json!({"title": "Initial report", "content": "Sensor replaced", "status": "open"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create report failed: {}", res.status());
    Ok(res.json().await?)
}
