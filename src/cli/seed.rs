//! Fixture import and teardown for the `seed` binary.
//!
//! Files are looked up by collection name (`users`, `missions`, `incidents`,
//! `reports`) with a `.json`, `.yaml` or `.yml` extension. A missing file is an
//! empty collection. Records may carry explicit `id`s so that children can
//! reference their parents.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{IncidentInput, MissionInput, ReportInput, UserInput};
use crate::database::Database;

#[derive(Debug, Deserialize)]
pub struct UserFixture {
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub input: UserInput,
}

#[derive(Debug, Deserialize)]
pub struct MissionFixture {
    pub id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    #[serde(flatten)]
    pub input: MissionInput,
}

#[derive(Debug, Deserialize)]
pub struct IncidentFixture {
    pub id: Option<Uuid>,
    pub mission_id: Uuid,
    #[serde(flatten)]
    pub input: IncidentInput,
}

#[derive(Debug, Deserialize)]
pub struct ReportFixture {
    pub id: Option<Uuid>,
    pub incident_id: Uuid,
    #[serde(flatten)]
    pub input: ReportInput,
}

#[derive(Debug, Default)]
pub struct Fixtures {
    pub users: Vec<UserFixture>,
    pub missions: Vec<MissionFixture>,
    pub incidents: Vec<IncidentFixture>,
    pub reports: Vec<ReportFixture>,
}

impl Fixtures {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Fixture directory not found: {}", dir.display());
        }
        Ok(Self {
            users: load_collection(dir, "users")?,
            missions: load_collection(dir, "missions")?,
            incidents: load_collection(dir, "incidents")?,
            reports: load_collection(dir, "reports")?,
        })
    }
}

fn fixture_file(dir: &Path, name: &str) -> Option<PathBuf> {
    ["json", "yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext)))
        .find(|path| path.is_file())
}

fn load_collection<T: DeserializeOwned>(dir: &Path, name: &str) -> anyhow::Result<Vec<T>> {
    let Some(path) = fixture_file(dir, name) else {
        tracing::warn!("No {} fixture in {}", name, dir.display());
        return Ok(Vec::new());
    };

    let content = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let records = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?,
        _ => serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?,
    };
    Ok(records)
}

/// Insert every fixture in dependency order inside one transaction.
pub async fn import(db: &Database, dir: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let fixtures = Fixtures::load(dir)?;
    let mut tx = db.pool().begin().await?;

    for user in fixtures.users.iter() {
        insert_user(&mut tx, user).await?;
    }
    for mission in fixtures.missions.iter() {
        insert_mission(&mut tx, mission).await?;
    }
    for incident in fixtures.incidents.iter() {
        insert_incident(&mut tx, incident).await?;
    }
    for report in fixtures.reports.iter() {
        insert_report(&mut tx, report).await?;
    }

    tx.commit().await?;

    output_success(
        output_format,
        "Data imported",
        Some(json!({
            "users": fixtures.users.len(),
            "missions": fixtures.missions.len(),
            "incidents": fixtures.incidents.len(),
            "reports": fixtures.reports.len(),
        })),
    )
}

/// Children first, so foreign keys never block the delete.
pub async fn destroy(db: &Database, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut tx = db.pool().begin().await?;
    let mut counts = serde_json::Map::new();
    for table in ["reports", "incidents", "missions", "users"] {
        let deleted = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.insert(table.to_string(), json!(deleted));
    }
    tx.commit().await?;

    output_success(output_format, "Data destroyed", Some(counts.into()))
}

async fn insert_user(tx: &mut Transaction<'_, Postgres>, fixture: &UserFixture) -> anyhow::Result<()> {
    let fields = fixture.input.clone().validate_new()?;
    let password = hash_password(fields.password.as_deref().unwrap_or_default())?;

    sqlx::query(
        "INSERT INTO users (id, name, email, role, password) VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5)",
    )
    .bind(fixture.id)
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.role)
    .bind(password)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("inserting user {}", fields.email))?;
    Ok(())
}

async fn insert_mission(tx: &mut Transaction<'_, Postgres>, fixture: &MissionFixture) -> anyhow::Result<()> {
    let fields = fixture.input.clone().validate_new()?;

    sqlx::query(
        r#"
        INSERT INTO missions (id, name, description, status, commander, slug, owner_id)
        VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(fixture.id)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.status)
    .bind(&fields.commander)
    .bind(&fields.slug)
    .bind(fixture.owner_id)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("inserting mission {}", fields.name))?;
    Ok(())
}

async fn insert_incident(tx: &mut Transaction<'_, Postgres>, fixture: &IncidentFixture) -> anyhow::Result<()> {
    let fields = fixture.input.clone().validate_new()?;

    sqlx::query(
        r#"
        INSERT INTO incidents (id, title, description, status, mission_id)
        VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5)
        "#,
    )
    .bind(fixture.id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.status)
    .bind(fixture.mission_id)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("inserting incident {}", fields.title))?;
    Ok(())
}

async fn insert_report(tx: &mut Transaction<'_, Postgres>, fixture: &ReportFixture) -> anyhow::Result<()> {
    let fields = fixture.input.clone().validate_new()?;

    sqlx::query(
        r#"
        INSERT INTO reports (id, title, content, status, incident_id)
        VALUES (COALESCE($1, gen_random_uuid()), $2, $3, $4, $5)
        "#,
    )
    .bind(fixture.id)
    .bind(&fields.title)
    .bind(&fields.content)
    .bind(&fields.status)
    .bind(fixture.incident_id)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("inserting report {}", fields.title))?;
    Ok(())
}
