use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::{ensure_owner_or_commander, Principal};
use crate::database::models::{Mission, MissionInput};
use crate::database::{Database, DatabaseError, PgStore, RecordSource, Relation};

pub const MISSION_NOT_FOUND: &str = "Mission not found";

pub struct MissionService {
    pool: PgPool,
}

impl MissionService {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    /// Insert a mission owned by `owner`. The slug is derived from the name.
    pub async fn create(&self, owner: &Principal, input: MissionInput) -> ServiceResult<Mission> {
        let fields = input.validate_new()?;

        let mission = sqlx::query_as::<_, Mission>(
            r#"
            INSERT INTO missions (name, description, status, commander, slug, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.status)
        .bind(&fields.commander)
        .bind(&fields.slug)
        .bind(owner.id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created mission {} ({}) for user {}", mission.id, mission.slug, owner.id);
        Ok(mission)
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<Mission> {
        sqlx::query_as::<_, Mission>("SELECT * FROM missions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.to_string()))
    }

    /// Mission with its incidents attached.
    pub async fn find_with_incidents(&self, id: Uuid) -> ServiceResult<Value> {
        let mission = self.find(id).await?;
        let mut records = vec![serde_json::to_value(&mission)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?];
        PgStore::new(self.pool.clone())
            .populate(Relation::MissionIncidents, &mut records)
            .await?;
        Ok(records.remove(0))
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: MissionInput) -> ServiceResult<Mission> {
        let current = self.find(id).await?;
        ensure_owner_or_commander(current.owner_id, principal, "update mission", current.id)
            .map_err(ServiceError::Forbidden)?;
        let fields = input.validate_update(&current)?;

        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET name = $2, description = $3, status = $4, commander = $5, slug = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.status)
        .bind(&fields.commander)
        .bind(&fields.slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(MISSION_NOT_FOUND.to_string()))?;

        Ok(mission)
    }

    /// Delete the mission after its incidents and their reports, one row at a time.
    ///
    /// Not transactional: a failure part way leaves the remaining children in place.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let mission = self.find(id).await?;
        ensure_owner_or_commander(mission.owner_id, principal, "delete mission", mission.id)
            .map_err(ServiceError::Forbidden)?;

        let incident_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM incidents WHERE mission_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        for incident_id in &incident_ids {
            super::incidents::delete_cascade(&self.pool, *incident_id).await?;
        }

        sqlx::query("DELETE FROM missions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Deleted mission {} with {} incidents", id, incident_ids.len());
        Ok(())
    }
}
