use sqlx::PgPool;
use uuid::Uuid;

use super::missions::MissionService;
use super::{ServiceError, ServiceResult};
use crate::auth::{ensure_owner_or_commander, Principal};
use crate::database::models::{Incident, IncidentInput};
use crate::database::Database;

pub const INCIDENT_NOT_FOUND: &str = "Incident not found";

pub struct IncidentService {
    pool: PgPool,
    missions: MissionService,
}

impl IncidentService {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            missions: MissionService::new(db),
        }
    }

    /// Create under `mission_id`. Existence is checked before ownership.
    pub async fn create(
        &self,
        principal: &Principal,
        mission_id: Uuid,
        input: IncidentInput,
    ) -> ServiceResult<Incident> {
        let mission = self.missions.find(mission_id).await?;
        ensure_owner_or_commander(
            mission.owner_id,
            principal,
            "create an incident for mission",
            mission.id,
        )
        .map_err(ServiceError::Forbidden)?;
        let fields = input.validate_new()?;

        let incident = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents (title, description, status, mission_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.status)
        .bind(mission.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(incident)
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<Incident> {
        sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(INCIDENT_NOT_FOUND.to_string()))
    }

    pub async fn update(&self, id: Uuid, input: IncidentInput) -> ServiceResult<Incident> {
        let current = self.find(id).await?;
        let fields = input.validate_update(&current)?;

        sqlx::query_as::<_, Incident>(
            r#"
            UPDATE incidents
            SET title = $2, description = $3, status = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(&fields.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(INCIDENT_NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let incident = self.find(id).await?;
        delete_cascade(&self.pool, incident.id).await
    }
}

/// Remove an incident's reports, then the incident.
pub(crate) async fn delete_cascade(pool: &PgPool, incident_id: Uuid) -> ServiceResult<()> {
    let reports = sqlx::query("DELETE FROM reports WHERE incident_id = $1")
        .bind(incident_id)
        .execute(pool)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM incidents WHERE id = $1")
        .bind(incident_id)
        .execute(pool)
        .await?;

    tracing::debug!("Deleted incident {} and {} reports", incident_id, reports);
    Ok(())
}
