use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::incidents::{IncidentService, INCIDENT_NOT_FOUND};
use super::missions::MissionService;
use super::storage::{ObjectStore, StorageError};
use super::{ServiceError, ServiceResult};
use crate::auth::{ensure_owner_or_commander, Principal};
use crate::database::models::{Report, ReportFile, ReportInput};
use crate::database::Database;

pub const REPORT_NOT_FOUND: &str = "Report not found";
pub const FILE_NOT_FOUND: &str = "File not found";

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ReportService {
    pool: PgPool,
    missions: MissionService,
    incidents: IncidentService,
}

impl ReportService {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            missions: MissionService::new(db),
            incidents: IncidentService::new(db),
        }
    }

    /// Create under an incident of `mission_id`: mission existence, then ownership,
    /// then the incident must exist and belong to that mission.
    pub async fn create(
        &self,
        principal: &Principal,
        mission_id: Uuid,
        incident_id: Uuid,
        input: ReportInput,
    ) -> ServiceResult<Report> {
        let mission = self.missions.find(mission_id).await?;
        ensure_owner_or_commander(
            mission.owner_id,
            principal,
            "create a report for mission",
            mission.id,
        )
        .map_err(ServiceError::Forbidden)?;

        let incident = self.incidents.find(incident_id).await?;
        if incident.mission_id != mission.id {
            return Err(ServiceError::NotFound(INCIDENT_NOT_FOUND.to_string()));
        }
        let fields = input.validate_new()?;

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (title, content, status, incident_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(&fields.status)
        .bind(incident.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<Report> {
        sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(REPORT_NOT_FOUND.to_string()))
    }

    pub async fn update(&self, id: Uuid, input: ReportInput) -> ServiceResult<Report> {
        let current = self.find(id).await?;
        let fields = input.validate_update(&current)?;

        sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET title = $2, content = $3, status = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(&fields.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(REPORT_NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ServiceError::NotFound(REPORT_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    /// Store the upload, then append its record to the report's files.
    pub async fn upload_file(
        &self,
        store: &dyn ObjectStore,
        report_id: Uuid,
        upload: Upload,
    ) -> ServiceResult<ReportFile> {
        let report = self.find(report_id).await?;
        let key = object_key(report.id, &upload.file_name);

        let url = store.put(&key, &upload.content_type, upload.bytes).await?;
        let file = ReportFile::new(url, upload.content_type);

        sqlx::query("UPDATE reports SET files = files || $2 WHERE id = $1")
            .bind(report.id)
            .bind(Json(vec![file.clone()]))
            .execute(&self.pool)
            .await?;

        tracing::info!("Uploaded {} to report {}", file.file_url, report.id);
        Ok(file)
    }

    pub async fn files(&self, report_id: Uuid) -> ServiceResult<Vec<ReportFile>> {
        Ok(self.find(report_id).await?.files.0)
    }

    pub async fn file(&self, report_id: Uuid, file_id: Uuid) -> ServiceResult<ReportFile> {
        let report = self.find(report_id).await?;
        report
            .file(file_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(FILE_NOT_FOUND.to_string()))
    }

    /// Remove the stored object, then the embedded record.
    pub async fn delete_file(&self, store: &dyn ObjectStore, report_id: Uuid, file_id: Uuid) -> ServiceResult<()> {
        let report = self.find(report_id).await?;
        let file = report
            .file(file_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(FILE_NOT_FOUND.to_string()))?;

        match store.delete(&file.file_url).await {
            Ok(()) => {}
            Err(StorageError::Unmanaged(url)) => {
                tracing::warn!("Not deleting object outside the configured store: {}", url);
            }
            Err(e) => return Err(e.into()),
        }

        // filtered in place so uploads landing concurrently are kept
        sqlx::query(
            r#"
            UPDATE reports
            SET files = COALESCE(
                (SELECT jsonb_agg(f ORDER BY n)
                 FROM jsonb_array_elements(files) WITH ORDINALITY AS e(f, n)
                 WHERE f->>'id' <> $2),
                '[]'::jsonb)
            WHERE id = $1
            "#,
        )
        .bind(report.id)
        .bind(file_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// `reports/<report id>/<random>-<sanitized name>`
pub fn object_key(report_id: Uuid, file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let safe: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let safe = safe.trim_start_matches('.');
    let safe = if safe.is_empty() { "file" } else { safe };
    format!("reports/{}/{}-{}", report_id, Uuid::new_v4().simple(), safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_scoped_and_sanitized() {
        let report_id = Uuid::new_v4();
        let key = object_key(report_id, "../../etc/pass wd.png");
        let prefix = format!("reports/{}/", report_id);
        assert!(key.starts_with(&prefix));
        assert!(key.ends_with("-pass_wd.png"));
        assert!(!key.contains(".."));

        assert!(object_key(report_id, "").ends_with("-file"));
        assert!(object_key(report_id, "...").ends_with("-file"));
    }
}
