// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (authenticated, role-gated mutations) → Elevated (commander only)
pub mod elevated;
pub mod protected;
pub mod public;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, RESOURCE_NOT_FOUND};

/// `/api/missions/:missionId/incidents/:incidentId/...`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPath {
    pub mission_id: String,
    pub incident_id: String,
}

/// `.../reports/:reportId[/files/:fileId]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPath {
    pub report_id: String,
    pub file_id: Option<String>,
}

impl ReportPath {
    pub fn report(&self) -> Result<Uuid, ApiError> {
        parse_id(&self.report_id)
    }

    pub fn file(&self) -> Result<Uuid, ApiError> {
        parse_id(self.file_id.as_deref().unwrap_or_default())
    }
}

/// Parse a path identifier. A malformed id is treated like a missing record.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!("Malformed id in path: {}", raw);
        ApiError::not_found(RESOURCE_NOT_FOUND)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), RESOURCE_NOT_FOUND);

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
