use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_text, required_text, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Pending,
    Resolved,
    Unresolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Pending => "pending",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub reported_at: DateTime<Utc>,
    pub mission_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentFields {
    pub title: String,
    pub description: String,
    pub status: String,
}

impl IncidentInput {
    pub fn validate_new(self) -> Result<IncidentFields, ValidationErrors> {
        self.resolve(None)
    }

    pub fn validate_update(self, current: &Incident) -> Result<IncidentFields, ValidationErrors> {
        self.resolve(Some(current))
    }

    fn resolve(self, current: Option<&Incident>) -> Result<IncidentFields, ValidationErrors> {
        let mut errors = ValidationErrors::new("Incident");
        let title = required_text(&mut errors, "title", self.title, current.map(|i| i.title.as_str()));
        let description = required_text(
            &mut errors,
            "description",
            self.description,
            current.map(|i| i.description.as_str()),
        );
        let status = enum_text::<IncidentStatus>(
            &mut errors,
            "status",
            self.status,
            current.map_or(IncidentStatus::Pending.as_str(), |i| i.status.as_str()),
        );
        errors.into_result(IncidentFields { title, description, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pending_and_requires_text_fields() {
        let ok = IncidentInput {
            title: Some("Fuel leak".to_string()),
            description: Some("Stage two".to_string()),
            status: None,
        };
        assert_eq!(ok.validate_new().unwrap().status, "pending");

        let err = IncidentInput::default().validate_new().unwrap_err();
        assert!(err.message().starts_with("Incident validation failed: "));
        assert_eq!(err.fields().len(), 2);
    }

    #[test]
    fn status_must_be_known() {
        let body = IncidentInput {
            title: Some("t".to_string()),
            description: Some("d".to_string()),
            status: Some("closed".to_string()),
        };
        assert!(body.validate_new().is_err());
    }
}
