use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_text, required_text, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Closed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::Closed => "closed",
        }
    }
}

/// File record embedded in a report, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub id: Uuid,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl ReportFile {
    pub fn new(file_url: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_url: file_url.into(),
            file_type: file_type.into(),
            uploaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub reported_at: DateTime<Utc>,
    pub incident_id: Uuid,
    pub files: Json<Vec<ReportFile>>,
}

impl Report {
    pub fn file(&self, file_id: Uuid) -> Option<&ReportFile> {
        self.files.0.iter().find(|f| f.id == file_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFields {
    pub title: String,
    pub content: String,
    pub status: String,
}

impl ReportInput {
    pub fn validate_new(self) -> Result<ReportFields, ValidationErrors> {
        self.resolve(None)
    }

    pub fn validate_update(self, current: &Report) -> Result<ReportFields, ValidationErrors> {
        self.resolve(Some(current))
    }

    fn resolve(self, current: Option<&Report>) -> Result<ReportFields, ValidationErrors> {
        let mut errors = ValidationErrors::new("Report");
        let title = required_text(&mut errors, "title", self.title, current.map(|r| r.title.as_str()));
        let content = required_text(&mut errors, "content", self.content, current.map(|r| r.content.as_str()));
        let status = enum_text::<ReportStatus>(
            &mut errors,
            "status",
            self.status,
            current.map_or(ReportStatus::Open.as_str(), |r| r.status.as_str()),
        );
        errors.into_result(ReportFields { title, content, status })
    }
}
