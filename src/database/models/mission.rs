use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_text, required_text, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Pending => "pending",
            MissionStatus::InProgress => "in progress",
            MissionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mission {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: String,
    pub commander: String,
    pub slug: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request body for mission create/update. Every field is optional so that
/// missing fields can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MissionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub commander: Option<String>,
}

/// Validated column values, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionFields {
    pub name: String,
    pub description: String,
    pub status: String,
    pub commander: String,
    pub slug: String,
}

impl MissionInput {
    pub fn validate_new(self) -> Result<MissionFields, ValidationErrors> {
        self.resolve(None)
    }

    /// Merge onto an existing mission. The slug follows the (possibly new) name.
    pub fn validate_update(self, current: &Mission) -> Result<MissionFields, ValidationErrors> {
        self.resolve(Some(current))
    }

    fn resolve(self, current: Option<&Mission>) -> Result<MissionFields, ValidationErrors> {
        let mut errors = ValidationErrors::new("Mission");
        let name = required_text(&mut errors, "name", self.name, current.map(|m| m.name.as_str()));
        let description = required_text(
            &mut errors,
            "description",
            self.description,
            current.map(|m| m.description.as_str()),
        );
        let status = enum_text::<MissionStatus>(
            &mut errors,
            "status",
            self.status,
            current.map_or(MissionStatus::Pending.as_str(), |m| m.status.as_str()),
        );
        let commander = required_text(
            &mut errors,
            "commander",
            self.commander,
            current.map(|m| m.commander.as_str()),
        );
        let slug = slugify(&name);

        errors.into_result(MissionFields { name, description, status, commander, slug })
    }
}

/// Lowercased, hyphen-separated form of a name: `"Test Slug Mission"` → `"test-slug-mission"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
