pub mod incident;
pub mod mission;
pub mod report;
pub mod user;

pub use incident::{Incident, IncidentFields, IncidentInput, IncidentStatus};
pub use mission::{slugify, Mission, MissionFields, MissionInput, MissionStatus};
pub use report::{Report, ReportFields, ReportFile, ReportInput, ReportStatus};
pub use user::{Role, User, UserFields, UserInput};

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Field-level validation failures for one entity, reported mongoose style:
/// `Mission validation failed: name: Path `name` is required.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    entity: &'static str,
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new(entity: &'static str) -> Self {
        Self { entity, fields: BTreeMap::new() }
    }

    pub fn add(&mut self, path: &str, message: impl Into<String>) {
        self.fields.entry(path.to_string()).or_insert_with(|| message.into());
    }

    pub fn required(&mut self, path: &str) {
        self.add(path, format!("Path `{}` is required.", path));
    }

    pub fn invalid_enum(&mut self, path: &str, value: &str) {
        self.add(path, format!("`{}` is not a valid enum value for path `{}`.", value, path));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn message(&self) -> String {
        let details = self
            .fields
            .iter()
            .map(|(path, msg)| format!("{}: {}", path, msg))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} validation failed: {}", self.entity, details)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationErrors {}

/// Resolve a required text field: the incoming value if present, else the current one.
/// Blank strings count as missing.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    path: &str,
    incoming: Option<String>,
    current: Option<&str>,
) -> String {
    let value = incoming.or_else(|| current.map(str::to_string)).unwrap_or_default();
    if value.trim().is_empty() {
        errors.required(path);
    }
    value
}

/// Resolve an enum-valued text field against its serde representation.
pub(crate) fn enum_text<T: DeserializeOwned>(
    errors: &mut ValidationErrors,
    path: &str,
    incoming: Option<String>,
    current: &str,
) -> String {
    match incoming {
        Some(value) => {
            if parse_enum::<T>(&value).is_none() {
                errors.invalid_enum(path, &value);
            }
            value
        }
        None => current.to_string(),
    }
}

pub fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(Value::String(value.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_every_failed_path() {
        let mut errors = ValidationErrors::new("Mission");
        errors.required("name");
        errors.invalid_enum("status", "done");
        assert_eq!(
            errors.message(),
            "Mission validation failed: name: Path `name` is required., \
             status: `done` is not a valid enum value for path `status`."
        );
    }

    #[test]
    fn first_message_per_path_wins() {
        let mut errors = ValidationErrors::new("User");
        errors.required("email");
        errors.add("email", "Please add a valid email");
        assert_eq!(errors.fields()["email"], "Path `email` is required.");
        assert!(errors.into_result(()).is_err());
    }
}
