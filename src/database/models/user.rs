use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_text, parse_enum, required_text, ValidationErrors};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Pilot,
    Commander,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Pilot => "pilot",
            Role::Commander => "commander",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored principal. Credential and reset fields never serialize.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Role column as an enum. Unknown values fall back to the least privileged role.
    pub fn role(&self) -> Role {
        parse_enum(&self.role).unwrap_or(Role::User)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Validated user columns. `password` is plaintext until the service hashes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password: Option<String>,
}

impl UserInput {
    pub fn validate_new(mut self) -> Result<UserFields, ValidationErrors> {
        let mut errors = ValidationErrors::new("User");
        let password = match self.password.take() {
            Some(p) if !p.is_empty() => {
                check_password(&mut errors, "password", &p);
                Some(p)
            }
            _ => {
                errors.required("password");
                None
            }
        };
        let fields = self.resolve_profile(&mut errors, None, password);
        errors.into_result(fields)
    }

    /// Profile changes only; passwords change through the dedicated auth flows.
    pub fn validate_update(self, current: &User) -> Result<UserFields, ValidationErrors> {
        let mut errors = ValidationErrors::new("User");
        let fields = self.resolve_profile(&mut errors, Some(current), None);
        errors.into_result(fields)
    }

    fn resolve_profile(
        self,
        errors: &mut ValidationErrors,
        current: Option<&User>,
        password: Option<String>,
    ) -> UserFields {
        let name = required_text(errors, "name", self.name, current.map(|u| u.name.as_str()));
        let email = required_text(errors, "email", self.email, current.map(|u| u.email.as_str()));
        if !email.trim().is_empty() && !is_valid_email(&email) {
            errors.add("email", "Please add a valid email");
        }
        let role = enum_text::<Role>(
            errors,
            "role",
            self.role,
            current.map_or(Role::User.as_str(), |u| u.role.as_str()),
        );
        UserFields { name, email: email.trim().to_lowercase(), role, password }
    }
}

pub fn check_password(errors: &mut ValidationErrors, path: &str, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            path,
            format!(
                "Path `{}` is shorter than the minimum allowed length ({}).",
                path, MIN_PASSWORD_LENGTH
            ),
        );
    }
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(email: &str, password: &str) -> UserInput {
        UserInput {
            name: Some("Ripley".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: None,
        }
    }

    #[test]
    fn defaults_to_user_role_and_normalizes_email() {
        let fields = body("Ripley@Nostromo.io", "password123").validate_new().unwrap();
        assert_eq!(fields.role, "user");
        assert_eq!(fields.email, "ripley@nostromo.io");
        assert_eq!(fields.password.as_deref(), Some("password123"));
    }

    #[test]
    fn rejects_bad_email_and_short_password() {
        let err = body("not-an-email", "123").validate_new().unwrap_err();
        assert_eq!(err.fields()["email"], "Please add a valid email");
        assert!(err.fields()["password"].contains("minimum allowed length (6)"));
    }

    #[test]
    fn missing_password_is_required() {
        let mut input = body("a@b.co", "");
        input.password = None;
        let err = input.validate_new().unwrap_err();
        assert_eq!(err.fields()["password"], "Path `password` is required.");
        assert!(err.fields().get("email").is_none());

        let err = body("a@b.co", "").validate_new().unwrap_err();
        assert_eq!(err.fields()["password"], "Path `password` is required.");
    }

    #[test]
    fn password_length_boundary() {
        let fields = body("a@b.co", "123456").validate_new().unwrap();
        assert_eq!(fields.password.as_deref(), Some("123456"));

        let err = body("a@b.co", "12345").validate_new().unwrap_err();
        assert!(err.fields()["password"].contains("minimum allowed length (6)"));
        assert!(err.fields().get("name").is_none());
    }

    #[test]
    fn rejects_unknown_role() {
        let mut input = body("a@b.co", "password123");
        input.role = Some("admiral".to_string());
        assert!(input.validate_new().is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
    }

    #[test]
    fn credential_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "n".to_string(),
            email: "e@x.io".to_string(),
            role: "pilot".to_string(),
            password: "$argon2id$secret".to_string(),
            reset_password_token: Some("digest".to_string()),
            reset_password_expire: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("reset_password_token").is_none());
        assert_eq!(user.role(), Role::Pilot);
    }
}
