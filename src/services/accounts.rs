//! Self-service account flows behind `/api/v1/auth`.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::email::{EmailSender, OutgoingEmail};
use super::users::{self, UserService};
use super::{ServiceError, ServiceResult};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::reset::{self, ResetToken};
use crate::database::models::user::check_password;
use crate::database::models::{User, UserInput, ValidationErrors};
use crate::database::Database;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub struct AccountService {
    pool: PgPool,
    users: UserService,
}

impl AccountService {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            users: UserService::new(db),
        }
    }

    pub async fn register(&self, input: UserInput) -> ServiceResult<User> {
        let fields = input.validate_new()?;
        users::insert(&self.pool, &fields).await
    }

    pub async fn login(&self, input: LoginInput) -> ServiceResult<User> {
        let (email, password) = match (input.email, input.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (email, password),
            _ => {
                return Err(ServiceError::BadRequest(
                    "Please provide an email and password".to_string(),
                ))
            }
        };

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&password, &user.password) {
            tracing::debug!("Password mismatch for user {}", user.id);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        Ok(user)
    }

    /// The user a verified token refers to, if it still exists.
    pub async fn principal_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Store a reset digest and email the raw token. If delivery fails the
    /// reset fields are cleared again before the error is returned.
    pub async fn forgot_password(
        &self,
        mailer: &dyn EmailSender,
        email: Option<String>,
        reset_base_url: &str,
        valid_minutes: i64,
    ) -> ServiceResult<()> {
        let user = match email {
            Some(email) => self.users.find_by_email(&email).await?,
            None => None,
        }
        .ok_or_else(|| ServiceError::NotFound("There is no user with that email".to_string()))?;

        let reset = ResetToken::generate(valid_minutes);
        sqlx::query("UPDATE users SET reset_password_token = $2, reset_password_expire = $3 WHERE id = $1")
            .bind(user.id)
            .bind(&reset.digest)
            .bind(reset.expires_at)
            .execute(&self.pool)
            .await?;

        let reset_url = format!("{}/{}", reset_base_url.trim_end_matches('/'), reset.token);
        if let Err(e) = mailer.send(OutgoingEmail::password_reset(&user.email, &reset_url)).await {
            sqlx::query("UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL WHERE id = $1")
                .bind(user.id)
                .execute(&self.pool)
                .await?;
            return Err(e.into());
        }

        tracing::info!("Password reset requested for user {}", user.id);
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: Option<String>) -> ServiceResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE reset_password_token = $1 AND reset_password_expire > $2",
        )
        .bind(reset::digest(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("Invalid token".to_string()))?;

        let password = validated_password(password, "password")?;
        let hashed = hash_password(&password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password = $2, reset_password_token = NULL, reset_password_expire = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(hashed)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_details(&self, user: &User, input: DetailsInput) -> ServiceResult<User> {
        let body = UserInput {
            name: input.name,
            email: input.email,
            password: None,
            role: None,
        };
        self.users.update(user.id, body).await
    }

    pub async fn update_password(&self, user: &User, input: PasswordChangeInput) -> ServiceResult<User> {
        let current = input.current_password.unwrap_or_default();
        if !verify_password(&current, &user.password) {
            return Err(ServiceError::Unauthorized("Password is incorrect".to_string()));
        }

        let password = validated_password(input.new_password, "newPassword")?;
        let hashed = hash_password(&password)?;

        let user = sqlx::query_as::<_, User>("UPDATE users SET password = $2 WHERE id = $1 RETURNING *")
            .bind(user.id)
            .bind(hashed)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}

fn validated_password(password: Option<String>, path: &str) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new("User");
    let password = password.unwrap_or_default();
    if password.is_empty() {
        errors.required(path);
    } else {
        check_password(&mut errors, path, &password);
    }
    errors.into_result(password)
}
