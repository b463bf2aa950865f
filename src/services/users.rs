use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::password::hash_password;
use crate::database::models::{User, UserFields, UserInput};
use crate::database::Database;

pub const USER_NOT_FOUND: &str = "User not found";

/// User administration (commander only at the route level).
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    pub async fn find(&self, id: Uuid) -> ServiceResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(USER_NOT_FOUND.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, input: UserInput) -> ServiceResult<User> {
        let fields = input.validate_new()?;
        insert(&self.pool, &fields).await
    }

    pub async fn update(&self, id: Uuid, input: UserInput) -> ServiceResult<User> {
        let current = self.find(id).await?;
        let fields = input.validate_update(&current)?;

        sqlx::query_as::<_, User>(
            "UPDATE users SET name = $2, email = $3, role = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(USER_NOT_FOUND.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ServiceError::NotFound(USER_NOT_FOUND.to_string()));
        }
        Ok(())
    }
}

/// Hash the password and insert. Shared by registration, admin create and the seeder.
pub async fn insert(pool: &PgPool, fields: &UserFields) -> ServiceResult<User> {
    let plaintext = fields
        .password
        .as_deref()
        .ok_or_else(|| ServiceError::BadRequest("Password is required".to_string()))?;
    let hashed = hash_password(plaintext)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, role, password)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.role)
    .bind(hashed)
    .fetch_one(pool)
    .await?;

    tracing::info!("Created user {} with role {}", user.id, user.role);
    Ok(user)
}
