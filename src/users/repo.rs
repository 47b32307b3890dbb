use async_trait::async_trait;
use serde::Deserialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::{classify, PgStore, StoreResult};

/// User record in the database. Not `Serialize`: responses go through
/// [`crate::users::dto::PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String, // Argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    pub year: i32,
    pub advisor: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    pub year: i32,
    pub advisor: String,
}

/// Profile fields a user may change on themselves; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub program: Option<String>,
    pub year: Option<i32>,
    pub advisor: Option<String>,
}

/// Lookups never return soft-deleted users.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn exists_by_email_or_username(&self, email: &str, username: &str) -> StoreResult<bool>;
    async fn create(&self, new: &NewUser) -> StoreResult<User>;
    async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> StoreResult<Option<User>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, first_name, last_name,
                   program, year, advisor, created_at, updated_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, first_name, last_name,
                   program, year, advisor, created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn exists_by_email_or_username(&self, email: &str, username: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE (email = $1 OR username = $2) AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, new: &NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, first_name, last_name,
                               program, year, advisor)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, email, username, password_hash, first_name, last_name,
                      program, year, advisor, created_at, updated_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.program)
        .bind(new.year)
        .bind(&new.advisor)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET first_name = COALESCE($2, first_name),
                   last_name  = COALESCE($3, last_name),
                   program    = COALESCE($4, program),
                   year       = COALESCE($5, year),
                   advisor    = COALESCE($6, advisor),
                   updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, email, username, password_hash, first_name, last_name,
                      program, year, advisor, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.program)
        .bind(patch.year)
        .bind(&patch.advisor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
