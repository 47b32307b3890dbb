use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::{PgStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: Option<i64>,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub priority: String,
    pub status: String,
    pub estimated_hours: i32,
    pub actual_hours: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub due_date: OffsetDateTime,
    pub priority: String,
    pub status: String,
    pub estimated_hours: i32,
}

/// `course_id` distinguishes "absent" (`None`) from an explicit `null`
/// (`Some(None)`), which detaches the assignment from its course.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub course_id: Option<Option<i64>>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub course_id: Option<i64>,
}

/// Owner-scoped like [`crate::courses::repo::CourseRepo`]; lists come back
/// ordered by due date, then id.
#[async_trait]
pub trait AssignmentRepo: Send + Sync {
    async fn list(&self, owner: i64, filter: &AssignmentFilter) -> StoreResult<Vec<Assignment>>;
    async fn create(&self, owner: i64, new: &NewAssignment) -> StoreResult<Assignment>;
    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Assignment>>;
    async fn update(
        &self,
        owner: i64,
        id: i64,
        patch: &AssignmentPatch,
    ) -> StoreResult<Option<Assignment>>;
    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()>;
}

#[async_trait]
impl AssignmentRepo for PgStore {
    async fn list(&self, owner: i64, filter: &AssignmentFilter) -> StoreResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, user_id, course_id, title, description, due_date, priority,
                   status, estimated_hours, actual_hours, created_at, updated_at
            FROM assignments
            WHERE user_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR priority = $3)
              AND ($4::bigint IS NULL OR course_id = $4)
            ORDER BY due_date ASC, id ASC
            "#,
        )
        .bind(owner)
        .bind(&filter.status)
        .bind(&filter.priority)
        .bind(filter.course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, owner: i64, new: &NewAssignment) -> StoreResult<Assignment> {
        let row = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (user_id, course_id, title, description, due_date,
                                     priority, status, estimated_hours)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, course_id, title, description, due_date, priority,
                      status, estimated_hours, actual_hours, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(new.course_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.due_date)
        .bind(&new.priority)
        .bind(&new.status)
        .bind(new.estimated_hours)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT id, user_id, course_id, title, description, due_date, priority,
                   status, estimated_hours, actual_hours, created_at, updated_at
            FROM assignments
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner: i64,
        id: i64,
        patch: &AssignmentPatch,
    ) -> StoreResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
               SET course_id       = CASE WHEN $3 THEN $4::bigint ELSE course_id END,
                   title           = COALESCE($5, title),
                   description     = COALESCE($6, description),
                   due_date        = COALESCE($7, due_date),
                   priority        = COALESCE($8, priority),
                   status          = COALESCE($9, status),
                   estimated_hours = COALESCE($10, estimated_hours),
                   actual_hours    = COALESCE($11, actual_hours),
                   updated_at      = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, course_id, title, description, due_date, priority,
                      status, estimated_hours, actual_hours, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.course_id.is_some())
        .bind(patch.course_id.flatten())
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.due_date)
        .bind(&patch.priority)
        .bind(&patch.status)
        .bind(patch.estimated_hours)
        .bind(patch.actual_hours)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE assignments
               SET deleted_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
