use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::{PgStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub user_id: i64,
    pub course_name: String,
    pub course_code: String,
    pub instructor: String,
    pub credits: i32,
    pub semester: String,
    pub grade: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Insert payload; defaults are already applied and the owner is passed separately.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_name: String,
    pub course_code: String,
    pub instructor: String,
    pub credits: i32,
    pub semester: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    pub instructor: Option<String>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
    pub grade: Option<String>,
    pub status: Option<String>,
}

/// Equality filters, ANDed together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    pub status: Option<String>,
    pub semester: Option<String>,
}

/// Every method is scoped to `owner`; rows of other users and soft-deleted
/// rows behave as if they did not exist.
#[async_trait]
pub trait CourseRepo: Send + Sync {
    async fn list(&self, owner: i64, filter: &CourseFilter) -> StoreResult<Vec<Course>>;
    async fn create(&self, owner: i64, new: &NewCourse) -> StoreResult<Course>;
    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Course>>;
    async fn update(&self, owner: i64, id: i64, patch: &CoursePatch) -> StoreResult<Option<Course>>;
    /// Soft delete. Matching zero rows is not an error.
    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()>;
}

#[async_trait]
impl CourseRepo for PgStore {
    async fn list(&self, owner: i64, filter: &CourseFilter) -> StoreResult<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, user_id, course_name, course_code, instructor, credits,
                   semester, grade, status, created_at, updated_at
            FROM courses
            WHERE user_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR semester = $3)
            ORDER BY id ASC
            "#,
        )
        .bind(owner)
        .bind(&filter.status)
        .bind(&filter.semester)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, owner: i64, new: &NewCourse) -> StoreResult<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (user_id, course_name, course_code, instructor,
                                 credits, semester, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, course_name, course_code, instructor, credits,
                      semester, grade, status, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(&new.course_name)
        .bind(&new.course_code)
        .bind(&new.instructor)
        .bind(new.credits)
        .bind(&new.semester)
        .bind(&new.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, user_id, course_name, course_code, instructor, credits,
                   semester, grade, status, created_at, updated_at
            FROM courses
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn update(&self, owner: i64, id: i64, patch: &CoursePatch) -> StoreResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
               SET course_name = COALESCE($3, course_name),
                   course_code = COALESCE($4, course_code),
                   instructor  = COALESCE($5, instructor),
                   credits     = COALESCE($6, credits),
                   semester    = COALESCE($7, semester),
                   grade       = COALESCE($8, grade),
                   status      = COALESCE($9, status),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING id, user_id, course_name, course_code, instructor, credits,
                      semester, grade, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.course_name)
        .bind(&patch.course_code)
        .bind(&patch.instructor)
        .bind(patch.credits)
        .bind(&patch.semester)
        .bind(&patch.grade)
        .bind(&patch.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE courses
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
