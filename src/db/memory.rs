//! In-process store backing the test suite. Mirrors the Postgres predicates:
//! owner scoping, soft deletes, and the unique email/username indexes.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult};
use crate::{
    assignments::repo::{Assignment, AssignmentFilter, AssignmentPatch, AssignmentRepo, NewAssignment},
    courses::repo::{Course, CourseFilter, CoursePatch, CourseRepo, NewCourse},
    users::repo::{NewUser, ProfilePatch, User, UserRepo},
};

struct Row<T> {
    value: T,
    deleted: bool,
}

impl<T> Row<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            deleted: false,
        }
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<Row<User>>,
    courses: Vec<Row<Course>>,
    assignments: Vec<Row<Assignment>>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

/// Live row whose `(id, owner)` key matches.
fn owned<T>(
    rows: &mut [Row<T>],
    owner: i64,
    id: i64,
    key: impl Fn(&T) -> (i64, i64),
) -> Option<&mut Row<T>> {
    rows.iter_mut()
        .find(|r| !r.deleted && key(&r.value) == (id, owner))
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.inner.read().await;
        Ok(t.users
            .iter()
            .find(|r| !r.deleted && r.value.email == email)
            .map(|r| r.value.clone()))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let t = self.inner.read().await;
        Ok(t.users
            .iter()
            .find(|r| !r.deleted && r.value.id == id)
            .map(|r| r.value.clone()))
    }

    async fn exists_by_email_or_username(&self, email: &str, username: &str) -> StoreResult<bool> {
        let t = self.inner.read().await;
        Ok(t.users
            .iter()
            .any(|r| !r.deleted && (r.value.email == email || r.value.username == username)))
    }

    async fn create(&self, new: &NewUser) -> StoreResult<User> {
        let mut t = self.inner.write().await;
        // unique indexes cover deleted rows too
        if t.users
            .iter()
            .any(|r| r.value.email == new.email || r.value.username == new.username)
        {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.next_id(),
            email: new.email.clone(),
            username: new.username.clone(),
            password_hash: new.password_hash.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            program: new.program.clone(),
            year: new.year,
            advisor: new.advisor.clone(),
            created_at: now,
            updated_at: now,
        };
        t.users.push(Row::live(user.clone()));
        Ok(user)
    }

    async fn update_profile(&self, id: i64, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        let mut t = self.inner.write().await;
        let Some(row) = t.users.iter_mut().find(|r| !r.deleted && r.value.id == id) else {
            return Ok(None);
        };
        let u = &mut row.value;
        if let Some(v) = &patch.first_name {
            u.first_name = v.clone();
        }
        if let Some(v) = &patch.last_name {
            u.last_name = v.clone();
        }
        if let Some(v) = &patch.program {
            u.program = v.clone();
        }
        if let Some(v) = patch.year {
            u.year = v;
        }
        if let Some(v) = &patch.advisor {
            u.advisor = v.clone();
        }
        u.updated_at = OffsetDateTime::now_utc();
        Ok(Some(u.clone()))
    }
}

#[async_trait]
impl CourseRepo for MemoryStore {
    async fn list(&self, owner: i64, filter: &CourseFilter) -> StoreResult<Vec<Course>> {
        let t = self.inner.read().await;
        let mut out: Vec<Course> = t
            .courses
            .iter()
            .filter(|r| !r.deleted && r.value.user_id == owner)
            .map(|r| &r.value)
            .filter(|c| filter.status.as_ref().map_or(true, |s| &c.status == s))
            .filter(|c| filter.semester.as_ref().map_or(true, |s| &c.semester == s))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.id);
        Ok(out)
    }

    async fn create(&self, owner: i64, new: &NewCourse) -> StoreResult<Course> {
        let mut t = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let course = Course {
            id: t.next_id(),
            user_id: owner,
            course_name: new.course_name.clone(),
            course_code: new.course_code.clone(),
            instructor: new.instructor.clone(),
            credits: new.credits,
            semester: new.semester.clone(),
            grade: String::new(),
            status: new.status.clone(),
            created_at: now,
            updated_at: now,
        };
        t.courses.push(Row::live(course.clone()));
        Ok(course)
    }

    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Course>> {
        let t = self.inner.read().await;
        Ok(t.courses
            .iter()
            .find(|r| !r.deleted && r.value.id == id && r.value.user_id == owner)
            .map(|r| r.value.clone()))
    }

    async fn update(&self, owner: i64, id: i64, patch: &CoursePatch) -> StoreResult<Option<Course>> {
        let mut t = self.inner.write().await;
        let Some(row) = owned(&mut t.courses, owner, id, |c| (c.id, c.user_id)) else {
            return Ok(None);
        };
        let c = &mut row.value;
        if let Some(v) = &patch.course_name {
            c.course_name = v.clone();
        }
        if let Some(v) = &patch.course_code {
            c.course_code = v.clone();
        }
        if let Some(v) = &patch.instructor {
            c.instructor = v.clone();
        }
        if let Some(v) = patch.credits {
            c.credits = v;
        }
        if let Some(v) = &patch.semester {
            c.semester = v.clone();
        }
        if let Some(v) = &patch.grade {
            c.grade = v.clone();
        }
        if let Some(v) = &patch.status {
            c.status = v.clone();
        }
        c.updated_at = OffsetDateTime::now_utc();
        Ok(Some(c.clone()))
    }

    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()> {
        let mut t = self.inner.write().await;
        if let Some(row) = owned(&mut t.courses, owner, id, |c| (c.id, c.user_id)) {
            row.deleted = true;
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepo for MemoryStore {
    async fn list(&self, owner: i64, filter: &AssignmentFilter) -> StoreResult<Vec<Assignment>> {
        let t = self.inner.read().await;
        let mut out: Vec<Assignment> = t
            .assignments
            .iter()
            .filter(|r| !r.deleted && r.value.user_id == owner)
            .map(|r| &r.value)
            .filter(|a| filter.status.as_ref().map_or(true, |s| &a.status == s))
            .filter(|a| filter.priority.as_ref().map_or(true, |p| &a.priority == p))
            .filter(|a| filter.course_id.map_or(true, |cid| a.course_id == Some(cid)))
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.due_date, a.id));
        Ok(out)
    }

    async fn create(&self, owner: i64, new: &NewAssignment) -> StoreResult<Assignment> {
        let mut t = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let assignment = Assignment {
            id: t.next_id(),
            user_id: owner,
            course_id: new.course_id,
            title: new.title.clone(),
            description: new.description.clone(),
            due_date: new.due_date,
            priority: new.priority.clone(),
            status: new.status.clone(),
            estimated_hours: new.estimated_hours,
            actual_hours: 0,
            created_at: now,
            updated_at: now,
        };
        t.assignments.push(Row::live(assignment.clone()));
        Ok(assignment)
    }

    async fn get(&self, owner: i64, id: i64) -> StoreResult<Option<Assignment>> {
        let t = self.inner.read().await;
        Ok(t.assignments
            .iter()
            .find(|r| !r.deleted && r.value.id == id && r.value.user_id == owner)
            .map(|r| r.value.clone()))
    }

    async fn update(
        &self,
        owner: i64,
        id: i64,
        patch: &AssignmentPatch,
    ) -> StoreResult<Option<Assignment>> {
        let mut t = self.inner.write().await;
        let Some(row) = owned(&mut t.assignments, owner, id, |a| (a.id, a.user_id)) else {
            return Ok(None);
        };
        let a = &mut row.value;
        if let Some(v) = patch.course_id {
            a.course_id = v;
        }
        if let Some(v) = &patch.title {
            a.title = v.clone();
        }
        if let Some(v) = &patch.description {
            a.description = v.clone();
        }
        if let Some(v) = patch.due_date {
            a.due_date = v;
        }
        if let Some(v) = &patch.priority {
            a.priority = v.clone();
        }
        if let Some(v) = &patch.status {
            a.status = v.clone();
        }
        if let Some(v) = patch.estimated_hours {
            a.estimated_hours = v;
        }
        if let Some(v) = patch.actual_hours {
            a.actual_hours = v;
        }
        a.updated_at = OffsetDateTime::now_utc();
        Ok(Some(a.clone()))
    }

    async fn delete(&self, owner: i64, id: i64) -> StoreResult<()> {
        let mut t = self.inner.write().await;
        if let Some(row) = owned(&mut t.assignments, owner, id, |a| (a.id, a.user_id)) {
            row.deleted = true;
        }
        Ok(())
    }
}
