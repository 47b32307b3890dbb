use std::collections::HashMap;

use tracing::{info, warn};

use super::{
    dto::{AssignmentQuery, AssignmentView, CreateAssignmentRequest},
    repo::{Assignment, AssignmentFilter, AssignmentPatch, NewAssignment},
};
use crate::{
    api::parse_id,
    courses::repo::{Course, CourseFilter},
    error::AppError,
    state::AppState,
    validation::{patch_non_empty, patch_one_of, require_non_empty, require_non_negative, require_one_of},
};

pub const PRIORITIES: &[&str] = &["high", "medium", "low"];
pub const STATUSES: &[&str] = &["pending", "in_progress", "completed"];
const DEFAULT_PRIORITY: &str = "medium";
const INITIAL_STATUS: &str = "pending";

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

/// A referenced course must be one of the caller's live courses.
async fn check_course_ref(st: &AppState, user_id: i64, course_id: i64) -> Result<(), AppError> {
    if st.courses.get(user_id, course_id).await?.is_none() {
        warn!(user_id, course_id, "assignment references unknown course");
        return Err(AppError::validation(
            "course_id does not refer to one of your courses",
        ));
    }
    Ok(())
}

async fn attach(st: &AppState, user_id: i64, assignment: Assignment) -> Result<AssignmentView, AppError> {
    let course = match assignment.course_id {
        Some(cid) => st.courses.get(user_id, cid).await?,
        None => None,
    };
    Ok(AssignmentView { assignment, course })
}

pub async fn list(
    st: &AppState,
    user_id: i64,
    query: AssignmentQuery,
) -> Result<Vec<AssignmentView>, AppError> {
    let course_id = match non_empty(query.course_id) {
        Some(raw) => Some(parse_id(&raw, "course")?),
        None => None,
    };
    let filter = AssignmentFilter {
        status: non_empty(query.status),
        priority: non_empty(query.priority),
        course_id,
    };

    let assignments = st.assignments.list(user_id, &filter).await?;
    // one course lookup for the whole page
    let courses: HashMap<i64, Course> = st
        .courses
        .list(user_id, &CourseFilter::default())
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(assignments
        .into_iter()
        .map(|assignment| {
            let course = assignment
                .course_id
                .and_then(|cid| courses.get(&cid).cloned());
            AssignmentView { assignment, course }
        })
        .collect())
}

pub async fn create(
    st: &AppState,
    user_id: i64,
    req: CreateAssignmentRequest,
) -> Result<AssignmentView, AppError> {
    require_non_empty("title", &req.title)?;
    require_non_negative("estimated_hours", req.estimated_hours)?;
    let priority = if req.priority.trim().is_empty() {
        DEFAULT_PRIORITY.to_string()
    } else {
        req.priority
    };
    require_one_of("priority", &priority, PRIORITIES)?;
    if let Some(cid) = req.course_id {
        check_course_ref(st, user_id, cid).await?;
    }

    let assignment = st
        .assignments
        .create(
            user_id,
            &NewAssignment {
                course_id: req.course_id,
                title: req.title,
                description: req.description,
                due_date: req.due_date,
                priority,
                status: INITIAL_STATUS.to_string(),
                estimated_hours: req.estimated_hours,
            },
        )
        .await?;
    info!(user_id, assignment_id = assignment.id, "assignment created");
    attach(st, user_id, assignment).await
}

pub async fn get(st: &AppState, user_id: i64, id: i64) -> Result<AssignmentView, AppError> {
    let assignment = st
        .assignments
        .get(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    attach(st, user_id, assignment).await
}

pub async fn update(
    st: &AppState,
    user_id: i64,
    id: i64,
    patch: AssignmentPatch,
) -> Result<AssignmentView, AppError> {
    patch_non_empty("title", patch.title.as_ref())?;
    patch_one_of("priority", patch.priority.as_ref(), PRIORITIES)?;
    patch_one_of("status", patch.status.as_ref(), STATUSES)?;
    for (field, hours) in [
        ("estimated_hours", patch.estimated_hours),
        ("actual_hours", patch.actual_hours),
    ] {
        if let Some(h) = hours {
            require_non_negative(field, h)?;
        }
    }

    st.assignments
        .get(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    if let Some(Some(cid)) = patch.course_id {
        check_course_ref(st, user_id, cid).await?;
    }

    let assignment = st
        .assignments
        .update(user_id, id, &patch)
        .await?
        .ok_or(AppError::NotFound("Assignment"))?;
    info!(user_id, assignment_id = id, "assignment updated");
    attach(st, user_id, assignment).await
}

pub async fn update_status(
    st: &AppState,
    user_id: i64,
    id: i64,
    status: String,
) -> Result<AssignmentView, AppError> {
    require_one_of("status", &status, STATUSES)?;
    let patch = AssignmentPatch {
        status: Some(status),
        ..Default::default()
    };
    update(st, user_id, id, patch).await
}

pub async fn delete(st: &AppState, user_id: i64, id: i64) -> Result<(), AppError> {
    st.assignments.delete(user_id, id).await?;
    info!(user_id, assignment_id = id, "assignment deleted");
    Ok(())
}
