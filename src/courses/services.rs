use tracing::info;

use super::{
    dto::CreateCourseRequest,
    repo::{Course, CourseFilter, CoursePatch, NewCourse},
};
use crate::{
    error::AppError,
    state::AppState,
    validation::{patch_non_empty, patch_one_of, require_non_empty, require_non_negative, require_one_of},
};

pub const COURSE_STATUSES: &[&str] = &["enrolled", "completed", "dropped"];
const DEFAULT_STATUS: &str = "enrolled";

pub async fn list(
    st: &AppState,
    user_id: i64,
    mut filter: CourseFilter,
) -> Result<Vec<Course>, AppError> {
    // `?status=` means "no filter"
    filter.status = filter.status.filter(|s| !s.is_empty());
    filter.semester = filter.semester.filter(|s| !s.is_empty());
    Ok(st.courses.list(user_id, &filter).await?)
}

pub async fn create(
    st: &AppState,
    user_id: i64,
    req: CreateCourseRequest,
) -> Result<Course, AppError> {
    require_non_empty("course_name", &req.course_name)?;
    require_non_empty("course_code", &req.course_code)?;
    require_non_empty("semester", &req.semester)?;
    require_non_negative("credits", req.credits)?;

    let status = if req.status.trim().is_empty() {
        DEFAULT_STATUS.to_string()
    } else {
        req.status
    };
    require_one_of("status", &status, COURSE_STATUSES)?;

    let course = st
        .courses
        .create(
            user_id,
            &NewCourse {
                course_name: req.course_name,
                course_code: req.course_code,
                instructor: req.instructor,
                credits: req.credits,
                semester: req.semester,
                status,
            },
        )
        .await?;
    info!(user_id, course_id = course.id, "course created");
    Ok(course)
}

/// Absent and foreign ids are indistinguishable.
pub async fn get(st: &AppState, user_id: i64, course_id: i64) -> Result<Course, AppError> {
    st.courses
        .get(user_id, course_id)
        .await?
        .ok_or(AppError::NotFound("Course"))
}

pub async fn update(
    st: &AppState,
    user_id: i64,
    course_id: i64,
    patch: CoursePatch,
) -> Result<Course, AppError> {
    patch_non_empty("course_name", patch.course_name.as_ref())?;
    patch_non_empty("course_code", patch.course_code.as_ref())?;
    patch_non_empty("semester", patch.semester.as_ref())?;
    patch_one_of("status", patch.status.as_ref(), COURSE_STATUSES)?;
    if let Some(credits) = patch.credits {
        require_non_negative("credits", credits)?;
    }

    get(st, user_id, course_id).await?;

    // a concurrent delete between the check and the write still reads as not found
    let course = st
        .courses
        .update(user_id, course_id, &patch)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    info!(user_id, course_id, "course updated");
    Ok(course)
}

pub async fn delete(st: &AppState, user_id: i64, course_id: i64) -> Result<(), AppError> {
    st.courses.delete(user_id, course_id).await?;
    info!(user_id, course_id, "course deleted");
    Ok(())
}
