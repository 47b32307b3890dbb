use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Assignment;
use crate::courses::repo::Course;

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub course_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub estimated_hours: i32,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Raw query string; `course_id` is parsed by the service so a bad value
/// reads as a validation error rather than a generic query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub course_id: Option<String>,
}

/// An assignment with its course attached when the course still resolves.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub assignment: AssignmentView,
}

#[derive(Debug, Serialize)]
pub struct AssignmentListResponse {
    pub assignments: Vec<AssignmentView>,
}
