use serde::{Deserialize, Serialize};

use super::repo::Course;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_name: String,
    pub course_code: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub credits: i32,
    pub semester: String,
    #[serde(default)]
    pub status: String, // empty -> "enrolled"
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
}
