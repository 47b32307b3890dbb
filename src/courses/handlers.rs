use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CourseListResponse, CourseResponse, CreateCourseRequest},
    repo::{CourseFilter, CoursePatch},
    services,
};
use crate::{
    api::{parse_id, ApiJson, ApiQuery, MessageResponse},
    auth::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn list_courses(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<CourseFilter>,
) -> Result<Json<CourseListResponse>, AppError> {
    let courses = services::list(&state, user.user_id, filter).await?;
    Ok(Json(CourseListResponse { courses }))
}

#[instrument(skip(state, user, payload), fields(user_id = user.user_id))]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let course = services::create(&state, user.user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: Some("Course created successfully"),
            course,
        }),
    ))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn get_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    let id = parse_id(&id, "course")?;
    let course = services::get(&state, user.user_id, id).await?;
    Ok(Json(CourseResponse {
        message: None,
        course,
    }))
}

#[instrument(skip(state, user, patch), fields(user_id = user.user_id))]
pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CoursePatch>,
) -> Result<Json<CourseResponse>, AppError> {
    let id = parse_id(&id, "course")?;
    let course = services::update(&state, user.user_id, id, patch).await?;
    Ok(Json(CourseResponse {
        message: Some("Course updated successfully"),
        course,
    }))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "course")?;
    services::delete(&state, user.user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Course deleted successfully",
    }))
}
