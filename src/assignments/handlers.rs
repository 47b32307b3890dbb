use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AssignmentListResponse, AssignmentQuery, AssignmentResponse, CreateAssignmentRequest,
        StatusUpdateRequest,
    },
    repo::AssignmentPatch,
    services,
};
use crate::{
    api::{parse_id, ApiJson, ApiQuery, MessageResponse},
    auth::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .route("/assignments/:id/status", patch(update_status))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn list_assignments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<AssignmentQuery>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let assignments = services::list(&state, user.user_id, query).await?;
    Ok(Json(AssignmentListResponse { assignments }))
}

#[instrument(skip(state, user, payload), fields(user_id = user.user_id))]
pub async fn create_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), AppError> {
    let assignment = services::create(&state, user.user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse {
            message: Some("Assignment created successfully"),
            assignment,
        }),
    ))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn get_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let id = parse_id(&id, "assignment")?;
    let assignment = services::get(&state, user.user_id, id).await?;
    Ok(Json(AssignmentResponse {
        message: None,
        assignment,
    }))
}

#[instrument(skip(state, user, changes), fields(user_id = user.user_id))]
pub async fn update_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<AssignmentPatch>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let id = parse_id(&id, "assignment")?;
    let assignment = services::update(&state, user.user_id, id, changes).await?;
    Ok(Json(AssignmentResponse {
        message: Some("Assignment updated successfully"),
        assignment,
    }))
}

#[instrument(skip(state, user, payload), fields(user_id = user.user_id))]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<StatusUpdateRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let id = parse_id(&id, "assignment")?;
    let assignment = services::update_status(&state, user.user_id, id, payload.status).await?;
    Ok(Json(AssignmentResponse {
        message: Some("Assignment status updated successfully"),
        assignment,
    }))
}

#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "assignment")?;
    services::delete(&state, user.user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Assignment deleted successfully",
    }))
}
