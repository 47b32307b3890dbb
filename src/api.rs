//! Request/response plumbing shared by all resource handlers.

use axum::extract::{FromRequest, FromRequestParts, Query};
use serde::Serialize;

use crate::error::AppError;

/// `Json` whose rejections render as `{"error": ..}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` with the same rejection shape as [`ApiJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Parses a numeric path id, reporting `Invalid <entity> ID` on failure.
pub fn parse_id(raw: &str, entity: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation(format!("Invalid {entity} ID")))
}
