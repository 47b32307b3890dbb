use crate::error::AppError;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if !allowed.contains(&value) {
        return Err(AppError::validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: i32) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Present-but-empty on a required field is rejected rather than stored.
pub fn patch_non_empty(field: &str, value: Option<&String>) -> Result<(), AppError> {
    match value {
        Some(v) => require_non_empty(field, v),
        None => Ok(()),
    }
}

pub fn patch_one_of(field: &str, value: Option<&String>, allowed: &[&str]) -> Result<(), AppError> {
    match value {
        Some(v) => require_one_of(field, v, allowed),
        None => Ok(()),
    }
}
