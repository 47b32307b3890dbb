use tracing::info;

use super::repo::{ProfilePatch, User};
use crate::{
    error::AppError,
    state::AppState,
    validation::{patch_non_empty, require_non_negative},
};

pub async fn profile(st: &AppState, user_id: i64) -> Result<User, AppError> {
    st.users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Absent fields stay as they are. Names may not be blanked; `program` and
/// `advisor` may be set to empty.
pub async fn update_profile(
    st: &AppState,
    user_id: i64,
    patch: ProfilePatch,
) -> Result<User, AppError> {
    patch_non_empty("first_name", patch.first_name.as_ref())?;
    patch_non_empty("last_name", patch.last_name.as_ref())?;
    if let Some(year) = patch.year {
        require_non_negative("year", year)?;
    }

    profile(st, user_id).await?;

    let user = st
        .users
        .update_profile(user_id, &patch)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id, "profile updated");
    Ok(user)
}
