//! Role-based authorization checks, called explicitly at the top of
//! protected handlers.

use uuid::Uuid;

use super::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN: &str = "admin";
pub const USER: &str = "user";

/// Deny with 403 unless the user exists and holds at least one of the
/// required role slugs.
pub async fn require_role(
    state: &AppState,
    user_id: Uuid,
    required: &[&str],
    error_message: &str,
) -> Result<(), ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?;
    if user.is_none() {
        return Err(ApiError::Forbidden(error_message.to_string()));
    }

    let slugs = User::role_slugs(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?;
    if slugs.iter().any(|slug| required.contains(&slug.as_str())) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(error_message.to_string()))
    }
}
