use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::auth::extractors::AuthUser;
use crate::auth::roles::{self, ADMIN};
use crate::error::ApiError;
use crate::state::AppState;

use super::services::handle_image_upload;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload_image", post(upload_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// Multipart upload with a single `image` field.
#[instrument(skip(state, auth, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    roles::require_role(&state, auth.user_id, &[ADMIN], "Admin access required").await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::BadRequest("No selected file".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let stored = handle_image_upload(&state.config.upload, &original_name, data).await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "File uploaded successfully",
                "image_url": stored.url
            })),
        ));
    }

    Err(ApiError::BadRequest("Image is required.".into()))
}
