use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::auth::roles::{self, ADMIN};
use crate::error::ApiError;
use crate::pagination::PageQuery;
use crate::state::AppState;

use super::dto::{TipPayload, TipResponse, TipUpdatePayload, TipsPage};
use super::repo::Tip;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/tips", get(list_tips))
        .route("/tips/:tip_id", get(show_tip))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/tips", get(admin_list_tips))
        .route("/tips", post(create_tip))
        .route("/tips/:tip_id", put(update_tip))
        .route("/tips/:tip_id", delete(delete_tip))
}

#[instrument(skip(state))]
pub async fn list_tips(
    State(state): State<AppState>,
    Query(p): Query<PageQuery>,
) -> Result<Json<TipsPage>, ApiError> {
    p.validate()?;
    let tips = Tip::list_active(&state.db, p.limit as i64, p.offset()).await?;
    let total_items = Tip::count_active(&state.db).await?;
    Ok(Json(TipsPage {
        page: p.page,
        total_pages: p.total_pages(total_items),
        total_items,
        limit: p.limit,
        data: tips.into_iter().map(TipResponse::from).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn show_tip(
    State(state): State<AppState>,
    Path(tip_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let tip = Tip::find_by_id(&state.db, tip_id)
        .await?
        .filter(|tip| tip.is_active)
        .ok_or_else(|| ApiError::NotFound("No tips found".into()))?;
    Ok(Json(json!({ "data": [TipResponse::from(tip)] })))
}

#[instrument(skip(state, auth))]
pub async fn admin_list_tips(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(p): Query<PageQuery>,
) -> Result<Json<TipsPage>, ApiError> {
    roles::require_role(&state, auth.user_id, &[ADMIN], "Admin access required").await?;
    p.validate()?;
    let tips = Tip::list_all(&state.db, p.limit as i64, p.offset()).await?;
    let total_items = Tip::count_all(&state.db).await?;
    Ok(Json(TipsPage {
        page: p.page,
        total_pages: p.total_pages(total_items),
        total_items,
        limit: p.limit,
        data: tips.into_iter().map(TipResponse::from).collect(),
    }))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_tip(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<TipPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    roles::require_role(&state, auth.user_id, &[ADMIN], "Admin access required").await?;
    payload.validate()?;

    let tip = Tip::create(
        &state.db,
        payload.title.trim(),
        payload.description.trim(),
        payload.category.as_deref().map(str::trim),
        &payload.image_url,
    )
    .await?;

    info!(tip_id = %tip.id, "tip created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Crypto tip created successfully", "tip": tip.id })),
    ))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_tip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tip_id): Path<Uuid>,
    Json(payload): Json<TipUpdatePayload>,
) -> Result<Json<Value>, ApiError> {
    roles::require_role(&state, auth.user_id, &[ADMIN], "Admin access required").await?;
    payload.validate()?;

    let tip = Tip::update(
        &state.db,
        tip_id,
        payload.title.as_deref().map(str::trim),
        payload.description.as_deref().map(str::trim),
        payload.category.as_deref().map(str::trim),
        payload.image_url.as_deref(),
        payload.is_active,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("No tips found".into()))?;

    info!(tip_id = %tip.id, "tip updated");
    Ok(Json(json!({
        "message": "Crypto tip updated successfully",
        "tip": tip.id
    })))
}

#[instrument(skip(state, auth))]
pub async fn delete_tip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tip_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    roles::require_role(&state, auth.user_id, &[ADMIN], "Admin access required").await?;

    if !Tip::delete(&state.db, tip_id).await? {
        return Err(ApiError::NotFound("No tips found".into()));
    }
    info!(%tip_id, "tip deleted");
    Ok(Json(json!({ "message": "Crypto tip deleted successfully" })))
}
