use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::ApiError;
use crate::pagination::PageQuery;
use crate::state::AppState;

use super::format::{ListingsResponse, SearchResponse};
use super::services;

#[instrument(skip(state))]
pub async fn listings(
    State(state): State<AppState>,
    Query(p): Query<PageQuery>,
) -> Result<Json<ListingsResponse>, ApiError> {
    p.validate()?;
    let response = services::fetch_listings(&state, p.page, p.limit).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn coin(
    State(state): State<AppState>,
    Path(coin_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    match services::coin_detail(&state, coin_id).await? {
        Some(info) => Ok(Json(info)),
        None => Err(ApiError::NotFound("Coin data not found".into())),
    }
}

// Flattening PageQuery here trips serde_urlencoded over the numeric
// fields, so the query is spelled out.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    20
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(p): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    if p.q.trim().is_empty() {
        return Err(ApiError::BadRequest("Search query is required".into()));
    }
    let page = PageQuery {
        page: p.page,
        limit: p.limit,
    };
    page.validate()?;
    let response = services::search(&state, p.q.trim(), page.page, page.limit).await?;
    Ok(Json(response))
}
