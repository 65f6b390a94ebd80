use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::auth::extractors::AuthUser;
use crate::auth::roles::{self, USER};
use crate::error::ApiError;
use crate::market::services as market;
use crate::pagination::PageQuery;
use crate::state::AppState;

use super::dto::{AddWatchlistRequest, WatchlistPage};
use super::repo::WatchlistEntry;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(get_watchlist))
        .route("/watchlist", post(add_to_watchlist))
        .route("/watchlist/:coin_id", delete(remove_from_watchlist))
}

/// The user's watchlist page joined with quotes from the (cached) upstream.
#[instrument(skip(state, auth))]
pub async fn get_watchlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(p): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    roles::require_role(&state, auth.user_id, &[USER], "User access required").await?;
    p.validate()?;

    let entries =
        WatchlistEntry::page_for_user(&state.db, auth.user_id, p.limit as i64, p.offset()).await?;
    let total_items = WatchlistEntry::count_for_user(&state.db, auth.user_id).await?;

    let coins: Vec<i64> = entries.iter().map(|e| e.coin_id).collect();
    if coins.is_empty() {
        return Ok(Json(json!({
            "message": "No coin in watchlist found",
            "data": []
        })));
    }

    let data = market::watchlist_quotes(&state, auth.user_id, &coins).await?;
    let page = WatchlistPage {
        page: p.page,
        total_pages: p.total_pages(total_items),
        total_items,
        limit: p.limit,
        data,
    };
    Ok(Json(serde_json::to_value(page).map_err(anyhow::Error::from)?))
}

/// Duplicates are rejected before any write; the coin id is validated
/// against the upstream API before insert.
#[instrument(skip(state, auth, payload))]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AddWatchlistRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    roles::require_role(&state, auth.user_id, &[USER], "User access required").await?;

    let coin_id = payload
        .coin_id
        .ok_or_else(|| ApiError::BadRequest("Coin ID is required".into()))?;

    if WatchlistEntry::exists(&state.db, auth.user_id, coin_id).await? {
        warn!(user_id = %auth.user_id, coin_id, "coin already in watchlist");
        return Err(ApiError::BadRequest("Coin already in watchlist".into()));
    }

    let quotes = state
        .market
        .quotes(&[coin_id])
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid Coin ID: {e}")))?;
    if quotes.is_empty() {
        return Err(ApiError::BadRequest("Invalid Coin ID".into()));
    }

    WatchlistEntry::insert(&state.db, auth.user_id, coin_id).await?;
    info!(user_id = %auth.user_id, coin_id, "coin added to watchlist");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("{coin_id} added to watchlist") })),
    ))
}

#[instrument(skip(state, auth))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(coin_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    roles::require_role(&state, auth.user_id, &[USER], "User access required").await?;

    if !WatchlistEntry::remove(&state.db, auth.user_id, coin_id).await? {
        return Err(ApiError::NotFound("Coin not in watchlist".into()));
    }
    info!(user_id = %auth.user_id, coin_id, "coin removed from watchlist");
    Ok(Json(json!({
        "message": format!("{coin_id} removed from watchlist")
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{assign_role, User};
    use crate::market::cache::MarketCache;
    use crate::market::client::{MarketApi, Quote, RawCoin, UpstreamError, UsdQuote};
    use axum::async_trait;
    use sqlx::PgPool;
    use std::sync::Arc;
    use uuid::Uuid;

    struct OneCoinMarket;

    #[async_trait]
    impl MarketApi for OneCoinMarket {
        async fn listings(
            &self,
            _start: u64,
            _limit: u32,
        ) -> Result<(Vec<RawCoin>, u64), UpstreamError> {
            Ok((Vec::new(), 0))
        }

        async fn quotes(&self, ids: &[i64]) -> Result<Vec<RawCoin>, UpstreamError> {
            Ok(ids
                .iter()
                .map(|id| RawCoin {
                    id: *id,
                    name: "Bitcoin".into(),
                    symbol: "BTC".into(),
                    slug: "bitcoin".into(),
                    circulating_supply: None,
                    quote: Quote {
                        usd: UsdQuote::default(),
                    },
                })
                .collect())
        }

        async fn coin_info(&self, _id: i64) -> Result<Option<Value>, UpstreamError> {
            Ok(None)
        }
    }

    async fn watchlist_user(pool: &PgPool) -> Uuid {
        crate::seed::seed_roles(pool).await.unwrap();
        let user = User::create(pool, "Bob", "bob@example.com", "hash")
            .await
            .unwrap();
        assign_role(pool, user.id, USER).await.unwrap();
        user.id
    }

    fn state_with_market(pool: PgPool) -> AppState {
        let fake = crate::state::AppState::fake();
        AppState::from_parts(
            pool,
            fake.config.clone(),
            Arc::new(OneCoinMarket),
            Arc::new(MarketCache::default()),
        )
    }

    #[sqlx::test]
    async fn duplicate_coin_is_rejected_before_any_write(pool: PgPool) {
        let user_id = watchlist_user(&pool).await;
        let state = state_with_market(pool.clone());

        let (status, _) = add_to_watchlist(
            State(state.clone()),
            AuthUser {
                user_id,
                jti: Uuid::new_v4(),
            },
            Json(AddWatchlistRequest { coin_id: Some(1) }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let err = add_to_watchlist(
            State(state),
            AuthUser {
                user_id,
                jti: Uuid::new_v4(),
            },
            Json(AddWatchlistRequest { coin_id: Some(1) }),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Coin already in watchlist"),
            other => panic!("unexpected: {other:?}"),
        }

        // The rejection happened before the insert: still exactly one row.
        let count = WatchlistEntry::count_for_user(&pool, user_id).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    async fn missing_coin_id_is_rejected(pool: PgPool) {
        let user_id = watchlist_user(&pool).await;
        let state = state_with_market(pool.clone());

        let err = add_to_watchlist(
            State(state),
            AuthUser {
                user_id,
                jti: Uuid::new_v4(),
            },
            Json(AddWatchlistRequest { coin_id: None }),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Coin ID is required"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            WatchlistEntry::count_for_user(&pool, user_id).await.unwrap(),
            0
        );
    }
}
