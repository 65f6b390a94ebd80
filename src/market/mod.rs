pub mod cache;
pub mod client;
pub mod format;
pub mod handlers;
pub mod services;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::listings))
        .route("/coin/:coin_id", get(handlers::coin))
        .route("/search", get(handlers::search))
}
