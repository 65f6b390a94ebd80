pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn admin_router() -> Router<AppState> {
    handlers::routes()
}
