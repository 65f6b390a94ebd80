use serde::{Deserialize, Serialize};

use crate::market::format::CoinSummary;

#[derive(Debug, Deserialize)]
pub struct AddWatchlistRequest {
    pub coin_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WatchlistPage {
    pub page: u32,
    pub total_pages: i64,
    pub total_items: i64,
    pub limit: u32,
    pub data: Vec<CoinSummary>,
}
