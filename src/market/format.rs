//! Normalization of raw upstream records into the shape served to clients.

use serde::Serialize;

use super::client::RawCoin;

fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Price precision depends on magnitude: tiny prices keep more decimals so
/// they do not collapse to zero in the UI.
pub fn format_price(price: f64) -> f64 {
    if price == 0.0 {
        0.0
    } else if price < 0.000_000_01 {
        round_dp(price, 11)
    } else if price < 0.0001 {
        round_dp(price, 8)
    } else if price < 1.0 {
        round_dp(price, 4)
    } else {
        round_dp(price, 2)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoinSummary {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub circulating_supply: Option<f64>,
}

pub fn transform(coins: &[RawCoin]) -> Vec<CoinSummary> {
    coins
        .iter()
        .map(|coin| {
            let usd = &coin.quote.usd;
            CoinSummary {
                id: coin.id,
                name: coin.name.clone(),
                symbol: coin.symbol.clone(),
                price: format_price(usd.price),
                percent_change_1h: round_dp(usd.percent_change_1h, 2),
                percent_change_24h: round_dp(usd.percent_change_24h, 2),
                percent_change_7d: round_dp(usd.percent_change_7d, 2),
                market_cap: round_dp(usd.market_cap, 2),
                volume_24h: round_dp(usd.volume_24h, 2),
                circulating_supply: coin.circulating_supply,
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub data: Vec<CoinSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub page: u32,
    pub limit: u32,
    pub total_results: usize,
    pub total_pages: usize,
    pub data: Vec<CoinSummary>,
}
