use std::collections::HashMap;

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

/// Raw coin record as returned by the upstream listings/quotes endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCoin {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    pub quote: Quote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(rename = "USD")]
    pub usd: UsdQuote,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UsdQuote {
    pub price: f64,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Transport(String),
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        UpstreamError::Transport(message.into())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Http { status, message } => ApiError::Upstream {
                status: Some(status),
                message,
            },
            UpstreamError::Transport(message) => ApiError::Upstream {
                status: None,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport(err.to_string())
    }
}

/// Gateway to the third-party market-data API.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Paginated listings. `start` is 1-based; 64-bit so page*limit math
    /// never wraps on client-supplied values. Returns coins plus the
    /// upstream total count.
    async fn listings(&self, start: u64, limit: u32) -> Result<(Vec<RawCoin>, u64), UpstreamError>;

    /// Latest quotes for specific coin ids.
    async fn quotes(&self, ids: &[i64]) -> Result<Vec<RawCoin>, UpstreamError>;

    /// Metadata for a single coin, `None` when the upstream has no data.
    async fn coin_info(&self, id: i64) -> Result<Option<Value>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct StatusBlock {
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingsEnvelope {
    #[serde(default)]
    data: Vec<RawCoin>,
    status: StatusBlock,
}

#[derive(Debug, Deserialize)]
struct QuotesEnvelope {
    #[serde(default)]
    data: HashMap<String, RawCoin>,
}

#[derive(Debug, Deserialize)]
struct InfoEnvelope {
    #[serde(default)]
    data: HashMap<String, Value>,
}

/// CoinMarketCap-style client authenticated via the `X-CMC_PRO_API_KEY`
/// header. No retry policy: failures surface to the caller immediately.
pub struct CoinMarketCapClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body
                .pointer("/status/error_message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketApi for CoinMarketCapClient {
    async fn listings(&self, start: u64, limit: u32) -> Result<(Vec<RawCoin>, u64), UpstreamError> {
        let body = self
            .get(
                "/v1/cryptocurrency/listings/latest",
                &[
                    ("start", start.to_string()),
                    ("limit", limit.to_string()),
                    ("convert", "USD".to_string()),
                ],
            )
            .await?;
        let envelope: ListingsEnvelope =
            serde_json::from_value(body).map_err(|e| UpstreamError::transport(e.to_string()))?;
        let total = envelope.status.total_count.unwrap_or(0);
        debug!(count = envelope.data.len(), total, "fetched listings");
        if let Some(message) = envelope.status.error_message {
            return Err(UpstreamError::Http {
                status: 200,
                message,
            });
        }
        Ok((envelope.data, total))
    }

    async fn quotes(&self, ids: &[i64]) -> Result<Vec<RawCoin>, UpstreamError> {
        let id_param = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let body = self
            .get(
                "/v2/cryptocurrency/quotes/latest",
                &[("id", id_param), ("convert", "USD".to_string())],
            )
            .await?;
        let envelope: QuotesEnvelope =
            serde_json::from_value(body).map_err(|e| UpstreamError::transport(e.to_string()))?;
        let mut coins: Vec<RawCoin> = envelope.data.into_values().collect();
        coins.sort_by_key(|c| c.id);
        debug!(count = coins.len(), "fetched quotes");
        Ok(coins)
    }

    async fn coin_info(&self, id: i64) -> Result<Option<Value>, UpstreamError> {
        let body = self
            .get("/v2/cryptocurrency/info", &[("id", id.to_string())])
            .await?;
        let envelope: InfoEnvelope =
            serde_json::from_value(body).map_err(|e| UpstreamError::transport(e.to_string()))?;
        Ok(envelope.data.get(&id.to_string()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_coin_deserializes_from_upstream_shape() {
        let json = serde_json::json!({
            "id": 1,
            "name": "Bitcoin",
            "symbol": "BTC",
            "slug": "bitcoin",
            "circulating_supply": 19500000.0,
            "quote": { "USD": {
                "price": 64123.456789,
                "percent_change_1h": 0.1234,
                "percent_change_24h": -1.9876,
                "percent_change_7d": 5.5,
                "market_cap": 1.25e12,
                "volume_24h": 3.4e10
            }}
        });
        let coin: RawCoin = serde_json::from_value(json).unwrap();
        assert_eq!(coin.id, 1);
        assert_eq!(coin.symbol, "BTC");
        assert!((coin.quote.usd.price - 64123.456789).abs() < 1e-9);
    }

    #[test]
    fn missing_quote_fields_default_to_zero() {
        let json = serde_json::json!({
            "id": 2,
            "name": "Obscure",
            "symbol": "OBS",
            "quote": { "USD": { "price": 0.42 } }
        });
        let coin: RawCoin = serde_json::from_value(json).unwrap();
        assert_eq!(coin.quote.usd.market_cap, 0.0);
        assert_eq!(coin.slug, "");
        assert!(coin.circulating_supply.is_none());
    }

    #[test]
    fn upstream_error_maps_to_api_error() {
        let err = UpstreamError::Http {
            status: 429,
            message: "rate limited".into(),
        };
        match ApiError::from(err) {
            ApiError::Upstream { status, message } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
