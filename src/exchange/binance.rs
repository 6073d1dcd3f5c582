//! Binance REST client: kline history and signed market buys.
//!
//! The same client type serves the live and testnet endpoints; only the
//! base URL and credentials differ, which is how paper trading stays
//! byte-for-byte identical to live order flow.

use super::{ExchangeError, MarketData, OrderFill};
use crate::types::PriceSample;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
struct Credentials {
    api_key: String,
    api_secret: String,
}

#[derive(Clone)]
pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
    quote_currency: String,
    timeframe: String,
    credentials: Option<Credentials>,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        quote_currency: impl Into<String>,
        timeframe: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote_currency: quote_currency.into(),
            timeframe: timeframe.into(),
            credentials: None,
        })
    }

    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        });
        self
    }

    /// Trading pair symbol for an asset, e.g. `BTC` -> `BTCUSDT`.
    fn symbol(&self, asset: &str) -> String {
        format!("{}{}", asset, self.quote_currency)
    }

    /// Place a market buy spending `quote_qty` of the quote currency.
    /// Returns the average fill price and acquired quantity.
    pub async fn place_market_buy(
        &self,
        asset: &str,
        quote_qty: f64,
    ) -> Result<OrderFill, ExchangeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials)?;

        let query = format!(
            "symbol={}&side=BUY&type=MARKET&quoteOrderQty={:.2}&recvWindow=5000&timestamp={}",
            self.symbol(asset),
            quote_qty,
            Utc::now().timestamp_millis()
        );
        let signature = sign(&credentials.api_secret, &query);
        let url = format!("{}/api/v3/order?{}&signature={}", self.base_url, query, signature);

        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Venue(venue_message(status.as_u16(), &body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;
        parse_order_fill(&body)
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn recent_closes(
        &self,
        asset: &str,
        lookback: usize,
    ) -> Result<Vec<PriceSample>, ExchangeError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("symbol", self.symbol(asset)),
                ("interval", self.timeframe.clone()),
                ("limit", lookback.to_string()),
            ])
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Venue(venue_message(status.as_u16(), &body)));
        }

        let rows: Vec<Vec<serde_json::Value>> = response
            .json()
            .await
            .map_err(|e| ExchangeError::Malformed(e.to_string()))?;

        parse_klines(asset, &rows)
    }
}

fn map_transport(e: reqwest::Error) -> ExchangeError {
    if e.is_timeout() {
        ExchangeError::Transport(format!("request timed out: {}", e))
    } else if e.is_connect() {
        ExchangeError::Transport(format!("connection failed: {}", e))
    } else {
        ExchangeError::Transport(e.to_string())
    }
}

/// HMAC-SHA256 signature over the canonical query string, hex encoded.
fn sign(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
struct VenueError {
    code: i64,
    msg: String,
}

fn venue_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<VenueError>(body) {
        Ok(err) => format!("HTTP {} code {}: {}", status, err.code, err.msg),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

/// Kline rows are arrays: [open_time_ms, open, high, low, close, volume, ...]
/// with prices encoded as strings.
fn parse_klines(
    asset: &str,
    rows: &[Vec<serde_json::Value>],
) -> Result<Vec<PriceSample>, ExchangeError> {
    rows.iter()
        .map(|row| {
            let open_time = row
                .first()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| ExchangeError::Malformed("kline missing open time".to_string()))?;
            let close = row
                .get(4)
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| ExchangeError::Malformed("kline missing close price".to_string()))?;

            let timestamp = timestamp_from_millis(open_time)?;
            Ok(PriceSample::new(asset, timestamp, close))
        })
        .collect()
}

fn timestamp_from_millis(ms: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ExchangeError::Malformed(format!("invalid timestamp {}", ms)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    executed_qty: String,
    // Binance spells it with the double m
    cummulative_quote_qty: String,
}

fn parse_order_fill(body: &str) -> Result<OrderFill, ExchangeError> {
    let order: OrderResponse =
        serde_json::from_str(body).map_err(|e| ExchangeError::Malformed(e.to_string()))?;

    let quantity: f64 = order
        .executed_qty
        .parse()
        .map_err(|_| ExchangeError::Malformed("unparseable executedQty".to_string()))?;
    let quote_spent: f64 = order
        .cummulative_quote_qty
        .parse()
        .map_err(|_| ExchangeError::Malformed("unparseable cummulativeQuoteQty".to_string()))?;

    if quantity <= 0.0 {
        return Err(ExchangeError::Malformed(
            "order reported zero executed quantity".to_string(),
        ));
    }

    Ok(OrderFill {
        price: quote_spent / quantity,
        quantity,
    })
}
