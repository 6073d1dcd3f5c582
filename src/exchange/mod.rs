//! Market data and order routing against the trading venue.
//!
//! The decision engine reads prices through the [`MarketData`] trait; the
//! executor backends are the only callers of order placement. Errors keep
//! transport failures (retryable - the order never reached the venue) apart
//! from venue declines (final).

use crate::types::PriceSample;
use async_trait::async_trait;
use thiserror::Error;

mod binance;

pub use binance::BinanceClient;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Timeout or connection failure: the request never produced an answer.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The venue answered and declined.
    #[error("venue rejected the request: {0}")]
    Venue(String),

    /// The venue answered success but the body could not be understood.
    /// For orders this is final, never retried: the order may have been
    /// accepted, and re-sending it could buy twice.
    #[error("malformed venue response: {0}")]
    Malformed(String),

    #[error("credentials are not configured for this endpoint")]
    MissingCredentials,
}

/// A filled market order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFill {
    pub price: f64,
    pub quantity: f64,
}

/// Read-only price feed used by the decision engine.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Ordered close-price series for `asset`, oldest first, at most
    /// `lookback` samples.
    async fn recent_closes(
        &self,
        asset: &str,
        lookback: usize,
    ) -> Result<Vec<PriceSample>, ExchangeError>;
}
