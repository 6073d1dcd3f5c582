//! Trade execution backends.
//!
//! The decision engine only knows the [`TradeExecutor`] capability trait;
//! the three implementations (simulated, paper, live) are interchangeable
//! and exercise the exact same ledger and notification paths, which is
//! what makes a dry run a faithful rehearsal of live trading.

use crate::config::Config;
use crate::exchange::{BinanceClient, ExchangeError, OrderFill};
use crate::types::{PriceBook, TradeMode};
use async_trait::async_trait;
use std::time::Duration;

mod live;
mod paper;
mod simulated;

pub use live::LiveExecutor;
pub use paper::PaperExecutor;
pub use simulated::SimulatedExecutor;

/// Outcome of one execution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Filled { price: f64, quantity: f64 },
    /// Final decline: reported, never retried.
    Rejected { reason: String },
    /// Transient transport failure: the engine may retry.
    NetworkFailure { cause: String },
}

/// Capability interface for acquiring an asset with a fiat budget.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    fn mode(&self) -> TradeMode;

    /// Attempt to spend `fiat_amount` (quote currency) on `asset`.
    async fn execute(&self, asset: &str, fiat_amount: f64) -> ExecutionResult;
}

/// Map an exchange outcome onto the executor contract. Transport failures
/// are the only retryable class; a malformed response after an order POST
/// is treated as final because the order may have been accepted.
fn result_from_exchange(outcome: Result<OrderFill, ExchangeError>) -> ExecutionResult {
    match outcome {
        Ok(fill) => ExecutionResult::Filled {
            price: fill.price,
            quantity: fill.quantity,
        },
        Err(ExchangeError::Transport(cause)) => ExecutionResult::NetworkFailure { cause },
        Err(e) => ExecutionResult::Rejected {
            reason: e.to_string(),
        },
    }
}

/// Build the executor for the configured mode.
pub fn build_executor(
    config: &Config,
    price_book: PriceBook,
) -> anyhow::Result<Box<dyn TradeExecutor>> {
    let exchange = &config.exchange;
    let timeout = Duration::from_secs(exchange.request_timeout_secs);

    match config.mode {
        TradeMode::Simulated => Ok(Box::new(SimulatedExecutor::new(price_book))),
        TradeMode::Paper => {
            let client = BinanceClient::new(
                &exchange.testnet_url,
                &exchange.quote_currency,
                &config.dca.timeframe,
                timeout,
            )?
            .with_credentials(&exchange.testnet_api_key, &exchange.testnet_api_secret);
            Ok(Box::new(PaperExecutor::new(client)))
        }
        TradeMode::Real => {
            let client = BinanceClient::new(
                &exchange.live_url,
                &exchange.quote_currency,
                &config.dca.timeframe,
                timeout,
            )?
            .with_credentials(&exchange.api_key, &exchange.api_secret);
            Ok(Box::new(LiveExecutor::new(client, exchange.hard_cap_fiat)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_failures_map_onto_the_contract() {
        let filled = result_from_exchange(Ok(OrderFill {
            price: 50_000.0,
            quantity: 0.0005,
        }));
        assert_eq!(
            filled,
            ExecutionResult::Filled {
                price: 50_000.0,
                quantity: 0.0005
            }
        );

        let network = result_from_exchange(Err(ExchangeError::Transport("timed out".to_string())));
        assert!(matches!(network, ExecutionResult::NetworkFailure { .. }));

        let declined = result_from_exchange(Err(ExchangeError::Venue("code -2010".to_string())));
        assert!(matches!(declined, ExecutionResult::Rejected { .. }));

        // unknown order outcome must not be retried
        let unknown = result_from_exchange(Err(ExchangeError::Malformed("bad body".to_string())));
        assert!(matches!(unknown, ExecutionResult::Rejected { .. }));
    }

    #[test]
    fn builder_selects_the_configured_backend() {
        let mut config = Config::default();
        let book = PriceBook::new();

        config.mode = TradeMode::Simulated;
        let executor = build_executor(&config, book.clone()).unwrap();
        assert_eq!(executor.mode(), TradeMode::Simulated);

        config.mode = TradeMode::Paper;
        let executor = build_executor(&config, book.clone()).unwrap();
        assert_eq!(executor.mode(), TradeMode::Paper);

        config.mode = TradeMode::Real;
        let executor = build_executor(&config, book).unwrap();
        assert_eq!(executor.mode(), TradeMode::Real);
    }
}
