//! Paper execution: real order flow against the venue's sandbox.

use super::{result_from_exchange, ExecutionResult, TradeExecutor};
use crate::exchange::BinanceClient;
use crate::logger::{self, LogTag};
use crate::types::TradeMode;
use async_trait::async_trait;

/// Forwards market buys to the testnet endpoint with test funds. Identical
/// order flow to [`super::LiveExecutor`], minus the hard cap - test funds
/// bound the damage already.
pub struct PaperExecutor {
    client: BinanceClient,
}

impl PaperExecutor {
    pub fn new(client: BinanceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TradeExecutor for PaperExecutor {
    fn mode(&self) -> TradeMode {
        TradeMode::Paper
    }

    async fn execute(&self, asset: &str, fiat_amount: f64) -> ExecutionResult {
        logger::info(
            LogTag::Executor,
            &format!("[PAPER] market buy {:.2} of {}", fiat_amount, asset),
        );

        result_from_exchange(self.client.place_market_buy(asset, fiat_amount).await)
    }
}
