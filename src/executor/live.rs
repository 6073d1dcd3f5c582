//! Live execution against real capital.

use super::{result_from_exchange, ExecutionResult, TradeExecutor};
use crate::exchange::BinanceClient;
use crate::logger::{self, LogTag};
use crate::types::TradeMode;
use async_trait::async_trait;

/// Places market orders on the live endpoint. Every request passes a
/// pre-flight hard cap before any network activity: a misconfigured
/// allocation ladder can at worst spend the cap, not the account.
pub struct LiveExecutor {
    client: BinanceClient,
    hard_cap_fiat: f64,
}

impl LiveExecutor {
    pub fn new(client: BinanceClient, hard_cap_fiat: f64) -> Self {
        Self {
            client,
            hard_cap_fiat,
        }
    }
}

#[async_trait]
impl TradeExecutor for LiveExecutor {
    fn mode(&self) -> TradeMode {
        TradeMode::Real
    }

    async fn execute(&self, asset: &str, fiat_amount: f64) -> ExecutionResult {
        if fiat_amount > self.hard_cap_fiat {
            logger::warning(
                LogTag::Executor,
                &format!(
                    "order of {:.2} for {} exceeds hard cap {:.2} - refused before reaching the venue",
                    fiat_amount, asset, self.hard_cap_fiat
                ),
            );
            return ExecutionResult::Rejected {
                reason: format!(
                    "exceeds cap: {:.2} > {:.2}",
                    fiat_amount, self.hard_cap_fiat
                ),
            };
        }

        logger::info(
            LogTag::Executor,
            &format!("[LIVE] market buy {:.2} of {}", fiat_amount, asset),
        );

        result_from_exchange(self.client.place_market_buy(asset, fiat_amount).await)
    }
}
