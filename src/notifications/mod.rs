//! Outbound event notifications.
//!
//! The engine reports every terminal outcome through the [`EventSink`]
//! trait - exactly one event per outcome. Formatting and delivery live
//! here; the engine only decides *that* something is worth telling.

use crate::ledger::LedgerStats;
use crate::types::TradeMode;
use async_trait::async_trait;
use std::fmt;

mod webhook;

pub use webhook::WebhookNotifier;

/// Severity/kind of an event, mirrored in webhook colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Opportunity,
    Trade,
    Warning,
    Error,
}

impl NotifyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyLevel::Info => "INFO",
            NotifyLevel::Opportunity => "OPPORTUNITY",
            NotifyLevel::Trade => "TRADE",
            NotifyLevel::Warning => "WARNING",
            NotifyLevel::Error => "ERROR",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            NotifyLevel::Info => "📊",
            NotifyLevel::Opportunity => "🎯",
            NotifyLevel::Trade => "✅",
            NotifyLevel::Warning => "⚠️",
            NotifyLevel::Error => "🔴",
        }
    }

    /// Discord embed color per level
    pub fn color(&self) -> u32 {
        match self {
            NotifyLevel::Info => 0x3498db,
            NotifyLevel::Opportunity => 0x9b59b6,
            NotifyLevel::Trade => 0x2ecc71,
            NotifyLevel::Warning => 0xf39c12,
            NotifyLevel::Error => 0xe74c3c,
        }
    }
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events the bot can report.
#[derive(Debug, Clone)]
pub enum Notification {
    BotStarted {
        mode: TradeMode,
        asset_summary: String,
        check_interval_secs: u64,
    },
    BotStopped {
        reason: String,
    },
    /// A buy signal fired but the daily throttle already closed the gate.
    Opportunity {
        asset: String,
        rsi: f64,
        price: f64,
        amount: f64,
    },
    NoOpportunity {
        asset: String,
        detail: String,
    },
    TradeExecuted {
        asset: String,
        amount: f64,
        price: f64,
        quantity: f64,
        rsi: f64,
        mode: TradeMode,
    },
    OrderRejected {
        asset: String,
        amount: f64,
        reason: String,
    },
    ExecutionFailed {
        asset: String,
        amount: f64,
        cause: String,
    },
    MarketDataUnavailable {
        asset: String,
        cause: String,
    },
    DailyReport {
        stats: LedgerStats,
    },
}

impl Notification {
    pub fn level(&self) -> NotifyLevel {
        match self {
            Notification::BotStarted { .. } => NotifyLevel::Info,
            Notification::BotStopped { .. } => NotifyLevel::Warning,
            Notification::Opportunity { .. } => NotifyLevel::Opportunity,
            Notification::NoOpportunity { .. } => NotifyLevel::Info,
            Notification::TradeExecuted { .. } => NotifyLevel::Trade,
            Notification::OrderRejected { .. } => NotifyLevel::Warning,
            Notification::ExecutionFailed { .. } => NotifyLevel::Error,
            Notification::MarketDataUnavailable { .. } => NotifyLevel::Warning,
            Notification::DailyReport { .. } => NotifyLevel::Info,
        }
    }

    /// Plain-text body of the event.
    pub fn render(&self) -> String {
        match self {
            Notification::BotStarted {
                mode,
                asset_summary,
                check_interval_secs,
            } => format!(
                "BOT STARTED\nMode: {}\nAssets: {}\nCheck interval: {:.1}h",
                mode.as_str().to_uppercase(),
                asset_summary,
                *check_interval_secs as f64 / 3600.0
            ),

            Notification::BotStopped { reason } => {
                format!("BOT STOPPED\nReason: {}", reason)
            }

            Notification::Opportunity {
                asset,
                rsi,
                price,
                amount,
            } => format!(
                "DCA OPPORTUNITY (not executed)\nAsset: {}\nRSI: {:.1} ({})\nPrice: {:.2}\nWould buy: {:.2}\nSkipped: daily purchase already made",
                asset,
                rsi,
                crate::types::SignalStrength::from_rsi(*rsi),
                price,
                amount
            ),

            Notification::NoOpportunity { asset, detail } => {
                format!("No DCA opportunity for {}: {}", asset, detail)
            }

            Notification::TradeExecuted {
                asset,
                amount,
                price,
                quantity,
                rsi,
                mode,
            } => format!(
                "DCA EXECUTED\nAsset: {}\nAmount: {:.2}\nPrice: {:.2}\nQuantity: {:.8}\nRSI: {:.1}\nMode: {}",
                asset, amount, price, quantity, rsi, mode
            ),

            Notification::OrderRejected {
                asset,
                amount,
                reason,
            } => format!(
                "ORDER REJECTED\nAsset: {}\nAmount: {:.2}\nReason: {}",
                asset, amount, reason
            ),

            Notification::ExecutionFailed {
                asset,
                amount,
                cause,
            } => format!(
                "EXECUTION FAILED\nAsset: {}\nAmount: {:.2}\nCause: {}\nRetries exhausted - no capital committed",
                asset, amount, cause
            ),

            Notification::MarketDataUnavailable { asset, cause } => {
                format!("Price data unavailable for {}: {}", asset, cause)
            }

            Notification::DailyReport { stats } => format!(
                "DAILY REPORT\nTrades today: {}\nDeployed today: {:.2}\nTotal trades: {}\nTotal deployed: {:.2}\nLast trade: {}",
                stats.trades_today,
                stats.deployed_today,
                stats.total_trades,
                stats.total_deployed,
                stats
                    .last_trade_at
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "never".to_string())
            ),
        }
    }
}

/// Destination for engine events. Implementations must never fail the
/// caller; delivery problems are their own to log.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, notification: Notification);
}
