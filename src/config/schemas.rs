//! Configuration schema with embedded defaults.
//!
//! Defaults describe a conservative simulated setup: 70/30 BTC/ETH split,
//! 4h RSI with period 14, and the three-bracket buy ladder. Live trading
//! additionally requires credentials and an explicit hard cap.

use crate::config_struct;
use crate::types::TradeMode;
use serde::{Deserialize, Serialize};

/// One row of the RSI buy ladder: when RSI is strictly below `threshold`,
/// `amount` (in quote currency) is the candidate spend for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationRule {
    pub threshold: f64,
    pub amount: f64,
}

/// Portfolio weight for one asset. Order in the config file is the
/// evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWeight {
    pub symbol: String,
    pub weight: f64,
}

config_struct! {
    /// DCA strategy configuration
    pub struct DcaConfig {
        enabled: bool = true,

        /// Seconds between evaluation cycles (14400 = 4 hours)
        check_interval_secs: u64 = 14400,

        /// RSI period (14 is the conventional default)
        rsi_period: usize = 14,

        /// Candle timeframe used for the RSI series
        timeframe: String = "4h".to_string(),

        /// Number of candles fetched per evaluation
        lookback: usize = 100,

        /// Spends below this are not worth the order fees
        min_trade_amount: f64 = 10.0,

        /// Retries after a transport failure before giving up on the cycle
        max_retries: u32 = 3,

        /// Base delay for exponential backoff between retries
        retry_delay_secs: u64 = 1,

        /// RSI thresholds mapped to buy amounts, tightest bracket wins
        allocation_rules: Vec<AllocationRule> = vec![
            AllocationRule { threshold: 30.0, amount: 40.0 },
            AllocationRule { threshold: 40.0, amount: 25.0 },
            AllocationRule { threshold: 50.0, amount: 15.0 },
        ],

        /// Assets and their share of each buy, in evaluation order
        assets: Vec<AssetWeight> = vec![
            AssetWeight { symbol: "BTC".to_string(), weight: 0.7 },
            AssetWeight { symbol: "ETH".to_string(), weight: 0.3 },
        ],
    }
}

config_struct! {
    /// Venue endpoints and credentials
    pub struct ExchangeConfig {
        live_url: String = "https://api.binance.com".to_string(),
        testnet_url: String = "https://testnet.binance.vision".to_string(),
        quote_currency: String = "USDT".to_string(),
        request_timeout_secs: u64 = 10,

        /// Live credentials (required in real mode)
        api_key: String = String::new(),
        api_secret: String = String::new(),

        /// Testnet credentials (required in paper mode)
        testnet_api_key: String = String::new(),
        testnet_api_secret: String = String::new(),

        /// Upper bound on a single live order, checked before any network
        /// call so a misconfigured ladder cannot drain the account
        hard_cap_fiat: f64 = 100.0,
    }
}

config_struct! {
    /// Outbound webhook notifications
    pub struct NotificationsConfig {
        webhook_enabled: bool = false,
        webhook_url: String = String::new(),

        /// Also deliver webhooks while running simulated
        notify_in_simulated: bool = true,

        /// UTC hour (0-23) of the daily summary
        daily_report_hour: u32 = 20,
    }
}

config_struct! {
    /// Root configuration
    pub struct Config {
        /// Trading mode: simulated, paper or real
        mode: TradeMode = TradeMode::Simulated,

        /// Override for the ledger file location (empty = default path)
        ledger_file: String = String::new(),

        dca: DcaConfig = DcaConfig::default(),
        exchange: ExchangeConfig = ExchangeConfig::default(),
        notifications: NotificationsConfig = NotificationsConfig::default(),
    }
}

impl Config {
    /// Validate the configuration before the bot starts evaluating.
    ///
    /// Collects every problem instead of stopping at the first, so a bad
    /// config file can be fixed in one pass. Any error is fatal at startup.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let dca = &self.dca;

        if dca.rsi_period < 2 {
            errors.push(format!("dca.rsi_period must be at least 2 (got {})", dca.rsi_period));
        }

        if dca.lookback <= dca.rsi_period {
            errors.push(format!(
                "dca.lookback ({}) must exceed dca.rsi_period ({})",
                dca.lookback, dca.rsi_period
            ));
        }

        if dca.check_interval_secs == 0 {
            errors.push("dca.check_interval_secs must be positive".to_string());
        }

        if dca.allocation_rules.is_empty() {
            errors.push("dca.allocation_rules must not be empty".to_string());
        }

        for pair in dca.allocation_rules.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                errors.push(format!(
                    "dca.allocation_rules thresholds must be strictly increasing ({} then {})",
                    pair[0].threshold, pair[1].threshold
                ));
            }
        }

        for rule in &dca.allocation_rules {
            if rule.amount <= 0.0 {
                errors.push(format!(
                    "dca.allocation_rules amount must be positive (threshold {})",
                    rule.threshold
                ));
            }
        }

        if dca.assets.is_empty() {
            errors.push("dca.assets must not be empty".to_string());
        }

        for asset in &dca.assets {
            if asset.symbol.is_empty() {
                errors.push("dca.assets entries need a symbol".to_string());
            }
            if asset.weight <= 0.0 {
                errors.push(format!("dca.assets weight for {} must be positive", asset.symbol));
            }
        }

        let weight_sum: f64 = dca.assets.iter().map(|a| a.weight).sum();
        if !dca.assets.is_empty() && (weight_sum - 1.0).abs() > 1e-6 {
            errors.push(format!(
                "dca.assets weights must sum to 1.0 (currently {:.6})",
                weight_sum
            ));
        }

        match self.mode {
            TradeMode::Paper => {
                if self.exchange.testnet_api_key.is_empty()
                    || self.exchange.testnet_api_secret.is_empty()
                {
                    errors.push(
                        "exchange.testnet_api_key and exchange.testnet_api_secret are required in paper mode"
                            .to_string(),
                    );
                }
            }
            TradeMode::Real => {
                if self.exchange.api_key.is_empty() || self.exchange.api_secret.is_empty() {
                    errors.push(
                        "exchange.api_key and exchange.api_secret are required in real mode"
                            .to_string(),
                    );
                }
                if self.exchange.hard_cap_fiat <= 0.0 {
                    errors.push("exchange.hard_cap_fiat must be positive in real mode".to_string());
                }
            }
            TradeMode::Simulated => {}
        }

        if self.notifications.webhook_enabled && self.notifications.webhook_url.is_empty() {
            errors.push("notifications.webhook_url is required when webhook_enabled".to_string());
        }

        if self.notifications.daily_report_hour > 23 {
            errors.push(format!(
                "notifications.daily_report_hour must be 0-23 (got {})",
                self.notifications.daily_report_hour
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, TradeMode::Simulated);
        assert_eq!(config.dca.rsi_period, 14);
        assert_eq!(config.dca.allocation_rules.len(), 3);
    }

    #[test]
    fn config_serializes_with_sections() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_str.contains("[dca]"));
        assert!(toml_str.contains("[exchange]"));
        assert!(toml_str.contains("[notifications]"));
        assert!(toml_str.contains("[[dca.allocation_rules]]"));
    }

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let config: Config = toml::from_str("mode = \"paper\"").unwrap();
        assert_eq!(config.mode, TradeMode::Paper);
        assert_eq!(config.dca.check_interval_secs, 14400);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = Config::default();
        config.dca.assets[0].weight = 0.8; // 0.8 + 0.3
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("sum to 1.0")));
    }

    #[test]
    fn thresholds_must_increase_strictly() {
        let mut config = Config::default();
        config.dca.allocation_rules[1].threshold = 30.0;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("strictly increasing")));
    }

    #[test]
    fn degenerate_rsi_period_is_rejected() {
        let mut config = Config::default();
        config.dca.rsi_period = 1;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("rsi_period")));
    }

    #[test]
    fn credentials_required_outside_simulation() {
        let mut config = Config::default();
        config.mode = TradeMode::Real;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("api_key")));

        config.mode = TradeMode::Paper;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("testnet_api_key")));
    }
}
