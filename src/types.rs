// Core types shared across the bot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Trade execution mode selecting which backend places orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeMode {
    #[serde(rename = "simulated")]
    Simulated,
    #[serde(rename = "paper")]
    Paper,
    #[serde(rename = "real")]
    Real,
}

impl TradeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeMode::Simulated => "simulated",
            TradeMode::Paper => "paper",
            TradeMode::Real => "real",
        }
    }

    pub fn from_str(s: &str) -> Option<TradeMode> {
        match s {
            "simulated" | "dry_run" => Some(TradeMode::Simulated),
            "paper" | "testnet" => Some(TradeMode::Paper),
            "real" | "live" => Some(TradeMode::Real),
            _ => None,
        }
    }
}

impl Default for TradeMode {
    fn default() -> Self {
        TradeMode::Simulated
    }
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single closing price observation for an asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSample {
    pub asset: String,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PriceSample {
    pub fn new(asset: impl Into<String>, timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            asset: asset.into(),
            timestamp,
            close,
        }
    }
}

/// Result of an RSI evaluation over a price series.
///
/// `rsi` is `None` when the series was too short for the configured period.
/// That is a valid outcome the caller branches on, not an error.
#[derive(Debug, Clone)]
pub struct RsiSnapshot {
    pub asset: String,
    pub timestamp: DateTime<Utc>,
    pub rsi: Option<f64>,
}

/// Qualitative strength of a buy signal derived from RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

impl SignalStrength {
    pub fn from_rsi(rsi: f64) -> SignalStrength {
        if rsi < 25.0 {
            SignalStrength::Strong
        } else if rsi < 35.0 {
            SignalStrength::Moderate
        } else if rsi < 50.0 {
            SignalStrength::Weak
        } else {
            SignalStrength::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStrength::Strong => "STRONG",
            SignalStrength::Moderate => "MODERATE",
            SignalStrength::Weak => "WEAK",
            SignalStrength::None => "NONE",
        }
    }
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared map of the last observed close per asset.
///
/// The engine records a price on every fetch; the simulated executor fills
/// from here without touching the network. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct PriceBook {
    inner: Arc<RwLock<HashMap<String, f64>>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, asset: &str, close: f64) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(asset.to_string(), close);
        }
    }

    pub fn last(&self, asset: &str) -> Option<f64> {
        self.inner.read().ok().and_then(|map| map.get(asset).copied())
    }
}
