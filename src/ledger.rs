//! Durable, append-only record of executed purchases.
//!
//! The ledger is the single source of truth for the daily throttle: the
//! engine never keeps an in-memory "bought today" flag, it asks the ledger
//! fresh every cycle, so a restart mid-day cannot double-buy. Records are
//! kept as a human-inspectable JSON array; every append rewrites the file
//! to a temp path and renames it over the target, so a crash mid-write
//! leaves the previously committed records intact.

use crate::types::TradeMode;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One executed purchase. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub asset: String,
    pub fiat_amount: f64,
    pub quantity: f64,
    pub price: f64,
    pub rsi: f64,
    pub mode: TradeMode,
}

impl TradeRecord {
    pub fn new(
        asset: impl Into<String>,
        fiat_amount: f64,
        quantity: f64,
        price: f64,
        rsi: f64,
        mode: TradeMode,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            asset: asset.into(),
            fiat_amount,
            quantity,
            price,
            rsi,
            mode,
        }
    }
}

/// Aggregates for reporting. Decisions never depend on these.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub total_trades: usize,
    pub trades_today: usize,
    pub total_deployed: f64,
    pub deployed_today: f64,
    pub last_trade_at: Option<DateTime<Utc>>,
}

pub struct Ledger {
    path: PathBuf,
    records: Vec<TradeRecord>,
}

impl Ledger {
    /// Load the ledger from durable storage. A missing file is an empty
    /// ledger; a present-but-unreadable file is an error (starting with a
    /// blind ledger could violate the daily throttle).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let records = match std::fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("ledger file {} is corrupt", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read ledger file {}", path.display()))
            }
        };

        Ok(Self { path, records })
    }

    /// Append a record and flush to disk. The in-memory sequence is only
    /// extended once the file swap succeeded, so a failed write leaves
    /// both the file and memory at the previous committed state.
    pub fn append(&mut self, record: TradeRecord) -> Result<()> {
        self.records.push(record);
        if let Err(e) = self.flush() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let data =
            serde_json::to_vec_pretty(&self.records).context("failed to serialize ledger")?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &data)
            .with_context(|| format!("failed to write ledger temp file {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace ledger file {}", self.path.display()))?;

        Ok(())
    }

    /// True when any record (for any asset) falls on the same UTC calendar
    /// date as `reference`. The daily throttle is portfolio-wide.
    pub fn has_trade_today(&self, reference: DateTime<Utc>) -> bool {
        let day = reference.date_naive();
        self.records.iter().any(|r| r.timestamp.date_naive() == day)
    }

    /// Total capital deployed over the ledger's lifetime.
    pub fn total_deployed(&self) -> f64 {
        self.records.iter().map(|r| r.fiat_amount).sum()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> LedgerStats {
        let day = now.date_naive();
        let today: Vec<&TradeRecord> = self
            .records
            .iter()
            .filter(|r| r.timestamp.date_naive() == day)
            .collect();

        LedgerStats {
            total_trades: self.records.len(),
            trades_today: today.len(),
            total_deployed: self.total_deployed(),
            deployed_today: today.iter().map(|r| r.fiat_amount).sum(),
            last_trade_at: self.records.last().map(|r| r.timestamp),
        }
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
