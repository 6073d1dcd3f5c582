//! Technical indicators over ordered close-price series.
//!
//! Pure functions only: identical input always yields identical output, so
//! the same code can back a live evaluation or a replay over stored candles.

use crate::types::{PriceSample, RsiSnapshot};
use chrono::Utc;

/// Relative Strength Index using Wilder's smoothing.
///
/// The first `period` deltas seed a simple average of gains and losses;
/// every later delta is blended in with weight `1/period`. Returns `None`
/// when the series is shorter than `period + 1` closes (or the period is
/// degenerate) - insufficient data is a valid outcome, not an error.
/// When the smoothed loss is exactly zero the RSI saturates at 100.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period < 2 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = deltas[..period]
        .iter()
        .filter(|d| **d > 0.0)
        .sum::<f64>()
        / period as f64;
    let mut avg_loss = deltas[..period]
        .iter()
        .filter(|d| **d < 0.0)
        .map(|d| -d)
        .sum::<f64>()
        / period as f64;

    for delta in &deltas[period..] {
        let (gain, loss) = if *delta > 0.0 {
            (*delta, 0.0)
        } else {
            (0.0, -*delta)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Simple moving average over the trailing `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(values[values.len() - period..].iter().sum::<f64>() / period as f64)
}

/// Evaluate RSI over a fetched price series for one asset.
pub fn rsi_snapshot(asset: &str, samples: &[PriceSample], period: usize) -> RsiSnapshot {
    let closes: Vec<f64> = samples.iter().map(|s| s.close).collect();
    let timestamp = samples
        .last()
        .map(|s| s.timestamp)
        .unwrap_or_else(Utc::now);

    RsiSnapshot {
        asset: asset.to_string(),
        timestamp,
        rsi: rsi(&closes, period),
    }
}
