//! MACD histogram at a single bar.
//!
//! line   = EMA(fast) - EMA(slow)
//! signal = EMA(line, signal)
//! result = line - signal
//!
//! Before max(fast, slow, signal) bars: 0.0. Until the signal EMA has
//! `signal` line values behind it, the bare line is returned instead.

use super::ema::{ewm_last, ewm_series};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn macd_at(series: &[f64], at: usize, fast: usize, slow: usize, signal: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if at < fast.max(slow).max(signal) {
        return 0.0;
    }
    if at < (fast.max(slow) + signal).saturating_sub(1) {
        return ewm_last(history, fast) - ewm_last(history, slow);
    }

    let line: Vec<f64> = ewm_series(history, fast)
        .into_iter()
        .zip(ewm_series(history, slow))
        .map(|(f, s)| f - s)
        .collect();
    let current = line[line.len() - 1];
    current - ewm_last(&line, signal)
}
