//! Relative Strength Index at a single bar.
//!
//! Gains and losses are the positive and negative parts of C[k] - C[k-1];
//! both are averaged with a plain mean over the last n differences.
//! RSI = 100 - 100/(1 + avg_gain/avg_loss).
//!
//! Fewer than n differences: 50. No losses: 100 if there were gains, else 50.
//! A NaN cell makes the two differences it touches count as zero gain and
//! zero loss; the window still averages over n.

pub const DEFAULT_PERIOD: usize = 14;

pub fn rsi_at(series: &[f64], at: usize, period: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if period == 0 || at < period {
        return 50.0;
    }

    let mut gain = 0.0;
    let mut loss = 0.0;
    for pair in history[history.len() - 1 - period..].windows(2) {
        let change = pair[1] - pair[0];
        // NaN changes count as neither
        if change > 0.0 {
            gain += change;
        } else if change < 0.0 {
            loss -= change;
        }
    }
    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;

    if avg_loss == 0.0 {
        return if avg_gain != 0.0 { 100.0 } else { 50.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
