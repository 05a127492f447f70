//! Weighted Moving Average at a single bar.
//!
//! WMA(n)[i] = sum(w_j * C[i-n+1+j]) / (n*(n+1)/2), w_j = j+1.
//! Fewer than n bars up to i: 0.0.

pub fn wma_at(series: &[f64], at: usize, window: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if window == 0 || history.len() < window {
        return 0.0;
    }
    let divisor = (window * (window + 1)) as f64 / 2.0;
    let weighted: f64 = history[history.len() - window..]
        .iter()
        .enumerate()
        .map(|(j, v)| (j + 1) as f64 * v)
        .sum();
    weighted / divisor
}
