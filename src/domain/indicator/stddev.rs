//! Population standard deviation over a trailing window.
//!
//! StdDev(n)[i] = sqrt(sum((C[j] - mean)^2) / n) for j in i-n+1..=i.
//! Fewer than n bars up to i: 0.0.

pub fn stddev_at(series: &[f64], at: usize, window: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if window == 0 || history.len() < window {
        return 0.0;
    }
    let slice = &history[history.len() - window..];
    let n = window as f64;
    let mean = slice.iter().sum::<f64>() / n;
    let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
