//! Rate of Change at a single bar.
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100
//! If C[i-n] == 0: ROC = 0. Fewer than n prior bars: 0.

pub fn roc_at(series: &[f64], at: usize, period: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if at < period {
        return 0.0;
    }
    let prev = history[at - period];
    if prev == 0.0 {
        return 0.0;
    }
    ((history[at] - prev) / prev) * 100.0
}
