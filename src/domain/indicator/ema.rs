//! Exponential Moving Average at a single bar.
//!
//! Adjusted exponential weighting with span n: alpha = 2/(n+1) and
//! EMA[i] = sum((1-alpha)^k * C[i-k]) / sum((1-alpha)^k) over non-NaN C.
//! Fewer than n bars up to i: 0.0.

pub fn ema_at(series: &[f64], at: usize, span: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if span == 0 || history.len() < span {
        return 0.0;
    }
    ewm_last(history, span)
}

/// Adjusted EWM of every prefix of `values`. NaN until the first real value.
pub fn ewm_series(values: &[f64], span: usize) -> Vec<f64> {
    let decay = decay(span);
    let mut num = 0.0;
    let mut den = 0.0;
    values
        .iter()
        .map(|&v| {
            step(&mut num, &mut den, decay, v);
            ratio(num, den)
        })
        .collect()
}

/// Adjusted EWM of the whole slice, i.e. the last entry of `ewm_series`.
pub fn ewm_last(values: &[f64], span: usize) -> f64 {
    let decay = decay(span);
    let (num, den) = values.iter().fold((0.0, 0.0), |(mut num, mut den), &v| {
        step(&mut num, &mut den, decay, v);
        (num, den)
    });
    ratio(num, den)
}

fn decay(span: usize) -> f64 {
    1.0 - 2.0 / (span as f64 + 1.0)
}

fn step(num: &mut f64, den: &mut f64, decay: f64, v: f64) {
    *num *= decay;
    *den *= decay;
    if !v.is_nan() {
        *num += v;
        *den += 1.0;
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { f64::NAN } else { num / den }
}
