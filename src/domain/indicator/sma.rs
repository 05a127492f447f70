//! Simple Moving Average at a single bar.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), skipping NaN cells.
//! Fewer than n bars up to i: 0.0.

pub fn sma_at(series: &[f64], at: usize, window: usize) -> f64 {
    let Some(history) = series.get(..=at) else {
        return f64::NAN;
    };
    if window == 0 || history.len() < window {
        return 0.0;
    }
    let (sum, count) = history[history.len() - window..]
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_is_zero() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(sma_at(&s, 0, 3), 0.0);
        assert_eq!(sma_at(&s, 1, 3), 0.0);
    }

    #[test]
    fn sma_values() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sma_at(&s, 2, 3) - 2.0).abs() < f64::EPSILON);
        assert!((sma_at(&s, 4, 3) - 4.0).abs() < f64::EPSILON);
        assert!((sma_at(&s, 4, 1) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_skips_nan() {
        let s = [2.0, f64::NAN, 4.0];
        assert!((sma_at(&s, 2, 3) - 3.0).abs() < f64::EPSILON);
        assert!(sma_at(&[f64::NAN, f64::NAN], 1, 2).is_nan());
    }

    #[test]
    fn sma_ignores_later_bars() {
        let full = [1.0, 2.0, 3.0, 100.0, 200.0];
        assert_eq!(sma_at(&full, 2, 3), sma_at(&full[..3], 2, 3));
    }
}
