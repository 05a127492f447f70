//! Conversion of indicator results to plain floats.

use crate::domain::error::RuleError;
use crate::domain::indicator::IndicatorValue;

/// Coerce `value` to `f64`. `context` names the expression that produced it
/// and is carried into any `Conversion` error.
///
/// NaN and `Missing` become `0.0`; flags become `0.0`/`1.0`; text must parse
/// as a number; complex values never convert.
pub fn to_f64(value: IndicatorValue, context: &str) -> Result<f64, RuleError> {
    match value {
        IndicatorValue::Scalar(v) => Ok(nan_to_zero(v)),
        IndicatorValue::Missing => Ok(0.0),
        IndicatorValue::Flag(b) => Ok(if b { 1.0 } else { 0.0 }),
        IndicatorValue::Text(ref s) => s
            .trim()
            .parse::<f64>()
            .map(nan_to_zero)
            .map_err(|_| conversion(&value, context)),
        IndicatorValue::Complex { .. } => Err(conversion(&value, context)),
    }
}

pub fn nan_to_zero(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v }
}

fn conversion(value: &IndicatorValue, context: &str) -> RuleError {
    RuleError::Conversion {
        type_name: value.type_name().to_string(),
        context: context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_pass_through() {
        assert_eq!(to_f64(IndicatorValue::Scalar(1.5), "x").unwrap(), 1.5);
        assert_eq!(
            to_f64(IndicatorValue::Scalar(f64::INFINITY), "x").unwrap(),
            f64::INFINITY
        );
    }

    #[test]
    fn nan_and_missing_become_zero() {
        assert_eq!(to_f64(IndicatorValue::Scalar(f64::NAN), "x").unwrap(), 0.0);
        assert_eq!(to_f64(IndicatorValue::Missing, "x").unwrap(), 0.0);
    }

    #[test]
    fn flags_become_zero_or_one() {
        assert_eq!(to_f64(IndicatorValue::Flag(true), "x").unwrap(), 1.0);
        assert_eq!(to_f64(IndicatorValue::Flag(false), "x").unwrap(), 0.0);
    }

    #[test]
    fn numeric_text_parses() {
        assert_eq!(
            to_f64(IndicatorValue::Text(" 42.5 ".into()), "x").unwrap(),
            42.5
        );
        assert_eq!(to_f64(IndicatorValue::Text("nan".into()), "x").unwrap(), 0.0);
    }

    #[test]
    fn garbage_text_fails_with_context() {
        let err = to_f64(IndicatorValue::Text("high".into()), "SMA(close,5)").unwrap_err();
        assert_eq!(
            err,
            RuleError::Conversion {
                type_name: "string".into(),
                context: "SMA(close,5)".into(),
            }
        );
    }

    #[test]
    fn complex_fails() {
        let err = to_f64(IndicatorValue::Complex { re: 1.0, im: 0.0 }, "FFT(close)").unwrap_err();
        assert!(err.to_string().contains("complex"));
        assert!(err.to_string().contains("FFT(close)"));
    }
}
