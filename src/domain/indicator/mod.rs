//! Technical indicators evaluated at a single bar.
//!
//! This module provides:
//! - `IndicatorValue`: the closed set of result shapes a backend may return
//! - `IndicatorType`: indicator identity + resolved parameters
//! - `TechnicalIndicators`: the built-in `IndicatorComputer`
//!
//! Every `*_at` function reads `series[..=at]` only. Insufficient history
//! yields the indicator's neutral sentinel rather than an error.

pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod wma;

use crate::domain::error::RuleError;
use crate::ports::indicator_port::IndicatorComputer;
use std::fmt;

/// Result of one indicator computation.
///
/// The built-in backend only produces `Scalar`; the other shapes exist for
/// third-party backends and are normalised by [`crate::domain::coerce`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Scalar(f64),
    Missing,
    Flag(bool),
    Text(String),
    Complex { re: f64, im: f64 },
}

impl IndicatorValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            IndicatorValue::Scalar(_) => "float",
            IndicatorValue::Missing => "missing",
            IndicatorValue::Flag(_) => "bool",
            IndicatorValue::Text(_) => "string",
            IndicatorValue::Complex { .. } => "complex",
        }
    }
}

impl From<f64> for IndicatorValue {
    fn from(v: f64) -> Self {
        IndicatorValue::Scalar(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Rsi(usize),
    Roc(usize),
    Stddev(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Resolve a function name and raw numeric parameters.
    pub fn resolve(name: &str, params: &[f64]) -> Result<Self, RuleError> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "sma" => Ok(IndicatorType::Sma(periods(name, params, &[("window", None)])?[0])),
            "ema" => Ok(IndicatorType::Ema(periods(name, params, &[("window", None)])?[0])),
            "wma" => Ok(IndicatorType::Wma(periods(name, params, &[("window", None)])?[0])),
            "stddev" => Ok(IndicatorType::Stddev(
                periods(name, params, &[("window", None)])?[0],
            )),
            "roc" => Ok(IndicatorType::Roc(periods(name, params, &[("period", None)])?[0])),
            "rsi" => Ok(IndicatorType::Rsi(
                periods(name, params, &[("period", Some(rsi::DEFAULT_PERIOD))])?[0],
            )),
            "macd" => {
                let p = periods(
                    name,
                    params,
                    &[
                        ("fast", Some(macd::DEFAULT_FAST)),
                        ("slow", Some(macd::DEFAULT_SLOW)),
                        ("signal", Some(macd::DEFAULT_SIGNAL)),
                    ],
                )?;
                Ok(IndicatorType::Macd {
                    fast: p[0],
                    slow: p[1],
                    signal: p[2],
                })
            }
            _ => Err(RuleError::UnsupportedIndicator {
                name: name.to_string(),
            }),
        }
    }

    /// Bars of history before the evaluator bothers computing.
    pub fn min_history(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Wma(n)
            | IndicatorType::Rsi(n)
            | IndicatorType::Roc(n)
            | IndicatorType::Stddev(n) => n,
            IndicatorType::Macd { fast, slow, signal } => fast.max(slow).max(signal),
        }
    }

    pub fn value_at(&self, series: &[f64], at: usize) -> f64 {
        match *self {
            IndicatorType::Sma(n) => sma::sma_at(series, at, n),
            IndicatorType::Ema(n) => ema::ema_at(series, at, n),
            IndicatorType::Wma(n) => wma::wma_at(series, at, n),
            IndicatorType::Rsi(n) => rsi::rsi_at(series, at, n),
            IndicatorType::Roc(n) => roc::roc_at(series, at, n),
            IndicatorType::Stddev(n) => stddev::stddev_at(series, at, n),
            IndicatorType::Macd { fast, slow, signal } => {
                macd::macd_at(series, at, fast, slow, signal)
            }
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// Validate `params` against `(label, default)` slots. Each value must be a
/// positive whole number; missing slots fall back to their default.
fn periods(
    function: &str,
    params: &[f64],
    slots: &[(&str, Option<usize>)],
) -> Result<Vec<usize>, RuleError> {
    if params.len() > slots.len() {
        return Err(RuleError::invalid_parameter(
            function,
            format!(
                "expected at most {} parameter(s), got {}",
                slots.len(),
                params.len()
            ),
        ));
    }
    slots
        .iter()
        .enumerate()
        .map(|(i, (label, default))| match params.get(i) {
            Some(&value) => whole_period(function, label, value),
            None => default.ok_or_else(|| {
                RuleError::invalid_parameter(function, format!("missing {}", label))
            }),
        })
        .collect()
}

fn whole_period(function: &str, label: &str, value: f64) -> Result<usize, RuleError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RuleError::invalid_parameter(
            function,
            format!("{} must be a positive number, got {}", label, value),
        ));
    }
    if value.fract() != 0.0 {
        return Err(RuleError::invalid_parameter(
            function,
            format!("{} must be a whole number, got {}", label, value),
        ));
    }
    Ok(value as usize)
}

/// Built-in indicator backend. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalIndicators;

impl IndicatorComputer for TechnicalIndicators {
    fn compute(
        &self,
        name: &str,
        series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError> {
        let indicator = IndicatorType::resolve(name, params)?;
        if at_index >= series.len() {
            return Err(RuleError::IndexOutOfRange {
                index: at_index,
                len: series.len(),
            });
        }
        Ok(IndicatorValue::Scalar(indicator.value_at(series, at_index)))
    }

    fn min_history(&self, name: &str, params: &[f64]) -> Result<usize, RuleError> {
        Ok(IndicatorType::resolve(name, params)?.min_history())
    }
}
