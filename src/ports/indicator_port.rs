//! Indicator computation port.

use crate::domain::error::RuleError;
use crate::domain::indicator::IndicatorValue;

/// Backend that evaluates named indicators over one column.
///
/// Implementations must read only `series[..=at_index]`: the value at a bar
/// may never depend on later bars.
pub trait IndicatorComputer {
    /// Value of indicator `name` at `at_index`.
    ///
    /// Fails with `UnsupportedIndicator` for unknown names, `IndexOutOfRange`
    /// when `at_index >= series.len()` and `InvalidParameter` for bad params.
    fn compute(
        &self,
        name: &str,
        series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError>;

    /// Bars of history an evaluator should require before calling `compute`.
    /// Below this index the evaluator answers `0.0` without computing.
    fn min_history(&self, name: &str, params: &[f64]) -> Result<usize, RuleError>;
}

impl<T: IndicatorComputer + ?Sized> IndicatorComputer for &T {
    fn compute(
        &self,
        name: &str,
        series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError> {
        (**self).compute(name, series, at_index, params)
    }

    fn min_history(&self, name: &str, params: &[f64]) -> Result<usize, RuleError> {
        (**self).min_history(name, params)
    }
}

impl<T: IndicatorComputer + ?Sized> IndicatorComputer for Box<T> {
    fn compute(
        &self,
        name: &str,
        series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError> {
        (**self).compute(name, series, at_index, params)
    }

    fn min_history(&self, name: &str, params: &[f64]) -> Result<usize, RuleError> {
        (**self).min_history(name, params)
    }
}
