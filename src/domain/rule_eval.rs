//! Rule evaluation engine.
//!
//! An [`Evaluator`] is bound to one [`Dataset`] and one [`IndicatorComputer`]
//! and answers "what does this rule say at bar `i`?".
//!
//! # Evaluation Semantics
//!
//! - Variables read the named column at the current bar; NaN cells read as `0.0`
//! - Arithmetic uses plain `f64` operations, so `x / 0` yields `inf` or `NaN`
//! - Comparisons are exact; booleans promote to `1.0`/`0.0` in arithmetic
//! - `and`/`or`/`not` evaluate every operand, then combine; any non-zero
//!   number is true
//! - `REF(expr, n)`: `expr` evaluated at `clamp(i - n, 0, len - 1)`
//! - Any other call is an indicator: `NAME(column, params...)`. Below the
//!   backend's minimum history the call yields `0.0` without computing
//!
//! The evaluation index is passed down explicitly, so a failing `REF` needs
//! no restore step. Every call node counts one level of recursion depth; the
//! counter is decremented on every exit path and is zero between calls.
//!
//! Evaluators hold mutable caches and are meant for one scan loop on one
//! thread. Run parallel scans with one evaluator each.

use crate::domain::coerce::{self, nan_to_zero};
use crate::domain::dataset::Dataset;
use crate::domain::engine_config::EngineConfig;
use crate::domain::error::RuleError;
use crate::domain::indicator::IndicatorValue;
use crate::domain::rule::{ArithOp, CompareOp, Expr, Literal, LogicalOp, REF};
use crate::domain::rule_parser;
use crate::ports::indicator_port::IndicatorComputer;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// How the final value of a rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Coerce to a boolean verdict.
    Rule,
    /// Return the raw number.
    Ref,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Signal(bool),
    Value(f64),
}

impl Outcome {
    pub fn as_bool(&self) -> bool {
        match *self {
            Outcome::Signal(b) => b,
            Outcome::Value(v) => v != 0.0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Outcome::Signal(b) => bool_to_f64(b),
            Outcome::Value(v) => v,
        }
    }
}

/// Value-cache counters. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Indicator {
        function: String,
        column: String,
        params: Vec<u64>,
        index: usize,
    },
    Lookback {
        expr: String,
        period: usize,
        index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Num(f64),
    Bool(bool),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Value::Num(v) => v,
            Value::Bool(b) => bool_to_f64(b),
        }
    }

    fn truthy(self) -> bool {
        match self {
            Value::Num(v) => v != 0.0,
            Value::Bool(b) => b,
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

pub struct Evaluator<'a, C: IndicatorComputer> {
    dataset: &'a Dataset,
    computer: C,
    config: EngineConfig,
    ast_cache: HashMap<String, Rc<Expr>>,
    value_cache: HashMap<ValueKey, f64>,
    series_cache: HashMap<String, Rc<[f64]>>,
    depth: usize,
    stats: CacheStats,
}

impl<'a, C: IndicatorComputer> Evaluator<'a, C> {
    pub fn new(dataset: &'a Dataset, computer: C) -> Self {
        Self::with_config(dataset, computer, EngineConfig::default())
    }

    pub fn with_config(dataset: &'a Dataset, computer: C, config: EngineConfig) -> Self {
        Self {
            dataset,
            computer,
            config,
            ast_cache: HashMap::new(),
            value_cache: HashMap::new(),
            series_cache: HashMap::new(),
            depth: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `rule` at bar `index`.
    ///
    /// An empty rule is `Signal(false)` / `Value(0.0)`. Any other failure,
    /// including `index >= len`, is returned as a [`RuleError`].
    pub fn evaluate(
        &mut self,
        rule: &str,
        index: usize,
        mode: EvalMode,
    ) -> Result<Outcome, RuleError> {
        self.depth = 0;
        if rule.trim().is_empty() {
            return Ok(match mode {
                EvalMode::Rule => Outcome::Signal(false),
                EvalMode::Ref => Outcome::Value(0.0),
            });
        }
        self.check_index(index)?;
        let expr = self.ast(rule)?;
        let value = self.eval(&expr, index)?;
        let outcome = match mode {
            EvalMode::Rule => Outcome::Signal(value.truthy()),
            EvalMode::Ref => Outcome::Value(value.as_f64()),
        };
        debug!(rule, index, ?outcome, "rule evaluated");
        Ok(outcome)
    }

    /// Boolean verdict of `rule` at bar `index`.
    pub fn evaluate_at(&mut self, rule: &str, index: usize) -> Result<bool, RuleError> {
        self.evaluate(rule, index, EvalMode::Rule).map(|o| o.as_bool())
    }

    /// Raw numeric value of `rule` at bar `index`.
    pub fn value_at(&mut self, rule: &str, index: usize) -> Result<f64, RuleError> {
        self.evaluate(rule, index, EvalMode::Ref).map(|o| o.as_f64())
    }

    /// Numeric value of `rule` at every bar, cached by normalised expression.
    pub fn series(&mut self, rule: &str) -> Result<Rc<[f64]>, RuleError> {
        if rule.trim().is_empty() {
            return Ok(vec![0.0; self.dataset.len()].into());
        }
        let expr = self.ast(rule)?;
        let key = expr.to_string();
        if let Some(series) = self.series_cache.get(&key) {
            trace!(expr = %key, "series cache hit");
            return Ok(Rc::clone(series));
        }

        let mut values = Vec::with_capacity(self.dataset.len());
        for index in 0..self.dataset.len() {
            self.depth = 0;
            values.push(self.eval(&expr, index)?.as_f64());
        }
        debug!(expr = %key, len = values.len(), "series materialised");
        let series: Rc<[f64]> = values.into();
        self.series_cache.insert(key, Rc::clone(&series));
        Ok(series)
    }

    /// Drop every cached AST, value and series.
    pub fn clear_cache(&mut self) {
        self.ast_cache.clear();
        self.value_cache.clear();
        self.series_cache.clear();
        debug!("evaluator caches cleared");
    }

    /// Point at a new dataset, keeping caches. Call [`Self::clear_cache`]
    /// as well if rows that were already evaluated have changed.
    pub fn rebind(&mut self, dataset: &'a Dataset) {
        self.dataset = dataset;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Current recursion depth. Zero whenever no evaluation is running.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn check_index(&self, index: usize) -> Result<(), RuleError> {
        if index >= self.dataset.len() {
            return Err(RuleError::IndexOutOfRange {
                index,
                len: self.dataset.len(),
            });
        }
        Ok(())
    }

    fn ast(&mut self, rule: &str) -> Result<Rc<Expr>, RuleError> {
        if let Some(expr) = self.ast_cache.get(rule) {
            return Ok(Rc::clone(expr));
        }
        let expr = Rc::new(rule_parser::parse(rule)?);
        self.ast_cache.insert(rule.to_string(), Rc::clone(&expr));
        Ok(expr)
    }

    fn eval(&mut self, expr: &Expr, index: usize) -> Result<Value, RuleError> {
        match expr {
            Expr::Constant(Literal::Number(v)) => Ok(Value::Num(*v)),
            Expr::Constant(Literal::Bool(b)) => Ok(Value::Bool(*b)),
            Expr::Constant(Literal::Str(s)) => {
                coerce::to_f64(IndicatorValue::Text(s.clone()), "string literal").map(Value::Num)
            }
            Expr::Variable(name) => self.column_value(name, index).map(Value::Num),
            Expr::Arithmetic { op, lhs, rhs } => {
                let l = self.eval(lhs, index)?.as_f64();
                let r = self.eval(rhs, index)?.as_f64();
                Ok(Value::Num(match op {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                }))
            }
            Expr::Comparison { op, lhs, rhs } => {
                let l = self.eval(lhs, index)?.as_f64();
                let r = self.eval(rhs, index)?.as_f64();
                Ok(Value::Bool(match op {
                    CompareOp::Gt => l > r,
                    CompareOp::Lt => l < r,
                    CompareOp::Eq => l == r,
                    CompareOp::Ge => l >= r,
                    CompareOp::Le => l <= r,
                    CompareOp::Ne => l != r,
                }))
            }
            Expr::Logical { op, operands } => {
                let mut truths = Vec::with_capacity(operands.len());
                for operand in operands {
                    truths.push(self.eval(operand, index)?.truthy());
                }
                Ok(Value::Bool(match op {
                    LogicalOp::And => truths.iter().fold(true, |acc, &t| acc && t),
                    LogicalOp::Or => truths.iter().fold(false, |acc, &t| acc || t),
                    LogicalOp::Not => !truths.first().copied().unwrap_or(false),
                }))
            }
            Expr::Call { name, args } => {
                self.enter()?;
                let result = if expr.is_ref_call() {
                    self.lookback(args, index)
                } else {
                    self.indicator(expr, name, args, index)
                };
                self.depth -= 1;
                result.map(Value::Num)
            }
        }
    }

    fn enter(&mut self) -> Result<(), RuleError> {
        if self.depth >= self.config.max_recursion_depth {
            return Err(RuleError::RecursionLimitExceeded {
                limit: self.config.max_recursion_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn column_value(&self, name: &str, index: usize) -> Result<f64, RuleError> {
        let column = self
            .dataset
            .column(name)
            .ok_or_else(|| RuleError::UnknownColumn {
                column: name.to_string(),
            })?;
        let value = column.get(index).copied().ok_or(RuleError::IndexOutOfRange {
            index,
            len: column.len(),
        })?;
        Ok(nan_to_zero(value))
    }

    fn lookback(&mut self, args: &[Expr], index: usize) -> Result<f64, RuleError> {
        let [target_expr, period_expr] = args else {
            return Err(RuleError::invalid_parameter(
                REF,
                format!(
                    "expected 2 arguments (expression, period), got {}",
                    args.len()
                ),
            ));
        };
        let period = self.eval(period_expr, index)?.as_f64();
        if !period.is_finite() || period < 0.0 || period.fract() != 0.0 {
            return Err(RuleError::invalid_parameter(
                REF,
                format!("period must be a non-negative whole number, got {}", period),
            ));
        }
        let period = period as usize;
        let target = index
            .saturating_sub(period)
            .min(self.dataset.len().saturating_sub(1));

        let key = ValueKey::Lookback {
            expr: target_expr.to_string(),
            period,
            index,
        };
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        let value = nan_to_zero(self.eval(target_expr, target)?.as_f64());
        debug!(expr = %target_expr, period, index, target, value, "lookback resolved");
        self.value_cache.insert(key, value);
        Ok(value)
    }

    fn indicator(
        &mut self,
        call: &Expr,
        name: &str,
        args: &[Expr],
        index: usize,
    ) -> Result<f64, RuleError> {
        let Some((column_arg, param_args)) = args.split_first() else {
            return Err(RuleError::invalid_parameter(
                name,
                "expected a column as the first argument",
            ));
        };
        let column = match column_arg {
            Expr::Variable(c) | Expr::Constant(Literal::Str(c)) => c.as_str(),
            other => {
                return Err(RuleError::UnknownColumn {
                    column: other.to_string(),
                });
            }
        };
        let dataset = self.dataset;
        let series = dataset
            .column(column)
            .ok_or_else(|| RuleError::UnknownColumn {
                column: column.to_string(),
            })?;

        let mut params = Vec::with_capacity(param_args.len());
        for (i, arg) in param_args.iter().enumerate() {
            let value = self.eval(arg, index)?.as_f64();
            if value.is_nan() || value <= 0.0 {
                return Err(RuleError::invalid_parameter(
                    name,
                    format!("parameter {} must be a positive number, got {}", i + 1, value),
                ));
            }
            params.push(value);
        }

        let required = self.computer.min_history(name, &params)?;
        if index < required {
            trace!(function = name, index, required, "insufficient history");
            return Ok(0.0);
        }

        let key = ValueKey::Indicator {
            function: name.to_ascii_lowercase(),
            column: column.to_string(),
            params: params.iter().map(|p| p.to_bits()).collect(),
            index,
        };
        if let Some(value) = self.cached(&key) {
            return Ok(value);
        }

        let raw = self.computer.compute(name, series, index, &params)?;
        let value = coerce::to_f64(raw, &format!("return value of {}", call))?;
        debug!(function = name, column, index, value, "indicator computed");
        self.value_cache.insert(key, value);
        Ok(value)
    }

    fn cached(&mut self, key: &ValueKey) -> Option<f64> {
        match self.value_cache.get(key) {
            Some(&value) => {
                self.stats.hits += 1;
                trace!(?key, "value cache hit");
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }
}
