#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io::Write;
use tradelang::domain::dataset::Dataset;
use tradelang::domain::error::RuleError;
use tradelang::domain::indicator::{IndicatorValue, TechnicalIndicators};
use tradelang::ports::indicator_port::IndicatorComputer;

/// Single `close` column.
pub fn closes(values: &[f64]) -> Dataset {
    Dataset::from_columns([("close", values.to_vec())]).unwrap()
}

/// `close = [start, start + step, ...]`, `len` bars.
pub fn close_ramp(start: f64, step: f64, len: usize) -> Dataset {
    closes(&(0..len).map(|i| start + step * i as f64).collect::<Vec<_>>())
}

pub fn ohlcv(len: usize) -> Dataset {
    let close: Vec<f64> = (0..len).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
    Dataset::from_columns([
        ("open", close.iter().map(|c| c - 0.5).collect::<Vec<_>>()),
        ("high", close.iter().map(|c| c + 1.0).collect()),
        ("low", close.iter().map(|c| c - 1.0).collect()),
        ("close", close.clone()),
        ("volume", (0..len).map(|i| 1000.0 + i as f64).collect()),
    ])
    .unwrap()
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Wraps the built-in indicators and counts `compute` calls.
#[derive(Default)]
pub struct CountingComputer {
    pub computes: Cell<usize>,
    pub min_history_calls: Cell<usize>,
}

impl CountingComputer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndicatorComputer for CountingComputer {
    fn compute(
        &self,
        name: &str,
        series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError> {
        self.computes.set(self.computes.get() + 1);
        TechnicalIndicators.compute(name, series, at_index, params)
    }

    fn min_history(&self, name: &str, params: &[f64]) -> Result<usize, RuleError> {
        self.min_history_calls.set(self.min_history_calls.get() + 1);
        TechnicalIndicators.min_history(name, params)
    }
}

/// Backend that answers every call with a fixed value and records what it saw.
pub struct FixedComputer {
    pub value: IndicatorValue,
    pub min_history: usize,
    pub seen: RefCell<Vec<(String, usize, Vec<f64>)>>,
}

impl FixedComputer {
    pub fn new(value: IndicatorValue) -> Self {
        Self {
            value,
            min_history: 0,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl IndicatorComputer for FixedComputer {
    fn compute(
        &self,
        name: &str,
        _series: &[f64],
        at_index: usize,
        params: &[f64],
    ) -> Result<IndicatorValue, RuleError> {
        self.seen
            .borrow_mut()
            .push((name.to_string(), at_index, params.to_vec()));
        Ok(self.value.clone())
    }

    fn min_history(&self, _name: &str, _params: &[f64]) -> Result<usize, RuleError> {
        Ok(self.min_history)
    }
}
