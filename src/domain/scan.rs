//! Bar-by-bar strategy scan.

use crate::domain::error::RuleError;
use crate::domain::rule_eval::Evaluator;
use crate::domain::strategy::{SignalKind, Strategy};
use crate::ports::indicator_port::IndicatorComputer;
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub kind: SignalKind,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{} {}", date.format("%Y-%m-%d"), self.kind),
            None => write!(f, "#{} {}", self.index, self.kind),
        }
    }
}

/// Evaluate `strategy` at every bar of the evaluator's dataset, in order.
///
/// Both rules are parsed before the first bar, so a malformed exit rule is
/// reported even when entry holds everywhere. The first evaluation error
/// stops the scan; a bad rule would fail the same way at every remaining bar.
pub fn scan<C: IndicatorComputer>(
    evaluator: &mut Evaluator<'_, C>,
    strategy: &Strategy,
) -> Result<Vec<Signal>, RuleError> {
    if let Err(e) = strategy.check_syntax() {
        warn!(strategy = %strategy.name, error = %e, "strategy rejected");
        return Err(e);
    }
    let dataset = evaluator.dataset();
    let mut signals = Vec::new();

    for index in 0..dataset.len() {
        match strategy.signal_at(evaluator, index) {
            Ok(Some(kind)) => signals.push(Signal {
                index,
                date: dataset.date(index),
                kind,
            }),
            Ok(None) => {}
            Err(e) => {
                warn!(strategy = %strategy.name, index, error = %e, "scan stopped");
                return Err(e);
            }
        }
    }

    let stats = evaluator.stats();
    debug!(
        strategy = %strategy.name,
        bars = dataset.len(),
        signals = signals.len(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "scan complete"
    );
    Ok(signals)
}
