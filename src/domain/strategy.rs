//! Entry/exit rule pair.

use crate::domain::config_validation::validate_strategy_config;
use crate::domain::error::{RuleError, TradelangError};
use crate::domain::rule_eval::Evaluator;
use crate::domain::rule_parser;
use crate::ports::config_port::ConfigPort;
use crate::ports::indicator_port::IndicatorComputer;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Buy,
    Sell,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => f.write_str("BUY"),
            SignalKind::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub entry: String,
    pub exit: Option<String>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            exit: None,
        }
    }

    pub fn with_exit(mut self, exit: impl Into<String>) -> Self {
        self.exit = Some(exit.into());
        self
    }

    /// Build from the `[strategy]` section. Both rules are syntax-checked.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradelangError> {
        validate_strategy_config(config)?;
        let name = config.get_string_or("strategy", "name", "unnamed");
        let entry = config.get_string_or("strategy", "entry", "");
        let exit = config
            .get_string("strategy", "exit")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self { name, entry, exit })
    }

    /// Parse both rules without evaluating them. A blank rule never fires
    /// and is accepted, as it is by the evaluator.
    pub fn check_syntax(&self) -> Result<(), RuleError> {
        for rule in std::iter::once(&self.entry).chain(&self.exit) {
            if !rule.trim().is_empty() {
                rule_parser::parse(rule)?;
            }
        }
        Ok(())
    }

    /// Signal at bar `index`. The entry rule is checked first and wins; the
    /// exit rule is only evaluated when entry does not hold.
    pub fn signal_at<C: IndicatorComputer>(
        &self,
        evaluator: &mut Evaluator<'_, C>,
        index: usize,
    ) -> Result<Option<SignalKind>, RuleError> {
        if evaluator.evaluate_at(&self.entry, index)? {
            return Ok(Some(SignalKind::Buy));
        }
        if let Some(exit) = &self.exit {
            if evaluator.evaluate_at(exit, index)? {
                return Ok(Some(SignalKind::Sell));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::dataset::Dataset;
    use crate::domain::indicator::TechnicalIndicators;

    #[test]
    fn from_config_reads_rules() {
        let config = FileConfigAdapter::from_string(
            "[strategy]\nname = Dip\nentry = close < 3\nexit = close > 8\n",
        )
        .unwrap();
        let s = Strategy::from_config(&config).unwrap();
        assert_eq!(s, Strategy::new("Dip", "close < 3").with_exit("close > 8"));
    }

    #[test]
    fn from_config_defaults_name_and_exit() {
        let config = FileConfigAdapter::from_string("[strategy]\nentry = close < 3\n").unwrap();
        let s = Strategy::from_config(&config).unwrap();
        assert_eq!(s.name, "unnamed");
        assert_eq!(s.exit, None);
    }

    #[test]
    fn check_syntax_reports_bad_exit() {
        let s = Strategy::new("x", "close > 1").with_exit("close >");
        assert!(matches!(s.check_syntax(), Err(RuleError::Syntax(_))));
        assert!(Strategy::new("x", "close > 1").with_exit(" ").check_syntax().is_ok());
    }

    #[test]
    fn entry_wins_over_exit() {
        let ds = Dataset::from_columns([("close", vec![5.0])]).unwrap();
        let mut ev = Evaluator::new(&ds, TechnicalIndicators);
        let s = Strategy::new("both", "close > 1").with_exit("close > 2");
        assert_eq!(s.signal_at(&mut ev, 0).unwrap(), Some(SignalKind::Buy));
    }

    #[test]
    fn exit_fires_when_entry_does_not() {
        let ds = Dataset::from_columns([("close", vec![5.0])]).unwrap();
        let mut ev = Evaluator::new(&ds, TechnicalIndicators);
        let s = Strategy::new("exit", "close > 10").with_exit("close > 2");
        assert_eq!(s.signal_at(&mut ev, 0).unwrap(), Some(SignalKind::Sell));
        let s = Strategy::new("none", "close > 10");
        assert_eq!(s.signal_at(&mut ev, 0).unwrap(), None);
    }

    #[test]
    fn signal_kind_display() {
        assert_eq!(SignalKind::Buy.to_string(), "BUY");
        assert_eq!(SignalKind::Sell.to_string(), "SELL");
    }
}
