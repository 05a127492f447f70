//! Configuration validation.
//!
//! Runs before any data is loaded so a typo in a rule fails fast.

use crate::domain::engine_config::EngineConfig;
use crate::domain::error::TradelangError;
use crate::domain::rule_parser::validate_syntax;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), TradelangError> {
    EngineConfig::from_config(config).map(|_| ())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradelangError> {
    required(config, "data", "path").map(|_| ())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradelangError> {
    let entry = required(config, "strategy", "entry")?;
    validate_rule("entry", &entry)?;

    if let Some(exit) = config.get_string("strategy", "exit") {
        if !exit.trim().is_empty() {
            validate_rule("exit", &exit)?;
        }
    }
    Ok(())
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TradelangError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(TradelangError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_rule(key: &str, rule: &str) -> Result<(), TradelangError> {
    let (valid, message) = validate_syntax(rule);
    if valid {
        Ok(())
    } else {
        Err(TradelangError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: message,
        })
    }
}
