//! Typed evaluator settings read from the `[engine]` section.

use crate::domain::error::TradelangError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Ceiling on nested function calls (REF included) within one evaluation.
    pub max_recursion_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn with_max_recursion_depth(max_recursion_depth: usize) -> Self {
        Self {
            max_recursion_depth,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradelangError> {
        let depth = config.get_int(
            "engine",
            "max_recursion_depth",
            DEFAULT_MAX_RECURSION_DEPTH as i64,
        );
        if depth < 1 {
            return Err(TradelangError::ConfigInvalid {
                section: "engine".to_string(),
                key: "max_recursion_depth".to_string(),
                reason: format!("max_recursion_depth must be at least 1, got {}", depth),
            });
        }
        Ok(Self {
            max_recursion_depth: depth as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn defaults_without_section() {
        let config = FileConfigAdapter::from_string("[data]\npath = x.csv\n").unwrap();
        assert_eq!(
            EngineConfig::from_config(&config).unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn reads_depth() {
        let config =
            FileConfigAdapter::from_string("[engine]\nmax_recursion_depth = 12\n").unwrap();
        assert_eq!(
            EngineConfig::from_config(&config)
                .unwrap()
                .max_recursion_depth,
            12
        );
    }

    #[test]
    fn rejects_zero_depth() {
        let config =
            FileConfigAdapter::from_string("[engine]\nmax_recursion_depth = 0\n").unwrap();
        assert!(matches!(
            EngineConfig::from_config(&config),
            Err(TradelangError::ConfigInvalid { .. })
        ));
    }
}
