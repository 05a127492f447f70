//! Core domain types and logic.

pub mod coerce;
pub mod config_validation;
pub mod dataset;
pub mod engine_config;
pub mod error;
pub mod indicator;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod scan;
pub mod strategy;
