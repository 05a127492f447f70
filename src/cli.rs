//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DATE_COLUMN};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    validate_data_config, validate_engine_config, validate_strategy_config,
};
use crate::domain::dataset::Dataset;
use crate::domain::engine_config::EngineConfig;
use crate::domain::error::TradelangError;
use crate::domain::indicator::TechnicalIndicators;
use crate::domain::rule_eval::{EvalMode, Evaluator, Outcome};
use crate::domain::rule_parser;
use crate::domain::scan::scan;
use crate::domain::strategy::Strategy;
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tradelang", about = "Trading rule parser and evaluator")]
pub struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a rule's syntax without evaluating it
    Validate {
        #[arg(short, long)]
        rule: String,
    },
    /// Evaluate a rule against a CSV file
    Eval {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        rule: String,
        /// Bar to evaluate; every bar when omitted
        #[arg(short, long)]
        index: Option<usize>,
        /// Print the numeric value instead of a verdict
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long, default_value = DEFAULT_DATE_COLUMN)]
        date_column: String,
    },
    /// Run a strategy from an INI file over its data
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides `[data] path`
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(cli.command, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Run one command, writing results to `out`.
pub fn execute(command: Command, out: &mut dyn Write) -> Result<(), TradelangError> {
    match command {
        Command::Validate { rule } => run_validate(&rule, out),
        Command::Eval {
            data,
            rule,
            index,
            raw,
            max_depth,
            date_column,
        } => {
            let config = match max_depth {
                Some(0) => {
                    return Err(TradelangError::ConfigInvalid {
                        section: "engine".to_string(),
                        key: "max_recursion_depth".to_string(),
                        reason: "--max-depth must be at least 1".to_string(),
                    });
                }
                Some(depth) => EngineConfig::with_max_recursion_depth(depth),
                None => EngineConfig::default(),
            };
            let dataset = CsvAdapter::new(date_column).load(&data)?;
            let mode = if raw { EvalMode::Ref } else { EvalMode::Rule };
            run_eval(&dataset, config, &rule, index, mode, out)
        }
        Command::Scan { config, data } => run_scan(&config, data.as_deref(), out),
    }
}

fn run_validate(rule: &str, out: &mut dyn Write) -> Result<(), TradelangError> {
    match rule_parser::parse(rule) {
        Ok(expr) => {
            writeln!(out, "valid: {}", expr)?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{}", e.display_with_context(rule))?;
            Err(e.into())
        }
    }
}

pub fn run_eval(
    dataset: &Dataset,
    config: EngineConfig,
    rule: &str,
    index: Option<usize>,
    mode: EvalMode,
    out: &mut dyn Write,
) -> Result<(), TradelangError> {
    let mut evaluator = Evaluator::with_config(dataset, TechnicalIndicators, config);
    let indices: Vec<usize> = match index {
        Some(i) => vec![i],
        None => (0..dataset.len()).collect(),
    };
    for i in indices {
        let outcome = evaluator.evaluate(rule, i, mode)?;
        let label = bar_label(dataset, i);
        match outcome {
            Outcome::Signal(b) => writeln!(out, "{}\t{}", label, b)?,
            Outcome::Value(v) => writeln!(out, "{}\t{}", label, v)?,
        }
    }
    Ok(())
}

fn run_scan(
    config_path: &Path,
    data_override: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), TradelangError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    validate_engine_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    if data_override.is_none() {
        validate_data_config(&adapter)?;
    }

    let engine = EngineConfig::from_config(&adapter)?;
    let strategy = Strategy::from_config(&adapter)?;
    let data_path = match data_override {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(adapter.get_string_or("data", "path", "")),
    };
    let date_column = adapter.get_string_or("data", "date_column", DEFAULT_DATE_COLUMN);
    let dataset = CsvAdapter::new(date_column).load(&data_path)?;

    let mut evaluator = Evaluator::with_config(&dataset, TechnicalIndicators, engine);
    let signals = scan(&mut evaluator, &strategy)?;

    writeln!(out, "strategy: {} ({} bars)", strategy.name, dataset.len())?;
    for signal in &signals {
        writeln!(out, "{}", signal)?;
    }
    writeln!(out, "{} signal(s)", signals.len())?;
    Ok(())
}

fn bar_label(dataset: &Dataset, index: usize) -> String {
    match dataset.date(index) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => index.to_string(),
    }
}
