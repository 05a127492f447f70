//! Domain error types.

/// A parse error with position information for rule parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Failure of a single rule evaluation.
///
/// Every variant is fatal for the call that produced it. Soft fallbacks
/// (NaN cells, insufficient history) never surface here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("unsupported indicator '{name}'")]
    UnsupportedIndicator { name: String },

    #[error("invalid parameter for {function}: {reason}")]
    InvalidParameter { function: String, reason: String },

    #[error("index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot convert {type_name} to a number ({context})")]
    Conversion { type_name: String, context: String },

    #[error("recursion depth exceeded limit of {limit}")]
    RecursionLimitExceeded { limit: usize },
}

impl RuleError {
    pub(crate) fn invalid_parameter(function: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidParameter {
            function: function.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for tradelang.
#[derive(Debug, thiserror::Error)]
pub enum TradelangError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ParseError> for TradelangError {
    fn from(err: ParseError) -> Self {
        TradelangError::Rule(RuleError::Syntax(err))
    }
}

impl TradelangError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            TradelangError::Io(_) => 1,
            TradelangError::ConfigParse { .. }
            | TradelangError::ConfigMissing { .. }
            | TradelangError::ConfigInvalid { .. } => 2,
            TradelangError::Data { .. } => 3,
            TradelangError::Rule(_) => 4,
        }
    }
}

impl From<&TradelangError> for std::process::ExitCode {
    fn from(err: &TradelangError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
