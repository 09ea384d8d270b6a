use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use thiserror::Error;

/// Which list of the rule document an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSection {
    Range,
    Variability,
}

impl RuleSection {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Range => "range-rules",
            Self::Variability => "variability-rules",
        }
    }
}

impl Display for RuleSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Validation and contract errors exposed by `monere-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC: '{value}'")]
    TimestampNotUtc { value: String },

    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,

    #[error("unrecognized duration '{value}', expected <number><day|week|month|year>[s]")]
    InvalidDuration { value: String },

    #[error("rule document is missing the '{section}' list")]
    MissingSection { section: RuleSection },
    #[error("{section}[{index}] is missing required field '{field}'")]
    MissingField {
        section: RuleSection,
        index: usize,
        field: &'static str,
    },
    #[error("low {low} is greater than high {high} for {currency}")]
    InvertedRange {
        currency: String,
        low: f64,
        high: f64,
    },
    #[error("{section}[{index}]: {source}")]
    InvalidRule {
        section: RuleSection,
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("quote provider returned error {code}: {message}")]
    ProviderStatus { code: i64, message: String },
}

impl ValidationError {
    /// Attach the position of the offending rule entry to an inner error.
    pub fn in_rule(self, section: RuleSection, index: usize) -> Self {
        Self::InvalidRule {
            section,
            index,
            source: Box::new(self),
        }
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
