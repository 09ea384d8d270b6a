use std::path::PathBuf;

use monere_alert::AlertError;
use monere_core::{CoreError, ValidationError};
use monere_warehouse::WarehouseError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] WarehouseError),

    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Storage(_) => 6,
            Self::Io { .. } => 10,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Io { path, source } => Self::Io { path, source },
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Csv(error) => Self::Command(format!("malformed csv: {error}")),
        }
    }
}

impl From<AlertError> for CliError {
    fn from(error: AlertError) -> Self {
        match error {
            AlertError::Rules(error) => error.into(),
            AlertError::Storage(error) => Self::Storage(error),
            AlertError::Report { path, source } => Self::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_file_problems_keep_their_category() {
        let missing = AlertError::Rules(CoreError::Io {
            path: PathBuf::from("alert_rules.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(CliError::from(missing).exit_code(), 10);

        let invalid = AlertError::Rules(CoreError::Validation(ValidationError::InvalidDuration {
            value: String::from("3 fortnights"),
        }));
        assert_eq!(CliError::from(invalid).exit_code(), 2);
    }

    #[test]
    fn storage_failures_exit_with_six() {
        let error = CliError::from(WarehouseError::QueryRejected(String::from("read-only")));
        assert_eq!(error.exit_code(), 6);
    }
}
