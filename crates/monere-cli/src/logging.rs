use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Install the stderr subscriber. `RUST_LOG` wins over `--log-level`.
pub fn init(level: &str) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.to_ascii_lowercase())
            .map_err(|error| CliError::Command(format!("invalid log level '{level}': {error}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| CliError::Command(format!("failed to install logger: {error}")))
}
