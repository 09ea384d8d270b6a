use std::fs;

use monere_core::SAMPLE_RULES;
use serde::Serialize;

use crate::error::CliError;

use super::{CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct InitData {
    home: String,
    config_written: bool,
    rules_written: bool,
    database: String,
}

pub fn run(context: &CommandContext) -> Result<CommandResult, CliError> {
    let config = &context.config;
    let mut lines = Vec::new();

    let config_path = config.config_path();
    let config_written = !config_path.exists();
    if config_written {
        config.save()?;
        lines.push(format!("wrote {}", config_path.display()));
    } else {
        lines.push(format!("kept existing {}", config_path.display()));
    }

    let rules_path = config.rules_path();
    let rules_written = !rules_path.exists();
    if rules_written {
        if let Some(parent) = rules_path.parent() {
            fs::create_dir_all(parent).map_err(|source| CliError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&rules_path, SAMPLE_RULES).map_err(|source| CliError::Io {
            path: rules_path.clone(),
            source,
        })?;
        lines.push(format!("wrote sample rules to {}", rules_path.display()));
    } else {
        lines.push(format!("kept existing {}", rules_path.display()));
    }

    let warehouse = context.open_warehouse()?;
    lines.push(format!("warehouse ready at {}", warehouse.db_path().display()));

    tracing::info!(home = %config.home().display(), config_written, rules_written, "initialized");
    let data = serde_json::to_value(InitData {
        home: config.home().display().to_string(),
        config_written,
        rules_written,
        database: warehouse.db_path().display().to_string(),
    })?;
    Ok(CommandResult::new(data).with_lines(lines))
}
