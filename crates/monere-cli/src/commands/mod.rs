mod alert;
mod history;
mod ingest;
mod init;
mod report;
mod search;

use monere_core::{Config, HistoryMode};
use monere_warehouse::{Warehouse, WarehouseConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Machine-readable payload plus the lines printed in text mode.
pub struct CommandResult {
    pub data: Value,
    pub lines: Vec<String>,
}

impl CommandResult {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.lines.extend(lines);
        self
    }
}

/// Settings shared by every command.
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    fn load(cli: &Cli) -> Result<Self, CliError> {
        let config = match &cli.home {
            Some(home) => Config::load(home)?,
            None => Config::load_default()?,
        };
        Ok(Self { config })
    }

    pub fn open_warehouse(&self) -> Result<Warehouse, CliError> {
        Ok(Warehouse::open(WarehouseConfig::from(&self.config))?)
    }

    pub fn history_mode(&self, strict_history: bool) -> HistoryMode {
        if strict_history {
            HistoryMode::Strict
        } else {
            self.config.history_mode
        }
    }
}

pub fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let context = CommandContext::load(cli)?;

    match &cli.command {
        Command::Init => init::run(&context),
        Command::Ingest(args) => ingest::run(args, &context),
        Command::LoadHistoric(args) => history::run(args, &context),
        Command::Search(args) => search::run(args, &context),
        Command::Alert(args) => alert::run(args, &context),
        Command::Report(args) => report::run(args, &context),
    }
}
