use monere_core::{read_history_file, Symbol};

use crate::cli::LoadHistoricArgs;
use crate::error::CliError;

use super::ingest::ingest_line;
use super::{CommandContext, CommandResult};

pub fn run(args: &LoadHistoricArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let bars = read_history_file(&args.file, &symbol)?;
    if bars.is_empty() {
        return Err(CliError::Command(format!(
            "'{}' holds no historical rows",
            args.file.display()
        )));
    }

    let warehouse = context.open_warehouse()?;
    let ingest = warehouse.ingest_history(&bars)?;

    let line = format!("{symbol} {}", ingest_line(&ingest));
    Ok(CommandResult::new(serde_json::to_value(ingest)?).with_line(line))
}
