use monere_alert::{run_alert_check, RunSummary};
use monere_core::{read_map_file, read_quotes_file, Symbol};
use monere_warehouse::IngestReport;
use serde::Serialize;

use crate::cli::{IngestArgs, IngestCommand, IngestMapArgs, IngestQuotesArgs};
use crate::error::CliError;

use super::alert::summary_line;
use super::{CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct IngestQuotesData {
    ingest: IngestReport,
    alert: Option<RunSummary>,
}

pub fn run(args: &IngestArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    match &args.dataset {
        IngestCommand::Quotes(args) => run_quotes(args, context),
        IngestCommand::Map(args) => run_map(args, context),
    }
}

fn run_quotes(args: &IngestQuotesArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let tracked = context
        .config
        .symbols
        .iter()
        .map(|symbol| Symbol::parse(symbol))
        .collect::<Result<Vec<_>, _>>()?;

    let quotes = read_quotes_file(&args.file, &tracked)?;
    if quotes.is_empty() {
        tracing::warn!(path = %args.file.display(), "payload holds no tracked quotes");
    }

    let warehouse = context.open_warehouse()?;
    let ingest = warehouse.ingest_quotes(&quotes)?;
    let mut lines = vec![ingest_line(&ingest)];

    let alert = if args.no_alert {
        None
    } else {
        let summary = run_alert_check(
            &warehouse,
            &context.config.rules_path(),
            &context.config.alerts_path(),
            context.history_mode(args.strict_history),
        )?;
        lines.push(summary_line(&summary));
        Some(summary)
    };

    let data = serde_json::to_value(IngestQuotesData { ingest, alert })?;
    Ok(CommandResult::new(data).with_lines(lines))
}

fn run_map(args: &IngestMapArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let listings = read_map_file(&args.file)?;
    let warehouse = context.open_warehouse()?;
    let ingest = warehouse.ingest_currency_map(&listings)?;

    let line = ingest_line(&ingest);
    Ok(CommandResult::new(serde_json::to_value(ingest)?).with_line(line))
}

pub(super) fn ingest_line(report: &IngestReport) -> String {
    format!(
        "{}: stored {} of {} rows ({} duplicates dropped)",
        report.dataset,
        report.received.saturating_sub(report.duplicates_removed),
        report.received,
        report.duplicates_removed
    )
}
