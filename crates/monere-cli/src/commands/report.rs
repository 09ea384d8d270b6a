use monere_alert::report::{
    doubles_and_halves, format_double_half_line, format_last_at, format_latest_line, last_at,
    latest_quotes, DOUBLE_HALF_HEADER, LATEST_HEADER,
};
use monere_core::Symbol;
use serde_json::json;

use crate::cli::{LastAtArgs, ReportArgs, ReportCommand};
use crate::error::CliError;

use super::{CommandContext, CommandResult};

pub fn run(args: &ReportArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let warehouse = context.open_warehouse()?;

    match &args.kind {
        ReportCommand::Latest => {
            let rows = latest_quotes(&warehouse)?;
            let lines = rows.iter().map(format_latest_line).collect::<Vec<_>>();
            Ok(CommandResult::new(serde_json::to_value(&rows)?)
                .with_line(LATEST_HEADER)
                .with_lines(lines))
        }
        ReportCommand::LastAt(LastAtArgs { symbol, price }) => {
            if !price.is_finite() || *price < 0.0 {
                return Err(CliError::Command(format!(
                    "price must be a non-negative number, got {price}"
                )));
            }
            let symbol = Symbol::parse(symbol)?;
            let date = last_at(&warehouse, &symbol, *price)?;
            let data = json!({
                "symbol": symbol,
                "price": price,
                "last_date": date.map(|date| date.to_string()),
            });
            Ok(CommandResult::new(data).with_line(format_last_at(&symbol, *price, date)))
        }
        ReportCommand::DoublesAndHalves => {
            let rows = doubles_and_halves(&warehouse)?;
            let lines = rows.iter().map(format_double_half_line).collect::<Vec<_>>();
            Ok(CommandResult::new(serde_json::to_value(&rows)?)
                .with_line(DOUBLE_HALF_HEADER)
                .with_lines(lines))
        }
    }
}
