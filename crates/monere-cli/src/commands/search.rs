use monere_core::CurrencyListing;
use serde::Serialize;

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::{CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct SearchData {
    query: String,
    results: Vec<CurrencyListing>,
}

pub fn run(args: &SearchArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let warehouse = context.open_warehouse()?;
    let results = warehouse.search_currencies(query)?;
    if results.is_empty() {
        tracing::info!(query, "no currency matched; ingest a map payload first");
    }

    let lines = results.iter().map(format_listing).collect::<Vec<_>>();
    let data = serde_json::to_value(SearchData {
        query: query.to_owned(),
        results,
    })?;
    Ok(CommandResult::new(data).with_lines(lines))
}

fn format_listing(listing: &CurrencyListing) -> String {
    let rank = listing
        .rank
        .map_or_else(|| String::from("-"), |rank| rank.to_string());
    format!(
        "{:<6} {:<6} {:<10} {:<30} {}",
        listing.id, rank, listing.symbol, listing.name, listing.slug
    )
}
