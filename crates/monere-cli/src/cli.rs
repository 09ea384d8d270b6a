//! Command-line argument definitions for `monere`.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Write the default config and a sample rule file |
//! | `ingest quotes` | Store a cached quotes payload, then run the alert check |
//! | `ingest map` | Store a cached currency id map |
//! | `load-historic` | Import a historical CSV export for one symbol |
//! | `search` | Look up currencies in the stored id map |
//! | `alert` | Evaluate the rule file and rewrite the alert report |
//! | `report` | Print `latest`, `last-at` or `doubles-and-halves` |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "monere",
    version,
    about = "Track cryptocurrency quotes and raise price alerts"
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(short = 'L', long, global = true, default_value = "info")]
    pub log_level: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Monere home directory (defaults to MONERE_HOME, then ~/.config/monere).
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the default config and a sample alert rule file if they are absent.
    Init,

    /// Store a cached provider payload.
    Ingest(IngestArgs),

    /// Import a historical CSV export for one symbol.
    ///
    /// # Examples
    ///
    ///   monere load-historic XMR xmr_history.csv
    LoadHistoric(LoadHistoricArgs),

    /// Search the stored currency id map by symbol, name or slug.
    Search(SearchArgs),

    /// Evaluate the alert rules and rewrite the alert report.
    Alert(AlertArgs),

    /// Print a report over the stored quotes and history.
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(subcommand)]
    pub dataset: IngestCommand,
}

#[derive(Debug, Subcommand)]
pub enum IngestCommand {
    /// A `quotes/latest` response saved to disk.
    ///
    /// # Examples
    ///
    ///   monere ingest quotes latest.json
    ///   monere ingest quotes latest.json --no-alert
    Quotes(IngestQuotesArgs),

    /// A `map` response saved to disk.
    Map(IngestMapArgs),
}

#[derive(Debug, Args)]
pub struct IngestQuotesArgs {
    /// Path of the JSON payload.
    pub file: PathBuf,

    /// Skip the alert check after storing the quotes.
    #[arg(long, default_value_t = false)]
    pub no_alert: bool,

    /// Require the full window of history for variability rules.
    #[arg(long, default_value_t = false)]
    pub strict_history: bool,
}

#[derive(Debug, Args)]
pub struct IngestMapArgs {
    /// Path of the JSON payload.
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct LoadHistoricArgs {
    /// Symbol the export belongs to.
    pub symbol: String,

    /// Path of the CSV export.
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive substring of the symbol, name or slug.
    pub query: String,
}

#[derive(Debug, Args)]
pub struct AlertArgs {
    /// Require the full window of history for variability rules.
    ///
    /// Series that do not reach back the whole duration are skipped instead
    /// of being compared against their earliest observation.
    #[arg(long, default_value_t = false)]
    pub strict_history: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub kind: ReportCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Newest quote of every tracked currency.
    Latest,

    /// Most recent date a currency traded at a price.
    ///
    /// # Examples
    ///
    ///   monere report last-at BTC 20000
    LastAt(LastAtArgs),

    /// Last dates each currency traded at double and at half its price.
    DoublesAndHalves,
}

#[derive(Debug, Args)]
pub struct LastAtArgs {
    pub symbol: String,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_ingest_command() {
        let cli = Cli::try_parse_from(["monere", "ingest", "quotes", "latest.json", "--no-alert"])
            .expect("parse");
        match cli.command {
            Command::Ingest(IngestArgs {
                dataset: IngestCommand::Quotes(args),
            }) => {
                assert_eq!(args.file, PathBuf::from("latest.json"));
                assert!(args.no_alert);
                assert!(!args.strict_history);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "monere",
            "report",
            "last-at",
            "XMR",
            "150.5",
            "--format",
            "json",
            "-L",
            "debug",
        ])
        .expect("parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Command::Report(ReportArgs {
                kind: ReportCommand::LastAt(args),
            }) => {
                assert_eq!(args.symbol, "XMR");
                assert_eq!(args.price, 150.5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["monere", "alert", "--format", "yaml"]).is_err());
    }
}
