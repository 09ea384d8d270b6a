use monere_alert::{run_alert_check, RunSummary};

use crate::cli::AlertArgs;
use crate::error::CliError;

use super::{CommandContext, CommandResult};

pub fn run(args: &AlertArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let warehouse = context.open_warehouse()?;
    let summary = run_alert_check(
        &warehouse,
        &context.config.rules_path(),
        &context.config.alerts_path(),
        context.history_mode(args.strict_history),
    )?;

    let line = summary_line(&summary);
    Ok(CommandResult::new(serde_json::to_value(&summary)?).with_line(line))
}

pub(super) fn summary_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "{} range and {} variability alerts written to {}",
        summary.range_alerts,
        summary.variability_alerts,
        summary.report_path.display()
    );
    if summary.skipped_series > 0 {
        line.push_str(&format!(
            " ({} series skipped, {} history)",
            summary.skipped_series, summary.history_mode
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use monere_core::HistoryMode;

    use super::*;

    #[test]
    fn summary_mentions_skipped_series_only_when_present() {
        let mut summary = RunSummary {
            report_path: PathBuf::from("/tmp/alerts"),
            history_mode: HistoryMode::Strict,
            range_rules: 2,
            variability_rules: 1,
            range_alerts: 1,
            variability_alerts: 0,
            skipped_series: 0,
        };
        assert_eq!(
            summary_line(&summary),
            "1 range and 0 variability alerts written to /tmp/alerts"
        );

        summary.skipped_series = 3;
        assert!(summary_line(&summary).ends_with("(3 series skipped, strict history)"));
    }
}
