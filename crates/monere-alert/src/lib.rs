//! # Monere Alert
//!
//! Evaluates alert rules against the warehouse and writes the alert report.
//!
//! One check runs load rules → range rules → persist and evaluate variability
//! rules → write report. The [`Warehouse`] handle is passed into every step.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`range`] | Range rules over the latest-quote snapshot |
//! | [`variability`] | Windowed percent-change rules over the price series |
//! | [`writer`] | Report line formatting and file output |
//! | [`report`] | `latest`, `last-at` and `doubles-and-halves` reports |

pub mod range;
pub mod report;
pub mod variability;
pub mod writer;

use std::path::{Path, PathBuf};

use monere_core::{CoreError, HistoryMode, RuleSet};
use monere_warehouse::{Warehouse, WarehouseError};
use serde::Serialize;
use thiserror::Error;

pub use range::{evaluate_range_rules, RangeViolation};
pub use variability::{
    compare_window, evaluate_variability_rules, DataGap, GapReason, PricePoint,
    VariabilityFiring, VariabilityOutcome,
};
pub use writer::{write_report, AlertReport};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("failed to load alert rules: {0}")]
    Rules(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] WarehouseError),

    #[error("failed to write alert report '{}': {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Results of evaluating a rule set, before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertOutcome {
    pub range_violations: Vec<RangeViolation>,
    pub variability: VariabilityOutcome,
}

impl AlertOutcome {
    pub fn report(&self) -> AlertReport {
        AlertReport::build(&self.range_violations, &self.variability.firings)
    }
}

/// Counts for one alert check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub report_path: PathBuf,
    pub history_mode: HistoryMode,
    pub range_rules: usize,
    pub variability_rules: usize,
    pub range_alerts: usize,
    pub variability_alerts: usize,
    pub skipped_series: usize,
}

/// Evaluate `rules` without touching the report file.
pub fn check_rules(
    warehouse: &Warehouse,
    rules: &RuleSet,
    mode: HistoryMode,
) -> Result<AlertOutcome, WarehouseError> {
    let range_violations = evaluate_range_rules(warehouse, rules.range_rules())?;
    let variability = evaluate_variability_rules(warehouse, rules.variability_rules(), mode)?;
    Ok(AlertOutcome {
        range_violations,
        variability,
    })
}

/// Load the rule document, evaluate it and write the report to `alerts_path`.
pub fn run_alert_check(
    warehouse: &Warehouse,
    rules_path: &Path,
    alerts_path: &Path,
    mode: HistoryMode,
) -> Result<RunSummary, AlertError> {
    let rules = RuleSet::load(rules_path)?;
    let outcome = check_rules(warehouse, &rules, mode)?;

    let report = outcome.report();
    write_report(alerts_path, &report).map_err(|source| AlertError::Report {
        path: alerts_path.to_path_buf(),
        source,
    })?;

    let summary = RunSummary {
        report_path: alerts_path.to_path_buf(),
        history_mode: mode,
        range_rules: rules.range_rules().len(),
        variability_rules: rules.variability_rules().len(),
        range_alerts: outcome.range_violations.len(),
        variability_alerts: outcome.variability.firings.len(),
        skipped_series: outcome.variability.gaps.len(),
    };
    tracing::info!(
        path = %alerts_path.display(),
        range_alerts = summary.range_alerts,
        variability_alerts = summary.variability_alerts,
        skipped_series = summary.skipped_series,
        "alert check complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monere_warehouse::WarehouseConfig;

    #[test]
    fn missing_rule_file_is_a_rules_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let warehouse = Warehouse::open(WarehouseConfig {
            db_path: temp.path().join("monere.duckdb"),
            max_pool_size: 1,
        })
        .expect("warehouse");

        let error = run_alert_check(
            &warehouse,
            &temp.path().join("missing.json"),
            &temp.path().join("alerts"),
            HistoryMode::Fallback,
        )
        .expect_err("must fail");

        assert!(matches!(error, AlertError::Rules(CoreError::Io { .. })));
        assert!(!temp.path().join("alerts").exists());
    }

    #[test]
    fn empty_rules_write_an_empty_report() {
        let temp = tempfile::tempdir().expect("tempdir");
        let warehouse = Warehouse::open(WarehouseConfig {
            db_path: temp.path().join("monere.duckdb"),
            max_pool_size: 1,
        })
        .expect("warehouse");
        let rules_path = temp.path().join("rules.json");
        std::fs::write(&rules_path, r#"{"range-rules": [], "variability-rules": []}"#)
            .expect("rules");

        let summary = run_alert_check(
            &warehouse,
            &rules_path,
            &temp.path().join("alerts"),
            HistoryMode::Strict,
        )
        .expect("check");

        assert_eq!(summary.range_alerts + summary.variability_alerts, 0);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("alerts")).expect("report"),
            ""
        );
    }
}
