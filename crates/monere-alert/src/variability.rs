//! Variability rules: persisted, deduplicated, then compared against each
//! currency's price series over the rule window.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use monere_core::{
    CurrencyFilter, HistoryMode, Symbol, UtcDateTime, VariabilityCriteria, VariabilityRule,
};
use monere_warehouse::{Script, SqlValue, Warehouse, WarehouseError};
use serde::Serialize;
use time::Date;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One observation of a currency's price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub observed_ms: i64,
    pub price: f64,
}

/// A rule as stored in `alert_variability_rule`.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRule {
    pub rule_id: i64,
    pub criteria: VariabilityCriteria,
}

/// Price movement between the window start and the latest observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowChange {
    pub start: PricePoint,
    pub end: PricePoint,
    pub percent_change: f64,
}

/// Why a currency was skipped for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// Fewer than two observations.
    InsufficientHistory,
    /// The window starts at a price of zero.
    ZeroBasePrice,
    /// Strict mode only: no observation reaches back the full window.
    ShortWindow,
}

impl Display for GapReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientHistory => f.write_str("fewer than two observations"),
            Self::ZeroBasePrice => f.write_str("window starts at a zero price"),
            Self::ShortWindow => f.write_str("history does not cover the window"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataGap {
    pub rule_id: i64,
    pub symbol: String,
    pub reason: GapReason,
}

/// A rule that fired for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariabilityFiring {
    pub rule_id: i64,
    pub symbol: String,
    pub start_date: Date,
    pub end_date: Date,
    pub percent_change: f64,
    pub threshold: f64,
    pub duration_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariabilityOutcome {
    pub firings: Vec<VariabilityFiring>,
    pub gaps: Vec<DataGap>,
}

/// Append the rules to `alert_variability_rule` and drop content duplicates.
///
/// Returns the number of duplicate rows removed.
pub fn persist_variability_rules(
    warehouse: &Warehouse,
    rules: &[VariabilityRule],
) -> Result<usize, WarehouseError> {
    let rows = rules
        .iter()
        .map(|rule| {
            let symbol = match rule.currency() {
                CurrencyFilter::Exact(symbol) => SqlValue::Text(symbol.to_string()),
                CurrencyFilter::All => SqlValue::Null,
            };
            vec![
                symbol,
                SqlValue::Double(rule.percent_change()),
                SqlValue::Double(rule.duration_days()),
            ]
        })
        .collect::<Vec<_>>();

    warehouse.bulk_insert(
        "alert_variability_rule",
        &["symbol", "percent_change", "duration_days"],
        &rows,
    )?;
    let removed = warehouse.execute_script(Script::DedupeVariabilityRules)?;
    tracing::debug!(submitted = rules.len(), removed, "persisted variability rules");
    Ok(removed)
}

/// Every persisted rule in insertion order.
pub fn load_persisted_rules(warehouse: &Warehouse) -> Result<Vec<PersistedRule>, WarehouseError> {
    let rows = warehouse.query_rows(
        "SELECT rule_id, symbol, percent_change, duration_days FROM alert_variability_rule ORDER BY rule_id",
        &[],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        },
    )?;

    rows.into_iter()
        .map(
            |(rule_id, symbol, percent_change, duration_days)| -> Result<_, WarehouseError> {
                Ok(PersistedRule {
                    rule_id,
                    criteria: VariabilityCriteria {
                        currency: CurrencyFilter::from_optional(symbol.as_deref())?,
                        percent_change,
                        duration_days,
                    },
                })
            },
        )
        .collect()
}

/// The price series of every tracked currency, oldest observation first.
pub fn load_price_series(
    warehouse: &Warehouse,
) -> Result<BTreeMap<Symbol, Vec<PricePoint>>, WarehouseError> {
    let rows = warehouse.query_rows(
        r#"
SELECT symbol, epoch_ms(observed_at) AS observed_ms, price
FROM vw_price_series
ORDER BY symbol, observed_at, origin
"#,
        &[],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                PricePoint {
                    observed_ms: row.get(1)?,
                    price: row.get(2)?,
                },
            ))
        },
    )?;

    let mut series: BTreeMap<Symbol, Vec<PricePoint>> = BTreeMap::new();
    for (symbol, point) in rows {
        series.entry(Symbol::parse(&symbol)?).or_default().push(point);
    }
    Ok(series)
}

/// Compare the latest point with the most recent point at least `duration_days` older.
///
/// In fallback mode a series that does not reach back that far is compared
/// against its earliest point instead.
pub fn compare_window(
    points: &[PricePoint],
    duration_days: f64,
    mode: HistoryMode,
) -> Result<WindowChange, GapReason> {
    let [earlier @ .., end] = points else {
        return Err(GapReason::InsufficientHistory);
    };
    let Some(first) = earlier.first() else {
        return Err(GapReason::InsufficientHistory);
    };

    let cutoff = end
        .observed_ms
        .saturating_sub((duration_days * MILLIS_PER_DAY).round() as i64);
    let start = match earlier.iter().rev().find(|point| point.observed_ms <= cutoff) {
        Some(point) => point,
        None => match mode {
            HistoryMode::Fallback => first,
            HistoryMode::Strict => return Err(GapReason::ShortWindow),
        },
    };

    if start.price == 0.0 {
        return Err(GapReason::ZeroBasePrice);
    }

    Ok(WindowChange {
        start: *start,
        end: *end,
        percent_change: (end.price - start.price) / start.price * 100.0,
    })
}

/// Persist `rules`, then evaluate every persisted rule against the price series.
///
/// Firings are ordered by rule persistence order, then symbol.
pub fn evaluate_variability_rules(
    warehouse: &Warehouse,
    rules: &[VariabilityRule],
    mode: HistoryMode,
) -> Result<VariabilityOutcome, WarehouseError> {
    if !rules.is_empty() {
        persist_variability_rules(warehouse, rules)?;
    }
    let persisted = load_persisted_rules(warehouse)?;
    if persisted.is_empty() {
        return Ok(VariabilityOutcome::default());
    }

    let series = load_price_series(warehouse)?;
    let mut outcome = VariabilityOutcome::default();

    for rule in &persisted {
        let criteria = &rule.criteria;
        if let CurrencyFilter::Exact(symbol) = &criteria.currency {
            if !series.contains_key(symbol) {
                record_gap(&mut outcome, rule.rule_id, symbol, GapReason::InsufficientHistory);
                continue;
            }
        }

        for (symbol, points) in series
            .iter()
            .filter(|(symbol, _)| criteria.currency.matches(symbol))
        {
            match compare_window(points, criteria.duration_days, mode) {
                Ok(change) if criteria.fires(change.percent_change) => {
                    tracing::debug!(
                        rule_id = rule.rule_id,
                        symbol = %symbol,
                        percent_change = change.percent_change,
                        "variability rule fired"
                    );
                    outcome.firings.push(VariabilityFiring {
                        rule_id: rule.rule_id,
                        symbol: symbol.to_string(),
                        start_date: UtcDateTime::from_unix_millis(change.start.observed_ms)?
                            .date(),
                        end_date: UtcDateTime::from_unix_millis(change.end.observed_ms)?.date(),
                        percent_change: change.percent_change,
                        threshold: criteria.percent_change,
                        duration_days: criteria.duration_days,
                    });
                }
                Ok(_) => {}
                Err(reason) => record_gap(&mut outcome, rule.rule_id, symbol, reason),
            }
        }
    }

    tracing::debug!(
        rules = persisted.len(),
        firings = outcome.firings.len(),
        gaps = outcome.gaps.len(),
        "evaluated variability rules"
    );
    Ok(outcome)
}

fn record_gap(outcome: &mut VariabilityOutcome, rule_id: i64, symbol: &Symbol, reason: GapReason) {
    tracing::debug!(rule_id, symbol = %symbol, reason = %reason, "skipping series");
    outcome.gaps.push(DataGap {
        rule_id,
        symbol: symbol.to_string(),
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn point(day: i64, price: f64) -> PricePoint {
        PricePoint {
            observed_ms: day * DAY_MS,
            price,
        }
    }

    #[test]
    fn compares_latest_with_point_at_window_start() {
        let points = [point(0, 100.0), point(15, 120.0), point(30, 130.0)];
        let change = compare_window(&points, 30.0, HistoryMode::Fallback).expect("change");

        assert_eq!(change.start, point(0, 100.0));
        assert_eq!(change.end, point(30, 130.0));
        assert!((change.percent_change - 30.0).abs() < 1e-9);
    }

    #[test]
    fn picks_most_recent_point_before_cutoff() {
        let points = [point(0, 50.0), point(10, 100.0), point(25, 110.0), point(30, 90.0)];
        let change = compare_window(&points, 7.0, HistoryMode::Fallback).expect("change");
        assert_eq!(change.start, point(10, 100.0));
        assert!((change.percent_change + 10.0).abs() < 1e-9);
    }

    #[test]
    fn short_series_falls_back_to_earliest_point() {
        let points = [point(20, 100.0), point(30, 150.0)];
        let change = compare_window(&points, 30.0, HistoryMode::Fallback).expect("change");
        assert_eq!(change.start, point(20, 100.0));
    }

    #[test]
    fn strict_mode_reports_short_window() {
        let points = [point(20, 100.0), point(30, 150.0)];
        assert_eq!(
            compare_window(&points, 30.0, HistoryMode::Strict),
            Err(GapReason::ShortWindow)
        );
    }

    #[test]
    fn single_observation_is_a_gap() {
        assert_eq!(
            compare_window(&[point(0, 1.0)], 1.0, HistoryMode::Fallback),
            Err(GapReason::InsufficientHistory)
        );
        assert_eq!(
            compare_window(&[], 1.0, HistoryMode::Fallback),
            Err(GapReason::InsufficientHistory)
        );
    }

    #[test]
    fn huge_window_before_epoch_falls_back_without_overflow() {
        let points = [point(-10, 100.0), point(-5, 120.0)];
        let change = compare_window(&points, 1e300, HistoryMode::Fallback).expect("change");
        assert_eq!(change.start, point(-10, 100.0));
        assert_eq!(
            compare_window(&points, 1e300, HistoryMode::Strict),
            Err(GapReason::ShortWindow)
        );
    }

    #[test]
    fn zero_base_price_is_a_gap() {
        let points = [point(0, 0.0), point(30, 10.0)];
        assert_eq!(
            compare_window(&points, 30.0, HistoryMode::Fallback),
            Err(GapReason::ZeroBasePrice)
        );
    }
}
