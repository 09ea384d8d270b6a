//! Range rules evaluated against the latest-quote snapshot.

use monere_core::RangeRule;
use monere_warehouse::{ToSql, Warehouse, WarehouseError};
use serde::Serialize;

/// A currency whose latest price is outside one of its ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub symbol: String,
    pub name: String,
    pub price: f64,
}

/// Build the OR-ed predicate and its bound values, in rule order.
pub fn range_predicate(rules: &[RangeRule]) -> (String, Vec<RangeBinding<'_>>) {
    let clause = rules
        .iter()
        .map(|_| "(symbol = ? AND price NOT BETWEEN ? AND ?)")
        .collect::<Vec<_>>()
        .join(" OR ");
    let bindings = rules
        .iter()
        .map(|rule| RangeBinding {
            symbol: rule.currency().as_str(),
            low: rule.low(),
            high: rule.high(),
        })
        .collect();
    (clause, bindings)
}

/// Values bound for one rule's predicate term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBinding<'a> {
    pub symbol: &'a str,
    pub low: f64,
    pub high: f64,
}

/// Return every snapshot row violating at least one rule, ordered by symbol.
pub fn evaluate_range_rules(
    warehouse: &Warehouse,
    rules: &[RangeRule],
) -> Result<Vec<RangeViolation>, WarehouseError> {
    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let (clause, bindings) = range_predicate(rules);
    let sql = format!("SELECT symbol, name, price FROM quote_latest WHERE {clause} ORDER BY symbol");
    let params = bindings
        .iter()
        .flat_map(|binding| {
            [
                &binding.symbol as &dyn ToSql,
                &binding.low,
                &binding.high,
            ]
        })
        .collect::<Vec<_>>();

    let violations = warehouse.query_rows(&sql, &params, |row| {
        Ok(RangeViolation {
            symbol: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
        })
    })?;

    tracing::debug!(
        rules = rules.len(),
        violations = violations.len(),
        "evaluated range rules"
    );
    Ok(violations)
}
