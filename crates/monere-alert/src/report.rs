//! Text reports over the stored quotes and history.

use monere_core::{parse_date, Symbol, UtcDateTime};
use monere_warehouse::{timestamp_column, Warehouse, WarehouseError};
use serde::Serialize;
use time::Date;

/// One row of the `latest` report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestQuoteRow {
    pub last_updated: UtcDateTime,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub percent_change_30d: Option<f64>,
    pub percent_change_60d: Option<f64>,
    pub percent_change_90d: Option<f64>,
    pub volume_change_24h: Option<f64>,
}

/// One row of the `doubles-and-halves` report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoubleHalfRow {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub last_double: Option<Date>,
    pub last_half: Option<Date>,
    pub last_updated: UtcDateTime,
}

pub const LATEST_HEADER: &str =
    "Time             SYMB   Name                   price    %24h    %7d   %30d   %60d   %90d  %V24h";
pub const DOUBLE_HALF_HEADER: &str =
    "Symbol Name                price  last_double   last_half   last_updated";

pub fn latest_quotes(warehouse: &Warehouse) -> Result<Vec<LatestQuoteRow>, WarehouseError> {
    warehouse.query_rows(
        r#"
SELECT
    epoch_ms(last_updated), symbol, name, price,
    percent_change_24h, percent_change_7d, percent_change_30d,
    percent_change_60d, percent_change_90d, volume_change_24h
FROM quote_latest
ORDER BY symbol
"#,
        &[],
        |row| {
            Ok(LatestQuoteRow {
                last_updated: timestamp_column(row, 0)?,
                symbol: row.get(1)?,
                name: row.get(2)?,
                price: row.get(3)?,
                percent_change_24h: row.get(4)?,
                percent_change_7d: row.get(5)?,
                percent_change_30d: row.get(6)?,
                percent_change_60d: row.get(7)?,
                percent_change_90d: row.get(8)?,
                volume_change_24h: row.get(9)?,
            })
        },
    )
}

/// Most recent date `symbol` traded at `price`.
///
/// A date qualifies when two consecutive quotes bracket the price (the date of
/// the earlier quote) or when a historical period's low..high contains it
/// (the period end date).
pub fn last_at(
    warehouse: &Warehouse,
    symbol: &Symbol,
    price: f64,
) -> Result<Option<Date>, WarehouseError> {
    let symbol = symbol.as_str();
    let rows = warehouse.query_rows(
        r#"
WITH progression AS (
    SELECT
        last_updated,
        price,
        LEAD(price) OVER (ORDER BY last_updated) AS price_next
    FROM quote
    WHERE symbol = ?
), candidates AS (
    SELECT CAST(last_updated AS DATE) AS seen_on
    FROM progression
    WHERE price_next IS NOT NULL
      AND CAST(? AS DOUBLE) BETWEEN LEAST(price, price_next) AND GREATEST(price, price_next)
    UNION ALL
    SELECT end_date AS seen_on
    FROM historical
    WHERE symbol = ? AND CAST(? AS DOUBLE) BETWEEN low AND high
)
SELECT CAST(MAX(seen_on) AS VARCHAR) FROM candidates
"#,
        &[&symbol, &price, &symbol, &price],
        |row| row.get::<_, Option<String>>(0),
    )?;

    match rows.into_iter().flatten().next() {
        Some(day) => Ok(Some(parse_date(&day)?)),
        None => Ok(None),
    }
}

/// For every latest quote, the last dates at double and at half its price.
pub fn doubles_and_halves(warehouse: &Warehouse) -> Result<Vec<DoubleHalfRow>, WarehouseError> {
    let latest = latest_quotes(warehouse)?;
    let mut rows = Vec::with_capacity(latest.len());
    for quote in latest {
        let symbol = Symbol::parse(&quote.symbol)?;
        rows.push(DoubleHalfRow {
            last_double: last_at(warehouse, &symbol, quote.price * 2.0)?,
            last_half: last_at(warehouse, &symbol, quote.price / 2.0)?,
            symbol: quote.symbol,
            name: quote.name,
            price: quote.price,
            last_updated: quote.last_updated,
        });
    }
    Ok(rows)
}

pub fn format_latest_line(row: &LatestQuoteRow) -> String {
    let time = row.last_updated.format_rfc3339();
    format!(
        "{:<16} {:<6} {:<20} {:>10.4} {:>7} {:>6} {:>6} {:>6} {:>6} {:>6}",
        time.get(..16).unwrap_or(time.as_str()),
        row.symbol,
        truncate(&row.name, 20),
        row.price,
        percent(row.percent_change_24h),
        percent(row.percent_change_7d),
        percent(row.percent_change_30d),
        percent(row.percent_change_60d),
        percent(row.percent_change_90d),
        percent(row.volume_change_24h),
    )
}

pub fn format_double_half_line(row: &DoubleHalfRow) -> String {
    let time = row.last_updated.format_rfc3339();
    format!(
        "{:<6} {:<16} {:>9.3}   {:^10}   {:^10}   {}",
        row.symbol,
        truncate(&row.name, 16),
        row.price,
        date_or_dash(row.last_double),
        date_or_dash(row.last_half),
        time.get(..16).unwrap_or(time.as_str()),
    )
}

pub fn format_last_at(symbol: &Symbol, price: f64, date: Option<Date>) -> String {
    match date {
        Some(date) => format!("{date} was the last date {symbol} traded at {price}"),
        None => format!("{symbol} was never at this price"),
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |value| format!("{value:.2}"))
}

fn date_or_dash(date: Option<Date>) -> String {
    date.map_or_else(|| String::from("-"), |date| date.to_string())
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_half_line_marks_missing_dates() {
        let row = DoubleHalfRow {
            symbol: String::from("XMR"),
            name: String::from("Monero"),
            price: 400.0,
            last_double: None,
            last_half: Some(parse_date("2024-01-02").expect("date")),
            last_updated: UtcDateTime::parse("2025-12-17T10:00:00Z").expect("timestamp"),
        };
        let line = format_double_half_line(&row);
        assert!(line.starts_with("XMR    Monero"));
        assert!(line.contains("    -     "));
        assert!(line.contains("2024-01-02"));
        assert!(line.ends_with("2025-12-17T10:00"));
    }

    #[test]
    fn last_at_message_covers_both_outcomes() {
        let symbol = Symbol::parse("BTC").expect("symbol");
        assert_eq!(
            format_last_at(&symbol, 50.0, None),
            "BTC was never at this price"
        );
        assert_eq!(
            format_last_at(&symbol, 50.0, Some(parse_date("2013-04-01").expect("date"))),
            "2013-04-01 was the last date BTC traded at 50"
        );
    }

    #[test]
    fn truncates_long_names_by_chars() {
        assert_eq!(truncate("Wrapped Bitcoin on Ethereum", 7), "Wrapped");
        assert_eq!(truncate("Ether", 20), "Ether");
    }
}
