//! Views read by the alert evaluators and reports.

use ::duckdb::Connection;

/// Create or refresh the derived views.
///
/// - `quote_latest`: newest quote per symbol (the snapshot)
/// - `vw_price_series`: historical closes (at period end) and quote prices
///   as one `(symbol, observed_at, price)` series
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW quote_latest AS
SELECT
    cmc_id,
    symbol,
    name,
    price,
    volume_24h,
    volume_change_24h,
    percent_change_1h,
    percent_change_24h,
    percent_change_7d,
    percent_change_30d,
    percent_change_60d,
    percent_change_90d,
    market_cap,
    last_updated
FROM quote
QUALIFY ROW_NUMBER() OVER (PARTITION BY symbol ORDER BY last_updated DESC, quote_id DESC) = 1;

CREATE OR REPLACE VIEW vw_price_series AS
SELECT
    symbol,
    CAST(end_date AS TIMESTAMP) AS observed_at,
    close AS price,
    'historical' AS origin
FROM historical
UNION ALL
SELECT
    symbol,
    last_updated AS observed_at,
    price,
    'quote' AS origin
FROM quote;
",
    )?;

    Ok(())
}
