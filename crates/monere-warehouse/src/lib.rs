//! DuckDB store for monere.
//!
//! Holds quote observations, historical periods, the provider id map and the
//! persisted variability rules. Every value travels as a bound parameter;
//! only validated identifiers are ever interpolated into SQL text.

pub mod duckdb;
pub mod migrations;
pub mod scripts;
pub mod views;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::types::Type;
use ::duckdb::{params_from_iter, Connection};
use monere_core::{
    Config, CurrencyListing, HistoryBar, Platform, Quote, UtcDateTime, ValidationError,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use ::duckdb::types::Value as SqlValue;
pub use ::duckdb::{Row, ToSql};
pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use scripts::Script;

const BULK_INSERT_CHUNK_ROWS: usize = 500;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("query rejected: {0}")]
    QueryRejected(String),

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub db_path: PathBuf,
    pub max_pool_size: usize,
}

impl From<&Config> for WarehouseConfig {
    fn from(config: &Config) -> Self {
        Self {
            db_path: config.database_path(),
            max_pool_size: config.max_pool_size,
        }
    }
}

/// Outcome of one ingestion call, also recorded in `ingest_log`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub request_id: String,
    pub dataset: &'static str,
    pub received: usize,
    pub duplicates_removed: usize,
}

#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        tracing::debug!(path = %warehouse.db_path().display(), "warehouse ready");
        Ok(warehouse)
    }

    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let applied = migrations::apply_migrations(&connection)?;
        if applied > 0 {
            tracing::info!(applied, "applied warehouse migrations");
        }
        views::create_views(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Run a single read-only statement and map every row.
    pub fn query_rows<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        mut map: F,
    ) -> Result<Vec<T>, WarehouseError>
    where
        F: FnMut(&Row<'_>) -> Result<T, ::duckdb::Error>,
    {
        let sql = normalize_sql(sql)?;
        enforce_read_only_query(sql)?;

        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(sql)?;
        let rows = statement.query_map(params, &mut map)?;

        let mut output = Vec::new();
        for row in rows {
            output.push(row?);
        }
        Ok(output)
    }

    /// Append `rows` to `table` with multi-row parameterized inserts in one transaction.
    pub fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<usize, WarehouseError> {
        validate_identifier(table)?;
        if columns.is_empty() {
            return Err(WarehouseError::QueryRejected(String::from(
                "bulk insert needs at least one column",
            )));
        }
        for column in columns {
            validate_identifier(column)?;
        }
        if let Some(index) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(WarehouseError::QueryRejected(format!(
                "row {index} has {} values for {} columns",
                rows[index].len(),
                columns.len()
            )));
        }
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            let mut inserted = 0;
            for chunk in rows.chunks(BULK_INSERT_CHUNK_ROWS) {
                let sql = insert_statement(table, columns, chunk.len());
                inserted += connection.execute(&sql, params_from_iter(chunk.iter().flatten()))?;
            }
            Ok(inserted)
        })();

        let inserted = finalize_transaction(&connection, result)?;
        tracing::debug!(table, inserted, "bulk insert");
        Ok(inserted)
    }

    /// Run a named script inside a transaction; returns the affected row count.
    pub fn execute_script(&self, script: Script) -> Result<usize, WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = connection
            .execute(script.sql(), [])
            .map_err(WarehouseError::from);
        let affected = finalize_transaction(&connection, result)?;
        tracing::debug!(script = %script, affected, "executed script");
        Ok(affected)
    }

    pub fn table_count(&self, table: &str) -> Result<i64, WarehouseError> {
        validate_identifier(table)?;
        let connection = self.manager.acquire()?;
        let count = connection.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Append quote observations, then drop repeats of an already stored observation.
    pub fn ingest_quotes(&self, quotes: &[Quote]) -> Result<IngestReport, WarehouseError> {
        for quote in quotes {
            quote.validate()?;
        }

        let request_id = new_request_id();
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            let mut statement = connection.prepare(
                r#"
INSERT INTO quote (
    cmc_id, symbol, name, price, volume_24h, volume_change_24h,
    percent_change_1h, percent_change_24h, percent_change_7d,
    percent_change_30d, percent_change_60d, percent_change_90d,
    market_cap, last_updated, fetched_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, epoch_ms(CAST(? AS BIGINT)), CURRENT_TIMESTAMP)
"#,
            )?;
            for quote in quotes {
                let last_updated = quote.last_updated.unix_millis();
                let params: [&dyn ToSql; 14] = [
                    &quote.cmc_id,
                    &quote.symbol.as_str(),
                    &quote.name,
                    &quote.price,
                    &quote.volume_24h,
                    &quote.volume_change_24h,
                    &quote.percent_change_1h,
                    &quote.percent_change_24h,
                    &quote.percent_change_7d,
                    &quote.percent_change_30d,
                    &quote.percent_change_60d,
                    &quote.percent_change_90d,
                    &quote.market_cap,
                    &last_updated,
                ];
                statement.execute(params)?;
            }

            let duplicates = connection.execute(Script::DedupeQuotes.sql(), [])?;
            record_ingest(&connection, &request_id, "quote", quotes.len())?;
            Ok(duplicates)
        })();

        let duplicates_removed = finalize_transaction(&connection, result)?;
        tracing::info!(
            request_id = %request_id,
            received = quotes.len(),
            duplicates_removed,
            "ingested quotes"
        );
        Ok(IngestReport {
            request_id,
            dataset: "quote",
            received: quotes.len(),
            duplicates_removed,
        })
    }

    /// Upsert historical periods keyed by `(symbol, start_date)`.
    pub fn ingest_history(&self, bars: &[HistoryBar]) -> Result<IngestReport, WarehouseError> {
        // The last row wins when an export repeats a period.
        let mut unique = BTreeMap::new();
        for bar in bars {
            unique.insert((bar.symbol.as_str(), bar.start_date), bar);
        }
        let duplicates_removed = bars.len() - unique.len();

        let request_id = new_request_id();
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let mut statement = connection.prepare(
                r#"
INSERT OR REPLACE INTO historical (
    symbol, start_date, end_date, open, high, low, close, volume, market_cap
) VALUES (?, CAST(? AS DATE), CAST(? AS DATE), ?, ?, ?, ?, ?, ?)
"#,
            )?;
            for bar in unique.values() {
                let start_date = bar.start_date.to_string();
                let end_date = bar.end_date.to_string();
                let params: [&dyn ToSql; 9] = [
                    &bar.symbol.as_str(),
                    &start_date,
                    &end_date,
                    &bar.open,
                    &bar.high,
                    &bar.low,
                    &bar.close,
                    &bar.volume,
                    &bar.market_cap,
                ];
                statement.execute(params)?;
            }
            record_ingest(&connection, &request_id, "historical", unique.len())
        })();

        finalize_transaction(&connection, result)?;
        tracing::info!(
            request_id = %request_id,
            received = bars.len(),
            duplicates_removed,
            "ingested historical periods"
        );
        Ok(IngestReport {
            request_id,
            dataset: "historical",
            received: bars.len(),
            duplicates_removed,
        })
    }

    /// Upsert provider id map entries keyed by provider id.
    pub fn ingest_currency_map(
        &self,
        listings: &[CurrencyListing],
    ) -> Result<IngestReport, WarehouseError> {
        let mut unique = BTreeMap::new();
        for listing in listings {
            unique.insert(listing.id, listing);
        }
        let duplicates_removed = listings.len() - unique.len();

        let request_id = new_request_id();
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            let mut statement = connection.prepare(
                r#"
INSERT OR REPLACE INTO currency (
    id, rank, name, symbol, slug, is_active, first_historical_data, last_historical_data,
    platform_id, platform_name, platform_symbol, platform_slug, updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
"#,
            )?;
            for listing in unique.values() {
                let platform = listing.platform.as_ref();
                let platform_id = platform.map(|platform| platform.id);
                let platform_name = platform.map(|platform| platform.name.as_str());
                let platform_symbol = platform.map(|platform| platform.symbol.as_str());
                let platform_slug = platform.map(|platform| platform.slug.as_str());
                let params: [&dyn ToSql; 12] = [
                    &listing.id,
                    &listing.rank,
                    &listing.name,
                    &listing.symbol,
                    &listing.slug,
                    &listing.is_active,
                    &listing.first_historical_data,
                    &listing.last_historical_data,
                    &platform_id,
                    &platform_name,
                    &platform_symbol,
                    &platform_slug,
                ];
                statement.execute(params)?;
            }
            record_ingest(&connection, &request_id, "currency", unique.len())
        })();

        finalize_transaction(&connection, result)?;
        tracing::info!(request_id = %request_id, received = listings.len(), "ingested id map");
        Ok(IngestReport {
            request_id,
            dataset: "currency",
            received: listings.len(),
            duplicates_removed,
        })
    }

    /// Case-insensitive substring search over symbol, name and slug of the id map.
    pub fn search_currencies(&self, query: &str) -> Result<Vec<CurrencyListing>, WarehouseError> {
        let pattern = format!("%{}%", query.trim());
        self.query_rows(
            r#"
SELECT
    id, rank, name, symbol, slug, is_active, first_historical_data, last_historical_data,
    platform_id, platform_name, platform_symbol, platform_slug
FROM currency
WHERE symbol ILIKE ? OR name ILIKE ? OR slug ILIKE ?
ORDER BY rank ASC NULLS LAST, id ASC
"#,
            &[&pattern, &pattern, &pattern],
            |row| {
                let platform_id: Option<i64> = row.get(8)?;
                let platform = match platform_id {
                    Some(id) => Some(Platform {
                        id,
                        name: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                        symbol: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                        slug: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
                    }),
                    None => None,
                };
                Ok(CurrencyListing {
                    id: row.get(0)?,
                    rank: row.get(1)?,
                    name: row.get(2)?,
                    symbol: row.get(3)?,
                    slug: row.get(4)?,
                    is_active: row.get(5)?,
                    first_historical_data: row.get(6)?,
                    last_historical_data: row.get(7)?,
                    platform,
                })
            },
        )
    }
}

/// Read an `epoch_ms(...)` column as a UTC timestamp.
pub fn timestamp_column(row: &Row<'_>, index: usize) -> Result<UtcDateTime, ::duckdb::Error> {
    let millis: i64 = row.get(index)?;
    UtcDateTime::from_unix_millis(millis).map_err(|error| {
        ::duckdb::Error::FromSqlConversionFailure(index, Type::BigInt, Box::new(error))
    })
}

fn record_ingest(
    connection: &Connection,
    request_id: &str,
    dataset: &str,
    row_count: usize,
) -> Result<(), WarehouseError> {
    let row_count = i64::try_from(row_count).unwrap_or(i64::MAX);
    connection.execute(
        "INSERT INTO ingest_log (request_id, dataset, row_count, status, timestamp) VALUES (?, ?, ?, 'ok', CURRENT_TIMESTAMP)",
        [&request_id as &dyn ToSql, &dataset, &row_count],
    )?;
    Ok(())
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn insert_statement(table: &str, columns: &[&str], row_count: usize) -> String {
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(", "),
        vec![placeholders; row_count].join(", ")
    )
}

fn validate_identifier(name: &str) -> Result<(), WarehouseError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    if valid_start && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        Ok(())
    } else {
        Err(WarehouseError::QueryRejected(format!(
            "'{name}' is not a valid identifier"
        )))
    }
}

fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "row queries accept only SELECT/CTE statements",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(first_keyword.as_str(), "SELECT" | "WITH")
}

fn has_multiple_statements(sql: &str) -> bool {
    sql.split(';')
        .filter(|part| !part.trim().is_empty())
        .count()
        > 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp() -> (tempfile::TempDir, Warehouse) {
        let temp = tempdir().expect("tempdir");
        let warehouse = Warehouse::open(WarehouseConfig {
            db_path: temp.path().join("data").join("monere.duckdb"),
            max_pool_size: 2,
        })
        .expect("warehouse open");
        (temp, warehouse)
    }

    #[test]
    fn initializes_tables_and_views() {
        let (_temp, warehouse) = open_temp();

        let names = warehouse
            .query_rows(
                "SELECT table_name FROM information_schema.tables WHERE table_name IN ('quote', 'quote_latest', 'vw_price_series', 'alert_variability_rule') ORDER BY table_name",
                &[],
                |row| row.get::<_, String>(0),
            )
            .expect("query");
        assert_eq!(
            names,
            vec!["alert_variability_rule", "quote", "quote_latest", "vw_price_series"]
        );
    }

    #[test]
    fn reopening_keeps_schema() {
        let temp = tempdir().expect("tempdir");
        let config = WarehouseConfig {
            db_path: temp.path().join("monere.duckdb"),
            max_pool_size: 1,
        };
        {
            let warehouse = Warehouse::open(config.clone()).expect("first open");
            warehouse
                .bulk_insert(
                    "alert_variability_rule",
                    &["symbol", "percent_change", "duration_days"],
                    &[vec![SqlValue::Null, SqlValue::Double(5.0), SqlValue::Double(3.0)]],
                )
                .expect("insert");
        }
        let warehouse = Warehouse::open(config).expect("second open");
        assert_eq!(
            warehouse.table_count("alert_variability_rule").expect("count"),
            1
        );
    }

    #[test]
    fn query_rows_rejects_writes() {
        let (_temp, warehouse) = open_temp();
        let error = warehouse
            .query_rows("DELETE FROM quote", &[], |row| row.get::<_, i64>(0))
            .expect_err("should reject");
        assert!(matches!(error, WarehouseError::QueryRejected(_)));

        let error = warehouse
            .query_rows("SELECT 1; DROP TABLE quote", &[], |row| row.get::<_, i64>(0))
            .expect_err("should reject");
        assert!(matches!(error, WarehouseError::QueryRejected(_)));
    }

    #[test]
    fn query_rows_binds_parameters() {
        let (_temp, warehouse) = open_temp();
        let value = warehouse
            .query_rows("SELECT CAST(? AS DOUBLE) * 2", &[&21.0_f64], |row| {
                row.get::<_, f64>(0)
            })
            .expect("query");
        assert_eq!(value, vec![42.0]);
    }

    #[test]
    fn bulk_insert_rejects_bad_identifiers_and_shapes() {
        let (_temp, warehouse) = open_temp();
        let error = warehouse
            .bulk_insert("quote; DROP TABLE quote", &["symbol"], &[])
            .expect_err("should reject");
        assert!(matches!(error, WarehouseError::QueryRejected(_)));

        let error = warehouse
            .bulk_insert(
                "alert_variability_rule",
                &["symbol", "percent_change"],
                &[vec![SqlValue::Null]],
            )
            .expect_err("should reject");
        assert!(matches!(error, WarehouseError::QueryRejected(_)));
    }

    #[test]
    fn insert_statement_repeats_placeholders() {
        assert_eq!(
            insert_statement("t", &["a", "b"], 2),
            "INSERT INTO t (a, b) VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn identifiers_are_checked() {
        assert!(validate_identifier("alert_variability_rule").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("quote where 1=1").is_err());
        assert!(validate_identifier("").is_err());
    }
}
