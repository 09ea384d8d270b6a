use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_market_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS currency (
    id BIGINT PRIMARY KEY,
    rank BIGINT,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    slug TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    first_historical_data TEXT,
    last_historical_data TEXT,
    platform_id BIGINT,
    platform_name TEXT,
    platform_symbol TEXT,
    platform_slug TEXT,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE SEQUENCE IF NOT EXISTS quote_id_seq START 1;

CREATE TABLE IF NOT EXISTS quote (
    quote_id BIGINT NOT NULL DEFAULT nextval('quote_id_seq'),
    cmc_id BIGINT NOT NULL,
    symbol TEXT NOT NULL,
    name TEXT NOT NULL,
    price DOUBLE NOT NULL,
    volume_24h DOUBLE,
    volume_change_24h DOUBLE,
    percent_change_1h DOUBLE,
    percent_change_24h DOUBLE,
    percent_change_7d DOUBLE,
    percent_change_30d DOUBLE,
    percent_change_60d DOUBLE,
    percent_change_90d DOUBLE,
    market_cap DOUBLE,
    last_updated TIMESTAMP NOT NULL,
    fetched_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS historical (
    symbol TEXT NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    open DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    close DOUBLE NOT NULL,
    volume DOUBLE,
    market_cap DOUBLE,
    PRIMARY KEY(symbol, start_date)
);

CREATE TABLE IF NOT EXISTS ingest_log (
    request_id TEXT NOT NULL,
    dataset TEXT NOT NULL,
    row_count BIGINT NOT NULL,
    status TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_alert_rules",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS alert_variability_rule_seq START 1;

CREATE TABLE IF NOT EXISTS alert_variability_rule (
    rule_id BIGINT NOT NULL DEFAULT nextval('alert_variability_rule_seq'),
    symbol TEXT,
    percent_change DOUBLE NOT NULL,
    duration_days DOUBLE NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0003_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_quote_symbol_updated ON quote(symbol, last_updated);
CREATE INDEX IF NOT EXISTS idx_currency_symbol ON currency(symbol);
CREATE INDEX IF NOT EXISTS idx_ingest_log_dataset_ts ON ingest_log(dataset, timestamp);
"#,
    },
];

/// Apply every migration not yet recorded in `schema_migrations`.
pub fn apply_migrations(connection: &Connection) -> Result<usize, ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
            tracing::debug!(version = migration.version, "applied migration");
            applied += 1;
        }
    }

    Ok(applied)
}
