//! Versioned schema migrations for the `DuckDB` backend.

use ::duckdb::{Connection, ToSql};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_core_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS securities (
    ticker TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS daily_bars (
    ticker TEXT NOT NULL,
    date TEXT NOT NULL,
    open TEXT NOT NULL,
    high TEXT NOT NULL,
    low TEXT NOT NULL,
    close TEXT NOT NULL,
    adj_close TEXT NOT NULL,
    volume UBIGINT NOT NULL,
    PRIMARY KEY(ticker, date)
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_daily_bars_ticker_date ON daily_bars(ticker, date);
"#,
    },
];

/// Bring the schema up to date, recording each applied version.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        if is_applied(connection, migration.version)? {
            continue;
        }
        connection.execute_batch(migration.sql)?;
        let params: [&dyn ToSql; 1] = [&migration.version];
        connection.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            params.as_slice(),
        )?;
    }

    Ok(())
}

fn is_applied(connection: &Connection, version: &str) -> Result<bool, ::duckdb::Error> {
    let params: [&dyn ToSql; 1] = [&version];
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
        params.as_slice(),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
