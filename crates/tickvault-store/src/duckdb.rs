//! Embedded `DuckDB` backend.
//!
//! One connection per open handle; the session owns it exclusively for its
//! lifetime. All user-provided values are passed as query parameters, never
//! interpolated.

use std::fs;
use std::path::Path;

use ::duckdb::{Connection, ToSql};

use crate::{migrations, BarRow, StoreBackend, StoreError};

pub struct DuckDbBackend {
    connection: Option<Connection>,
}

impl DuckDbBackend {
    /// Create a fresh database file with the current schema.
    pub fn create(path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                location: path.display().to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(path)?;
        migrations::apply_migrations(&connection)?;
        connection.close().map_err(|(_, error)| error)?;
        Ok(())
    }

    /// Open an existing database file, applying any pending migrations.
    pub fn connect(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound {
                location: path.display().to_string(),
            });
        }

        let connection = Connection::open(path)?;
        migrations::apply_migrations(&connection)?;
        Ok(Self {
            connection: Some(connection),
        })
    }

    fn connection(&self) -> Result<&Connection, StoreError> {
        self.connection.as_ref().ok_or(StoreError::Closed)
    }

    fn ensure_registered(&self, ticker: &str) -> Result<(), StoreError> {
        let params: [&dyn ToSql; 1] = [&ticker];
        let count: i64 = self.connection()?.query_row(
            "SELECT COUNT(*) FROM securities WHERE ticker = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(StoreError::UnknownTicker {
                ticker: ticker.to_owned(),
            });
        }
        Ok(())
    }
}

impl StoreBackend for DuckDbBackend {
    fn securities(&self) -> Result<Vec<String>, StoreError> {
        let connection = self.connection()?;
        let mut statement = connection.prepare("SELECT ticker FROM securities ORDER BY ticker")?;
        let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
        let mut tickers = Vec::new();
        for ticker in rows {
            tickers.push(ticker?);
        }
        Ok(tickers)
    }

    fn insert_securities(&mut self, tickers: &[String]) -> Result<(), StoreError> {
        let connection = self.connection()?;
        for ticker in tickers {
            let params: [&dyn ToSql; 1] = [ticker];
            connection.execute(
                "INSERT OR IGNORE INTO securities (ticker) VALUES (?)",
                params.as_slice(),
            )?;
        }
        Ok(())
    }

    fn upsert_bar(&mut self, ticker: &str, date: &str, bar: &BarRow) -> Result<(), StoreError> {
        self.ensure_registered(ticker)?;
        insert_bar(self.connection()?, ticker, date, bar)?;
        Ok(())
    }

    fn bulk_upsert_bars(
        &mut self,
        ticker: &str,
        rows: &[(String, BarRow)],
    ) -> Result<(), StoreError> {
        self.ensure_registered(ticker)?;
        let connection = self.connection()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), StoreError> {
            for (date, bar) in rows {
                insert_bar(connection, ticker, date, bar)?;
            }
            Ok(())
        })();
        finalize_transaction(connection, result)
    }

    fn bar(&self, ticker: &str, date: &str) -> Result<BarRow, StoreError> {
        self.ensure_registered(ticker)?;
        let params: [&dyn ToSql; 2] = [&ticker, &date];
        let row = self.connection()?.query_row(
            "SELECT open, high, low, close, adj_close, volume \
             FROM daily_bars WHERE ticker = ? AND date = ?",
            params.as_slice(),
            read_bar_row,
        );
        match row {
            Ok(bar) => Ok(bar),
            Err(::duckdb::Error::QueryReturnedNoRows) => Err(StoreError::NoBarForDate {
                ticker: ticker.to_owned(),
                date: date.to_owned(),
            }),
            Err(error) => Err(error.into()),
        }
    }

    fn series(&self, ticker: &str) -> Result<Vec<(String, BarRow)>, StoreError> {
        self.ensure_registered(ticker)?;
        let connection = self.connection()?;
        let mut statement = connection.prepare(
            "SELECT date, open, high, low, close, adj_close, volume \
             FROM daily_bars WHERE ticker = ? ORDER BY date DESC",
        )?;
        let params: [&dyn ToSql; 1] = [&ticker];
        let rows = statement.query_map(params.as_slice(), |row| {
            let date: String = row.get(0)?;
            let bar = BarRow {
                open: row.get(1)?,
                high: row.get(2)?,
                low: row.get(3)?,
                close: row.get(4)?,
                adj_close: row.get(5)?,
                volume: row.get(6)?,
            };
            Ok((date, bar))
        })?;

        let mut series = Vec::new();
        for entry in rows {
            series.push(entry?);
        }
        Ok(series)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        connection.close().map_err(|(_, error)| error)?;
        Ok(())
    }
}

fn insert_bar(
    connection: &Connection,
    ticker: &str,
    date: &str,
    bar: &BarRow,
) -> Result<(), StoreError> {
    let params: [&dyn ToSql; 8] = [
        &ticker,
        &date,
        &bar.open,
        &bar.high,
        &bar.low,
        &bar.close,
        &bar.adj_close,
        &bar.volume,
    ];
    connection.execute(
        "INSERT OR REPLACE INTO daily_bars \
         (ticker, date, open, high, low, close, adj_close, volume) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params.as_slice(),
    )?;
    Ok(())
}

fn read_bar_row(row: &::duckdb::Row<'_>) -> Result<BarRow, ::duckdb::Error> {
    Ok(BarRow {
        open: row.get(0)?,
        high: row.get(1)?,
        low: row.get(2)?,
        close: row.get(3)?,
        adj_close: row.get(4)?,
        volume: row.get(5)?,
    })
}

fn finalize_transaction(
    connection: &Connection,
    result: Result<(), StoreError>,
) -> Result<(), StoreError> {
    match result {
        Ok(()) => {
            connection.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}
