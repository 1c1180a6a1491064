//! # Tickvault Store
//!
//! Durable storage for the security register and daily price history.
//!
//! Two backends implement the same [`StoreBackend`] contract:
//!
//! | Backend | Location | Notes |
//! |---------|----------|-------|
//! | [`JsonBackend`] | single JSON document file | whole-document load/save per operation |
//! | [`DuckDbBackend`] | embedded DuckDB database file | versioned migrations, parameterized SQL |
//!
//! The contract is deliberately string-typed: tickers travel verbatim, dates
//! as ISO-8601 (`YYYY-MM-DD`) keys, and price fields as exact-precision
//! decimal strings inside [`BarRow`]. That keeps round-trip fidelity a
//! backend-independent guarantee — `1898.00` is stored and returned as
//! `1898.00`, never as a binary float.
//!
//! Every mutating operation persists before returning. A store holds at most
//! one bar per (ticker, date); a repeat write replaces the prior bar.

pub mod duckdb;
pub mod json;
mod migrations;

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::duckdb::DuckDbBackend;
pub use crate::json::JsonBackend;

/// Errors surfaced by store creation, connection, and data operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store exists at the given location.
    #[error("no store found at '{location}'")]
    NotFound { location: String },

    /// A store (or any file) already occupies the given location.
    #[error("a store already exists at '{location}'")]
    AlreadyExists { location: String },

    /// The ticker has not been registered in this store.
    #[error("ticker '{ticker}' is not registered")]
    UnknownTicker { ticker: String },

    /// The ticker is registered but holds no bar for the date.
    #[error("no bar stored for '{ticker}' on {date}")]
    NoBarForDate { ticker: String, date: String },

    /// Backend selector did not name a known backend.
    #[error("unknown backend '{value}', expected one of json, duckdb")]
    UnknownBackend { value: String },

    /// The handle was closed; no further operations are valid.
    #[error("store handle is closed")]
    Closed,

    /// The store exists but its contents cannot be interpreted.
    #[error("store contains malformed data: {detail}")]
    Corrupt { detail: String },

    /// File system fault.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON document fault.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// `DuckDB` database fault.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),
}

/// One persisted day of prices, with decimal fields as exact strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRow {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub adj_close: String,
    pub volume: u64,
}

/// Concrete backend selector, chosen by the configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Json,
    DuckDb,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::DuckDb => "duckdb",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "duckdb" => Ok(Self::DuckDb),
            other => Err(StoreError::UnknownBackend {
                value: other.to_owned(),
            }),
        }
    }
}

/// Location plus backend selector for one store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: PathBuf,
    pub kind: BackendKind,
}

impl StoreConfig {
    pub fn new(location: impl Into<PathBuf>, kind: BackendKind) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }
}

/// Backend-agnostic contract for the security register and bar history.
///
/// Dates are ISO-8601 calendar-date keys (`YYYY-MM-DD`); their lexicographic
/// order is their calendar order, which backends rely on for series
/// ordering. Implementations must persist every mutation before returning.
pub trait StoreBackend {
    /// Registered tickers, in a deterministic (backend-defined) order.
    fn securities(&self) -> Result<Vec<String>, StoreError>;

    /// Register tickers; already-registered entries are silently ignored.
    fn insert_securities(&mut self, tickers: &[String]) -> Result<(), StoreError>;

    /// Insert or replace the bar for (ticker, date).
    ///
    /// # Errors
    /// [`StoreError::UnknownTicker`] if the ticker is not registered.
    fn upsert_bar(&mut self, ticker: &str, date: &str, bar: &BarRow) -> Result<(), StoreError>;

    /// Insert or replace a batch of bars for one ticker.
    ///
    /// The ticker is validated once, up front; later rows for the same date
    /// within the batch win.
    fn bulk_upsert_bars(
        &mut self,
        ticker: &str,
        rows: &[(String, BarRow)],
    ) -> Result<(), StoreError>;

    /// The bar stored for (ticker, date).
    ///
    /// # Errors
    /// [`StoreError::UnknownTicker`] if the ticker is not registered,
    /// [`StoreError::NoBarForDate`] if no bar exists for the date.
    fn bar(&self, ticker: &str, date: &str) -> Result<BarRow, StoreError>;

    /// All bars for a ticker, newest date first. Empty for a registered
    /// ticker with no history.
    fn series(&self, ticker: &str) -> Result<Vec<(String, BarRow)>, StoreError>;

    /// Release backend resources. Safe to call once; operations on a closed
    /// handle fail with [`StoreError::Closed`].
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Initialize a new, empty store at the configured location.
///
/// # Errors
/// [`StoreError::AlreadyExists`] if anything already occupies the location.
pub fn create(config: &StoreConfig) -> Result<(), StoreError> {
    log::info!("creating {} store at {}", config.kind, config.location.display());
    match config.kind {
        BackendKind::Json => JsonBackend::create(&config.location),
        BackendKind::DuckDb => DuckDbBackend::create(&config.location),
    }
}

/// Open an existing store, returning a live backend handle.
///
/// # Errors
/// [`StoreError::NotFound`] if the location does not resolve to a store.
pub fn connect(config: &StoreConfig) -> Result<Box<dyn StoreBackend>, StoreError> {
    log::debug!("opening {} store at {}", config.kind, config.location.display());
    match config.kind {
        BackendKind::Json => Ok(Box::new(JsonBackend::connect(&config.location)?)),
        BackendKind::DuckDb => Ok(Box::new(DuckDbBackend::connect(&config.location)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_kind() {
        assert_eq!("json".parse::<BackendKind>().expect("json"), BackendKind::Json);
        assert_eq!(
            " DuckDB ".parse::<BackendKind>().expect("duckdb"),
            BackendKind::DuckDb
        );
        assert!(matches!(
            "sqlite".parse::<BackendKind>(),
            Err(StoreError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn connect_on_missing_location_fails_for_both_backends() {
        let temp = tempfile::tempdir().expect("tempdir");
        for kind in [BackendKind::Json, BackendKind::DuckDb] {
            let config = StoreConfig::new(temp.path().join("absent.db"), kind);
            let error = connect(&config).expect_err("must fail");
            assert!(matches!(error, StoreError::NotFound { .. }), "{kind}: {error}");
        }
    }
}
