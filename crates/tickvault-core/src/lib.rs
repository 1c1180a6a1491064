//! # Tickvault Core
//!
//! Domain model and business rules for a persistent equity market-data
//! store: a user-maintained register of tickers, their daily OHLCV price
//! history, and the refresh logic that reconciles an external daily-price
//! feed into the store.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Validated domain types (`Ticker`, `TradeDate`, `PriceBar`) |
//! | [`feed`] | Feed-fetcher contract and per-date fetch outcomes |
//! | [`adapters`] | Feed implementations (Yahoo chart endpoint) |
//! | [`gap`] | Business-day gap calculator |
//! | [`service`] | Session lifecycle and the operation surface the CLI uses |
//! | [`error`] | Validation errors |
//!
//! Storage lives in `tickvault-store` and is re-exported here as [`store`],
//! so front ends need a single library dependency.
//!
//! The whole system is synchronous and single-session: every store and feed
//! call blocks until it returns, and one open service session owns its
//! backend handle exclusively.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod feed;
pub mod gap;
pub mod service;

pub use adapters::YahooFetcher;
pub use domain::{PriceBar, Ticker, TradeDate};
pub use error::ValidationError;
pub use feed::{FeedError, FeedFetcher, FetchOutcome, UnresolvedDate};
pub use service::{MarketDataService, ServiceError, UpdateOutcome};

// Storage layer (re-exported from tickvault-store)
pub use tickvault_store as store;
pub use tickvault_store::{BackendKind, BarRow, StoreBackend, StoreConfig, StoreError};
