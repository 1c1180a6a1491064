//! Feed-fetcher contract.
//!
//! A feed resolves a ticker plus one or more calendar dates to price bars.
//! Per-date misses in a batch are ordinary outcomes, so they travel as
//! values inside [`FetchOutcome`] rather than as errors; only faults that
//! invalidate the whole call (unknown ticker, transport failure, an empty
//! date list) are raised.

use thiserror::Error;

use crate::{PriceBar, Ticker, TradeDate};

/// Errors raised by feed implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The upstream source does not recognise the ticker.
    #[error("feed does not recognise ticker '{ticker}'")]
    UnknownTicker { ticker: String },

    /// The source has no quote for the date (market holiday, listing gap).
    #[error("feed has no quote for {date}")]
    NoQuoteForDate { date: TradeDate },

    /// Caller contract violation: a batch fetch needs at least one date.
    #[error("date list must not be empty")]
    EmptyDateList,

    /// Network or upstream availability failure.
    #[error("feed transport failure: {detail}")]
    Transport { detail: String },

    /// The upstream payload could not be interpreted.
    #[error("feed returned malformed payload: {detail}")]
    Malformed { detail: String },
}

/// A requested date the feed could not resolve, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDate {
    pub date: TradeDate,
    pub error: FeedError,
}

/// Result of a batch fetch: hits in request order, misses with reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub resolved: Vec<(TradeDate, PriceBar)>,
    pub unresolved: Vec<UnresolvedDate>,
}

/// Synchronous daily-price source.
///
/// Implementations block the caller for the duration of the request; the
/// core performs no retries (retry policy, if any, belongs to the
/// implementation).
pub trait FeedFetcher {
    /// Resolve a single date to a bar.
    ///
    /// # Errors
    /// [`FeedError::UnknownTicker`] if the source rejects the ticker,
    /// [`FeedError::NoQuoteForDate`] if the date has no quote.
    fn fetch_one(&self, ticker: &Ticker, date: TradeDate) -> Result<PriceBar, FeedError>;

    /// Resolve a batch of dates in one upstream round trip.
    ///
    /// Hits are returned in input order restricted to resolved dates;
    /// misses are reported per date in [`FetchOutcome::unresolved`].
    ///
    /// # Errors
    /// [`FeedError::EmptyDateList`] if `dates` is empty, plus the
    /// whole-call failures described on [`FeedError`].
    fn fetch_many(&self, ticker: &Ticker, dates: &[TradeDate]) -> Result<FetchOutcome, FeedError>;
}
