//! Market-data session: lifecycle plus the operation surface front ends use.

use thiserror::Error;

use tickvault_store::{self as store, StoreBackend, StoreConfig, StoreError};

use crate::feed::{FeedError, FeedFetcher, UnresolvedDate};
use crate::{gap, PriceBar, Ticker, TradeDate, ValidationError};

/// Errors surfaced by service operations.
///
/// Store-level referential errors pass through unchanged inside
/// [`ServiceError::Store`]; the service never catches or retries them.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Operation attempted before `run` or after `close`.
    #[error("service not initialised; call run() first")]
    NotInitialized,

    /// The ticker is registered but holds no bars at all.
    #[error("no stored bars for '{ticker}'")]
    NoData { ticker: String },

    /// A stored value failed domain validation on the way back out.
    #[error("store returned malformed data: {detail}")]
    Corrupt { detail: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Result of a ranged refresh: how many bars were written, and which
/// requested dates the feed could not resolve (reported, never raised).
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    pub updated: usize,
    pub unresolved: Vec<UnresolvedDate>,
}

/// One operator session over a store and a price feed.
///
/// Lifecycle: constructed idle, [`run`](Self::run) opens the store handle,
/// [`close`](Self::close) releases it. Every data operation outside a
/// running session fails with [`ServiceError::NotInitialized`]. All session
/// state lives on the instance; nothing is shared between services.
pub struct MarketDataService<F> {
    fetcher: F,
    session: Option<Box<dyn StoreBackend>>,
}

impl<F: FeedFetcher> MarketDataService<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            session: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// The feed fetcher this session was built with.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Open the configured store and enter the running state.
    ///
    /// A missing store propagates as [`StoreError::NotFound`] unchanged:
    /// creating stores is an explicit, separate step that belongs to the
    /// configuration layer, not to the service. Running again replaces the
    /// current session, closing the old handle first.
    pub fn run(&mut self, config: &StoreConfig) -> Result<(), ServiceError> {
        self.close()?;
        let handle = store::connect(config)?;
        self.session = Some(handle);
        log::info!("session running against {}", config.location.display());
        Ok(())
    }

    /// Release the store handle. Safe to call on a session that never ran.
    pub fn close(&mut self) -> Result<(), ServiceError> {
        if let Some(mut handle) = self.session.take() {
            handle.close()?;
            log::info!("session closed");
        }
        Ok(())
    }

    /// Register a security. Adding an already-registered ticker is a no-op.
    pub fn add_security(&mut self, ticker: &Ticker) -> Result<(), ServiceError> {
        let raw = ticker.as_str().to_owned();
        self.store_mut()?.insert_securities(&[raw])?;
        Ok(())
    }

    /// All registered securities.
    pub fn securities(&self) -> Result<Vec<Ticker>, ServiceError> {
        self.store()?
            .securities()?
            .iter()
            .map(|raw| Ticker::parse(raw).map_err(corrupt))
            .collect()
    }

    /// The stored bar for (ticker, date).
    pub fn bar(&self, ticker: &Ticker, date: TradeDate) -> Result<PriceBar, ServiceError> {
        let row = self.store()?.bar(ticker.as_str(), &date.format_iso())?;
        PriceBar::from_row(&row).map_err(corrupt)
    }

    /// Full stored history for a ticker, newest first. Empty for a
    /// registered ticker with no bars.
    pub fn series(&self, ticker: &Ticker) -> Result<Vec<(TradeDate, PriceBar)>, ServiceError> {
        self.store()?
            .series(ticker.as_str())?
            .iter()
            .map(|(date, row)| {
                let date = TradeDate::parse(date).map_err(corrupt)?;
                let bar = PriceBar::from_row(row).map_err(corrupt)?;
                Ok((date, bar))
            })
            .collect()
    }

    /// Newest stored (date, bar) for a ticker.
    ///
    /// # Errors
    /// [`ServiceError::NoData`] when the ticker is registered but has no
    /// history; an unregistered ticker surfaces the store's
    /// [`StoreError::UnknownTicker`] instead.
    pub fn latest_bar(&self, ticker: &Ticker) -> Result<(TradeDate, PriceBar), ServiceError> {
        self.series(ticker)?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NoData {
                ticker: ticker.to_string(),
            })
    }

    /// Fetch and persist the bar for a single date.
    ///
    /// The ticker is validated against the register before the feed is
    /// contacted; the fetcher is never called for an unregistered ticker.
    /// Fetch errors propagate unchanged.
    pub fn update_one(&mut self, ticker: &Ticker, date: TradeDate) -> Result<(), ServiceError> {
        self.ensure_registered(ticker)?;
        let bar = self.fetcher.fetch_one(ticker, date)?;
        self.store_mut()?
            .upsert_bar(ticker.as_str(), &date.format_iso(), &bar.to_row())?;
        Ok(())
    }

    /// Refresh a ticker's history up to today (UTC).
    pub fn update_range(&mut self, ticker: &Ticker) -> Result<UpdateOutcome, ServiceError> {
        self.update_range_as_of(ticker, TradeDate::today_utc())
    }

    /// Refresh a ticker's history up to `today`.
    ///
    /// Computes the business-day gap from the latest stored date (or from
    /// `today` itself when no history exists), fetches the whole gap in one
    /// feed call, and persists every resolved bar. Dates the feed could not
    /// resolve are reported in the outcome, not raised — a partial refresh
    /// is a normal result. No feed call is made for an empty gap.
    pub fn update_range_as_of(
        &mut self,
        ticker: &Ticker,
        today: TradeDate,
    ) -> Result<UpdateOutcome, ServiceError> {
        let latest = match self.latest_bar(ticker) {
            Ok((date, _)) => Some(date),
            Err(ServiceError::NoData { .. }) => None,
            Err(error) => return Err(error),
        };

        let dates = gap::refresh_dates(latest, today);
        if dates.is_empty() {
            return Ok(UpdateOutcome::default());
        }

        let outcome = self.fetcher.fetch_many(ticker, &dates)?;
        let rows: Vec<(String, tickvault_store::BarRow)> = outcome
            .resolved
            .iter()
            .map(|(date, bar)| (date.format_iso(), bar.to_row()))
            .collect();
        if !rows.is_empty() {
            self.store_mut()?.bulk_upsert_bars(ticker.as_str(), &rows)?;
        }

        log::debug!(
            "refreshed {}: {} bars written, {} dates unresolved",
            ticker,
            rows.len(),
            outcome.unresolved.len()
        );
        Ok(UpdateOutcome {
            updated: rows.len(),
            unresolved: outcome.unresolved,
        })
    }

    fn ensure_registered(&self, ticker: &Ticker) -> Result<(), ServiceError> {
        let registered = self.store()?.securities()?;
        if registered.iter().any(|known| known == ticker.as_str()) {
            Ok(())
        } else {
            Err(StoreError::UnknownTicker {
                ticker: ticker.to_string(),
            }
            .into())
        }
    }

    fn store(&self) -> Result<&dyn StoreBackend, ServiceError> {
        self.session.as_deref().ok_or(ServiceError::NotInitialized)
    }

    fn store_mut(&mut self) -> Result<&mut dyn StoreBackend, ServiceError> {
        match self.session.as_mut() {
            Some(backend) => Ok(backend.as_mut()),
            None => Err(ServiceError::NotInitialized),
        }
    }
}

fn corrupt(error: ValidationError) -> ServiceError {
    ServiceError::Corrupt {
        detail: error.to_string(),
    }
}
