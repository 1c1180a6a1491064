//! Yahoo Finance daily-bar fetcher.
//!
//! Resolves bars through the unofficial v8 chart endpoint
//! (`/v8/finance/chart/{symbol}`), requesting the full calendar window that
//! covers the dates asked for and mapping each returned trading day back to
//! the request. Prices are decoded from the raw JSON number tokens into
//! exact decimals (`serde_json` runs with `arbitrary_precision`, so
//! `1898.00` stays `1898.00`); nothing passes through an `f64`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Number;

use crate::feed::{FeedError, FeedFetcher, FetchOutcome, UnresolvedDate};
use crate::{PriceBar, Ticker, TradeDate};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = concat!("tickvault/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SECONDS_PER_DAY: i64 = 86_400;

pub struct YahooFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooFetcher {
    pub fn new() -> Result<Self, FeedError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the fetcher at an alternative host (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| FeedError::Transport {
                detail: error.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// One chart request covering `[start, end]`, decoded per trading day.
    fn chart_bars(
        &self,
        ticker: &Ticker,
        start: TradeDate,
        end: TradeDate,
    ) -> Result<BTreeMap<TradeDate, Result<PriceBar, FeedError>>, FeedError> {
        let period1 = start.unix_midnight_utc();
        let period2 = end
            .next()
            .map(TradeDate::unix_midnight_utc)
            .unwrap_or_else(|| end.unix_midnight_utc() + SECONDS_PER_DAY);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={period1}&period2={period2}&interval=1d&events=history",
            self.base_url,
            urlencoding::encode(ticker.as_str()),
        );
        log::debug!("fetching {url}");

        let response = self.client.get(&url).send().map_err(|error| {
            FeedError::Transport {
                detail: error.to_string(),
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::Transport {
                detail: format!("upstream returned status {status}"),
            });
        }

        let payload: ChartResponse = response.json().map_err(|error| FeedError::Malformed {
            detail: error.to_string(),
        })?;
        decode_chart(payload, ticker)
    }
}

impl FeedFetcher for YahooFetcher {
    fn fetch_one(&self, ticker: &Ticker, date: TradeDate) -> Result<PriceBar, FeedError> {
        let FetchOutcome {
            resolved,
            unresolved,
        } = self.fetch_many(ticker, &[date])?;

        if let Some((_, bar)) = resolved.into_iter().next() {
            return Ok(bar);
        }
        Err(unresolved
            .into_iter()
            .next()
            .map(|miss| miss.error)
            .unwrap_or(FeedError::NoQuoteForDate { date }))
    }

    fn fetch_many(&self, ticker: &Ticker, dates: &[TradeDate]) -> Result<FetchOutcome, FeedError> {
        let (Some(start), Some(end)) = (dates.iter().min(), dates.iter().max()) else {
            return Err(FeedError::EmptyDateList);
        };

        let bars = self.chart_bars(ticker, *start, *end)?;

        let mut outcome = FetchOutcome::default();
        for date in dates {
            match bars.get(date) {
                Some(Ok(bar)) => outcome.resolved.push((*date, bar.clone())),
                Some(Err(error)) => outcome.unresolved.push(UnresolvedDate {
                    date: *date,
                    error: error.clone(),
                }),
                None => outcome.unresolved.push(UnresolvedDate {
                    date: *date,
                    error: FeedError::NoQuoteForDate { date: *date },
                }),
            }
        }
        Ok(outcome)
    }
}

fn decode_chart(
    payload: ChartResponse,
    ticker: &Ticker,
) -> Result<BTreeMap<TradeDate, Result<PriceBar, FeedError>>, FeedError> {
    if let Some(error) = payload.chart.error {
        // The chart endpoint reports unknown symbols via the error object.
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(FeedError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        return Err(FeedError::Malformed {
            detail: format!("{}: {}", error.code, error.description),
        });
    }

    let result = payload
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| FeedError::Malformed {
            detail: String::from("chart result missing"),
        })?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FeedError::Malformed {
            detail: String::from("chart quote block missing"),
        })?;
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|block| block.adjclose)
        .unwrap_or_default();

    let mut bars = BTreeMap::new();
    for (index, timestamp) in timestamps.iter().enumerate() {
        let Some(date) = TradeDate::from_unix_timestamp(*timestamp) else {
            continue;
        };
        bars.insert(date, decode_bar(date, &quote, &adjclose, index));
    }
    Ok(bars)
}

fn decode_bar(
    date: TradeDate,
    quote: &ChartQuote,
    adjclose: &[Option<Number>],
    index: usize,
) -> Result<PriceBar, FeedError> {
    let open = price_at(&quote.open, index, date)?;
    let high = price_at(&quote.high, index, date)?;
    let low = price_at(&quote.low, index, date)?;
    let close = price_at(&quote.close, index, date)?;
    // Adjusted close is absent for some instruments; fall back to close.
    let adj_close = match adjclose.get(index).and_then(Option::as_ref) {
        Some(number) => number.as_str().to_owned(),
        None => close.clone(),
    };
    let volume = quote
        .volume
        .get(index)
        .copied()
        .flatten()
        .unwrap_or_default();

    PriceBar::parse(&open, &high, &low, &close, &adj_close, &volume.to_string()).map_err(|error| {
        FeedError::Malformed {
            detail: error.to_string(),
        }
    })
}

fn price_at(
    values: &[Option<Number>],
    index: usize,
    date: TradeDate,
) -> Result<String, FeedError> {
    values
        .get(index)
        .and_then(Option::as_ref)
        .map(|number| number.as_str().to_owned())
        .ok_or(FeedError::NoQuoteForDate { date })
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    open: Vec<Option<Number>>,
    high: Vec<Option<Number>>,
    low: Vec<Option<Number>>,
    close: Vec<Option<Number>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct ChartAdjClose {
    adjclose: Vec<Option<Number>>,
}
