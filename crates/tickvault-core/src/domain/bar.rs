use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickvault_store::BarRow;

use crate::ValidationError;

/// One day's prices for one security.
///
/// Price fields are exact decimals so values survive persist/reload cycles
/// without binary-float drift. The store does not validate OHLC ordering
/// (source data may violate high >= low); values pass through as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: u64,
}

impl PriceBar {
    pub const fn new(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        adj_close: Decimal,
        volume: u64,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        }
    }

    /// Build a bar from untrusted string fields, rejecting anything that
    /// does not parse as numeric.
    pub fn parse(
        open: &str,
        high: &str,
        low: &str,
        close: &str,
        adj_close: &str,
        volume: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            open: parse_price("open", open)?,
            high: parse_price("high", high)?,
            low: parse_price("low", low)?,
            close: parse_price("close", close)?,
            adj_close: parse_price("adj_close", adj_close)?,
            volume: parse_volume(volume)?,
        })
    }

    /// Storage representation: decimals rendered as exact strings.
    pub fn to_row(&self) -> BarRow {
        BarRow {
            open: self.open.to_string(),
            high: self.high.to_string(),
            low: self.low.to_string(),
            close: self.close.to_string(),
            adj_close: self.adj_close.to_string(),
            volume: self.volume,
        }
    }

    /// Rebuild from a stored row.
    pub fn from_row(row: &BarRow) -> Result<Self, ValidationError> {
        Ok(Self {
            open: parse_price("open", &row.open)?,
            high: parse_price("high", &row.high)?,
            low: parse_price("low", &row.low)?,
            close: parse_price("close", &row.close)?,
            adj_close: parse_price("adj_close", &row.adj_close)?,
            volume: row.volume,
        })
    }
}

fn parse_price(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(value.trim()).map_err(|_| ValidationError::InvalidPrice {
        field,
        value: value.to_owned(),
    })
}

fn parse_volume(value: &str) -> Result<u64, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidVolume {
            value: value.to_owned(),
        })
}
