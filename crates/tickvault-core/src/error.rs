use thiserror::Error;

/// Validation errors raised when constructing domain values from
/// untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("date must be an ISO-8601 calendar date (YYYY-MM-DD): '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' is not a valid decimal: '{value}'")]
    InvalidPrice { field: &'static str, value: String },
    #[error("volume is not a valid non-negative integer: '{value}'")]
    InvalidVolume { value: String },
}
