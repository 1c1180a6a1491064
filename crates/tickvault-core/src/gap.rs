//! Business-day gap calculator.

use crate::TradeDate;

/// Dates needing a refresh for a ticker, oldest first.
///
/// The cursor starts the day after `latest` when a latest stored date
/// exists, otherwise at `today` itself (a store with no history refreshes
/// from the present, not from an arbitrary epoch). It advances one calendar
/// day at a time up to and including `today`, keeping Monday–Friday only.
/// No holiday calendar is modelled. Pure computation; no I/O.
pub fn refresh_dates(latest: Option<TradeDate>, today: TradeDate) -> Vec<TradeDate> {
    let mut cursor = match latest {
        Some(date) => match date.next() {
            Some(next) => next,
            None => return Vec::new(),
        },
        None => today,
    };

    let mut dates = Vec::new();
    while cursor <= today {
        if cursor.is_weekday() {
            dates.push(cursor);
        }
        cursor = match cursor.next() {
            Some(next) => next,
            None => break,
        };
    }
    dates
}
