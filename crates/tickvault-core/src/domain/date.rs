use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Weekday};

use crate::ValidationError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date of one trading day, rendered as ISO-8601 (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Current calendar date in UTC.
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// The following calendar day, `None` past the supported range.
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Monday through Friday.
    pub fn is_weekday(self) -> bool {
        !matches!(self.0.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    /// Unix timestamp of this date's midnight, UTC.
    pub fn unix_midnight_utc(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// The UTC calendar date containing a unix timestamp.
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(timestamp)
            .ok()
            .map(|moment| Self(moment.date()))
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(DATE_FORMAT)
            .expect("TradeDate must be ISO-8601 formattable")
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_iso_date() {
        let parsed = TradeDate::parse("2019-05-10").expect("must parse");
        assert_eq!(parsed.format_iso(), "2019-05-10");
    }

    #[test]
    fn rejects_malformed_date() {
        let err = TradeDate::parse("10-May-2019").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn weekday_classification() {
        let friday = TradeDate::parse("2019-08-23").expect("friday");
        let saturday = TradeDate::parse("2019-08-24").expect("saturday");
        let sunday = TradeDate::parse("2019-08-25").expect("sunday");
        assert!(friday.is_weekday());
        assert!(!saturday.is_weekday());
        assert!(!sunday.is_weekday());
    }

    #[test]
    fn next_advances_one_calendar_day() {
        let friday = TradeDate::parse("2019-08-23").expect("friday");
        assert_eq!(friday.next().expect("next").format_iso(), "2019-08-24");
    }

    #[test]
    fn orders_by_calendar_date() {
        let earlier = TradeDate::parse("2019-08-23").expect("earlier");
        let later = TradeDate::parse("2019-08-27").expect("later");
        assert!(earlier < later);
    }
}
