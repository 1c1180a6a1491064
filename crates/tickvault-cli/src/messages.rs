//! Every user-facing string, in one place.

use std::path::Path;

use tickvault_core::{PriceBar, ServiceError, Ticker, TradeDate, ValidationError};

pub fn database_created(location: &Path) -> String {
    format!("Welcome! A new database has been created: {}\n", location.display())
}

pub fn database_loaded(location: &Path) -> String {
    format!("Welcome! Database {} has been loaded\n", location.display())
}

pub fn main_menu() -> String {
    let mut msg = String::from("Please select from the following options:\n\n");
    msg += "\t1. View Securities\n";
    msg += "\t2. Add Securities\n";
    msg += "\t3. Update Market Data\n";
    msg += "\t4. Quit\n";
    msg
}

pub fn option_input() -> &'static str {
    "Option: "
}

pub fn invalid_option() -> &'static str {
    "The option selected is invalid"
}

pub fn view_securities(tickers: &[Ticker]) -> String {
    let mut msg = if tickers.is_empty() {
        String::from("\nCurrently no securities have been added to database.\n\n")
    } else {
        String::from("\nThe following securities are in the database:\n\n")
    };
    msg += "0. Return to Main Menu\n";
    for (num, ticker) in tickers.iter().enumerate() {
        msg += &format!("{}. {ticker}\n", num + 1);
    }
    msg
}

pub fn add_security_input() -> &'static str {
    "Enter Yahoo ticker for the security you want to add: "
}

pub fn security_added(ticker: &Ticker) -> String {
    format!("\n{ticker} has been added")
}

pub fn invalid_ticker(error: &ValidationError) -> String {
    format!("\nThat ticker cannot be added: {error}")
}

pub fn no_security_data(ticker: &Ticker) -> String {
    format!("\nNo data available for {ticker}")
}

pub fn security_table(ticker: &Ticker, series: &[(TradeDate, PriceBar)]) -> String {
    let mut msg = format!("{ticker}\n{}\n\n", "=".repeat(ticker.as_str().len()));
    msg += "Date         |   Open   |   High   |   Low    |   Close   \n";
    msg += "==========================================================\n";
    for (date, bar) in series {
        msg += &format!(
            "{}   | {:>8} | {:>8} | {:>8} | {:>8}\n",
            date.format_iso(),
            bar.open.round_dp(2).to_string(),
            bar.high.round_dp(2).to_string(),
            bar.low.round_dp(2).to_string(),
            bar.close.round_dp(2).to_string(),
        );
    }
    msg
}

pub fn any_key_to_return() -> &'static str {
    "Press enter to return to view securities page..."
}

pub fn update_failed(ticker: &Ticker, error: &ServiceError) -> String {
    format!("{ticker}: update failed: {error}")
}

pub fn unresolved_dates(ticker: &Ticker, count: usize) -> String {
    format!("{ticker}: {count} date(s) could not be resolved by the feed")
}

pub fn market_data_updated() -> &'static str {
    "All market data has been updated..."
}

pub fn service_error(error: &ServiceError) -> String {
    format!("\n{error}")
}

pub fn quit() -> &'static str {
    "\nThank you for using the Market Data Application. Goodbye!"
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).expect("ticker")
    }

    #[test]
    fn empty_register_lists_only_the_return_option() {
        let msg = view_securities(&[]);
        assert!(msg.contains("Currently no securities"));
        assert!(msg.contains("0. Return to Main Menu"));
    }

    #[test]
    fn register_lists_tickers_one_based() {
        let msg = view_securities(&[ticker("AMZN"), ticker("GOOG")]);
        assert!(msg.contains("1. AMZN"));
        assert!(msg.contains("2. GOOG"));
    }

    #[test]
    fn table_rounds_prices_to_two_places_for_display() {
        let bar = PriceBar::new(
            Decimal::from_str("1898.00").expect("open"),
            Decimal::from_str("1903.79").expect("high"),
            Decimal::from_str("1856.004").expect("low"),
            Decimal::from_str("1889.98").expect("close"),
            Decimal::from_str("1889.98").expect("adj close"),
            5_718_000,
        );
        let date = TradeDate::parse("2019-05-10").expect("date");
        let msg = security_table(&ticker("AMZN"), &[(date, bar)]);
        assert!(msg.starts_with("AMZN\n====\n"));
        assert!(msg.contains("2019-05-10"));
        assert!(msg.contains("1856.00"));
        assert!(!msg.contains("1856.004"));
    }
}
