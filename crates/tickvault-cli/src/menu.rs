//! Interactive menu loop.
//!
//! Reads options and tickers from the given input, renders through the
//! given output, and dispatches to the market-data service. Domain errors
//! surfaced by the service are rendered as messages; only I/O faults on the
//! console itself abort the loop. End-of-input behaves like Quit.

use std::io::{BufRead, Write};

use tickvault_core::{FeedFetcher, MarketDataService, Ticker};

use crate::error::CliError;
use crate::messages;

pub struct Menu<'a, F, R, W> {
    service: &'a mut MarketDataService<F>,
    input: R,
    output: W,
}

impl<'a, F, R, W> Menu<'a, F, R, W>
where
    F: FeedFetcher,
    R: BufRead,
    W: Write,
{
    pub fn new(service: &'a mut MarketDataService<F>, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn run_loop(&mut self) -> Result<(), CliError> {
        loop {
            writeln!(self.output, "{}", messages::main_menu())?;
            let Some(choice) = self.prompt(messages::option_input())? else {
                return Ok(());
            };

            match choice.trim().parse::<u32>() {
                Ok(1) => self.view_securities()?,
                Ok(2) => self.add_security()?,
                Ok(3) => self.update_market_data()?,
                Ok(4) => {
                    writeln!(self.output, "{}", messages::quit())?;
                    return Ok(());
                }
                _ => writeln!(self.output, "{}", messages::invalid_option())?,
            }
        }
    }

    fn view_securities(&mut self) -> Result<(), CliError> {
        loop {
            let tickers = match self.service.securities() {
                Ok(tickers) => tickers,
                Err(error) => {
                    writeln!(self.output, "{}", messages::service_error(&error))?;
                    return Ok(());
                }
            };
            writeln!(self.output, "{}", messages::view_securities(&tickers))?;

            let Some(choice) = self.prompt(messages::option_input())? else {
                return Ok(());
            };
            match choice.trim().parse::<usize>() {
                Ok(0) => return Ok(()),
                Ok(num) if num <= tickers.len() => {
                    self.view_one_security(&tickers[num - 1])?;
                }
                _ => writeln!(self.output, "{}", messages::invalid_option())?,
            }
        }
    }

    fn view_one_security(&mut self, ticker: &Ticker) -> Result<(), CliError> {
        match self.service.series(ticker) {
            Ok(series) if series.is_empty() => {
                writeln!(self.output, "{}", messages::no_security_data(ticker))?;
            }
            Ok(series) => {
                writeln!(self.output, "{}", messages::security_table(ticker, &series))?;
                self.prompt(messages::any_key_to_return())?;
            }
            Err(error) => {
                writeln!(self.output, "{}", messages::service_error(&error))?;
            }
        }
        Ok(())
    }

    fn add_security(&mut self) -> Result<(), CliError> {
        let Some(raw) = self.prompt(messages::add_security_input())? else {
            return Ok(());
        };

        let ticker = match Ticker::parse(&raw) {
            Ok(ticker) => ticker,
            Err(error) => {
                writeln!(self.output, "{}", messages::invalid_ticker(&error))?;
                return Ok(());
            }
        };

        match self.service.add_security(&ticker) {
            Ok(()) => writeln!(self.output, "{}", messages::security_added(&ticker))?,
            Err(error) => writeln!(self.output, "{}", messages::service_error(&error))?,
        }
        Ok(())
    }

    fn update_market_data(&mut self) -> Result<(), CliError> {
        let tickers = match self.service.securities() {
            Ok(tickers) => tickers,
            Err(error) => {
                writeln!(self.output, "{}", messages::service_error(&error))?;
                return Ok(());
            }
        };

        for ticker in &tickers {
            match self.service.update_range(ticker) {
                Ok(outcome) if !outcome.unresolved.is_empty() => {
                    writeln!(
                        self.output,
                        "{}",
                        messages::unresolved_dates(ticker, outcome.unresolved.len())
                    )?;
                }
                Ok(_) => {}
                Err(error) => {
                    writeln!(self.output, "{}", messages::update_failed(ticker, &error))?;
                }
            }
        }

        writeln!(self.output, "{}", messages::market_data_updated())?;
        Ok(())
    }

    /// Prompt and read one line; `None` on end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, CliError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }
}
