mod cli;
mod error;
mod menu;
mod messages;

use std::io;

use clap::Parser;

use tickvault_core::store::{self, StoreConfig, StoreError};
use tickvault_core::{MarketDataService, ServiceError, YahooFetcher};

use crate::cli::Cli;
use crate::error::CliError;
use crate::menu::Menu;

fn main() {
    env_logger::init();

    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = StoreConfig::new(cli.store, cli.backend.into());

    let fetcher = YahooFetcher::new()?;
    let mut service = MarketDataService::new(fetcher);

    // Store creation is the front end's explicit act: connect first, and
    // only create (then retry) when the store is genuinely missing.
    match service.run(&config) {
        Ok(()) => println!("{}", messages::database_loaded(&config.location)),
        Err(ServiceError::Store(StoreError::NotFound { .. })) => {
            store::create(&config)?;
            service.run(&config)?;
            println!("{}", messages::database_created(&config.location));
        }
        Err(error) => return Err(error.into()),
    }

    let stdin = io::stdin();
    let result = Menu::new(&mut service, stdin.lock(), io::stdout()).run_loop();
    service.close()?;
    result
}
