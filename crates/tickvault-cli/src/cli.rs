//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tickvault_core::BackendKind;

/// Menu-driven console for a local equity market-data store.
///
/// Point it at a store file and manage the security register, browse stored
/// daily price series, and refresh them from the price feed. A missing
/// store file is created on first use.
#[derive(Debug, Parser)]
#[command(name = "tickvault", version, about = "Local equity market-data store console")]
pub struct Cli {
    /// Location of the store file.
    pub store: PathBuf,

    /// Storage backend for the store file.
    #[arg(long, value_enum, default_value_t = BackendChoice::Duckdb)]
    pub backend: BackendChoice,
}

/// Backend selector as exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    Json,
    Duckdb,
}

impl From<BackendChoice> for BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Json => Self::Json,
            BackendChoice::Duckdb => Self::DuckDb,
        }
    }
}
