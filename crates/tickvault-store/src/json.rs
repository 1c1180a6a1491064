//! Single-document JSON file backend.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{BarRow, StoreBackend, StoreError};

/// On-disk document: the security register plus a per-ticker, date-keyed
/// bar map. `BTreeMap` keeps the ISO date keys in calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    securities: Vec<String>,
    #[serde(default)]
    bars: BTreeMap<String, BTreeMap<String, BarRow>>,
}

/// File-backed JSON store. Every operation loads the full document and
/// every mutation writes it back before returning.
pub struct JsonBackend {
    path: PathBuf,
    open: bool,
}

impl JsonBackend {
    /// Write a fresh, empty document at `path`.
    pub fn create(path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                location: path.display().to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        save_document(path, &Document::default())
    }

    /// Open an existing document, validating that it parses.
    pub fn connect(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound {
                location: path.display().to_string(),
            });
        }
        let backend = Self {
            path: path.to_path_buf(),
            open: true,
        };
        backend.load()?;
        Ok(backend)
    }

    fn load(&self) -> Result<Document, StoreError> {
        if !self.open {
            return Err(StoreError::Closed);
        }
        let file = File::open(&self.path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|error| StoreError::Corrupt {
            detail: format!("{}: {error}", self.path.display()),
        })
    }

    fn save(&self, document: &Document) -> Result<(), StoreError> {
        save_document(&self.path, document)
    }

    fn registered(document: &Document, ticker: &str) -> Result<(), StoreError> {
        if document.securities.iter().any(|known| known == ticker) {
            Ok(())
        } else {
            Err(StoreError::UnknownTicker {
                ticker: ticker.to_owned(),
            })
        }
    }
}

fn save_document(path: &Path, document: &Document) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, document)?;
    writer.flush()?;
    Ok(())
}

impl StoreBackend for JsonBackend {
    fn securities(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.securities)
    }

    fn insert_securities(&mut self, tickers: &[String]) -> Result<(), StoreError> {
        let mut document = self.load()?;
        for ticker in tickers {
            if !document.securities.iter().any(|known| known == ticker) {
                document.securities.push(ticker.clone());
            }
            document.bars.entry(ticker.clone()).or_default();
        }
        self.save(&document)
    }

    fn upsert_bar(&mut self, ticker: &str, date: &str, bar: &BarRow) -> Result<(), StoreError> {
        self.bulk_upsert_bars(ticker, &[(date.to_owned(), bar.clone())])
    }

    fn bulk_upsert_bars(
        &mut self,
        ticker: &str,
        rows: &[(String, BarRow)],
    ) -> Result<(), StoreError> {
        let mut document = self.load()?;
        Self::registered(&document, ticker)?;
        let history = document.bars.entry(ticker.to_owned()).or_default();
        for (date, bar) in rows {
            history.insert(date.clone(), bar.clone());
        }
        self.save(&document)
    }

    fn bar(&self, ticker: &str, date: &str) -> Result<BarRow, StoreError> {
        let document = self.load()?;
        Self::registered(&document, ticker)?;
        document
            .bars
            .get(ticker)
            .and_then(|history| history.get(date))
            .cloned()
            .ok_or_else(|| StoreError::NoBarForDate {
                ticker: ticker.to_owned(),
                date: date.to_owned(),
            })
    }

    fn series(&self, ticker: &str) -> Result<Vec<(String, BarRow)>, StoreError> {
        let document = self.load()?;
        Self::registered(&document, ticker)?;
        let history = match document.bars.get(ticker) {
            Some(history) => history,
            None => return Ok(Vec::new()),
        };
        Ok(history
            .iter()
            .rev()
            .map(|(date, bar)| (date.clone(), bar.clone()))
            .collect())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        // Nothing held open between operations; just bar further use.
        self.open = false;
        Ok(())
    }
}
