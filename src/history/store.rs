//! JSON persistence for [`HistoryLedger`].
//!
//! File layout:
//!
//! ```json
//! {
//!   "next_id": 42,
//!   "records": [
//!     { "id": 40, "value": "PJJ123C", "copies": 2, "printer": "Letter",
//!       "timestamp": "2024-05-01T12:00:00Z" }
//!   ]
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{HistoryLedger, HistoryRecord};
use crate::error::EtiquetaError;

/// Default number of records kept on disk
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Serialize, Deserialize)]
struct Persisted {
    next_id: u64,
    records: Vec<HistoryRecord>,
}

/// A history file and how many records it retains.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Read the ledger. A missing file is an empty ledger; anything
    /// unreadable is an error.
    pub fn load(&self) -> Result<HistoryLedger, EtiquetaError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no history at {}, starting empty", self.path.display());
                return Ok(HistoryLedger::new());
            }
            Err(e) => return Err(e.into()),
        };

        let persisted: Persisted = serde_json::from_str(&text).map_err(|e| {
            EtiquetaError::Config(format!("{}: {}", self.path.display(), e))
        })?;
        let mut ledger = HistoryLedger::from_parts(persisted.next_id, persisted.records)?;
        // Hand-edited files may hold more than the limit
        ledger.compact(self.limit);
        log::info!(
            "loaded {} history records from {}",
            ledger.len(),
            self.path.display()
        );
        Ok(ledger)
    }

    /// Write the newest `limit` records plus the id counter.
    pub fn save(&self, ledger: &HistoryLedger) -> Result<(), EtiquetaError> {
        let records = ledger.records();
        let skip = records.len().saturating_sub(self.limit);
        let persisted = Persisted {
            next_id: ledger.next_id(),
            records: records[skip..].to_vec(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| EtiquetaError::Config(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
