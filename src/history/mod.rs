//! # Print History
//!
//! Append-only ledger of completed print jobs, used for reprint-by-id.
//!
//! ## Storage
//!
//! ```text
//! records: [ #1 "A" ][ #2 "B" ][ #4 "A" ][ #5 "C" ]     oldest → newest
//! index:   { 1 → 0, 2 → 1, 4 → 2, 5 → 3 }
//! next_id: 6
//! ```
//!
//! Ids only ever grow. Gaps appear when older records are compacted away
//! (see [`HistoryLedger::compact`]), and `next_id` is persisted alongside the
//! records so an id is never handed out twice.
//!
//! ## Modules
//!
//! - [`store`]: JSON persistence

pub mod store;

pub use store::HistoryStore;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::barcode::BarcodeValue;
use crate::error::EtiquetaError;

/// One completed print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub value: BarcodeValue,
    pub copies: u32,
    /// Name of the printer that received the job
    pub printer: String,
    pub timestamp: DateTime<Utc>,
}

/// A record before the ledger assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub value: BarcodeValue,
    pub copies: u32,
    pub printer: String,
}

/// Ordering for [`HistoryLedger::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    OldestFirst,
    #[default]
    NewestFirst,
}

/// Everything printed for one value, aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeTally {
    pub value: BarcodeValue,
    /// Sum of copies across all prints of this value
    pub total_copies: u64,
    /// Number of print jobs
    pub prints: u32,
    pub last_printed: DateTime<Utc>,
    /// Id of the most recent record, handy for reprint
    pub last_id: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryLedger {
    records: Vec<HistoryRecord>,
    index: HashMap<u64, usize>,
    next_id: u64,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a ledger from persisted state.
    ///
    /// `records` must be oldest-first with strictly increasing ids. A stale
    /// `next_id` is raised past the newest record.
    pub fn from_parts(next_id: u64, records: Vec<HistoryRecord>) -> Result<Self, EtiquetaError> {
        if let Some(pair) = records.windows(2).find(|w| w[0].id >= w[1].id) {
            return Err(EtiquetaError::Config(format!(
                "history ids out of order: {} then {}",
                pair[0].id, pair[1].id
            )));
        }

        let newest = records.last().map_or(0, |r| r.id);
        let mut ledger = Self {
            records,
            index: HashMap::new(),
            next_id: next_id.max(newest + 1).max(1),
        };
        ledger.reindex();
        Ok(ledger)
    }

    /// Record a print now.
    pub fn append(&mut self, record: NewRecord) -> HistoryRecord {
        self.append_at(record, Utc::now())
    }

    /// Record a print with an explicit timestamp.
    pub fn append_at(&mut self, record: NewRecord, timestamp: DateTime<Utc>) -> HistoryRecord {
        let entry = HistoryRecord {
            id: self.next_id,
            value: record.value,
            copies: record.copies,
            printer: record.printer,
            timestamp,
        };
        self.next_id += 1;

        self.index.insert(entry.id, self.records.len());
        self.records.push(entry.clone());
        log::info!(
            "history #{}: {:?} x{} on {}",
            entry.id,
            entry.value.as_str(),
            entry.copies,
            entry.printer
        );
        entry
    }

    pub fn get(&self, id: u64) -> Result<HistoryRecord, EtiquetaError> {
        self.index
            .get(&id)
            .map(|&i| self.records[i].clone())
            .ok_or(EtiquetaError::NotFound(id))
    }

    pub fn list(&self, order: ListOrder) -> Vec<HistoryRecord> {
        match order {
            ListOrder::OldestFirst => self.records.clone(),
            ListOrder::NewestFirst => self.records.iter().rev().cloned().collect(),
        }
    }

    /// Oldest-first view of the stored records.
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Per-value totals, most recently printed value first.
    pub fn summary(&self) -> Vec<BarcodeTally> {
        let mut tallies: Vec<BarcodeTally> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();

        for record in self.records.iter().rev() {
            match position.get(record.value.as_str()) {
                Some(&i) => {
                    tallies[i].total_copies += record.copies as u64;
                    tallies[i].prints += 1;
                }
                None => {
                    position.insert(record.value.as_str(), tallies.len());
                    tallies.push(BarcodeTally {
                        value: record.value.clone(),
                        total_copies: record.copies as u64,
                        prints: 1,
                        last_printed: record.timestamp,
                        last_id: record.id,
                    });
                }
            }
        }
        tallies
    }

    /// Drop all but the newest `keep` records. Ids are not reused afterwards.
    pub fn compact(&mut self, keep: usize) {
        if self.records.len() <= keep {
            return;
        }
        let dropped = self.records.len() - keep;
        self.records.drain(..dropped);
        self.reindex();
        log::debug!("history compacted: dropped {} oldest records", dropped);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next appended record will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
    }
}

// ============================================================================
// TESTS
// ============================================================================
