//! Trade ledger module
//!
//! The ledger is the spreadsheet of record: one row per trade, upserted by
//! trade id so reruns never duplicate rows

mod row;
mod store;
mod summary;

pub use row::{upsert_rows, LedgerRow, UpsertSummary};
pub use store::{JsonFileLedger, MemoryLedger};
pub use summary::LedgerSummary;

use async_trait::async_trait;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Backing file could not be read or written
    #[error("Ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Backing file is not a valid ledger
    #[error("Ledger is corrupt: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for ledger backends
#[async_trait]
pub trait Ledger: Send + Sync {
    /// All rows in sheet order
    async fn rows(&self) -> Result<Vec<LedgerRow>, LedgerError>;
    /// Insert or replace rows keyed by trade id
    async fn upsert(&self, rows: Vec<LedgerRow>) -> Result<UpsertSummary, LedgerError>;
}
