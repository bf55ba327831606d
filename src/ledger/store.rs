//! Ledger backends

use super::{upsert_rows, Ledger, LedgerError, LedgerRow, UpsertSummary};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

/// In-memory ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    rows: RwLock<Vec<LedgerRow>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn rows(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        Ok(self.rows.read().await.clone())
    }

    async fn upsert(&self, rows: Vec<LedgerRow>) -> Result<UpsertSummary, LedgerError> {
        let mut table = self.rows.write().await;
        Ok(upsert_rows(&mut table, rows))
    }
}

/// Ledger kept as a JSON array on disk
///
/// Every upsert rewrites the whole file through a temporary sibling and a
/// rename. A missing file reads as an empty ledger.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_table(&self, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(rows)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for JsonFileLedger {
    async fn rows(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        self.read_table().await
    }

    async fn upsert(&self, rows: Vec<LedgerRow>) -> Result<UpsertSummary, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut table = self.read_table().await?;
        let summary = upsert_rows(&mut table, rows);
        if summary.inserted + summary.updated > 0 {
            self.write_table(&table).await?;
        }
        tracing::debug!(
            path = %self.path.display(),
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "Ledger upserted"
        );
        Ok(summary)
    }
}
