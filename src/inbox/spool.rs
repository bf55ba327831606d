//! Spool directory mail source

use super::{split_message, MailMessage, MailSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Subdirectory receiving processed messages
const PROCESSED_DIR: &str = "processed";

/// Reads `*.eml` and `*.txt` files dropped into a directory
///
/// Processed files are moved into `processed/` under the spool directory.
#[derive(Debug, Clone)]
pub struct SpoolDirSource {
    dir: PathBuf,
}

impl SpoolDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn is_message(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("eml") | Some("txt")
        )
    }
}

#[async_trait]
impl MailSource for SpoolDirSource {
    async fn fetch_unread(&self) -> anyhow::Result<Vec<MailMessage>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "Spool directory missing, nothing to read");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && Self::is_message(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let raw = tokio::fs::read_to_string(&path).await?;
            let (subject, body) = split_message(&raw);
            messages.push(MailMessage { id, subject, body });
        }

        tracing::debug!(count = messages.len(), "Read spooled notifications");
        Ok(messages)
    }

    async fn mark_processed(&self, id: &str) -> anyhow::Result<()> {
        let processed = self.dir.join(PROCESSED_DIR);
        tokio::fs::create_dir_all(&processed).await?;
        tokio::fs::rename(self.dir.join(id), processed.join(id)).await?;
        Ok(())
    }
}
