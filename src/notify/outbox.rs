//! Digest delivery backends

use super::{Digest, Notifier};
use crate::config::NotifyConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Logs the digest subject
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, digest: &Digest) -> anyhow::Result<()> {
        tracing::info!(run_id = %digest.run_id, subject = %digest.subject(), "Run digest");
        Ok(())
    }
}

/// Writes each digest as an RFC 5322 message into an outbox directory
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    dir: PathBuf,
    from: String,
    to: Vec<String>,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>, from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            from: from.into(),
            to,
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(&config.outbox_dir, &config.from, config.to.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full message text with headers
    pub fn render_message(&self, digest: &Digest) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMessage-ID: <{}@signal-bot>\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            self.from,
            self.to.join(", "),
            digest.subject(),
            digest.generated_at.to_rfc2822(),
            digest.run_id,
            digest.render_text().replace('\n', "\r\n"),
        )
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn send(&self, digest: &Digest) -> anyhow::Result<()> {
        if self.to.is_empty() {
            anyhow::bail!("No digest recipients configured");
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.eml", digest.run_id));
        tokio::fs::write(&path, self.render_message(digest)).await?;
        tracing::info!(path = %path.display(), recipients = self.to.len(), "Digest queued");
        Ok(())
    }
}
