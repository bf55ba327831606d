//! Notification intake
//!
//! Broker and market notification emails land in a spool directory, picked
//! up by an external mail fetcher. Tickers mentioned in them join the run's
//! watchlist.

mod parse;
mod spool;

pub use parse::{is_ticker, parse_alerts, split_message};
pub use spool::SpoolDirSource;

use crate::signal::Direction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A notification message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Source-specific identifier
    pub id: String,
    pub subject: String,
    pub body: String,
}

/// A ticker mentioned in a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    /// Direction suggested by the wording, if any
    pub hint: Option<Direction>,
}

impl Alert {
    /// Whether the scored direction matches the hint, when both exist
    pub fn agrees_with(&self, scored: Option<Direction>) -> Option<bool> {
        Some(self.hint? == scored?)
    }
}


/// Trait for notification sources
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Messages not yet processed
    async fn fetch_unread(&self) -> anyhow::Result<Vec<MailMessage>>;
    /// Mark a message so it is not fetched again
    async fn mark_processed(&self, id: &str) -> anyhow::Result<()>;
}
