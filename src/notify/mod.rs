//! Run notifications
//!
//! A digest of each run is handed to a [`Notifier`]. Delivery itself belongs
//! to an external mailer that drains the outbox.

mod digest;
mod outbox;

pub use digest::Digest;
pub use outbox::{LogNotifier, OutboxNotifier};

use async_trait::async_trait;

/// Trait for digest delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, digest: &Digest) -> anyhow::Result<()>;
}
