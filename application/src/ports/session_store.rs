//! Session store port

use async_trait::async_trait;
use council_domain::{CouncilSession, RequestId, SessionSummary};
use thiserror::Error;

/// Errors from the session persistence backend
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Repository for deliberation session snapshots
///
/// Retains a bounded, most-recent-N ring of sessions. `save` is an
/// upsert keyed by session id: saving the same session twice yields one
/// record, and each save replaces the whole record (no patching), so a
/// reader never observes a half-updated session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &CouncilSession) -> Result<(), SessionStoreError>;

    async fn get(&self, id: &RequestId) -> Result<Option<CouncilSession>, SessionStoreError>;

    /// Summaries, most recent first.
    async fn list(&self) -> Result<Vec<SessionSummary>, SessionStoreError>;

    /// Returns whether a session with that id existed.
    async fn delete(&self, id: &RequestId) -> Result<bool, SessionStoreError>;
}
