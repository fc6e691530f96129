//! File-backed session store
//!
//! Holds the bounded most-recent-N ring in memory and rewrites the whole
//! file on every save through a temp file + atomic rename. A crash
//! mid-write therefore loses at most the latest increment, never the
//! history; a torn or corrupt file degrades to an empty ring with a
//! warning instead of refusing to start.

use async_trait::async_trait;
use council_application::{SessionStore, SessionStoreError};
use council_domain::{CouncilSession, RequestId, SessionSummary};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Sessions retained when the config does not say otherwise.
pub const DEFAULT_CAPACITY: usize = 50;

/// JSON-file implementation of the [`SessionStore`] port.
pub struct FileSessionStore {
    path: PathBuf,
    capacity: usize,
    /// Newest first. The tokio mutex is held across the file write so
    /// writers are fully serialized — last writer wins on whole
    /// records, interleaved partial writes cannot happen.
    ring: Mutex<Vec<CouncilSession>>,
}

impl FileSessionStore {
    /// Open (or create) the store at `path`, loading surviving history.
    pub async fn open(
        path: impl Into<PathBuf>,
        capacity: usize,
    ) -> Result<Self, SessionStoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut ring = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<CouncilSession>>(&bytes) {
                Ok(sessions) => sessions,
                Err(error) => {
                    warn!(
                        %error,
                        path = %path.display(),
                        "session file unreadable, starting with empty history"
                    );
                    Vec::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error.into()),
        };

        let capacity = capacity.max(1);
        ring.truncate(capacity);
        debug!(count = ring.len(), path = %path.display(), "session history loaded");

        Ok(Self {
            path,
            capacity,
            ring: Mutex::new(ring),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn write_ring(&self, ring: &[CouncilSession]) -> Result<(), SessionStoreError> {
        let json = serde_json::to_vec_pretty(ring)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &CouncilSession) -> Result<(), SessionStoreError> {
        let mut ring = self.ring.lock().await;

        match ring.iter_mut().find(|s| s.id == session.id) {
            // Full-record replace, keeping the session's ring position.
            Some(existing) => *existing = session.clone(),
            None => {
                ring.insert(0, session.clone());
                ring.truncate(self.capacity);
            }
        }

        self.write_ring(&ring).await
    }

    async fn get(&self, id: &RequestId) -> Result<Option<CouncilSession>, SessionStoreError> {
        let ring = self.ring.lock().await;
        Ok(ring.iter().find(|s| &s.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, SessionStoreError> {
        let ring = self.ring.lock().await;
        Ok(ring.iter().map(CouncilSession::summary).collect())
    }

    async fn delete(&self, id: &RequestId) -> Result<bool, SessionStoreError> {
        let mut ring = self.ring.lock().await;
        let before = ring.len();
        ring.retain(|s| &s.id != id);

        if ring.len() == before {
            return Ok(false);
        }
        self.write_ring(&ring).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{DeliberationStage, Tier};
    use std::collections::BTreeMap;

    fn session(id: &str) -> CouncilSession {
        CouncilSession {
            id: RequestId::new(id),
            question: format!("question {id}"),
            tier: Tier::Normal,
            provider_ids: vec![],
            chairman_ids: vec![],
            responses: vec![],
            peer_reviews: vec![],
            label_to_model: BTreeMap::new(),
            syntheses: vec![],
            stage: DeliberationStage::Deliberating,
            error: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions.json"), 10)
            .await
            .unwrap();

        store.save(&session("req-1")).await.unwrap();

        let loaded = store.get(&RequestId::new("req-1")).await.unwrap().unwrap();
        assert_eq!(loaded.question, "question req-1");
        assert!(store.get(&RequestId::new("req-2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn double_save_yields_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions.json"), 10)
            .await
            .unwrap();

        let mut s = session("req-1");
        store.save(&s).await.unwrap();
        s.stage = DeliberationStage::Done;
        store.save(&s).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].stage, DeliberationStage::Done);
    }

    #[tokio::test]
    async fn ring_evicts_oldest_beyond_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions.json"), 3)
            .await
            .unwrap();

        for n in 0..5 {
            store.save(&session(&format!("req-{n}"))).await.unwrap();
        }

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 3);
        // Newest first; req-0 and req-1 were evicted.
        assert_eq!(summaries[0].id.as_str(), "req-4");
        assert_eq!(summaries[2].id.as_str(), "req-2");
        assert!(store.get(&RequestId::new("req-0")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        {
            let store = FileSessionStore::open(&path, 10).await.unwrap();
            store.save(&session("req-1")).await.unwrap();
            store.save(&session("req-2")).await.unwrap();
        }

        let reopened = FileSessionStore::open(&path, 10).await.unwrap();
        let summaries = reopened.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id.as_str(), "req-2");
    }

    #[tokio::test]
    async fn corrupt_file_degrades_to_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        tokio::fs::write(&path, b"{ not json ]").await.unwrap();

        let store = FileSessionStore::open(&path, 10).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        // And the store is writable again afterwards.
        store.save(&session("req-1")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions.json"), 10)
            .await
            .unwrap();

        store.save(&session("req-1")).await.unwrap();

        assert!(store.delete(&RequestId::new("req-1")).await.unwrap());
        assert!(!store.delete(&RequestId::new("req-1")).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopen_applies_tighter_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        {
            let store = FileSessionStore::open(&path, 10).await.unwrap();
            for n in 0..5 {
                store.save(&session(&format!("req-{n}"))).await.unwrap();
            }
        }

        let reopened = FileSessionStore::open(&path, 2).await.unwrap();
        assert_eq!(reopened.list().await.unwrap().len(), 2);
    }
}
