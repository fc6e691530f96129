//! Deliberation tracking use case
//!
//! Consumes the bridge's mirrored protocol stream and keeps session
//! snapshots current through the [`SessionStore`] port. One tracker task
//! serves every concurrent deliberation; sessions are independent and an
//! `error` in one never touches its siblings.

use crate::ports::session_store::SessionStore;
use council_domain::{CouncilEvent, CouncilNotice, DeliberationState, RequestId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Folds the live event stream into persisted [`CouncilSession`](council_domain::CouncilSession)s.
pub struct DeliberationTracker<S: SessionStore> {
    store: Arc<S>,
    active: Mutex<HashMap<RequestId, DeliberationState>>,
}

impl<S: SessionStore> DeliberationTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Consume notices until the bridge side of the channel closes.
    pub async fn run(self: Arc<Self>, mut notices: broadcast::Receiver<CouncilNotice>) {
        loop {
            match notices.recv().await {
                Ok(notice) => self.handle(notice).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Snapshots self-heal on the next persist-worthy
                    // event, so a lag is loud but not fatal.
                    warn!(skipped, "deliberation tracker lagged behind the event stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("deliberation tracker stopped");
    }

    /// Apply one notice.
    pub async fn handle(&self, notice: CouncilNotice) {
        match notice {
            CouncilNotice::Submitted(request) => {
                let mut active = self.active.lock().await;
                // A brand-new question always begins a brand-new session
                // keyed by its fresh request id; prior sessions are
                // untouched.
                active.insert(
                    request.request_id.clone(),
                    DeliberationState::for_request(&request),
                );
            }
            CouncilNotice::Event { request_id, event } => {
                self.apply(&request_id, &event).await;
            }
        }
    }

    /// Drive the reducer for one event and persist when it says so.
    pub async fn apply(&self, request_id: &RequestId, event: &CouncilEvent) {
        let (snapshot, finished) = {
            let mut active = self.active.lock().await;
            let state = active
                .entry(request_id.clone())
                .or_insert_with(|| DeliberationState::new(request_id.clone()));

            let outcome = state.apply(event);
            let snapshot = outcome.persist().then(|| state.snapshot());
            let finished = state.is_terminal();
            if finished {
                active.remove(request_id);
            }
            (snapshot, finished)
        };

        if let Some(snapshot) = snapshot
            && let Err(error) = self.store.save(&snapshot).await
        {
            warn!(
                request_id = %request_id,
                %error,
                "failed to persist deliberation snapshot"
            );
        }

        if finished {
            debug!(request_id = %request_id, "deliberation finished");
        }
    }

    /// Number of deliberations currently being tracked.
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }
}
