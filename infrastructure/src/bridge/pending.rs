//! Pending-request table
//!
//! Maps a request id to the HTTP caller awaiting it. Completions arrive
//! out of submission order (the extension interleaves work), so the
//! table is keyed by request id and each entry resolves exactly its own
//! caller.
//!
//! Every entry owns an explicitly cancellable timer task; `resolve` and
//! `reject` abort it on completion, so "no late timeout after a
//! resolution" is structural rather than a convention to remember.

use council_application::DispatchError;
use council_domain::{CouncilOutcome, RequestId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::trace;

/// What a waiting caller eventually receives.
pub type DispatchResult = Result<CouncilOutcome, DispatchError>;

struct PendingEntry {
    tx: oneshot::Sender<DispatchResult>,
    /// Set right after registration; `None` only in the brief window
    /// before the timer task exists.
    timer: Option<AbortHandle>,
}

/// Table of requests awaiting a terminal event from the extension.
///
/// All three entry points (`register`, `resolve`/`reject`,
/// `reject_all`) take the one lock for the duration of the map edit, so
/// no two of them can race on the same key: completion always deletes,
/// and registration always creates a fresh key.
pub struct PendingTable {
    /// `std::sync::Mutex` (not tokio): held only for map edits, never
    /// across an await.
    entries: Mutex<HashMap<RequestId, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Create an entry and its timeout timer; returns the receiver the
    /// caller awaits.
    ///
    /// The entry is inserted before the timer task is spawned, so even a
    /// zero timeout cannot fire into a not-yet-registered id and leave
    /// the caller waiting forever.
    pub fn register(
        self: &Arc<Self>,
        request_id: RequestId,
        timeout: Duration,
    ) -> oneshot::Receiver<DispatchResult> {
        let (tx, rx) = oneshot::channel();

        {
            let mut entries = self.lock_entries();
            entries.insert(request_id.clone(), PendingEntry { tx, timer: None });
        }

        let timer = {
            let table: Weak<Self> = Arc::downgrade(self);
            let id = request_id.clone();
            let timeout_ms = timeout.as_millis() as u64;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(table) = table.upgrade() {
                    table.reject(&id, DispatchError::Timeout(timeout_ms));
                }
            })
            .abort_handle()
        };

        let mut entries = self.lock_entries();
        match entries.get_mut(&request_id) {
            Some(entry) => entry.timer = Some(timer),
            // Completed in the window before the timer existed.
            None => timer.abort(),
        }

        rx
    }

    /// Fulfil the waiting caller with a successful outcome.
    ///
    /// Returns false (and does nothing) for an unknown or already
    /// completed id — duplicate terminal events are a no-op.
    pub fn resolve(&self, request_id: &RequestId, outcome: CouncilOutcome) -> bool {
        self.complete(request_id, Ok(outcome))
    }

    /// Fulfil the waiting caller with a failure. Same idempotence as
    /// [`resolve`](Self::resolve).
    pub fn reject(&self, request_id: &RequestId, error: DispatchError) -> bool {
        self.complete(request_id, Err(error))
    }

    /// Reject every pending entry in one sweep (extension disconnect).
    ///
    /// A single lock acquisition drains the map, so no caller can land
    /// in a half-swept table.
    pub fn reject_all(&self, error: DispatchError) -> usize {
        let drained: Vec<PendingEntry> = {
            let mut entries = self.lock_entries();
            entries.drain().map(|(_, entry)| entry).collect()
        };

        let count = drained.len();
        for entry in drained {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            let _ = entry.tx.send(Err(error.clone()));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn complete(&self, request_id: &RequestId, result: DispatchResult) -> bool {
        let entry = {
            let mut entries = self.lock_entries();
            entries.remove(request_id)
        };

        match entry {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                // The receiver may have been dropped (caller gone);
                // that is not our problem to report.
                let _ = entry.tx.send(result);
                true
            }
            None => {
                trace!(request_id = %request_id, "completion for unknown request id");
                false
            }
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, PendingEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> RequestId {
        RequestId::new(format!("req-{n}"))
    }

    #[tokio::test]
    async fn resolve_reaches_the_registered_caller() {
        let table = PendingTable::new();
        let rx = table.register(id(1), Duration::from_secs(5));

        assert!(table.resolve(&id(1), CouncilOutcome::default()));
        assert!(table.is_empty());
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn timeout_rejects_and_cleans_up() {
        let table = PendingTable::new();
        let rx = table.register(id(1), Duration::from_millis(20));

        let result = rx.await.unwrap();
        assert_eq!(result, Err(DispatchError::Timeout(20)));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn resolve_cancels_the_timer() {
        let table = PendingTable::new();
        let rx = table.register(id(1), Duration::from_millis(20));

        assert!(table.resolve(&id(1), CouncilOutcome::default()));
        // Wait well past the deadline: the aborted timer must not have
        // re-registered or paniced anything.
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(rx.await.unwrap().is_ok());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_no_op() {
        let table = PendingTable::new();
        let rx = table.register(id(1), Duration::from_secs(5));

        assert!(table.resolve(&id(1), CouncilOutcome::default()));
        assert!(!table.resolve(&id(1), CouncilOutcome::default()));
        assert!(!table.reject(&id(1), DispatchError::Disconnected));

        // Exactly one resolution reached the caller.
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn unordered_completions_resolve_the_right_callers() {
        let table = PendingTable::new();
        let rx1 = table.register(id(1), Duration::from_secs(5));
        let rx2 = table.register(id(2), Duration::from_secs(5));

        let outcome2 = CouncilOutcome {
            stage3: vec![council_domain::ChairmanSynthesis::new("c2", "C2")],
            ..CouncilOutcome::default()
        };
        assert!(table.resolve(&id(2), outcome2));
        assert!(table.reject(&id(1), DispatchError::Remote("nope".into())));

        assert_eq!(
            rx1.await.unwrap(),
            Err(DispatchError::Remote("nope".into()))
        );
        let resolved2 = rx2.await.unwrap().unwrap();
        assert_eq!(resolved2.stage3[0].chairman_id.as_str(), "c2");
    }

    #[tokio::test]
    async fn disconnect_sweep_rejects_everyone_and_empties_the_table() {
        let table = PendingTable::new();
        let receivers: Vec<_> = (0..8)
            .map(|n| table.register(id(n), Duration::from_secs(5)))
            .collect();
        assert_eq!(table.len(), 8);

        assert_eq!(table.reject_all(DispatchError::Disconnected), 8);

        assert!(table.is_empty());
        for rx in receivers {
            assert_eq!(rx.await.unwrap(), Err(DispatchError::Disconnected));
        }
    }

    #[tokio::test]
    async fn racing_resolve_and_reject_deliver_exactly_one_outcome() {
        // Fuzz the ordering: whoever wins the race, the caller sees
        // exactly one result and the table ends empty.
        for round in 0..50 {
            let table = PendingTable::new();
            let rx = table.register(id(round), Duration::from_secs(5));

            let resolver = {
                let table = Arc::clone(&table);
                let rid = id(round);
                tokio::spawn(async move { table.resolve(&rid, CouncilOutcome::default()) })
            };
            let rejecter = {
                let table = Arc::clone(&table);
                let rid = id(round);
                tokio::spawn(
                    async move { table.reject(&rid, DispatchError::Disconnected) },
                )
            };

            let resolved = resolver.await.unwrap();
            let rejected = rejecter.await.unwrap();
            assert!(
                resolved ^ rejected,
                "exactly one completion must win (round {round})"
            );
            assert!(table.is_empty());
            // The receiver observes the winner's result and nothing else.
            let _ = rx.await.unwrap();
        }
    }

    #[tokio::test]
    async fn zero_timeout_still_rejects_instead_of_hanging() {
        let table = PendingTable::new();
        let rx = table.register(id(1), Duration::from_millis(0));

        let result = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("zero-timeout entry must still complete")
            .unwrap();
        assert_eq!(result, Err(DispatchError::Timeout(0)));
        assert!(table.is_empty());
    }
}
