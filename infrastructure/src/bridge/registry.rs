//! Connection registry — the single extension socket slot
//!
//! At most one extension connection is authoritative at any moment. A
//! new registration supersedes the old connection (it is told to close
//! with a normal-closure code); a superseded socket's close can never
//! evict its successor because eviction is guarded by connection id.
//!
//! The slot is the only place the connection handle is mutated; every
//! other component goes through [`send`](ConnectionRegistry::send).

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Commands handed to the socket pump task that owns the write half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    /// Send a JSON text frame.
    Send(String),
    /// Answer a protocol-level ping.
    Pong(Vec<u8>),
    /// Close with a normal-closure code (this connection was superseded).
    Close,
}

/// Identity of one registered connection; monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Extension not connected")]
pub struct NotConnected;

struct Slot {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<SocketCommand>,
}

/// Holds the sole live extension connection.
pub struct ConnectionRegistry {
    /// Brief map-style lock; never held across an await.
    slot: Mutex<Option<Slot>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a new connection as the sole authoritative endpoint.
    ///
    /// Any previous connection is told to close; its pump task ends and
    /// its eventual `clear_if_current` is a no-op.
    pub fn register(&self, tx: mpsc::UnboundedSender<SocketCommand>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let previous = {
            let mut slot = self.lock_slot();
            slot.replace(Slot { id, tx })
        };

        if let Some(previous) = previous {
            info!(
                superseded = previous.id.0,
                current = id.0,
                "new extension connection supersedes the old one"
            );
            let _ = previous.tx.send(SocketCommand::Close);
        }
        id
    }

    /// Clear the slot if `id` is still the registered connection.
    ///
    /// Returns whether this close was authoritative — the caller runs
    /// the disconnect sweep exactly when it was.
    pub fn clear_if_current(&self, id: ConnectionId) -> bool {
        let mut slot = self.lock_slot();
        match slot.as_ref() {
            Some(current) if current.id == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock_slot().is_some()
    }

    /// Send a command over the live connection, if there is one.
    pub fn send(&self, command: SocketCommand) -> Result<(), NotConnected> {
        let slot = self.lock_slot();
        match slot.as_ref() {
            Some(current) => current.tx.send(command).map_err(|_| NotConnected),
            None => Err(NotConnected),
        }
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
