//! Request bridge — correlates HTTP callers with the extension socket
//!
//! The extension holds **one** WebSocket connection to this server, but
//! any number of HTTP callers may have requests in flight concurrently.
//! [`CouncilBridge`] makes that safe:
//!
//! 1. **Own** the single connection slot through the
//!    [`ConnectionRegistry`] (a reconnect supersedes the old socket).
//! 2. **Correlate** request–response pairs via the [`PendingTable`]'s
//!    oneshot channels, keyed by request id, with a cancellable timer
//!    per entry.
//! 3. **Dispatch** every inbound frame: keepalive is answered here,
//!    terminal events resolve their pending caller, and the full event
//!    stream is mirrored on a broadcast channel for in-process
//!    consumers (the deliberation tracker).
//! 4. **Sweep** on disconnect: every pending caller is rejected in one
//!    atomic pass — nobody is left hanging past a detected disconnect.

pub mod pending;
pub mod registry;

use async_trait::async_trait;
use council_application::{DispatchError, ExtensionGateway};
use council_domain::{
    CouncilEvent, CouncilNotice, CouncilOutcome, CouncilRequest, InboundFrame, OutboundFrame,
    RequestId, parse_inbound,
};
use pending::PendingTable;
use registry::{ConnectionId, ConnectionRegistry, SocketCommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

/// Buffered notices before a slow in-process consumer starts lagging.
const NOTICE_CAPACITY: usize = 256;

/// The server side of the council protocol.
pub struct CouncilBridge {
    registry: ConnectionRegistry,
    pending: Arc<PendingTable>,
    notices: broadcast::Sender<CouncilNotice>,
}

impl CouncilBridge {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            registry: ConnectionRegistry::new(),
            pending: PendingTable::new(),
            notices,
        }
    }

    /// Subscribe to the mirrored protocol stream.
    pub fn subscribe(&self) -> broadcast::Receiver<CouncilNotice> {
        self.notices.subscribe()
    }

    /// Register a freshly upgraded extension socket.
    pub fn register_connection(
        &self,
        tx: mpsc::UnboundedSender<SocketCommand>,
    ) -> ConnectionId {
        let id = self.registry.register(tx);
        info!(connection = ?id, "extension connected");
        id
    }

    /// A socket closed. If it was the authoritative connection, clear
    /// the slot and reject every pending request in one sweep.
    pub fn connection_closed(&self, id: ConnectionId) {
        if self.registry.clear_if_current(id) {
            let rejected = self.pending.reject_all(DispatchError::Disconnected);
            if rejected > 0 {
                warn!(rejected, "extension disconnected with requests pending");
            } else {
                info!("extension disconnected");
            }
        } else {
            debug!(connection = ?id, "superseded connection closed");
        }
    }

    /// Answer a protocol-level WebSocket ping from the socket task.
    pub fn pong(&self, payload: Vec<u8>) {
        let _ = self.registry.send(SocketCommand::Pong(payload));
    }

    /// Handle one inbound text frame from the extension.
    pub fn handle_frame(&self, text: &str) {
        match parse_inbound(text) {
            Ok(InboundFrame::ExtensionReady) => info!("extension ready"),
            Ok(InboundFrame::Ping) => {
                match OutboundFrame::Pong.to_json() {
                    Ok(json) => {
                        let _ = self.registry.send(SocketCommand::Send(json));
                    }
                    Err(error) => warn!(%error, "failed to encode pong"),
                }
            }
            Ok(InboundFrame::Pong) => trace!("keepalive pong"),
            Ok(InboundFrame::Event { request_id, event }) => {
                self.handle_event(request_id, event);
            }
            Err(error) => warn!(%error, "dropping unparseable frame"),
        }
    }

    fn handle_event(&self, request_id: RequestId, event: CouncilEvent) {
        trace!(request_id = %request_id, event = ?event, "inbound event");

        match &event {
            CouncilEvent::Result { payload } => {
                if !self.pending.resolve(&request_id, payload.clone()) {
                    // Duplicate terminal event or a caller that already
                    // timed out; idempotently dropped.
                    debug!(request_id = %request_id, "result for unknown request");
                }
            }
            CouncilEvent::Error { message } => {
                if !self
                    .pending
                    .reject(&request_id, DispatchError::Remote(message.clone()))
                {
                    debug!(request_id = %request_id, "error for unknown request");
                }
            }
            _ => {}
        }

        // Mirror every event, terminals included, to in-process
        // consumers. Send only fails when nobody subscribes.
        let _ = self.notices.send(CouncilNotice::Event { request_id, event });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for CouncilBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionGateway for CouncilBridge {
    fn is_connected(&self) -> bool {
        self.registry.is_connected()
    }

    async fn dispatch(
        &self,
        request: &CouncilRequest,
        timeout: Duration,
    ) -> Result<CouncilOutcome, DispatchError> {
        let frame = OutboundFrame::CouncilRequest {
            payload: request.clone(),
        }
        .to_json()
        .map_err(|error| DispatchError::Encode(error.to_string()))?;

        // Register before sending so a fast extension cannot answer a
        // request the table does not know yet.
        let rx = self
            .pending
            .register(request.request_id.clone(), timeout);

        if self.registry.send(SocketCommand::Send(frame)).is_err() {
            // Connection vanished between the liveness check and the
            // send; clean our own entry up and fail like never-connected.
            self.pending
                .reject(&request.request_id, DispatchError::NotConnected);
        } else {
            let _ = self.notices.send(CouncilNotice::Submitted(request.clone()));
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::ChannelClosed),
        }
    }
}
