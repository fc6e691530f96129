//! Extension gateway port

use async_trait::async_trait;
use council_domain::{CouncilOutcome, CouncilRequest};
use std::time::Duration;
use thiserror::Error;

/// Failures the transport can report for one dispatched request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No live extension connection at send time.
    #[error("Extension not connected")]
    NotConnected,

    /// The per-request deadline elapsed before a terminal event. The
    /// extension may still finish the work; the caller must not assume
    /// a side-effect-free retry.
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// The extension connection dropped while this request was pending.
    #[error("Extension disconnected")]
    Disconnected,

    /// The deliberation itself failed; the extension's message verbatim.
    #[error("Council failed: {0}")]
    Remote(String),

    /// The request frame could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// The pending entry vanished without a resolution (bridge bug or
    /// shutdown race); surfaced as an internal failure.
    #[error("Response channel closed")]
    ChannelClosed,
}

/// Port to the single live extension connection
///
/// Implemented by the bridge in the infrastructure layer. `dispatch`
/// registers the request for correlation, forwards it over the socket,
/// and suspends until the terminal event, the deadline, or a disconnect,
/// whichever comes first. All other methods are synchronous and
/// non-blocking.
#[async_trait]
pub trait ExtensionGateway: Send + Sync {
    /// Whether an extension socket is currently registered.
    fn is_connected(&self) -> bool;

    /// Drive one request to its terminal outcome.
    async fn dispatch(
        &self,
        request: &CouncilRequest,
        timeout: Duration,
    ) -> Result<CouncilOutcome, DispatchError>;
}
