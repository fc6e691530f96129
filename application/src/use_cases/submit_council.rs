//! Submit council use case
//!
//! The server-side entry point of the protocol: everything between "an
//! HTTP body arrived" and "the extension owns the request" lives here,
//! so the HTTP layer only translates types and status codes.

use crate::ports::extension_gateway::{DispatchError, ExtensionGateway};
use council_domain::{CouncilOutcome, CouncilRequest, ProviderId, Query, RequestId, Tier};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Chairman used when the caller names none.
pub const DEFAULT_CHAIRMAN: &str = "claude";

/// Errors that can occur submitting a council request
///
/// Every failure mode a caller can observe is typed; nothing escapes the
/// API boundary as a raw panic or a bare string.
#[derive(Error, Debug)]
pub enum SubmitCouncilError {
    /// Caller error; nothing was sent, no pending entry exists.
    #[error("{0}")]
    InvalidRequest(String),

    /// No live extension connection — failed fast, no timer started.
    #[error("Extension not connected")]
    NoExtension,

    /// Deadline elapsed; the pending entry is already cleaned up. The
    /// extension may still complete the work.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        request_id: RequestId,
        timeout_ms: u64,
    },

    /// The extension dropped while this request was in flight.
    #[error("Extension disconnected")]
    Disconnected { request_id: RequestId },

    /// The deliberation failed for a business reason; not retried here.
    #[error("{message}")]
    Council {
        request_id: RequestId,
        message: String,
    },
}

impl SubmitCouncilError {
    /// Request id to echo back to the caller, when one was assigned.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            SubmitCouncilError::InvalidRequest(_) | SubmitCouncilError::NoExtension => None,
            SubmitCouncilError::Timeout { request_id, .. }
            | SubmitCouncilError::Disconnected { request_id }
            | SubmitCouncilError::Council { request_id, .. } => Some(request_id),
        }
    }
}

/// Timeout limits enforced server-side, independent of the caller.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub default_ms: u64,
    pub max_ms: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            default_ms: 120_000,
            max_ms: 300_000,
        }
    }
}

impl TimeoutPolicy {
    /// Clamp a caller-supplied timeout into `[0, max_ms]`.
    pub fn clamp(&self, requested_ms: Option<u64>) -> u64 {
        requested_ms.unwrap_or(self.default_ms).min(self.max_ms)
    }
}

/// Raw input for the use case, exactly as the HTTP body supplies it.
#[derive(Debug, Clone, Default)]
pub struct SubmitCouncilInput {
    pub query: String,
    pub tier: Option<String>,
    /// `None` means "use the default chairman"; an explicit empty list
    /// is a caller error.
    pub chairmen: Option<Vec<String>>,
    pub timeout_ms: Option<u64>,
}

/// Result returned to a successful caller.
#[derive(Debug, Clone)]
pub struct CouncilReply {
    pub request_id: RequestId,
    pub outcome: CouncilOutcome,
    pub duration_ms: u64,
}

/// Use case for submitting one question to the council
pub struct SubmitCouncilUseCase<G: ExtensionGateway> {
    gateway: Arc<G>,
    timeouts: TimeoutPolicy,
}

impl<G: ExtensionGateway> SubmitCouncilUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            timeouts: TimeoutPolicy::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Execute the use case.
    ///
    /// Validation happens before any side effect: an invalid request
    /// never creates a pending entry, and a missing extension fails in
    /// microseconds rather than waiting out a doomed timeout.
    pub async fn execute(
        &self,
        input: SubmitCouncilInput,
    ) -> Result<CouncilReply, SubmitCouncilError> {
        let query = Query::try_new(input.query)
            .ok_or_else(|| SubmitCouncilError::InvalidRequest("Query is required".to_string()))?;
        let chairman_ids = resolve_chairmen(input.chairmen)?;
        let tier = input
            .tier
            .as_deref()
            .map(Tier::parse)
            .unwrap_or_default();
        let timeout_ms = self.timeouts.clamp(input.timeout_ms);

        if !self.gateway.is_connected() {
            return Err(SubmitCouncilError::NoExtension);
        }

        let request_id = RequestId::new(Uuid::new_v4().to_string());
        let request = CouncilRequest::new(request_id.clone(), query, tier, chairman_ids);

        let started = Instant::now();
        let result = self
            .gateway
            .dispatch(&request, Duration::from_millis(timeout_ms))
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => {
                info!(
                    request_id = %request_id,
                    outcome = "ok",
                    duration_ms,
                    "council request resolved"
                );
                Ok(CouncilReply {
                    request_id,
                    outcome,
                    duration_ms,
                })
            }
            Err(error) => {
                warn!(
                    request_id = %request_id,
                    outcome = %error,
                    duration_ms,
                    "council request failed"
                );
                Err(map_dispatch_error(error, request_id, timeout_ms))
            }
        }
    }
}

fn resolve_chairmen(
    chairmen: Option<Vec<String>>,
) -> Result<Vec<ProviderId>, SubmitCouncilError> {
    let Some(names) = chairmen else {
        return Ok(vec![ProviderId::new(DEFAULT_CHAIRMAN)]);
    };

    let mut ids: Vec<ProviderId> = Vec::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let id = ProviderId::new(name);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(SubmitCouncilError::InvalidRequest(
            "At least one chairman is required".to_string(),
        ));
    }
    Ok(ids)
}

fn map_dispatch_error(
    error: DispatchError,
    request_id: RequestId,
    timeout_ms: u64,
) -> SubmitCouncilError {
    match error {
        // The connection vanished between the liveness check and the
        // send; to the caller that is the same as never having had one.
        DispatchError::NotConnected => SubmitCouncilError::NoExtension,
        DispatchError::Timeout(_) => SubmitCouncilError::Timeout {
            request_id,
            timeout_ms,
        },
        DispatchError::Disconnected => SubmitCouncilError::Disconnected { request_id },
        DispatchError::Remote(message) => SubmitCouncilError::Council {
            request_id,
            message,
        },
        DispatchError::Encode(message) => SubmitCouncilError::Council {
            request_id,
            message,
        },
        DispatchError::ChannelClosed => SubmitCouncilError::Council {
            request_id,
            message: "Request cancelled".to_string(),
        },
    }
}
