//! Wire frames exchanged over the extension socket
//!
//! A single connection carries two kinds of traffic: outbound
//! `council_request` frames (plus keepalive) and inbound tagged frames —
//! either connection control (`extension_ready`, `ping`, `pong`) or a
//! [`CouncilEvent`] envelope carrying the owning `requestId`.
//!
//! [`parse_inbound`] is a pure classifier with no side effects, called
//! once per text frame by the bridge dispatch loop.

use crate::core::request_id::RequestId;
use crate::council::event::CouncilEvent;
use crate::council::request::CouncilRequest;
use serde::Serialize;
use thiserror::Error;

/// Event `type` tags accepted inside an event envelope.
const EVENT_TYPES: &[&str] = &[
    "start",
    "heartbeat",
    "stage",
    "provider_start",
    "provider_done",
    "provider_response",
    "review_done",
    "synthesis_start",
    "synthesis_content",
    "synthesis_error",
    "result",
    "error",
    "done",
];

/// Frame sent from the bridge to the extension
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    CouncilRequest { payload: CouncilRequest },
    Ping,
    Pong,
}

impl OutboundFrame {
    /// Serialize to the JSON text carried in a WebSocket text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Json)
    }
}

/// Frame received from the extension, classified
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// Sent once by a (re)connecting extension; observability only.
    ExtensionReady,
    Ping,
    Pong,
    /// A tagged progress event for one request.
    Event {
        request_id: RequestId,
        event: CouncilEvent,
    },
}

/// Mirror of the live protocol for in-process consumers
///
/// The bridge re-broadcasts every accepted request and every inbound
/// event on this type, so the deliberation tracker (and any other
/// observer) sees the same stream a push-channel client would.
#[derive(Debug, Clone)]
pub enum CouncilNotice {
    /// A request was handed to the extension.
    Submitted(CouncilRequest),
    /// The extension reported progress for a request.
    Event {
        request_id: RequestId,
        event: CouncilEvent,
    },
}

/// Errors classifying or serializing a wire frame
#[derive(Error, Debug)]
pub enum WireError {
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no type field")]
    MissingType,

    #[error("unknown frame type: {0}")]
    UnknownType(String),

    #[error("event frame {0} missing requestId")]
    MissingRequestId(String),
}

/// Classify one inbound text frame.
///
/// Unknown `type` values are an error the dispatcher logs and drops;
/// they never tear down the connection.
pub fn parse_inbound(text: &str) -> Result<InboundFrame, WireError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(WireError::MissingType)?;

    match kind {
        "extension_ready" => Ok(InboundFrame::ExtensionReady),
        "ping" => Ok(InboundFrame::Ping),
        "pong" => Ok(InboundFrame::Pong),
        kind if EVENT_TYPES.contains(&kind) => {
            let request_id = value
                .get("requestId")
                .and_then(|v| v.as_str())
                .map(RequestId::from)
                .ok_or_else(|| WireError::MissingRequestId(kind.to_string()))?;

            let event: CouncilEvent = serde_json::from_value(value)?;
            Ok(InboundFrame::Event { request_id, event })
        }
        other => Err(WireError::UnknownType(other.to_string())),
    }
}
