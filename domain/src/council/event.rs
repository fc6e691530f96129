//! Tagged progress events streamed by the extension
//!
//! Every event belongs to exactly one request and is delivered in causal
//! order for that request (a `provider_done` never precedes its
//! `provider_start`). The set is closed: the reducer in
//! [`deliberation`](crate::deliberation) matches exhaustively.

use crate::core::provider::ProviderId;
use crate::council::outcome::{CouncilOutcome, PeerRanking, ProviderResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One tagged event in a deliberation's progress stream
///
/// The `type` field on the wire selects the variant; payload field names
/// are camelCase. Stage labels arrive as free strings and are mapped to
/// [`DeliberationStage`](crate::deliberation::stage::DeliberationStage)
/// by the reducer so an unknown label degrades to a no-op instead of a
/// parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// Deliberation accepted by the extension; informational only.
    Start,
    /// Keepalive so intermediaries don't reap the connection; no effect.
    Heartbeat,
    /// Move to a later stage ("deliberation", "peer_review", "synthesis").
    Stage { stage: String },
    #[serde(rename_all = "camelCase")]
    ProviderStart { provider_id: ProviderId },
    #[serde(rename_all = "camelCase")]
    ProviderDone { provider_id: ProviderId },
    /// A provider's (possibly re-sent) stage-1 answer.
    ProviderResponse {
        #[serde(flatten)]
        response: ProviderResponse,
    },
    /// Review stage finished; replaces any prior ranking list wholesale.
    #[serde(rename_all = "camelCase")]
    ReviewDone {
        #[serde(default)]
        rankings: Vec<PeerRanking>,
        #[serde(default)]
        label_to_model: BTreeMap<String, ProviderId>,
    },
    #[serde(rename_all = "camelCase")]
    SynthesisStart { chairman_id: ProviderId },
    /// Cumulative synthesis text so far (full replace, not a delta).
    #[serde(rename_all = "camelCase")]
    SynthesisContent {
        chairman_id: ProviderId,
        #[serde(default)]
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    SynthesisError {
        chairman_id: ProviderId,
        error: String,
    },
    /// Terminal success: the authoritative staged payload.
    Result { payload: CouncilOutcome },
    /// Terminal failure for this deliberation only.
    Error { message: String },
    /// Stream finished; active-worker sets can be cleared.
    Done,
}

impl CouncilEvent {
    /// Whether this event ends the request's event stream for the bridge
    /// (resolves or rejects the pending HTTP caller).
    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilEvent::Result { .. } | CouncilEvent::Error { .. })
    }
}
