//! Session domain entities

use crate::core::{provider::ProviderId, request_id::RequestId, tier::Tier};
use crate::council::outcome::{ChairmanSynthesis, PeerRanking, ProviderResponse};
use crate::deliberation::stage::DeliberationStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable snapshot of one deliberation (Entity)
///
/// Created when the first provider response for a new request id is
/// persisted, then overwritten wholesale after every meaningful event.
/// Partial sessions (interrupted, errored) are first-class: history and
/// resume both read from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilSession {
    /// Session id — identical to the request id that started it.
    pub id: RequestId,
    pub question: String,
    pub tier: Tier,
    #[serde(default)]
    pub provider_ids: Vec<ProviderId>,
    #[serde(default)]
    pub chairman_ids: Vec<ProviderId>,
    #[serde(default)]
    pub responses: Vec<ProviderResponse>,
    #[serde(default)]
    pub peer_reviews: Vec<PeerRanking>,
    #[serde(default)]
    pub label_to_model: BTreeMap<String, ProviderId>,
    #[serde(default)]
    pub syntheses: Vec<ChairmanSynthesis>,
    pub stage: DeliberationStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CouncilSession {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            question: self.question.clone(),
            tier: self.tier.clone(),
            stage: self.stage,
            created_at: self.created_at,
        }
    }
}

/// List projection of a session, for history endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: RequestId,
    pub question: String,
    pub tier: Tier,
    pub stage: DeliberationStage,
    pub created_at: DateTime<Utc>,
}
