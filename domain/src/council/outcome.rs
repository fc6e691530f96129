//! Staged council outcome types
//!
//! These mirror the JSON payloads produced by the extension: one entry
//! per provider for stage 1, anonymized rankings for stage 2, and one
//! entry per chairman for stage 3. Wire field names are camelCase.

use crate::core::provider::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One provider's stage-1 answer
///
/// Keyed by `provider_id` in response maps; a later response for the
/// same provider replaces the earlier one, it is never appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub provider_id: ProviderId,
    pub provider_display_name: String,
    pub model: String,
    #[serde(default)]
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResponse {
    /// Create a successful response
    pub fn success(
        provider_id: impl Into<ProviderId>,
        display_name: impl Into<String>,
        model: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_display_name: display_name.into(),
            model: model.into(),
            response_text: text.into(),
            error: None,
        }
    }

    /// Create a failed response
    pub fn failure(
        provider_id: impl Into<ProviderId>,
        display_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_display_name: display_name.into(),
            model: String::new(),
            response_text: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One reviewer's stage-2 ranking over anonymized responses
///
/// `ranked_labels` lists anonymous labels ("Response A", ...) best-first;
/// `evaluation` is the reviewer's free-text justification, also phrased
/// in terms of labels. Real identities are only recoverable through the
/// session's label-to-provider map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRanking {
    pub reviewer: ProviderId,
    #[serde(default)]
    pub reviewer_display_name: String,
    #[serde(default)]
    pub evaluation: String,
    #[serde(default)]
    pub ranked_labels: Vec<String>,
}

/// Derived per-provider standing after the review stage
///
/// Not authoritative: computed from the individual [`PeerRanking`]s and
/// recomputable at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRanking {
    pub provider_id: ProviderId,
    pub provider_display_name: String,
    /// Mean 1-based rank position; lower is better.
    pub average_rank: f64,
    pub votes_count: u32,
}

/// One chairman's stage-3 synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChairmanSynthesis {
    pub chairman_id: ProviderId,
    #[serde(default)]
    pub chairman_display_name: String,
    #[serde(default)]
    pub synthesis_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChairmanSynthesis {
    pub fn new(chairman_id: impl Into<ProviderId>, display_name: impl Into<String>) -> Self {
        Self {
            chairman_id: chairman_id.into(),
            chairman_display_name: display_name.into(),
            synthesis_text: String::new(),
            error: None,
        }
    }

    pub fn failed(
        chairman_id: impl Into<ProviderId>,
        display_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            chairman_id: chairman_id.into(),
            chairman_display_name: display_name.into(),
            synthesis_text: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Review-stage metadata: the anonymization map plus derived standings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilMetadata {
    #[serde(default)]
    pub label_to_model: BTreeMap<String, ProviderId>,
    #[serde(default)]
    pub aggregate_rankings: Vec<AggregateRanking>,
}

/// The full staged payload carried by a terminal `result` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouncilOutcome {
    #[serde(default)]
    pub stage1: Vec<ProviderResponse>,
    #[serde(default)]
    pub stage2: Vec<PeerRanking>,
    #[serde(default)]
    pub stage3: Vec<ChairmanSynthesis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CouncilMetadata>,
}
