//! Council request entity

use crate::core::{provider::ProviderId, query::Query, request_id::RequestId, tier::Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question submitted to the council (Entity)
///
/// Immutable once sent: the bridge serializes it into a `council_request`
/// frame and never touches it again. All progress for it is keyed by
/// `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilRequest {
    pub request_id: RequestId,
    pub query: Query,
    pub tier: Tier,
    /// Providers designated to synthesize the final answer; never empty.
    pub chairman_ids: Vec<ProviderId>,
    pub created_at: DateTime<Utc>,
}

impl CouncilRequest {
    pub fn new(
        request_id: RequestId,
        query: Query,
        tier: Tier,
        chairman_ids: Vec<ProviderId>,
    ) -> Self {
        Self {
            request_id,
            query,
            tier,
            chairman_ids,
            created_at: Utc::now(),
        }
    }
}
