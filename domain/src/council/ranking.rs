//! Peer-ranking aggregation
//!
//! Folds the individual anonymized rankings from the review stage into a
//! per-provider average rank. Derived data only: the authoritative facts
//! are the [`PeerRanking`]s themselves.

use crate::core::provider::ProviderId;
use crate::council::outcome::{AggregateRanking, PeerRanking, ProviderResponse};
use std::collections::BTreeMap;

/// Aggregate anonymized rankings into per-provider standings.
///
/// Rank positions are 1-based (`ranked_labels[0]` is rank 1). Labels
/// absent from `label_to_model` are skipped — a reviewer may mention a
/// label the anonymization map never issued, and that must not poison
/// the aggregate. Display names are resolved from the stage-1 responses,
/// falling back to the provider id. Result is sorted best-first.
pub fn aggregate_rankings(
    rankings: &[PeerRanking],
    label_to_model: &BTreeMap<String, ProviderId>,
    responses: &[ProviderResponse],
) -> Vec<AggregateRanking> {
    let mut tallies: BTreeMap<&ProviderId, (u64, u32)> = BTreeMap::new();

    for ranking in rankings {
        for (position, label) in ranking.ranked_labels.iter().enumerate() {
            if let Some(provider_id) = label_to_model.get(label) {
                let tally = tallies.entry(provider_id).or_insert((0, 0));
                tally.0 += position as u64 + 1;
                tally.1 += 1;
            }
        }
    }

    let mut aggregates: Vec<AggregateRanking> = tallies
        .into_iter()
        .map(|(provider_id, (rank_sum, votes))| AggregateRanking {
            provider_id: provider_id.clone(),
            provider_display_name: display_name_for(provider_id, responses),
            average_rank: rank_sum as f64 / votes as f64,
            votes_count: votes,
        })
        .collect();

    aggregates.sort_by(|a, b| {
        a.average_rank
            .partial_cmp(&b.average_rank)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.provider_id.cmp(&b.provider_id))
    });

    aggregates
}

fn display_name_for(provider_id: &ProviderId, responses: &[ProviderResponse]) -> String {
    responses
        .iter()
        .find(|r| &r.provider_id == provider_id)
        .map(|r| r.provider_display_name.clone())
        .unwrap_or_else(|| provider_id.to_string())
}
