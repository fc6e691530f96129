//! Ranking de-anonymizer
//!
//! Review-stage text talks about "Response A" and "Response B" so that
//! reviewers cannot be biased by vendor identity. For display and audit,
//! each label is expanded to `"label (provider display name)"` using the
//! session's label map and aggregate standings.

use crate::core::provider::ProviderId;
use crate::council::outcome::AggregateRanking;
use std::collections::BTreeMap;

/// Expand anonymous labels in free text to `"label (display name)"`.
///
/// A single left-to-right pass; at each position the longest matching
/// label wins, so one occurrence is never expanded twice. Labels whose
/// provider has no entry in `aggregate_rankings` are left as-is (the
/// caller may hold a stale or partial aggregate list — degrade, don't
/// fail). Pure and infallible, but not re-entrant: calling it on its own
/// output would expand the label inside the already-expanded text.
pub fn deanonymize(
    text: &str,
    label_to_model: &BTreeMap<String, ProviderId>,
    aggregate_rankings: &[AggregateRanking],
) -> String {
    if label_to_model.is_empty() {
        return text.to_string();
    }

    // Longest label first so "Response AB" shadows "Response A".
    let mut labels: Vec<&String> = label_to_model.keys().collect();
    labels.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        let earliest = labels
            .iter()
            .filter_map(|label| rest.find(label.as_str()).map(|pos| (pos, *label)))
            .min_by_key(|(pos, _)| *pos);

        let Some((pos, label)) = earliest else {
            out.push_str(rest);
            break;
        };

        out.push_str(&rest[..pos]);

        let display_name = label_to_model
            .get(label)
            .and_then(|provider_id| {
                aggregate_rankings
                    .iter()
                    .find(|r| &r.provider_id == provider_id)
            })
            .map(|r| r.provider_display_name.as_str());

        match display_name {
            Some(name) => {
                out.push_str(label);
                out.push_str(" (");
                out.push_str(name);
                out.push(')');
            }
            None => out.push_str(label),
        }

        rest = &rest[pos + label.len()..];
    }

    out
}
