//! Deliberation state reducer
//!
//! The original event consumer was a callback switch wired straight to a
//! socket; here the transition table is a pure reducer over
//! [`CouncilEvent`] so it can be tested without any transport. The
//! surrounding tracker owns ordering (events for one request are applied
//! in delivery order) and persistence (driven by [`EventOutcome`]).

use crate::core::{provider::ProviderId, query::Query, request_id::RequestId, tier::Tier};
use crate::council::event::CouncilEvent;
use crate::council::outcome::{ChairmanSynthesis, PeerRanking, ProviderResponse};
use crate::council::request::CouncilRequest;
use crate::deliberation::stage::DeliberationStage;
use crate::session::entities::CouncilSession;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// What applying one event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event mutated (or legitimately touched) the state.
    Applied {
        /// A session snapshot should be persisted now.
        persist: bool,
    },
    /// Duplicate, out-of-order, or post-terminal event; dropped.
    Ignored,
}

impl EventOutcome {
    pub fn persist(&self) -> bool {
        matches!(self, EventOutcome::Applied { persist: true })
    }
}

/// Accumulated state of one deliberation session.
///
/// Append-only with respect to established facts: a stage is never
/// un-entered, and a response or synthesis for a key is only ever
/// replaced by a strictly newer value for that same key.
#[derive(Debug, Clone)]
pub struct DeliberationState {
    request_id: RequestId,
    stage: DeliberationStage,
    question: Option<Query>,
    tier: Tier,
    chairman_ids: Vec<ProviderId>,
    responses: BTreeMap<ProviderId, ProviderResponse>,
    peer_rankings: Vec<PeerRanking>,
    label_to_model: BTreeMap<String, ProviderId>,
    syntheses: BTreeMap<ProviderId, ChairmanSynthesis>,
    active_providers: BTreeSet<ProviderId>,
    active_synthesizers: BTreeSet<ProviderId>,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl DeliberationState {
    /// Fresh state for a request id, before any metadata is known.
    ///
    /// Used when events arrive for a request this consumer never saw
    /// submitted (e.g. attaching to a stream mid-flight).
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            stage: DeliberationStage::Idle,
            question: None,
            tier: Tier::default(),
            chairman_ids: Vec::new(),
            responses: BTreeMap::new(),
            peer_rankings: Vec::new(),
            label_to_model: BTreeMap::new(),
            syntheses: BTreeMap::new(),
            active_providers: BTreeSet::new(),
            active_synthesizers: BTreeSet::new(),
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Fresh state seeded with the submitted request's metadata.
    pub fn for_request(request: &CouncilRequest) -> Self {
        let mut state = Self::new(request.request_id.clone());
        state.question = Some(request.query.clone());
        state.tier = request.tier.clone();
        state.chairman_ids = request.chairman_ids.clone();
        state.created_at = request.created_at;
        state
    }

    /// Apply one event, returning what happened.
    ///
    /// Terminal states absorb everything; stage moves are forward-only;
    /// all upserts are idempotent. Stage progression is driven solely by
    /// `stage` events — a provider that never reports `provider_done`
    /// cannot stall the session.
    pub fn apply(&mut self, event: &CouncilEvent) -> EventOutcome {
        if self.stage.is_terminal() {
            return EventOutcome::Ignored;
        }

        match event {
            CouncilEvent::Start | CouncilEvent::Heartbeat => EventOutcome::Applied { persist: false },

            CouncilEvent::Stage { stage } => match DeliberationStage::from_wire_label(stage) {
                Some(next) if next.rank() > self.stage.rank() => {
                    self.stage = next;
                    EventOutcome::Applied { persist: false }
                }
                // Unknown label, duplicate, or a stage behind the current
                // one (re-delivery) — drop it.
                _ => EventOutcome::Ignored,
            },

            CouncilEvent::ProviderStart { provider_id } => {
                self.active_providers.insert(provider_id.clone());
                EventOutcome::Applied { persist: false }
            }

            CouncilEvent::ProviderDone { provider_id } => {
                self.active_providers.remove(provider_id);
                EventOutcome::Applied { persist: false }
            }

            CouncilEvent::ProviderResponse { response } => {
                self.responses
                    .insert(response.provider_id.clone(), response.clone());
                EventOutcome::Applied { persist: true }
            }

            CouncilEvent::ReviewDone {
                rankings,
                label_to_model,
            } => {
                self.peer_rankings = rankings.clone();
                if !label_to_model.is_empty() {
                    self.label_to_model = label_to_model.clone();
                }
                EventOutcome::Applied { persist: true }
            }

            CouncilEvent::SynthesisStart { chairman_id } => {
                self.active_synthesizers.insert(chairman_id.clone());
                EventOutcome::Applied { persist: false }
            }

            CouncilEvent::SynthesisContent {
                chairman_id,
                content,
            } => {
                let entry = self
                    .syntheses
                    .entry(chairman_id.clone())
                    .or_insert_with(|| {
                        ChairmanSynthesis::new(chairman_id.clone(), chairman_id.as_str())
                    });
                // The transport sends the cumulative text each time:
                // full replace, never append.
                entry.synthesis_text = content.clone();
                entry.error = None;
                self.active_synthesizers.remove(chairman_id);
                EventOutcome::Applied { persist: true }
            }

            CouncilEvent::SynthesisError { chairman_id, error } => {
                self.syntheses.insert(
                    chairman_id.clone(),
                    ChairmanSynthesis::failed(chairman_id.clone(), chairman_id.as_str(), error),
                );
                self.active_synthesizers.remove(chairman_id);
                EventOutcome::Applied { persist: true }
            }

            CouncilEvent::Result { payload } => {
                // Authoritative synthesis set back-fills anything the
                // streaming path missed.
                for synthesis in &payload.stage3 {
                    self.syntheses
                        .insert(synthesis.chairman_id.clone(), synthesis.clone());
                }
                if let Some(metadata) = &payload.metadata
                    && self.label_to_model.is_empty()
                {
                    self.label_to_model = metadata.label_to_model.clone();
                }
                EventOutcome::Applied { persist: false }
            }

            CouncilEvent::Error { message } => {
                self.stage = DeliberationStage::Error;
                self.error = Some(message.clone());
                EventOutcome::Applied { persist: true }
            }

            CouncilEvent::Done => {
                self.stage = DeliberationStage::Done;
                self.active_providers.clear();
                self.active_synthesizers.clear();
                EventOutcome::Applied { persist: true }
            }
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn stage(&self) -> DeliberationStage {
        self.stage
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn responses(&self) -> &BTreeMap<ProviderId, ProviderResponse> {
        &self.responses
    }

    pub fn peer_rankings(&self) -> &[PeerRanking] {
        &self.peer_rankings
    }

    pub fn label_to_model(&self) -> &BTreeMap<String, ProviderId> {
        &self.label_to_model
    }

    pub fn syntheses(&self) -> &BTreeMap<ProviderId, ChairmanSynthesis> {
        &self.syntheses
    }

    pub fn active_providers(&self) -> &BTreeSet<ProviderId> {
        &self.active_providers
    }

    pub fn active_synthesizers(&self) -> &BTreeSet<ProviderId> {
        &self.active_synthesizers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Durable snapshot of everything established so far.
    pub fn snapshot(&self) -> CouncilSession {
        let provider_ids: Vec<ProviderId> = self
            .responses
            .keys()
            .chain(self.active_providers.iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        CouncilSession {
            id: self.request_id.clone(),
            question: self
                .question
                .as_ref()
                .map(|q| q.content().to_string())
                .unwrap_or_default(),
            tier: self.tier.clone(),
            provider_ids,
            chairman_ids: self.chairman_ids.clone(),
            responses: self.responses.values().cloned().collect(),
            peer_reviews: self.peer_rankings.clone(),
            label_to_model: self.label_to_model.clone(),
            syntheses: self.syntheses.values().cloned().collect(),
            stage: self.stage,
            error: self.error.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::outcome::CouncilOutcome;

    fn stage(label: &str) -> CouncilEvent {
        CouncilEvent::Stage {
            stage: label.to_string(),
        }
    }

    fn response(provider: &str, text: &str) -> CouncilEvent {
        CouncilEvent::ProviderResponse {
            response: ProviderResponse::success(provider, provider, "model", text),
        }
    }

    fn content(chairman: &str, text: &str) -> CouncilEvent {
        CouncilEvent::SynthesisContent {
            chairman_id: ProviderId::new(chairman),
            content: text.to_string(),
        }
    }

    #[test]
    fn full_deliberation_run() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));

        let script = [
            stage("deliberation"),
            response("p1", "answer one"),
            stage("peer_review"),
            CouncilEvent::ReviewDone {
                rankings: vec![],
                label_to_model: BTreeMap::new(),
            },
            stage("synthesis"),
            CouncilEvent::SynthesisStart {
                chairman_id: ProviderId::new("c1"),
            },
            content("c1", "partial"),
            content("c1", "final"),
            CouncilEvent::Done,
        ];
        for event in &script {
            state.apply(event);
        }

        assert_eq!(state.stage(), DeliberationStage::Done);
        assert_eq!(
            state.syntheses()[&ProviderId::new("c1")].synthesis_text,
            "final"
        );
        assert!(state.active_synthesizers().is_empty());
        assert!(state.active_providers().is_empty());
    }

    #[test]
    fn backward_stage_event_is_ignored() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&stage("deliberation"));
        state.apply(&stage("synthesis"));

        let outcome = state.apply(&stage("deliberation"));

        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(state.stage(), DeliberationStage::Synthesizing);
    }

    #[test]
    fn duplicate_stage_event_is_ignored() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&stage("peer_review"));
        assert_eq!(state.apply(&stage("peer_review")), EventOutcome::Ignored);
    }

    #[test]
    fn unknown_stage_label_is_ignored() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        assert_eq!(state.apply(&stage("warmup")), EventOutcome::Ignored);
        assert_eq!(state.stage(), DeliberationStage::Idle);
    }

    #[test]
    fn provider_response_upsert_replaces_by_key() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&response("p1", "first"));
        state.apply(&response("p1", "second"));
        state.apply(&response("p2", "other"));

        assert_eq!(state.responses().len(), 2);
        assert_eq!(
            state.responses()[&ProviderId::new("p1")].response_text,
            "second"
        );
    }

    #[test]
    fn missing_provider_done_does_not_block_stage_progress() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&stage("deliberation"));
        state.apply(&CouncilEvent::ProviderStart {
            provider_id: ProviderId::new("p1"),
        });
        // p1 crashed: no provider_done, but the stage event still moves us on
        state.apply(&stage("peer_review"));

        assert_eq!(state.stage(), DeliberationStage::Reviewing);
        assert!(state.active_providers().contains(&ProviderId::new("p1")));
    }

    #[test]
    fn synthesis_content_persists_and_clears_worker() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&CouncilEvent::SynthesisStart {
            chairman_id: ProviderId::new("c1"),
        });
        let outcome = state.apply(&content("c1", "text"));

        assert!(outcome.persist());
        assert!(state.active_synthesizers().is_empty());
    }

    #[test]
    fn synthesis_error_records_error_with_empty_text() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&CouncilEvent::SynthesisError {
            chairman_id: ProviderId::new("c1"),
            error: "tab closed".to_string(),
        });

        let synthesis = &state.syntheses()[&ProviderId::new("c1")];
        assert_eq!(synthesis.error.as_deref(), Some("tab closed"));
        assert!(synthesis.synthesis_text.is_empty());
    }

    #[test]
    fn result_backfills_missing_syntheses() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&content("c1", "streamed"));

        let payload = CouncilOutcome {
            stage3: vec![
                ChairmanSynthesis {
                    chairman_id: ProviderId::new("c1"),
                    chairman_display_name: "Claude".to_string(),
                    synthesis_text: "authoritative".to_string(),
                    error: None,
                },
                ChairmanSynthesis {
                    chairman_id: ProviderId::new("c2"),
                    chairman_display_name: "Gemini".to_string(),
                    synthesis_text: "missed by streaming".to_string(),
                    error: None,
                },
            ],
            ..CouncilOutcome::default()
        };
        state.apply(&CouncilEvent::Result { payload });

        assert_eq!(state.syntheses().len(), 2);
        assert_eq!(
            state.syntheses()[&ProviderId::new("c1")].synthesis_text,
            "authoritative"
        );
    }

    #[test]
    fn error_event_is_terminal_and_persisted() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&stage("deliberation"));

        let outcome = state.apply(&CouncilEvent::Error {
            message: "all providers failed".to_string(),
        });

        assert!(outcome.persist());
        assert_eq!(state.stage(), DeliberationStage::Error);
        assert_eq!(state.error(), Some("all providers failed"));
    }

    #[test]
    fn terminal_state_absorbs_later_events() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        state.apply(&CouncilEvent::Done);

        assert_eq!(state.apply(&stage("deliberation")), EventOutcome::Ignored);
        assert_eq!(state.apply(&response("p1", "late")), EventOutcome::Ignored);
        assert!(state.responses().is_empty());
        assert_eq!(state.stage(), DeliberationStage::Done);
    }

    #[test]
    fn heartbeat_and_start_change_nothing() {
        let mut state = DeliberationState::new(RequestId::new("req-1"));
        let before = state.snapshot();
        state.apply(&CouncilEvent::Start);
        state.apply(&CouncilEvent::Heartbeat);
        let after = state.snapshot();

        assert_eq!(before.stage, after.stage);
        assert_eq!(before.responses, after.responses);
    }

    #[test]
    fn snapshot_carries_request_metadata() {
        let request = CouncilRequest::new(
            RequestId::new("req-7"),
            Query::new("why lifetimes"),
            Tier::Deep,
            vec![ProviderId::new("claude")],
        );
        let mut state = DeliberationState::for_request(&request);
        state.apply(&response("p1", "because"));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.id.as_str(), "req-7");
        assert_eq!(snapshot.question, "why lifetimes");
        assert_eq!(snapshot.tier, Tier::Deep);
        assert_eq!(snapshot.chairman_ids, vec![ProviderId::new("claude")]);
        assert_eq!(snapshot.provider_ids, vec![ProviderId::new("p1")]);
    }
}
