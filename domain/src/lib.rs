//! Domain layer for llm-council
//!
//! This crate contains the core business logic of the council protocol.
//! It has no dependencies on transport or persistence concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council poses one question to several AI chat providers at once:
//!
//! - **Deliberation**: every provider answers the question independently
//! - **Peer review**: providers rank each other's anonymized answers
//! - **Synthesis**: one or more chairmen merge answers and reviews into
//!   a final response
//!
//! ## Event stream
//!
//! The extension reports progress as a stream of tagged [`CouncilEvent`]s
//! keyed by request id. The [`DeliberationState`] reducer folds that
//! stream into a resumable session snapshot.

pub mod core;
pub mod council;
pub mod deliberation;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    provider::ProviderId,
    query::Query,
    request_id::RequestId,
    tier::Tier,
};
pub use council::{
    deanonymize::deanonymize,
    event::CouncilEvent,
    outcome::{
        AggregateRanking, ChairmanSynthesis, CouncilMetadata, CouncilOutcome, PeerRanking,
        ProviderResponse,
    },
    ranking::aggregate_rankings,
    request::CouncilRequest,
    wire::{CouncilNotice, InboundFrame, OutboundFrame, WireError, parse_inbound},
};
pub use deliberation::{
    stage::DeliberationStage,
    state::{DeliberationState, EventOutcome},
};
pub use session::entities::{CouncilSession, SessionSummary};
