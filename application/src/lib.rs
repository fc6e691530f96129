//! Application layer for llm-council
//!
//! Use cases and ports. The ports are implemented by the infrastructure
//! layer (the WebSocket bridge, the file-backed session store); the use
//! cases contain everything the protocol requires above raw transport:
//! validation, timeout clamping, request-id generation, and the
//! event-stream consumption that keeps session snapshots current.

pub mod ports;
pub mod use_cases;

pub use ports::extension_gateway::{DispatchError, ExtensionGateway};
pub use ports::session_store::{SessionStore, SessionStoreError};
pub use use_cases::submit_council::{
    CouncilReply, SubmitCouncilError, SubmitCouncilInput, SubmitCouncilUseCase, TimeoutPolicy,
};
pub use use_cases::track_deliberation::DeliberationTracker;
