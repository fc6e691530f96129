//! Deliberation state machine
//!
//! Folds one request's tagged event stream into a session snapshot.
//! Stages only ever move forward; facts already established are only
//! replaced by strictly newer values for the same key, never removed.

pub mod stage;
pub mod state;
