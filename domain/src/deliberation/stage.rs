//! Deliberation stage — where a council session currently stands

use serde::{Deserialize, Serialize};

/// Stage of one deliberation session.
///
/// Strictly forward order: `idle → deliberating → reviewing →
/// synthesizing → {done | error}`. `done` and `error` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliberationStage {
    Idle,
    Deliberating,
    Reviewing,
    Synthesizing,
    Done,
    Error,
}

impl DeliberationStage {
    /// Position in the forward order; a `stage` event may only move to a
    /// strictly higher rank.
    pub fn rank(&self) -> u8 {
        match self {
            DeliberationStage::Idle => 0,
            DeliberationStage::Deliberating => 1,
            DeliberationStage::Reviewing => 2,
            DeliberationStage::Synthesizing => 3,
            DeliberationStage::Done | DeliberationStage::Error => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliberationStage::Done | DeliberationStage::Error)
    }

    /// Map a wire-level stage label to a stage, if known.
    ///
    /// Terminal stages are never announced via `stage` events (they have
    /// dedicated `done`/`error` events), so only the three working
    /// stages are reachable here.
    pub fn from_wire_label(label: &str) -> Option<Self> {
        match label {
            "deliberation" => Some(DeliberationStage::Deliberating),
            "peer_review" => Some(DeliberationStage::Reviewing),
            "synthesis" => Some(DeliberationStage::Synthesizing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliberationStage::Idle => "idle",
            DeliberationStage::Deliberating => "deliberating",
            DeliberationStage::Reviewing => "reviewing",
            DeliberationStage::Synthesizing => "synthesizing",
            DeliberationStage::Done => "done",
            DeliberationStage::Error => "error",
        }
    }
}

impl std::fmt::Display for DeliberationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_is_strictly_forward() {
        assert!(DeliberationStage::Idle.rank() < DeliberationStage::Deliberating.rank());
        assert!(DeliberationStage::Deliberating.rank() < DeliberationStage::Reviewing.rank());
        assert!(DeliberationStage::Reviewing.rank() < DeliberationStage::Synthesizing.rank());
        assert!(DeliberationStage::Synthesizing.rank() < DeliberationStage::Done.rank());
    }

    #[test]
    fn test_wire_labels() {
        assert_eq!(
            DeliberationStage::from_wire_label("deliberation"),
            Some(DeliberationStage::Deliberating)
        );
        assert_eq!(
            DeliberationStage::from_wire_label("peer_review"),
            Some(DeliberationStage::Reviewing)
        );
        assert_eq!(
            DeliberationStage::from_wire_label("synthesis"),
            Some(DeliberationStage::Synthesizing)
        );
        assert_eq!(DeliberationStage::from_wire_label("warmup"), None);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(DeliberationStage::Done.is_terminal());
        assert!(DeliberationStage::Error.is_terminal());
        assert!(!DeliberationStage::Synthesizing.is_terminal());
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DeliberationStage::Deliberating).unwrap(),
            "\"deliberating\""
        );
    }
}
