//! Configuration file schema

use council_application::TimeoutPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, merged from defaults, the global config file,
/// and the project-level `council.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub bridge: BridgeSection,
    pub sessions: SessionsSection,
}

/// Bind address of the HTTP + WebSocket server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3456,
        }
    }
}

/// Server-enforced timeout limits for `/prompt` callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: 120_000,
            max_timeout_ms: 300_000,
        }
    }
}

impl BridgeSection {
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            default_ms: self.default_timeout_ms,
            max_ms: self.max_timeout_ms,
        }
    }
}

/// Session history retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Most-recent-N ring size.
    pub capacity: usize,
    /// Explicit store file; defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            capacity: 50,
            path: None,
        }
    }
}

impl SessionsSection {
    /// Resolve the session file location.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llm-council")
            .join("sessions.json")
    }
}
