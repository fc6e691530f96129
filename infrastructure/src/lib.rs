//! Infrastructure layer for llm-council
//!
//! External adapters wired beneath the application ports:
//!
//! - [`bridge`] — the WebSocket bridge: connection registry,
//!   pending-request table, and inbound frame dispatch. Implements the
//!   [`ExtensionGateway`](council_application::ExtensionGateway) port.
//! - [`server`] — the axum HTTP + WebSocket surface.
//! - [`persistence`] — the file-backed
//!   [`SessionStore`](council_application::SessionStore).
//! - [`config`] — figment-based configuration loading.

pub mod bridge;
pub mod config;
pub mod persistence;
pub mod server;

pub use bridge::CouncilBridge;
pub use bridge::pending::PendingTable;
pub use bridge::registry::{ConnectionId, ConnectionRegistry, SocketCommand};
pub use config::{ConfigLoader, FileConfig};
pub use persistence::file_store::FileSessionStore;
pub use server::{AppState, ServerError, build_router, serve};
