//! Session storage and route gating for the Guardian client
//!
//! This crate owns the device-local session (bearer token plus a cached
//! profile snapshot), the key-value store it lives in, and the gate that
//! decides which routes may render for the current session state.

mod gate;
mod profile;
mod repository;
mod store;

use thiserror::Error;

pub use gate::{on_route_enter, Route, RouteDecision, SessionGate, SessionState};
pub use profile::{Session, UserProfile};
pub use repository::SessionRepository;
pub use store::{FileStore, MemoryStore, SessionStore, USER_INFO_KEY, USER_TOKEN_KEY};

/// Result type
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl SessionError {
    pub fn storage<T: std::fmt::Display>(msg: T) -> Self {
        Self::StorageError(msg.to_string())
    }
}
