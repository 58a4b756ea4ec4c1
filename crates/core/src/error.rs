//! Error types for StaySpot Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Connectivity problem, timeout, or an unusable response
    #[error("Network error: {0}")]
    Network(String),

    /// Session token rejected or expired
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Request rejected before or by the remote service
    #[error("Validation error: {0}")]
    Validation(String),

    /// No session token is present
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The chat session was closed before the operation
    #[error("Conversation closed")]
    ConversationClosed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the next polling cycle may succeed without user action
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Whether the user has to log in again
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::NotAuthenticated)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
