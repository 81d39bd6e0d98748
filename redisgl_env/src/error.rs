//! Error types for the redisgl store abstraction.

use thiserror::Error;

/// Errors raised by a [`SceneStore`](crate::SceneStore) implementation.
///
/// This layer never retries. Whatever the backend reports is surfaced to the
/// caller as-is.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The store could not be reached (connection closed, client shut down)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend failed while executing a command
    #[error("Storage error: {0}")]
    Storage(String),

    /// A command was run against a key holding the wrong kind of value
    #[error("Wrong type for key '{key}': expected {expected}")]
    WrongType { key: String, expected: &'static str },

    /// A stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The reply channel was closed before the command executed
    #[error("Reply dropped before commit")]
    ReplyDropped,
}

impl EnvError {
    /// Creates a storage error.
    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a wrong-type error.
    pub fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.into(),
            expected,
        }
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
