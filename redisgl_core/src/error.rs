//! Error types for registry and session operations.

use redisgl_env::EnvError;
use thiserror::Error;

use crate::kinematics::KinematicsError;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The store failed; never retried here
    #[error("Store error: {0}")]
    Store(#[from] EnvError),

    #[error("Failed to encode document for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A fetched document is missing a field or has the wrong shape
    #[error("Malformed document under '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {what} '{value}': {reason}")]
    InvalidSegment {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
}

impl RegistryError {
    pub(crate) fn encode(key: &str, source: serde_json::Error) -> Self {
        Self::Encode {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn decode(key: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            key: key.to_string(),
            source,
        }
    }
}
