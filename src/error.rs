//! Error types for the provider core

use thiserror::Error;

/// Errors that can occur while modeling or executing an operation
#[derive(Error, Debug)]
pub enum Error {
    /// The remote API call failed; the operation aborts with no partial apply
    #[error("transport failure during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// A response payload does not have the shape the model expects
    #[error("malformed payload: expected {expected} at `{key}`")]
    Payload {
        key: String,
        expected: &'static str,
    },

    /// Collected diagnostics contain errors that block completion
    #[error("{count} validation error(s) collected; inspect the handler diagnostics")]
    Validation { count: usize },
}

impl Error {
    /// Shorthand for a transport failure
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Shorthand for a payload shape mismatch
    pub fn payload(key: impl Into<String>, expected: &'static str) -> Self {
        Self::Payload {
            key: key.into(),
            expected,
        }
    }
}

/// Result type for provider-core operations
pub type Result<T> = std::result::Result<T, Error>;
