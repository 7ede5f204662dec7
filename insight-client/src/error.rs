//! Error types for the Insight client

use insight_core::{JobHandle, ValidationError};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the log service
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request failed local validation
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Service rejected the request parameters
    #[error("Request rejected by service: {0}")]
    InvalidRequest(String),

    /// Service call failed
    #[error("{operation} request failed: {message}")]
    Transport {
        /// API operation name
        operation: &'static str,
        /// Error chain as reported by the SDK
        message: String,
    },

    /// Stop was requested for a query that already finished
    #[error("Query {handle} is no longer running: {message}")]
    AlreadyTerminal { handle: JobHandle, message: String },

    /// Service answered the stop request with success = false
    #[error("Service declined to stop query {handle}")]
    CancelRejected { handle: JobHandle },

    /// Response did not carry a field the client relies on
    #[error("Response is missing {0}")]
    MissingField(&'static str),
}

impl ClientError {
    /// Create a transport error for an API operation
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Check if this error came from the network or the service call itself
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MissingField(_))
    }

    /// Check if this error is a validation error, local or remote
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidRequest(_))
    }

    /// Check if the query had already reached a terminal state
    pub fn is_already_terminal(&self) -> bool {
        matches!(self, Self::AlreadyTerminal { .. })
    }
}
