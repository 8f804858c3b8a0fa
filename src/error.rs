//! # Dispatcher Error Types
//!
//! Unified error handling for the dispatcher client, the action listener and
//! the `hatchet-listen` binary.

use thiserror::Error;

use crate::transport::{TransportError, TransportErrorKind};

/// Dispatcher operation result type
pub type DispatcherResult<T> = Result<T, DispatcherError>;

/// Error types surfaced by the dispatcher client and action listener
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to dispatcher at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Worker registration failed: {0}")]
    Registration(TransportError),

    #[error("Failed to open action subscription: {0}")]
    Subscribe(TransportError),

    #[error("could not subscribe to the dispatcher for worker {worker_id} after {retries} retries")]
    ResubscribeExhausted { worker_id: String, retries: u32 },

    #[error("Action stream failed: {0}")]
    StreamFailed(TransportError),

    #[error("Failed to unregister worker {worker_id}: {message}")]
    Unregister { worker_id: String, message: String },

    #[error("Failed to send action event for action {action_id}: {message}")]
    ActionEvent { action_id: String, message: String },

    #[error("Invalid message: {field} - {reason}")]
    InvalidMessage { field: String, reason: String },

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DispatcherError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid message error for protocol violations
    ///
    /// Used when a dispatcher message is missing required fields or carries
    /// values this client does not understand.
    pub fn invalid_message(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMessage {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check whether restarting the listener from scratch is worth trying
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            DispatcherError::Connect { .. } => true,
            DispatcherError::ResubscribeExhausted { .. } => true,
            DispatcherError::Registration(e)
            | DispatcherError::Subscribe(e)
            | DispatcherError::StreamFailed(e) => e.kind == TransportErrorKind::Unavailable,
            // Protocol violations are not recoverable - the server is incompatible
            DispatcherError::InvalidMessage { .. }
            | DispatcherError::Config(_)
            | DispatcherError::Unregister { .. }
            | DispatcherError::ActionEvent { .. }
            | DispatcherError::Serialization(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_mentions_retry_count() {
        let error = DispatcherError::ResubscribeExhausted {
            worker_id: "W1".to_string(),
            retries: 5,
        };
        let message = error.to_string();
        assert!(message.contains("after 5 retries"));
        assert!(message.contains("W1"));
    }

    #[test]
    fn test_is_recoverable() {
        let unavailable = DispatcherError::Subscribe(TransportError::unavailable("down"));
        assert!(unavailable.is_recoverable());

        let other = DispatcherError::StreamFailed(TransportError::other("bad frame"));
        assert!(!other.is_recoverable());

        let invalid = DispatcherError::invalid_message("action_type", "unknown value 9");
        assert!(!invalid.is_recoverable());

        let exhausted = DispatcherError::ResubscribeExhausted {
            worker_id: "W1".to_string(),
            retries: 5,
        };
        assert!(exhausted.is_recoverable());
        assert!(!DispatcherError::config_error("tenant_id must be set").is_recoverable());
    }

    #[test]
    fn test_unregister_error_carries_message() {
        let error = DispatcherError::Unregister {
            worker_id: "W1".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to unregister worker W1: connection reset"
        );
    }
}
