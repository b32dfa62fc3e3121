//! Transport error types.
//!
//! Every [`Puppet`](crate::Puppet) operation is independently failable and
//! reports failures as a [`PuppetError`]. Entity-level errors (missing
//! payloads, unsupported content, cascade failures) live in
//! `parlor-framework`.

use thiserror::Error;

// =============================================================================
// Puppet Errors
// =============================================================================

/// Errors that can occur in puppet (transport) operations.
#[derive(Debug, Clone, Error)]
pub enum PuppetError {
    /// The puppet is not logged in or its connection is down.
    #[error("puppet is not connected")]
    NotConnected,

    /// The remote call timed out.
    #[error("puppet call timed out")]
    Timeout,

    /// The remote service rejected the call.
    #[error("puppet API error ({code}): {message}")]
    Api {
        /// Service-specific error code.
        code: i64,
        /// Human readable reason.
        message: String,
    },

    /// The puppet does not implement the operation.
    #[error("operation '{operation}' is not supported by this puppet")]
    NotSupported {
        /// The operation name.
        operation: &'static str,
    },

    /// Failed to serialize/deserialize a payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl PuppetError {
    /// Creates a not-supported error for the named operation.
    pub fn not_supported(operation: &'static str) -> Self {
        Self::NotSupported { operation }
    }

    /// Creates an API error.
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Creates an error with a free-form message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<serde_json::Error> for PuppetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for puppet operations.
pub type PuppetResult<T> = Result<T, PuppetError>;
