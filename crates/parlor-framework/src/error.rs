//! Error types for entity handles.

use thiserror::Error;

use parlor_core::PuppetError;

/// Errors returned by entity hydration, queries and message dispatch.
#[derive(Debug, Error)]
pub enum ParlorError {
    /// A puppet call failed. Propagated unchanged, never retried.
    #[error(transparent)]
    Puppet(#[from] PuppetError),

    /// The puppet has no payload for the entity.
    #[error("no payload for {kind} '{id}'")]
    MissingPayload {
        /// Entity kind ("room", "contact", "message").
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The content has no send route.
    ///
    /// Raised before any puppet call is made.
    #[error("unsupported content kind '{kind}': {reason}")]
    UnsupportedContent {
        /// The rejected content kind or type name.
        kind: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// One or more room members failed to hydrate during a room's `ready`.
    #[error("{} member(s) of room '{room_id}' failed to hydrate", .failures.len())]
    Cascade {
        /// The room whose cascade failed.
        room_id: String,
        /// Every failed member id with its error.
        failures: Vec<(String, ParlorError)>,
    },

    /// The client session owning the handle has been dropped.
    #[error("client session has been dropped")]
    SessionClosed,
}

impl ParlorError {
    /// Creates a missing payload error.
    pub fn missing_payload(kind: &'static str, id: impl Into<String>) -> Self {
        Self::MissingPayload {
            kind,
            id: id.into(),
        }
    }

    /// Creates an unsupported content error.
    pub fn unsupported(kind: &'static str, reason: &'static str) -> Self {
        Self::UnsupportedContent { kind, reason }
    }

    /// Returns true if the error means "the entity does not exist" rather than
    /// "the transport is broken".
    pub fn is_missing_payload(&self) -> bool {
        matches!(self, Self::MissingPayload { .. })
    }

    /// Returns the ids of members that failed during a cascade.
    pub fn failed_member_ids(&self) -> Vec<&str> {
        match self {
            Self::Cascade { failures, .. } => failures.iter().map(|(id, _)| id.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Result type for entity operations.
pub type ParlorResult<T> = Result<T, ParlorError>;
