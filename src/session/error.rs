//! Tracking-session error types

use crate::core::AnchorId;
use thiserror::Error;

/// Failures reported by the external AR tracking session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session refused to register an anchor
    #[error("anchor {anchor_id} rejected: {reason}")]
    AnchorRejected { anchor_id: AnchorId, reason: String },
    /// The anchor is not known to the session
    #[error("anchor {anchor_id} is not registered")]
    AnchorNotFound { anchor_id: AnchorId },
    /// Resetting world tracking failed
    #[error("tracking reset failed: {reason}")]
    ResetFailed { reason: String },
    /// The session is not running
    #[error("tracking session unavailable")]
    Unavailable,
}

/// Result type for tracking-session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Whether the session is expected to accept the same call again later
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::Unavailable)
    }
}
