//! Common API types: errors, events and authorization states

use crate::api::worker::TransformResult;
use crate::core::{AnchorId, GeodeticPoint};
use crate::session::SessionError;
use crate::store::RecreationFailure;
use crate::utils::config::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for landmarker operations
pub type LandmarkerResult<T> = Result<T, LandmarkerError>;

/// Errors surfaced by the landmarker
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkerError {
    /// The camera capability is denied or restricted; recentering stays off
    #[error("camera access is not authorized, world recentering disabled")]
    AuthorizationDenied,
    /// The location provider failed or location access was refused
    #[error("location unavailable: {reason}")]
    LocationFailure { reason: String },
    #[error("no landmark with id {0}")]
    UnknownLandmark(AnchorId),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("tracking session error: {0}")]
    Session(#[from] SessionError),
    /// A landmark could not be rebuilt after the origin moved
    #[error("landmark could not be recreated after recenter: {}", .failure.error)]
    RecreationFailed { failure: RecreationFailure },
}

impl LandmarkerError {
    /// Whether the failure disables further recentering
    pub fn is_latching(&self) -> bool {
        matches!(self, LandmarkerError::AuthorizationDenied)
    }
}

/// Location-provider authorization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

/// What the location provider should do after an authorization change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationAction {
    StartUpdates,
    RequestAuthorization,
    NoAction,
}

/// Inputs serialized through [`crate::api::Landmarker::pump`]
#[derive(Debug, Clone)]
pub enum LandmarkerEvent {
    /// A batch of fixes from the location provider, oldest first
    LocationUpdate(Vec<GeodeticPoint>),
    LocationFailed { reason: String },
    AuthorizationChanged(LocationAuthorization),
    /// The probe timer fired
    ProbeTick,
    /// A placement computed off the owner thread
    TransformReady(TransformResult),
}

/// What a single [`crate::api::Landmarker::pump`] call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PumpSummary {
    pub events: usize,
    /// Fixes that arrived but were superseded by a later one in the same pump
    pub coalesced_fixes: usize,
    pub recentered: bool,
    pub probed: bool,
    pub actions: Vec<AuthorizationAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FailedRequest;

    #[test]
    fn test_error_messages() {
        let error = LandmarkerError::LocationFailure {
            reason: "denied".to_string(),
        };
        assert_eq!(error.to_string(), "location unavailable: denied");

        let failure = RecreationFailure {
            request: FailedRequest::Recreation(AnchorId::new()),
            location: GeodeticPoint::new(0.0, 0.0),
            error: SessionError::Unavailable,
        };
        let error = LandmarkerError::RecreationFailed { failure };
        assert_eq!(
            error.to_string(),
            "landmark could not be recreated after recenter: tracking session unavailable"
        );
    }

    #[test]
    fn test_error_conversions() {
        let error: LandmarkerError = SessionError::Unavailable.into();
        assert!(matches!(error, LandmarkerError::Session(SessionError::Unavailable)));
        assert!(!error.is_latching());
        assert!(LandmarkerError::AuthorizationDenied.is_latching());
    }
}
