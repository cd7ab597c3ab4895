//! Geospatial AR landmark anchoring
//!
//! Places image markers at real-world coordinates inside a tracked AR scene,
//! moves the tracking origin as the observer walks, and resolves on-screen
//! overlap between landmark views with a pluggable strategy.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod store;
pub mod session;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{AnchorId, ContentHandle, GeodeticPoint, Landmark, Metadata, PlacementTransform};
pub use crate::algorithms::{merge_by_common_elements, place, Placement};
pub use crate::processing::{IntersectionProbe, OverlapResolver, OverlappingStrategy, SceneGraph, SceneIndex, VisibilityDecision};
pub use crate::store::{AddOutcome, AnchorStore, RecenterReport, RequestTicket};
pub use crate::session::{CapabilityGate, CapabilityStatus, MockTrackingSession, SessionError, TrackingSession};
pub use crate::utils::{ConfigError, ConfigurationManager, LandmarkerConfig};
pub use crate::api::{
    CallbackDelegate, Landmarker, LandmarkerDelegate, LandmarkerError, LandmarkerEvent, LandmarkerResult,
    LocationAuthorization,
};
