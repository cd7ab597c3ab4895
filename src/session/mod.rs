//! Abstraction over the external AR tracking session
//!
//! The engine never talks to a concrete AR framework. It registers anchors,
//! removes them and resets world tracking through [`TrackingSession`], and asks
//! a [`CapabilityGate`] whether the camera may be used before recentering.

pub mod tracking;
pub mod capability;
pub mod mock;
pub mod error;

pub use tracking::TrackingSession;
pub use capability::{CapabilityGate, CapabilityStatus, StaticCapabilityGate};
pub use mock::MockTrackingSession;
pub use error::{SessionError, SessionResult};
