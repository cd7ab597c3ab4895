//! Event-driven landmarker API
//!
//! [`Landmarker`] owns the landmark store, the scene and the configuration.
//! Location fixes, authorization changes, probe ticks and worker results are
//! posted as [`LandmarkerEvent`]s and applied on the owner's thread by
//! [`Landmarker::pump`]; notifications go out through a [`LandmarkerDelegate`].

pub mod callback;
pub mod landmarker;
pub mod types;
pub mod worker;

pub use callback::{CallbackDelegate, LandmarkerDelegate};
pub use landmarker::Landmarker;
pub use types::{
    AuthorizationAction, LandmarkerError, LandmarkerEvent, LandmarkerResult, LocationAuthorization, PumpSummary,
};
pub use worker::{TransformJob, TransformResult, TransformWorker};
