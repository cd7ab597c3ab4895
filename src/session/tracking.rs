//! Tracking-session interface

use crate::core::{Anchor, AnchorId, TRACKING_DISPLAY_LIMIT};
use crate::session::SessionResult;

/// Boundary to the external AR tracking subsystem
pub trait TrackingSession {
    /// Register an anchor so the session starts tracking it
    fn add_anchor(&mut self, anchor: &Anchor) -> SessionResult<()>;

    /// Stop tracking an anchor
    fn remove_anchor(&mut self, anchor_id: AnchorId) -> SessionResult<()>;

    /// Restart world tracking with gravity-and-heading alignment; the device
    /// position becomes the new tracking origin
    fn reset(&mut self) -> SessionResult<()>;

    /// Radius beyond which the session does not render anchors (meters)
    fn display_limit(&self) -> f64 {
        TRACKING_DISPLAY_LIMIT
    }
}

impl<T: TrackingSession + ?Sized> TrackingSession for Box<T> {
    fn add_anchor(&mut self, anchor: &Anchor) -> SessionResult<()> {
        (**self).add_anchor(anchor)
    }

    fn remove_anchor(&mut self, anchor_id: AnchorId) -> SessionResult<()> {
        (**self).remove_anchor(anchor_id)
    }

    fn reset(&mut self) -> SessionResult<()> {
        (**self).reset()
    }

    fn display_limit(&self) -> f64 {
        (**self).display_limit()
    }
}
