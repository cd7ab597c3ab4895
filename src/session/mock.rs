//! Mock tracking session for testing and development

use crate::core::{Anchor, AnchorId, TRACKING_DISPLAY_LIMIT};
use crate::session::{SessionError, SessionResult, TrackingSession};
use std::collections::HashMap;

/// In-memory tracking session with scripted failures
#[derive(Debug, Default)]
pub struct MockTrackingSession {
    anchors: HashMap<AnchorId, Anchor>,
    /// Number of further `add_anchor` calls that succeed before rejecting
    adds_before_failure: Option<usize>,
    fail_next_reset: bool,
    connected: bool,
    reset_count: u32,
    added_total: u32,
    removed_total: u32,
    display_limit: Option<f64>,
}

impl MockTrackingSession {
    /// Create a new running mock session
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    /// Report a custom display limit
    pub fn with_display_limit(mut self, limit: f64) -> Self {
        self.display_limit = Some(limit);
        self
    }

    /// Accept `count` more anchors, then reject every further registration
    pub fn fail_adds_after(&mut self, count: usize) {
        self.adds_before_failure = Some(count);
    }

    /// Accept every registration again
    pub fn accept_all_adds(&mut self) {
        self.adds_before_failure = None;
    }

    /// Make the next `reset` call fail
    pub fn fail_next_reset(&mut self) {
        self.fail_next_reset = true;
    }

    /// Simulate the session stopping
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Resume the session
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    /// Anchors currently tracked
    pub fn anchors(&self) -> &HashMap<AnchorId, Anchor> {
        &self.anchors
    }

    pub fn contains(&self, anchor_id: AnchorId) -> bool {
        self.anchors.contains_key(&anchor_id)
    }

    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    pub fn added_total(&self) -> u32 {
        self.added_total
    }

    pub fn removed_total(&self) -> u32 {
        self.removed_total
    }
}

impl TrackingSession for MockTrackingSession {
    fn add_anchor(&mut self, anchor: &Anchor) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::Unavailable);
        }

        if let Some(remaining) = self.adds_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(SessionError::AnchorRejected {
                    anchor_id: anchor.id,
                    reason: "Simulated registration failure".to_string(),
                });
            }
            *remaining -= 1;
        }

        self.anchors.insert(anchor.id, *anchor);
        self.added_total += 1;
        Ok(())
    }

    fn remove_anchor(&mut self, anchor_id: AnchorId) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::Unavailable);
        }

        match self.anchors.remove(&anchor_id) {
            Some(_) => {
                self.removed_total += 1;
                Ok(())
            }
            None => Err(SessionError::AnchorNotFound { anchor_id }),
        }
    }

    fn reset(&mut self) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::Unavailable);
        }

        if self.fail_next_reset {
            self.fail_next_reset = false;
            return Err(SessionError::ResetFailed {
                reason: "Simulated reset failure".to_string(),
            });
        }

        self.anchors.clear();
        self.reset_count += 1;
        Ok(())
    }

    fn display_limit(&self) -> f64 {
        self.display_limit.unwrap_or(TRACKING_DISPLAY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlacementTransform;

    fn anchor() -> Anchor {
        Anchor {
            id: AnchorId::new(),
            transform: PlacementTransform::identity(),
        }
    }

    #[test]
    fn test_mock_session_creation() {
        let session = MockTrackingSession::new();
        assert!(session.anchors().is_empty());
        assert_eq!(session.reset_count(), 0);
        assert_eq!(session.display_limit(), TRACKING_DISPLAY_LIMIT);
    }

    #[test]
    fn test_add_and_remove_anchor() {
        let mut session = MockTrackingSession::new();
        let anchor = anchor();

        session.add_anchor(&anchor).unwrap();
        assert!(session.contains(anchor.id));

        session.remove_anchor(anchor.id).unwrap();
        assert!(!session.contains(anchor.id));

        // Second removal is unknown to the session
        let result = session.remove_anchor(anchor.id);
        assert!(matches!(result, Err(SessionError::AnchorNotFound { .. })));
    }

    #[test]
    fn test_scripted_add_failures() {
        let mut session = MockTrackingSession::new();
        session.fail_adds_after(1);

        assert!(session.add_anchor(&anchor()).is_ok());
        assert!(matches!(session.add_anchor(&anchor()), Err(SessionError::AnchorRejected { .. })));
        assert_eq!(session.added_total(), 1);

        session.accept_all_adds();
        assert!(session.add_anchor(&anchor()).is_ok());
    }

    #[test]
    fn test_reset_clears_anchors() {
        let mut session = MockTrackingSession::new();
        session.add_anchor(&anchor()).unwrap();

        session.fail_next_reset();
        assert!(session.reset().is_err());
        assert_eq!(session.anchors().len(), 1);

        session.reset().unwrap();
        assert!(session.anchors().is_empty());
        assert_eq!(session.reset_count(), 1);
    }

    #[test]
    fn test_disconnected_session() {
        let mut session = MockTrackingSession::new();
        session.disconnect();

        let result = session.add_anchor(&anchor());
        assert_eq!(result, Err(SessionError::Unavailable));
        assert!(!SessionError::Unavailable.is_recoverable());

        session.reconnect();
        assert!(session.add_anchor(&anchor()).is_ok());
    }
}
