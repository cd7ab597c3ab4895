//! Landmark registry bound to a tracking session and a world origin

use crate::algorithms::geo_transform::{place, surface_distance, Placement};
use crate::core::{AnchorId, ContentHandle, GeodeticPoint, Landmark, Metadata};
use crate::processing::overlap::LandmarkLookup;
use crate::session::{SessionError, SessionResult, TrackingSession};
use crate::store::pending::{LandmarkRequest, PendingQueue, RequestTicket};
use crate::utils::config::LandmarkerConfig;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Renderer hook invoked with the id of every landmark leaving the store
pub type RemovalHook = Box<dyn FnMut(AnchorId) + Send>;

/// Result of [`AnchorStore::add_landmark`]
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Placed and registered against the current origin
    Added(Landmark),
    /// No origin yet; created on the next recenter
    Queued(RequestTicket),
}

/// Which request a recenter failed to turn into a landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedRequest {
    /// Flushed from the pending queue
    Pending(RequestTicket),
    /// Recreation of a landmark that existed before the recenter
    Recreation(AnchorId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecreationFailure {
    pub request: FailedRequest,
    pub location: GeodeticPoint,
    pub error: SessionError,
}

/// Outcome of a successful session reset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecenterReport {
    /// Queued requests created against the new origin, in queue order
    pub flushed: Vec<(RequestTicket, Landmark)>,
    /// Pre-existing landmarks rebuilt under new identifiers
    pub recreated: Vec<Landmark>,
    pub failures: Vec<RecreationFailure>,
}

impl RecenterReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A failed session reset, with every captured landmark that could not be
/// registered again afterwards
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct RecenterFailure {
    pub error: SessionError,
    pub lost: Vec<RecreationFailure>,
}

/// Verdict for a single location fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecenterDecision {
    /// Accuracy missing or above the allowed uncertainty
    Rejected,
    /// Close enough to the current origin
    Keep { distance: f64 },
    Recenter,
}

/// When a location fix should move the world origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecenterPolicy {
    pub threshold: f64,
    pub max_location_uncertainty: f64,
}

impl RecenterPolicy {
    pub fn from_config(config: &LandmarkerConfig) -> Self {
        Self {
            threshold: config.world_recentering_threshold,
            max_location_uncertainty: config.max_location_uncertainty,
        }
    }

    pub fn evaluate(&self, origin: Option<&GeodeticPoint>, fix: &GeodeticPoint) -> RecenterDecision {
        if !fix.has_valid_accuracy() || fix.horizontal_accuracy > self.max_location_uncertainty {
            return RecenterDecision::Rejected;
        }

        match origin {
            None => RecenterDecision::Recenter,
            Some(origin) => {
                let distance = surface_distance(origin, fix);
                if distance > self.threshold {
                    RecenterDecision::Recenter
                } else {
                    RecenterDecision::Keep { distance }
                }
            }
        }
    }
}

/// Owns every live landmark, the world origin and the queue of requests
/// waiting for one
pub struct AnchorStore<T: TrackingSession> {
    session: T,
    origin: Option<GeodeticPoint>,
    origin_epoch: u64,
    landmarks: HashMap<AnchorId, Landmark>,
    pending: PendingQueue,
    max_anchor_distance: f64,
    removal_hook: Option<RemovalHook>,
}

impl<T: TrackingSession> AnchorStore<T> {
    pub fn new(session: T, max_anchor_distance: f64) -> Self {
        Self {
            session,
            origin: None,
            origin_epoch: 0,
            landmarks: HashMap::new(),
            pending: PendingQueue::new(),
            max_anchor_distance,
            removal_hook: None,
        }
    }

    pub fn session(&self) -> &T {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut T {
        &mut self.session
    }

    pub fn set_removal_hook(&mut self, hook: RemovalHook) {
        self.removal_hook = Some(hook);
    }

    pub fn max_anchor_distance(&self) -> f64 {
        self.max_anchor_distance
    }

    /// Applies to landmarks placed from now on
    pub fn set_max_anchor_distance(&mut self, distance: f64) {
        self.max_anchor_distance = distance;
    }

    pub fn origin(&self) -> Option<&GeodeticPoint> {
        self.origin.as_ref()
    }

    /// Incremented every time the origin is replaced
    pub fn origin_epoch(&self) -> u64 {
        self.origin_epoch
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn landmark(&self, id: AnchorId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    /// Snapshot of every live landmark in no particular order
    pub fn current_landmarks(&self) -> Vec<Landmark> {
        self.landmarks.values().cloned().collect()
    }

    /// Place and register a landmark, or queue it while there is no origin
    pub fn add_landmark(
        &mut self,
        metadata: Metadata,
        content: ContentHandle,
        location: GeodeticPoint,
    ) -> SessionResult<AddOutcome> {
        let request = LandmarkRequest::new(metadata, content, location);
        match self.origin {
            None => {
                let ticket = self.pending.push(request);
                debug!(%ticket, "No world origin yet, queued landmark");
                Ok(AddOutcome::Queued(ticket))
            }
            Some(origin) => {
                let placement = place(&origin, &request.location, self.max_anchor_distance);
                self.insert_placed(request, placement).map(AddOutcome::Added)
            }
        }
    }

    /// Queue a request for the next recenter regardless of origin state
    pub fn enqueue(&mut self, request: LandmarkRequest) -> RequestTicket {
        self.pending.push(request)
    }

    pub fn enqueue_with_ticket(&mut self, ticket: RequestTicket, request: LandmarkRequest) {
        self.pending.push_with_ticket(ticket, request);
    }

    /// Ticket for a request placed outside the queue
    pub fn issue_ticket(&mut self) -> RequestTicket {
        self.pending.issue_ticket()
    }

    pub fn cancel_pending(&mut self, ticket: RequestTicket) -> Option<LandmarkRequest> {
        self.pending.cancel(ticket)
    }

    /// Register a landmark whose placement was computed against the current origin
    pub fn insert_placed(&mut self, request: LandmarkRequest, placement: Placement) -> SessionResult<Landmark> {
        let landmark = Landmark {
            id: AnchorId::new(),
            content: request.content,
            location: request.location,
            metadata: request.metadata,
            transform: placement.transform,
            distance: placement.distance,
        };

        self.session.add_anchor(&landmark.anchor())?;
        debug!(id = %landmark.id, distance = landmark.distance, "Registered landmark anchor");
        self.landmarks.insert(landmark.id, landmark.clone());
        Ok(landmark)
    }

    /// Unregister a landmark; `false` when the id is unknown
    pub fn remove_landmark(&mut self, id: AnchorId) -> bool {
        if self.landmarks.remove(&id).is_none() {
            return false;
        }
        self.detach(id);
        true
    }

    /// Unregister every landmark; queued requests stay queued
    pub fn remove_all(&mut self) {
        let ids: Vec<AnchorId> = self.landmarks.drain().map(|(id, _)| id).collect();
        for id in ids {
            self.detach(id);
        }
    }

    fn detach(&mut self, id: AnchorId) {
        if let Some(hook) = self.removal_hook.as_mut() {
            hook(id);
        }
        if let Err(error) = self.session.remove_anchor(id) {
            warn!(%id, %error, "Tracking session failed to remove anchor");
        }
    }

    /// Swap the content of a landmark in place; returns the previous content
    pub fn replace_landmark(&mut self, id: AnchorId, content: ContentHandle) -> Option<ContentHandle> {
        let landmark = self.landmarks.get_mut(&id)?;
        Some(std::mem::replace(&mut landmark.content, content))
    }

    /// Move the world origin and rebuild every landmark against it.
    ///
    /// On reset failure the captured landmarks are re-registered unchanged and
    /// the origin is left alone; any that the session refuses are listed in
    /// [`RecenterFailure::lost`]. Each request is attempted once; failures are
    /// reported, not retried.
    pub fn recenter(&mut self, new_origin: GeodeticPoint) -> Result<RecenterReport, RecenterFailure> {
        let captured = self.current_landmarks();
        self.remove_all();

        if let Err(error) = self.session.reset() {
            warn!(%error, count = captured.len(), "Tracking reset failed, restoring landmarks");
            let lost = self.restore(captured);
            return Err(RecenterFailure { error, lost });
        }

        self.origin = Some(new_origin);
        self.origin_epoch += 1;
        info!(
            latitude = new_origin.latitude,
            longitude = new_origin.longitude,
            epoch = self.origin_epoch,
            "World origin moved"
        );

        let mut report = RecenterReport::default();

        let queued = self.pending.drain();
        if !queued.is_empty() {
            debug!(count = queued.len(), "Flushing pending landmarks");
        }
        for (ticket, request) in queued {
            let location = request.location;
            let placement = place(&new_origin, &location, self.max_anchor_distance);
            match self.insert_placed(request, placement) {
                Ok(landmark) => report.flushed.push((ticket, landmark)),
                Err(error) => report.failures.push(RecreationFailure {
                    request: FailedRequest::Pending(ticket),
                    location,
                    error,
                }),
            }
        }

        for previous in captured {
            let previous_id = previous.id;
            let request = LandmarkRequest::new(previous.metadata, previous.content, previous.location);
            let placement = place(&new_origin, &request.location, self.max_anchor_distance);
            match self.insert_placed(request, placement) {
                Ok(landmark) => report.recreated.push(landmark),
                Err(error) => report.failures.push(RecreationFailure {
                    request: FailedRequest::Recreation(previous_id),
                    location: previous.location,
                    error,
                }),
            }
        }

        if !report.is_complete() {
            warn!(failed = report.failures.len(), "Some landmarks could not be recreated");
        }
        Ok(report)
    }

    fn restore(&mut self, captured: Vec<Landmark>) -> Vec<RecreationFailure> {
        let mut lost = Vec::new();
        for landmark in captured {
            match self.session.add_anchor(&landmark.anchor()) {
                Ok(()) => {
                    self.landmarks.insert(landmark.id, landmark);
                }
                Err(error) => {
                    warn!(id = %landmark.id, %error, "Could not restore landmark");
                    lost.push(RecreationFailure {
                        request: FailedRequest::Recreation(landmark.id),
                        location: landmark.location,
                        error,
                    });
                }
            }
        }
        lost
    }
}

impl<T: TrackingSession> LandmarkLookup for AnchorStore<T> {
    fn landmark(&self, id: AnchorId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }
}
