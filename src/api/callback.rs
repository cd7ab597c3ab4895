//! Delegate callbacks for landmarker notifications

use crate::api::types::LandmarkerError;
use crate::core::{ContentHandle, GeodeticPoint, Landmark};
use crate::store::{RecenterReport, RequestTicket};

/// Callback function type for landmark notifications
pub type LandmarkCallback = Box<dyn FnMut(&Landmark) + Send>;

/// Callback function type for failures
pub type FailureCallback = Box<dyn FnMut(&LandmarkerError) + Send>;

/// Callback function type for asynchronously created landmarks
pub type AddedCallback = Box<dyn FnMut(RequestTicket, &Landmark) + Send>;

/// Callback function type for completed recenters
pub type RecenterCallback = Box<dyn FnMut(&RecenterReport) + Send>;

/// Callback function type for content refreshes
pub type UpdateCallback = Box<dyn FnMut(&Landmark, &GeodeticPoint) -> Option<ContentHandle> + Send>;

/// Receives landmarker notifications; every method defaults to a no-op
pub trait LandmarkerDelegate: Send {
    /// A landmark's view was tapped
    fn did_tap(&mut self, _landmark: &Landmark) {}

    /// Any failure raised while processing events
    fn did_fail(&mut self, _error: &LandmarkerError) {}

    /// A queued or submitted request became a live landmark
    fn did_add(&mut self, _ticket: RequestTicket, _landmark: &Landmark) {}

    fn did_recenter(&mut self, _report: &RecenterReport) {}

    /// The observer moved past the minimum update distance since this
    /// landmark's content was last refreshed. Returning new content replaces
    /// it in place; `None` keeps the current content.
    fn will_update(&mut self, _landmark: &Landmark, _location: &GeodeticPoint) -> Option<ContentHandle> {
        None
    }
}

/// Delegate assembled from optional closures
#[derive(Default)]
pub struct CallbackDelegate {
    on_tap: Option<LandmarkCallback>,
    on_failure: Option<FailureCallback>,
    on_added: Option<AddedCallback>,
    on_recenter: Option<RecenterCallback>,
    on_update: Option<UpdateCallback>,
}

impl CallbackDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tap(mut self, callback: impl FnMut(&Landmark) + Send + 'static) -> Self {
        self.on_tap = Some(Box::new(callback));
        self
    }

    pub fn on_failure(mut self, callback: impl FnMut(&LandmarkerError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn on_added(mut self, callback: impl FnMut(RequestTicket, &Landmark) + Send + 'static) -> Self {
        self.on_added = Some(Box::new(callback));
        self
    }

    pub fn on_recenter(mut self, callback: impl FnMut(&RecenterReport) + Send + 'static) -> Self {
        self.on_recenter = Some(Box::new(callback));
        self
    }

    pub fn on_update(
        mut self,
        callback: impl FnMut(&Landmark, &GeodeticPoint) -> Option<ContentHandle> + Send + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }
}

impl LandmarkerDelegate for CallbackDelegate {
    fn did_tap(&mut self, landmark: &Landmark) {
        if let Some(callback) = self.on_tap.as_mut() {
            callback(landmark);
        }
    }

    fn did_fail(&mut self, error: &LandmarkerError) {
        if let Some(callback) = self.on_failure.as_mut() {
            callback(error);
        }
    }

    fn did_add(&mut self, ticket: RequestTicket, landmark: &Landmark) {
        if let Some(callback) = self.on_added.as_mut() {
            callback(ticket, landmark);
        }
    }

    fn did_recenter(&mut self, report: &RecenterReport) {
        if let Some(callback) = self.on_recenter.as_mut() {
            callback(report);
        }
    }

    fn will_update(&mut self, landmark: &Landmark, location: &GeodeticPoint) -> Option<ContentHandle> {
        self.on_update.as_mut().and_then(|callback| callback(landmark, location))
    }
}
