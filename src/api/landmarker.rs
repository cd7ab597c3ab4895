//! Event-driven owner of landmark, origin and scene state

use crate::algorithms::geo_transform::surface_distance;
use crate::api::callback::LandmarkerDelegate;
use crate::api::types::{
    AuthorizationAction, LandmarkerError, LandmarkerEvent, LandmarkerResult, LocationAuthorization, PumpSummary,
};
use crate::api::worker::{TransformJob, TransformResult, TransformWorker};
use crate::core::{AnchorId, ContentHandle, GeodeticPoint, Landmark, Metadata, LANDMARK_NODE_GENERATION};
use crate::processing::intersection::{anchor_for_node, IntersectionProbe, NodeId, SceneGraph};
use crate::processing::overlap::{OverlapResolver, OverlappingStrategy, VisibilityDecision};
use crate::processing::scheduler::ProbeTimer;
use crate::processing::view_scale::{DisplayAttributes, DisplayScaler};
use crate::session::{CapabilityGate, CapabilityStatus, StaticCapabilityGate, TrackingSession};
use crate::store::{
    AddOutcome, AnchorStore, LandmarkRequest, RecenterDecision, RecenterPolicy, RecenterReport, RequestTicket,
};
use crate::utils::config::{ConfigError, ConfigurationManager, LandmarkerConfig};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Places landmarks around a moving world origin and keeps their on-screen
/// views from piling up.
///
/// All state lives here and is only touched through `&mut self`. Location
/// fixes, authorization changes, probe ticks and worker results arrive as
/// [`LandmarkerEvent`]s on one channel and are applied by [`Landmarker::pump`].
pub struct Landmarker<T: TrackingSession, S: SceneGraph> {
    store: AnchorStore<T>,
    scene: S,
    config: ConfigurationManager,
    policy: RecenterPolicy,
    resolver: OverlapResolver,
    probe: IntersectionProbe,
    scaler: DisplayScaler,
    gate: Box<dyn CapabilityGate + Send>,
    delegate: Option<Box<dyn LandmarkerDelegate>>,
    events_tx: Sender<LandmarkerEvent>,
    events_rx: Receiver<LandmarkerEvent>,
    removed_rx: Receiver<AnchorId>,
    worker: TransformWorker,
    timer: Option<ProbeTimer>,
    in_flight: HashSet<RequestTicket>,
    /// Observer location at each landmark's last content refresh
    refreshed_at: HashMap<AnchorId, GeodeticPoint>,
    recentering_enabled: bool,
}

impl<T: TrackingSession, S: SceneGraph> Landmarker<T, S> {
    /// Create a landmarker with a validated configuration.
    ///
    /// The display limit always comes from the session and replaces the
    /// configured one before validation. The camera capability is assumed
    /// authorized until a gate is installed with [`Landmarker::with_capability_gate`].
    pub fn new(session: T, scene: S, mut config: LandmarkerConfig) -> LandmarkerResult<Self> {
        config.tracking_display_limit = session.display_limit();
        let config = ConfigurationManager::with_config(config)?;
        let settings = config.config();

        let mut store = AnchorStore::new(session, settings.max_anchor_distance());
        let (removed_tx, removed_rx) = unbounded();
        store.set_removal_hook(Box::new(move |id| {
            let _ = removed_tx.send(id);
        }));

        let (events_tx, events_rx) = unbounded();
        let worker = TransformWorker::spawn(events_tx.clone(), LandmarkerEvent::TransformReady);

        Ok(Self {
            store,
            scene,
            policy: RecenterPolicy::from_config(settings),
            resolver: OverlapResolver::from_config(settings),
            probe: IntersectionProbe::new(settings.search_generation),
            scaler: DisplayScaler::from_config(settings),
            config,
            gate: Box::new(StaticCapabilityGate::authorized()),
            delegate: None,
            events_tx,
            events_rx,
            removed_rx,
            worker,
            timer: None,
            in_flight: HashSet::new(),
            refreshed_at: HashMap::new(),
            recentering_enabled: true,
        })
    }

    pub fn with_capability_gate(mut self, gate: impl CapabilityGate + Send + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_delegate(mut self, delegate: impl LandmarkerDelegate + 'static) -> Self {
        self.set_delegate(delegate);
        self
    }

    pub fn set_delegate(&mut self, delegate: impl LandmarkerDelegate + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    /// Sender for location, authorization and probe events
    pub fn event_sender(&self) -> Sender<LandmarkerEvent> {
        self.events_tx.clone()
    }

    pub fn config(&self) -> &LandmarkerConfig {
        self.config.config()
    }

    pub fn origin(&self) -> Option<&GeodeticPoint> {
        self.store.origin()
    }

    pub fn store(&self) -> &AnchorStore<T> {
        &self.store
    }

    pub fn session(&self) -> &T {
        self.store.session()
    }

    pub fn session_mut(&mut self) -> &mut T {
        self.store.session_mut()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn is_recentering_enabled(&self) -> bool {
        self.recentering_enabled
    }

    /// Submissions waiting on the transform worker
    pub fn pending_submissions(&self) -> usize {
        self.in_flight.len()
    }

    pub fn current_landmarks(&self) -> Vec<Landmark> {
        self.store.current_landmarks()
    }

    pub fn landmark(&self, id: AnchorId) -> Option<&Landmark> {
        self.store.landmark(id)
    }

    /// Drain and apply every queued event.
    ///
    /// Fixes are coalesced so at most one recenter runs per pump; a probe tick
    /// runs one scan after everything else has been applied. Failures go to
    /// the delegate's `did_fail`.
    pub fn pump(&mut self) -> PumpSummary {
        let events: Vec<LandmarkerEvent> = self.events_rx.try_iter().collect();
        let mut summary = PumpSummary {
            events: events.len(),
            ..PumpSummary::default()
        };

        let mut latest_fix = None;
        let mut fix_count = 0;
        let mut probe_due = false;

        for event in events {
            match event {
                LandmarkerEvent::LocationUpdate(fixes) => {
                    fix_count += fixes.len();
                    if let Some(fix) = fixes.last() {
                        latest_fix = Some(*fix);
                    }
                }
                LandmarkerEvent::LocationFailed { reason } => {
                    self.notify_failure(LandmarkerError::LocationFailure { reason });
                }
                LandmarkerEvent::AuthorizationChanged(status) => {
                    let action = self.handle_authorization_change(status);
                    summary.actions.push(action);
                }
                // Ticks still queued when the timer was stopped are dropped
                LandmarkerEvent::ProbeTick => probe_due = self.timer.is_some(),
                LandmarkerEvent::TransformReady(result) => self.apply_transform(result),
            }
        }

        if let Some(fix) = latest_fix {
            summary.coalesced_fixes = fix_count - 1;
            match self.on_location_update(&[fix]) {
                Ok(report) => summary.recentered = report.is_some(),
                Err(error) => self.notify_failure(error),
            }
        }

        if probe_due {
            self.run_probe_cycle();
            summary.probed = true;
        }

        summary
    }

    /// Evaluate the most recent fix of a batch against the recenter policy
    pub fn on_location_update(&mut self, fixes: &[GeodeticPoint]) -> LandmarkerResult<Option<RecenterReport>> {
        let Some(fix) = fixes.last() else {
            return Ok(None);
        };

        match self.policy.evaluate(self.store.origin(), fix) {
            RecenterDecision::Rejected => {
                debug!(accuracy = fix.horizontal_accuracy, "Ignoring imprecise location fix");
                Ok(None)
            }
            RecenterDecision::Keep { distance } => {
                trace!(distance, "Fix within recentering threshold");
                self.refresh_content(*fix);
                Ok(None)
            }
            RecenterDecision::Recenter => self.recenter(*fix),
        }
    }

    /// Move the world origin to `origin` if the camera capability allows it.
    ///
    /// Returns `Ok(None)` when the capability is undetermined or recentering
    /// was previously disabled by a denial.
    pub fn recenter(&mut self, origin: GeodeticPoint) -> LandmarkerResult<Option<RecenterReport>> {
        if !self.recentering_enabled {
            trace!("Recentering disabled, ignoring fix");
            return Ok(None);
        }

        let status = self.gate.authorization_status();
        if status.is_terminal_denial() {
            warn!(?status, "Camera authorization refused, disabling recentering");
            self.recentering_enabled = false;
            return Err(LandmarkerError::AuthorizationDenied);
        }
        if status != CapabilityStatus::Authorized {
            debug!(?status, "Camera authorization not determined, skipping recenter");
            return Ok(None);
        }

        let result = self.store.recenter(origin);
        self.sync_scene();
        let report = match result {
            Ok(report) => report,
            Err(failure) => {
                for lost in failure.lost {
                    self.notify_failure(LandmarkerError::RecreationFailed { failure: lost });
                }
                return Err(failure.error.into());
            }
        };
        self.scaler.clear();
        self.refreshed_at.clear();

        info!(
            flushed = report.flushed.len(),
            recreated = report.recreated.len(),
            failed = report.failures.len(),
            "Recentered world"
        );

        if let Some(delegate) = self.delegate.as_mut() {
            for (ticket, landmark) in &report.flushed {
                delegate.did_add(*ticket, landmark);
            }
            for failure in &report.failures {
                delegate.did_fail(&LandmarkerError::RecreationFailed {
                    failure: failure.clone(),
                });
            }
            delegate.did_recenter(&report);
        }

        Ok(Some(report))
    }

    /// Translate a location-authorization change into the provider action
    pub fn handle_authorization_change(&mut self, status: LocationAuthorization) -> AuthorizationAction {
        match status {
            LocationAuthorization::AuthorizedWhenInUse | LocationAuthorization::AuthorizedAlways => {
                AuthorizationAction::StartUpdates
            }
            LocationAuthorization::NotDetermined => AuthorizationAction::RequestAuthorization,
            LocationAuthorization::Denied | LocationAuthorization::Restricted => {
                self.notify_failure(LandmarkerError::LocationFailure {
                    reason: format!("location authorization {:?}", status).to_lowercase(),
                });
                AuthorizationAction::NoAction
            }
        }
    }

    /// Place a landmark now, or queue it until the first accepted fix
    pub fn add_landmark(
        &mut self,
        metadata: Metadata,
        content: ContentHandle,
        location: GeodeticPoint,
    ) -> LandmarkerResult<AddOutcome> {
        Ok(self.store.add_landmark(metadata, content, location)?)
    }

    /// Compute the placement on the transform worker; the landmark is reported
    /// through `did_add` once a later pump applies it
    pub fn submit_landmark(&mut self, metadata: Metadata, content: ContentHandle, location: GeodeticPoint) -> RequestTicket {
        let request = LandmarkRequest::new(metadata, content, location);
        match self.store.origin().copied() {
            None => self.store.enqueue(request),
            Some(origin) => {
                let ticket = self.store.issue_ticket();
                self.dispatch(ticket, request, origin);
                ticket
            }
        }
    }

    fn dispatch(&mut self, ticket: RequestTicket, request: LandmarkRequest, origin: GeodeticPoint) {
        let job = TransformJob {
            ticket,
            request,
            origin,
            epoch: self.store.origin_epoch(),
            max_anchor_distance: self.store.max_anchor_distance(),
        };
        self.in_flight.insert(ticket);
        if let Err(job) = self.worker.submit(job) {
            warn!(%ticket, "Transform worker unavailable, placing inline");
            self.apply_transform(job.compute());
        }
    }

    fn apply_transform(&mut self, result: TransformResult) {
        self.in_flight.remove(&result.ticket);

        if result.epoch != self.store.origin_epoch() {
            debug!(ticket = %result.ticket, epoch = result.epoch, "Placement computed against old origin, resubmitting");
            match self.store.origin().copied() {
                Some(origin) => self.dispatch(result.ticket, result.request, origin),
                None => self.store.enqueue_with_ticket(result.ticket, result.request),
            }
            return;
        }

        let ticket = result.ticket;
        match self.store.insert_placed(result.request, result.placement) {
            Ok(landmark) => {
                if let Some(delegate) = self.delegate.as_mut() {
                    delegate.did_add(ticket, &landmark);
                }
            }
            Err(error) => self.notify_failure(error.into()),
        }
    }

    /// Remove a landmark and its scene nodes; `false` for unknown ids
    pub fn remove_landmark(&mut self, id: AnchorId) -> bool {
        let removed = self.store.remove_landmark(id);
        self.sync_scene();
        removed
    }

    pub fn remove_all_landmarks(&mut self) {
        self.store.remove_all();
        self.sync_scene();
    }

    /// Swap a landmark's content, keeping its anchor; returns the old content
    pub fn replace_landmark(&mut self, id: AnchorId, content: ContentHandle) -> LandmarkerResult<ContentHandle> {
        self.store
            .replace_landmark(id, content)
            .ok_or(LandmarkerError::UnknownLandmark(id))
    }

    fn sync_scene(&mut self) {
        for id in self.removed_rx.try_iter() {
            self.scene.detach_anchor(id);
            self.scaler.forget(id);
            self.refreshed_at.remove(&id);
        }
    }

    /// Offer fresh content for every landmark the observer has moved more than
    /// `min_update_distance` away from since its last refresh; returns how many
    /// landmarks the delegate replaced
    pub fn refresh_content(&mut self, location: GeodeticPoint) -> usize {
        let Some(origin) = self.store.origin().copied() else {
            return 0;
        };
        if self.delegate.is_none() {
            return 0;
        }

        let min_update_distance = self.config.config().min_update_distance;
        let mut replaced = 0;
        for landmark in self.store.current_landmarks() {
            // Landmarks never refreshed were built for the origin
            let reference = self.refreshed_at.get(&landmark.id).copied().unwrap_or(origin);
            if surface_distance(&reference, &location) <= min_update_distance {
                continue;
            }
            self.refreshed_at.insert(landmark.id, location);

            let content = self
                .delegate
                .as_mut()
                .and_then(|delegate| delegate.will_update(&landmark, &location));
            if let Some(content) = content {
                self.store.replace_landmark(landmark.id, content);
                replaced += 1;
            }
        }

        if replaced > 0 {
            debug!(replaced, "Refreshed landmark content");
        }
        replaced
    }

    /// Report each tapped node that renders a landmark; returns their ids
    pub fn handle_taps(&mut self, nodes: &[NodeId]) -> Vec<AnchorId> {
        let mut tapped = Vec::new();
        for &node in nodes {
            let Some(landmark) = anchor_for_node(&self.scene, node, LANDMARK_NODE_GENERATION)
                .and_then(|id| self.store.landmark(id))
            else {
                continue;
            };
            tapped.push(landmark.id);
            if let Some(delegate) = self.delegate.as_mut() {
                delegate.did_tap(landmark);
            }
        }
        tapped
    }

    /// Scan the scene for overlapping nodes and apply the overlap strategy
    pub fn run_probe_cycle(&mut self) -> Vec<VisibilityDecision> {
        let scan = self.probe.scan(&self.scene);
        let decisions = self.resolver.resolve(&self.scene, &self.store, &scan);
        OverlapResolver::apply(&mut self.scene, &decisions);
        trace!(
            groups = scan.groups.len(),
            independents = scan.independents.len(),
            decided = decisions.len(),
            "Probe cycle finished"
        );

        if let Some(timer) = self.timer.as_ref() {
            timer.cycle_guard().complete();
        }
        decisions
    }

    /// Start posting probe ticks at the configured interval
    pub fn start_probe_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let interval = self.config.config().intersection_check_interval();
        self.timer = Some(ProbeTimer::start(interval, self.events_tx.clone(), || LandmarkerEvent::ProbeTick));
    }

    /// Stop probing; nodes keep their last visibility
    pub fn stop_probe_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }

    pub fn is_probing(&self) -> bool {
        self.timer.is_some()
    }

    /// Display attributes for a landmark node; `None` for unknown ids or when
    /// nothing changed since the last call for this landmark
    pub fn display_update(&mut self, id: AnchorId, tracking_scale: f64) -> Option<DisplayAttributes> {
        let distance = self.store.landmark(id)?.distance;
        self.scaler.update(id, distance, tracking_scale)
    }

    /// Apply a validated configuration change.
    ///
    /// Changes that move the display limit away from the session's are
    /// rejected and leave the configuration untouched.
    pub fn configure<R>(
        &mut self,
        change: impl FnOnce(&mut ConfigurationManager) -> Result<R, ConfigError>,
    ) -> LandmarkerResult<R> {
        let snapshot = self.config.create_snapshot();
        let previous_interval = self.config.config().intersection_check_interval();
        let outcome = change(&mut self.config)?;

        let display_limit = self.store.session().display_limit();
        let configured = self.config.config().tracking_display_limit;
        if configured != display_limit {
            self.config.restore_from_snapshot(snapshot);
            return Err(ConfigError::invalid(
                "tracking_display_limit",
                configured,
                "Display limit is fixed by the tracking session",
            )
            .into());
        }

        self.apply_config(previous_interval);
        Ok(outcome)
    }

    pub fn set_world_recentering_threshold(&mut self, threshold: f64) -> LandmarkerResult<f64> {
        self.configure(|config| config.set_world_recentering_threshold(threshold))
    }

    pub fn set_overlapping_strategy(&mut self, strategy: OverlappingStrategy) -> OverlappingStrategy {
        let previous = self.config.set_overlapping_strategy(strategy);
        self.resolver = OverlapResolver::from_config(self.config.config());
        previous
    }

    fn apply_config(&mut self, previous_interval: Duration) {
        let config = self.config.config();
        self.policy = RecenterPolicy::from_config(config);
        self.resolver = OverlapResolver::from_config(config);
        self.probe = IntersectionProbe::new(config.search_generation);
        self.scaler.reconfigure(config);
        self.store.set_max_anchor_distance(config.max_anchor_distance());
        let interval_changed = config.intersection_check_interval() != previous_interval;

        if interval_changed && self.timer.is_some() {
            self.stop_probe_timer();
            self.start_probe_timer();
        }
    }

    fn notify_failure(&mut self, error: LandmarkerError) {
        warn!(%error, "Landmarker failure");
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_fail(&error);
        }
    }
}
