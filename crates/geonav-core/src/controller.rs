//! Per-tick navigation pipeline.
//!
//! [`NavigationController`] owns the localization state machine, the
//! anchor orchestrator, the marker state and the session guardian, and
//! advances them in a fixed order once per frame. Asynchronous anchor
//! completions are fed back through [`NavigationController::on_resolve_complete`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::anchors::{
    AnchorResolutionOrchestrator, AnchorResolver, BatchHandle, BatchProgress, Completion,
    ResolveOutcome, ResolveTicket,
};
use crate::error::{FatalCondition, NavError};
use crate::guardian::{GuardianState, SessionGuardian};
use crate::localization::{LocalizationStateMachine, PhaseTransition};
use crate::models::{GeoPose, LocalizationPhase, Route};
use crate::render::{RouteMarker, RouteRenderState};
use crate::rules::NavigationRules;
use crate::sampler::{
    DeviceLocation, EarthState, FeatureSupport, LocationStatus, PoseQualitySampler,
    SessionState, TrackingConfidence, TrackingSnapshot,
};

pub const LOCALIZING_MESSAGE: &str = "Localizing your device to set anchor.";
pub const INITIALIZING_MESSAGE: &str = "Initializing Geospatial functionalities.";
pub const INSTRUCTION_MESSAGE: &str = "Point your camera at buildings, stores, and signs near you.";
pub const SUCCESS_MESSAGE: &str = "Localization completed.";

/// Progress of switching the tracking subsystem into geospatial mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeospatialSetup {
    Pending,
    /// Enable requested; waiting for the configuration to take effect
    Preparing { waited: Duration },
    Ready,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub transition: Option<PhaseTransition>,
    pub submitted: Option<BatchHandle>,
    pub oriented: bool,
    pub terminated: bool,
}

/// Tracking fields mirrored for the debug panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingDebug {
    pub session_state: SessionState,
    pub location_status: LocationStatus,
    pub geospatial_support: FeatureSupport,
    pub earth_state: EarthState,
    pub earth_tracking: TrackingConfidence,
    pub pose: Option<GeoPose>,
}

/// Serializable view of the session for UI and rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub captured_at: DateTime<Utc>,
    pub in_ar_view: bool,
    pub guardian: GuardianState,
    pub phase: LocalizationPhase,
    pub unlocalized_secs: f64,
    pub status_message: String,
    pub route_pending: bool,
    pub batch: Option<BatchProgress>,
    pub anchors: Vec<RouteMarker>,
    pub device_location: Option<DeviceLocation>,
    pub tracking: TrackingDebug,
}

pub struct NavigationController {
    rules: NavigationRules,
    localization: LocalizationStateMachine,
    orchestrator: AnchorResolutionOrchestrator,
    render: RouteRenderState,
    guardian: SessionGuardian,
    geospatial: GeospatialSetup,
    in_ar_view: bool,
    pending_route: Option<Route>,
    active_route: Option<Route>,
    status_message: String,
    last_sample: TrackingSnapshot,
}

impl NavigationController {
    pub fn new(rules: NavigationRules) -> Self {
        Self {
            localization: LocalizationStateMachine::new(&rules),
            orchestrator: AnchorResolutionOrchestrator::new(&rules),
            render: RouteRenderState::new(&rules),
            guardian: SessionGuardian::new(&rules),
            rules,
            geospatial: GeospatialSetup::Pending,
            in_ar_view: false,
            pending_route: None,
            active_route: None,
            status_message: LOCALIZING_MESSAGE.to_string(),
            last_sample: TrackingSnapshot::default(),
        }
    }

    pub fn rules(&self) -> &NavigationRules {
        &self.rules
    }

    pub fn phase(&self) -> LocalizationPhase {
        self.localization.phase()
    }

    pub fn guardian(&self) -> &SessionGuardian {
        &self.guardian
    }

    pub fn orchestrator(&self) -> &AnchorResolutionOrchestrator {
        &self.orchestrator
    }

    pub fn render(&self) -> &RouteRenderState {
        &self.render
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn is_in_ar_view(&self) -> bool {
        self.in_ar_view
    }

    pub fn has_pending_route(&self) -> bool {
        self.pending_route.is_some()
    }

    /// Last raw fix from the device location service.
    pub fn device_location(&self) -> Option<DeviceLocation> {
        self.last_sample.device_location
    }

    /// Enter the tracking view. Localization restarts from `Localizing`.
    /// Ignored once the session is returning.
    pub fn enter_ar_view(&mut self) {
        if !self.guardian.is_active() {
            tracing::debug!("Ignoring enter AR view while returning");
            return;
        }
        self.in_ar_view = true;
        self.localization.reset();
        self.status_message = LOCALIZING_MESSAGE.to_string();
        tracing::info!("Entered AR view");
    }

    /// Leave the tracking view, dropping the route and every marker.
    /// Ignored once the session is returning.
    pub fn exit_ar_view(&mut self) {
        if !self.guardian.is_active() {
            tracing::debug!("Ignoring exit AR view while returning");
            return;
        }
        self.in_ar_view = false;
        self.pending_route = None;
        self.active_route = None;
        self.orchestrator.clear();
        self.render.clear();
        tracing::info!("Left AR view, route cleared");
    }

    /// Replace the current route. It is submitted on the next tick that
    /// observes `Localized`.
    pub fn set_route(&mut self, route: Route) -> Result<(), NavError> {
        if let Some(reason) = self.guardian.state().reason() {
            return Err(NavError::SessionTerminating(reason.to_string()));
        }
        tracing::info!("Route received ({} waypoints)", route.len());
        self.orchestrator.clear();
        self.render.clear();
        self.active_route = None;
        self.pending_route = Some(route);
        Ok(())
    }

    /// Surface a non-fatal message. Ignored once the session is returning.
    pub fn show_message(&mut self, message: impl Into<String>) {
        if self.guardian.is_active() {
            self.status_message = message.into();
        }
    }

    /// Report a fatal condition raised outside the tick (e.g. by platform bootstrap).
    pub fn fail(&mut self, condition: FatalCondition) {
        if self.guardian.report(condition) {
            if let Some(reason) = self.guardian.state().reason() {
                self.status_message = reason.to_string();
            }
        }
    }

    /// Advance the session by one frame.
    pub fn tick<S, R>(&mut self, elapsed: Duration, sampler: &mut S, resolver: &mut R) -> TickReport
    where
        S: PoseQualitySampler + ?Sized,
        R: AnchorResolver + ?Sized,
    {
        let mut report = TickReport {
            terminated: self.guardian.tick(elapsed),
            ..TickReport::default()
        };
        if !self.in_ar_view {
            return report;
        }

        let sample = sampler.sample();
        self.guardian.inspect(&sample);
        if let Some(reason) = self.guardian.state().reason() {
            self.status_message = reason.to_string();
            self.last_sample = sample;
            return report;
        }

        if !sample.session_state.is_running() {
            self.last_sample = sample;
            return report;
        }

        match sample.geospatial_support {
            FeatureSupport::Unknown => {
                self.last_sample = sample;
                return report;
            }
            FeatureSupport::Unsupported => {
                self.fail(FatalCondition::GeospatialUnsupported);
                self.last_sample = sample;
                return report;
            }
            FeatureSupport::Supported => {}
        }

        if !self.geospatial_ready(&sample, elapsed, sampler) {
            self.last_sample = sample;
            return report;
        }

        match &sample.earth_state {
            EarthState::Enabled => {}
            EarthState::NotReady => {
                self.status_message = INITIALIZING_MESSAGE.to_string();
                self.last_sample = sample;
                return report;
            }
            EarthState::Error(name) => {
                let message = format!("Navigation encountered an EarthState error: {}", name);
                tracing::warn!("{}", message);
                self.status_message = message;
                self.last_sample = sample;
                return report;
            }
        }

        match self.localization.observe(&sample.observation(), elapsed) {
            Err(condition) => {
                self.fail(condition);
                self.last_sample = sample;
                return report;
            }
            Ok(Some(transition)) => {
                report.transition = Some(transition);
                if transition.entered_localized() {
                    self.status_message = SUCCESS_MESSAGE.to_string();
                    self.render.set_visible(true);
                } else if transition.lost() {
                    self.render.set_visible(false);
                }
            }
            Ok(None) => {}
        }
        self.last_sample = sample;

        if !self.localization.is_localized() {
            self.status_message = INSTRUCTION_MESSAGE.to_string();
            return report;
        }

        if let Some(route) = self.pending_route.take() {
            let handle = self.orchestrator.submit_route(&route, resolver);
            self.active_route = Some(route);
            report.submitted = Some(handle);
        }
        report.oriented = self.orient_if_settled();

        report
    }

    /// Record an anchor completion delivered by the resolve capability.
    pub fn on_resolve_complete(&mut self, ticket: ResolveTicket, outcome: ResolveOutcome) -> Completion {
        let completion = self.orchestrator.on_resolve_complete(ticket, outcome);

        if let Completion::Recorded { order_index, settled } = completion {
            if let Some(record) = self.orchestrator.record(order_index) {
                if let Some(pose) = record.world_pose() {
                    let is_destination = self
                        .active_route
                        .as_ref()
                        .is_some_and(|route| route.is_destination(order_index));
                    self.render
                        .place_marker(order_index, record.waypoint_id, *pose, is_destination);
                }
            }
            if settled {
                self.orient_if_settled();
            }
        }

        completion
    }

    /// Serializable view of the current session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            captured_at: Utc::now(),
            in_ar_view: self.in_ar_view,
            guardian: self.guardian.state().clone(),
            phase: self.localization.phase(),
            unlocalized_secs: self.localization.unlocalized_for().as_secs_f64(),
            status_message: self.status_message.clone(),
            route_pending: self.pending_route.is_some(),
            batch: self.orchestrator.batch().map(|batch| batch.progress()),
            anchors: self.render.visible_anchors(),
            device_location: self.last_sample.device_location,
            tracking: TrackingDebug {
                session_state: self.last_sample.session_state,
                location_status: self.last_sample.location_status,
                geospatial_support: self.last_sample.geospatial_support,
                earth_state: self.last_sample.earth_state.clone(),
                earth_tracking: self.last_sample.earth_tracking,
                pose: self.last_sample.pose,
            },
        }
    }

    /// Orientation is derived only while localized and the session is active.
    fn orient_if_settled(&mut self) -> bool {
        if !self.localization.is_localized() || !self.guardian.is_active() {
            return false;
        }
        match self.orchestrator.claim_settled() {
            Some(batch) => self.render.on_batch_settled(batch),
            None => false,
        }
    }

    fn geospatial_ready<S>(&mut self, sample: &TrackingSnapshot, elapsed: Duration, sampler: &mut S) -> bool
    where
        S: PoseQualitySampler + ?Sized,
    {
        match self.geospatial {
            GeospatialSetup::Ready => true,
            GeospatialSetup::Pending if sample.geospatial_enabled => {
                self.geospatial = GeospatialSetup::Ready;
                true
            }
            GeospatialSetup::Pending => {
                tracing::info!("Switching tracking to geospatial mode");
                sampler.enable_geospatial();
                self.geospatial = GeospatialSetup::Preparing {
                    waited: Duration::ZERO,
                };
                false
            }
            GeospatialSetup::Preparing { waited } => {
                let waited = waited.saturating_add(elapsed);
                if waited > self.rules.configure_prepare_time() {
                    self.geospatial = GeospatialSetup::Ready;
                    true
                } else {
                    self.geospatial = GeospatialSetup::Preparing { waited };
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::tests::{route, RecordingResolver};
    use crate::anchors::AnchorFailure;
    use crate::models::WorldPose;

    /// Sampler whose next snapshot is set by the test.
    struct ScriptedSampler {
        next: TrackingSnapshot,
        enable_calls: usize,
    }

    impl ScriptedSampler {
        fn localized() -> Self {
            Self {
                next: localized_snapshot(),
                enable_calls: 0,
            }
        }

        fn set_accuracy(&mut self, yaw: f64, horizontal: f64) {
            if let Some(pose) = self.next.pose.as_mut() {
                pose.yaw_accuracy_deg = yaw;
                pose.horizontal_accuracy_m = horizontal;
            }
        }
    }

    impl PoseQualitySampler for ScriptedSampler {
        fn sample(&mut self) -> TrackingSnapshot {
            self.next.clone()
        }

        fn enable_geospatial(&mut self) {
            self.enable_calls += 1;
            self.next.geospatial_enabled = true;
        }
    }

    fn localized_snapshot() -> TrackingSnapshot {
        TrackingSnapshot {
            session_state: SessionState::SessionTracking,
            location_status: LocationStatus::Running,
            geospatial_support: FeatureSupport::Supported,
            geospatial_enabled: true,
            earth_state: EarthState::Enabled,
            earth_tracking: TrackingConfidence::Tracking,
            pose: Some(GeoPose {
                latitude: -7.286963,
                longitude: 112.798324,
                altitude_m: 4.0,
                heading_deg: 12.0,
                horizontal_accuracy_m: 5.0,
                vertical_accuracy_m: 1.0,
                yaw_accuracy_deg: 5.0,
            }),
            device_location: Some(DeviceLocation {
                latitude: -7.286963,
                longitude: 112.798324,
            }),
            missing_components: Vec::new(),
            camera_permission_denied: false,
        }
    }

    const TICK: Duration = Duration::from_millis(16);

    fn controller() -> NavigationController {
        let mut controller = NavigationController::new(NavigationRules::default());
        controller.enter_ar_view();
        controller
    }

    fn complete_all(controller: &mut NavigationController, resolver: &RecordingResolver, order: &[usize]) {
        for &index in order {
            let request = &resolver.requests[index];
            controller.on_resolve_complete(
                request.ticket,
                ResolveOutcome::Resolved(WorldPose::new(index as f64 * 10.0, 0.0, 0.0)),
            );
        }
    }

    #[test]
    fn test_nothing_happens_outside_ar_view() {
        let mut controller = NavigationController::new(NavigationRules::default());
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert_eq!(report, TickReport::default());
        assert_eq!(controller.phase(), LocalizationPhase::Localizing);
    }

    #[test]
    fn test_route_submitted_once_localized() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        sampler.set_accuracy(60.0, 60.0);
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2, 3])).unwrap();
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.submitted.is_none());
        assert!(resolver.requests.is_empty());
        assert_eq!(controller.status_message(), INSTRUCTION_MESSAGE);

        sampler.set_accuracy(5.0, 5.0);
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.transition.unwrap().entered_localized());
        assert_eq!(report.submitted.unwrap().len, 3);
        assert_eq!(resolver.requests.len(), 3);
        assert_eq!(controller.status_message(), SUCCESS_MESSAGE);

        // Consumed
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.submitted.is_none());
        assert_eq!(resolver.requests.len(), 3);
    }

    #[test]
    fn test_out_of_order_completions_orient_once() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2, 3])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        complete_all(&mut controller, &resolver, &[2, 0]);
        assert!(controller.render().computed_for().is_none());
        complete_all(&mut controller, &resolver, &[1]);

        let handle = controller.render().computed_for().expect("oriented");
        assert_eq!(handle.len, 3);
        let edges: Vec<(usize, usize)> = controller
            .render()
            .orientation_edges()
            .iter()
            .map(|e| (e.from, e.to))
            .collect();
        assert_eq!(edges, vec![(0, 1), (1, 2)]);

        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(!report.oriented);
        let anchors = controller.snapshot().anchors;
        assert!(anchors[2].is_destination);
        assert!(!anchors[0].is_destination);
    }

    #[test]
    fn test_flip_lost_and_back_keeps_orientation() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2, 3])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        complete_all(&mut controller, &resolver, &[0, 1, 2]);
        let oriented = controller.render().visible_anchors();
        assert_eq!(oriented.len(), 3);

        sampler.set_accuracy(40.0, 5.0);
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.transition.unwrap().lost());
        assert!(controller.render().visible_anchors().is_empty());
        assert_eq!(controller.render().markers().count(), 3);

        sampler.set_accuracy(5.0, 5.0);
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.transition.unwrap().entered_localized());
        assert!(report.submitted.is_none());
        assert!(!report.oriented);
        assert_eq!(controller.render().visible_anchors(), oriented);
        assert_eq!(resolver.requests.len(), 3);
    }

    #[test]
    fn test_settlement_while_lost_orients_after_relocalizing() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        sampler.set_accuracy(40.0, 40.0);
        controller.tick(TICK, &mut sampler, &mut resolver);
        assert_eq!(controller.phase(), LocalizationPhase::Lost);

        complete_all(&mut controller, &resolver, &[1, 0]);
        assert!(controller.render().computed_for().is_none());

        sampler.set_accuracy(5.0, 5.0);
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.oriented);
    }

    #[test]
    fn test_partial_failure_skips_gap() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2, 3])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        let tickets: Vec<ResolveTicket> = resolver.requests.iter().map(|r| r.ticket).collect();
        controller.on_resolve_complete(tickets[0], ResolveOutcome::Resolved(WorldPose::new(0.0, 0.0, 0.0)));
        controller.on_resolve_complete(tickets[1], ResolveOutcome::Failed(AnchorFailure::ResourceExhausted));
        controller.on_resolve_complete(tickets[2], ResolveOutcome::Resolved(WorldPose::new(0.0, 0.0, 9.0)));

        let edges = controller.render().orientation_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from, edges[0].to), (0, 2));
        let progress = controller.snapshot().batch.unwrap();
        assert_eq!((progress.resolved, progress.failed), (2, 1));
        assert!(progress.orientation_computed);
    }

    #[test]
    fn test_new_route_drops_late_completions() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2, 3])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        let stale: Vec<ResolveTicket> = resolver.requests.drain(..).map(|r| r.ticket).collect();

        controller.set_route(route(&[4, 5])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        for ticket in stale {
            let completion = controller
                .on_resolve_complete(ticket, ResolveOutcome::Resolved(WorldPose::new(1.0, 0.0, 1.0)));
            assert_eq!(completion, Completion::Stale);
        }
        assert_eq!(controller.render().markers().count(), 0);

        complete_all(&mut controller, &resolver, &[0, 1]);
        assert_eq!(controller.render().markers().count(), 2);
        assert_eq!(controller.render().computed_for().unwrap().generation, 2);
    }

    #[test]
    fn test_localization_timeout_terminates_after_delay() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        sampler.set_accuracy(90.0, 90.0);
        let mut resolver = RecordingResolver::default();

        for _ in 0..180 {
            controller.tick(Duration::from_secs(1), &mut sampler, &mut resolver);
        }
        assert!(controller.guardian().is_active());

        controller.tick(Duration::from_millis(1), &mut sampler, &mut resolver);
        assert!(matches!(controller.guardian().state(), GuardianState::Returning { .. }));
        assert_eq!(
            controller.status_message(),
            FatalCondition::LocalizationTimeout.to_string()
        );

        let report = controller.tick(Duration::from_secs(2), &mut sampler, &mut resolver);
        assert!(!report.terminated);
        let report = controller.tick(Duration::from_secs(1), &mut sampler, &mut resolver);
        assert!(report.terminated);
        assert!(controller.guardian().is_terminated());
        assert!(controller.set_route(route(&[1])).is_err());
    }

    #[test]
    fn test_returning_suppresses_submission_and_visibility() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2])).unwrap();
        controller.fail(FatalCondition::LocationServiceFailed);
        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.submitted.is_none());
        assert!(resolver.requests.is_empty());
        assert_eq!(controller.phase(), LocalizationPhase::Localizing);
    }

    #[test]
    fn test_bootstrap_failure_terminates_outside_ar_view() {
        let mut controller = NavigationController::new(NavigationRules::default());
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.fail(FatalCondition::MissingComponents(vec!["ARSession".into()]));
        assert!(!controller.is_in_ar_view());

        let report = controller.tick(Duration::from_secs(2), &mut sampler, &mut resolver);
        assert!(!report.terminated);
        let report = controller.tick(Duration::from_secs(2), &mut sampler, &mut resolver);
        assert!(report.terminated);
        assert!(controller.guardian().is_terminated());
        assert!(resolver.requests.is_empty());
    }

    #[test]
    fn test_view_changes_ignored_while_returning() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        complete_all(&mut controller, &resolver, &[0]);

        controller.fail(FatalCondition::LocationServiceFailed);
        controller.exit_ar_view();
        assert!(controller.is_in_ar_view());
        assert!(controller.orchestrator().batch().is_some());
        assert_eq!(controller.render().markers().count(), 1);

        let mut terminated = false;
        for _ in 0..4 {
            terminated |= controller.tick(Duration::from_secs(1), &mut sampler, &mut resolver).terminated;
        }
        assert!(terminated);
        assert!(controller.guardian().is_terminated());

        controller.enter_ar_view();
        assert_eq!(
            controller.status_message(),
            FatalCondition::LocationServiceFailed.to_string()
        );
    }

    #[test]
    fn test_unsupported_device_is_fatal() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        sampler.next.geospatial_support = FeatureSupport::Unsupported;
        let mut resolver = RecordingResolver::default();

        controller.tick(TICK, &mut sampler, &mut resolver);
        assert_eq!(
            controller.guardian().condition(),
            Some(&FatalCondition::GeospatialUnsupported)
        );
    }

    #[test]
    fn test_geospatial_enable_waits_for_settle_time() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        sampler.next.geospatial_enabled = false;
        let mut resolver = RecordingResolver::default();

        controller.tick(TICK, &mut sampler, &mut resolver);
        assert_eq!(sampler.enable_calls, 1);
        controller.tick(Duration::from_secs(3), &mut sampler, &mut resolver);
        assert_eq!(controller.phase(), LocalizationPhase::Localizing);

        let report = controller.tick(TICK, &mut sampler, &mut resolver);
        assert!(report.transition.unwrap().entered_localized());
        assert_eq!(sampler.enable_calls, 1);
    }

    #[test]
    fn test_earth_not_ready_shows_initializing() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        sampler.next.earth_state = EarthState::NotReady;
        let mut resolver = RecordingResolver::default();

        controller.tick(TICK, &mut sampler, &mut resolver);
        assert_eq!(controller.status_message(), INITIALIZING_MESSAGE);
        assert_eq!(controller.phase(), LocalizationPhase::Localizing);
    }

    #[test]
    fn test_exit_clears_route_and_markers() {
        let mut controller = controller();
        let mut sampler = ScriptedSampler::localized();
        let mut resolver = RecordingResolver::default();

        controller.set_route(route(&[1, 2])).unwrap();
        controller.tick(TICK, &mut sampler, &mut resolver);
        complete_all(&mut controller, &resolver, &[0]);
        controller.exit_ar_view();

        assert!(controller.orchestrator().batch().is_none());
        assert_eq!(controller.render().markers().count(), 0);
        assert_eq!(
            controller.on_resolve_complete(
                resolver.requests[1].ticket,
                ResolveOutcome::Resolved(WorldPose::new(0.0, 0.0, 0.0))
            ),
            Completion::Stale
        );

        let snapshot = controller.snapshot();
        assert!(!snapshot.in_ar_view);
        assert!(snapshot.batch.is_none());
        assert!(serde_json::to_value(&snapshot).is_ok());
    }
}
