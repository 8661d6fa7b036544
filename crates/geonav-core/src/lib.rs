pub mod anchors;
pub mod controller;
pub mod error;
pub mod guardian;
pub mod localization;
pub mod models;
pub mod render;
pub mod rules;
pub mod sampler;
pub mod spatial;

pub use anchors::{
    AnchorFailure, AnchorRecord, AnchorResolutionOrchestrator, AnchorResolver, BatchHandle,
    BatchProgress, Completion, NavigationBatch, ResolutionState, ResolveOutcome, ResolveRequest,
    ResolveTicket,
};
pub use controller::{NavigationController, SessionSnapshot, TickReport, TrackingDebug};
pub use error::{FatalCondition, NavError};
pub use guardian::{GuardianState, SessionGuardian};
pub use localization::{LocalizationStateMachine, PhaseTransition};
pub use models::{GeoPose, LocalizationPhase, Orientation, Place, Route, Waypoint, WorldPose};
pub use render::{OrientationEdge, RouteMarker, RouteRenderState};
pub use rules::NavigationRules;
pub use sampler::{
    DeviceLocation, EarthState, FeatureSupport, LocationStatus, Observation, PoseQualitySampler,
    SessionState, TrackingConfidence, TrackingSnapshot,
};
pub use spatial::{geo_to_world, look_at_yaw_deg};
