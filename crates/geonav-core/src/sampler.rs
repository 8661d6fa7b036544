//! Adapter over the external pose tracking capability.
//!
//! The tracking subsystem is sampled once per tick. Everything the
//! navigation core needs to know about it is captured in a
//! [`TrackingSnapshot`].

use serde::{Deserialize, Serialize};

use crate::models::GeoPose;

/// Lifecycle state of the AR session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    None,
    CheckingAvailability,
    NeedsInstall,
    Installing,
    Ready,
    SessionInitializing,
    SessionTracking,
    Unsupported,
    /// Generic session failure
    Error,
}

impl SessionState {
    /// States in which the session is healthy (not an error).
    pub fn is_healthy(self) -> bool {
        matches!(
            self,
            SessionState::CheckingAvailability
                | SessionState::Ready
                | SessionState::SessionInitializing
                | SessionState::SessionTracking
        )
    }

    /// States in which pose data may be produced.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            SessionState::SessionInitializing | SessionState::SessionTracking
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::None => "None",
            SessionState::CheckingAvailability => "CheckingAvailability",
            SessionState::NeedsInstall => "NeedsInstall",
            SessionState::Installing => "Installing",
            SessionState::Ready => "Ready",
            SessionState::SessionInitializing => "SessionInitializing",
            SessionState::SessionTracking => "SessionTracking",
            SessionState::Unsupported => "Unsupported",
            SessionState::Error => "Error",
        };
        f.write_str(name)
    }
}

/// Status of the device location service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    #[default]
    Stopped,
    Initializing,
    Running,
    Failed,
}

/// Whether the device supports geospatial mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSupport {
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

/// State of the earth (geospatial) subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarthState {
    Enabled,
    #[default]
    NotReady,
    /// Any other error state, by name
    Error(String),
}

/// Tracking confidence reported by the earth subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingConfidence {
    Tracking,
    Limited,
    #[default]
    None,
}

/// Last raw fix from the device location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything sampled from the tracking capability in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub session_state: SessionState,
    pub location_status: LocationStatus,
    pub geospatial_support: FeatureSupport,
    pub geospatial_enabled: bool,
    pub earth_state: EarthState,
    pub earth_tracking: TrackingConfidence,
    /// Camera geospatial pose, present only while earth tracking is active
    pub pose: Option<GeoPose>,
    pub device_location: Option<DeviceLocation>,
    /// Names of required AR components that could not be found
    #[serde(default)]
    pub missing_components: Vec<String>,
    #[serde(default)]
    pub camera_permission_denied: bool,
}

/// Quality triple consumed by the localization state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub confidence: TrackingConfidence,
    pub yaw_accuracy_deg: f64,
    pub horizontal_accuracy_m: f64,
}

impl TrackingSnapshot {
    /// Derive the localization observation for this tick.
    ///
    /// Tracking only counts as active when the AR session is tracking, the
    /// location service is running and the earth subsystem is tracking.
    /// Without a pose the accuracies are infinite.
    pub fn observation(&self) -> Observation {
        let session_ready = self.session_state == SessionState::SessionTracking
            && self.location_status == LocationStatus::Running;
        let confidence = if session_ready {
            self.earth_tracking
        } else {
            TrackingConfidence::None
        };

        match (confidence, self.pose) {
            (TrackingConfidence::Tracking, Some(pose)) => Observation {
                confidence,
                yaw_accuracy_deg: pose.yaw_accuracy_deg,
                horizontal_accuracy_m: pose.horizontal_accuracy_m,
            },
            _ => Observation {
                confidence,
                yaw_accuracy_deg: f64::INFINITY,
                horizontal_accuracy_m: f64::INFINITY,
            },
        }
    }
}

/// Supplied capability that reports tracking state each tick.
pub trait PoseQualitySampler {
    /// Sample the current tracking state.
    fn sample(&mut self) -> TrackingSnapshot;

    /// Ask the tracking subsystem to switch geospatial mode on.
    fn enable_geospatial(&mut self);
}
