//! Core data models for the navigation system.

use serde::{Deserialize, Serialize};

/// One coordinate stop along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: i64,
    #[serde(alias = "places_name")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(id: i64, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Ordered list of waypoints for one navigation attempt.
///
/// Position is meaningful: the first waypoint is the origin marker and the
/// last one is the destination marker. A route is always replaced as a
/// whole, never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// True only for the last order index of the route.
    pub fn is_destination(&self, order_index: usize) -> bool {
        !self.waypoints.is_empty() && order_index == self.waypoints.len() - 1
    }
}

impl From<Vec<Waypoint>> for Route {
    fn from(waypoints: Vec<Waypoint>) -> Self {
        Self::new(waypoints)
    }
}

/// A selectable destination offered by the places backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    #[serde(alias = "places_name")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub total_nodes: u32,
}

/// Camera pose in geographic coordinates, as reported by the tracking capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPose {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    /// Heading in degrees, 0 = north
    #[serde(default)]
    pub heading_deg: f64,
    pub horizontal_accuracy_m: f64,
    #[serde(default)]
    pub vertical_accuracy_m: f64,
    pub yaw_accuracy_deg: f64,
}

/// Resolved position of an anchor in AR world space (metres, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPose {
    pub position: [f64; 3],
}

impl WorldPose {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { position: [x, y, z] }
    }
}

/// Yaw-only rotation applied to a route marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Degrees around the world up axis, in [0, 360)
    pub yaw_deg: f64,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation { yaw_deg: 0.0 };

    pub fn from_yaw(yaw_deg: f64) -> Self {
        Self {
            yaw_deg: yaw_deg.rem_euclid(360.0),
        }
    }
}

/// Localization quality phase of the active AR session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalizationPhase {
    /// Waiting for the first good fix
    #[default]
    Localizing,
    /// Pose accuracy within thresholds
    Localized,
    /// Was localized, quality dropped
    Lost,
}

impl std::fmt::Display for LocalizationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalizationPhase::Localizing => write!(f, "LOCALIZING"),
            LocalizationPhase::Localized => write!(f, "LOCALIZED"),
            LocalizationPhase::Lost => write!(f, "LOST"),
        }
    }
}
