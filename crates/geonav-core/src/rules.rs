//! Thresholds and timing constants for a navigation session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for localization quality gating and session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationRules {
    /// Maximum orientation yaw accuracy (degrees) accepted as localized
    pub yaw_accuracy_threshold_deg: f64,
    /// Maximum horizontal accuracy (meters) accepted as localized
    pub horizontal_accuracy_threshold_m: f64,
    /// Time spent not localized before the session is abandoned (seconds)
    pub localization_timeout_secs: f64,
    /// How long a fatal reason stays on screen before termination (seconds)
    pub error_display_secs: f64,
    /// Wait after enabling geospatial mode for the config to take effect (seconds)
    pub configure_prepare_secs: f64,
    /// Yaw added to the look-at rotation of every marker (marker model forward axis)
    pub marker_yaw_offset_deg: f64,
    /// Height above terrain for intermediate markers (meters)
    pub marker_height_m: f64,
    /// Height above terrain for the destination marker (meters)
    pub destination_height_m: f64,
}

impl Default for NavigationRules {
    fn default() -> Self {
        Self {
            yaw_accuracy_threshold_deg: 25.0,
            horizontal_accuracy_threshold_m: 20.0,
            localization_timeout_secs: 180.0,
            error_display_secs: 3.0,
            configure_prepare_secs: 3.0,
            marker_yaw_offset_deg: 90.0,
            marker_height_m: 0.5,
            destination_height_m: 0.0,
        }
    }
}

impl NavigationRules {
    pub fn localization_timeout(&self) -> Duration {
        secs(self.localization_timeout_secs)
    }

    pub fn error_display_delay(&self) -> Duration {
        secs(self.error_display_secs)
    }

    pub fn configure_prepare_time(&self) -> Duration {
        secs(self.configure_prepare_secs)
    }

    /// Terrain height offset requested when resolving a marker's anchor.
    pub fn height_offset(&self, is_destination: bool) -> f64 {
        if is_destination {
            self.destination_height_m
        } else {
            self.marker_height_m
        }
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}
