//! Simulated tracking and terrain backends.
//!
//! Stand in for the device's AR tracking and terrain anchor services so the
//! runtime can be exercised end to end without hardware.

use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::SimConfig;
use crate::resolver::TerrainAnchorService;
use geonav_core::spatial::geo_to_world;
use geonav_core::{
    AnchorFailure, DeviceLocation, EarthState, FeatureSupport, GeoPose, LocationStatus,
    PoseQualitySampler, ResolveOutcome, ResolveRequest, SessionState, TrackingConfidence,
    TrackingSnapshot,
};

const START_YAW_ACCURACY_DEG: f64 = 60.0;
const FINAL_YAW_ACCURACY_DEG: f64 = 5.0;
const START_HORIZONTAL_ACCURACY_M: f64 = 50.0;
const FINAL_HORIZONTAL_ACCURACY_M: f64 = 3.0;

/// A window during which earth tracking drops to `Limited`.
#[derive(Debug, Clone, Copy)]
struct Dropout {
    start: Duration,
    length: Duration,
}

/// Tracking whose accuracy converges linearly from poor to good.
pub struct SimulatedTracking {
    origin_lat: f64,
    origin_lon: f64,
    converge: Option<Duration>,
    started: Option<Instant>,
    geospatial_enabled: bool,
    dropouts: Vec<Dropout>,
}

impl SimulatedTracking {
    pub fn new(config: &SimConfig) -> Self {
        let converge = (config.converge_secs.is_finite() && config.converge_secs >= 0.0)
            .then(|| Duration::from_secs_f64(config.converge_secs));
        Self {
            origin_lat: config.origin_lat,
            origin_lon: config.origin_lon,
            converge,
            started: None,
            geospatial_enabled: false,
            dropouts: Vec::new(),
        }
    }

    /// Accuracy never improves; localization eventually times out.
    pub fn never_converging(config: &SimConfig) -> Self {
        Self {
            converge: None,
            ..Self::new(config)
        }
    }

    /// Script a tracking dropout `start` after the first sample.
    pub fn with_dropout(mut self, start: Duration, length: Duration) -> Self {
        self.dropouts.push(Dropout { start, length });
        self
    }

    fn accuracy_at(&self, since_start: Duration) -> (f64, f64) {
        let progress = match self.converge {
            Some(converge) if converge.is_zero() => 1.0,
            Some(converge) => (since_start.as_secs_f64() / converge.as_secs_f64()).min(1.0),
            None => 0.0,
        };
        let yaw = START_YAW_ACCURACY_DEG - (START_YAW_ACCURACY_DEG - FINAL_YAW_ACCURACY_DEG) * progress;
        let horizontal = START_HORIZONTAL_ACCURACY_M
            - (START_HORIZONTAL_ACCURACY_M - FINAL_HORIZONTAL_ACCURACY_M) * progress;
        (yaw, horizontal)
    }

    fn in_dropout(&self, since_start: Duration) -> bool {
        self.dropouts
            .iter()
            .any(|d| since_start >= d.start && since_start < d.start + d.length)
    }
}

impl PoseQualitySampler for SimulatedTracking {
    fn sample(&mut self) -> TrackingSnapshot {
        let started = *self.started.get_or_insert_with(Instant::now);
        let since_start = started.elapsed();
        let (yaw_accuracy_deg, horizontal_accuracy_m) = self.accuracy_at(since_start);

        let earth_tracking = if self.in_dropout(since_start) {
            TrackingConfidence::Limited
        } else {
            TrackingConfidence::Tracking
        };

        TrackingSnapshot {
            session_state: SessionState::SessionTracking,
            location_status: LocationStatus::Running,
            geospatial_support: FeatureSupport::Supported,
            geospatial_enabled: self.geospatial_enabled,
            earth_state: EarthState::Enabled,
            earth_tracking,
            pose: Some(GeoPose {
                latitude: self.origin_lat,
                longitude: self.origin_lon,
                altitude_m: 4.0,
                heading_deg: 0.0,
                horizontal_accuracy_m,
                vertical_accuracy_m: horizontal_accuracy_m / 2.0,
                yaw_accuracy_deg,
            }),
            device_location: Some(DeviceLocation {
                latitude: self.origin_lat,
                longitude: self.origin_lon,
            }),
            missing_components: Vec::new(),
            camera_permission_denied: false,
        }
    }

    fn enable_geospatial(&mut self) {
        tracing::debug!("Simulated tracking: geospatial mode enabled");
        self.geospatial_enabled = true;
    }
}

/// Terrain anchors placed on a flat plane around an origin, after a random delay.
pub struct SimulatedTerrain {
    origin_lat: f64,
    origin_lon: f64,
    failure_rate: f64,
    max_resolve_ms: u64,
}

impl SimulatedTerrain {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            origin_lat: config.origin_lat,
            origin_lon: config.origin_lon,
            failure_rate: if config.failure_rate.is_finite() {
                config.failure_rate.clamp(0.0, 1.0)
            } else {
                0.0
            },
            max_resolve_ms: config.max_resolve_ms,
        }
    }
}

impl TerrainAnchorService for SimulatedTerrain {
    async fn resolve_anchor(&self, request: &ResolveRequest) -> ResolveOutcome {
        let (delay_ms, fails) = {
            let mut rng = rand::rng();
            (
                rng.random_range(0..=self.max_resolve_ms),
                rng.random_bool(self.failure_rate),
            )
        };
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        if fails {
            return ResolveOutcome::Failed(AnchorFailure::Internal(
                "simulated terrain resolve failure".to_string(),
            ));
        }

        ResolveOutcome::Resolved(geo_to_world(
            request.latitude,
            request.longitude,
            request.height_offset_m,
            self.origin_lat,
            self.origin_lon,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonav_core::ResolveTicket;

    fn config(converge_secs: f64) -> SimConfig {
        SimConfig {
            converge_secs,
            ..SimConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_converges_over_configured_time() {
        let mut tracking = SimulatedTracking::new(&config(10.0));
        let first = tracking.sample().observation();
        assert!(first.yaw_accuracy_deg > 25.0);

        tokio::time::advance(Duration::from_secs(10)).await;
        let converged = tracking.sample().observation();
        assert_eq!(converged.yaw_accuracy_deg, FINAL_YAW_ACCURACY_DEG);
        assert_eq!(converged.horizontal_accuracy_m, FINAL_HORIZONTAL_ACCURACY_M);
    }

    #[tokio::test(start_paused = true)]
    async fn dropout_limits_tracking() {
        let mut tracking = SimulatedTracking::new(&config(0.0))
            .with_dropout(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(tracking.sample().earth_tracking, TrackingConfidence::Tracking);

        tokio::time::advance(Duration::from_millis(2500)).await;
        assert_eq!(tracking.sample().earth_tracking, TrackingConfidence::Limited);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(tracking.sample().earth_tracking, TrackingConfidence::Tracking);
    }

    #[test]
    fn enable_geospatial_is_reported() {
        let mut tracking = SimulatedTracking::never_converging(&SimConfig::default());
        assert!(!tracking.sample().geospatial_enabled);
        tracking.enable_geospatial();
        assert!(tracking.sample().geospatial_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn terrain_places_anchor_relative_to_origin() {
        let terrain = SimulatedTerrain::new(&SimConfig {
            failure_rate: 0.0,
            max_resolve_ms: 100,
            ..SimConfig::default()
        });
        let origin = SimConfig::default();
        let request = ResolveRequest {
            ticket: ResolveTicket {
                generation: 1,
                order_index: 0,
            },
            waypoint_id: 2,
            latitude: origin.origin_lat + 0.0001,
            longitude: origin.origin_lon,
            height_offset_m: 0.5,
        };

        let ResolveOutcome::Resolved(pose) = terrain.resolve_anchor(&request).await else {
            panic!("expected resolved anchor");
        };
        assert!(pose.position[0].abs() < 1e-6);
        assert_eq!(pose.position[1], 0.5);
        assert!((pose.position[2] - 11.05).abs() < 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn terrain_always_fails_at_full_rate() {
        let terrain = SimulatedTerrain::new(&SimConfig {
            failure_rate: 1.0,
            max_resolve_ms: 0,
            ..SimConfig::default()
        });
        let request = ResolveRequest {
            ticket: ResolveTicket {
                generation: 1,
                order_index: 0,
            },
            waypoint_id: 2,
            latitude: 0.0,
            longitude: 0.0,
            height_offset_m: 0.0,
        };
        assert!(matches!(
            terrain.resolve_anchor(&request).await,
            ResolveOutcome::Failed(_)
        ));
    }
}
