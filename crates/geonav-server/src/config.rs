//! Server configuration from environment.

use geonav_client::DEFAULT_BASE_URL;
use geonav_core::NavigationRules;
use std::env;
use std::time::Duration;

/// Start of the built-in mock route, used as the simulated device position.
pub const MOCK_ORIGIN: (f64, f64) = (-7.286963908273377, 112.79832451532494);

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub api_url: String,
    pub tick_hz: u32,
    /// Serve the built-in mock route instead of calling the backend
    pub offline: bool,
    pub rules: NavigationRules,
    pub sim: SimConfig,
}

/// Knobs for the simulated tracking and terrain backends.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Probability that a single anchor fails to resolve (0.0 - 1.0)
    pub failure_rate: f64,
    pub max_resolve_ms: u64,
    /// Time for the simulated accuracy to converge below the thresholds
    pub converge_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            origin_lat: MOCK_ORIGIN.0,
            origin_lon: MOCK_ORIGIN.1,
            failure_rate: 0.1,
            max_resolve_ms: 1500,
            converge_secs: 8.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = NavigationRules::default();
        let sim_defaults = SimConfig::default();

        Self {
            server_port: env::var("GEONAV_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            api_url: env::var("GEONAV_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            tick_hz: env::var("GEONAV_TICK_HZ")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|hz| *hz > 0)
                .unwrap_or(60),
            offline: env::var("GEONAV_OFFLINE")
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            rules: NavigationRules {
                yaw_accuracy_threshold_deg: env::var("GEONAV_YAW_ACCURACY_DEG")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.yaw_accuracy_threshold_deg),
                horizontal_accuracy_threshold_m: env::var("GEONAV_HORIZONTAL_ACCURACY_M")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.horizontal_accuracy_threshold_m),
                localization_timeout_secs: env::var("GEONAV_LOCALIZATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.localization_timeout_secs),
                ..defaults
            },
            sim: SimConfig {
                failure_rate: env::var("GEONAV_SIM_FAILURE_RATE")
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|rate| rate.is_finite())
                    .map(|rate| rate.clamp(0.0, 1.0))
                    .unwrap_or(sim_defaults.failure_rate),
                max_resolve_ms: env::var("GEONAV_SIM_MAX_RESOLVE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(sim_defaults.max_resolve_ms),
                converge_secs: env::var("GEONAV_SIM_CONVERGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(sim_defaults.converge_secs),
                ..sim_defaults
            },
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}
