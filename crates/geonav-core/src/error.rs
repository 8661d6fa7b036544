//! Error types for the navigation core.

use thiserror::Error;

/// Unrecoverable conditions that end the session.
///
/// The `Display` text is the reason shown to the user before termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalCondition {
    #[error("Localization not possible.\nClose and open the app to restart the session.")]
    LocalizationTimeout,

    #[error("Navigation encountered an AR session error state {0}.\nPlease restart the app.")]
    SessionError(String),

    #[error("Navigation failed to start location service.\nPlease restart the app and grant the fine location permission.")]
    LocationServiceFailed,

    #[error("Navigation failed due to missing AR components: {}.", .0.join(", "))]
    MissingComponents(Vec<String>),

    #[error("The Geospatial API is not supported by this device.")]
    GeospatialUnsupported,

    #[error("Camera permission was denied.\nPlease restart the app and grant the camera permission.")]
    PermissionDenied,
}

/// Errors returned to callers for requests the session cannot honour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("Invalid destination: {0}")]
    InvalidDestination(i64),

    #[error("Device location unavailable")]
    LocationUnavailable,

    #[error("Session is terminating: {0}")]
    SessionTerminating(String),
}
