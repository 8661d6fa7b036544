//! Shared state between the session loop and the HTTP surface.

pub mod store;

pub use store::AppState;
