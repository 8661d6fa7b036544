//! geonav client - places and route backend access
//!
//! Fetches the list of selectable destinations and the waypoint route
//! from the current position to a chosen destination.

pub mod client;

pub use client::{RouteClient, RouteFetchError, DEFAULT_BASE_URL};
