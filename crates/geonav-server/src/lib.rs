//! Shared library surface for the geonav session runtime and its tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod resolver;
pub mod route_source;
pub mod sim;
pub mod state;
