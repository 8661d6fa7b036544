//! Route backend HTTP client.

use geonav_core::models::{Place, Route, Waypoint};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://backend-protel-nasdem.vercel.app/api";

#[derive(Debug, Error)]
pub enum RouteFetchError {
    #[error("Invalid destination id {0}")]
    InvalidDestination(i64),
    #[error("Route request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Message reported by the backend, surfaced verbatim
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Malformed route payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct NodeList {
    nodes: Vec<Waypoint>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the places and route endpoints.
#[derive(Debug, Clone)]
pub struct RouteClient {
    client: Client,
    base_url: String,
}

impl RouteClient {
    /// Create a client for `base_url` (without a trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, RouteFetchError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the selectable destinations.
    pub async fn fetch_places(&self) -> Result<Vec<Place>, RouteFetchError> {
        let url = format!("{}/locations", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(backend_error(status, &body));
        }

        let places = parse_places(&body)?;
        tracing::debug!("Fetched {} places", places.len());
        Ok(places)
    }

    /// Fetch the route from the given position to `destination_id`.
    ///
    /// Negative ids mean nothing was selected and are rejected without a request.
    pub async fn fetch_route(
        &self,
        latitude: f64,
        longitude: f64,
        destination_id: i64,
    ) -> Result<Route, RouteFetchError> {
        if destination_id < 0 {
            return Err(RouteFetchError::InvalidDestination(destination_id));
        }

        let url = format!("{}/route", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("endId", destination_id.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = backend_error(status, &body);
            tracing::error!("Error calling route API: {}", err);
            return Err(err);
        }

        let route = parse_route(&body)?;
        tracing::info!(
            "Fetched route to {} with {} nodes",
            destination_id,
            route.len()
        );
        Ok(route)
    }
}

pub(crate) fn parse_places(body: &str) -> Result<Vec<Place>, RouteFetchError> {
    Ok(serde_json::from_str(body)?)
}

pub(crate) fn parse_route(body: &str) -> Result<Route, RouteFetchError> {
    let list: NodeList = serde_json::from_str(body)?;
    Ok(Route::new(list.nodes))
}

/// Error bodies look like `{"error": "..."}`; anything else falls back to the status line.
pub(crate) fn backend_error(status: StatusCode, body: &str) -> RouteFetchError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| status.to_string());
    RouteFetchError::Backend {
        status: status.as_u16(),
        message,
    }
}
