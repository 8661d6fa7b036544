//! Places and route providers for the session loop.

use std::future::Future;

use geonav_client::{RouteClient, RouteFetchError};
use geonav_core::{Place, Route, Waypoint};

pub trait RouteSource: Send + Sync + 'static {
    fn fetch_places(&self) -> impl Future<Output = Result<Vec<Place>, RouteFetchError>> + Send;

    fn fetch_route(
        &self,
        latitude: f64,
        longitude: f64,
        destination_id: i64,
    ) -> impl Future<Output = Result<Route, RouteFetchError>> + Send;
}

impl RouteSource for RouteClient {
    async fn fetch_places(&self) -> Result<Vec<Place>, RouteFetchError> {
        RouteClient::fetch_places(self).await
    }

    async fn fetch_route(
        &self,
        latitude: f64,
        longitude: f64,
        destination_id: i64,
    ) -> Result<Route, RouteFetchError> {
        RouteClient::fetch_route(self, latitude, longitude, destination_id).await
    }
}

/// Built-in four-node route for offline runs.
///
/// The first node is the start; every later node is a selectable
/// destination, and the route to it runs along the nodes before it.
#[derive(Debug, Clone)]
pub struct MockRoutes {
    nodes: Vec<Waypoint>,
}

impl Default for MockRoutes {
    fn default() -> Self {
        Self {
            nodes: vec![
                Waypoint::new(1, "Lokasi Anda", -7.286963908273377, 112.79832451532494),
                Waypoint::new(2, "Lokasi 1", -7.286830880990744, 112.79836474849103),
                Waypoint::new(3, "Lokasi 2", -7.286784321391746, 112.79825880126684),
                Waypoint::new(4, "Lokasi 3", -7.286841523181405, 112.79782160115107),
            ],
        }
    }
}

impl MockRoutes {
    fn places(&self) -> Vec<Place> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, node)| Place {
                id: node.id,
                name: node.name.clone(),
                latitude: node.latitude,
                longitude: node.longitude,
                total_nodes: (index + 1) as u32,
            })
            .collect()
    }

    fn route_to(&self, destination_id: i64) -> Result<Route, RouteFetchError> {
        if destination_id < 0 {
            return Err(RouteFetchError::InvalidDestination(destination_id));
        }
        let end = self
            .nodes
            .iter()
            .position(|node| node.id == destination_id)
            .ok_or_else(|| RouteFetchError::Backend {
                status: 404,
                message: format!("Location {} not found", destination_id),
            })?;
        Ok(Route::new(self.nodes[..=end].to_vec()))
    }
}

impl RouteSource for MockRoutes {
    async fn fetch_places(&self) -> Result<Vec<Place>, RouteFetchError> {
        Ok(self.places())
    }

    async fn fetch_route(
        &self,
        _latitude: f64,
        _longitude: f64,
        destination_id: i64,
    ) -> Result<Route, RouteFetchError> {
        tracing::debug!("Serving mock route to {}", destination_id);
        self.route_to(destination_id)
    }
}
