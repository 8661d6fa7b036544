//! Navigation session loop.
//!
//! Owns the [`NavigationController`] and is its only mutator. Ticks it at a
//! fixed rate and feeds it resolve completions, UI commands and fetched
//! routes as they arrive. A fresh snapshot is published after every event.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::resolver::{ResolveCompletion, SpawningResolver, TerrainAnchorService};
use crate::route_source::RouteSource;
use geonav_client::RouteFetchError;
use geonav_core::{NavError, NavigationController, PoseQualitySampler, Route, SessionSnapshot};

/// Requests from the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectDestination { destination_id: i64 },
    EnterArView,
    ExitArView,
}

type FetchedRoute = (i64, Result<Route, RouteFetchError>);

/// Everything the loop drives.
pub struct SessionLoop<P, T, S> {
    pub controller: NavigationController,
    pub sampler: P,
    pub terrain: Arc<T>,
    pub routes: Arc<S>,
    pub tick_interval: Duration,
}

/// Run the session until shutdown or until the guardian terminates it.
///
/// Termination is broadcast on `shutdown` so the rest of the process can
/// wind down.
pub async fn run_session_loop<P, T, S>(
    session: SessionLoop<P, T, S>,
    mut commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    shutdown: broadcast::Sender<()>,
) where
    P: PoseQualitySampler + Send + 'static,
    T: TerrainAnchorService,
    S: RouteSource,
{
    let SessionLoop {
        mut controller,
        mut sampler,
        terrain,
        routes,
        tick_interval,
    } = session;

    let mut shutdown_rx = shutdown.subscribe();
    let (completion_tx, mut completions) = mpsc::unbounded_channel::<ResolveCompletion>();
    let mut resolver = SpawningResolver::new(terrain, completion_tx);
    let (fetched_tx, mut fetched) = mpsc::channel::<FetchedRoute>(4);

    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    tracing::info!(
        "Session loop started ({:.1} Hz)",
        1.0 / tick_interval.as_secs_f64().max(f64::EPSILON)
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("Session loop shutting down");
                break;
            }
            now = ticker.tick() => {
                let elapsed = now.saturating_duration_since(last_tick);
                last_tick = now;

                let report = controller.tick(elapsed, &mut sampler, &mut resolver);
                if report.terminated {
                    snapshots.send_replace(controller.snapshot());
                    tracing::info!("Session terminated, shutting down");
                    let _ = shutdown.send(());
                    break;
                }
            }
            Some((ticket, outcome)) = completions.recv() => {
                controller.on_resolve_complete(ticket, outcome);
            }
            Some(command) = commands.recv() => {
                handle_command(&mut controller, command, &routes, &fetched_tx);
            }
            Some((destination_id, result)) = fetched.recv() => {
                apply_fetched_route(&mut controller, destination_id, result);
            }
        }

        snapshots.send_replace(controller.snapshot());
    }
}

fn handle_command<S: RouteSource>(
    controller: &mut NavigationController,
    command: SessionCommand,
    routes: &Arc<S>,
    fetched: &mpsc::Sender<FetchedRoute>,
) {
    tracing::debug!("Session command: {:?}", command);

    match command {
        SessionCommand::EnterArView => controller.enter_ar_view(),
        SessionCommand::ExitArView => controller.exit_ar_view(),
        SessionCommand::SelectDestination { destination_id } => {
            if destination_id < 0 {
                let err = NavError::InvalidDestination(destination_id);
                tracing::warn!("{}", err);
                controller.show_message(err.to_string());
                return;
            }
            let Some(location) = controller.device_location() else {
                tracing::warn!("No device location yet, cannot request route");
                controller.show_message(NavError::LocationUnavailable.to_string());
                return;
            };

            tracing::info!(
                "Requesting route to {} from {:.6}, {:.6}",
                destination_id,
                location.latitude,
                location.longitude
            );
            let routes = Arc::clone(routes);
            let fetched = fetched.clone();
            tokio::spawn(async move {
                let result = routes
                    .fetch_route(location.latitude, location.longitude, destination_id)
                    .await;
                if fetched.send((destination_id, result)).await.is_err() {
                    tracing::debug!("Session loop gone, dropping route to {}", destination_id);
                }
            });
        }
    }
}

fn apply_fetched_route(
    controller: &mut NavigationController,
    destination_id: i64,
    result: Result<Route, RouteFetchError>,
) {
    match result {
        Ok(route) => {
            if let Err(err) = controller.set_route(route) {
                tracing::warn!("Route to {} discarded: {}", destination_id, err);
            }
        }
        Err(err) => {
            tracing::error!("Route fetch to {} failed: {}", destination_id, err);
            controller.show_message(err.to_string());
        }
    }
}
