//! geonav server - always-on runtime for a geospatial navigation session

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geonav_client::RouteClient;
use geonav_core::NavigationController;
use geonav_server::api;
use geonav_server::config::Config;
use geonav_server::loops::session_loop::{run_session_loop, SessionLoop};
use geonav_server::route_source::{MockRoutes, RouteSource};
use geonav_server::sim::{SimulatedTerrain, SimulatedTracking};
use geonav_server::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Geospatial navigation session runtime")]
struct Args {
    /// HTTP port (overrides GEONAV_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Serve the built-in mock route instead of calling the backend
    #[arg(long)]
    offline: bool,

    /// Route backend base URL (overrides GEONAV_API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

impl Args {
    /// Command-line flags take precedence over the environment.
    fn apply_to(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        config.offline |= self.offline;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("geonav_server=debug".parse()?))
        .init();

    let mut config = Config::from_env();
    Args::parse().apply_to(&mut config);

    tracing::info!("Starting geonav server...");

    if config.offline {
        tracing::info!("Offline mode: serving built-in mock route");
        serve(config, Arc::new(MockRoutes::default())).await
    } else {
        tracing::info!("Route backend: {}", config.api_url);
        let client = RouteClient::new(config.api_url.clone())?;
        serve(config, Arc::new(client)).await
    }
}

async fn serve<S: RouteSource>(config: Config, routes: Arc<S>) -> Result<()> {
    let controller = NavigationController::new(config.rules.clone());
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let mut server_shutdown = shutdown_tx.subscribe();
    let state = Arc::new(AppState::new(command_tx, snapshot_rx));

    match routes.fetch_places().await {
        Ok(places) => {
            tracing::info!("Loaded {} places", places.len());
            state.set_places(places);
        }
        Err(err) => tracing::error!("Failed to fetch places: {}", err),
    }

    let session = SessionLoop {
        controller,
        sampler: SimulatedTracking::new(&config.sim),
        terrain: Arc::new(SimulatedTerrain::new(&config.sim)),
        routes,
        tick_interval: config.tick_interval(),
    };
    let session_task = tokio::spawn(run_session_loop(
        session,
        command_rx,
        snapshot_tx,
        shutdown_tx.clone(),
    ));

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            let _ = ctrl_c_shutdown.send(());
        }
    });

    let app = api::routes()
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.recv().await;
        })
        .await?;

    session_task.await?;
    tracing::info!("geonav server stopped");
    Ok(())
}
