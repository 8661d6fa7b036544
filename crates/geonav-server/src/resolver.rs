//! Asynchronous anchor resolve dispatch.
//!
//! The core issues resolve requests fire-and-forget; [`SpawningResolver`]
//! runs each one as its own tokio task and hands the outcome back to the
//! session loop together with the request's ticket.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

use geonav_core::{AnchorResolver, ResolveOutcome, ResolveRequest, ResolveTicket};

/// A completed resolve, as delivered to the session loop.
pub type ResolveCompletion = (ResolveTicket, ResolveOutcome);

/// Terrain anchor backend.
pub trait TerrainAnchorService: Send + Sync + 'static {
    fn resolve_anchor(&self, request: &ResolveRequest) -> impl Future<Output = ResolveOutcome> + Send;
}

pub struct SpawningResolver<T> {
    service: Arc<T>,
    completions: mpsc::UnboundedSender<ResolveCompletion>,
}

impl<T: TerrainAnchorService> SpawningResolver<T> {
    pub fn new(service: Arc<T>, completions: mpsc::UnboundedSender<ResolveCompletion>) -> Self {
        Self {
            service,
            completions,
        }
    }
}

impl<T: TerrainAnchorService> AnchorResolver for SpawningResolver<T> {
    fn resolve(&mut self, request: ResolveRequest) {
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let outcome = service.resolve_anchor(&request).await;
            if completions.send((request.ticket, outcome)).is_err() {
                tracing::debug!(
                    "Session loop gone, dropping completion for index {}",
                    request.ticket.order_index
                );
            }
        });
    }
}
