//! Ordered anchor resolution.
//!
//! One asynchronous resolve request is issued per waypoint of a route.
//! Completions may arrive in any order and on any later tick; they are
//! keyed by the stable order index of the waypoint, never by arrival
//! order. Each route submission bumps a generation counter so that
//! completions belonging to a replaced route are recognised and dropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Route, WorldPose};
use crate::rules::NavigationRules;

/// Identifies one route submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchHandle {
    pub generation: u64,
    pub len: usize,
}

/// Carried by every resolve request and handed back with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveTicket {
    pub generation: u64,
    pub order_index: usize,
}

/// Request sent to the external anchor-resolve capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub ticket: ResolveTicket,
    pub waypoint_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Desired height above terrain in meters
    pub height_offset_m: f64,
}

/// Why a single anchor could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AnchorFailure {
    #[error("not authorized")]
    NotAuthorized,
    #[error("unsupported location")]
    UnsupportedLocation,
    #[error("resource exhausted")]
    ResourceExhausted,
    #[error("{0}")]
    Internal(String),
}

/// Result reported by the anchor-resolve capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolveOutcome {
    Resolved(WorldPose),
    Failed(AnchorFailure),
}

/// Resolution progress of one anchor. A world pose exists only once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ResolutionState {
    Pending,
    Resolved { pose: WorldPose },
    Failed { failure: AnchorFailure },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub order_index: usize,
    pub waypoint_id: i64,
    pub state: ResolutionState,
}

impl AnchorRecord {
    pub fn world_pose(&self) -> Option<&WorldPose> {
        match &self.state {
            ResolutionState::Resolved { pose } => Some(pose),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, ResolutionState::Pending)
    }
}

/// All anchor records of one route submission.
#[derive(Debug, Clone)]
pub struct NavigationBatch {
    handle: BatchHandle,
    /// Indexed by order index
    records: Vec<AnchorRecord>,
    terminal_count: usize,
    orientation_computed: bool,
}

impl NavigationBatch {
    pub fn handle(&self) -> BatchHandle {
        self.handle
    }

    pub fn records(&self) -> &[AnchorRecord] {
        &self.records
    }

    /// Every record is Resolved or Failed.
    pub fn is_settled(&self) -> bool {
        self.terminal_count == self.records.len()
    }

    pub fn orientation_computed(&self) -> bool {
        self.orientation_computed
    }

    pub fn progress(&self) -> BatchProgress {
        let mut progress = BatchProgress {
            generation: self.handle.generation,
            total: self.records.len(),
            ..BatchProgress::default()
        };
        for record in &self.records {
            match record.state {
                ResolutionState::Pending => progress.pending += 1,
                ResolutionState::Resolved { .. } => progress.resolved += 1,
                ResolutionState::Failed { .. } => progress.failed += 1,
            }
        }
        progress.orientation_computed = self.orientation_computed;
        progress
    }
}

/// Counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub generation: u64,
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub failed: usize,
    pub orientation_computed: bool,
}

/// What happened to a completion handed to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Stored; `settled` is true when this completion settled the batch
    Recorded { order_index: usize, settled: bool },
    /// Belongs to a batch that no longer exists
    Stale,
    /// That index already reached a terminal state
    Duplicate,
}

/// Fire-and-forget access to the external anchor-resolve capability.
///
/// Implementations start the resolution and later hand the outcome back
/// through [`AnchorResolutionOrchestrator::on_resolve_complete`] together
/// with the request's ticket.
pub trait AnchorResolver {
    fn resolve(&mut self, request: ResolveRequest);
}

pub struct AnchorResolutionOrchestrator {
    rules: NavigationRules,
    generation: u64,
    batch: Option<NavigationBatch>,
}

impl AnchorResolutionOrchestrator {
    pub fn new(rules: &NavigationRules) -> Self {
        Self {
            rules: rules.clone(),
            generation: 0,
            batch: None,
        }
    }

    /// Replace any live batch with a new one for `route` and start one
    /// resolve per waypoint. All requests are issued immediately.
    pub fn submit_route<R>(&mut self, route: &Route, resolver: &mut R) -> BatchHandle
    where
        R: AnchorResolver + ?Sized,
    {
        self.generation += 1;
        let handle = BatchHandle {
            generation: self.generation,
            len: route.len(),
        };

        if let Some(previous) = self.batch.take() {
            let pending = previous.progress().pending;
            if pending > 0 {
                tracing::debug!(
                    "Batch {} replaced with {} resolutions pending",
                    previous.handle.generation,
                    pending
                );
            }
        }

        let records = route
            .waypoints()
            .iter()
            .enumerate()
            .map(|(order_index, waypoint)| AnchorRecord {
                order_index,
                waypoint_id: waypoint.id,
                state: ResolutionState::Pending,
            })
            .collect();

        self.batch = Some(NavigationBatch {
            handle,
            records,
            terminal_count: 0,
            orientation_computed: false,
        });

        tracing::info!(
            "Submitting route as batch {} ({} waypoints)",
            handle.generation,
            handle.len
        );

        for (order_index, waypoint) in route.waypoints().iter().enumerate() {
            let height_offset_m = self.rules.height_offset(route.is_destination(order_index));
            resolver.resolve(ResolveRequest {
                ticket: ResolveTicket {
                    generation: handle.generation,
                    order_index,
                },
                waypoint_id: waypoint.id,
                latitude: waypoint.latitude,
                longitude: waypoint.longitude,
                height_offset_m,
            });
        }

        handle
    }

    /// Record the outcome of one resolve request.
    ///
    /// Completions for a replaced or cleared batch, and second completions
    /// for the same index, are dropped.
    pub fn on_resolve_complete(&mut self, ticket: ResolveTicket, outcome: ResolveOutcome) -> Completion {
        let Some(batch) = self.batch.as_mut() else {
            tracing::debug!("Dropping completion for cleared batch {}", ticket.generation);
            return Completion::Stale;
        };

        if ticket.generation != batch.handle.generation {
            tracing::debug!(
                "Dropping stale completion (batch {}, live batch {})",
                ticket.generation,
                batch.handle.generation
            );
            return Completion::Stale;
        }

        let Some(record) = batch.records.get_mut(ticket.order_index) else {
            tracing::debug!("Dropping completion for unknown index {}", ticket.order_index);
            return Completion::Stale;
        };

        if record.is_terminal() {
            tracing::debug!(
                "Dropping duplicate completion for index {} of batch {}",
                ticket.order_index,
                ticket.generation
            );
            return Completion::Duplicate;
        }

        record.state = match outcome {
            ResolveOutcome::Resolved(pose) => {
                tracing::debug!(
                    "Anchor {} (waypoint {}) resolved",
                    ticket.order_index,
                    record.waypoint_id
                );
                ResolutionState::Resolved { pose }
            }
            ResolveOutcome::Failed(failure) => {
                tracing::warn!(
                    "Anchor {} (waypoint {}) failed to resolve: {}",
                    ticket.order_index,
                    record.waypoint_id,
                    failure
                );
                ResolutionState::Failed { failure }
            }
        };
        batch.terminal_count += 1;

        Completion::Recorded {
            order_index: ticket.order_index,
            settled: batch.is_settled(),
        }
    }

    /// True once every record of the batch behind `handle` is terminal.
    /// A handle of a replaced batch is never settled.
    pub fn is_settled(&self, handle: BatchHandle) -> bool {
        self.batch
            .as_ref()
            .is_some_and(|batch| batch.handle == handle && batch.is_settled())
    }

    pub fn batch(&self) -> Option<&NavigationBatch> {
        self.batch.as_ref()
    }

    pub fn record(&self, order_index: usize) -> Option<&AnchorRecord> {
        self.batch.as_ref()?.records.get(order_index)
    }

    /// Hand out the live batch the first time it is seen settled.
    ///
    /// Marks its orientation as computed; later calls return `None` for
    /// the same batch.
    pub fn claim_settled(&mut self) -> Option<&NavigationBatch> {
        let batch = self.batch.as_mut()?;
        if !batch.is_settled() || batch.orientation_computed {
            return None;
        }
        batch.orientation_computed = true;
        Some(batch)
    }

    /// Drop the live batch. Outstanding completions become stale.
    pub fn clear(&mut self) {
        if let Some(batch) = self.batch.take() {
            tracing::debug!("Cleared batch {}", batch.handle.generation);
        }
    }
}
