//! Command and snapshot handles for the running session.

use std::sync::RwLock;
use tokio::sync::{mpsc, watch};

use crate::loops::session_loop::SessionCommand;
use geonav_core::{NavError, Place, SessionSnapshot};

/// Application state - the session loop owns the controller; handlers
/// only read published snapshots and queue commands.
pub struct AppState {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    places: RwLock<Vec<Place>>,
}

impl AppState {
    pub fn new(
        commands: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
            places: RwLock::new(Vec::new()),
        }
    }

    /// Latest snapshot published by the session loop.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Reason the session is ending, if it is.
    pub fn terminating_reason(&self) -> Option<String> {
        self.snapshots.borrow().guardian.reason().map(str::to_string)
    }

    pub fn set_places(&self, places: Vec<Place>) {
        if let Ok(mut guard) = self.places.write() {
            *guard = places;
        }
    }

    pub fn places(&self) -> Vec<Place> {
        self.places
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Whether `destination_id` can be routed to. Any non-negative id is
    /// accepted while the places list is unknown.
    pub fn is_known_destination(&self, destination_id: i64) -> bool {
        if destination_id < 0 {
            return false;
        }
        let places = self.places();
        places.is_empty() || places.iter().any(|place| place.id == destination_id)
    }

    /// Queue a command for the session loop. Refused once the session
    /// has started returning.
    pub async fn send_command(&self, command: SessionCommand) -> Result<(), NavError> {
        if let Some(reason) = self.terminating_reason() {
            return Err(NavError::SessionTerminating(reason));
        }
        self.commands.send(command).await.map_err(|_| {
            NavError::SessionTerminating("Session loop has stopped".to_string())
        })
    }
}
