//! Session guardian: fatal condition watch and graceful termination.
//!
//! The first fatal condition moves the session from `Active` to
//! `Returning`, which shows the reason for a fixed display delay before
//! the session is `Terminated`. Nothing leaves `Terminated`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FatalCondition;
use crate::rules::NavigationRules;
use crate::sampler::{LocationStatus, TrackingSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GuardianState {
    Active,
    Returning { reason: String },
    Terminated { reason: String },
}

impl GuardianState {
    pub fn reason(&self) -> Option<&str> {
        match self {
            GuardianState::Active => None,
            GuardianState::Returning { reason } | GuardianState::Terminated { reason } => {
                Some(reason)
            }
        }
    }
}

pub struct SessionGuardian {
    display_delay: Duration,
    state: GuardianState,
    condition: Option<FatalCondition>,
    returning_for: Duration,
}

impl SessionGuardian {
    pub fn new(rules: &NavigationRules) -> Self {
        Self {
            display_delay: rules.error_display_delay(),
            state: GuardianState::Active,
            condition: None,
            returning_for: Duration::ZERO,
        }
    }

    pub fn state(&self) -> &GuardianState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == GuardianState::Active
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, GuardianState::Terminated { .. })
    }

    /// The condition that ended the session, if any.
    pub fn condition(&self) -> Option<&FatalCondition> {
        self.condition.as_ref()
    }

    /// Report a fatal condition. Only the first report while `Active` counts.
    ///
    /// Returns true when this report started the return.
    pub fn report(&mut self, condition: FatalCondition) -> bool {
        if !self.is_active() {
            tracing::debug!("Ignoring fatal condition while returning: {:?}", condition);
            return false;
        }

        let reason = condition.to_string();
        tracing::error!("{}", reason);
        self.state = GuardianState::Returning { reason };
        self.condition = Some(condition);
        self.returning_for = Duration::ZERO;
        true
    }

    /// Check a tracking snapshot for lifecycle failures.
    pub fn inspect(&mut self, snapshot: &TrackingSnapshot) {
        if !self.is_active() {
            return;
        }

        let condition = if !snapshot.session_state.is_healthy() {
            Some(FatalCondition::SessionError(snapshot.session_state.to_string()))
        } else if snapshot.location_status == LocationStatus::Failed {
            Some(FatalCondition::LocationServiceFailed)
        } else if !snapshot.missing_components.is_empty() {
            Some(FatalCondition::MissingComponents(
                snapshot.missing_components.clone(),
            ))
        } else if snapshot.camera_permission_denied {
            Some(FatalCondition::PermissionDenied)
        } else {
            None
        };

        if let Some(condition) = condition {
            self.report(condition);
        }
    }

    /// Advance the display delay. Returns true on the tick that terminates.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let GuardianState::Returning { reason } = &self.state else {
            return false;
        };

        self.returning_for = self.returning_for.saturating_add(elapsed);
        if self.returning_for < self.display_delay {
            return false;
        }

        tracing::info!("Terminating session after showing reason");
        self.state = GuardianState::Terminated {
            reason: reason.clone(),
        };
        true
    }
}
