//! Localization quality state machine.
//!
//! Consumes one [`Observation`] per tick and maintains the
//! Localizing / Localized / Lost phase. Time spent outside `Localized`
//! accumulates across ticks; exceeding the configured timeout is fatal.

use std::time::Duration;

use crate::error::FatalCondition;
use crate::models::LocalizationPhase;
use crate::rules::NavigationRules;
use crate::sampler::{Observation, TrackingConfidence};

/// A change of phase produced by a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: LocalizationPhase,
    pub to: LocalizationPhase,
}

impl PhaseTransition {
    pub fn entered_localized(&self) -> bool {
        self.to == LocalizationPhase::Localized
    }

    pub fn lost(&self) -> bool {
        self.from == LocalizationPhase::Localized && self.to == LocalizationPhase::Lost
    }
}

#[derive(Debug, Clone)]
pub struct LocalizationStateMachine {
    yaw_threshold_deg: f64,
    horizontal_threshold_m: f64,
    timeout: Duration,
    phase: LocalizationPhase,
    /// Time spent outside `Localized`; reset only on entering `Localized`
    unlocalized_for: Duration,
    timed_out: bool,
}

impl LocalizationStateMachine {
    pub fn new(rules: &NavigationRules) -> Self {
        Self {
            yaw_threshold_deg: rules.yaw_accuracy_threshold_deg,
            horizontal_threshold_m: rules.horizontal_accuracy_threshold_m,
            timeout: rules.localization_timeout(),
            phase: LocalizationPhase::Localizing,
            unlocalized_for: Duration::ZERO,
            timed_out: false,
        }
    }

    pub fn phase(&self) -> LocalizationPhase {
        self.phase
    }

    pub fn is_localized(&self) -> bool {
        self.phase == LocalizationPhase::Localized
    }

    /// Accumulated time outside `Localized`.
    pub fn unlocalized_for(&self) -> Duration {
        self.unlocalized_for
    }

    /// Back to `Localizing` with a fresh timer, used whenever the AR view is (re)entered.
    pub fn reset(&mut self) {
        self.phase = LocalizationPhase::Localizing;
        self.unlocalized_for = Duration::ZERO;
        self.timed_out = false;
    }

    /// Whether an observation meets every quality threshold (inclusive).
    pub fn meets_thresholds(&self, observation: &Observation) -> bool {
        observation.confidence == TrackingConfidence::Tracking
            && observation.yaw_accuracy_deg <= self.yaw_threshold_deg
            && observation.horizontal_accuracy_m <= self.horizontal_threshold_m
    }

    /// Feed one tick's observation.
    ///
    /// Returns the phase change caused by this observation, if any, or the
    /// fatal timeout once accumulated non-localized time strictly exceeds
    /// the limit. After a timeout every further call reports it again.
    pub fn observe(
        &mut self,
        observation: &Observation,
        elapsed: Duration,
    ) -> Result<Option<PhaseTransition>, FatalCondition> {
        if self.timed_out {
            return Err(FatalCondition::LocalizationTimeout);
        }

        let from = self.phase;

        if self.meets_thresholds(observation) {
            if from == LocalizationPhase::Localized {
                return Ok(None);
            }
            self.phase = LocalizationPhase::Localized;
            self.unlocalized_for = Duration::ZERO;
            tracing::info!(
                "Localization completed: {} -> {} (yaw acc {:.1}, horizontal acc {:.1})",
                from,
                self.phase,
                observation.yaw_accuracy_deg,
                observation.horizontal_accuracy_m
            );
            return Ok(Some(PhaseTransition { from, to: self.phase }));
        }

        let transition = if from == LocalizationPhase::Localized {
            self.phase = LocalizationPhase::Lost;
            tracing::info!(
                "Localization lost (confidence {:?}, yaw acc {:.1}, horizontal acc {:.1})",
                observation.confidence,
                observation.yaw_accuracy_deg,
                observation.horizontal_accuracy_m
            );
            Some(PhaseTransition { from, to: self.phase })
        } else {
            None
        };

        self.unlocalized_for = self.unlocalized_for.saturating_add(elapsed);

        if self.unlocalized_for > self.timeout {
            self.timed_out = true;
            tracing::error!(
                "Localization timed out after {:.1}s",
                self.unlocalized_for.as_secs_f64()
            );
            return Err(FatalCondition::LocalizationTimeout);
        }

        Ok(transition)
    }
}
