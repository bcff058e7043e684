//! Arm lifecycle state machine.
//!
//! ```text
//!   create ──> active <──resume/activate_for_testing── paused <── create(staged)
//!                │ ──────────────── pause ───────────────> │
//!                └──── eliminate ──> eliminated <── eliminate ┘
//! ```
//!
//! `activate_as_winner` promotes one version to `active` + production and
//! pauses every other active sibling in the same step. `plan_transition`
//! is pure: it turns an action and a consistent snapshot of the agent's
//! arms into the exact set of status changes, which a repository then
//! applies atomically.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::posterior::BetaPosterior;
use super::prompt_version::{ArmStatus, PromptVersion};
use crate::domain::errors::{DomainError, DomainResult};

/// Lightweight snapshot of a version's bandit state (no prompt text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmState {
    pub version_id: Uuid,
    pub version_number: u32,
    pub is_baseline: bool,
    pub is_production: bool,
    pub successes: u64,
    pub trials: u64,
    pub arm_status: ArmStatus,
}

impl ArmState {
    pub fn posterior(&self) -> BetaPosterior {
        BetaPosterior::from_counts(self.successes, self.trials)
    }

    pub fn booking_rate(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.successes as f64 / self.trials as f64)
    }
}

impl From<&PromptVersion> for ArmState {
    fn from(version: &PromptVersion) -> Self {
        Self {
            version_id: version.version_id,
            version_number: version.version_number,
            is_baseline: version.is_baseline,
            is_production: version.is_production,
            successes: version.successes,
            trials: version.trials,
            arm_status: version.arm_status,
        }
    }
}

/// Operator-triggered lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Pause,
    Resume,
    Eliminate,
    ActivateAsWinner,
    ActivateForTesting,
}

impl LifecycleAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Eliminate => "eliminate",
            Self::ActivateAsWinner => "activate_as_winner",
            Self::ActivateForTesting => "activate_for_testing",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status (and optionally production flag) update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub version_id: Uuid,
    pub from: ArmStatus,
    pub to: ArmStatus,
    /// `Some` when the production flag changes.
    pub is_production: Option<bool>,
}

impl StatusChange {
    const fn status(version_id: Uuid, from: ArmStatus, to: ArmStatus) -> Self {
        Self {
            version_id,
            from,
            to,
            is_production: None,
        }
    }

    #[must_use]
    const fn production(mut self, is_production: bool) -> Self {
        self.is_production = Some(is_production);
        self
    }

    /// Whether the arm status moves; `false` for production-flag-only changes.
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

/// Compute the changes `action` on `target` makes to an agent's arms.
///
/// `arms` must be a consistent snapshot of every version of the target's
/// agent. An empty result means the action is already satisfied.
pub fn plan_transition(
    action: LifecycleAction,
    target: Uuid,
    arms: &[ArmState],
) -> DomainResult<Vec<StatusChange>> {
    let arm = arms
        .iter()
        .find(|a| a.version_id == target)
        .ok_or(DomainError::UnknownVersion(target))?;

    let invalid = || DomainError::InvalidTransition {
        version_id: target,
        from: arm.arm_status,
        action: action.as_str(),
    };

    match (action, arm.arm_status) {
        (_, ArmStatus::Eliminated) => Err(invalid()),

        (LifecycleAction::Pause, ArmStatus::Active) => Ok(vec![StatusChange::status(
            target,
            ArmStatus::Active,
            ArmStatus::Paused,
        )]),
        (LifecycleAction::Pause, ArmStatus::Paused) => Err(invalid()),

        (LifecycleAction::Resume, ArmStatus::Paused)
        | (LifecycleAction::ActivateForTesting, ArmStatus::Paused) => Ok(vec![
            StatusChange::status(target, ArmStatus::Paused, ArmStatus::Active),
        ]),
        (LifecycleAction::Resume, ArmStatus::Active) => Err(invalid()),
        (LifecycleAction::ActivateForTesting, ArmStatus::Active) => Ok(Vec::new()),

        (LifecycleAction::Eliminate, from) => {
            let change = StatusChange::status(target, from, ArmStatus::Eliminated);
            Ok(vec![if arm.is_production {
                change.production(false)
            } else {
                change
            }])
        }

        (LifecycleAction::ActivateAsWinner, from) => {
            let mut changes = vec![StatusChange::status(target, from, ArmStatus::Active)
                .production(true)];
            changes.extend(
                arms.iter()
                    .filter(|a| a.version_id != target && !a.arm_status.is_terminal())
                    .filter(|a| a.arm_status == ArmStatus::Active || a.is_production)
                    .map(|a| {
                        StatusChange::status(a.version_id, a.arm_status, ArmStatus::Paused)
                            .production(false)
                    }),
            );
            Ok(changes)
        }
    }
}
