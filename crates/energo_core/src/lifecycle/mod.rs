//! Incident status state machine.
//!
//! `Registered -> InProgress -> Resolved`, with `Registered -> Resolved` allowed.
//! Progress only moves forward: there is no path back to `Registered` and a
//! resolved incident cannot be reopened, so each incident has at most one
//! resolution stamp.

use serde::{Deserialize, Serialize};

use crate::domain::IncidentStatus;
use crate::error::AppError;

/// What the store must do to honour a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    Apply {
        to: IncidentStatus,
        stamp_resolution: bool,
    },
    /// The incident is already in the requested state.
    NoEffect,
}

/// Result of a status transition as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Applied {
        id: i64,
        from: IncidentStatus,
        to: IncidentStatus,
        resolved_at: Option<String>,
    },
    NoEffect {
        id: i64,
        current: IncidentStatus,
    },
}

impl TransitionOutcome {
    pub fn is_no_effect(&self) -> bool {
        matches!(self, TransitionOutcome::NoEffect { .. })
    }
}

fn forbidden(current: IncidentStatus, target: IncidentStatus) -> AppError {
    AppError::validation(
        "LIFECYCLE_TRANSITION_FORBIDDEN",
        format!("Cannot move an incident from {current} to {target}"),
    )
    .with_field("status")
}

pub fn plan_transition(
    current: IncidentStatus,
    target: IncidentStatus,
) -> Result<TransitionPlan, AppError> {
    use IncidentStatus::*;

    match (current, target) {
        (Registered, Registered) | (InProgress, InProgress) | (Resolved, Resolved) => {
            Ok(TransitionPlan::NoEffect)
        }
        (_, Registered) | (Resolved, InProgress) => Err(forbidden(current, target)),
        (Registered, InProgress) => Ok(TransitionPlan::Apply {
            to: InProgress,
            stamp_resolution: false,
        }),
        (Registered | InProgress, Resolved) => Ok(TransitionPlan::Apply {
            to: Resolved,
            stamp_resolution: true,
        }),
    }
}
