//! rebase::phase
//!
//! The user-visible planning phase machine, separate from job execution
//! (section 4.9). Every transition not in the table fails closed with
//! [`InvalidTransition`] rather than silently doing nothing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Planning,
    Queued,
    Executing,
    Conflicted,
    Finalizing,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub kind: PhaseKind,
    pub entered_at_ms: i64,
    pub correlation_id: String,
    pub error: Option<ErrorInfo>,
}

impl PhaseState {
    pub fn idle(now_ms: i64, correlation_id: String) -> Self {
        Self {
            kind: PhaseKind::Idle,
            entered_at_ms: now_ms,
            correlation_id,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    SubmitIntent,
    CancelIntent,
    ConfirmIntent,
    JobStarted,
    Abort,
    JobCompleted,
    ConflictDetected,
    AllJobsComplete,
    ContinueAfterResolve,
    FinalizeComplete,
    ClearCompleted,
    Error {
        code: String,
        message: String,
        recoverable: bool,
    },
    AcknowledgeError,
}

impl PhaseEvent {
    fn type_name(&self) -> &'static str {
        match self {
            PhaseEvent::SubmitIntent => "SUBMIT_INTENT",
            PhaseEvent::CancelIntent => "CANCEL_INTENT",
            PhaseEvent::ConfirmIntent => "CONFIRM_INTENT",
            PhaseEvent::JobStarted => "JOB_STARTED",
            PhaseEvent::Abort => "ABORT",
            PhaseEvent::JobCompleted => "JOB_COMPLETED",
            PhaseEvent::ConflictDetected => "CONFLICT_DETECTED",
            PhaseEvent::AllJobsComplete => "ALL_JOBS_COMPLETE",
            PhaseEvent::ContinueAfterResolve => "CONTINUE_AFTER_RESOLVE",
            PhaseEvent::FinalizeComplete => "FINALIZE_COMPLETE",
            PhaseEvent::ClearCompleted => "CLEAR_COMPLETED",
            PhaseEvent::Error { .. } => "ERROR",
            PhaseEvent::AcknowledgeError => "ACKNOWLEDGE_ERROR",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid transition from {from_phase:?} on {event_type}: {reason}")]
pub struct InvalidTransition {
    pub from_phase: PhaseKind,
    pub event_type: String,
    pub reason: String,
}

/// Apply one event to `phase`. `generate_correlation_id` is only called on
/// `CLEAR_COMPLETED`, the sole transition that mints a fresh correlation id.
pub fn apply(
    phase: &PhaseState,
    event: PhaseEvent,
    now_ms: i64,
    generate_correlation_id: impl FnOnce() -> String,
) -> Result<PhaseState, InvalidTransition> {
    use PhaseKind::*;

    if let PhaseEvent::Error { code, message, recoverable } = &event {
        return match phase.kind {
            Queued | Executing | Conflicted | Finalizing => Ok(PhaseState {
                kind: Error,
                entered_at_ms: now_ms,
                correlation_id: phase.correlation_id.clone(),
                error: Some(ErrorInfo {
                    code: code.clone(),
                    message: message.clone(),
                    recoverable: *recoverable,
                }),
            }),
            _ => Err(InvalidTransition {
                from_phase: phase.kind,
                event_type: event.type_name().to_string(),
                reason: "ERROR is only valid from queued, executing, conflicted, or finalizing".into(),
            }),
        };
    }

    let next_kind = match (phase.kind, &event) {
        (Idle, PhaseEvent::SubmitIntent) => Planning,
        (Planning, PhaseEvent::CancelIntent) => Idle,
        (Planning, PhaseEvent::ConfirmIntent) => Queued,
        (Queued, PhaseEvent::JobStarted) => Executing,
        (Queued, PhaseEvent::Abort) => Idle,
        (Executing, PhaseEvent::JobCompleted) => Executing,
        (Executing, PhaseEvent::ConflictDetected) => Conflicted,
        (Executing, PhaseEvent::AllJobsComplete) => Finalizing,
        (Executing, PhaseEvent::Abort) => Idle,
        (Conflicted, PhaseEvent::ContinueAfterResolve) => Executing,
        (Conflicted, PhaseEvent::Abort) => Idle,
        (Finalizing, PhaseEvent::FinalizeComplete) => Completed,
        (Completed, PhaseEvent::ClearCompleted) => Idle,
        (Error, PhaseEvent::AcknowledgeError) => Idle,
        _ => {
            return Err(InvalidTransition {
                from_phase: phase.kind,
                event_type: event.type_name().to_string(),
                reason: "event not allowed from current phase".into(),
            })
        }
    };

    let correlation_id = if matches!(event, PhaseEvent::ClearCompleted) {
        generate_correlation_id()
    } else {
        phase.correlation_id.clone()
    };

    Ok(PhaseState {
        kind: next_kind,
        entered_at_ms: now_ms,
        correlation_id,
        error: None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Retry,
    Abort,
    Cleanup,
}

/// The actions offered from the error phase: retry-or-abort when
/// recoverable, cleanup-only otherwise.
pub fn recovery_actions(error: &ErrorInfo) -> Vec<RecoveryAction> {
    if error.recoverable {
        vec![RecoveryAction::Retry, RecoveryAction::Abort]
    } else {
        vec![RecoveryAction::Cleanup]
    }
}
