//! full_state
//!
//! The single entry point an orchestrator calls once per snapshot
//! (section 4.15), and the gesture/executor-event adapters that sit in
//! front of the state machines (section 6, 6.1).
//!
//! The distilled contract names `phase: Option<&PhaseState>` as the third
//! argument to `build_full_ui_state`, but `FullUiState.rebase` holds a
//! `RebaseState` (session + jobs + queue), not a `PhaseState` — decorating
//! the working tree and populating that field both need the session, not
//! just its phase. This crate takes `rebase: Option<&RebaseState>` instead;
//! see `DESIGN.md`.

use crate::forge::GitForgeState;
use crate::model::{BranchRef, Repo, Sha};
use crate::projector::{self, UiStack};
use crate::rebase::intent::{build_intent, RebaseIntent};
#[cfg_attr(not(test), allow(unused_imports))]
use crate::rebase::phase::{apply as apply_phase_event, InvalidTransition, PhaseEvent, PhaseKind, PhaseState};
use crate::rebase::planner::{JobId, RebaseState};
use crate::rebase::projection::project_rebase_preview;
use crate::rebase::state_machine::{
    complete_job, decorate_working_tree_status, record_conflict, DecoratedWorkingTreeStatus,
};
use crate::validators::squash::{validate_squash, SquashError, SquashPlan};
use crate::validators::ship::validate_ship;
use crate::validators::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullUiState {
    pub stack: Option<UiStack>,
    pub projected_stack: Option<UiStack>,
    pub working_tree: DecoratedWorkingTreeStatus,
    pub rebase: Option<RebaseState>,
}

/// Compose the projector, the rebase preview, and the working-tree
/// decoration into one snapshot for the UI. Never fails: a missing trunk
/// shows up as `stack: None`, not an error (section 4.1).
pub fn build_full_ui_state(
    repo: &Repo,
    intent: Option<&RebaseIntent>,
    rebase: Option<&RebaseState>,
    forge: Option<&GitForgeState>,
) -> FullUiState {
    let stack = projector::project(repo, forge);
    let projected_stack = intent.and_then(|i| project_rebase_preview(repo, i, forge));
    let working_tree = decorate_working_tree_status(repo.working_tree_status.clone(), rebase);
    FullUiState {
        stack,
        projected_stack,
        working_tree,
        rebase: rebase.cloned(),
    }
}

/// The closed set of gestures a UI can emit (section 6). Every variant
/// must pass its validator before reaching a state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Drag { head_sha: Sha, target_base_sha: Sha },
    ConfirmRebase,
    CancelRebase,
    Squash { commit_sha: Sha, targeting_current_branch: bool },
    Ship { branch: BranchRef, base_branch: BranchRef, trunk: BranchRef, branch_can_ship: Option<bool> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    DragIntentBuilt(RebaseIntent),
    RebaseConfirmed(PhaseState),
    RebaseCancelled(PhaseState),
    SquashPlanned(SquashPlan),
    ShipValidated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Squash(#[from] SquashError),
    #[error(transparent)]
    Phase(#[from] InvalidTransition),
    #[error("drag gesture could not resolve an intent for the given shas")]
    NoDragTarget,
}

/// Validate and, for the state-affecting gestures, apply `gesture`.
/// `phase` is only consulted for `ConfirmRebase`/`CancelRebase`; drag,
/// squash, and ship are pure validations plus data (sections 4.6, 4.12).
pub fn apply_gesture(
    gesture: Gesture,
    repo: &Repo,
    phase: &PhaseState,
    forge: &GitForgeState,
    now_ms: i64,
    generate_id: impl FnOnce() -> String,
) -> Result<GestureOutcome, GestureError> {
    match gesture {
        Gesture::Drag { head_sha, target_base_sha } => {
            let intent = build_intent(repo, &head_sha, &target_base_sha, now_ms, generate_id)
                .ok_or(GestureError::NoDragTarget)?;
            Ok(GestureOutcome::DragIntentBuilt(intent))
        }
        Gesture::ConfirmRebase => {
            let next = apply_phase_event(phase, PhaseEvent::ConfirmIntent, now_ms, no_id)?;
            Ok(GestureOutcome::RebaseConfirmed(next))
        }
        Gesture::CancelRebase => {
            let next = apply_phase_event(phase, PhaseEvent::CancelIntent, now_ms, no_id)?;
            Ok(GestureOutcome::RebaseCancelled(next))
        }
        Gesture::Squash { commit_sha, targeting_current_branch } => {
            let plan = validate_squash(repo, &commit_sha, targeting_current_branch)?;
            Ok(GestureOutcome::SquashPlanned(plan))
        }
        Gesture::Ship { branch, base_branch, trunk, branch_can_ship } => {
            validate_ship(&branch, &base_branch, &trunk, forge, branch_can_ship)?;
            Ok(GestureOutcome::ShipValidated)
        }
    }
}

fn no_id() -> String {
    String::new()
}

/// The closed set of outcomes the Git executor reports back (section 6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitExecutorEvent {
    JobStarted { job_id: JobId },
    JobCompleted { job_id: JobId, rebased_head_sha: Sha, rewrites: Vec<(Sha, Sha)> },
    ConflictDetected { job_id: JobId, working_tree: crate::model::WorkingTreeStatus },
    AllJobsComplete,
    Aborted,
    Error { code: String, message: String, recoverable: bool },
}

/// Thin adapter from an executor event to the next phase (section 4.9) plus
/// the job bookkeeping that goes with it (section 4.8). `state` is mutated
/// in place for the two events that touch job state; the phase transition
/// is returned so the caller can apply it to its own stored `PhaseState`.
pub fn apply_executor_event(
    phase: &PhaseState,
    event: &GitExecutorEvent,
    state: Option<&mut RebaseState>,
    now_ms: i64,
) -> Result<PhaseState, InvalidTransition> {
    match event {
        GitExecutorEvent::JobStarted { .. } => apply_phase_event(phase, PhaseEvent::JobStarted, now_ms, no_id),
        GitExecutorEvent::JobCompleted { job_id, rebased_head_sha, rewrites } => {
            if let Some(state) = state {
                if let Some(job) = state.jobs_by_id.get(job_id).cloned() {
                    let result = complete_job(&job, rebased_head_sha.clone(), now_ms, rewrites.clone());
                    state.jobs_by_id.insert(job_id.clone(), result.job);
                    state.session.commit_map.extend(result.commit_rewrites);
                    state.queue.active_job_id = None;
                }
            }
            apply_phase_event(phase, PhaseEvent::JobCompleted, now_ms, no_id)
        }
        GitExecutorEvent::ConflictDetected { job_id, working_tree } => {
            if let Some(state) = state {
                if let Some(job) = state.jobs_by_id.get(job_id).cloned() {
                    let updated = record_conflict(&job, working_tree, now_ms, None);
                    state.jobs_by_id.insert(job_id.clone(), updated);
                }
            }
            apply_phase_event(phase, PhaseEvent::ConflictDetected, now_ms, no_id)
        }
        GitExecutorEvent::AllJobsComplete => apply_phase_event(phase, PhaseEvent::AllJobsComplete, now_ms, no_id),
        GitExecutorEvent::Aborted => apply_phase_event(phase, PhaseEvent::Abort, now_ms, no_id),
        GitExecutorEvent::Error { code, message, recoverable } => apply_phase_event(
            phase,
            PhaseEvent::Error { code: code.clone(), message: message.clone(), recoverable: *recoverable },
            now_ms,
            no_id,
        ),
    }
}
