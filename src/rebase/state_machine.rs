//! rebase::state_machine
//!
//! Pure operations the orchestrator calls in response to executor events
//! (section 4.8). No I/O; every function takes the current state (or job)
//! by value/reference and returns the next one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{BranchRef, Sha, WorkingTreeStatus};
use crate::rebase::intent::StackNodeState;
use crate::rebase::planner::{ConflictFile, JobId, JobStatus, RebaseJob, RebaseState, SessionStatus};

/// If there is no active job and jobs remain queued, promote the first one.
/// Returns `None` when there is nothing to do.
pub fn next_job(mut state: RebaseState, now_ms: i64) -> Option<RebaseState> {
    if state.queue.active_job_id.is_some() || state.queue.pending_job_ids.is_empty() {
        return None;
    }
    let id = state.queue.pending_job_ids.remove(0);
    if let Some(job) = state.jobs_by_id.get_mut(&id) {
        job.status = JobStatus::Applying;
        job.updated_at_ms = now_ms;
    }
    state.queue.active_job_id = Some(id);
    state.session.status = SessionStatus::Running;
    Some(state)
}

/// Record that `job` hit a conflict. `stage_info` supplies the raw git
/// conflict stages per path when the executor reports them.
pub fn record_conflict(
    job: &RebaseJob,
    working_tree: &WorkingTreeStatus,
    now_ms: i64,
    stage_info: Option<&HashMap<String, Vec<u8>>>,
) -> RebaseJob {
    let mut next = job.clone();
    next.status = JobStatus::AwaitingUser;
    next.updated_at_ms = now_ms;
    next.conflicts = Some(
        working_tree
            .conflicted
            .iter()
            .map(|path| ConflictFile {
                path: path.clone(),
                stages: stage_info.and_then(|m| m.get(path)).cloned().unwrap_or_default(),
                resolved: false,
            })
            .collect(),
    );
    next
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMutation {
    pub branch: BranchRef,
    pub new_base_sha: Sha,
    pub new_head_sha: Sha,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteJobResult {
    pub job: RebaseJob,
    pub stack_mutation: StackMutation,
    pub commit_rewrites: Vec<(Sha, Sha)>,
}

pub fn complete_job(
    job: &RebaseJob,
    rebased_head_sha: Sha,
    now_ms: i64,
    rewrites: Vec<(Sha, Sha)>,
) -> CompleteJobResult {
    let mut next = job.clone();
    next.status = JobStatus::Completed;
    next.updated_at_ms = now_ms;
    next.rebased_head_sha = Some(rebased_head_sha.clone());
    let stack_mutation = StackMutation {
        branch: next.branch.clone(),
        new_base_sha: next.target_base_sha.clone(),
        new_head_sha: rebased_head_sha,
    };
    CompleteJobResult {
        job: next,
        stack_mutation,
        commit_rewrites: rewrites,
    }
}

/// Queue one job per child of `parent`, targeting `parent_new_head_sha`.
/// Returns `false` (a no-op) when `parent` has no children.
pub fn enqueue_descendants(
    state: &mut RebaseState,
    parent: &StackNodeState,
    parent_new_head_sha: &Sha,
    now_ms: i64,
    mut generate_job_id: impl FnMut() -> JobId,
) -> bool {
    if parent.children.is_empty() {
        return false;
    }
    for child in &parent.children {
        let id = generate_job_id();
        let job = RebaseJob {
            id: id.clone(),
            branch: child.branch.clone(),
            original_base_sha: child.base_sha.clone(),
            original_head_sha: child.head_sha.clone(),
            target_base_sha: parent_new_head_sha.clone(),
            status: JobStatus::Queued,
            conflicts: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            rebased_head_sha: None,
        };
        state.session.jobs.push(id.clone());
        state.queue.pending_job_ids.push(id.clone());
        state.jobs_by_id.insert(id, job);
    }
    true
}

/// Reconcile a stored session against the observed working tree after a
/// process restart or reload (section 4.8).
pub fn resume_rebase_session(mut state: RebaseState, working_tree: &WorkingTreeStatus, now_ms: i64) -> RebaseState {
    let active_id = state.queue.active_job_id.clone();

    if working_tree.is_rebasing {
        let new_status = if working_tree.conflicted.is_empty() {
            JobStatus::Applying
        } else {
            JobStatus::AwaitingUser
        };
        if let Some(id) = &active_id {
            if let Some(job) = state.jobs_by_id.get_mut(id) {
                job.status = new_status;
                job.updated_at_ms = now_ms;
            }
        }
        state.session.status = if working_tree.conflicted.is_empty() {
            SessionStatus::Running
        } else {
            SessionStatus::AwaitingUser
        };
        return state;
    }

    if let Some(id) = active_id {
        if let Some(job) = state.jobs_by_id.get_mut(&id) {
            job.status = JobStatus::Completed;
            job.updated_at_ms = now_ms;
        }
        state.queue.active_job_id = None;
    }
    if state.queue.active_job_id.is_none() && state.queue.pending_job_ids.is_empty() {
        state.session.status = SessionStatus::Completed;
        state.session.completed_at_ms = Some(now_ms);
    }
    state
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebaseOperation {
    Idle,
    Rebasing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedWorkingTreeStatus {
    pub status: WorkingTreeStatus,
    pub operation: RebaseOperation,
    pub rebase_session_id: Option<String>,
    pub conflicted_branch: Option<BranchRef>,
}

pub fn decorate_working_tree_status(
    status: WorkingTreeStatus,
    state: Option<&RebaseState>,
) -> DecoratedWorkingTreeStatus {
    match state {
        Some(s) => {
            let conflicted_branch = if s.session.status == SessionStatus::AwaitingUser {
                s.queue
                    .active_job_id
                    .as_ref()
                    .and_then(|id| s.jobs_by_id.get(id))
                    .map(|j| j.branch.clone())
            } else {
                None
            };
            DecoratedWorkingTreeStatus {
                status,
                operation: RebaseOperation::Rebasing,
                rebase_session_id: Some(s.session.id.clone()),
                conflicted_branch,
            }
        }
        None => DecoratedWorkingTreeStatus {
            status,
            operation: RebaseOperation::Idle,
            rebase_session_id: None,
            conflicted_branch: None,
        },
    }
}
