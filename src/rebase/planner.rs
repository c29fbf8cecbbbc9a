//! rebase::planner
//!
//! Turns a `RebaseIntent` into an initial `RebaseState`: one queued job per
//! top-level target, nothing executing yet (section 4.7).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{BranchRef, Repo, Sha};
use crate::rebase::intent::RebaseIntent;
use crate::trunk::get_trunk_head_sha;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Queued,
    Applying,
    AwaitingUser,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFile {
    pub path: String,
    /// Git conflict stages present for this path (1 = base, 2 = ours, 3 = theirs).
    pub stages: Vec<u8>,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseJob {
    pub id: JobId,
    pub branch: BranchRef,
    pub original_base_sha: Sha,
    pub original_head_sha: Sha,
    pub target_base_sha: Sha,
    pub status: JobStatus,
    pub conflicts: Option<Vec<ConflictFile>>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub rebased_head_sha: Option<Sha>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Pending,
    Running,
    AwaitingUser,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseSession {
    pub id: String,
    pub started_at_ms: i64,
    pub status: SessionStatus,
    pub initial_trunk_sha: Sha,
    /// Job ids in traversal order (parents before children).
    pub jobs: Vec<JobId>,
    /// Completed (old sha, new sha) rewrite pairs accumulated so far.
    pub commit_map: Vec<(Sha, Sha)>,
    pub completed_at_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseQueue {
    pub active_job_id: Option<JobId>,
    pub pending_job_ids: Vec<JobId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseState {
    pub session: RebaseSession,
    pub jobs_by_id: HashMap<JobId, RebaseJob>,
    pub queue: RebaseQueue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebasePlan {
    pub intent: RebaseIntent,
    pub state: RebaseState,
}

/// Build a plan (intent plus initial state) from an already-built intent.
/// Uses the intent's own id as the session id.
pub fn create_rebase_plan(
    repo: &Repo,
    intent: RebaseIntent,
    generate_job_id: impl FnMut() -> JobId,
) -> Option<RebasePlan> {
    let session_id = intent.id.clone();
    let started_at_ms = intent.created_at_ms;
    let state = create_rebase_session(session_id, repo, &intent.targets, started_at_ms, generate_job_id)?;
    Some(RebasePlan { intent, state })
}

/// Build the initial `RebaseState`: one queued job per target, in the
/// order given. Fails if there are no targets or no trunk can be resolved.
pub fn create_rebase_session(
    session_id: String,
    repo: &Repo,
    targets: &[crate::rebase::intent::RebaseTarget],
    started_at_ms: i64,
    mut generate_job_id: impl FnMut() -> JobId,
) -> Option<RebaseState> {
    if targets.is_empty() {
        return None;
    }
    let trunk_head = get_trunk_head_sha(&repo.branches, &repo.commits);
    if trunk_head.as_str().is_empty() {
        return None;
    }

    let mut jobs_by_id = HashMap::new();
    let mut job_ids = Vec::new();
    for target in targets {
        let id = generate_job_id();
        let job = RebaseJob {
            id: id.clone(),
            branch: target.node.branch.clone(),
            original_base_sha: target.node.base_sha.clone(),
            original_head_sha: target.node.head_sha.clone(),
            target_base_sha: target.target_base_sha.clone(),
            status: JobStatus::Queued,
            conflicts: None,
            created_at_ms: started_at_ms,
            updated_at_ms: started_at_ms,
            rebased_head_sha: None,
        };
        job_ids.push(id.clone());
        jobs_by_id.insert(id, job);
    }

    Some(RebaseState {
        session: RebaseSession {
            id: session_id,
            started_at_ms,
            status: SessionStatus::Pending,
            initial_trunk_sha: trunk_head,
            jobs: job_ids.clone(),
            commit_map: Vec::new(),
            completed_at_ms: None,
        },
        jobs_by_id,
        queue: RebaseQueue {
            active_job_id: None,
            pending_job_ids: job_ids,
        },
    })
}
