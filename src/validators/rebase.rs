//! validators::rebase
//!
//! Gates the three rebase gestures: submitting a new intent, continuing
//! past a resolved conflict, and aborting (section 4.12).

use crate::error::ValidatorCode;
use crate::model::Repo;
use crate::rebase::intent::RebaseIntent;
use crate::rebase::planner::{RebaseState, SessionStatus};
use crate::validators::{err, ValidationError};

/// Checked before building a plan from `intent` and handing it to the
/// orchestrator. `existing_session` is `Some` when a rebase is already
/// tracked for this repo, regardless of whether `repo` itself looks dirty.
pub fn validate_submit(intent: &RebaseIntent, repo: &Repo, existing_session: Option<&RebaseState>) -> Result<(), ValidationError> {
    if intent.targets.is_empty() {
        return Err(err(ValidatorCode::InvalidIntent, "intent has no targets"));
    }
    if let Some(session) = existing_session {
        if session.session.status != SessionStatus::Completed && session.session.status != SessionStatus::Aborted {
            return Err(err(ValidatorCode::SessionExists, "a rebase session is already in progress"));
        }
    }
    if repo.working_tree_status.is_rebasing {
        return Err(err(ValidatorCode::RebaseInProgress, "a git rebase is already in progress"));
    }
    if repo.working_tree_status.detached {
        return Err(err(ValidatorCode::DetachedHead, "cannot rebase with a detached HEAD"));
    }
    if !repo.working_tree_status.is_clean() {
        return Err(err(ValidatorCode::DirtyWorkingTree, "working tree has uncommitted changes"));
    }

    let commit_map = repo.commit_map();
    for target in &intent.targets {
        match repo.find_branch(&target.node.branch) {
            None => return Err(err(ValidatorCode::BranchNotFound, format!("branch {} not found", target.node.branch))),
            Some(branch) if branch.head_sha != target.node.head_sha => {
                return Err(err(
                    ValidatorCode::BranchMoved,
                    format!("branch {} has moved since the intent was built", target.node.branch),
                ))
            }
            _ => {}
        }
        if target.target_base_sha == target.node.base_sha {
            return Err(err(ValidatorCode::SameBase, "branch is already based there"));
        }
        if !commit_map.contains_key(&target.target_base_sha) {
            return Err(err(ValidatorCode::TargetNotFound, "target base commit not found"));
        }
    }
    Ok(())
}

/// Checked before resuming execution after the user resolves a conflict.
pub fn validate_continue(repo: &Repo, session: &RebaseState) -> Result<(), ValidationError> {
    if session.session.status != SessionStatus::AwaitingUser {
        return Err(err(ValidatorCode::RebaseInProgress, "no conflicted rebase to continue"));
    }
    if !repo.working_tree_status.conflicted.is_empty() {
        return Err(err(ValidatorCode::ConflictsUnresolved, "unresolved conflicts remain"));
    }
    Ok(())
}

/// Checked before tearing down a rebase in progress.
pub fn validate_abort(session: &RebaseState) -> Result<(), ValidationError> {
    if matches!(session.session.status, SessionStatus::Completed | SessionStatus::Aborted) {
        return Err(err(ValidatorCode::RebaseInProgress, "no rebase in progress to abort"));
    }
    Ok(())
}
