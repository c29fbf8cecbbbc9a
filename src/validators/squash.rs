//! validators::squash
//!
//! Blockers are checked in a fixed precedence order: no_parent, is_trunk,
//! parent_is_trunk, rebase_in_progress, dirty_tree, not_linear. The first
//! one that applies wins.

use crate::analyzer::bfs_shas;
use crate::error::SquashBlockerCode;
use crate::model::{BranchRef, Repo, Sha};
use crate::ownership::build_trunk_sha_set;
use crate::trunk::get_trunk_head_sha;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashError {
    pub code: SquashBlockerCode,
    pub message: String,
}

impl std::fmt::Display for SquashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for SquashError {}

fn blocked(code: SquashBlockerCode, message: impl Into<String>) -> SquashError {
    SquashError { code, message: message.into() }
}

/// Everything a caller needs to actually perform the squash once it's
/// been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashPlan {
    pub target_sha: Sha,
    pub parent_sha: Sha,
    pub target_branches: Vec<BranchRef>,
    pub parent_branches: Vec<BranchRef>,
    /// Branches reachable from `target_sha`'s children, which will need a
    /// forced pointer update once the squash rewrites history under them.
    pub descendant_branches: Vec<BranchRef>,
}

/// `targeting_current_branch` is true when `target_sha` is the head of the
/// branch currently checked out in the active worktree — only then does
/// the working tree's cleanliness matter.
pub fn validate_squash(repo: &Repo, target_sha: &Sha, targeting_current_branch: bool) -> Result<SquashPlan, SquashError> {
    let commit_map = repo.commit_map();
    let trunk_head = get_trunk_head_sha(&repo.branches, &repo.commits);
    let trunk_shas = build_trunk_sha_set(&trunk_head, &commit_map);

    let commit = commit_map
        .get(target_sha)
        .ok_or_else(|| blocked(SquashBlockerCode::NoParent, "target commit not found"))?;
    let parent_sha = commit
        .parent_sha
        .clone()
        .ok_or_else(|| blocked(SquashBlockerCode::NoParent, "commit has no parent to squash into"))?;

    if trunk_shas.contains(target_sha) {
        return Err(blocked(SquashBlockerCode::IsTrunk, "cannot squash a trunk commit"));
    }
    if trunk_shas.contains(&parent_sha) {
        return Err(blocked(SquashBlockerCode::ParentIsTrunk, "cannot squash onto trunk"));
    }
    if repo.working_tree_status.is_rebasing {
        return Err(blocked(SquashBlockerCode::RebaseInProgress, "a rebase is already in progress"));
    }
    if targeting_current_branch && !repo.working_tree_status.is_clean() {
        return Err(blocked(SquashBlockerCode::DirtyTree, "working tree has uncommitted changes"));
    }
    // Literal "not linear": the target has more than one child, full stop.
    // `ownership::is_fork_point` only counts non-trunk children, which is
    // the right notion for locating a stack's fork point but would let a
    // target with one trunk child and one non-trunk child through here.
    if commit.children_sha.len() > 1 {
        return Err(blocked(SquashBlockerCode::NotLinear, "target commit has more than one child"));
    }

    let target_branches = branches_at(repo, target_sha);
    let parent_branches = branches_at(repo, &parent_sha);
    let descendant_shas = bfs_shas(&commit.children_sha, &commit_map);
    let descendant_branches = repo
        .branches
        .iter()
        .filter(|b| descendant_shas.contains(&b.head_sha))
        .map(|b| b.r#ref.clone())
        .collect();

    Ok(SquashPlan {
        target_sha: target_sha.clone(),
        parent_sha,
        target_branches,
        parent_branches,
        descendant_branches,
    })
}

fn branches_at(repo: &Repo, sha: &Sha) -> Vec<BranchRef> {
    repo.branches.iter().filter(|b| &b.head_sha == sha).map(|b| b.r#ref.clone()).collect()
}
