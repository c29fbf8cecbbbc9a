//! forge
//!
//! Read-only join with forge (GitHub/GitLab-shaped) pull request state
//! (section 4.13). The core never writes through this contract; it only
//! reads a snapshot handed to it by the orchestrator's forge client.

use serde::{Deserialize, Serialize};

use crate::model::BranchRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Draft,
    Merged,
    Closed,
}

impl PrState {
    /// Priority for [`find_best_pr`]: higher wins.
    fn priority(self) -> u8 {
        match self {
            PrState::Open => 3,
            PrState::Draft => 2,
            PrState::Merged => 1,
            PrState::Closed => 0,
        }
    }

    fn is_active(self) -> bool {
        matches!(self, PrState::Open | PrState::Draft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head_ref_name: BranchRef,
    pub base_ref_name: BranchRef,
    pub state: PrState,
    pub mergeable: bool,
    /// RFC3339-ish timestamp. Treated as opaque and possibly malformed —
    /// `find_best_pr` must tolerate bad or missing dates (section 4.13,
    /// testable property 7).
    pub created_at: Option<String>,
}

/// Everything the forge client hands back, read immutably by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitForgeState {
    pub pull_requests: Vec<PullRequest>,
    pub merged_branch_names: Vec<BranchRef>,
}

pub fn find_open_pr<'a>(branch: &BranchRef, prs: &'a [PullRequest]) -> Option<&'a PullRequest> {
    prs.iter()
        .find(|pr| &pr.head_ref_name == branch && pr.state == PrState::Open)
}

pub fn find_active_pr<'a>(branch: &BranchRef, prs: &'a [PullRequest]) -> Option<&'a PullRequest> {
    prs.iter()
        .find(|pr| &pr.head_ref_name == branch && pr.state.is_active())
}

pub fn has_child_prs(branch: &BranchRef, prs: &[PullRequest]) -> bool {
    prs.iter()
        .any(|pr| &pr.base_ref_name == branch && pr.state.is_active())
}

pub fn has_merged_pr(branch: &BranchRef, prs: &[PullRequest]) -> bool {
    prs.iter()
        .any(|pr| &pr.head_ref_name == branch && pr.state == PrState::Merged)
}

pub fn count_open_prs(branch: &BranchRef, prs: &[PullRequest]) -> usize {
    prs.iter()
        .filter(|pr| &pr.head_ref_name == branch && pr.state == PrState::Open)
        .count()
}

/// True when every PR for `branch` is inactive and at least one exists.
pub fn can_recreate_pr(branch: &BranchRef, prs: &[PullRequest]) -> bool {
    let mut any = false;
    for pr in prs.iter().filter(|pr| &pr.head_ref_name == branch) {
        any = true;
        if pr.state.is_active() {
            return false;
        }
    }
    any
}

/// Pick the best PR for a branch: highest state priority, ties broken by
/// newest `created_at`. Malformed or missing dates are tolerated and
/// treated as the oldest possible value — this function never panics.
pub fn find_best_pr<'a>(branch: &BranchRef, prs: &'a [PullRequest]) -> Option<&'a PullRequest> {
    prs.iter()
        .filter(|pr| &pr.head_ref_name == branch)
        .max_by(|a, b| {
            a.state
                .priority()
                .cmp(&b.state.priority())
                .then_with(|| sortable_date(&a.created_at).cmp(&sortable_date(&b.created_at)))
        })
}

/// A date tolerant to malformed/missing input: absent or unparseable
/// dates sort as the oldest.
fn sortable_date(created_at: &Option<String>) -> &str {
    match created_at {
        Some(s) if !s.is_empty() => s.as_str(),
        _ => "",
    }
}

/// A branch's PR is stale when its base has already been merged.
pub fn has_stale_target(pr: &PullRequest, merged_branch_names: &[BranchRef]) -> bool {
    merged_branch_names.contains(&pr.base_ref_name)
}

/// Merged detection (section 4.13): a merged PR always counts; a closed
/// PR counts only if the branch name itself is recorded as merged;
/// absent a PR at all, fall back to the merged-branch-name list.
pub fn is_branch_merged(branch: &BranchRef, forge: &GitForgeState) -> bool {
    match find_best_pr(branch, &forge.pull_requests) {
        Some(pr) if pr.state == PrState::Merged => true,
        Some(pr) if pr.state == PrState::Closed => {
            forge.merged_branch_names.contains(branch)
        }
        Some(_) => false,
        None => forge.merged_branch_names.contains(branch),
    }
}
