//! pr_target
//!
//! Finds the base branch for a new PR, and walks up merged chains to find
//! a valid PR target for an existing one (section 4.11).

use std::collections::BTreeMap;

use crate::analyzer::DEFAULT_MAX_DEPTH;
use crate::forge::PullRequest;
use crate::model::{BranchRef, Commit, Repo, Sha};
use crate::ownership::build_trunk_sha_set;
use crate::trunk::{get_trunk_head_sha, select_trunk};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindBaseBranchError {
    /// More than one local branch head sits at the same ancestor commit.
    MultipleParentBranches(Vec<BranchRef>),
}

/// The trunk's display ref name: the local name if a local trunk exists,
/// otherwise the remote name with its remote-prefix segment stripped.
fn trunk_ref_name(repo: &Repo) -> Option<BranchRef> {
    let trunk = select_trunk(&repo.branches)?;
    if !trunk.is_remote {
        return Some(trunk.r#ref.clone());
    }
    let stripped = trunk
        .r#ref
        .as_str()
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(trunk.r#ref.as_str());
    Some(BranchRef::new(stripped))
}

/// Find the base branch a new PR for `head_commit_sha` should target.
pub fn find_base_branch(
    repo: &Repo,
    head_commit_sha: &Sha,
    merged_branches: &[BranchRef],
) -> Result<Option<BranchRef>, FindBaseBranchError> {
    let commit_map: BTreeMap<Sha, &Commit> = repo.commit_map();
    let trunk_head = get_trunk_head_sha(&repo.branches, &repo.commits);
    let trunk_shas = build_trunk_sha_set(&trunk_head, &commit_map);
    let Some(trunk_name) = trunk_ref_name(repo) else {
        return Ok(None);
    };

    let mut current = commit_map
        .get(head_commit_sha)
        .and_then(|c| c.parent_sha.clone());
    let mut depth = 0;
    let mut visited = std::collections::HashSet::new();

    while let Some(sha) = current {
        if depth >= DEFAULT_MAX_DEPTH || !visited.insert(sha.clone()) {
            break;
        }
        depth += 1;

        if trunk_shas.contains(&sha) {
            return Ok(Some(trunk_name));
        }

        let eligible: Vec<BranchRef> = repo
            .local_branches()
            .filter(|b| b.head_sha == sha)
            .filter(|b| !merged_branches.contains(&b.r#ref))
            .map(|b| b.r#ref.clone())
            .collect();

        match eligible.len() {
            0 => {}
            1 => return Ok(Some(eligible.into_iter().next().unwrap())),
            _ => return Err(FindBaseBranchError::MultipleParentBranches(eligible)),
        }

        current = commit_map.get(&sha).and_then(|c| c.parent_sha.clone());
    }

    Ok(Some(trunk_name))
}

pub fn is_valid_pr_target(branch: &BranchRef, trunk: &BranchRef, merged_branches: &[BranchRef]) -> bool {
    branch == trunk || !merged_branches.contains(branch)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindValidPrTargetError {
    DeadEnd { last_branch: BranchRef },
    Cycle { branch: BranchRef },
}

/// Walk up the PR stack (`head_ref_name -> base_ref_name`) from
/// `current_target` until reaching trunk or an unmerged base.
pub fn find_valid_pr_target(
    trunk: &BranchRef,
    current_target: &BranchRef,
    prs: &[PullRequest],
    merged_branches: &[BranchRef],
    trunk_fallback: Option<&BranchRef>,
) -> Result<BranchRef, FindValidPrTargetError> {
    if is_valid_pr_target(current_target, trunk, merged_branches) {
        return Ok(current_target.clone());
    }

    let mut visited = std::collections::HashSet::new();
    let mut current = current_target.clone();
    loop {
        if !visited.insert(current.clone()) {
            return Err(FindValidPrTargetError::Cycle { branch: current });
        }
        let next_pr = prs.iter().find(|pr| pr.head_ref_name == current);
        match next_pr {
            Some(pr) => {
                let next = pr.base_ref_name.clone();
                if is_valid_pr_target(&next, trunk, merged_branches) {
                    return Ok(next);
                }
                current = next;
            }
            None => {
                return trunk_fallback
                    .cloned()
                    .ok_or(FindValidPrTargetError::DeadEnd { last_branch: current });
            }
        }
    }
}
