//! validators::ship
//!
//! Pre-merge gate for "ship it" (section 4.12/4.14): the PR must exist,
//! be open, be mergeable, and not be stacked on a branch that's already
//! gone in from under it.

use crate::error::ValidatorCode;
use crate::forge::{find_open_pr, GitForgeState};
use crate::model::BranchRef;
use crate::validators::{err, ValidationError};

/// `branch_can_ship` is an optional frontend-computed override (e.g. "this
/// branch's base is itself unshipped") that fails the gesture even when
/// the PR itself looks mergeable.
pub fn validate_ship(
    branch: &BranchRef,
    base_branch: &BranchRef,
    trunk: &BranchRef,
    forge: &GitForgeState,
    branch_can_ship: Option<bool>,
) -> Result<(), ValidationError> {
    let pr = find_open_pr(branch, &forge.pull_requests)
        .ok_or_else(|| err(ValidatorCode::BranchNotFound, format!("no open pull request for {branch}")))?;

    if !pr.mergeable {
        return Err(err(ValidatorCode::ConflictsUnresolved, format!("pull request for {branch} has unresolved conflicts")));
    }

    let base_is_trunk = base_branch == trunk;
    if !base_is_trunk && forge.merged_branch_names.contains(base_branch) {
        return Err(err(ValidatorCode::TargetNotFound, format!("base branch {base_branch} has already been merged")));
    }

    if branch_can_ship == Some(false) {
        let message = if base_is_trunk {
            "cannot ship: stacked on another branch".to_string()
        } else {
            format!("cannot ship: stacked on {base_branch}")
        };
        return Err(err(ValidatorCode::TargetNotFound, message));
    }

    Ok(())
}
