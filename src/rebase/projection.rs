//! rebase::projection
//!
//! Synthesizes a "what would this look like after the rebase" DAG preview
//! for a pending intent, then runs it back through the projector so the UI
//! can show the result before anything actually executes (section 4.10).

use std::collections::HashMap;

use crate::forge::GitForgeState;
use crate::model::{Commit, Repo, Sha};
use crate::projector::{self, RebaseStatus, UiStack};
use crate::rebase::intent::{RebaseIntent, StackNodeState};

/// Build a preview `UiStack` as if `intent` had already been applied.
/// Returns `None` if the synthetic DAG no longer resolves a trunk.
pub fn project_rebase_preview(repo: &Repo, intent: &RebaseIntent, forge: Option<&GitForgeState>) -> Option<UiStack> {
    let mut commit_map: HashMap<Sha, Commit> = repo
        .commits
        .iter()
        .cloned()
        .map(|c| (c.sha.clone(), c))
        .collect();

    let mut time_counter = intent.created_at_ms;
    for target in &intent.targets {
        apply_node(&mut commit_map, &target.node, &target.target_base_sha, &mut time_counter);
    }

    let synthetic_repo = Repo {
        commits: commit_map.into_values().collect(),
        ..repo.clone()
    };

    let mut stack = projector::project(&synthetic_repo, forge)?;
    overlay_rebase_status(&mut stack, intent);
    Some(stack)
}

/// Re-parent the oldest commit owned by `node` onto `new_base_sha`, restamp
/// the owned chain with strictly increasing timestamps, then recurse into
/// `node`'s children onto `node`'s own (unchanged) head sha.
fn apply_node(commit_map: &mut HashMap<Sha, Commit>, node: &StackNodeState, new_base_sha: &Sha, time_counter: &mut i64) {
    if let Some(oldest) = node.owned_shas.last() {
        if let Some(old_parent_sha) = commit_map.get(oldest).and_then(|c| c.parent_sha.clone()) {
            if let Some(old_parent) = commit_map.get_mut(&old_parent_sha) {
                old_parent.children_sha.retain(|c| c != oldest);
            }
        }
        if let Some(commit) = commit_map.get_mut(oldest) {
            commit.parent_sha = Some(new_base_sha.clone());
        }
        if let Some(new_parent) = commit_map.get_mut(new_base_sha) {
            if !new_parent.children_sha.contains(oldest) {
                new_parent.children_sha.push(oldest.clone());
            }
        }
    }

    let base_time = commit_map.get(new_base_sha).map(|c| c.time_ms).unwrap_or(*time_counter);
    if *time_counter <= base_time {
        *time_counter = base_time + 1;
    }
    for sha in node.owned_shas.iter().rev() {
        if let Some(commit) = commit_map.get_mut(sha) {
            commit.time_ms = *time_counter;
        }
        *time_counter += 1;
    }

    for child in &node.children {
        apply_node(commit_map, child, &node.head_sha, time_counter);
    }
}

fn overlay_rebase_status(stack: &mut UiStack, intent: &RebaseIntent) {
    for target in &intent.targets {
        set_status_for_shas(stack, &target.node.owned_shas, RebaseStatus::Prompting);
        for child in &target.node.children {
            mark_descendants_idle(stack, child);
        }
    }
}

fn mark_descendants_idle(stack: &mut UiStack, node: &StackNodeState) {
    set_status_for_shas(stack, &node.owned_shas, RebaseStatus::Idle);
    for child in &node.children {
        mark_descendants_idle(stack, child);
    }
}

fn set_status_for_shas(stack: &mut UiStack, shas: &[Sha], status: RebaseStatus) {
    for commit in stack.commits.iter_mut() {
        if shas.contains(&commit.sha) {
            commit.rebase_status = status;
        }
        for spinoff in commit.spinoffs.iter_mut() {
            set_status_for_shas(spinoff, shas, status);
        }
    }
}
