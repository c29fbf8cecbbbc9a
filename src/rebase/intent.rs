//! rebase::intent
//!
//! Turns a `(headSha, targetBaseSha)` drag gesture into a `RebaseIntent`
//! carrying the recursive tree of branches the rebase would touch
//! (section 4.6).

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Branch, BranchRef, Commit, Repo, Sha};
use crate::ownership::{build_trunk_sha_set, compute_ownership};
use crate::trunk::get_trunk_head_sha;

/// One branch's position in the rebase tree: what it owns, what it sits
/// on, and which other branches hang off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackNodeState {
    pub branch: BranchRef,
    pub head_sha: Sha,
    pub base_sha: Sha,
    /// Head-first, excluding `base_sha`.
    pub owned_shas: Vec<Sha>,
    pub children: Vec<StackNodeState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseTarget {
    pub node: StackNodeState,
    pub target_base_sha: Sha,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseIntent {
    pub id: String,
    pub created_at_ms: i64,
    /// Non-empty; section 4.7 rejects an intent with no targets.
    pub targets: Vec<RebaseTarget>,
}

/// Build an intent for dragging `head_sha` onto `target_base_sha`. Returns
/// `None` if either sha is unknown to the snapshot, or no branch can be
/// found at `head_sha` to represent the drag (section 4.6 step 1-2).
pub fn build_intent(
    repo: &Repo,
    head_sha: &Sha,
    target_base_sha: &Sha,
    now_ms: i64,
    generate_id: impl FnOnce() -> String,
) -> Option<RebaseIntent> {
    let commit_map = repo.commit_map();
    if !commit_map.contains_key(head_sha) || !commit_map.contains_key(target_base_sha) {
        return None;
    }

    let branch_ref = representative_branch(repo, head_sha)?;

    let trunk_head = get_trunk_head_sha(&repo.branches, &repo.commits);
    let trunk_shas = build_trunk_sha_set(&trunk_head, &commit_map);
    let local_branches: Vec<Branch> = repo.local_branches().cloned().collect();
    let branch_head_index = crate::analyzer::build_branch_head_index(&local_branches);

    let mut visited = HashSet::new();
    let node = build_node(
        &commit_map,
        &local_branches,
        &branch_head_index,
        &trunk_shas,
        head_sha.clone(),
        branch_ref,
        &mut visited,
    );

    Some(RebaseIntent {
        id: generate_id(),
        created_at_ms: now_ms,
        targets: vec![RebaseTarget {
            node,
            target_base_sha: target_base_sha.clone(),
        }],
    })
}

/// Local non-trunk branch at `head_sha` first, then any local branch,
/// then any branch at all (section 4.6 step 2).
fn representative_branch(repo: &Repo, head_sha: &Sha) -> Option<BranchRef> {
    let at_head: Vec<&Branch> = repo.branches.iter().filter(|b| &b.head_sha == head_sha).collect();
    if let Some(b) = at_head.iter().find(|b| !b.is_remote && !b.is_trunk) {
        return Some(b.r#ref.clone());
    }
    if let Some(b) = at_head.iter().find(|b| !b.is_remote) {
        return Some(b.r#ref.clone());
    }
    at_head.first().map(|b| b.r#ref.clone())
}

fn build_node(
    commit_map: &BTreeMap<Sha, &Commit>,
    local_branches: &[Branch],
    branch_head_index: &HashMap<Sha, Vec<BranchRef>>,
    trunk_shas: &HashSet<Sha>,
    head_sha: Sha,
    branch_ref: BranchRef,
    visited: &mut HashSet<String>,
) -> StackNodeState {
    let ownership = compute_ownership(&head_sha, &branch_ref, commit_map, branch_head_index, trunk_shas);

    let mut children = Vec::new();
    let mut added = HashSet::new();
    for candidate in local_branches {
        if candidate.r#ref == branch_ref || candidate.is_trunk {
            continue;
        }
        let key = format!("{}:{}", candidate.head_sha, candidate.r#ref);
        if visited.contains(&key) || added.contains(&candidate.r#ref) {
            continue;
        }

        let is_sibling = candidate.head_sha == head_sha;
        let candidate_ownership = compute_ownership(
            &candidate.head_sha,
            &candidate.r#ref,
            commit_map,
            branch_head_index,
            trunk_shas,
        );
        let forks_here = candidate_ownership.base_sha == head_sha;
        let lineage_overlaps = candidate_ownership
            .owned_shas
            .iter()
            .any(|s| ownership.owned_shas.contains(s));

        if is_sibling || forks_here || lineage_overlaps {
            visited.insert(key);
            added.insert(candidate.r#ref.clone());
            children.push(build_node(
                commit_map,
                local_branches,
                branch_head_index,
                trunk_shas,
                candidate.head_sha.clone(),
                candidate.r#ref.clone(),
                visited,
            ));
        }
    }

    StackNodeState {
        branch: branch_ref,
        head_sha,
        base_sha: ownership.base_sha,
        owned_shas: ownership.owned_shas,
        children,
    }
}
