//! analyzer
//!
//! Pure DAG traversal helpers shared by the projector, the intent builder,
//! and the PR target resolver (section 4.2).
//!
//! Every walk here is bounded by a visited set and a depth cap: cycles and
//! cap hits are never errors, they just stop the walk and return whatever
//! was collected (section 7).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::model::{Branch, BranchRef, Commit, Sha};

pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Depth-first walk, parent before children, starting at `root`.
pub fn walk<'a>(
    root: &Sha,
    commit_map: &BTreeMap<Sha, &'a Commit>,
    mut visit: impl FnMut(&'a Commit),
) {
    let mut stack = vec![root.clone()];
    let mut visited = HashSet::new();
    while let Some(sha) = stack.pop() {
        if !visited.insert(sha.clone()) {
            continue;
        }
        if let Some(commit) = commit_map.get(&sha) {
            visit(commit);
            // Push children in reverse so the first child is visited first
            // when popped (stack is LIFO).
            for child in commit.children_sha.iter().rev() {
                stack.push(child.clone());
            }
        }
    }
}

/// Parent-link walk from `head_sha`, stopping at `stop_at` (exclusive) or a
/// missing commit, bounded by `max_depth`. Returns oldest-first.
pub fn collect_lineage(
    head_sha: &Sha,
    commit_map: &BTreeMap<Sha, &Commit>,
    stop_at: Option<&Sha>,
    max_depth: usize,
) -> Vec<Sha> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(head_sha.clone());
    while let Some(sha) = current {
        if chain.len() >= max_depth || !visited.insert(sha.clone()) {
            break;
        }
        if Some(&sha) == stop_at {
            break;
        }
        chain.push(sha.clone());
        current = commit_map.get(&sha).and_then(|c| c.parent_sha.clone());
    }
    chain.reverse();
    chain
}

/// Backwards walk from `start_sha`, returning head-first, stopping when
/// `should_stop` returns true for the *next* candidate sha, or at the depth
/// cap, or at a missing commit.
pub fn walk_commit_history(
    start_sha: &Sha,
    commit_map: &BTreeMap<Sha, &Commit>,
    mut should_stop: impl FnMut(&Sha) -> bool,
    max_depth: usize,
) -> Vec<Sha> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(start_sha.clone());
    while let Some(sha) = current {
        if result.len() >= max_depth || !visited.insert(sha.clone()) || should_stop(&sha) {
            break;
        }
        result.push(sha.clone());
        current = commit_map.get(&sha).and_then(|c| c.parent_sha.clone());
    }
    result
}

/// Commits strictly after `base` up to and including `head`, in topological
/// (oldest-first) order. Empty if `base == head` or `head` is unreachable
/// from `base` within `DEFAULT_MAX_DEPTH`.
pub fn get_commits_in_range(base: &Sha, head: &Sha, commit_map: &BTreeMap<Sha, &Commit>) -> Vec<Sha> {
    if base == head {
        return Vec::new();
    }
    collect_lineage(head, commit_map, Some(base), DEFAULT_MAX_DEPTH)
}

pub fn count_commits_in_range(base: &Sha, head: &Sha, commit_map: &BTreeMap<Sha, &Commit>) -> usize {
    get_commits_in_range(base, head, commit_map).len()
}

/// Map each commit sha to the local+remote branch refs whose head points at
/// it, in snapshot order.
pub fn build_branch_head_index(branches: &[Branch]) -> HashMap<Sha, Vec<BranchRef>> {
    let mut index: HashMap<Sha, Vec<BranchRef>> = HashMap::new();
    for branch in branches {
        index
            .entry(branch.head_sha.clone())
            .or_default()
            .push(branch.r#ref.clone());
    }
    index
}

/// For each local branch, the nearest ancestor branch and the commit
/// distance to it. Ties prefer a non-trunk ancestor, then lexicographic
/// branch ref order.
pub fn build_parent_index(
    local_branches: &[Branch],
    commit_map: &BTreeMap<Sha, &Commit>,
) -> HashMap<BranchRef, (BranchRef, usize)> {
    let mut index = HashMap::new();
    for branch in local_branches {
        let mut distance = 0usize;
        let mut visited = HashSet::new();
        let mut current = commit_map
            .get(&branch.head_sha)
            .and_then(|c| c.parent_sha.clone());
        let mut candidates: Vec<(BranchRef, bool)> = Vec::new();
        while let Some(sha) = current {
            if distance >= DEFAULT_MAX_DEPTH || !visited.insert(sha.clone()) {
                break;
            }
            distance += 1;
            for other in local_branches {
                if other.r#ref != branch.r#ref && other.head_sha == sha {
                    candidates.push((other.r#ref.clone(), other.is_trunk));
                }
            }
            if !candidates.is_empty() {
                break;
            }
            current = commit_map.get(&sha).and_then(|c| c.parent_sha.clone());
        }
        if let Some((r#ref, _)) = candidates
            .into_iter()
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())))
        {
            index.insert(branch.r#ref.clone(), (r#ref, distance));
        }
    }
    index
}

/// Reverse of [`build_parent_index`]: for each branch, the local branches
/// whose nearest ancestor is it.
pub fn build_children_index(
    parent_index: &HashMap<BranchRef, (BranchRef, usize)>,
) -> HashMap<BranchRef, Vec<BranchRef>> {
    let mut children: HashMap<BranchRef, Vec<BranchRef>> = HashMap::new();
    for (child, (parent, _)) in parent_index {
        children.entry(parent.clone()).or_default().push(child.clone());
    }
    for values in children.values_mut() {
        values.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    }
    children
}

/// Result of [`collect_linear_descendants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearDescendants {
    /// A simple chain of descendants, nearest first.
    Chain(Vec<BranchRef>),
    /// The descendant tree branches or cycles before the depth cap.
    NotLinear,
}

/// Walk [`build_children_index`] forward from `branch`; fails (returns
/// [`LinearDescendants::NotLinear`]) the moment any node has more than one
/// child, or a cycle is detected, or the depth cap is hit.
pub fn collect_linear_descendants(
    branch: &BranchRef,
    children_index: &HashMap<BranchRef, Vec<BranchRef>>,
    max_depth: usize,
) -> LinearDescendants {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(branch.clone());
    let mut current = branch.clone();
    loop {
        let children = children_index.get(&current).cloned().unwrap_or_default();
        match children.len() {
            0 => break,
            1 => {
                let next = children.into_iter().next().unwrap();
                if !visited.insert(next.clone()) || chain.len() >= max_depth {
                    return LinearDescendants::NotLinear;
                }
                chain.push(next.clone());
                current = next;
            }
            _ => return LinearDescendants::NotLinear,
        }
    }
    LinearDescendants::Chain(chain)
}

/// Local, non-trunk branches whose head's parent equals `parent_head_sha`
/// (unless the exclusions are relaxed).
pub fn find_direct_child_branches<'a>(
    branches: &'a [Branch],
    commit_map: &BTreeMap<Sha, &Commit>,
    parent_head_sha: &Sha,
    exclude_remote: bool,
    exclude_trunk: bool,
) -> Vec<&'a Branch> {
    branches
        .iter()
        .filter(|b| !(exclude_remote && b.is_remote))
        .filter(|b| !(exclude_trunk && b.is_trunk))
        .filter(|b| {
            commit_map
                .get(&b.head_sha)
                .and_then(|c| c.parent_sha.as_ref())
                == Some(parent_head_sha)
        })
        .collect()
}

/// Breadth-first queue helper used by squash's descendant-branch search.
pub fn bfs_shas(start: &[Sha], commit_map: &BTreeMap<Sha, &Commit>) -> Vec<Sha> {
    let mut visited = HashSet::new();
    let mut queue: VecDeque<Sha> = start.iter().cloned().collect();
    let mut order = Vec::new();
    while let Some(sha) = queue.pop_front() {
        if !visited.insert(sha.clone()) {
            continue;
        }
        order.push(sha.clone());
        if let Some(commit) = commit_map.get(&sha) {
            for child in &commit.children_sha {
                queue.push_back(child.clone());
            }
        }
    }
    order
}
