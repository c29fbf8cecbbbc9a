//! ownership
//!
//! The single source of truth for "what commits does a branch own"
//! (section 4.3). Called identically by the projector and the rebase
//! intent builder so the two never disagree about ownership.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analyzer::DEFAULT_MAX_DEPTH;
use crate::model::{BranchRef, Commit, Sha};

/// A branch's owned commits and the base it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// Owned commits, head-first, excluding the base.
    pub owned_shas: Vec<Sha>,
    pub base_sha: Sha,
}

/// Forward walk from the trunk head, stopping at missing commits
/// (shallow-clone safe). Returns the set of shas on the trunk lineage.
pub fn build_trunk_sha_set(trunk_head: &Sha, commit_map: &BTreeMap<Sha, &Commit>) -> HashSet<Sha> {
    let mut set = HashSet::new();
    let mut visited = HashSet::new();
    let mut current = Some(trunk_head.clone());
    let mut depth = 0;
    while let Some(sha) = current {
        if depth >= DEFAULT_MAX_DEPTH || !visited.insert(sha.clone()) {
            break;
        }
        depth += 1;
        set.insert(sha.clone());
        current = commit_map.get(&sha).and_then(|c| c.parent_sha.clone());
    }
    set
}

/// A commit is a fork point iff it has at least two children that are not
/// themselves on the trunk lineage.
pub fn is_fork_point(commit: &Commit, trunk_shas: &HashSet<Sha>) -> bool {
    commit
        .children_sha
        .iter()
        .filter(|c| !trunk_shas.contains(*c))
        .count()
        >= 2
}

/// Compute the commits owned by `branch_ref` rooted at `head_sha`.
///
/// `branch_head_index` must be built from *local* branches only (section
/// 4.3): remote heads must never affect ownership.
pub fn compute_ownership(
    head_sha: &Sha,
    branch_ref: &BranchRef,
    commit_map: &BTreeMap<Sha, &Commit>,
    branch_head_index: &HashMap<Sha, Vec<BranchRef>>,
    trunk_shas: &HashSet<Sha>,
) -> Ownership {
    let mut owned = Vec::new();
    let mut visited = HashSet::new();
    let mut last_known_parent: Option<Sha> = None;
    let mut current = head_sha.clone();

    loop {
        if !visited.insert(current.clone()) || owned.len() >= DEFAULT_MAX_DEPTH {
            // Cycle or cap: fall back to the last known parent, or to the
            // current commit itself if nothing better is known.
            let base = last_known_parent.unwrap_or_else(|| current.clone());
            return Ownership {
                owned_shas: owned,
                base_sha: base,
            };
        }

        let commit = match commit_map.get(&current) {
            Some(c) => c,
            None => {
                // Step 1: current sha missing from the snapshot entirely.
                // Only possible on the very first iteration since later
                // shas are always read out of commit_map via parent_sha.
                let base = last_known_parent.unwrap_or_else(|| current.clone());
                return Ownership {
                    owned_shas: owned,
                    base_sha: base,
                };
            }
        };
        owned.push(current.clone());

        let parent = match &commit.parent_sha {
            None => {
                // Step 2: root commit.
                return Ownership {
                    owned_shas: owned,
                    base_sha: current,
                };
            }
            Some(p) => p.clone(),
        };
        last_known_parent = Some(parent.clone());

        // Step 3: parent is on trunk.
        if trunk_shas.contains(&parent) {
            return Ownership {
                owned_shas: owned,
                base_sha: parent,
            };
        }

        // Step 4: parent is another branch's head.
        if let Some(refs) = branch_head_index.get(&parent) {
            if refs.iter().any(|r| r != branch_ref) {
                return Ownership {
                    owned_shas: owned,
                    base_sha: parent,
                };
            }
        }

        // Step 5: parent is a fork point.
        if let Some(parent_commit) = commit_map.get(&parent) {
            if is_fork_point(parent_commit, trunk_shas) {
                return Ownership {
                    owned_shas: owned,
                    base_sha: parent,
                };
            }
        } else {
            // Parent missing from the snapshot: stop here, base is the
            // last known parent (section 7 degradation).
            return Ownership {
                owned_shas: owned,
                base_sha: parent,
            };
        }

        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, parent: Option<&str>, children: &[&str]) -> Commit {
        Commit {
            sha: sha.into(),
            parent_sha: parent.map(Sha::new),
            children_sha: children.iter().map(|c| Sha::new(*c)).collect(),
            message: String::new(),
            time_ms: 0,
        }
    }

    /// S1: ownership through branchless commits.
    #[test]
    fn ownership_through_branchless_commits() {
        let commits = vec![
            commit("a", None, &["b"]),
            commit("b", Some("a"), &["c"]),
            commit("c", Some("b"), &["d"]),
            commit("d", Some("c"), &[]),
        ];
        let map: BTreeMap<Sha, &Commit> = commits.iter().map(|c| (c.sha.clone(), c)).collect();
        let trunk_shas = build_trunk_sha_set(&Sha::new("a"), &map);
        let branch_index = HashMap::from([(Sha::new("d"), vec![BranchRef::new("feature")])]);

        let ownership = compute_ownership(
            &Sha::new("d"),
            &BranchRef::new("feature"),
            &map,
            &branch_index,
            &trunk_shas,
        );

        assert_eq!(
            ownership.owned_shas,
            vec![Sha::new("d"), Sha::new("c"), Sha::new("b")]
        );
        assert_eq!(ownership.base_sha, Sha::new("a"));
    }

    /// S2: fork point.
    #[test]
    fn fork_point_splits_ownership() {
        let commits = vec![
            commit("a", None, &["b"]),
            commit("b", Some("a"), &["c", "d"]),
            commit("c", Some("b"), &[]),
            commit("d", Some("b"), &[]),
        ];
        let map: BTreeMap<Sha, &Commit> = commits.iter().map(|c| (c.sha.clone(), c)).collect();
        let trunk_shas = build_trunk_sha_set(&Sha::new("a"), &map);
        let branch_index = HashMap::from([
            (Sha::new("c"), vec![BranchRef::new("feat1")]),
            (Sha::new("d"), vec![BranchRef::new("feat2")]),
        ]);

        let feat1 = compute_ownership(&Sha::new("c"), &BranchRef::new("feat1"), &map, &branch_index, &trunk_shas);
        assert_eq!(feat1.owned_shas, vec![Sha::new("c")]);
        assert_eq!(feat1.base_sha, Sha::new("b"));

        let feat2 = compute_ownership(&Sha::new("d"), &BranchRef::new("feat2"), &map, &branch_index, &trunk_shas);
        assert_eq!(feat2.owned_shas, vec![Sha::new("d")]);
        assert_eq!(feat2.base_sha, Sha::new("b"));

        assert!(is_fork_point(map[&Sha::new("b")], &trunk_shas));
    }

    #[test]
    fn root_commit_owns_only_itself() {
        let commits = vec![commit("a", None, &[])];
        let map: BTreeMap<Sha, &Commit> = commits.iter().map(|c| (c.sha.clone(), c)).collect();
        let trunk_shas = HashSet::new();
        let ownership = compute_ownership(
            &Sha::new("a"),
            &BranchRef::new("feature"),
            &map,
            &HashMap::new(),
            &trunk_shas,
        );
        assert_eq!(ownership.owned_shas, vec![Sha::new("a")]);
        assert_eq!(ownership.base_sha, Sha::new("a"));
    }

    #[test]
    fn missing_mid_chain_commit_stops_walk() {
        let commits = vec![commit("b", Some("missing"), &[])];
        let map: BTreeMap<Sha, &Commit> = commits.iter().map(|c| (c.sha.clone(), c)).collect();
        let ownership = compute_ownership(
            &Sha::new("b"),
            &BranchRef::new("feature"),
            &map,
            &HashMap::new(),
            &HashSet::new(),
        );
        assert_eq!(ownership.owned_shas, vec![Sha::new("b")]);
        assert_eq!(ownership.base_sha, Sha::new("missing"));
    }

    #[test]
    fn missing_head_commit_returns_itself_as_base() {
        let map: BTreeMap<Sha, &Commit> = BTreeMap::new();
        let ownership = compute_ownership(
            &Sha::new("ghost"),
            &BranchRef::new("feature"),
            &map,
            &HashMap::new(),
            &HashSet::new(),
        );
        assert!(ownership.owned_shas.is_empty());
        assert_eq!(ownership.base_sha, Sha::new("ghost"));
    }

    #[test]
    fn sibling_branch_head_bounds_ownership() {
        let commits = vec![
            commit("a", None, &["b"]),
            commit("b", Some("a"), &["c"]),
            commit("c", Some("b"), &[]),
        ];
        let map: BTreeMap<Sha, &Commit> = commits.iter().map(|c| (c.sha.clone(), c)).collect();
        let branch_index = HashMap::from([
            (Sha::new("b"), vec![BranchRef::new("parent-branch")]),
            (Sha::new("c"), vec![BranchRef::new("child-branch")]),
        ]);
        let ownership = compute_ownership(
            &Sha::new("c"),
            &BranchRef::new("child-branch"),
            &map,
            &branch_index,
            &HashSet::new(),
        );
        assert_eq!(ownership.owned_shas, vec![Sha::new("c")]);
        assert_eq!(ownership.base_sha, Sha::new("b"));
    }
}
