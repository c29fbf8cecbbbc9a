//! trunk
//!
//! Selects the trunk branch and resolves the current trunk-head sha under
//! local/remote ambiguity (section 4.1).

use crate::model::{Branch, Commit, Sha};

/// Canonical trunk branch names, checked case-insensitively.
const CANONICAL_TRUNK_NAMES: [&str; 4] = ["main", "master", "develop", "trunk"];

/// Local name of a branch: for a remote branch, the ref with its first
/// slash-segment (the remote name) stripped.
fn local_name(branch: &Branch) -> &str {
    let full = branch.r#ref.as_str();
    if branch.is_remote {
        full.split_once('/').map(|(_, rest)| rest).unwrap_or(full)
    } else {
        full
    }
}

/// Whether a branch's local name is one of the canonical trunk names.
pub fn is_canonical_trunk(branch: &Branch) -> bool {
    let name = local_name(branch).to_ascii_lowercase();
    CANONICAL_TRUNK_NAMES.contains(&name.as_str())
}

/// Select the single trunk branch, if any.
///
/// Order: local branch flagged trunk, any branch flagged trunk, local
/// canonical-named branch, any canonical-named branch, else the first
/// branch in the snapshot.
pub fn select_trunk(branches: &[Branch]) -> Option<&Branch> {
    if let Some(b) = branches.iter().find(|b| b.is_trunk && !b.is_remote) {
        return Some(b);
    }
    if let Some(b) = branches.iter().find(|b| b.is_trunk) {
        return Some(b);
    }
    if let Some(b) = branches
        .iter()
        .find(|b| !b.is_remote && is_canonical_trunk(b))
    {
        return Some(b);
    }
    if let Some(b) = branches.iter().find(|b| is_canonical_trunk(b)) {
        return Some(b);
    }
    branches.first()
}

/// Resolve the trunk head sha, reconciling local/remote disagreement.
///
/// If both a local and a remote trunk exist and both heads' timestamps
/// are known, the later one wins. Otherwise the remote head is preferred,
/// then the local head. Returns an empty string when no trunk exists —
/// callers must treat that as degraded mode, never a crash (section 4.1).
pub fn get_trunk_head_sha(branches: &[Branch], commits: &[Commit]) -> Sha {
    let local_trunk = branches
        .iter()
        .filter(|b| !b.is_remote)
        .find(|b| is_trunk_candidate(b));
    let remote_trunk = branches
        .iter()
        .filter(|b| b.is_remote)
        .find(|b| is_trunk_candidate(b));

    match (local_trunk, remote_trunk) {
        (Some(local), Some(remote)) => {
            let local_time = commit_time(commits, &local.head_sha);
            let remote_time = commit_time(commits, &remote.head_sha);
            match (local_time, remote_time) {
                (Some(lt), Some(rt)) if lt > rt => local.head_sha.clone(),
                (Some(_), Some(_)) => remote.head_sha.clone(),
                _ => remote.head_sha.clone(),
            }
        }
        (None, Some(remote)) => remote.head_sha.clone(),
        (Some(local), None) => local.head_sha.clone(),
        (None, None) => match select_trunk(branches) {
            Some(b) => b.head_sha.clone(),
            None => Sha::new(""),
        },
    }
}

pub(crate) fn is_trunk_candidate(b: &Branch) -> bool {
    b.is_trunk || is_canonical_trunk(b)
}

fn commit_time(commits: &[Commit], sha: &Sha) -> Option<i64> {
    commits.iter().find(|c| &c.sha == sha).map(|c| c.time_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(r#ref: &str, head: &str, is_trunk: bool, is_remote: bool) -> Branch {
        Branch {
            r#ref: r#ref.into(),
            head_sha: head.into(),
            is_trunk,
            is_remote,
        }
    }

    fn commit(sha: &str, time_ms: i64) -> Commit {
        Commit {
            sha: sha.into(),
            parent_sha: None,
            children_sha: Vec::new(),
            message: String::new(),
            time_ms,
        }
    }

    #[test]
    fn prefers_local_trunk_flag() {
        let branches = vec![
            branch("origin/main", "r1", true, true),
            branch("main", "l1", true, false),
        ];
        assert_eq!(select_trunk(&branches).unwrap().head_sha, Sha::new("l1"));
    }

    #[test]
    fn falls_back_to_canonical_name() {
        let branches = vec![branch("feature", "f1", false, false), branch("main", "m1", false, false)];
        assert_eq!(select_trunk(&branches).unwrap().head_sha, Sha::new("m1"));
    }

    #[test]
    fn falls_back_to_first_branch_when_nothing_matches() {
        let branches = vec![branch("weird", "w1", false, false)];
        assert_eq!(select_trunk(&branches).unwrap().head_sha, Sha::new("w1"));
    }

    #[test]
    fn empty_branches_have_no_trunk() {
        assert!(select_trunk(&[]).is_none());
    }

    #[test]
    fn remote_local_names_are_stripped_of_remote_prefix() {
        let b = branch("origin/develop", "r1", false, true);
        assert!(is_canonical_trunk(&b));
    }

    #[test]
    fn trunk_head_prefers_later_timestamp_between_local_and_remote() {
        let branches = vec![
            branch("main", "local-head", false, false),
            branch("origin/main", "remote-head", false, true),
        ];
        let commits = vec![commit("local-head", 100), commit("remote-head", 200)];
        assert_eq!(
            get_trunk_head_sha(&branches, &commits),
            Sha::new("remote-head")
        );
    }

    #[test]
    fn trunk_head_prefers_remote_when_timestamps_missing() {
        let branches = vec![
            branch("main", "local-head", false, false),
            branch("origin/main", "remote-head", false, true),
        ];
        assert_eq!(
            get_trunk_head_sha(&branches, &[]),
            Sha::new("remote-head")
        );
    }

    #[test]
    fn trunk_head_empty_when_no_trunk() {
        let branches = vec![branch("weird", "w1", false, false)];
        // "weird" becomes the fallback trunk via select_trunk's final branch,
        // so head resolves to it rather than empty.
        assert_eq!(get_trunk_head_sha(&branches, &[]), Sha::new("w1"));
        assert_eq!(get_trunk_head_sha(&[], &[]), Sha::new(""));
    }
}
