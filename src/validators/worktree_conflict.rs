//! validators::worktree_conflict
//!
//! Checks out-of-process worktrees for branches an operation is about to
//! rewrite (section 4.12). The active worktree is exempt: its branch is
//! whatever the gesture is already running against.

use crate::model::{BranchRef, Repo, Worktree};

/// Non-active worktrees checked out to an affected branch, split by
/// whether they have uncommitted changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorktreeConflictPartition {
    pub clean: Vec<Worktree>,
    pub dirty: Vec<Worktree>,
}

pub fn partition_worktree_conflicts(repo: &Repo, affected_branches: &[BranchRef]) -> WorktreeConflictPartition {
    let mut partition = WorktreeConflictPartition::default();
    for worktree in &repo.worktrees {
        if worktree.path == repo.active_worktree_path {
            continue;
        }
        let Some(branch) = &worktree.branch else { continue };
        if !affected_branches.contains(branch) {
            continue;
        }
        if worktree.is_dirty {
            partition.dirty.push(worktree.clone());
        } else {
            partition.clean.push(worktree.clone());
        }
    }
    partition
}

pub fn has_worktree_conflict(partition: &WorktreeConflictPartition) -> bool {
    !partition.clean.is_empty() || !partition.dirty.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Commit, WorkingTreeStatus};

    fn repo(worktrees: Vec<Worktree>) -> Repo {
        Repo {
            path: "/repo".into(),
            active_worktree_path: "/repo".into(),
            commits: Vec::<Commit>::new(),
            branches: Vec::new(),
            worktrees,
            working_tree_status: WorkingTreeStatus::default(),
        }
    }

    fn worktree(path: &str, branch: Option<&str>, dirty: bool) -> Worktree {
        Worktree {
            path: path.into(),
            branch: branch.map(BranchRef::new),
            head_sha: "a".into(),
            is_main: false,
            is_stale: false,
            is_dirty: dirty,
        }
    }

    #[test]
    fn active_worktree_is_exempt() {
        let r = repo(vec![worktree("/repo", Some("feature"), true)]);
        let partition = partition_worktree_conflicts(&r, &["feature".into()]);
        assert!(!has_worktree_conflict(&partition));
    }

    #[test]
    fn partitions_by_dirtiness() {
        let r = repo(vec![
            worktree("/other1", Some("feature"), false),
            worktree("/other2", Some("feature"), true),
            worktree("/other3", Some("unrelated"), true),
        ]);
        let partition = partition_worktree_conflicts(&r, &["feature".into()]);
        assert_eq!(partition.clean.len(), 1);
        assert_eq!(partition.dirty.len(), 1);
    }

    #[test]
    fn detached_worktrees_are_ignored() {
        let r = repo(vec![worktree("/other", None, true)]);
        let partition = partition_worktree_conflicts(&r, &["feature".into()]);
        assert!(!has_worktree_conflict(&partition));
    }
}
