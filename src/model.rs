//! model
//!
//! The DAG data model: commits, branches, worktrees, working-tree status,
//! and the `Repo` snapshot that every other module derives from.
//!
//! # Invariants
//!
//! - `Repo` is a snapshot, never mutated by the core (section 3).
//! - `Commit.parent_sha` may reference a sha absent from the snapshot
//!   (shallow-clone boundary); callers must not assume completeness.
//! - `Sha` and `BranchRef` are opaque identifiers, not validated Git refnames
//!   at construction time — a `Repo` may contain anything a real
//!   collaborator handed back (section 3.1).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An opaque, stable commit identifier.
///
/// Unlike a validated `Oid`, a `Sha` accepts any non-empty token: real
/// SHAs, short SHAs, or synthetic test identifiers. The core degrades on
/// unfamiliar input rather than rejecting it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sha(String);

impl Sha {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sha {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Sha {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A branch or remote-tracking ref name, e.g. `feature/foo` or `origin/main`.
///
/// Read from a snapshot without validation; validation only gates
/// *creating* a new branch name (see [`crate::validators::branch_name`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchRef(String);

impl BranchRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single commit in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: Sha,
    /// Single-parent assumption (section 9): merge commits are represented
    /// by their first parent only.
    pub parent_sha: Option<Sha>,
    pub children_sha: Vec<Sha>,
    pub message: String,
    pub time_ms: i64,
}

/// A branch pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub r#ref: BranchRef,
    pub head_sha: Sha,
    pub is_trunk: bool,
    pub is_remote: bool,
}

/// A worktree checked out against the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worktree {
    pub path: String,
    pub branch: Option<BranchRef>,
    pub head_sha: Sha,
    pub is_main: bool,
    pub is_stale: bool,
    pub is_dirty: bool,
}

/// The state of the working tree at the currently active worktree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingTreeStatus {
    pub current_branch: Option<BranchRef>,
    pub current_commit_sha: Option<Sha>,
    pub detached: bool,
    pub is_rebasing: bool,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<String>,
    pub created: Vec<String>,
    pub not_added: Vec<String>,
    pub conflicted: Vec<String>,
}

impl WorkingTreeStatus {
    /// Changed files per the rebase validator's clean-tree rule: staged,
    /// modified, deleted, and conflicted. Untracked (`not_added`) files are
    /// deliberately ignored (section 4.12).
    pub fn changed_files(&self) -> Vec<&str> {
        self.staged
            .iter()
            .chain(self.modified.iter())
            .chain(self.deleted.iter())
            .chain(self.conflicted.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.changed_files().is_empty()
    }
}

/// A full repository snapshot, passed into the core by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub path: String,
    pub active_worktree_path: String,
    pub commits: Vec<Commit>,
    pub branches: Vec<Branch>,
    pub worktrees: Vec<Worktree>,
    pub working_tree_status: WorkingTreeStatus,
}

impl Repo {
    /// Index commits by sha. `BTreeMap` keeps iteration deterministic,
    /// which matters for anything downstream that iterates the map.
    pub fn commit_map(&self) -> BTreeMap<Sha, &Commit> {
        self.commits.iter().map(|c| (c.sha.clone(), c)).collect()
    }

    pub fn local_branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter().filter(|b| !b.is_remote)
    }

    pub fn find_branch(&self, r#ref: &BranchRef) -> Option<&Branch> {
        self.branches.iter().find(|b| &b.r#ref == r#ref)
    }

    pub fn worktree_for_branch(&self, r#ref: &BranchRef) -> Option<&Worktree> {
        self.worktrees
            .iter()
            .find(|w| w.branch.as_ref() == Some(r#ref))
    }

    pub fn active_worktree(&self) -> Option<&Worktree> {
        self.worktrees
            .iter()
            .find(|w| w.path == self.active_worktree_path)
    }
}
