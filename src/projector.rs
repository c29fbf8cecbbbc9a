//! projector
//!
//! Builds the recursive `UiStack` tree: trunk plus spinoffs, with branch,
//! permission, and forge annotations (section 4.4).

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analyzer::DEFAULT_MAX_DEPTH;
use crate::forge::{self, GitForgeState, PullRequest};
use crate::model::{Branch, BranchRef, Commit, Repo, Sha};
use crate::ownership::{self, build_trunk_sha_set};
use crate::pr_target;
use crate::trunk::{get_trunk_head_sha, is_trunk_candidate};

/// Whether a rebase gesture is live over a commit, overlaid by the
/// rebase preview (section 4.10). Absent any rebase, every commit is
/// `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebaseStatus {
    #[default]
    Idle,
    Prompting,
}

/// A permission flag with a human-readable reason when denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub allowed: bool,
    pub reason: Option<String>,
}

fn permission(allowed: bool, reason: &str) -> Permission {
    Permission {
        allowed,
        reason: if allowed { None } else { Some(reason.to_string()) },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorktreeBadge {
    pub path: String,
    pub is_stale: bool,
    pub is_dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiBranch {
    pub name: BranchRef,
    pub is_current: bool,
    pub is_remote: bool,
    pub is_trunk: bool,
    pub can_rename: Permission,
    pub can_delete: Permission,
    pub can_squash: Permission,
    pub can_create_worktree: Permission,
    pub can_recreate_pr: Permission,
    pub expected_pr_base: Option<BranchRef>,
    pub owned_commit_shas: Option<Vec<Sha>>,
    pub pull_request: Option<PullRequest>,
    pub is_merged: bool,
    pub has_stale_target: bool,
    pub worktree: Option<WorktreeBadge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiCommit {
    pub sha: Sha,
    pub name: String,
    pub timestamp_ms: i64,
    pub is_current: bool,
    pub is_independent: bool,
    pub rebase_status: RebaseStatus,
    pub spinoffs: Vec<UiStack>,
    pub branches: Vec<UiBranch>,
}

/// A linear chain of commits owned by one branch (or trunk), oldest
/// commit first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiStack {
    pub commits: Vec<UiCommit>,
    pub is_trunk: bool,
    pub can_rebase_to_trunk: bool,
    pub is_directly_off_trunk: bool,
    /// The commit this stack forks off of. For the trunk stack this is
    /// the oldest known trunk commit (trunk has no real base).
    pub base_sha: Sha,
}

impl UiStack {
    /// Depth-first iterator over every commit in this stack and its
    /// spinoffs, used by validators and tests that need "everything".
    pub fn iter_all_commits(&self) -> Box<dyn Iterator<Item = &UiCommit> + '_> {
        Box::new(self.commits.iter().flat_map(|c| {
            std::iter::once(c).chain(c.spinoffs.iter().flat_map(|s| s.iter_all_commits()))
        }))
    }

    pub fn find_commit(&self, sha: &Sha) -> Option<&UiCommit> {
        self.iter_all_commits().find(|c| &c.sha == sha)
    }
}

struct Ctx<'a> {
    repo: &'a Repo,
    commit_map: BTreeMap<Sha, &'a Commit>,
    trunk_shas: HashSet<Sha>,
    trunk_head_sha: Sha,
    local_branch_index: std::collections::HashMap<Sha, Vec<BranchRef>>,
    sorted_branches: Vec<&'a Branch>,
    forge: Option<&'a GitForgeState>,
    merged_branches: Vec<BranchRef>,
}

/// Project a `Repo` snapshot (plus optional forge state) into a `UiStack`
/// tree. Returns `None` when no trunk can be resolved (degraded mode,
/// section 4.1) — never panics.
pub fn project(repo: &Repo, forge: Option<&GitForgeState>) -> Option<UiStack> {
    let trunk = crate::trunk::select_trunk(&repo.branches)?;
    let trunk_head_sha = get_trunk_head_sha(&repo.branches, &repo.commits);
    if trunk_head_sha.as_str().is_empty() {
        return None;
    }
    let _ = trunk;

    let commit_map = repo.commit_map();
    let trunk_lineage = build_trunk_lineage(repo, &commit_map);
    let trunk_shas = build_trunk_sha_set(&trunk_head_sha, &commit_map)
        .into_iter()
        .chain(trunk_lineage.iter().cloned())
        .collect::<HashSet<_>>();

    let local_branches: Vec<Branch> = repo.local_branches().cloned().collect();
    let local_branch_index = crate::analyzer::build_branch_head_index(&local_branches);

    let mut sorted_branches: Vec<&Branch> = repo.branches.iter().collect();
    sorted_branches.sort_by(|a, b| {
        rank_trunk(a)
            .cmp(&rank_trunk(b))
            .then_with(|| rank_remote(a).cmp(&rank_remote(b)))
            .then_with(|| a.r#ref.as_str().cmp(b.r#ref.as_str()))
    });

    let merged_branches = forge
        .map(|f| f.merged_branch_names.clone())
        .unwrap_or_default();

    let ctx = Ctx {
        repo,
        commit_map,
        trunk_shas,
        trunk_head_sha,
        local_branch_index,
        sorted_branches,
        forge,
        merged_branches,
    };

    let mut stack = build_trunk_stack(&ctx, &trunk_lineage);
    trim_trunk_lead(&mut stack);
    Some(stack)
}

fn rank_trunk(b: &Branch) -> u8 {
    if b.is_trunk || is_trunk_candidate(b) {
        0
    } else {
        1
    }
}

fn rank_remote(b: &Branch) -> u8 {
    if b.is_remote {
        1
    } else {
        0
    }
}

/// Trunk lineage (section 4.4 step 3): walk parent links from the local
/// trunk head; if a remote trunk exists and is strictly ahead, extend
/// with the remote lineage; on genuine divergence merge ascending by
/// `time_ms`.
fn build_trunk_lineage(repo: &Repo, commit_map: &BTreeMap<Sha, &Commit>) -> Vec<Sha> {
    let local = repo
        .branches
        .iter()
        .find(|b| !b.is_remote && is_trunk_candidate(b));
    let remote = repo
        .branches
        .iter()
        .find(|b| b.is_remote && is_trunk_candidate(b));

    match (local, remote) {
        (Some(l), Some(r)) => {
            let lineage_l = crate::analyzer::collect_lineage(&l.head_sha, commit_map, None, DEFAULT_MAX_DEPTH);
            if l.head_sha == r.head_sha {
                return lineage_l;
            }
            let lineage_r = crate::analyzer::collect_lineage(&r.head_sha, commit_map, None, DEFAULT_MAX_DEPTH);
            if lineage_r.contains(&l.head_sha) {
                lineage_r
            } else if lineage_l.contains(&r.head_sha) {
                lineage_l
            } else {
                merge_by_time(lineage_l, lineage_r, commit_map)
            }
        }
        (Some(l), None) => crate::analyzer::collect_lineage(&l.head_sha, commit_map, None, DEFAULT_MAX_DEPTH),
        (None, Some(r)) => crate::analyzer::collect_lineage(&r.head_sha, commit_map, None, DEFAULT_MAX_DEPTH),
        (None, None) => Vec::new(),
    }
}

fn merge_by_time(a: Vec<Sha>, b: Vec<Sha>, commit_map: &BTreeMap<Sha, &Commit>) -> Vec<Sha> {
    let mut seen = HashSet::new();
    let mut combined = Vec::new();
    for sha in a.into_iter().chain(b) {
        if seen.insert(sha.clone()) {
            combined.push(sha);
        }
    }
    combined.sort_by(|x, y| {
        let tx = commit_map.get(x).map(|c| c.time_ms).unwrap_or(i64::MIN);
        let ty = commit_map.get(y).map(|c| c.time_ms).unwrap_or(i64::MIN);
        tx.cmp(&ty).then_with(|| x.as_str().cmp(y.as_str()))
    });
    combined
}

fn sort_children(children: &mut [Sha], commit_map: &BTreeMap<Sha, &Commit>) {
    children.sort_by(|x, y| {
        let tx = commit_map.get(x).map(|c| c.time_ms).unwrap_or(0);
        let ty = commit_map.get(y).map(|c| c.time_ms).unwrap_or(0);
        tx.cmp(&ty).then_with(|| x.as_str().cmp(y.as_str()))
    });
}

fn build_trunk_stack(ctx: &Ctx, trunk_lineage: &[Sha]) -> UiStack {
    let mut commits = Vec::new();
    for sha in trunk_lineage {
        let Some(commit) = ctx.commit_map.get(sha) else {
            continue;
        };
        let mut children: Vec<Sha> = commit
            .children_sha
            .iter()
            .filter(|c| !ctx.trunk_shas.contains(*c))
            .cloned()
            .collect();
        sort_children(&mut children, &ctx.commit_map);
        let spinoffs: Vec<UiStack> = children
            .into_iter()
            .map(|child| build_nontrunk_stack(ctx, child, sha.clone()))
            .collect();
        commits.push(make_ui_commit(ctx, commit, spinoffs));
    }
    let base_sha = trunk_lineage
        .first()
        .cloned()
        .unwrap_or_else(|| ctx.trunk_head_sha.clone());
    UiStack {
        commits,
        is_trunk: true,
        can_rebase_to_trunk: false,
        is_directly_off_trunk: false,
        base_sha,
    }
}

fn build_nontrunk_stack(ctx: &Ctx, start_sha: Sha, base_sha: Sha) -> UiStack {
    let mut commits = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(start_sha);

    while let Some(sha) = current {
        if !visited.insert(sha.clone()) || commits.len() >= DEFAULT_MAX_DEPTH {
            break;
        }
        let Some(commit) = ctx.commit_map.get(&sha) else {
            break;
        };
        let mut children: Vec<Sha> = commit.children_sha.clone();
        sort_children(&mut children, &ctx.commit_map);
        let mut iter = children.into_iter();
        let continue_child = iter.next();
        let spinoff_children: Vec<Sha> = iter.collect();

        let spinoffs: Vec<UiStack> = spinoff_children
            .into_iter()
            .map(|child| build_nontrunk_stack(ctx, child, sha.clone()))
            .collect();

        commits.push(make_ui_commit(ctx, commit, spinoffs));
        current = continue_child;
    }

    let is_directly_off_trunk = ctx.trunk_shas.contains(&base_sha);
    let trunk_known = !ctx.trunk_head_sha.as_str().is_empty();
    let can_rebase_to_trunk = is_directly_off_trunk && base_sha != ctx.trunk_head_sha && trunk_known;
    UiStack {
        commits,
        is_trunk: false,
        can_rebase_to_trunk,
        is_directly_off_trunk,
        base_sha,
    }
}

fn make_ui_commit(ctx: &Ctx, commit: &Commit, spinoffs: Vec<UiStack>) -> UiCommit {
    let is_independent = ownership::is_fork_point(commit, &ctx.trunk_shas);
    let is_current = ctx
        .repo
        .working_tree_status
        .current_commit_sha
        .as_ref()
        == Some(&commit.sha);

    let branches = ctx
        .sorted_branches
        .iter()
        .filter(|b| b.head_sha == commit.sha)
        .map(|b| make_ui_branch(ctx, b))
        .collect();

    UiCommit {
        sha: commit.sha.clone(),
        name: commit.message.clone(),
        timestamp_ms: commit.time_ms,
        is_current,
        is_independent,
        rebase_status: RebaseStatus::Idle,
        spinoffs,
        branches,
    }
}

fn make_ui_branch(ctx: &Ctx, branch: &Branch) -> UiBranch {
    let is_current = !ctx.repo.working_tree_status.detached
        && ctx.repo.working_tree_status.current_branch.as_ref() == Some(&branch.r#ref);

    let parent_on_trunk = ctx
        .commit_map
        .get(&branch.head_sha)
        .and_then(|c| c.parent_sha.as_ref())
        .map(|p| ctx.trunk_shas.contains(p))
        .unwrap_or(false);

    let can_rename = permission(
        !branch.is_remote && !branch.is_trunk,
        if branch.is_trunk {
            "cannot rename the trunk branch"
        } else {
            "cannot rename a remote branch"
        },
    );
    let can_delete = permission(
        !is_current && !branch.is_trunk,
        if branch.is_trunk {
            "cannot delete the trunk branch"
        } else {
            "cannot delete the current branch"
        },
    );
    let can_squash = permission(
        !branch.is_remote && !branch.is_trunk && !parent_on_trunk,
        if branch.is_trunk {
            "cannot squash the trunk branch"
        } else if branch.is_remote {
            "cannot squash a remote branch"
        } else {
            "nothing to squash onto trunk"
        },
    );
    let can_create_worktree = permission(
        !branch.is_remote && !branch.is_trunk,
        if branch.is_trunk {
            "cannot create a worktree for the trunk branch"
        } else {
            "cannot create a worktree for a remote branch"
        },
    );

    let is_local_non_trunk = !branch.is_remote && !branch.is_trunk;

    let owned_commit_shas = if is_local_non_trunk {
        Some(
            ownership::compute_ownership(
                &branch.head_sha,
                &branch.r#ref,
                &ctx.commit_map,
                &ctx.local_branch_index,
                &ctx.trunk_shas,
            )
            .owned_shas,
        )
    } else {
        None
    };

    let expected_pr_base = if is_local_non_trunk {
        match pr_target::find_base_branch(ctx.repo, &branch.head_sha, &ctx.merged_branches) {
            Ok(base) => base,
            Err(_) => {
                tracing::warn!(branch = %branch.r#ref, "ambiguous pr base, skipping annotation");
                None
            }
        }
    } else {
        None
    };

    let (pull_request, is_merged, has_stale_target, can_recreate_pr) = match ctx.forge {
        Some(state) => {
            let best = forge::find_best_pr(&branch.r#ref, &state.pull_requests).cloned();
            let merged = forge::is_branch_merged(&branch.r#ref, state);
            let stale = best
                .as_ref()
                .map(|pr| forge::has_stale_target(pr, &state.merged_branch_names))
                .unwrap_or(false);
            let recreate = permission(
                forge::can_recreate_pr(&branch.r#ref, &state.pull_requests),
                "an active pull request already covers this branch",
            );
            (best, merged, stale, recreate)
        }
        None => (
            None,
            false,
            false,
            permission(false, "no forge data available"),
        ),
    };

    let worktree = ctx
        .repo
        .worktree_for_branch(&branch.r#ref)
        .filter(|w| w.path != ctx.repo.active_worktree_path)
        .map(|w| WorktreeBadge {
            path: w.path.clone(),
            is_stale: w.is_stale,
            is_dirty: w.is_dirty,
        });

    UiBranch {
        name: branch.r#ref.clone(),
        is_current,
        is_remote: branch.is_remote,
        is_trunk: branch.is_trunk,
        can_rename,
        can_delete,
        can_squash,
        can_create_worktree,
        can_recreate_pr,
        expected_pr_base,
        owned_commit_shas,
        pull_request,
        is_merged,
        has_stale_target,
        worktree,
    }
}

/// Drop leading (oldest) trunk commits that carry neither branches nor
/// spinoffs, keeping at least the newest commit (section 4.4 step 9).
fn trim_trunk_lead(stack: &mut UiStack) {
    while stack.commits.len() > 1 {
        let drop = {
            let first = &stack.commits[0];
            first.branches.is_empty() && first.spinoffs.is_empty()
        };
        if drop {
            stack.commits.remove(0);
        } else {
            break;
        }
    }
}
