//! drag
//!
//! Optimistic, pure reshape of a projected `UiStack` for a drag-over-commit
//! gesture (section 4.5). Never touches the repository; the caller commits
//! to a real rebase only after the user confirms.

use crate::model::Sha;
use crate::projector::{UiCommit, UiStack};

/// Reshape `stack` as if `dragging_sha` were dropped onto `over_sha`.
/// Returns `None` on any failure to locate either sha, or a no-op drag —
/// never panics (section 4.5 step 6).
pub fn optimistic_drag(stack: &UiStack, dragging_sha: &Sha, over_sha: &Sha) -> Option<UiStack> {
    if dragging_sha == over_sha {
        return None;
    }
    let mut root = stack.clone();
    let (chain, _old_base) = extract_dragging(&mut root, dragging_sha)?;
    match attach(&mut root, over_sha, chain) {
        Ok(()) => Some(root),
        Err(_) => None,
    }
}

/// Remove `dragging_sha` and every later commit in its parent stack
/// (with their spinoffs intact), pruning the parent spinoff if it goes
/// empty. Returns the removed chain and the sha the chain used to sit on.
fn extract_dragging(stack: &mut UiStack, dragging_sha: &Sha) -> Option<(Vec<UiCommit>, Sha)> {
    if let Some(idx) = stack.commits.iter().position(|c| &c.sha == dragging_sha) {
        let base = if idx == 0 {
            stack.base_sha.clone()
        } else {
            stack.commits[idx - 1].sha.clone()
        };
        let drained = stack.commits.split_off(idx);
        return Some((drained, base));
    }

    for commit in stack.commits.iter_mut() {
        for i in (0..commit.spinoffs.len()).rev() {
            if let Some(found) = extract_dragging(&mut commit.spinoffs[i], dragging_sha) {
                if commit.spinoffs[i].commits.is_empty() {
                    commit.spinoffs.remove(i);
                }
                return Some(found);
            }
        }
    }
    None
}

/// Attach `chain` at `over_sha`: append it in place if `over_sha` heads its
/// stack, otherwise nest it as a new spinoff on that commit. Passes the
/// chain back on failure so the caller can decide there was nowhere to go.
fn attach(stack: &mut UiStack, over_sha: &Sha, chain: Vec<UiCommit>) -> Result<(), Vec<UiCommit>> {
    if let Some(idx) = stack.commits.iter().position(|c| &c.sha == over_sha) {
        if idx == stack.commits.len() - 1 {
            stack.commits.extend(chain);
        } else {
            let base_sha = stack.commits[idx].sha.clone();
            stack.commits[idx].spinoffs.push(UiStack {
                commits: chain,
                is_trunk: false,
                can_rebase_to_trunk: false,
                is_directly_off_trunk: false,
                base_sha,
            });
        }
        return Ok(());
    }

    let mut chain = chain;
    for commit in stack.commits.iter_mut() {
        for spinoff in commit.spinoffs.iter_mut() {
            match attach(spinoff, over_sha, chain) {
                Ok(()) => return Ok(()),
                Err(returned) => chain = returned,
            }
        }
    }
    Err(chain)
}

/// Whether `candidate_sha` sits inside the subtree that would move if
/// `dragging_sha` were dropped: the dragging commit, its later siblings in
/// the same parent stack, and every spinoff beneath them. The UI uses this
/// to refuse drops onto the thing being dragged.
pub fn is_inside_dragging_stack(stack: &UiStack, dragging_sha: &Sha, candidate_sha: &Sha) -> bool {
    find_dragging_shas(stack, dragging_sha)
        .map(|shas| shas.contains(candidate_sha))
        .unwrap_or(false)
}

fn find_dragging_shas(stack: &UiStack, dragging_sha: &Sha) -> Option<Vec<Sha>> {
    if let Some(idx) = stack.commits.iter().position(|c| &c.sha == dragging_sha) {
        let mut out = Vec::new();
        for commit in &stack.commits[idx..] {
            collect_with_spinoffs(commit, &mut out);
        }
        return Some(out);
    }
    for commit in &stack.commits {
        for spinoff in &commit.spinoffs {
            if let Some(found) = find_dragging_shas(spinoff, dragging_sha) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_with_spinoffs(commit: &UiCommit, out: &mut Vec<Sha>) {
    out.push(commit.sha.clone());
    for spinoff in &commit.spinoffs {
        for c in &spinoff.commits {
            collect_with_spinoffs(c, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::RebaseStatus;

    fn leaf(sha: &str, time_ms: i64) -> UiCommit {
        UiCommit {
            sha: Sha::new(sha),
            name: format!("commit {sha}"),
            timestamp_ms: time_ms,
            is_current: false,
            is_independent: false,
            rebase_status: RebaseStatus::Idle,
            spinoffs: Vec::new(),
            branches: Vec::new(),
        }
    }

    fn stack(commits: Vec<UiCommit>, is_trunk: bool, base_sha: &str) -> UiStack {
        UiStack {
            commits,
            is_trunk,
            can_rebase_to_trunk: false,
            is_directly_off_trunk: !is_trunk,
            base_sha: Sha::new(base_sha),
        }
    }

    /// S3: optimistic drag to head.
    #[test]
    fn drag_to_stack_head_appends_after_it() {
        let mut c2 = leaf("c2", 2);
        let mut sp2 = leaf("sp2", 20);
        sp2.is_current = true;
        c2.spinoffs.push(stack(vec![leaf("sp1", 10), sp2], false, "c2"));
        let trunk = stack(vec![leaf("c1", 1), c2, leaf("c3", 3)], true, "c1");

        let result = optimistic_drag(&trunk, &Sha::new("sp2"), &Sha::new("c3")).unwrap();

        assert_eq!(
            result.commits.iter().map(|c| c.sha.as_str()).collect::<Vec<_>>(),
            vec!["c1", "c2", "c3", "sp2"]
        );
        let c2_after = &result.commits[1];
        assert_eq!(c2_after.spinoffs.len(), 1);
        assert_eq!(c2_after.spinoffs[0].commits.len(), 1);
        assert_eq!(c2_after.spinoffs[0].commits[0].sha, Sha::new("sp1"));
    }

    /// S4: optimistic drag into spinoff.
    #[test]
    fn drag_into_interior_commit_creates_spinoff() {
        let mut c = leaf("C", 3);
        c.spinoffs.push(stack(
            vec![leaf("h1", 10), leaf("h2", 20), leaf("h3", 30)],
            false,
            "C",
        ));
        let trunk = stack(vec![leaf("I", 1), leaf("B", 2), c], true, "I");

        let result = optimistic_drag(&trunk, &Sha::new("h2"), &Sha::new("B")).unwrap();

        let b = &result.commits[1];
        assert_eq!(b.spinoffs.len(), 1);
        assert_eq!(
            b.spinoffs[0].commits.iter().map(|c| c.sha.as_str()).collect::<Vec<_>>(),
            vec!["h2", "h3"]
        );
        let c_after = &result.commits[2];
        assert_eq!(c_after.spinoffs.len(), 1);
        assert_eq!(c_after.spinoffs[0].commits.len(), 1);
        assert_eq!(c_after.spinoffs[0].commits[0].sha, Sha::new("h1"));
    }

    #[test]
    fn dragging_onto_self_is_a_no_op_failure() {
        let trunk = stack(vec![leaf("a", 1)], true, "a");
        assert!(optimistic_drag(&trunk, &Sha::new("a"), &Sha::new("a")).is_none());
    }

    #[test]
    fn dragging_unknown_sha_returns_none() {
        let trunk = stack(vec![leaf("a", 1)], true, "a");
        assert!(optimistic_drag(&trunk, &Sha::new("ghost"), &Sha::new("a")).is_none());
    }

    #[test]
    fn dropping_onto_own_dragged_subtree_fails() {
        let mut b = leaf("b", 2);
        b.spinoffs.push(stack(vec![leaf("sp", 20)], false, "b"));
        let trunk = stack(vec![leaf("a", 1), b], true, "a");
        // "b" drags away along with its spinoff; dropping onto "sp" (now
        // gone from the tree) must fail rather than silently do nothing.
        assert!(optimistic_drag(&trunk, &Sha::new("b"), &Sha::new("sp")).is_none());
    }

    #[test]
    fn is_inside_dragging_stack_covers_later_siblings_and_their_spinoffs() {
        let mut b = leaf("b", 2);
        b.spinoffs.push(stack(vec![leaf("sp", 20)], false, "b"));
        let trunk = stack(vec![leaf("a", 1), b, leaf("c", 3)], true, "a");

        assert!(is_inside_dragging_stack(&trunk, &Sha::new("b"), &Sha::new("sp")));
        assert!(is_inside_dragging_stack(&trunk, &Sha::new("b"), &Sha::new("c")));
        assert!(!is_inside_dragging_stack(&trunk, &Sha::new("b"), &Sha::new("a")));
    }
}
