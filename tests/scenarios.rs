//! Black-box scenario tests driving the published `stackcore` API end to
//! end, rather than any module's internals. Each test follows a seed
//! scenario through every layer it touches: projection, drag, the rebase
//! pipeline, validators, and ship navigation.

use stackcore::forge::{GitForgeState, PrState, PullRequest};
use stackcore::full_state::{build_full_ui_state, Gesture, GestureOutcome};
use stackcore::model::{Branch, BranchRef, Commit, Repo, Sha, WorkingTreeStatus};
use stackcore::navigator::{navigate_after_ship, NavigationAction, ShipNavigationInput};
use stackcore::projector::project;
use stackcore::rebase::phase::{apply as apply_phase, PhaseEvent, PhaseKind, PhaseState};
use stackcore::rebase::planner::{create_rebase_plan, JobStatus, SessionStatus};
use stackcore::rebase::state_machine::complete_job;
use stackcore::validators::ship::validate_ship;

fn commit(sha: &str, parent: Option<&str>, children: &[&str], time_ms: i64) -> Commit {
    Commit {
        sha: sha.into(),
        parent_sha: parent.map(Sha::new),
        children_sha: children.iter().map(|c| Sha::new(*c)).collect(),
        message: format!("commit {sha}"),
        time_ms,
    }
}

fn branch(r#ref: &str, head: &str, is_trunk: bool) -> Branch {
    Branch {
        r#ref: r#ref.into(),
        head_sha: head.into(),
        is_trunk,
        is_remote: false,
    }
}

fn repo(commits: Vec<Commit>, branches: Vec<Branch>) -> Repo {
    Repo {
        path: "/repo".into(),
        active_worktree_path: "/repo".into(),
        commits,
        branches,
        worktrees: Vec::new(),
        working_tree_status: WorkingTreeStatus::default(),
    }
}

/// S1 + S2 together: a branchless chain feeding into a fork point, projected
/// through the public API.
#[test]
fn ownership_handles_branchless_chains_and_fork_points_together() {
    let r = repo(
        vec![
            commit("a", None, &["b"], 1),
            commit("b", Some("a"), &["c"], 2),
            commit("c", Some("b"), &["d", "e"], 3),
            commit("d", Some("c"), &[], 4),
            commit("e", Some("c"), &[], 5),
        ],
        vec![
            branch("main", "a", true),
            branch("feat1", "d", false),
            branch("feat2", "e", false),
        ],
    );

    let stack = project(&r, None).expect("trunk resolves");

    // S1 shape: "b" is a plain branchless trunk commit, owned by nobody.
    let b = stack.find_commit(&Sha::new("b")).unwrap();
    assert!(b.branches.is_empty());

    // S2 shape: "c" is the fork point, independent and unowned.
    let fork = stack.find_commit(&Sha::new("c")).unwrap();
    assert!(fork.is_independent);
    assert!(fork.branches.is_empty());
    assert_eq!(fork.spinoffs.len(), 2);

    let feat1 = fork.spinoffs.iter().find(|s| s.commits[0].sha == Sha::new("d")).unwrap();
    assert_eq!(feat1.commits[0].branches[0].owned_commit_shas, Some(vec![Sha::new("d")]));
    let feat2 = fork.spinoffs.iter().find(|s| s.commits[0].sha == Sha::new("e")).unwrap();
    assert_eq!(feat2.commits[0].branches[0].owned_commit_shas, Some(vec![Sha::new("e")]));
}

/// S3 + S4: optimistic drag to a stack head, then into an interior commit,
/// applied in sequence against one projected tree.
#[test]
fn optimistic_drag_moves_a_stack_head_then_nests_into_a_spinoff() {
    use stackcore::drag::optimistic_drag;

    let r = repo(
        vec![
            commit("c1", None, &["c2"], 1),
            commit("c2", Some("c1"), &["sp1", "c3"], 2),
            commit("sp1", Some("c2"), &["sp2"], 3),
            commit("sp2", Some("sp1"), &[], 4),
            commit("c3", Some("c2"), &[], 5),
        ],
        vec![branch("main", "c3", true), branch("feat-a", "sp2", false)],
    );
    let stack = project(&r, None).unwrap();

    // S3: drag sp2 over c3 — it moves to the end of the trunk. ("c1" carries
    // no branch or spinoff, so the projector's lead-trim drops it first.)
    let after_drag_3 = optimistic_drag(&stack, &Sha::new("sp2"), &Sha::new("c3")).unwrap();
    let trunk_shas: Vec<&str> = after_drag_3.commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(trunk_shas, vec!["c2", "c3", "sp2"]);
    let c2_after = &after_drag_3.commits[0];
    assert_eq!(c2_after.spinoffs[0].commits.len(), 1);
    assert_eq!(c2_after.spinoffs[0].commits[0].sha, Sha::new("sp1"));

    // S4: on a fresh tree shaped like spec's h1/h2/h3 example, drag h2 over B.
    let r2 = repo(
        vec![
            commit("i", None, &["b"], 1),
            commit("b", Some("i"), &["c"], 2),
            commit("c", Some("b"), &["h1"], 3),
            commit("h1", Some("c"), &["h2"], 4),
            commit("h2", Some("h1"), &["h3"], 5),
            commit("h3", Some("h2"), &[], 6),
        ],
        vec![
            branch("main", "c", true),
            // Keeps "b" from being trimmed as an empty trunk lead so the
            // drag target below resolves to a real node.
            branch("midpoint", "b", false),
            branch("feat-h", "h3", false),
        ],
    );
    let stack2 = project(&r2, None).unwrap();
    let after_drag_4 = optimistic_drag(&stack2, &Sha::new("h2"), &Sha::new("b")).unwrap();
    let b_node = after_drag_4.commits.iter().find(|c| c.sha == Sha::new("b")).unwrap();
    assert_eq!(
        b_node.spinoffs[0].commits.iter().map(|c| c.sha.as_str()).collect::<Vec<_>>(),
        vec!["h2", "h3"]
    );
    let c_node = after_drag_4.commits.iter().find(|c| c.sha == Sha::new("c")).unwrap();
    assert_eq!(c_node.spinoffs[0].commits.len(), 1);
    assert_eq!(c_node.spinoffs[0].commits[0].sha, Sha::new("h1"));
}

/// S5, driven through the actual rebase pipeline (planner + state machine +
/// phase) rather than the phase machine alone.
#[test]
fn rebase_pipeline_runs_a_job_through_conflict_to_completion() {
    let r = repo(
        vec![
            commit("a", None, &["b", "d"], 1),
            commit("b", Some("a"), &["c"], 2),
            commit("c", Some("b"), &[], 3),
            commit("d", Some("a"), &[], 4),
        ],
        vec![branch("main", "a", true), branch("feature", "c", false)],
    );

    let intent = stackcore::rebase::intent::build_intent(&r, &Sha::new("c"), &Sha::new("d"), 0, || "intent-1".into())
        .expect("drag resolves to an intent");

    let mut job_ids = 0;
    let plan = create_rebase_plan(&r, intent, || {
        job_ids += 1;
        format!("job-{job_ids}")
    })
    .expect("trunk resolves, plan builds");
    assert_eq!(plan.state.session.status, SessionStatus::Pending);

    let mut phase = PhaseState::idle(0, "corr-0".into());
    phase = apply_phase(&phase, PhaseEvent::SubmitIntent, 1, || String::new()).unwrap();
    phase = apply_phase(&phase, PhaseEvent::ConfirmIntent, 2, || String::new()).unwrap();
    assert_eq!(phase.kind, PhaseKind::Queued);

    phase = apply_phase(&phase, PhaseEvent::JobStarted, 3, || String::new()).unwrap();
    assert_eq!(phase.kind, PhaseKind::Executing);

    let job_id = &plan.state.session.jobs[0];
    let job = &plan.state.jobs_by_id[job_id];
    let result = complete_job(job, Sha::new("c-rebased"), 4, vec![(Sha::new("c"), Sha::new("c-rebased"))]);
    assert_eq!(result.job.status, JobStatus::Completed);
    assert_eq!(result.stack_mutation.new_base_sha, Sha::new("d"));

    phase = apply_phase(&phase, PhaseEvent::AllJobsComplete, 5, || String::new()).unwrap();
    assert_eq!(phase.kind, PhaseKind::Finalizing);
    phase = apply_phase(&phase, PhaseEvent::FinalizeComplete, 6, || String::new()).unwrap();
    assert_eq!(phase.kind, PhaseKind::Completed);

    let before_clear = phase.correlation_id.clone();
    phase = apply_phase(&phase, PhaseEvent::ClearCompleted, 7, || "corr-1".into()).unwrap();
    assert_eq!(phase.kind, PhaseKind::Idle);
    assert_ne!(phase.correlation_id, before_clear);
}

/// S6, with ship validation gating navigation: a mergeable open PR must pass
/// before `navigate_after_ship` decides where the user lands.
#[test]
fn ship_validates_then_navigates_to_parent_branch() {
    let forge = GitForgeState {
        pull_requests: vec![PullRequest {
            number: 1,
            head_ref_name: "feature-2".into(),
            base_ref_name: "feature-1".into(),
            state: PrState::Open,
            mergeable: true,
            created_at: Some("2024-01-01".into()),
        }],
        merged_branch_names: Vec::new(),
    };

    validate_ship(
        &BranchRef::new("feature-2"),
        &BranchRef::new("feature-1"),
        &BranchRef::new("main"),
        &forge,
        Some(true),
    )
    .expect("open, mergeable PR passes validation");

    let result = navigate_after_ship(&ShipNavigationInput {
        shipped_branch: "feature-2".into(),
        pr_target_branch: "feature-1".into(),
        user_current_branch: Some("feature-2".into()),
        was_detached: false,
        has_children: false,
        is_working_tree_clean: true,
        trunk: "main".into(),
    });

    assert_eq!(result.action, NavigationAction::SwitchedToParent);
    assert_eq!(result.target_branch, Some(BranchRef::new("feature-1")));
    assert!(!result.needs_rebase);
}

/// The full UI state assembler never panics on a degraded (no-trunk)
/// snapshot, and reports idle working-tree decoration without a session.
#[test]
fn full_ui_state_degrades_gracefully_without_a_trunk() {
    let r = repo(vec![commit("a", None, &[], 0)], vec![]);
    let state = build_full_ui_state(&r, None, None, None);
    assert!(state.stack.is_none());
    assert!(state.rebase.is_none());
}

/// A drag gesture dispatched through the top-level gesture API builds the
/// same intent `build_intent` would, end to end.
#[test]
fn drag_gesture_through_full_state_builds_an_intent_for_the_dragged_branch() {
    let r = repo(
        vec![commit("a", None, &["b"], 0), commit("b", Some("a"), &[], 1)],
        vec![branch("main", "a", true), branch("feature", "b", false)],
    );
    let phase = PhaseState::idle(0, "corr".into());
    let forge = GitForgeState::default();

    let outcome = stackcore::full_state::apply_gesture(
        Gesture::Drag { head_sha: Sha::new("b"), target_base_sha: Sha::new("a") },
        &r,
        &phase,
        &forge,
        0,
        || "intent-1".into(),
    )
    .unwrap();

    match outcome {
        GestureOutcome::DragIntentBuilt(intent) => {
            assert_eq!(intent.targets[0].node.branch, BranchRef::new("feature"));
        }
        other => panic!("expected DragIntentBuilt, got {other:?}"),
    }
}
