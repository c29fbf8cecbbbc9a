//! navigator
//!
//! `ShipItNavigator` (section 4.14): once a branch ships, decide where the
//! user's checkout should land. Pure function of the pre-ship checkout
//! state — it never touches a working tree itself.

use crate::model::BranchRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipNavigationInput {
    pub shipped_branch: BranchRef,
    pub pr_target_branch: BranchRef,
    pub user_current_branch: Option<BranchRef>,
    pub was_detached: bool,
    pub has_children: bool,
    pub is_working_tree_clean: bool,
    pub trunk: BranchRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Stayed,
    SwitchedToMain,
    SwitchedToParent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipNavigationResult {
    pub action: NavigationAction,
    pub target_branch: Option<BranchRef>,
    pub message: String,
    pub needs_rebase: bool,
}

pub fn navigate_after_ship(input: &ShipNavigationInput) -> ShipNavigationResult {
    let was_on_shipped_branch =
        input.was_detached || input.user_current_branch.as_ref() == Some(&input.shipped_branch);

    if !was_on_shipped_branch && input.user_current_branch.is_some() {
        return ShipNavigationResult {
            action: NavigationAction::Stayed,
            target_branch: None,
            message: format!("{} shipped; staying on your current branch", input.shipped_branch),
            needs_rebase: input.has_children,
        };
    }

    let base_is_trunk = input.pr_target_branch == input.trunk;
    let action = if base_is_trunk {
        NavigationAction::SwitchedToMain
    } else {
        NavigationAction::SwitchedToParent
    };

    let mut message = if base_is_trunk {
        format!("{} shipped; switched to {}", input.shipped_branch, input.pr_target_branch)
    } else {
        format!("{} shipped; switched to its parent, {}", input.shipped_branch, input.pr_target_branch)
    };
    if !input.is_working_tree_clean {
        message.push_str(" (uncommitted changes carried over)");
    }

    ShipNavigationResult {
        action,
        target_branch: Some(input.pr_target_branch.clone()),
        message,
        needs_rebase: input.has_children,
    }
}
