//! rebase
//!
//! Everything involved in turning a drag gesture into an executed rebase:
//! intent construction, planning, execution bookkeeping, the user-visible
//! phase machine, and the pre-execution DAG preview.

pub mod intent;
pub mod phase;
pub mod planner;
pub mod projection;
pub mod state_machine;

pub use intent::{build_intent, RebaseIntent, RebaseTarget, StackNodeState};
pub use phase::{apply as apply_phase_event, InvalidTransition, PhaseEvent, PhaseKind, PhaseState};
pub use planner::{create_rebase_plan, create_rebase_session, JobId, RebasePlan, RebaseState, SessionStatus};
