//! stackcore
//!
//! The pure, I/O-free core of a stacked-diffs Git client: a commit DAG
//! model, ownership and fork-point detection, stack projection, optimistic
//! drag reshaping, rebase planning and execution, validators, PR
//! base-branch resolution, and a read-only forge join.
//!
//! Nothing in this crate touches a filesystem, a socket, or a clock other
//! than the `now_ms` values callers pass in. An orchestrator binary (see
//! `src/bin/stackcore.rs`) owns the Git executor, the forge client, and
//! all I/O; this crate only ever derives new values from a `Repo`
//! snapshot it's handed.

pub mod analyzer;
pub mod drag;
pub mod error;
pub mod forge;
pub mod full_state;
pub mod model;
pub mod navigator;
pub mod ownership;
pub mod pr_target;
pub mod projector;
pub mod rebase;
pub mod trunk;
pub mod validators;
