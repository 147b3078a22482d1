//! # vrp-core
//!
//! Metaheuristic engine for a capacitated, time-windowed, multi-depot
//! vehicle routing problem with pickup-and-delivery, skills, driver breaks,
//! and priorities. Given an [`Input`](models::Input) (jobs, vehicles,
//! per-profile travel matrices), the solver produces a [`Solution`]
//! minimizing a lexicographic objective: unassigned priority, assigned
//! count, vehicles used, then travel + fixed + task cost.
//!
//! ## Pipeline
//!
//! 1. [`compatibility`] precomputes vehicle↔job and vehicle↔vehicle
//!    feasibility relations once per solve.
//! 2. [`construction`] builds an initial [`routes`] assignment per seed
//!    with regret-weighted cheapest insertion.
//! 3. [`ls_engine`] runs best-improvement local search over the
//!    [`operators`] catalogue, interleaved with ruin-and-recreate, tracking
//!    caches in [`solution_state`].
//! 4. [`solution`] assembles the final routes into a [`Solution`].
//!
//! [`io`] holds the JSON input/output surface and [`error`] the error
//! taxonomy; neither is part of the core algorithm. [`cli`] is the
//! flag/exploration-level surface for the `solver` binary (`src/main.rs`).

pub mod amount;
pub mod cli;
pub mod compatibility;
pub mod construction;
pub mod error;
pub mod eval;
pub mod insertion;
pub mod io;
pub mod ls_engine;
pub mod models;
pub mod operators;
pub mod routes;
pub mod solution;
pub mod solution_state;

pub use error::{ErrorKind, VrpError};
pub use eval::{Eval, NO_EVAL};
pub use solution::Solution;
