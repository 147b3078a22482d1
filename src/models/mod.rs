//! Domain model types for vehicle routing problems.
//!
//! Provides the frozen abstractions the solver operates on: [`Job`]s (single,
//! pickup, or delivery tasks) with time windows and capacity amounts,
//! [`Vehicle`]s with capacity, skills, breaks and cost parameters, per-profile
//! travel [`Matrix`]es, and the [`Input`] that bundles everything immutably
//! for one solve.
//!

mod input;
mod job;
mod matrix;
pub mod time_window;
mod vehicle;

pub use input::Input;
pub use job::{Job, JobType};
pub use matrix::{Matrix, ProfileMatrices};
pub use time_window::TimeWindow;
pub use vehicle::{Break, Vehicle, VehicleCosts, VehicleStep};
