//! Incremental per-vehicle route data structures (spec.md §1, "the hardest
//! engineering in the repository").
//!
//! [`RawRoute`] tracks the ordered step sequence and running load so
//! capacity can be checked without replaying the whole route; [`TWRoute`]
//! layers earliest/latest arrival propagation on top so time-window
//! feasibility can be checked the same way. Both operate on ranks into
//! [`crate::models::Input::jobs`] plus break indices, never owning a
//! [`crate::models::Job`] or [`crate::models::Vehicle`] directly — this
//! mirrors the teacher's `Route` holding `customer_id`s rather than
//! `Customer` values, generalized to a mixed job/break step sequence.

pub(crate) mod raw_route;
mod tw_route;

pub use raw_route::RawRoute;
pub use tw_route::TWRoute;

/// One stop in a route: either a job (by rank into `Input::jobs`) or a
/// vehicle break (by index into `Vehicle::breaks`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteStep {
    Job(usize),
    Break(usize),
}

impl RouteStep {
    pub fn is_job(&self) -> bool {
        matches!(self, RouteStep::Job(_))
    }

    pub fn is_break(&self) -> bool {
        matches!(self, RouteStep::Break(_))
    }

    pub fn job_rank(&self) -> Option<usize> {
        match self {
            RouteStep::Job(r) => Some(*r),
            RouteStep::Break(_) => None,
        }
    }

    pub fn break_index(&self) -> Option<usize> {
        match self {
            RouteStep::Break(i) => Some(*i),
            RouteStep::Job(_) => None,
        }
    }
}
