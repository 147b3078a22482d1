//! Local-search operator catalogue (spec.md §4.7).
//!
//! Re-architected from the teacher's free-function-per-move style
//! (`local_search::{relocate_improve, exchange_improve, ...}`) into a trait
//! object per (source, target) pair, per the redesign note on deep operator
//! inheritance: each move type implements [`LsOperator`] and is stored boxed
//! in the engine's `best_ops[v][v']` table.

mod exchange;
mod or_opt;
mod pd_shift;
mod priority_replace;
mod relocate;
mod route_exchange;
mod route_split;
mod swap_star;
mod tsp_fix;
mod two_opt;
mod unassigned_exchange;

pub use exchange::ExchangeOp;
pub use or_opt::OrOptOp;
pub use pd_shift::PdShiftOp;
pub use priority_replace::PriorityReplaceOp;
pub use relocate::RelocateOp;
pub use route_exchange::RouteExchangeOp;
pub use route_split::RouteSplitOp;
pub use swap_star::SwapStarOp;
pub use tsp_fix::TspFixOp;
pub use two_opt::TwoOptOp;
pub use unassigned_exchange::UnassignedExchangeOp;

use crate::eval::Eval;
use crate::models::Input;
use crate::routes::TWRoute;
use crate::solution_state::SolutionState;

/// Which catalogue entry a boxed [`LsOperator`] implements (spec.md §4.7
/// table). Carried alongside the trait object for logging/telemetry; the
/// move logic itself lives entirely behind the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    UnassignedExchange,
    CrossExchange,
    MixedExchange,
    TwoOpt,
    ReverseTwoOpt,
    Relocate,
    OrOpt,
    PDShift,
    RouteExchange,
    SwapStar,
    RouteSplit,
    PriorityReplace,
    IntraExchange,
    IntraCrossExchange,
    IntraMixedExchange,
    IntraRelocate,
    IntraOrOpt,
    IntraTwoOpt,
    TSPFix,
}

/// Common interface every catalogue move implements (spec.md §4.7).
///
/// Lifecycle within one LS step: `gain_upper_bound` prunes cheaply before
/// `is_valid` runs the full feasibility check; `compute_gain` then picks
/// whichever variant (e.g. reversed vs. not) gives the best valid gain and
/// caches it for `gain()`. `apply` is only ever called after both
/// `is_valid` and `compute_gain` succeeded.
pub trait LsOperator {
    fn kind(&self) -> OperatorKind;

    /// A cheap, possibly-loose upper bound on this move's gain, used to
    /// skip enumerating moves that can't possibly beat the current best.
    fn gain_upper_bound(&self, input: &Input, state: &SolutionState) -> Eval;

    /// Full feasibility check: capacity, time windows, vehicle range,
    /// skills. Must be called before `compute_gain`/`apply`.
    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool;

    /// Selects the best-gain variant and stores it for `gain()`.
    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]);

    /// The gain computed by the most recent `compute_gain` call.
    fn gain(&self) -> Eval;

    /// Mutates `routes` to perform the move. Callers must refresh
    /// `SolutionState` for every vehicle in [`LsOperator::update_candidates`]
    /// afterward.
    fn apply(&self, input: &Input, routes: &mut [TWRoute], state: &mut SolutionState);

    /// Vehicles whose unassigned-job retry list should be attempted again
    /// after this move (typically the routes the move touched).
    fn addition_candidates(&self) -> Vec<usize>;

    /// Vehicles whose `SolutionState` caches must be refreshed after apply.
    fn update_candidates(&self) -> Vec<usize>;

    /// Unassigned job ranks this move requires still be present at apply
    /// time (e.g. `UnassignedExchange`'s `u`); empty for moves that only
    /// rearrange already-assigned jobs.
    fn required_unassigned(&self) -> Vec<usize>;
}

/// Move selection tie-break key for one LS step (spec.md §4.7): applied
/// globally best move breaks ties by `(priority_gain desc, removal_count
/// asc, gain desc)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MoveRank {
    pub priority_gain: std::cmp::Reverse<u32>,
    pub removal_count: usize,
    pub gain: std::cmp::Reverse<Eval>,
}

impl MoveRank {
    pub fn new(priority_gain: u32, removal_count: usize, gain: Eval) -> Self {
        Self {
            priority_gain: std::cmp::Reverse(priority_gain),
            removal_count,
            gain: std::cmp::Reverse(gain),
        }
    }
}
