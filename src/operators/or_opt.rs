//! `OrOpt` / `IntraOrOpt` (spec.md §4.7): move two consecutive single jobs
//! (an edge) from a source route to a target route, optionally reversed.
//!
//! Grounded on `local_search/or_opt.rs`'s segment-relocation scan,
//! specialized to the fixed segment length 2 the spec names ("an edge")
//! rather than the teacher's 1..=3 sweep.

use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Moves the two-step edge `source[s_rank..s_rank+2]` into route `target`
/// at `best_target_rank` (found by `compute_gain`), optionally reversed.
pub struct OrOptOp {
    source: usize,
    s_rank: usize,
    target: usize,
    reverse: bool,
    job_a: usize,
    job_b: usize,
    best_target_rank: usize,
    gain: Eval,
}

impl OrOptOp {
    pub fn new(source: usize, s_rank: usize, target: usize, reverse: bool) -> Self {
        Self {
            source,
            s_rank,
            target,
            reverse,
            job_a: 0,
            job_b: 0,
            best_target_rank: 0,
            gain: NO_EVAL,
        }
    }

    fn kind_for(&self) -> OperatorKind {
        if self.source == self.target {
            OperatorKind::IntraOrOpt
        } else {
            OperatorKind::OrOpt
        }
    }

    fn insertion_order(&self) -> [usize; 2] {
        if self.reverse {
            [self.job_b, self.job_a]
        } else {
            [self.job_a, self.job_b]
        }
    }
}

impl LsOperator for OrOptOp {
    fn kind(&self) -> OperatorKind {
        self.kind_for()
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.edge_gain(self.source, self.s_rank)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        let route = &routes[self.source];
        if self.s_rank + 1 >= route.size() {
            return false;
        }
        match (
            route.steps().get(self.s_rank),
            route.steps().get(self.s_rank + 1),
        ) {
            (Some(RouteStep::Job(a)), Some(RouteStep::Job(b))) => {
                self.job_a = *a;
                self.job_b = *b;
                matches!(input.jobs()[*a].job_type(), JobType::Single)
                    && matches!(input.jobs()[*b].job_type(), JobType::Single)
            }
            _ => false,
        }
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let removal_gain = state.edge_gain(self.source, self.s_rank);
        if removal_gain.is_no_eval() {
            self.gain = NO_EVAL;
            return;
        }

        let mut without = routes[self.source].clone();
        let vehicle = &input.vehicles()[without.vehicle()];
        without.remove(input, vehicle, self.s_rank + 1);
        without.remove(input, vehicle, self.s_rank);

        let base_route = if self.source == self.target {
            without.clone()
        } else {
            routes[self.target].clone()
        };

        let order = self.insertion_order();
        let target_vehicle = &input.vehicles()[base_route.vehicle()];
        let mut best_eval = NO_EVAL;
        let mut best_rank = 0;
        for rank in 0..=base_route.size() {
            let mut candidate = base_route.clone();
            if !candidate.add(input, target_vehicle, RouteStep::Job(order[0]), rank) {
                continue;
            }
            if !candidate.add(input, target_vehicle, RouteStep::Job(order[1]), rank + 1) {
                continue;
            }
            let before = crate::solution_state::route_eval_with(input, target_vehicle, base_route.steps());
            let after = crate::solution_state::route_eval_with(input, target_vehicle, candidate.steps());
            if !after.within_vehicle_range(target_vehicle) {
                continue;
            }
            let added = after - before;
            if added.improves_on(best_eval) {
                best_eval = added;
                best_rank = rank;
            }
        }

        self.best_target_rank = best_rank;
        self.gain = if best_eval.is_no_eval() {
            NO_EVAL
        } else {
            removal_gain - best_eval
        };
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        let vehicle_idx = routes[self.source].vehicle();
        let vehicle = &input.vehicles()[vehicle_idx];
        routes[self.source].remove(input, vehicle, self.s_rank + 1);
        routes[self.source].remove(input, vehicle, self.s_rank);

        let target_vehicle_idx = routes[self.target].vehicle();
        let target_vehicle = &input.vehicles()[target_vehicle_idx];
        let order = self.insertion_order();
        routes[self.target].add(input, target_vehicle, RouteStep::Job(order[0]), self.best_target_rank);
        routes[self.target].add(input, target_vehicle, RouteStep::Job(order[1]), self.best_target_rank + 1);
    }

    fn addition_candidates(&self) -> Vec<usize> {
        self.update_candidates()
    }

    fn update_candidates(&self) -> Vec<usize> {
        if self.source == self.target {
            vec![self.source]
        } else {
            vec![self.source, self.target]
        }
    }

    fn required_unassigned(&self) -> Vec<usize> {
        Vec::new()
    }
}
