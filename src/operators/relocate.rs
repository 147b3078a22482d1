//! `Relocate` / `IntraRelocate` (spec.md §4.7): move one single job from a
//! source route to a target route (or another spot in the same route).
//!
//! Grounded on `local_search/relocate.rs`'s removal-cost + insertion-cost
//! delta, generalized from flat `Vec<usize>` routes to `TWRoute` ranks with
//! capacity/TW feasibility via [`crate::insertion::compute_best_insertion_single`].

use crate::eval::{Eval, NO_EVAL};
use crate::insertion::compute_best_insertion_single;
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Relocates the job at `source_rank` of route `source` into route `target`
/// (possibly `source == target`, which realizes `IntraRelocate`).
pub struct RelocateOp {
    source: usize,
    source_rank: usize,
    target: usize,
    job_rank: usize,
    best_target_rank: usize,
    gain: Eval,
}

impl RelocateOp {
    pub fn new(source: usize, source_rank: usize, target: usize) -> Self {
        Self {
            source,
            source_rank,
            target,
            job_rank: 0,
            best_target_rank: 0,
            gain: NO_EVAL,
        }
    }

    fn kind_for(&self) -> OperatorKind {
        if self.source == self.target {
            OperatorKind::IntraRelocate
        } else {
            OperatorKind::Relocate
        }
    }
}

impl LsOperator for RelocateOp {
    fn kind(&self) -> OperatorKind {
        self.kind_for()
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.node_gain(self.source, self.source_rank)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        let route = &routes[self.source];
        match route.steps().get(self.source_rank) {
            Some(RouteStep::Job(rank)) => {
                self.job_rank = *rank;
                matches!(input.jobs()[*rank].job_type(), JobType::Single)
            }
            _ => false,
        }
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let removal_gain = state.node_gain(self.source, self.source_rank);
        if removal_gain.is_no_eval() {
            self.gain = NO_EVAL;
            return;
        }

        if self.source == self.target {
            let mut without = routes[self.source].clone();
            without.remove(input, &input.vehicles()[without.vehicle()], self.source_rank);
            let best = compute_best_insertion_single(input, state, self.job_rank, self.target, &without);
            self.best_target_rank = best.rank;
            self.gain = if best.eval.is_no_eval() {
                NO_EVAL
            } else {
                removal_gain - best.eval
            };
            return;
        }

        let best = compute_best_insertion_single(input, state, self.job_rank, self.target, &routes[self.target]);
        self.best_target_rank = best.rank;
        self.gain = if best.eval.is_no_eval() {
            NO_EVAL
        } else {
            removal_gain - best.eval
        };
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        if self.source == self.target {
            let vehicle_idx = routes[self.source].vehicle();
            let vehicle = &input.vehicles()[vehicle_idx];
            routes[self.source].remove(input, vehicle, self.source_rank);
            let vehicle = &input.vehicles()[routes[self.source].vehicle()];
            routes[self.source].add(input, vehicle, RouteStep::Job(self.job_rank), self.best_target_rank);
            return;
        }
        let source_vehicle_idx = routes[self.source].vehicle();
        let source_vehicle = &input.vehicles()[source_vehicle_idx];
        routes[self.source].remove(input, source_vehicle, self.source_rank);
        let target_vehicle_idx = routes[self.target].vehicle();
        let target_vehicle = &input.vehicles()[target_vehicle_idx];
        routes[self.target].add(input, target_vehicle, RouteStep::Job(self.job_rank), self.best_target_rank);
    }

    fn addition_candidates(&self) -> Vec<usize> {
        vec![self.source, self.target]
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::compatibility::Compatibility;
    use crate::models::{Job, Matrix, ProfileMatrices, Vehicle};
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(4, vec![
            0, 10, 10, 100,
            10, 0, 5, 100,
            10, 5, 0, 100,
            100, 100, 100, 0,
        ]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
            Job::single(3, 3, Amount::zero(1), Amount::zero(1)),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10])).with_start(0).with_end(0),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_relocate_between_routes_finds_gain() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(2), 1);
        let r1 = TWRoute::new(1, 1);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = RelocateOp::new(0, 1, 1);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
