//! `PDShift` (spec.md §4.7): move a whole pickup+delivery pair from a
//! source route into a target route as one joint insertion.
//!
//! Grounded on [`crate::operators::relocate::RelocateOp`]'s removal +
//! reinsertion shape, using [`crate::insertion::compute_best_insertion_pd`]
//! in place of the single-job search since the pair must move together.

use crate::eval::{Eval, NO_EVAL};
use crate::insertion::compute_best_insertion_pd;
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Moves the pickup at `pickup_step_rank` of `source` (and its matching
/// delivery, found via `state.matching_delivery_rank`) into `target`.
pub struct PdShiftOp {
    source: usize,
    pickup_step_rank: usize,
    target: usize,
    pickup_job: usize,
    delivery_step_rank: usize,
    delivery_job: usize,
    best_pickup_rank: usize,
    best_delivery_rank: usize,
    gain: Eval,
}

impl PdShiftOp {
    pub fn new(source: usize, pickup_step_rank: usize, target: usize) -> Self {
        Self {
            source,
            pickup_step_rank,
            target,
            pickup_job: 0,
            delivery_step_rank: 0,
            delivery_job: 0,
            best_pickup_rank: 0,
            best_delivery_rank: 0,
            gain: NO_EVAL,
        }
    }
}

impl LsOperator for PdShiftOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::PDShift
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.pd_gain(self.source, self.pickup_step_rank)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        if self.source == self.target {
            return false;
        }
        let route = &routes[self.source];
        match route.steps().get(self.pickup_step_rank) {
            Some(RouteStep::Job(rank)) if matches!(input.jobs()[*rank].job_type(), JobType::Pickup) => {
                self.pickup_job = *rank;
            }
            _ => return false,
        }
        match route
            .steps()
            .iter()
            .position(|s| matches!(s, RouteStep::Job(r) if *r == self.pickup_job + 1))
        {
            Some(rank) => {
                self.delivery_step_rank = rank;
                self.delivery_job = self.pickup_job + 1;
                matches!(input.jobs()[self.delivery_job].job_type(), JobType::Delivery)
            }
            None => false,
        }
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let removal_gain = state.pd_gain(self.source, self.pickup_step_rank);
        if removal_gain.is_no_eval() {
            self.gain = NO_EVAL;
            return;
        }
        let best = compute_best_insertion_pd(
            input,
            state,
            self.pickup_job,
            self.target,
            &routes[self.target],
            removal_gain,
        );
        self.best_pickup_rank = best.pickup_rank;
        self.best_delivery_rank = best.delivery_rank;
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
        let source_vehicle_idx = routes[self.source].vehicle();
        let source_vehicle = &input.vehicles()[source_vehicle_idx];
        let hi = self.delivery_step_rank.max(self.pickup_step_rank);
        let lo = self.delivery_step_rank.min(self.pickup_step_rank);
        routes[self.source].remove(input, source_vehicle, hi);
        routes[self.source].remove(input, source_vehicle, lo);

        let target_vehicle_idx = routes[self.target].vehicle();
        let target_vehicle = &input.vehicles()[target_vehicle_idx];
        routes[self.target].add(
            input,
            target_vehicle,
            RouteStep::Job(self.pickup_job),
            self.best_pickup_rank,
        );
        routes[self.target].add(
            input,
            target_vehicle,
            RouteStep::Job(self.delivery_job),
            self.best_delivery_rank,
        );
    }

    fn addition_candidates(&self) -> Vec<usize> {
        vec![self.source, self.target]
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.source, self.target]
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
        let durations = Matrix::from_data(3, vec![0, 10, 20, 10, 0, 10, 20, 10, 0]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::pickup(1, 1, Amount::from_vec(vec![3])),
            Job::delivery(2, 2, Amount::from_vec(vec![3])),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10])).with_start(0).with_end(0),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_pd_shift_moves_pair_to_empty_route() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(1), 1);
        let r1 = TWRoute::new(1, 1);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = PdShiftOp::new(0, 0, 1);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
