//! `PriorityReplace` (spec.md §4.7): evict a route's prefix or suffix whose
//! cumulative priority is lower than an unassigned job's priority, dropping
//! the evicted jobs back to the unassigned pool in favor of `candidate`.
//!
//! Grounded on the prefix/suffix cumulative-priority prefix sums already
//! exposed by [`crate::solution_state::SolutionState::fwd_priority`] and
//! [`crate::solution_state::SolutionState::bwd_priority`] (built for exactly
//! this query).

use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// If `prefix`, evicts `route[..split_rank]`; otherwise evicts
/// `route[split_rank..]`. `candidate` is inserted at the vacated end.
pub struct PriorityReplaceOp {
    route: usize,
    split_rank: usize,
    prefix: bool,
    candidate: usize,
    gain: Eval,
}

impl PriorityReplaceOp {
    pub fn new(route: usize, split_rank: usize, prefix: bool, candidate: usize) -> Self {
        Self {
            route,
            split_rank,
            prefix,
            candidate,
            gain: NO_EVAL,
        }
    }

    fn rebuilt(&self, input: &Input, routes: &[TWRoute]) -> Option<TWRoute> {
        let route = &routes[self.route];
        let vehicle = &input.vehicles()[route.vehicle()];
        let kept: Vec<RouteStep> = if self.prefix {
            route.steps()[self.split_rank..].to_vec()
        } else {
            route.steps()[..self.split_rank].to_vec()
        };

        let mut new_route = TWRoute::new(route.vehicle(), input.amount_size());
        if self.prefix {
            if !new_route.add(input, vehicle, RouteStep::Job(self.candidate), 0) {
                return None;
            }
            for step in &kept {
                if !new_route.add(input, vehicle, *step, new_route.size()) {
                    return None;
                }
            }
        } else {
            for step in &kept {
                if !new_route.add(input, vehicle, *step, new_route.size()) {
                    return None;
                }
            }
            if !new_route.add(input, vehicle, RouteStep::Job(self.candidate), new_route.size()) {
                return None;
            }
        }
        Some(new_route)
    }
}

impl LsOperator for PriorityReplaceOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::PriorityReplace
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.route_eval(self.route)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        let route = &routes[self.route];
        self.split_rank > 0
            && self.split_rank < route.size()
            && matches!(input.jobs()[self.candidate].job_type(), JobType::Single)
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let route = &routes[self.route];
        if self.split_rank == 0 || self.split_rank >= route.size() {
            self.gain = NO_EVAL;
            return;
        }
        let cumulative_priority = if self.prefix {
            state.fwd_priority(self.route, self.split_rank - 1)
        } else {
            state.bwd_priority(self.route, self.split_rank)
        };
        if cumulative_priority >= input.jobs()[self.candidate].priority() as u32 {
            self.gain = NO_EVAL;
            return;
        }

        let before = state.route_eval(self.route);
        match self.rebuilt(input, routes) {
            Some(new_route) => {
                let vehicle = &input.vehicles()[new_route.vehicle()];
                let after = crate::solution_state::route_eval_with(input, vehicle, new_route.steps());
                if !after.within_vehicle_range(vehicle) {
                    self.gain = NO_EVAL;
                    return;
                }
                self.gain = before - after;
            }
            None => self.gain = NO_EVAL,
        }
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        if let Some(new_route) = self.rebuilt(input, routes) {
            routes[self.route] = new_route;
        }
    }

    fn addition_candidates(&self) -> Vec<usize> {
        vec![self.route]
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.route]
    }

    fn required_unassigned(&self) -> Vec<usize> {
        vec![self.candidate]
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
            0, 10, 20, 30,
            10, 0, 10, 20,
            20, 10, 0, 10,
            30, 20, 10, 0,
        ]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
            Job::single(3, 3, Amount::zero(1), Amount::zero(1)).with_priority(90),
        ];
        let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0)];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_priority_replace_accepts_higher_priority_candidate() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(1), 1);
        let routes = vec![r0];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        // job 0 has priority 0; evicting the one-job prefix [job0] in favor
        // of unassigned job 2 (priority 90) should pass the gate.
        let mut op = PriorityReplaceOp::new(0, 1, true, 2);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
