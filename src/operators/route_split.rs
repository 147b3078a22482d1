//! `RouteSplit` (spec.md §4.7): peel the tail of one route off onto a
//! second, currently-empty vehicle.
//!
//! Grounded on [`crate::operators::two_opt::TwoOptOp`]'s tail-splice
//! mechanics, specialized to a single source route and an empty target
//! (so no existing target jobs are displaced).

use crate::eval::{Eval, NO_EVAL};
use crate::models::Input;
use crate::routes::TWRoute;
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Moves `source[split_rank..]` onto `target`, which must be empty.
pub struct RouteSplitOp {
    source: usize,
    split_rank: usize,
    target: usize,
    gain: Eval,
}

impl RouteSplitOp {
    pub fn new(source: usize, split_rank: usize, target: usize) -> Self {
        Self {
            source,
            split_rank,
            target,
            gain: NO_EVAL,
        }
    }

    fn split(&self, input: &Input, routes: &[TWRoute]) -> Option<(TWRoute, TWRoute)> {
        if !routes[self.target].steps().is_empty() {
            return None;
        }
        if self.split_rank == 0 || self.split_rank >= routes[self.source].size() {
            return None;
        }
        let src_vehicle = &input.vehicles()[routes[self.source].vehicle()];
        let tgt_vehicle = &input.vehicles()[routes[self.target].vehicle()];

        let head = &routes[self.source].steps()[..self.split_rank];
        let tail = &routes[self.source].steps()[self.split_rank..];

        let mut new_src = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
        for step in head {
            if !new_src.add(input, src_vehicle, *step, new_src.size()) {
                return None;
            }
        }
        let mut new_tgt = TWRoute::new(routes[self.target].vehicle(), input.amount_size());
        for step in tail {
            if !new_tgt.add(input, tgt_vehicle, *step, new_tgt.size()) {
                return None;
            }
        }
        Some((new_src, new_tgt))
    }
}

impl LsOperator for RouteSplitOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RouteSplit
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.route_eval(self.source)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        self.source != self.target && self.split(input, routes).is_some()
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let before = state.route_eval(self.source) + state.route_eval(self.target);
        match self.split(input, routes) {
            Some((new_src, new_tgt)) => {
                let src_vehicle = &input.vehicles()[new_src.vehicle()];
                let tgt_vehicle = &input.vehicles()[new_tgt.vehicle()];
                let new_src_eval = crate::solution_state::route_eval_with(input, src_vehicle, new_src.steps());
                let new_tgt_eval = crate::solution_state::route_eval_with(input, tgt_vehicle, new_tgt.steps());
                if !new_src_eval.within_vehicle_range(src_vehicle) || !new_tgt_eval.within_vehicle_range(tgt_vehicle) {
                    self.gain = NO_EVAL;
                    return;
                }
                self.gain = before - (new_src_eval + new_tgt_eval);
            }
            None => self.gain = NO_EVAL,
        }
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        if let Some((new_src, new_tgt)) = self.split(input, routes) {
            routes[self.source] = new_src;
            routes[self.target] = new_tgt;
        }
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
    use crate::routes::RouteStep;
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(3, vec![0, 10, 100, 10, 0, 100, 100, 100, 0]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10])).with_start(0).with_end(0),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_route_split_onto_empty_vehicle() {
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

        let mut op = RouteSplitOp::new(0, 1, 1);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
