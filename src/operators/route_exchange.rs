//! `RouteExchange` (spec.md §4.7): swap two routes' entire job sequences
//! between their vehicles wholesale, keeping the jobs but letting the other
//! vehicle's cost structure, skills and time window drive feasibility.
//!
//! Grounded on `local_search/route_exchange.rs`'s whole-route swap; ported
//! to rebuild each candidate via `TWRoute::add` so skill/capacity/TW
//! violations surface as a rejected move rather than a panic.

use crate::eval::{Eval, NO_EVAL};
use crate::models::Input;
use crate::routes::TWRoute;
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

pub struct RouteExchangeOp {
    source: usize,
    target: usize,
    gain: Eval,
}

impl RouteExchangeOp {
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            gain: NO_EVAL,
        }
    }

    fn swapped(&self, input: &Input, routes: &[TWRoute]) -> Option<(TWRoute, TWRoute)> {
        let src_vehicle = &input.vehicles()[routes[self.source].vehicle()];
        let tgt_vehicle = &input.vehicles()[routes[self.target].vehicle()];

        let mut new_src = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
        for step in routes[self.target].steps() {
            if !new_src.add(input, src_vehicle, *step, new_src.size()) {
                return None;
            }
        }
        let mut new_tgt = TWRoute::new(routes[self.target].vehicle(), input.amount_size());
        for step in routes[self.source].steps() {
            if !new_tgt.add(input, tgt_vehicle, *step, new_tgt.size()) {
                return None;
            }
        }
        Some((new_src, new_tgt))
    }
}

impl LsOperator for RouteExchangeOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RouteExchange
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.route_eval(self.source) + state.route_eval(self.target)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        self.source != self.target && self.swapped(input, routes).is_some()
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let before = state.route_eval(self.source) + state.route_eval(self.target);
        match self.swapped(input, routes) {
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
        if let Some((new_src, new_tgt)) = self.swapped(input, routes) {
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
        let durations = Matrix::from_data(3, vec![0, 10, 20, 10, 0, 10, 20, 10, 0]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10]))
                .with_start(0)
                .with_end(0)
                .with_costs(crate::models::VehicleCosts {
                    fixed: 1000,
                    per_hour: 3600,
                    per_km: 0,
                    per_task_hour: 0,
                }),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_route_exchange_swaps_whole_routes() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        let mut r1 = TWRoute::new(1, 1);
        let v1 = &input.vehicles()[1];
        r1.add(&input, v1, RouteStep::Job(1), 0);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = RouteExchangeOp::new(0, 1);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
