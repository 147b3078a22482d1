//! `TwoOpt` / `ReverseTwoOpt` / `IntraTwoOpt` (spec.md §4.7): swap the tails
//! of two routes after given ranks, optionally reverse-splicing them.
//!
//! Grounded on `local_search/two_opt.rs`'s edge-swap delta, generalized from
//! a single closed tour to a pair of open `TWRoute`s whose tails are
//! exchanged (inter-route) or whose interior segment is reversed in place
//! (intra-route).

use crate::eval::{Eval, NO_EVAL};
use crate::models::Input;
use crate::routes::TWRoute;
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Exchanges `source[s_rank..]` with `target[t_rank..]`. When `source ==
/// target`, `reverse = true` instead reverses `source[s_rank..t_rank]`
/// in place (`IntraTwoOpt`); `reverse = false` with `source != target`
/// additionally reverses the spliced-in tail before joining
/// (`ReverseTwoOpt`).
pub struct TwoOptOp {
    source: usize,
    s_rank: usize,
    target: usize,
    t_rank: usize,
    reverse: bool,
    gain: Eval,
}

impl TwoOptOp {
    pub fn new(source: usize, s_rank: usize, target: usize, t_rank: usize, reverse: bool) -> Self {
        Self {
            source,
            s_rank,
            target,
            t_rank,
            reverse,
            gain: NO_EVAL,
        }
    }

    fn kind_for(&self) -> OperatorKind {
        if self.source == self.target {
            OperatorKind::IntraTwoOpt
        } else if self.reverse {
            OperatorKind::ReverseTwoOpt
        } else {
            OperatorKind::TwoOpt
        }
    }

    fn spliced_routes(&self, input: &Input, routes: &[TWRoute]) -> Option<(TWRoute, TWRoute)> {
        let vehicle_src = &input.vehicles()[routes[self.source].vehicle()];
        let vehicle_tgt = &input.vehicles()[routes[self.target].vehicle()];

        if self.source == self.target {
            if self.s_rank >= self.t_rank || self.t_rank > routes[self.source].size() {
                return None;
            }
            let mut new_steps = routes[self.source].steps().to_vec();
            new_steps[self.s_rank..self.t_rank].reverse();
            let mut new_route = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
            let mut ok = true;
            for step in &new_steps {
                if !new_route.add(input, vehicle_src, *step, new_route.size()) {
                    ok = false;
                    break;
                }
            }
            return if ok { Some((new_route.clone(), new_route)) } else { None };
        }

        let src_head = routes[self.source].steps()[..self.s_rank].to_vec();
        let src_tail = routes[self.source].steps()[self.s_rank..].to_vec();
        let tgt_head = routes[self.target].steps()[..self.t_rank].to_vec();
        let mut tgt_tail = routes[self.target].steps()[self.t_rank..].to_vec();

        if self.reverse {
            tgt_tail.reverse();
        }

        let mut new_src = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
        for step in src_head.iter().chain(tgt_tail.iter()) {
            if !new_src.add(input, vehicle_src, *step, new_src.size()) {
                return None;
            }
        }
        let mut new_tgt = TWRoute::new(routes[self.target].vehicle(), input.amount_size());
        for step in tgt_head.iter().chain(src_tail.iter()) {
            if !new_tgt.add(input, vehicle_tgt, *step, new_tgt.size()) {
                return None;
            }
        }
        Some((new_src, new_tgt))
    }
}

impl LsOperator for TwoOptOp {
    fn kind(&self) -> OperatorKind {
        self.kind_for()
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        let a = state.edge_gain(self.source, self.s_rank.saturating_sub(1));
        let b = state.edge_gain(self.target, self.t_rank.saturating_sub(1));
        if a.is_no_eval() || b.is_no_eval() {
            NO_EVAL
        } else {
            a + b
        }
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        self.spliced_routes(input, routes).is_some()
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let before = if self.source == self.target {
            state.route_eval(self.source)
        } else {
            state.route_eval(self.source) + state.route_eval(self.target)
        };
        match self.spliced_routes(input, routes) {
            Some((new_src, new_tgt)) => {
                let vehicle_src = &input.vehicles()[new_src.vehicle()];
                let vehicle_tgt = &input.vehicles()[new_tgt.vehicle()];
                let new_src_eval = crate::solution_state::route_eval_with(input, vehicle_src, new_src.steps());
                if !new_src_eval.within_vehicle_range(vehicle_src) {
                    self.gain = NO_EVAL;
                    return;
                }
                let after = if self.source == self.target {
                    new_src_eval
                } else {
                    let new_tgt_eval = crate::solution_state::route_eval_with(input, vehicle_tgt, new_tgt.steps());
                    if !new_tgt_eval.within_vehicle_range(vehicle_tgt) {
                        self.gain = NO_EVAL;
                        return;
                    }
                    new_src_eval + new_tgt_eval
                };
                self.gain = before - after;
            }
            None => self.gain = NO_EVAL,
        }
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        if let Some((new_src, new_tgt)) = self.spliced_routes(input, routes) {
            routes[self.source] = new_src;
            if self.source != self.target {
                routes[self.target] = new_tgt;
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::compatibility::Compatibility;
    use crate::models::{Job, Matrix, ProfileMatrices, Vehicle};
    use crate::routes::RouteStep;
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(4, vec![
            0, 10, 15, 20,
            10, 0, 15, 25,
            15, 15, 0, 10,
            20, 25, 10, 0,
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
    fn test_two_opt_between_routes_is_valid() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(1), 1);
        let mut r1 = TWRoute::new(1, 1);
        let v1 = &input.vehicles()[1];
        r1.add(&input, v1, RouteStep::Job(2), 0);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = TwoOptOp::new(0, 1, 1, 0, false);
        assert!(op.is_valid(&input, &routes));
        assert_eq!(op.kind(), OperatorKind::TwoOpt);
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }

    #[test]
    fn test_intra_two_opt_reverses_segment() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(1), 1);
        r0.add(&input, v0, RouteStep::Job(2), 2);
        let r1 = TWRoute::new(1, 1);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = TwoOptOp::new(0, 0, 0, 2, true);
        assert!(op.is_valid(&input, &routes));
        assert_eq!(op.kind(), OperatorKind::IntraTwoOpt);
        op.compute_gain(&input, &state, &routes);
    }
}
