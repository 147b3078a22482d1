//! `CrossExchange` / `MixedExchange` and their `Intra*` counterparts
//! (spec.md §4.7): swap a segment of `source` with a segment of `target`.
//!
//! `src_len`/`tgt_len` (1 or 2 jobs) distinguish the catalogue entries:
//! `(2, 2)` is `CrossExchange`/`IntraCrossExchange`, `(1, 2)` or `(2, 1)` is
//! `MixedExchange`/`IntraMixedExchange`, `(1, 1)` is `IntraExchange` (the
//! spec names no inter-route single-for-single swap). Grounded on
//! `local_search/exchange.rs`'s tail-swap splice, generalized to fixed-length
//! interior segments instead of route tails.

use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

pub struct ExchangeOp {
    source: usize,
    s_rank: usize,
    src_len: usize,
    target: usize,
    t_rank: usize,
    tgt_len: usize,
    reverse_src: bool,
    reverse_tgt: bool,
    gain: Eval,
}

impl ExchangeOp {
    pub fn new(
        source: usize,
        s_rank: usize,
        src_len: usize,
        target: usize,
        t_rank: usize,
        tgt_len: usize,
        reverse_src: bool,
        reverse_tgt: bool,
    ) -> Self {
        Self {
            source,
            s_rank,
            src_len,
            target,
            t_rank,
            tgt_len,
            reverse_src,
            reverse_tgt,
            gain: NO_EVAL,
        }
    }

    fn kind_for(&self) -> OperatorKind {
        let intra = self.source == self.target;
        match (self.src_len, self.tgt_len, intra) {
            (1, 1, true) => OperatorKind::IntraExchange,
            (2, 2, true) => OperatorKind::IntraCrossExchange,
            (_, _, true) => OperatorKind::IntraMixedExchange,
            (2, 2, false) => OperatorKind::CrossExchange,
            _ => OperatorKind::MixedExchange,
        }
    }

    fn segment_jobs(input: &Input, route: &TWRoute, rank: usize, len: usize) -> Option<Vec<usize>> {
        if rank + len > route.size() {
            return None;
        }
        let mut jobs = Vec::with_capacity(len);
        for step in &route.steps()[rank..rank + len] {
            match step {
                RouteStep::Job(r) if matches!(input.jobs()[*r].job_type(), JobType::Single) => {
                    jobs.push(*r)
                }
                _ => return None,
            }
        }
        Some(jobs)
    }

    fn build_swapped(&self, input: &Input, routes: &[TWRoute]) -> Option<(TWRoute, TWRoute)> {
        let src_jobs = Self::segment_jobs(input, &routes[self.source], self.s_rank, self.src_len)?;
        let tgt_jobs = Self::segment_jobs(input, &routes[self.target], self.t_rank, self.tgt_len)?;

        let mut src_insert = tgt_jobs.clone();
        if self.reverse_tgt {
            src_insert.reverse();
        }
        let mut tgt_insert = src_jobs.clone();
        if self.reverse_src {
            tgt_insert.reverse();
        }

        if self.source == self.target {
            let (lo, lo_len, hi, hi_len, lo_insert, hi_insert) = if self.s_rank <= self.t_rank {
                (self.s_rank, self.src_len, self.t_rank, self.tgt_len, src_insert, tgt_insert)
            } else {
                (self.t_rank, self.tgt_len, self.s_rank, self.src_len, tgt_insert, src_insert)
            };
            let mut steps = routes[self.source].steps().to_vec();
            steps.splice(hi..hi + hi_len, hi_insert.into_iter().map(RouteStep::Job));
            steps.splice(lo..lo + lo_len, lo_insert.into_iter().map(RouteStep::Job));
            let vehicle = &input.vehicles()[routes[self.source].vehicle()];
            let mut new_route = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
            for step in &steps {
                if !new_route.add(input, vehicle, *step, new_route.size()) {
                    return None;
                }
            }
            return Some((new_route.clone(), new_route));
        }

        let mut src_steps = routes[self.source].steps().to_vec();
        src_steps.splice(
            self.s_rank..self.s_rank + self.src_len,
            src_insert.into_iter().map(RouteStep::Job),
        );
        let mut tgt_steps = routes[self.target].steps().to_vec();
        tgt_steps.splice(
            self.t_rank..self.t_rank + self.tgt_len,
            tgt_insert.into_iter().map(RouteStep::Job),
        );

        let src_vehicle = &input.vehicles()[routes[self.source].vehicle()];
        let tgt_vehicle = &input.vehicles()[routes[self.target].vehicle()];
        let mut new_src = TWRoute::new(routes[self.source].vehicle(), input.amount_size());
        for step in &src_steps {
            if !new_src.add(input, src_vehicle, *step, new_src.size()) {
                return None;
            }
        }
        let mut new_tgt = TWRoute::new(routes[self.target].vehicle(), input.amount_size());
        for step in &tgt_steps {
            if !new_tgt.add(input, tgt_vehicle, *step, new_tgt.size()) {
                return None;
            }
        }
        Some((new_src, new_tgt))
    }
}

impl LsOperator for ExchangeOp {
    fn kind(&self) -> OperatorKind {
        self.kind_for()
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        let a = if self.src_len == 1 {
            state.node_gain(self.source, self.s_rank)
        } else {
            state.edge_gain(self.source, self.s_rank)
        };
        let b = if self.tgt_len == 1 {
            state.node_gain(self.target, self.t_rank)
        } else {
            state.edge_gain(self.target, self.t_rank)
        };
        if a.is_no_eval() || b.is_no_eval() {
            NO_EVAL
        } else {
            a + b
        }
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        if Self::segment_jobs(input, &routes[self.source], self.s_rank, self.src_len).is_none() {
            return false;
        }
        if Self::segment_jobs(input, &routes[self.target], self.t_rank, self.tgt_len).is_none() {
            return false;
        }
        self.build_swapped(input, routes).is_some()
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let before = if self.source == self.target {
            state.route_eval(self.source)
        } else {
            state.route_eval(self.source) + state.route_eval(self.target)
        };
        match self.build_swapped(input, routes) {
            Some((new_src, new_tgt)) => {
                let src_vehicle = &input.vehicles()[new_src.vehicle()];
                let new_src_eval = crate::solution_state::route_eval_with(input, src_vehicle, new_src.steps());
                if !new_src_eval.within_vehicle_range(src_vehicle) {
                    self.gain = NO_EVAL;
                    return;
                }
                let after = if self.source == self.target {
                    new_src_eval
                } else {
                    let tgt_vehicle = &input.vehicles()[new_tgt.vehicle()];
                    let new_tgt_eval = crate::solution_state::route_eval_with(input, tgt_vehicle, new_tgt.steps());
                    if !new_tgt_eval.within_vehicle_range(tgt_vehicle) {
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
        if let Some((new_src, new_tgt)) = self.build_swapped(input, routes) {
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
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(5, vec![
            0, 10, 10, 10, 10,
            10, 0, 5, 100, 100,
            10, 5, 0, 100, 100,
            10, 100, 100, 0, 5,
            10, 100, 100, 5, 0,
        ]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
            Job::single(3, 3, Amount::zero(1), Amount::zero(1)),
            Job::single(4, 4, Amount::zero(1), Amount::zero(1)),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10])).with_start(0).with_end(0),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_cross_exchange_between_routes_is_valid() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let mut r0 = TWRoute::new(0, 1);
        let v0 = &input.vehicles()[0];
        r0.add(&input, v0, RouteStep::Job(0), 0);
        r0.add(&input, v0, RouteStep::Job(1), 1);
        let mut r1 = TWRoute::new(1, 1);
        let v1 = &input.vehicles()[1];
        r1.add(&input, v1, RouteStep::Job(2), 0);
        r1.add(&input, v1, RouteStep::Job(3), 1);
        let routes = vec![r0, r1];
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, &routes);

        let mut op = ExchangeOp::new(0, 0, 2, 1, 0, 2, false, false);
        assert!(op.is_valid(&input, &routes));
        assert_eq!(op.kind(), OperatorKind::CrossExchange);
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
