//! `UnassignedExchange` (spec.md §4.7): swap an unassigned single job `u`
//! for an arbitrary segment `[s_rank..t_rank)` of an existing route;
//! priority-increase-or-cost improving.
//!
//! Grounded on [`crate::operators::priority_replace::PriorityReplaceOp`]'s
//! rebuild-and-compare shape, generalized from a route boundary to an
//! arbitrary interior span since the evicted segment need not touch either
//! end of the route.

use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

pub struct UnassignedExchangeOp {
    route: usize,
    s_rank: usize,
    t_rank: usize,
    candidate: usize,
    segment_priority: u32,
    gain: Eval,
}

impl UnassignedExchangeOp {
    pub fn new(route: usize, s_rank: usize, t_rank: usize, candidate: usize) -> Self {
        Self {
            route,
            s_rank,
            t_rank,
            candidate,
            segment_priority: 0,
            gain: NO_EVAL,
        }
    }

    fn rebuilt(&self, input: &Input, routes: &[TWRoute]) -> Option<TWRoute> {
        let route = &routes[self.route];
        let vehicle = &input.vehicles()[route.vehicle()];
        let mut new_route = TWRoute::new(route.vehicle(), input.amount_size());
        for step in &route.steps()[..self.s_rank] {
            if !new_route.add(input, vehicle, *step, new_route.size()) {
                return None;
            }
        }
        if !new_route.add(input, vehicle, RouteStep::Job(self.candidate), new_route.size()) {
            return None;
        }
        for step in &route.steps()[self.t_rank..] {
            if !new_route.add(input, vehicle, *step, new_route.size()) {
                return None;
            }
        }
        Some(new_route)
    }
}

impl LsOperator for UnassignedExchangeOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::UnassignedExchange
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.route_eval(self.route)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        let route = &routes[self.route];
        if self.s_rank >= self.t_rank || self.t_rank > route.size() {
            return false;
        }
        if !matches!(input.jobs()[self.candidate].job_type(), JobType::Single) {
            return false;
        }
        self.segment_priority = route.steps()[self.s_rank..self.t_rank]
            .iter()
            .filter_map(|s| s.job_rank())
            .map(|r| input.jobs()[r].priority() as u32)
            .sum();
        true
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let candidate_priority = input.jobs()[self.candidate].priority() as u32;
        let before = state.route_eval(self.route);
        match self.rebuilt(input, routes) {
            Some(new_route) => {
                let vehicle = &input.vehicles()[new_route.vehicle()];
                let after = crate::solution_state::route_eval_with(input, vehicle, new_route.steps());
                if !after.within_vehicle_range(vehicle) {
                    self.gain = NO_EVAL;
                    return;
                }
                let cost_gain = before - after;
                let priority_improves = candidate_priority > self.segment_priority;
                self.gain = if priority_improves || cost_gain.improves_on(Eval::zero()) {
                    cost_gain
                } else {
                    NO_EVAL
                };
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
