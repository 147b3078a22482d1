//! `TSPFix` (spec.md §4.7): rebuild a route by solving a small TSP over its
//! current jobs. Only applicable to Single-only routes, and off by default
//! (Open Question decision: see `DESIGN.md`).
//!
//! Grounded on the teacher's absence of an equivalent move: there is no
//! `local_search` analogue, so this brute-forces permutations (Held-Karp
//! would be overkill for the route sizes this move targets) via Heap's
//! algorithm, bounded by [`MAX_EXACT_SIZE`] to keep the factorial blowup in
//! check.

use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Routes larger than this are left untouched; `8!` permutations is already
/// 40320 candidate orderings to feasibility-check.
pub const MAX_EXACT_SIZE: usize = 8;

fn permutations(mut items: Vec<usize>) -> Vec<Vec<usize>> {
    let n = items.len();
    let mut result = Vec::new();
    let mut c = vec![0usize; n];
    result.push(items.clone());
    let mut i = 0;
    while i < n {
        if c[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(c[i], i);
            }
            result.push(items.clone());
            c[i] += 1;
            i = 0;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
    result
}

pub struct TspFixOp {
    route: usize,
    best_order: Vec<usize>,
    gain: Eval,
}

impl TspFixOp {
    pub fn new(route: usize) -> Self {
        Self {
            route,
            best_order: Vec::new(),
            gain: NO_EVAL,
        }
    }
}

impl LsOperator for TspFixOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::TSPFix
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.route_eval(self.route)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        let route = &routes[self.route];
        if route.size() < 3 || route.size() > MAX_EXACT_SIZE {
            return false;
        }
        route.steps().iter().all(|s| match s {
            RouteStep::Job(r) => matches!(input.jobs()[*r].job_type(), JobType::Single),
            _ => false,
        })
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let route = &routes[self.route];
        let vehicle = &input.vehicles()[route.vehicle()];
        let jobs: Vec<usize> = route.steps().iter().filter_map(|s| s.job_rank()).collect();
        let before = state.route_eval(self.route);

        let mut best_eval = NO_EVAL;
        let mut best_order = jobs.clone();
        for order in permutations(jobs) {
            let mut candidate = TWRoute::new(route.vehicle(), input.amount_size());
            let mut ok = true;
            for &job_rank in &order {
                if !candidate.add(input, vehicle, RouteStep::Job(job_rank), candidate.size()) {
                    ok = false;
                    break;
                }
            }
            if !ok {
                continue;
            }
            let eval = crate::solution_state::route_eval_with(input, vehicle, candidate.steps());
            if !eval.within_vehicle_range(vehicle) {
                continue;
            }
            if eval.improves_on(best_eval) {
                best_eval = eval;
                best_order = order;
            }
        }

        self.best_order = best_order;
        self.gain = if best_eval.is_no_eval() {
            NO_EVAL
        } else {
            before - best_eval
        };
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        let vehicle_idx = routes[self.route].vehicle();
        let vehicle = input.vehicles()[vehicle_idx].clone();
        let mut new_route = TWRoute::new(vehicle_idx, input.amount_size());
        for &job_rank in &self.best_order {
            new_route.add(input, &vehicle, RouteStep::Job(job_rank), new_route.size());
        }
        routes[self.route] = new_route;
    }

    fn addition_candidates(&self) -> Vec<usize> {
        vec![self.route]
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.route]
    }

    fn required_unassigned(&self) -> Vec<usize> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutations_count() {
        let perms = permutations(vec![0, 1, 2]);
        assert_eq!(perms.len(), 6);
    }
}
