//! `SwapStar` (spec.md §4.7): swap a job between two routes without
//! requiring either to land in the other's vacated slot — each is
//! reinserted at its own best position in the other route.
//!
//! Grounded on the classic SwapStar move (Vidal et al.): precompute each
//! job's top-3 cheapest insertion ranks into the other route
//! (`ThreeInsertions`), then test the four combinations of (source job's
//! 1st/2nd best rank) × (target job's 1st/2nd best rank), since the single
//! best pair can conflict when one insertion rank falls inside the other
//! job's vacated span.

use crate::eval::{Eval, NO_EVAL};
use crate::insertion::addition_eval;
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

use super::{LsOperator, OperatorKind};

/// Up to 3 cheapest `(eval, rank)` insertions of one job into one route,
/// ordered best first.
struct ThreeInsertions {
    entries: Vec<(Eval, usize)>,
}

impl ThreeInsertions {
    fn build(input: &Input, state: &SolutionState, job_rank: usize, v: usize, route: &TWRoute) -> Self {
        let vehicle = &input.vehicles()[route.vehicle()];
        let job = &input.jobs()[job_rank];

        let mut entries = Self::scan(input, vehicle, route, job_rank, job, state.insertion_ranks(v, job_rank));
        if entries.is_empty() {
            // Strong bound found nothing insertable (can happen once a route
            // already carries a placed break mid-sequence); fall back to the
            // cheaper weak bound before giving up on this route entirely.
            entries = Self::scan(input, vehicle, route, job_rank, job, state.weak_insertion_ranks(v, job_rank));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.truncate(3);
        Self { entries }
    }

    fn scan(
        input: &Input,
        vehicle: &crate::models::Vehicle,
        route: &TWRoute,
        job_rank: usize,
        job: &crate::models::Job,
        (begin, end): (usize, usize),
    ) -> Vec<(Eval, usize)> {
        let mut entries = Vec::new();
        let route_eval = crate::solution_state::route_eval_with(input, vehicle, route.steps());
        for rank in begin..=end.max(begin).min(route.size()) {
            if !route.is_valid_addition_for_tw(
                input,
                vehicle,
                RouteStep::Job(job_rank),
                job.pickup(),
                job.delivery(),
                rank,
            ) {
                continue;
            }
            let eval = addition_eval(input, vehicle, route, job_rank, rank);
            if !(route_eval + eval).within_vehicle_range(vehicle) {
                continue;
            }
            entries.push((eval, rank));
        }
        entries
    }

    fn nth(&self, i: usize) -> Option<(Eval, usize)> {
        self.entries.get(i).copied()
    }
}

pub struct SwapStarOp {
    source: usize,
    s_rank: usize,
    target: usize,
    t_rank: usize,
    source_job: usize,
    target_job: usize,
    best_source_insert_rank: usize,
    best_target_insert_rank: usize,
    gain: Eval,
}

impl SwapStarOp {
    pub fn new(source: usize, s_rank: usize, target: usize, t_rank: usize) -> Self {
        Self {
            source,
            s_rank,
            target,
            t_rank,
            source_job: 0,
            target_job: 0,
            best_source_insert_rank: 0,
            best_target_insert_rank: 0,
            gain: NO_EVAL,
        }
    }

    fn without(&self, input: &Input, routes: &[TWRoute], which: usize, rank: usize) -> TWRoute {
        let mut route = routes[which].clone();
        route.remove(input, &input.vehicles()[route.vehicle()], rank);
        route
    }
}

impl LsOperator for SwapStarOp {
    fn kind(&self) -> OperatorKind {
        OperatorKind::SwapStar
    }

    fn gain_upper_bound(&self, _input: &Input, state: &SolutionState) -> Eval {
        state.node_gain(self.source, self.s_rank) + state.node_gain(self.target, self.t_rank)
    }

    fn is_valid(&mut self, input: &Input, routes: &[TWRoute]) -> bool {
        if self.source == self.target {
            return false;
        }
        match routes[self.source].steps().get(self.s_rank) {
            Some(RouteStep::Job(r)) if matches!(input.jobs()[*r].job_type(), JobType::Single) => {
                self.source_job = *r;
            }
            _ => return false,
        }
        match routes[self.target].steps().get(self.t_rank) {
            Some(RouteStep::Job(r)) if matches!(input.jobs()[*r].job_type(), JobType::Single) => {
                self.target_job = *r;
            }
            _ => return false,
        }
        true
    }

    fn compute_gain(&mut self, input: &Input, state: &SolutionState, routes: &[TWRoute]) {
        let removal_gain =
            state.node_gain(self.source, self.s_rank) + state.node_gain(self.target, self.t_rank);
        if removal_gain.is_no_eval() {
            self.gain = NO_EVAL;
            return;
        }

        let source_without = self.without(input, routes, self.source, self.s_rank);
        let target_without = self.without(input, routes, self.target, self.t_rank);

        let target_options = ThreeInsertions::build(input, state, self.source_job, self.target, &target_without);
        let source_options = ThreeInsertions::build(input, state, self.target_job, self.source, &source_without);

        let mut best_added = NO_EVAL;
        let mut best_pair = (0usize, 0usize);
        for i in 0..2 {
            for j in 0..2 {
                let (Some((t_eval, t_rank)), Some((s_eval, s_rank))) =
                    (target_options.nth(i), source_options.nth(j))
                else {
                    continue;
                };
                let added = t_eval + s_eval;
                if added.improves_on(best_added) {
                    best_added = added;
                    best_pair = (t_rank, s_rank);
                }
            }
        }

        self.best_target_insert_rank = best_pair.0;
        self.best_source_insert_rank = best_pair.1;
        self.gain = if best_added.is_no_eval() {
            NO_EVAL
        } else {
            removal_gain - best_added
        };
    }

    fn gain(&self) -> Eval {
        self.gain
    }

    fn apply(&self, input: &Input, routes: &mut [TWRoute], _state: &mut SolutionState) {
        let source_vehicle = input.vehicles()[routes[self.source].vehicle()].clone();
        let target_vehicle = input.vehicles()[routes[self.target].vehicle()].clone();
        routes[self.source].remove(input, &source_vehicle, self.s_rank);
        routes[self.target].remove(input, &target_vehicle, self.t_rank);
        routes[self.target].add(
            input,
            &target_vehicle,
            RouteStep::Job(self.source_job),
            self.best_target_insert_rank,
        );
        routes[self.source].add(
            input,
            &source_vehicle,
            RouteStep::Job(self.target_job),
            self.best_source_insert_rank,
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
        let durations = Matrix::from_data(4, vec![
            0, 10, 50, 50,
            10, 0, 50, 50,
            50, 50, 0, 10,
            50, 50, 10, 0,
        ]).unwrap();
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
    fn test_swap_star_between_routes_is_valid() {
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

        let mut op = SwapStarOp::new(0, 0, 1, 0);
        assert!(op.is_valid(&input, &routes));
        op.compute_gain(&input, &state, &routes);
        assert!(!op.gain().is_no_eval());
    }
}
