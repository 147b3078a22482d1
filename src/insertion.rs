//! Cheapest single-job and pickup/delivery-pair insertion search (spec.md
//! §4.5).

use crate::amount::Amount;
use crate::eval::{Eval, NO_EVAL};
use crate::models::{Input, Vehicle};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

fn location_at(input: &Input, route: &TWRoute, rank: usize) -> Option<usize> {
    route
        .steps()
        .get(rank)
        .and_then(|s| s.job_rank())
        .map(|r| input.jobs()[r].location())
}

/// The marginal `Eval` of inserting a single job at `location` between
/// whatever currently sits at ranks `rank - 1` and `rank` of `route`
/// (falling back to the vehicle's start/end at the route's boundaries).
///
/// `pub(crate)` so operators (e.g. `SwapStar`'s top-3 insertion scan) can
/// reuse the same marginal-cost formula instead of re-deriving it.
pub(crate) fn addition_eval(
    input: &Input,
    vehicle: &Vehicle,
    route: &TWRoute,
    job_rank: usize,
    rank: usize,
) -> Eval {
    let job = &input.jobs()[job_rank];
    let loc = job.location();

    let prev_loc = if rank == 0 {
        vehicle.start_index()
    } else {
        location_at(input, route, rank - 1).or(vehicle.start_index())
    };
    let next_loc = if rank == route.size() {
        vehicle.end_index()
    } else {
        location_at(input, route, rank).or(vehicle.end_index())
    };

    let mut added = Eval::zero();
    if let Some(p) = prev_loc {
        added = added
            + Eval::new(
                input.travel_cost(vehicle, p, loc),
                input.travel_duration(vehicle, p, loc),
                input.travel_distance(vehicle, p, loc),
            );
    }
    if let Some(n) = next_loc {
        added = added
            + Eval::new(
                input.travel_cost(vehicle, loc, n),
                input.travel_duration(vehicle, loc, n),
                input.travel_distance(vehicle, loc, n),
            );
    }
    if let (Some(p), Some(n)) = (prev_loc, next_loc) {
        added = added
            - Eval::new(
                input.travel_cost(vehicle, p, n),
                input.travel_duration(vehicle, p, n),
                input.travel_distance(vehicle, p, n),
            );
    }

    let task_time = job.setup_for(vehicle.profile()) + job.service_for(vehicle.profile());
    added.duration += task_time;
    added.cost += vehicle.costs().per_task_hour * task_time / 3600;

    if vehicle.costs().fixed != 0 && route.size() == 0 {
        added.cost += vehicle.costs().fixed;
    }

    added
}

/// Result of [`compute_best_insertion_single`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInsertion {
    pub eval: Eval,
    pub delivery_sum: Amount,
    pub rank: usize,
}

impl RouteInsertion {
    fn none(amount_size: usize) -> Self {
        Self {
            eval: NO_EVAL,
            delivery_sum: Amount::zero(amount_size),
            rank: 0,
        }
    }
}

/// Best rank (and its cost) at which `job_rank` could be inserted alone into
/// `v`'s route, or a `NO_EVAL` result if none is feasible.
pub fn compute_best_insertion_single(
    input: &Input,
    state: &SolutionState,
    job_rank: usize,
    v: usize,
    route: &TWRoute,
) -> RouteInsertion {
    let vehicle = &input.vehicles()[route.vehicle()];
    let job = &input.jobs()[job_rank];
    let (begin, end) = state.insertion_ranks(v, job_rank);
    let mut best = RouteInsertion::none(input.amount_size());

    for rank in begin..=end.max(begin) {
        if rank > route.size() {
            break;
        }
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
        if !(state.route_eval(v) + eval).within_vehicle_range(vehicle) {
            continue;
        }
        if eval.improves_on(best.eval) {
            best = RouteInsertion {
                eval,
                delivery_sum: job.pickup() + job.delivery(),
                rank,
            };
        }
    }
    best
}

/// Result of [`compute_best_insertion_pd`].
#[derive(Debug, Clone, PartialEq)]
pub struct PdInsertion {
    pub eval: Eval,
    pub pickup_rank: usize,
    pub delivery_rank: usize,
    pub delivery_sum: Amount,
}

impl PdInsertion {
    fn none(amount_size: usize) -> Self {
        Self {
            eval: NO_EVAL,
            pickup_rank: 0,
            delivery_rank: 0,
            delivery_sum: Amount::zero(amount_size),
        }
    }
}

/// Best joint insertion of a pickup `job_rank` and its matching delivery
/// `job_rank + 1` into `v`'s route, improving on `cost_threshold`.
///
/// Precomputes the cost of inserting the delivery alone at every candidate
/// rank (`d_adds`), then for each candidate pickup rank scans delivery
/// ranks at or after it, short-circuiting once the pickup-alone cost
/// already exceeds the current best.
pub fn compute_best_insertion_pd(
    input: &Input,
    state: &SolutionState,
    job_rank: usize,
    v: usize,
    route: &TWRoute,
    cost_threshold: Eval,
) -> PdInsertion {
    let vehicle = &input.vehicles()[route.vehicle()];
    let pickup_job = &input.jobs()[job_rank];
    let delivery_rank = job_rank + 1;
    let delivery_job = &input.jobs()[delivery_rank];

    let (p_begin, p_end) = state.insertion_ranks(v, job_rank);
    let (d_begin, d_end) = state.insertion_ranks(v, delivery_rank);
    let size = route.size();
    let d_end = d_end.max(d_begin).min(size + 1);
    let p_end = p_end.max(p_begin).min(size + 1);

    let zero = Amount::zero(input.amount_size());
    let mut d_adds = vec![NO_EVAL; d_end.saturating_sub(d_begin)];
    let mut valid_delivery = vec![false; d_adds.len()];
    for d_rank in d_begin..d_end {
        if route.is_valid_addition_for_tw_without_max_load(
            input,
            vehicle,
            RouteStep::Job(delivery_rank),
            d_rank,
        ) {
            valid_delivery[d_rank - d_begin] = true;
            d_adds[d_rank - d_begin] = addition_eval(input, vehicle, route, delivery_rank, d_rank);
        }
    }

    let mut best = PdInsertion::none(input.amount_size());
    let mut best_eval = cost_threshold;

    for pickup_r in p_begin..p_end {
        let p_add = addition_eval(input, vehicle, route, job_rank, pickup_r);
        if p_add.cost > best_eval.cost {
            continue;
        }

        for delivery_r in pickup_r.max(d_begin)..d_end {
            if !valid_delivery[delivery_r - d_begin] {
                continue;
            }
            let pd_eval = if pickup_r < delivery_r {
                p_add + d_adds[delivery_r - d_begin]
            } else {
                // Pickup and delivery land at the same rank: evaluate them
                // as one combined two-step insertion.
                addition_eval(input, vehicle, route, job_rank, pickup_r)
                    + addition_eval(input, vehicle, route, delivery_rank, pickup_r + 1)
            };

            if !pd_eval.improves_on(best_eval) {
                continue;
            }

            let capacity_ok = if pickup_r == delivery_r {
                route.raw().is_valid_addition_for_capacity(
                    vehicle,
                    pickup_job.pickup(),
                    &zero,
                    pickup_r,
                ) && route.raw().is_valid_addition_for_capacity(
                    vehicle,
                    &zero,
                    delivery_job.delivery(),
                    pickup_r,
                )
            } else {
                route.raw().is_valid_addition_for_capacity_inclusion(
                    vehicle,
                    pickup_job.pickup(),
                    delivery_job.delivery(),
                    pickup_r,
                    delivery_r,
                )
            };
            if !capacity_ok {
                continue;
            }

            let tw_ok = route.is_valid_addition_for_tw_without_max_load(
                input,
                vehicle,
                RouteStep::Job(job_rank),
                pickup_r,
            );
            if !tw_ok {
                continue;
            }

            if !(state.route_eval(v) + pd_eval).within_vehicle_range(vehicle) {
                continue;
            }

            best_eval = pd_eval;
            best = PdInsertion {
                eval: pd_eval,
                pickup_rank: pickup_r,
                delivery_rank: delivery_r,
                delivery_sum: pickup_job.pickup() + delivery_job.delivery(),
            };
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::Compatibility;
    use crate::models::{Job, Matrix, ProfileMatrices, Vehicle};
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(3, vec![0, 10, 20, 10, 0, 10, 20, 10, 0]).unwrap();
        let distances = Matrix::from_data(3, vec![0, 100, 200, 100, 0, 100, 200, 100, 0]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert(
            "car".to_string(),
            ProfileMatrices::new(durations, distances, None),
        );
        let jobs = vec![
            Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
            Job::pickup(2, 1, Amount::from_vec(vec![3])),
            Job::delivery(3, 2, Amount::from_vec(vec![3])),
        ];
        let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10]))
            .with_start(0)
            .with_end(0)];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_single_insertion_into_empty_route() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let route = TWRoute::new(0, 1);
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, std::slice::from_ref(&route));
        let best = compute_best_insertion_single(&input, &state, 0, 0, &route);
        assert!(!best.eval.is_no_eval());
        assert_eq!(best.rank, 0);
    }

    #[test]
    fn test_pd_insertion_into_empty_route() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let route = TWRoute::new(0, 1);
        let mut state = SolutionState::new(&input);
        state.setup(&input, &compat, std::slice::from_ref(&route));
        let best = compute_best_insertion_pd(&input, &state, 1, 0, &route, NO_EVAL);
        assert!(!best.eval.is_no_eval());
        assert!(best.pickup_rank <= best.delivery_rank);
    }
}
