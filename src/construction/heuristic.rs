//! Homogeneous and dynamic construction heuristic (spec.md §4.6).
//!
//! Both variants share one skeleton: pick the next vehicle to route, seed it
//! with an optional initial job, then repeatedly insert the best remaining
//! job (by regret-weighted cheapest insertion, gated by priority) until
//! nothing more fits.

use crate::compatibility::{singleton_eval, Compatibility};
use crate::eval::Eval;
use crate::insertion::{compute_best_insertion_pd, compute_best_insertion_single};
use crate::models::{Input, JobType};
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

/// Which job, if any, seeds a freshly opened route before the regret loop
/// takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Skip seeding; let the regret loop pick the first job too.
    None,
    /// Seed with the feasible unassigned job carrying the largest amount.
    HigherAmount,
    /// Seed with the feasible unassigned job costing the most to serve alone.
    Furthest,
}

/// One (mode, λ) configuration the outer driver cycles through across seeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructionConfig {
    pub mode: InitMode,
    pub lambda: f64,
}

/// The fixed fallback table of (mode, λ) pairs (Open Question decision #1,
/// SPEC_FULL.md §4): the first seed uses `FALLBACK_TABLE[0]`, later seeds
/// cycle through the rest via `index % FALLBACK_TABLE.len()`.
pub const FALLBACK_TABLE: &[ConstructionConfig] = &[
    ConstructionConfig { mode: InitMode::Furthest, lambda: 1.0 },
    ConstructionConfig { mode: InitMode::Furthest, lambda: 2.0 },
    ConstructionConfig { mode: InitMode::HigherAmount, lambda: 1.0 },
    ConstructionConfig { mode: InitMode::HigherAmount, lambda: 2.0 },
    ConstructionConfig { mode: InitMode::None, lambda: 1.0 },
    ConstructionConfig { mode: InitMode::None, lambda: 0.5 },
    ConstructionConfig { mode: InitMode::Furthest, lambda: 0.5 },
    ConstructionConfig { mode: InitMode::HigherAmount, lambda: 0.5 },
];

/// `costs[j][v]`: cost of serving job `j` alone in an empty route of `v`, or
/// [`crate::eval::NO_EVAL`] if infeasible. Delivery jobs are never looked up
/// directly (they're only ever inserted alongside their pickup).
fn build_singleton_costs(input: &Input, _compat: &Compatibility) -> Vec<Vec<Eval>> {
    input
        .jobs()
        .iter()
        .map(|job| {
            input
                .vehicles()
                .iter()
                .map(|vehicle| singleton_eval(input, vehicle, job))
                .collect()
        })
        .collect()
}

fn capacity_scalar(input: &Input, vehicle: usize) -> i64 {
    input.vehicles()[vehicle].capacity().as_slice().iter().sum()
}

fn order_by_capacity(input: &Input) -> Vec<usize> {
    let mut order: Vec<usize> = (0..input.vehicles().len()).collect();
    order.sort_by_key(|&v| std::cmp::Reverse(capacity_scalar(input, v)));
    order
}

/// The "owning" vehicle for the dynamic variant: among `remaining`, the one
/// closest (by travel duration from its start) to the most still-unassigned
/// jobs, ties broken by higher capacity.
fn pick_dynamic_vehicle(input: &Input, state: &SolutionState, remaining: &[usize]) -> usize {
    let mut best_vehicle = remaining[0];
    let mut best_count = -1i64;
    let mut best_capacity = i64::MIN;

    for &v in remaining {
        let vehicle = &input.vehicles()[v];
        let mut owned = 0i64;
        for &j in state.unassigned() {
            let job = &input.jobs()[j];
            if matches!(job.job_type(), JobType::Delivery) {
                continue;
            }
            let Some(start) = vehicle.start_index() else { continue };
            let my_dist = input.travel_duration(vehicle, start, job.location());
            let owns = remaining.iter().all(|&other| {
                if other == v {
                    return true;
                }
                let other_vehicle = &input.vehicles()[other];
                match other_vehicle.start_index() {
                    Some(other_start) => {
                        my_dist <= input.travel_duration(other_vehicle, other_start, job.location())
                    }
                    None => true,
                }
            });
            if owns {
                owned += 1;
            }
        }
        let capacity = capacity_scalar(input, v);
        if owned > best_count || (owned == best_count && capacity > best_capacity) {
            best_count = owned;
            best_capacity = capacity;
            best_vehicle = v;
        }
    }
    best_vehicle
}

fn pick_seed_job(
    input: &Input,
    costs: &[Vec<Eval>],
    state: &SolutionState,
    v: usize,
    mode: InitMode,
) -> Option<usize> {
    if mode == InitMode::None {
        return None;
    }
    let mut best: Option<(usize, i64)> = None;
    for &j in state.unassigned() {
        let job = &input.jobs()[j];
        if matches!(job.job_type(), JobType::Delivery) {
            continue;
        }
        let eval = costs[j][v];
        if eval.is_no_eval() {
            continue;
        }
        let score = match mode {
            InitMode::HigherAmount => job.pickup().as_slice().iter().sum::<i64>()
                + job.delivery().as_slice().iter().sum::<i64>(),
            InitMode::Furthest => eval.cost,
            InitMode::None => unreachable!(),
        };
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((j, score));
        }
    }
    best.map(|(j, _)| j)
}

/// Second-lowest finite cost in `costs[j]`, or `0` if fewer than two
/// vehicles can serve `j` alone (no regret signal available).
fn regret_value(costs_for_job: &[Eval]) -> i64 {
    let mut finite: Vec<i64> = costs_for_job
        .iter()
        .filter(|e| !e.is_no_eval())
        .map(|e| e.cost)
        .collect();
    finite.sort_unstable();
    finite.get(1).copied().unwrap_or(0)
}

fn refresh_vehicle(
    input: &Input,
    compat: &Compatibility,
    state: &mut SolutionState,
    routes: &[TWRoute],
    v: usize,
) {
    state.update_route_eval(input, routes, v);
    state.update_route_bbox(input, routes, v);
    state.update_priorities(input, routes, v);
    state.set_node_gains(input, routes, v);
    state.set_edge_gains(input, routes, v);
    state.set_pd_matching_ranks(input, routes, v);
    state.set_pd_gains(input, routes, v);
    state.set_insertion_ranks(input, routes, v);
    state.update_skills(input, compat, routes, v);
}

/// Places vehicle `v`'s mandatory breaks (spec.md §3 "every break is placed
/// within one of its allowed windows"). If they can't all be placed, the
/// route built for `v` is infeasible as a whole: every job on it is released
/// back to the unassigned pool rather than shipped without its breaks.
fn enforce_breaks(
    input: &Input,
    compat: &Compatibility,
    routes: &mut [TWRoute],
    state: &mut SolutionState,
    v: usize,
) {
    let vehicle = &input.vehicles()[v];
    if vehicle.breaks().is_empty() || routes[v].size() == 0 {
        return;
    }
    let vehicle = vehicle.clone();
    if routes[v].place_breaks(input, &vehicle) {
        refresh_vehicle(input, compat, state, routes, v);
        return;
    }
    for job_rank in routes[v].steps().iter().filter_map(|s| s.job_rank()).collect::<Vec<_>>() {
        state.mark_unassigned(job_rank);
    }
    routes[v] = TWRoute::new(v, input.amount_size());
    refresh_vehicle(input, compat, state, routes, v);
}

/// Inserts job `j` (its pair, if it's a pickup) into vehicle `v`'s route at
/// its best feasible rank. Returns `false` if nothing feasible was found.
fn insert_job(
    input: &Input,
    compat: &Compatibility,
    routes: &mut [TWRoute],
    state: &mut SolutionState,
    v: usize,
    j: usize,
) -> bool {
    let job_type = input.jobs()[j].job_type();
    let applied = match job_type {
        JobType::Single => {
            let best = compute_best_insertion_single(input, state, j, v, &routes[v]);
            if best.eval.is_no_eval() {
                false
            } else {
                let vehicle = &input.vehicles()[routes[v].vehicle()];
                routes[v].add(input, vehicle, RouteStep::Job(j), best.rank)
            }
        }
        JobType::Pickup => {
            let best = compute_best_insertion_pd(
                input,
                state,
                j,
                v,
                &routes[v],
                crate::eval::NO_EVAL,
            );
            if best.eval.is_no_eval() {
                false
            } else {
                let vehicle_idx = routes[v].vehicle();
                let vehicle = &input.vehicles()[vehicle_idx];
                let ok1 = routes[v].add(input, vehicle, RouteStep::Job(j), best.pickup_rank);
                if !ok1 {
                    false
                } else {
                    let delivery_rank = if best.delivery_rank >= best.pickup_rank {
                        best.delivery_rank + 1
                    } else {
                        best.delivery_rank
                    };
                    routes[v].add(
                        input,
                        vehicle,
                        RouteStep::Job(j + 1),
                        delivery_rank,
                    )
                }
            }
        }
        JobType::Delivery => false,
    };
    if applied {
        state.mark_assigned(j);
        if job_type == JobType::Pickup {
            state.mark_assigned(j + 1);
        }
        refresh_vehicle(input, compat, state, routes, v);
    }
    applied
}

fn select_next_job(
    input: &Input,
    state: &SolutionState,
    costs: &[Vec<Eval>],
    routes: &[TWRoute],
    v: usize,
    lambda: f64,
) -> Option<usize> {
    let mut best: Option<(usize, u8, f64, Eval)> = None;
    for &j in state.unassigned() {
        let job = &input.jobs()[j];
        if matches!(job.job_type(), JobType::Delivery) {
            continue;
        }
        let eval = match job.job_type() {
            JobType::Single => compute_best_insertion_single(input, state, j, v, &routes[v]).eval,
            JobType::Pickup => {
                compute_best_insertion_pd(input, state, j, v, &routes[v], crate::eval::NO_EVAL).eval
            }
            JobType::Delivery => unreachable!(),
        };
        if eval.is_no_eval() {
            continue;
        }
        let regret = regret_value(&costs[j]);
        let score = eval.cost as f64 - lambda * regret as f64;
        let priority = job.priority();

        let better = match &best {
            None => true,
            Some((_, best_priority, best_score, best_eval)) => {
                priority > *best_priority
                    || (priority == *best_priority
                        && (score < *best_score
                            || (score == *best_score && eval.improves_on(*best_eval))))
            }
        };
        if better {
            best = Some((j, priority, score, eval));
        }
    }
    best.map(|(j, ..)| j)
}

/// Builds an initial assignment for `input` using either the homogeneous
/// (fixed vehicle order) or dynamic (on-the-fly vehicle ownership) variant.
pub fn construct(
    input: &Input,
    compat: &Compatibility,
    config: ConstructionConfig,
    homogeneous: bool,
) -> (Vec<TWRoute>, SolutionState) {
    let nv = input.vehicles().len();
    let mut routes: Vec<TWRoute> = (0..nv)
        .map(|v| TWRoute::new(v, input.amount_size()))
        .collect();
    let mut state = SolutionState::new(input);
    state.setup(input, compat, &routes);

    let costs = build_singleton_costs(input, compat);

    let mut remaining: Vec<usize> = if homogeneous {
        order_by_capacity(input)
    } else {
        (0..nv).collect()
    };

    while !remaining.is_empty() && !state.unassigned().is_empty() {
        let v = if homogeneous {
            remaining.remove(0)
        } else {
            let chosen = pick_dynamic_vehicle(input, &state, &remaining);
            remaining.retain(|&x| x != chosen);
            chosen
        };

        if let Some(seed) = pick_seed_job(input, &costs, &state, v, config.mode) {
            insert_job(input, compat, &mut routes, &mut state, v, seed);
        }

        loop {
            match select_next_job(input, &state, &costs, &routes, v, config.lambda) {
                Some(j) => {
                    if !insert_job(input, compat, &mut routes, &mut state, v, j) {
                        break;
                    }
                }
                None => break,
            }
        }

        enforce_breaks(input, compat, &mut routes, &mut state, v);
    }

    (routes, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::models::{Job, Matrix, ProfileMatrices, Vehicle};
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(4, vec![
            0, 10, 20, 30,
            10, 0, 10, 20,
            20, 10, 0, 10,
            30, 20, 10, 0,
        ]).unwrap();
        let distances = Matrix::from_data(4, vec![
            0, 100, 200, 300,
            100, 0, 100, 200,
            200, 100, 0, 100,
            300, 200, 100, 0,
        ]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![
            Job::single(1, 1, Amount::from_vec(vec![2]), Amount::zero(1)),
            Job::single(2, 2, Amount::from_vec(vec![2]), Amount::zero(1)),
            Job::single(3, 3, Amount::from_vec(vec![2]), Amount::zero(1)),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_construct_homogeneous_serves_all_jobs() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let config = ConstructionConfig { mode: InitMode::Furthest, lambda: 1.0 };
        let (routes, state) = construct(&input, &compat, config, true);
        assert!(state.unassigned().is_empty());
        assert_eq!(routes.iter().map(|r| r.size()).sum::<usize>(), 3);
    }

    #[test]
    fn test_construct_dynamic_serves_all_jobs() {
        let input = sample_input();
        let compat = Compatibility::build(&input);
        let config = ConstructionConfig { mode: InitMode::None, lambda: 1.0 };
        let (routes, state) = construct(&input, &compat, config, false);
        assert!(state.unassigned().is_empty());
        assert_eq!(routes.iter().map(|r| r.size()).sum::<usize>(), 3);
    }

    #[test]
    fn test_fallback_table_has_entries() {
        assert!(!FALLBACK_TABLE.is_empty());
    }
}
