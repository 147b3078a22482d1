//! Best-improvement local search over the [`crate::operators`] catalogue,
//! interleaved with ruin-and-recreate (spec.md §4.8/§4.9).
//!
//! Reimplemented directly against [`TWRoute`]/[`SolutionState`] rather than
//! the teacher's ALNS harness (`alns::{destroy, repair}`, built on the
//! now-absent `u_metaheur` crate — see `DESIGN.md`'s "Dropped from the
//! teacher" section); the removal-scoring shape of `alns::destroy`'s
//! `WorstRemoval` is kept as the model for `remove_from_routes`.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Instant;

use crate::compatibility::Compatibility;
use crate::eval::Eval;
use crate::insertion::{compute_best_insertion_pd, compute_best_insertion_single};
use crate::models::{Input, JobType};
use crate::operators::*;
use crate::routes::{RouteStep, TWRoute};
use crate::solution_state::SolutionState;

/// Lexicographic ranking of a candidate solution (spec.md §4.9): lower is
/// better throughout except `assigned`, wrapped in [`Reverse`] so more
/// assigned jobs rank ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Indicators {
    unassigned_priority: u64,
    assigned: Reverse<usize>,
    vehicles_used: usize,
    cost: Eval,
}

impl Indicators {
    pub fn compute(input: &Input, state: &SolutionState, routes: &[TWRoute]) -> Self {
        let unassigned_priority = state
            .unassigned()
            .iter()
            .map(|&j| input.jobs()[j].priority() as u64)
            .sum();
        let assigned = input.jobs().len() - state.unassigned().len();
        let vehicles_used = routes.iter().filter(|r| !r.steps().is_empty()).count();
        let cost = (0..routes.len()).map(|v| state.route_eval(v)).fold(Eval::zero(), |a, b| a + b);
        Self {
            unassigned_priority,
            assigned: Reverse(assigned),
            vehicles_used,
            cost,
        }
    }
}

fn all_job_ranks(routes: &[TWRoute]) -> HashSet<usize> {
    routes
        .iter()
        .flat_map(|r| r.steps().iter().filter_map(|s| s.job_rank()))
        .collect()
}

/// Simulates `op.apply` on a scratch copy of `routes` and reports how many
/// jobs moved to/from the unassigned pool and the resulting priority delta
/// (spec.md §4.7's move-selection `(priority_gain, removal_count)`).
///
/// Generic over every [`LsOperator`] kind: rather than special-case which
/// catalogue entries touch the unassigned pool, this just diffs route
/// membership before and after a dry-run `apply`.
fn unassigned_delta(op: &dyn LsOperator, input: &Input, routes: &[TWRoute]) -> (i64, usize) {
    let mut scratch = routes.to_vec();
    let mut dummy_state = SolutionState::new(input);
    op.apply(input, &mut scratch, &mut dummy_state);
    let before = all_job_ranks(routes);
    let after = all_job_ranks(&scratch);
    let newly_assigned: i64 = after
        .difference(&before)
        .map(|&j| input.jobs()[j].priority() as i64)
        .sum();
    let newly_unassigned_priority: i64 = before
        .difference(&after)
        .map(|&j| input.jobs()[j].priority() as i64)
        .sum();
    let removal_count = before.difference(&after).count();
    (newly_assigned - newly_unassigned_priority, removal_count)
}

/// Globally-best-move rank for one LS step: minimum wins, breaking ties by
/// `(priority_gain ↓, removal_count ↑, gain ↓)` (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    rank: MoveRank,
    index: usize,
}

fn route_pair_allowed(v: usize, v_prime: usize, compat: &Compatibility, state: &SolutionState) -> bool {
    v == v_prime || (compat.shares_job(v, v_prime) && state.route_bbox(v).intersects(&state.route_bbox(v_prime)))
}

/// Builds every syntactically-applicable operator instance for the current
/// routes. Candidate generation is exhaustive rather than neighbor-list
/// pruned (see `DESIGN.md`'s Open Question decisions) — fine for
/// correctness, not tuned for the route sizes a production deployment of
/// this engine would see.
fn generate_candidates(
    input: &Input,
    compat: &Compatibility,
    state: &SolutionState,
    routes: &[TWRoute],
    allow_tsp_fix: bool,
) -> Vec<Box<dyn LsOperator>> {
    let nv = routes.len();
    let mut ops: Vec<Box<dyn LsOperator>> = Vec::new();

    for v in 0..nv {
        for v_prime in 0..nv {
            if !route_pair_allowed(v, v_prime, compat, state) {
                continue;
            }
            let size_v = routes[v].size();
            let size_vp = routes[v_prime].size();

            for s_rank in 0..size_v {
                ops.push(Box::new(RelocateOp::new(v, s_rank, v_prime)));
                if s_rank + 1 < size_v {
                    ops.push(Box::new(OrOptOp::new(v, s_rank, v_prime, false)));
                    ops.push(Box::new(OrOptOp::new(v, s_rank, v_prime, true)));
                }
                if v != v_prime {
                    if let Some(RouteStep::Job(r)) = routes[v].steps().get(s_rank) {
                        if matches!(input.jobs()[*r].job_type(), JobType::Pickup) {
                            ops.push(Box::new(PdShiftOp::new(v, s_rank, v_prime)));
                        }
                    }
                }
            }

            for s_rank in 0..=size_v {
                for t_rank in 0..=size_vp {
                    if v == v_prime && s_rank >= t_rank {
                        continue;
                    }
                    ops.push(Box::new(TwoOptOp::new(v, s_rank, v_prime, t_rank, false)));
                    if v != v_prime {
                        ops.push(Box::new(TwoOptOp::new(v, s_rank, v_prime, t_rank, true)));
                    }
                }
            }

            for s_rank in 0..size_v {
                for t_rank in 0..size_vp {
                    if v == v_prime && s_rank == t_rank {
                        continue;
                    }
                    for &(src_len, tgt_len) in &[(1usize, 1usize), (2, 2), (1, 2)] {
                        if v != v_prime && src_len == 1 && tgt_len == 1 {
                            continue; // no bare inter-route single-for-single swap
                        }
                        if s_rank + src_len > size_v || t_rank + tgt_len > size_vp {
                            continue;
                        }
                        ops.push(Box::new(ExchangeOp::new(v, s_rank, src_len, v_prime, t_rank, tgt_len, false, false)));
                        ops.push(Box::new(ExchangeOp::new(v, s_rank, src_len, v_prime, t_rank, tgt_len, true, true)));
                    }
                    if v != v_prime {
                        ops.push(Box::new(SwapStarOp::new(v, s_rank, v_prime, t_rank)));
                    }
                }
            }

            if v != v_prime && v < v_prime {
                ops.push(Box::new(RouteExchangeOp::new(v, v_prime)));
            }
            if v != v_prime && routes[v_prime].steps().is_empty() {
                for split_rank in 1..size_v {
                    ops.push(Box::new(RouteSplitOp::new(v, split_rank, v_prime)));
                }
            }
        }

        if allow_tsp_fix {
            ops.push(Box::new(TspFixOp::new(v)));
        }

        for &candidate in state.unassigned() {
            let size_v = routes[v].size();
            for split_rank in 1..size_v {
                ops.push(Box::new(PriorityReplaceOp::new(v, split_rank, true, candidate)));
                ops.push(Box::new(PriorityReplaceOp::new(v, split_rank, false, candidate)));
            }
            for s_rank in 0..size_v {
                for t_rank in (s_rank + 1)..=size_v {
                    ops.push(Box::new(UnassignedExchangeOp::new(v, s_rank, t_rank, candidate)));
                }
            }
        }
    }

    ops
}

/// One best-improvement LS step: evaluate every candidate operator, apply
/// the globally best positive-gain move, refresh caches, and try to slot
/// unassigned jobs back in. Returns `true` if a move was applied.
pub fn run_ls_step(
    input: &Input,
    compat: &Compatibility,
    state: &mut SolutionState,
    routes: &mut [TWRoute],
    allow_tsp_fix: bool,
) -> bool {
    let mut candidates = generate_candidates(input, compat, state, routes, allow_tsp_fix);

    let mut best: Option<Candidate> = None;
    let mut best_gain = Eval::zero();
    for (i, op) in candidates.iter_mut().enumerate() {
        if !op.is_valid(input, routes) {
            continue;
        }
        let bound = op.gain_upper_bound(input, state);
        // Upper bound can't beat the current best; skip the expensive compute_gain.
        if best.is_some() && !bound.is_no_eval() && !bound.improves_on(best_gain) && bound != best_gain {
            continue;
        }
        op.compute_gain(input, state, routes);
        let gain = op.gain();
        if gain.is_no_eval() || !gain.improves_on(Eval::zero()) {
            continue;
        }
        let (priority_gain, removal_count) = unassigned_delta(op.as_ref(), input, routes);
        let rank = MoveRank::new(priority_gain.max(0) as u32, removal_count, gain);
        let candidate = Candidate { rank, index: i };
        let replace = match &best {
            None => true,
            Some(b) => candidate.rank < b.rank,
        };
        if replace {
            best_gain = gain;
            best = Some(candidate);
        }
    }

    let Some(winner) = best else {
        return false;
    };

    let op = &candidates[winner.index];
    op.apply(input, routes, state);
    for &v in &op.update_candidates() {
        refresh_vehicle(input, compat, state, routes, v);
    }
    try_job_additions(input, compat, state, routes, &op.addition_candidates(), 1.0);
    for &v in &op.addition_candidates() {
        enforce_breaks(input, compat, routes, state, v);
    }
    true
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
    state.update_costs(input, routes, v);
    state.update_skills(input, compat, routes, v);
    state.set_node_gains(input, routes, v);
    state.set_edge_gains(input, routes, v);
    state.set_pd_matching_ranks(input, routes, v);
    state.set_pd_gains(input, routes, v);
    state.set_insertion_ranks(input, routes, v);
}

/// §4.8: repeatedly insert the best-regret unassigned job into the
/// supplied vehicles until none fit.
pub fn try_job_additions(
    input: &Input,
    compat: &Compatibility,
    state: &mut SolutionState,
    routes: &mut [TWRoute],
    vehicles: &[usize],
    regret: f64,
) {
    loop {
        let candidates: Vec<usize> = state
            .unassigned()
            .iter()
            .copied()
            .filter(|&j| !matches!(input.jobs()[j].job_type(), JobType::Delivery))
            .collect();
        if candidates.is_empty() {
            break;
        }

        struct Pick {
            job: usize,
            vehicle: usize,
            priority: u8,
            score: f64,
        }

        let mut best: Option<Pick> = None;
        for &j in &candidates {
            let mut per_vehicle: Vec<(usize, Eval)> = Vec::with_capacity(vehicles.len());
            for &v in vehicles {
                if !compat.is_compatible(v, j) {
                    continue;
                }
                let eval = match input.jobs()[j].job_type() {
                    JobType::Single => compute_best_insertion_single(input, state, j, v, &routes[v]).eval,
                    JobType::Pickup => {
                        compute_best_insertion_pd(input, state, j, v, &routes[v], crate::eval::NO_EVAL).eval
                    }
                    JobType::Delivery => unreachable!(),
                };
                if !eval.is_no_eval() {
                    per_vehicle.push((v, eval));
                }
            }
            per_vehicle.sort_by_key(|(_, e)| *e);
            let Some(&(best_vehicle, best_eval)) = per_vehicle.first() else {
                continue;
            };
            let regret_value = per_vehicle.get(1).map_or(0, |(_, e)| e.cost - best_eval.cost);
            let score = best_eval.cost as f64 - regret * regret_value as f64;
            let priority = input.jobs()[j].priority();

            let better = match &best {
                None => true,
                Some(b) => priority > b.priority || (priority == b.priority && score < b.score),
            };
            if better {
                best = Some(Pick { job: j, vehicle: best_vehicle, priority, score });
            }
        }

        let Some(picked) = best else {
            break;
        };
        let (job, vehicle) = (picked.job, picked.vehicle);

        match input.jobs()[job].job_type() {
            JobType::Single => {
                let insertion = compute_best_insertion_single(input, state, job, vehicle, &routes[vehicle]);
                if insertion.eval.is_no_eval() {
                    break;
                }
                routes[vehicle].add(input, &input.vehicles()[vehicle], RouteStep::Job(job), insertion.rank);
                state.mark_assigned(job);
            }
            JobType::Pickup => {
                let insertion =
                    compute_best_insertion_pd(input, state, job, vehicle, &routes[vehicle], crate::eval::NO_EVAL);
                if insertion.eval.is_no_eval() {
                    break;
                }
                let vehicle_ref = input.vehicles()[vehicle].clone();
                routes[vehicle].add(input, &vehicle_ref, RouteStep::Job(job), insertion.pickup_rank);
                routes[vehicle].add(input, &vehicle_ref, RouteStep::Job(job + 1), insertion.delivery_rank);
                state.mark_assigned(job);
                state.mark_assigned(job + 1);
            }
            JobType::Delivery => unreachable!(),
        }
        refresh_vehicle(input, compat, state, routes, vehicle);
    }
}

/// `remove_from_routes` (spec.md §4.9): for each non-empty route, evict the
/// job (or P/D pair) with the highest `node_gain - relocate_cost_lower_bound`.
pub fn remove_from_routes(input: &Input, compat: &Compatibility, state: &mut SolutionState, routes: &mut [TWRoute]) {
    let nv = routes.len();
    for v in 0..nv {
        if routes[v].steps().is_empty() {
            continue;
        }
        let mut best_rank = None;
        let mut best_score = i64::MIN;
        for (rank, step) in routes[v].steps().iter().enumerate() {
            let Some(job_rank) = step.job_rank() else { continue };
            if matches!(input.jobs()[job_rank].job_type(), JobType::Delivery) {
                continue;
            }
            let node_gain = if matches!(input.jobs()[job_rank].job_type(), JobType::Pickup) {
                state.pd_gain(v, rank)
            } else {
                state.node_gain(v, rank)
            };
            if node_gain.is_no_eval() {
                continue;
            }
            let lower_bound = (0..nv)
                .filter(|&v_prime| v_prime != v && compat.is_compatible(v_prime, job_rank))
                .map(|v_prime| relocate_cost_lower_bound(input, routes, v_prime, job_rank))
                .min()
                .unwrap_or(0);
            let score = node_gain.cost - lower_bound;
            if score > best_score {
                best_score = score;
                best_rank = Some((rank, job_rank));
            }
        }

        if let Some((rank, job_rank)) = best_rank {
            let vehicle = input.vehicles()[routes[v].vehicle()].clone();
            if matches!(input.jobs()[job_rank].job_type(), JobType::Pickup) {
                if let Some(delivery_rank) = state.matching_delivery_rank(v, rank) {
                    let hi = rank.max(delivery_rank);
                    let lo = rank.min(delivery_rank);
                    routes[v].remove(input, &vehicle, hi);
                    routes[v].remove(input, &vehicle, lo);
                    state.mark_unassigned(job_rank);
                    state.mark_unassigned(job_rank + 1);
                }
            } else {
                routes[v].remove(input, &vehicle, rank);
                state.mark_unassigned(job_rank);
            }
            refresh_vehicle(input, compat, state, routes, v);
        }
    }
}

fn relocate_cost_lower_bound(input: &Input, routes: &[TWRoute], v_prime: usize, job_rank: usize) -> i64 {
    let vehicle = &input.vehicles()[routes[v_prime].vehicle()];
    let loc = input.jobs()[job_rank].location();
    routes[v_prime]
        .steps()
        .iter()
        .filter_map(|s| s.job_rank())
        .map(|other| {
            let other_loc = input.jobs()[other].location();
            input.travel_cost(vehicle, loc, other_loc).min(input.travel_cost(vehicle, other_loc, loc))
        })
        .min()
        .unwrap_or(0)
}

/// Places vehicle `v`'s mandatory breaks (spec.md §3 "every break is placed
/// within one of its allowed windows"). If they can't all be placed, the
/// route is infeasible as a whole: every job on it is released back to the
/// unassigned pool rather than shipped without its breaks.
fn enforce_breaks(input: &Input, compat: &Compatibility, routes: &mut [TWRoute], state: &mut SolutionState, v: usize) {
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

/// Outer ruin-and-recreate loop (spec.md §4.9).
pub fn optimize(
    input: &Input,
    compat: &Compatibility,
    mut routes: Vec<TWRoute>,
    mut state: SolutionState,
    depth: usize,
    deadline: Option<Instant>,
    allow_tsp_fix: bool,
) -> (Vec<TWRoute>, SolutionState) {
    let mut best_routes = routes.clone();
    let mut best_state = state.clone();
    let mut best_indicators = Indicators::compute(input, &state, &routes);
    let mut best_completed_depth: Option<usize> = None;

    loop {
        if deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }
        while run_ls_step(input, compat, &mut state, &mut routes, allow_tsp_fix) {
            if deadline.map_or(false, |d| Instant::now() >= d) {
                break;
            }
        }

        let current_indicators = Indicators::compute(input, &state, &routes);
        if current_indicators < best_indicators {
            tracing::debug!(cost = current_indicators.cost.cost, assigned = current_indicators.assigned.0, "ls step improved solution");
            best_indicators = current_indicators;
            best_routes = routes.clone();
            best_state = state.clone();
        } else if best_indicators < current_indicators {
            routes = best_routes.clone();
            state = best_state.clone();
        }

        best_completed_depth = Some(best_completed_depth.map_or(0, |d| d + 1));
        if best_completed_depth.unwrap() + 1 > depth || deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }

        let ruin_rounds = best_completed_depth.unwrap() + 1;
        tracing::trace!(ruin_rounds, "ruin-and-recreate round");
        for _ in 0..=best_completed_depth.unwrap() {
            remove_from_routes(input, compat, &mut state, &mut routes);
        }
        let all_vehicles: Vec<usize> = (0..routes.len()).collect();
        try_job_additions(input, compat, &mut state, &mut routes, &all_vehicles, 1.5);
        for &v in &all_vehicles {
            enforce_breaks(input, compat, &mut routes, &mut state, v);
        }
    }

    (best_routes, best_state)
}
