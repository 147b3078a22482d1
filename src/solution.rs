//! Final route assembly: walks each `TWRoute` and emits per-step timing,
//! load, and priority totals for reporting (spec.md §4.10).
//!
//! Grounded on `evaluation/evaluator.rs::build_route`'s visit-by-visit
//! accumulation, generalized from a flat customer-id walk to the
//! job/break step sequence of [`crate::routes::TWRoute`] and widened with
//! break attribution and cost unscaling.

use crate::amount::Amount;
use crate::eval::Eval;
use crate::models::{Input, JobType, Vehicle};
use crate::routes::{RouteStep, TWRoute};

/// One stop along an assembled route, in user-facing (unscaled) units.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionStep {
    pub kind: StepKind,
    pub location: Option<usize>,
    pub arrival: i64,
    pub waiting_time: i64,
    pub duration: i64,
    pub distance: i64,
    pub load: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Start,
    End,
    Job { job_id: u64, job_type: JobType },
    Break { break_id: u64 },
}

/// One vehicle's assembled route: its steps plus route-level totals.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionRoute {
    pub vehicle_id: u64,
    pub steps: Vec<SolutionStep>,
    pub cost: f64,
    pub duration: i64,
    pub distance: i64,
    pub priority: u32,
}

/// The fully-assembled output of one solve: every non-empty route plus the
/// ids of jobs that never made it off the unassigned pool.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solution {
    pub routes: Vec<SolutionRoute>,
    pub unassigned: Vec<u64>,
    pub cost: f64,
}

/// Walks `route`'s steps, accumulating arrival/waiting/cumulative
/// duration/distance/load, and returns the assembled [`SolutionRoute`].
/// Returns `None` for an empty route (nothing to report).
pub fn assemble_route(input: &Input, route: &TWRoute) -> Option<SolutionRoute> {
    if route.steps().is_empty() {
        return None;
    }

    let vehicle = &input.vehicles()[route.vehicle()];
    let mut steps = Vec::with_capacity(route.steps().len() + 2);
    let mut cumulative_duration = 0i64;
    let mut cumulative_distance = 0i64;
    let mut priority_sum = 0u32;
    let mut prev_loc = vehicle.start_index();
    let mut prev_departure = route.earliest_at(0).min(vehicle.time_window().start());

    if let Some(start_loc) = vehicle.start_index() {
        steps.push(SolutionStep {
            kind: StepKind::Start,
            location: Some(start_loc),
            arrival: vehicle.time_window().start(),
            waiting_time: 0,
            duration: 0,
            distance: 0,
            load: route.raw().load_at(0),
        });
        prev_departure = vehicle.time_window().start();
    }

    for (rank, step) in route.steps().iter().enumerate() {
        let arrival_time = route.earliest_at(rank);
        let (loc, action_time) = match *step {
            RouteStep::Job(job_rank) => {
                let job = &input.jobs()[job_rank];
                priority_sum += job.priority() as u32;
                (
                    Some(job.location()),
                    job.setup_for(vehicle.profile()) + job.service_for(vehicle.profile()),
                )
            }
            RouteStep::Break(idx) => (None, vehicle.breaks()[idx].service()),
        };

        let travel_duration = match (prev_loc, loc) {
            (Some(p), Some(l)) => input.travel_duration(vehicle, p, l),
            _ => 0,
        };
        let travel_distance = match (prev_loc, loc) {
            (Some(p), Some(l)) => input.travel_distance(vehicle, p, l),
            _ => 0,
        };
        cumulative_duration += travel_duration;
        cumulative_distance += travel_distance;

        let waiting_time = (arrival_time - (prev_departure + travel_duration)).max(0);
        cumulative_duration += waiting_time;

        let kind = match *step {
            RouteStep::Job(job_rank) => {
                let job = &input.jobs()[job_rank];
                StepKind::Job { job_id: job.id(), job_type: job.job_type() }
            }
            RouteStep::Break(idx) => StepKind::Break { break_id: vehicle.breaks()[idx].id() },
        };

        steps.push(SolutionStep {
            kind,
            location: loc,
            arrival: arrival_time,
            waiting_time,
            duration: cumulative_duration,
            distance: cumulative_distance,
            load: route.raw().load_at(rank + 1).clone(),
        });

        cumulative_duration += action_time;
        prev_departure = arrival_time + action_time;
        if let Some(l) = loc {
            prev_loc = Some(l);
        }
    }

    if let Some(end_loc) = vehicle.end_index() {
        let travel_duration = match prev_loc {
            Some(p) => input.travel_duration(vehicle, p, end_loc),
            None => 0,
        };
        let travel_distance = match prev_loc {
            Some(p) => input.travel_distance(vehicle, p, end_loc),
            None => 0,
        };
        cumulative_duration += travel_duration;
        cumulative_distance += travel_distance;
        steps.push(SolutionStep {
            kind: StepKind::End,
            location: Some(end_loc),
            arrival: prev_departure + travel_duration,
            waiting_time: 0,
            duration: cumulative_duration,
            distance: cumulative_distance,
            load: route.raw().load_at(route.size()).clone(),
        });
    }

    let cost = route_cost(input, vehicle, route) as f64 * input.cost_scale();

    Some(SolutionRoute {
        vehicle_id: vehicle.id(),
        steps,
        cost,
        duration: cumulative_duration,
        distance: cumulative_distance,
        priority: priority_sum,
    })
}

fn route_cost(input: &Input, vehicle: &Vehicle, route: &TWRoute) -> i64 {
    crate::solution_state::route_eval_with(input, vehicle, route.steps()).cost
}

/// Assembles the full [`Solution`] from final routes and the unassigned set
/// (spec.md §4.10): undoes internal cost scaling and lists unassigned jobs
/// by their external id.
pub fn assemble_solution(
    input: &Input,
    routes: &[TWRoute],
    unassigned_ranks: impl IntoIterator<Item = usize>,
) -> Solution {
    let mut assembled = Vec::new();
    let mut total_cost = 0.0;
    for route in routes {
        if let Some(r) = assemble_route(input, route) {
            total_cost += r.cost;
            assembled.push(r);
        }
    }
    let unassigned = unassigned_ranks
        .into_iter()
        .map(|rank| input.jobs()[rank].id())
        .collect();
    Solution {
        routes: assembled,
        unassigned,
        cost: total_cost,
    }
}
