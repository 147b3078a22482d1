//! Vehicle↔job and vehicle↔vehicle compatibility tables (spec.md §2 row 2).
//!
//! Precomputed once per solve from the frozen [`Input`]. Three relations:
//!
//! - skill compatibility: `job.skills() ⊆ vehicle.skills()`
//! - singleton feasibility: the job, alone, fits the vehicle's capacity and
//!   can be reached and served within its time window and the vehicle's
//!   time window
//! - vehicle↔vehicle: `true` if the two vehicles share at least one job
//!   both could serve alone — used to prune inter-route operators before
//!   they scan a route pair that could never exchange work (spec.md §4.7).

use crate::eval::Eval;
use crate::models::{Input, Job, Vehicle};

/// `true` if `job.skills()` is a subset of `vehicle.skills()`.
pub fn skills_compatible(vehicle: &Vehicle, job: &Job) -> bool {
    job.skills().is_subset(vehicle.skills())
}

/// `true` if `job`'s own pickup+delivery amount fits within `vehicle`'s
/// capacity in isolation.
pub fn capacity_compatible(vehicle: &Vehicle, job: &Job) -> bool {
    let combined = job.pickup() + job.delivery();
    combined.le(vehicle.capacity())
}

/// `true` if a route visiting only `job` (start -> job -> end) can respect
/// both the job's time windows and the vehicle's overall time window.
pub fn tw_compatible(input: &Input, vehicle: &Vehicle, job: &Job) -> bool {
    let start_loc = vehicle.start_index().unwrap_or(job.location());
    let end_loc = vehicle.end_index().unwrap_or(job.location());
    let vtw = vehicle.time_window();

    let arrival = vtw.start() + input.travel_duration(vehicle, start_loc, job.location());
    let service_start = if job.has_no_time_window() {
        arrival
    } else {
        match crate::models::time_window::next_feasible_start(job.time_windows(), arrival) {
            Some(t) => t,
            None => return false,
        }
    };
    let departure =
        service_start + job.setup_for(vehicle.profile()) + job.service_for(vehicle.profile());
    let end_time = departure + input.travel_duration(vehicle, job.location(), end_loc);
    end_time <= vtw.end()
}

/// The cost of a route visiting only `job` (spec.md §4.6 step 1's
/// `costs[j][v]`): fixed cost plus round-trip travel plus task cost.
/// Returns [`crate::eval::NO_EVAL`] if incompatible.
pub fn singleton_eval(input: &Input, vehicle: &Vehicle, job: &Job) -> Eval {
    if !skills_compatible(vehicle, job)
        || !capacity_compatible(vehicle, job)
        || !tw_compatible(input, vehicle, job)
    {
        return crate::eval::NO_EVAL;
    }
    let start_loc = vehicle.start_index().unwrap_or(job.location());
    let end_loc = vehicle.end_index().unwrap_or(job.location());

    let out_duration = input.travel_duration(vehicle, start_loc, job.location());
    let back_duration = input.travel_duration(vehicle, job.location(), end_loc);
    let out_cost = input.travel_cost(vehicle, start_loc, job.location());
    let back_cost = input.travel_cost(vehicle, job.location(), end_loc);
    let out_distance = input.travel_distance(vehicle, start_loc, job.location());
    let back_distance = input.travel_distance(vehicle, job.location(), end_loc);

    let task_time = job.setup_for(vehicle.profile()) + job.service_for(vehicle.profile());
    let task_cost = vehicle.costs().per_task_hour * task_time / 3600;

    Eval::new(
        vehicle.costs().fixed + out_cost + back_cost + task_cost,
        out_duration + back_duration + task_time,
        out_distance + back_distance,
    )
}

/// Precomputed compatibility relations for one [`Input`].
#[derive(Debug, Clone)]
pub struct Compatibility {
    vehicle_job: Vec<Vec<bool>>,
    vehicle_vehicle: Vec<Vec<bool>>,
}

impl Compatibility {
    /// Builds all tables from `input`. `O(vehicles * jobs)`.
    pub fn build(input: &Input) -> Self {
        let nv = input.vehicles().len();
        let nj = input.jobs().len();

        let mut vehicle_job = vec![vec![false; nj]; nv];
        for (vi, vehicle) in input.vehicles().iter().enumerate() {
            for (ji, job) in input.jobs().iter().enumerate() {
                vehicle_job[vi][ji] = skills_compatible(vehicle, job)
                    && capacity_compatible(vehicle, job)
                    && tw_compatible(input, vehicle, job);
            }
        }

        let mut vehicle_vehicle = vec![vec![false; nv]; nv];
        for v1 in 0..nv {
            for v2 in 0..nv {
                if v1 == v2 {
                    vehicle_vehicle[v1][v2] = true;
                    continue;
                }
                vehicle_vehicle[v1][v2] =
                    (0..nj).any(|j| vehicle_job[v1][j] && vehicle_job[v2][j]);
            }
        }

        Self {
            vehicle_job,
            vehicle_vehicle,
        }
    }

    /// `true` if `vehicle` could serve `job` alone (skills, capacity, TW).
    pub fn is_compatible(&self, vehicle: usize, job: usize) -> bool {
        self.vehicle_job[vehicle][job]
    }

    /// `true` if `v1` and `v2` share at least one job both could serve
    /// alone (always `true` for `v1 == v2`).
    pub fn shares_job(&self, v1: usize, v2: usize) -> bool {
        self.vehicle_vehicle[v1][v2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::models::{Matrix, ProfileMatrices, TimeWindow};
    use std::collections::HashMap;

    fn build_input() -> Input {
        let durations = Matrix::from_data(3, vec![0, 10, 20, 10, 0, 10, 20, 10, 0]).unwrap();
        let distances = Matrix::from_data(3, vec![0, 100, 200, 100, 0, 100, 200, 100, 0]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert(
            "car".to_string(),
            ProfileMatrices::new(durations, distances, None),
        );
        let jobs = vec![
            Job::single(1, 1, Amount::from_vec(vec![0]), Amount::from_vec(vec![5])),
            Job::single(2, 2, Amount::from_vec(vec![0]), Amount::from_vec(vec![5]))
                .with_skills([1].into_iter().collect()),
        ];
        let vehicles = vec![
            Vehicle::new(0, Amount::from_vec(vec![10]))
                .with_start(0)
                .with_end(0),
            Vehicle::new(1, Amount::from_vec(vec![10]))
                .with_start(0)
                .with_end(0)
                .with_skills([1].into_iter().collect()),
        ];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_skills_gate_compatibility() {
        let input = build_input();
        let compat = Compatibility::build(&input);
        assert!(compat.is_compatible(0, 0));
        assert!(!compat.is_compatible(0, 1));
        assert!(compat.is_compatible(1, 1));
    }

    #[test]
    fn test_capacity_incompatible() {
        let input = build_input();
        let job = Job::single(3, 1, Amount::zero(1), Amount::from_vec(vec![20]));
        let vehicle = &input.vehicles()[0];
        assert!(!capacity_compatible(vehicle, &job));
    }

    #[test]
    fn test_tw_incompatible_when_unreachable() {
        let input = build_input();
        let vehicle = Vehicle::new(0, Amount::from_vec(vec![10]))
            .with_start(0)
            .with_end(0)
            .with_time_window(TimeWindow::new(0, 15).unwrap());
        let job = &input.jobs()[1]; // distance 20 from depot, one-way already exceeds TW
        assert!(!tw_compatible(&input, &vehicle, job));
    }

    #[test]
    fn test_vehicle_vehicle_sharing() {
        let input = build_input();
        let compat = Compatibility::build(&input);
        // v0 can serve job 0 only; v1 can serve job 1 only (and job0 too since no skills req).
        assert!(compat.shares_job(0, 0));
        // v0 handles job0, v1 handles job0 and job1 -> they share job0.
        assert!(compat.shares_job(0, 1));
    }

    #[test]
    fn test_singleton_eval_infeasible_returns_no_eval() {
        let input = build_input();
        let vehicle = &input.vehicles()[0];
        let job = &input.jobs()[1];
        assert!(singleton_eval(&input, vehicle, job).is_no_eval());
    }

    #[test]
    fn test_singleton_eval_feasible() {
        let input = build_input();
        let vehicle = &input.vehicles()[0];
        let job = &input.jobs()[0];
        let e = singleton_eval(&input, vehicle, job);
        assert!(!e.is_no_eval());
        assert_eq!(e.distance, 200); // depot->loc1 (100) + loc1->depot (100)
    }
}
