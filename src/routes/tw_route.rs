//! [`TWRoute`]: [`RawRoute`] plus earliest/latest arrival propagation, for
//! time-window feasibility (spec.md §4.3).

use crate::amount::Amount;
use crate::models::{Input, Vehicle};
use crate::routes::raw_route::{step_amounts, step_location};
use crate::routes::{RawRoute, RouteStep};

/// `true` if every `Break::max_load` along `steps` holds against the load
/// carried at the moment the break is taken (spec.md §4.3, "Break
/// placement": "`max_load` is tested against the current load at the break
/// position"). A no-op scan when no break on `vehicle` declares a
/// `max_load`.
fn breaks_max_load_ok(input: &Input, vehicle: &Vehicle, steps: &[RouteStep]) -> bool {
    if !vehicle.breaks().iter().any(|b| b.max_load().is_some()) {
        return true;
    }
    let mut load = Amount::zero(input.amount_size());
    for &step in steps {
        if let RouteStep::Break(idx) = step {
            if let Some(max_load) = vehicle.breaks()[idx].max_load() {
                if !load.le(max_load) {
                    return false;
                }
            }
        }
        let (pickup, delivery) = step_amounts(input, step);
        load = &(&load + &pickup) - &delivery;
    }
    true
}

fn step_time_windows<'a>(input: &'a Input, vehicle: &'a Vehicle, step: RouteStep) -> &'a [crate::models::TimeWindow] {
    match step {
        RouteStep::Job(rank) => input.jobs()[rank].time_windows(),
        RouteStep::Break(idx) => vehicle.breaks()[idx].time_windows(),
    }
}

fn step_action_time(input: &Input, vehicle: &Vehicle, step: RouteStep) -> i64 {
    match step {
        RouteStep::Job(rank) => {
            let job = &input.jobs()[rank];
            job.setup_for(vehicle.profile()) + job.service_for(vehicle.profile())
        }
        RouteStep::Break(idx) => vehicle.breaks()[idx].service(),
    }
}

/// Forward-propagates earliest feasible arrival times through `steps`.
/// Returns `None` if any step's time window can no longer be reached.
fn propagate_earliest(input: &Input, vehicle: &Vehicle, steps: &[RouteStep]) -> Option<Vec<i64>> {
    let mut earliest = Vec::with_capacity(steps.len());
    let mut t = vehicle.time_window().start();
    let mut prev_loc = vehicle.start_index();

    for &step in steps {
        let loc = step_location(input, step);
        let arrival = match (prev_loc, loc) {
            (Some(p), Some(l)) => t + input.travel_duration(vehicle, p, l),
            _ => t,
        };
        let windows = step_time_windows(input, vehicle, step);
        let start = if windows.is_empty() {
            arrival
        } else {
            crate::models::time_window::next_feasible_start(windows, arrival)?
        };
        earliest.push(start);
        t = start + step_action_time(input, vehicle, step);
        if let Some(l) = loc {
            prev_loc = Some(l);
        }
    }

    // Final return to the vehicle's end location must respect its TW end.
    if let (Some(last_loc), Some(end_loc)) = (prev_loc, vehicle.end_index()) {
        let end_time = t + input.travel_duration(vehicle, last_loc, end_loc);
        if end_time > vehicle.time_window().end() {
            return None;
        }
    } else if t > vehicle.time_window().end() {
        return None;
    }

    Some(earliest)
}

/// Backward-propagates latest feasible arrival times through `steps`, given
/// the already-computed `earliest` times (used as a floor so `latest[i] >=
/// earliest[i]` always holds for a feasible route).
fn propagate_latest(
    input: &Input,
    vehicle: &Vehicle,
    steps: &[RouteStep],
    earliest: &[i64],
) -> Vec<i64> {
    let n = steps.len();
    let mut latest = vec![0i64; n];
    let mut t = vehicle.time_window().end();
    let mut next_loc = vehicle.end_index();

    for i in (0..n).rev() {
        let step = steps[i];
        let loc = step_location(input, step);
        let action = step_action_time(input, vehicle, step);
        let travel_to_next = match (loc, next_loc) {
            (Some(l), Some(n)) => input.travel_duration(vehicle, l, n),
            _ => 0,
        };
        let latest_departure = t - travel_to_next;
        let mut latest_start = latest_departure - action;

        let windows = step_time_windows(input, vehicle, step);
        if let Some(tw) = windows.last() {
            latest_start = latest_start.min(tw.end());
        }
        latest_start = latest_start.max(earliest[i]);

        latest[i] = latest_start;
        t = latest_start;
        if let Some(l) = loc {
            next_loc = Some(l);
        }
    }

    latest
}

/// [`RawRoute`] plus cached earliest/latest arrival times, kept consistent
/// with the step sequence by recomputing on every structural edit.
#[derive(Debug, Clone)]
pub struct TWRoute {
    raw: RawRoute,
    earliest: Vec<i64>,
    latest: Vec<i64>,
}

impl TWRoute {
    pub fn new(vehicle: usize, amount_size: usize) -> Self {
        Self {
            raw: RawRoute::new(vehicle, amount_size),
            earliest: Vec::new(),
            latest: Vec::new(),
        }
    }

    pub fn raw(&self) -> &RawRoute {
        &self.raw
    }

    pub fn vehicle(&self) -> usize {
        self.raw.vehicle()
    }

    pub fn steps(&self) -> &[RouteStep] {
        self.raw.steps()
    }

    pub fn size(&self) -> usize {
        self.raw.size()
    }

    pub fn earliest_at(&self, rank: usize) -> i64 {
        self.earliest[rank]
    }

    pub fn latest_at(&self, rank: usize) -> i64 {
        self.latest[rank]
    }

    fn recompute(&mut self, input: &Input, vehicle: &Vehicle) -> bool {
        match propagate_earliest(input, vehicle, self.raw.steps()) {
            Some(earliest) => {
                self.latest = propagate_latest(input, vehicle, self.raw.steps(), &earliest);
                self.earliest = earliest;
                true
            }
            None => false,
        }
    }

    /// `true` if inserting `step` at `at_rank` keeps the whole route
    /// time-window feasible, ignoring capacity.
    pub fn is_valid_addition_for_tw_without_max_load(
        &self,
        input: &Input,
        vehicle: &Vehicle,
        step: RouteStep,
        at_rank: usize,
    ) -> bool {
        let mut candidate = self.raw.steps().to_vec();
        candidate.insert(at_rank, step);
        propagate_earliest(input, vehicle, &candidate).is_some()
    }

    /// `true` if inserting `step` at `at_rank` is capacity, time-window, and
    /// (for breaks) `max_load` feasible — the full check of spec.md §4.3.
    pub fn is_valid_addition_for_tw(
        &self,
        input: &Input,
        vehicle: &Vehicle,
        step: RouteStep,
        pickup: &crate::amount::Amount,
        delivery: &crate::amount::Amount,
        at_rank: usize,
    ) -> bool {
        if !self
            .raw
            .is_valid_addition_for_capacity(vehicle, pickup, delivery, at_rank)
        {
            return false;
        }
        if !self.is_valid_addition_for_tw_without_max_load(input, vehicle, step, at_rank) {
            return false;
        }
        let mut candidate = self.raw.steps().to_vec();
        candidate.insert(at_rank, step);
        breaks_max_load_ok(input, vehicle, &candidate)
    }

    /// `true` if removing the `count` steps starting at `at_rank` leaves a
    /// time-window-feasible route (always true in practice: removing steps
    /// only relaxes arrival times — kept as a real check for safety should a
    /// future operator reorder while removing).
    pub fn is_valid_removal(
        &self,
        input: &Input,
        vehicle: &Vehicle,
        at_rank: usize,
        count: usize,
    ) -> bool {
        let mut candidate = self.raw.steps().to_vec();
        candidate.drain(at_rank..at_rank + count);
        propagate_earliest(input, vehicle, &candidate).is_some()
    }

    /// Inserts `step` at `at_rank`. Returns `false` and leaves the route
    /// unmodified if the result would be time-window infeasible.
    pub fn add(&mut self, input: &Input, vehicle: &Vehicle, step: RouteStep, at_rank: usize) -> bool {
        let mut candidate = self.raw.steps().to_vec();
        candidate.insert(at_rank, step);
        if propagate_earliest(input, vehicle, &candidate).is_none() {
            return false;
        }
        self.raw.add(input, step, at_rank);
        self.recompute(input, vehicle);
        true
    }

    /// Places every one of `vehicle`'s breaks not yet present in the route
    /// (spec.md §4.3 "Break placement"), each at the first rank (scanning
    /// front to back) where it is capacity/TW/`max_load`-feasible, in break
    /// order. Returns `false` as soon as one break cannot be placed anywhere;
    /// breaks already placed by earlier iterations of this same call remain
    /// in the route (callers that require all-or-nothing should check the
    /// return value and discard the route rather than reuse it).
    pub fn place_breaks(&mut self, input: &Input, vehicle: &Vehicle) -> bool {
        let zero = Amount::zero(input.amount_size());
        for (idx, _) in vehicle.breaks().iter().enumerate() {
            if self
                .raw
                .steps()
                .iter()
                .any(|s| matches!(s, RouteStep::Break(i) if *i == idx))
            {
                continue;
            }
            let placed = (0..=self.size()).find(|&rank| {
                self.is_valid_addition_for_tw(input, vehicle, RouteStep::Break(idx), &zero, &zero, rank)
            });
            match placed {
                Some(rank) => {
                    self.add(input, vehicle, RouteStep::Break(idx), rank);
                }
                None => return false,
            }
        }
        true
    }

    /// Removes the step at `at_rank`.
    pub fn remove(&mut self, input: &Input, vehicle: &Vehicle, at_rank: usize) -> RouteStep {
        let removed = self.raw.remove(input, at_rank);
        self.recompute(input, vehicle);
        removed
    }

    /// Replaces the `count`-step range at `at_rank` with `steps`. Returns
    /// `false` and leaves the route unmodified if the result would be
    /// time-window infeasible.
    pub fn replace(
        &mut self,
        input: &Input,
        vehicle: &Vehicle,
        steps: Vec<RouteStep>,
        at_rank: usize,
        count: usize,
    ) -> bool {
        let mut candidate = self.raw.steps().to_vec();
        candidate.splice(at_rank..at_rank + count, steps.iter().copied());
        if propagate_earliest(input, vehicle, &candidate).is_none() {
            return false;
        }
        self.raw.replace(input, steps, at_rank, count);
        self.recompute(input, vehicle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::models::{Break, Job, Matrix, ProfileMatrices, TimeWindow};
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
            Job::single(1, 1, Amount::zero(1), Amount::zero(1))
                .with_time_windows(vec![TimeWindow::new(0, 100).unwrap()]),
            Job::single(2, 2, Amount::zero(1), Amount::zero(1))
                .with_time_windows(vec![TimeWindow::new(0, 5).unwrap()]),
        ];
        let vehicles = vec![Vehicle::new(0, Amount::zero(1))
            .with_start(0)
            .with_end(0)
            .with_time_window(TimeWindow::new(0, 1000).unwrap())];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_add_feasible_step() {
        let input = sample_input();
        let vehicle = &input.vehicles()[0];
        let mut route = TWRoute::new(0, 1);
        assert!(route.add(&input, vehicle, RouteStep::Job(0), 0));
        assert_eq!(route.earliest_at(0), 10);
    }

    #[test]
    fn test_add_infeasible_step_rejected() {
        let input = sample_input();
        let vehicle = &input.vehicles()[0];
        let mut route = TWRoute::new(0, 1);
        // job 1's window ends at 5 but travel there alone takes 20s.
        assert!(!route.add(&input, vehicle, RouteStep::Job(1), 0));
        assert_eq!(route.size(), 0);
    }

    #[test]
    fn test_is_valid_addition_checks_without_mutating() {
        let input = sample_input();
        let vehicle = &input.vehicles()[0];
        let route = TWRoute::new(0, 1);
        assert!(route.is_valid_addition_for_tw_without_max_load(
            &input,
            vehicle,
            RouteStep::Job(0),
            0
        ));
        assert!(!route.is_valid_addition_for_tw_without_max_load(
            &input,
            vehicle,
            RouteStep::Job(1),
            0
        ));
        assert_eq!(route.size(), 0);
    }

    #[test]
    fn test_remove_relaxes_feasibility() {
        let input = sample_input();
        let vehicle = &input.vehicles()[0];
        let mut route = TWRoute::new(0, 1);
        route.add(&input, vehicle, RouteStep::Job(0), 0);
        assert!(route.is_valid_removal(&input, vehicle, 0, 1));
        route.remove(&input, vehicle, 0);
        assert_eq!(route.size(), 0);
    }

    #[test]
    fn test_latest_never_before_earliest() {
        let input = sample_input();
        let vehicle = &input.vehicles()[0];
        let mut route = TWRoute::new(0, 1);
        route.add(&input, vehicle, RouteStep::Job(0), 0);
        assert!(route.latest_at(0) >= route.earliest_at(0));
    }

    #[test]
    fn test_place_breaks_inserts_mandatory_break() {
        let input = sample_input();
        let vehicle = input.vehicles()[0]
            .clone()
            .with_breaks(vec![Break::new(1, vec![TimeWindow::new(0, 1000).unwrap()], 30)]);
        let mut route = TWRoute::new(0, 1);
        route.add(&input, &vehicle, RouteStep::Job(0), 0);
        assert!(route.place_breaks(&input, &vehicle));
        assert!(route.steps().iter().any(|s| matches!(s, RouteStep::Break(0))));
    }

    #[test]
    fn test_place_breaks_rejects_when_no_window_fits() {
        let input = sample_input();
        // break's only window closes before the route can ever reach it.
        let vehicle = input.vehicles()[0]
            .clone()
            .with_breaks(vec![Break::new(1, vec![TimeWindow::new(0, 1).unwrap()], 30)]);
        let mut route = TWRoute::new(0, 1);
        route.add(&input, &vehicle, RouteStep::Job(0), 0);
        assert!(!route.place_breaks(&input, &vehicle));
    }

    fn loaded_input() -> Input {
        let durations = Matrix::from_data(2, vec![0, 10, 10, 0]).unwrap();
        let distances = Matrix::from_data(2, vec![0, 100, 100, 0]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![Job::single(
            1,
            1,
            Amount::from_vec(vec![4]),
            Amount::zero(1),
        )];
        let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10]))
            .with_start(0)
            .with_end(0)
            .with_time_window(TimeWindow::new(0, 1000).unwrap())];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_is_valid_addition_for_tw_rejects_break_over_max_load() {
        let input = loaded_input();
        let vehicle = input.vehicles()[0].clone().with_breaks(vec![Break::new(
            1,
            vec![TimeWindow::new(0, 1000).unwrap()],
            30,
        )
        .with_max_load(Amount::from_vec(vec![3]))]);
        let zero = Amount::zero(1);
        let mut route = TWRoute::new(0, 1);
        route.add(&input, &vehicle, RouteStep::Job(0), 0);

        // load after job 0 is 4, over the break's max_load of 3.
        assert!(!route.is_valid_addition_for_tw(&input, &vehicle, RouteStep::Break(0), &zero, &zero, 1));
        // before job 0, load is still zero: placeable at rank 0.
        assert!(route.is_valid_addition_for_tw(&input, &vehicle, RouteStep::Break(0), &zero, &zero, 0));
    }
}
