//! [`RawRoute`]: ordered step sequence with an incrementally-tracked load
//! profile, used for capacity feasibility (spec.md §4.2).

use crate::amount::Amount;
use crate::models::{Input, Vehicle};
use crate::routes::RouteStep;

/// The (job) location visited by a step; breaks are stationary and don't
/// have a location of their own, so this returns `None` for them.
pub(crate) fn step_location(input: &Input, step: RouteStep) -> Option<usize> {
    match step {
        RouteStep::Job(rank) => input.jobs().get(rank).map(|j| j.location()),
        RouteStep::Break(_) => None,
    }
}

/// The `(pickup, delivery)` amount carried by one step; zero for breaks.
pub(crate) fn step_amounts(input: &Input, step: RouteStep) -> (Amount, Amount) {
    match step {
        RouteStep::Job(rank) => {
            let job = &input.jobs()[rank];
            (job.pickup().clone(), job.delivery().clone())
        }
        RouteStep::Break(_) => (
            Amount::zero(input.amount_size()),
            Amount::zero(input.amount_size()),
        ),
    }
}

/// An ordered step sequence for one vehicle, with the running load after
/// each step cached so capacity feasibility of a hypothetical insertion can
/// be checked without replaying the entire route.
///
/// Loads are recomputed for the whole affected suffix on every structural
/// edit (`O(route length)`), rather than VROOM's amortized incremental
/// update — simpler to keep correct, and routes stay short relative to the
/// instance size in practice.
#[derive(Debug, Clone)]
pub struct RawRoute {
    vehicle: usize,
    steps: Vec<RouteStep>,
    /// `loads[i]` is the load after the first `i` steps; `loads[0]` is
    /// always zero. Length is always `steps.len() + 1`.
    loads: Vec<Amount>,
    amount_size: usize,
}

impl RawRoute {
    /// Creates an empty route for `vehicle` (its rank into `Input::vehicles`).
    pub fn new(vehicle: usize, amount_size: usize) -> Self {
        Self {
            vehicle,
            steps: Vec::new(),
            loads: vec![Amount::zero(amount_size)],
            amount_size,
        }
    }

    pub fn vehicle(&self) -> usize {
        self.vehicle
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn size(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Load after the first `rank` steps (`rank` in `0..=size()`).
    pub fn load_at(&self, rank: usize) -> &Amount {
        &self.loads[rank]
    }

    /// Elementwise peak load reached anywhere along the route.
    pub fn max_load(&self) -> Amount {
        self.loads
            .iter()
            .fold(Amount::zero(self.amount_size), |acc, l| acc.max(l))
    }

    fn recompute_loads_from(&mut self, input: &Input, from_rank: usize) {
        self.loads.truncate(from_rank + 1);
        for i in from_rank..self.steps.len() {
            let (pickup, delivery) = step_amounts(input, self.steps[i]);
            let next = &(&self.loads[i] + &pickup) - &delivery;
            self.loads.push(next);
        }
    }

    /// Inserts `step` at `at_rank`, shifting later steps back.
    ///
    /// # Panics
    ///
    /// Panics if `at_rank > size()`.
    pub fn add(&mut self, input: &Input, step: RouteStep, at_rank: usize) {
        assert!(at_rank <= self.steps.len(), "insertion rank out of range");
        self.steps.insert(at_rank, step);
        self.recompute_loads_from(input, at_rank);
    }

    /// Removes the step at `at_rank`, returning it.
    ///
    /// # Panics
    ///
    /// Panics if `at_rank >= size()`.
    pub fn remove(&mut self, input: &Input, at_rank: usize) -> RouteStep {
        let removed = self.steps.remove(at_rank);
        self.recompute_loads_from(input, at_rank);
        removed
    }

    /// Replaces the `count`-step range starting at `at_rank` with `steps`.
    pub fn replace(
        &mut self,
        input: &Input,
        steps: impl IntoIterator<Item = RouteStep>,
        at_rank: usize,
        count: usize,
    ) {
        assert!(at_rank + count <= self.steps.len(), "replace range out of bounds");
        self.steps.splice(at_rank..at_rank + count, steps);
        self.recompute_loads_from(input, at_rank);
    }

    /// `true` if inserting one step carrying `(pickup, delivery)` at
    /// `at_rank` keeps every intermediate load within `vehicle`'s capacity.
    pub fn is_valid_addition_for_capacity(
        &self,
        vehicle: &Vehicle,
        pickup: &Amount,
        delivery: &Amount,
        at_rank: usize,
    ) -> bool {
        let base = &self.loads[at_rank];
        let new_load = &(base + pickup) - delivery;
        if !new_load.le(vehicle.capacity()) {
            return false;
        }
        let delta = &(pickup.clone()) - delivery;
        self.loads[at_rank..]
            .iter()
            .all(|l| (&delta + l).le(vehicle.capacity()))
    }

    /// `true` if inserting a pickup at `first_rank` and its matching
    /// delivery at `last_rank` (`first_rank <= last_rank`) keeps every
    /// intermediate load within `vehicle`'s capacity: the `pickup` amount is
    /// carried for every step strictly between the two insertion points.
    pub fn is_valid_addition_for_capacity_inclusion(
        &self,
        vehicle: &Vehicle,
        pickup: &Amount,
        delivery: &Amount,
        first_rank: usize,
        last_rank: usize,
    ) -> bool {
        debug_assert!(first_rank <= last_rank);
        let at_first = &self.loads[first_rank] + pickup;
        if !at_first.le(vehicle.capacity()) {
            return false;
        }
        if !self.loads[first_rank..=last_rank.min(self.loads.len() - 1)]
            .iter()
            .all(|l| (pickup + l).le(vehicle.capacity()))
        {
            return false;
        }
        // delivery is applied at last_rank; the net carried amount there
        // must also respect capacity (normally pickup == delivery, so this
        // is a no-op check, but shipments need not balance exactly).
        let at_last = &(&self.loads[last_rank] + pickup) - delivery;
        at_last.le(vehicle.capacity())
    }

    /// `true` if shifting every load in `[first_rank, last_rank)` by `delta`
    /// (componentwise) keeps it within `vehicle`'s capacity. Used by
    /// segment-moving operators (e.g. swap*, route exchange) to check a
    /// whole relocated block at once rather than step by step.
    pub fn is_valid_addition_for_capacity_margins(
        &self,
        vehicle: &Vehicle,
        delta: &Amount,
        first_rank: usize,
        last_rank: usize,
    ) -> bool {
        let last = last_rank.min(self.loads.len());
        self.loads[first_rank..last]
            .iter()
            .all(|l| (delta + l).le(vehicle.capacity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, Matrix, ProfileMatrices};
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::new(3);
        let distances = Matrix::new(3);
        let mut matrices = HashMap::new();
        matrices.insert(
            "car".to_string(),
            ProfileMatrices::new(durations, distances, None),
        );
        let jobs = vec![
            Job::single(
                1,
                0,
                Amount::from_vec(vec![5]),
                Amount::from_vec(vec![0]),
            ),
            Job::single(
                2,
                1,
                Amount::from_vec(vec![0]),
                Amount::from_vec(vec![3]),
            ),
        ];
        let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10]))];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_add_updates_loads() {
        let input = sample_input();
        let mut route = RawRoute::new(0, 1);
        route.add(&input, RouteStep::Job(0), 0);
        assert_eq!(route.load_at(1).get(0), 5);
        route.add(&input, RouteStep::Job(1), 1);
        assert_eq!(route.load_at(2).get(0), 2);
        assert_eq!(route.max_load().get(0), 5);
    }

    #[test]
    fn test_remove_shrinks_loads() {
        let input = sample_input();
        let mut route = RawRoute::new(0, 1);
        route.add(&input, RouteStep::Job(0), 0);
        route.add(&input, RouteStep::Job(1), 1);
        let removed = route.remove(&input, 0);
        assert_eq!(removed, RouteStep::Job(0));
        assert_eq!(route.size(), 1);
        assert_eq!(route.load_at(1).get(0), -3);
    }

    #[test]
    fn test_capacity_addition_rejected_over_capacity() {
        let input = sample_input();
        let mut route = RawRoute::new(0, 1);
        route.add(&input, RouteStep::Job(0), 0);
        let vehicle = &input.vehicles()[0];
        let too_much = Amount::from_vec(vec![6]);
        let zero = Amount::zero(1);
        assert!(!route.is_valid_addition_for_capacity(vehicle, &too_much, &zero, 1));
    }

    #[test]
    fn test_capacity_addition_accepted_within_capacity() {
        let input = sample_input();
        let route = RawRoute::new(0, 1);
        let vehicle = &input.vehicles()[0];
        let amt = Amount::from_vec(vec![4]);
        let zero = Amount::zero(1);
        assert!(route.is_valid_addition_for_capacity(vehicle, &amt, &zero, 0));
    }

    #[test]
    fn test_replace_range() {
        let input = sample_input();
        let mut route = RawRoute::new(0, 1);
        route.add(&input, RouteStep::Job(0), 0);
        route.add(&input, RouteStep::Job(1), 1);
        route.replace(&input, [RouteStep::Job(1)], 0, 2);
        assert_eq!(route.steps(), &[RouteStep::Job(1)]);
        assert_eq!(route.load_at(1).get(0), -3);
    }
}
