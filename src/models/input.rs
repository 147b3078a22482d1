//! The frozen, immutable problem instance the solver operates on.

use std::collections::HashMap;

use crate::models::{Job, JobType, ProfileMatrices, Vehicle};

/// Bundles jobs, vehicles, and per-profile travel matrices for one solve
/// (spec.md §3).
///
/// Constructed once by the external parsing/validation collaborator
/// (`src/io`) and never mutated afterward; every solver component holds
/// only a shared `&Input` (spec.md §5 "effectively-immutable").
#[derive(Debug, Clone)]
pub struct Input {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    matrices: HashMap<String, ProfileMatrices>,
    amount_size: usize,
    /// Undoes a user-supplied cost-matrix precision multiplier at output
    /// time only (spec.md §4.1); `1.0` unless a custom cost matrix with
    /// non-unit precision was supplied.
    cost_scale: f64,
    /// Optional `(longitude, latitude)` per location index, carried through
    /// from the input's optional `location` geometry so `SolutionState` can
    /// compute real route bounding boxes (spec.md §3 `route_bbox`); absent
    /// when only matrix indices were supplied.
    coordinates: Option<Vec<(f64, f64)>>,
}

impl Input {
    /// Assembles a frozen `Input`. Callers (the JSON parsing layer) are
    /// responsible for validating consistency; this constructor only
    /// asserts the invariants that would otherwise corrupt solver state.
    pub fn new(
        jobs: Vec<Job>,
        vehicles: Vec<Vehicle>,
        matrices: HashMap<String, ProfileMatrices>,
        amount_size: usize,
    ) -> Self {
        Self {
            jobs,
            vehicles,
            matrices,
            amount_size,
            cost_scale: 1.0,
            coordinates: None,
        }
    }

    /// Overrides the cost-scale undo factor applied at output time.
    pub fn with_cost_scale(mut self, scale: f64) -> Self {
        self.cost_scale = scale;
        self
    }

    /// Attaches per-location `(longitude, latitude)` geometry, indexed the
    /// same way as the travel matrices.
    pub fn with_coordinates(mut self, coordinates: Vec<(f64, f64)>) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// The coordinate of a location index, if geometry was supplied.
    pub fn coordinate(&self, location: usize) -> Option<(f64, f64)> {
        self.coordinates.as_ref().and_then(|c| c.get(location)).copied()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn amount_size(&self) -> usize {
        self.amount_size
    }

    pub fn cost_scale(&self) -> f64 {
        self.cost_scale
    }

    pub fn profile_matrices(&self, profile: &str) -> Option<&ProfileMatrices> {
        self.matrices.get(profile)
    }

    /// For a `Pickup` job at `rank`, the rank of its matching `Delivery`
    /// (always `rank + 1`, spec.md §3). Returns `None` for non-`Pickup`
    /// jobs.
    pub fn matching_delivery_rank(&self, rank: usize) -> Option<usize> {
        match self.jobs.get(rank).map(|j| j.job_type()) {
            Some(JobType::Pickup) => Some(rank + 1),
            _ => None,
        }
    }

    /// For a `Delivery` job at `rank`, the rank of its matching `Pickup`
    /// (always `rank - 1`). Returns `None` for non-`Delivery` jobs.
    pub fn matching_pickup_rank(&self, rank: usize) -> Option<usize> {
        match self.jobs.get(rank).map(|j| j.job_type()) {
            Some(JobType::Delivery) => rank.checked_sub(1),
            _ => None,
        }
    }

    /// Raw travel duration (seconds) from `from` to `to` for `vehicle`'s
    /// profile, adjusted by `speed_factor`. Returns `0` if `from == to`.
    pub fn travel_duration(&self, vehicle: &Vehicle, from: usize, to: usize) -> i64 {
        if from == to {
            return 0;
        }
        let raw = self
            .profile_matrices(vehicle.profile())
            .map(|m| m.durations().get(from, to))
            .unwrap_or(0);
        ((raw as f64) / vehicle.speed_factor()).round() as i64
    }

    /// Raw travel distance (meters) from `from` to `to` for `vehicle`'s
    /// profile. Returns `0` if `from == to`.
    pub fn travel_distance(&self, vehicle: &Vehicle, from: usize, to: usize) -> i64 {
        if from == to {
            return 0;
        }
        self.profile_matrices(vehicle.profile())
            .map(|m| m.distances().get(from, to))
            .unwrap_or(0)
    }

    /// Travel cost from `from` to `to` for `vehicle`: the profile's custom
    /// cost matrix if present, otherwise derived as
    /// `per_hour * duration / 3600 + per_km * distance / 1000` (spec.md
    /// §4.1). Returns `0` if `from == to`.
    pub fn travel_cost(&self, vehicle: &Vehicle, from: usize, to: usize) -> i64 {
        if from == to {
            return 0;
        }
        if let Some(costs) = self
            .profile_matrices(vehicle.profile())
            .and_then(|m| m.costs())
        {
            return costs.get(from, to);
        }
        let duration = self.travel_duration(vehicle, from, to);
        let distance = self.travel_distance(vehicle, from, to);
        let c = vehicle.costs();
        c.per_hour * duration / 3600 + c.per_km * distance / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::models::Matrix;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(3, vec![0, 10, 20, 10, 0, 10, 20, 10, 0]).unwrap();
        let distances = Matrix::from_data(3, vec![0, 100, 200, 100, 0, 100, 200, 100, 0]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert(
            "car".to_string(),
            ProfileMatrices::new(durations, distances, None),
        );
        let jobs = vec![
            Job::pickup(1, 1, Amount::from_vec(vec![5])),
            Job::delivery(2, 2, Amount::from_vec(vec![5])),
        ];
        let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0)];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_matching_ranks() {
        let input = sample_input();
        assert_eq!(input.matching_delivery_rank(0), Some(1));
        assert_eq!(input.matching_pickup_rank(1), Some(0));
        assert_eq!(input.matching_delivery_rank(1), None);
        assert_eq!(input.matching_pickup_rank(0), None);
    }

    #[test]
    fn test_travel_duration_distance() {
        let input = sample_input();
        let v = &input.vehicles()[0];
        assert_eq!(input.travel_duration(v, 0, 1), 10);
        assert_eq!(input.travel_distance(v, 0, 2), 200);
        assert_eq!(input.travel_duration(v, 0, 0), 0);
    }

    #[test]
    fn test_travel_cost_derived() {
        let input = sample_input();
        let v = &input.vehicles()[0];
        // default per_hour = 3600, so cost = duration in seconds exactly.
        assert_eq!(input.travel_cost(v, 0, 1), 10);
    }

    #[test]
    fn test_travel_cost_custom_matrix() {
        let durations = Matrix::from_data(2, vec![0, 10, 10, 0]).unwrap();
        let distances = Matrix::from_data(2, vec![0, 100, 100, 0]).unwrap();
        let costs = Matrix::from_data(2, vec![0, 99, 99, 0]).unwrap();
        let mut matrices = HashMap::new();
        matrices.insert(
            "car".to_string(),
            ProfileMatrices::new(durations, distances, Some(costs)),
        );
        let input = Input::new(vec![], vec![], matrices, 1);
        let v = Vehicle::new(0, Amount::zero(1));
        assert_eq!(input.travel_cost(&v, 0, 1), 99);
    }

    #[test]
    fn test_speed_factor_scales_duration() {
        let input = sample_input();
        let v = Vehicle::new(0, Amount::from_vec(vec![10]))
            .with_start(0)
            .with_speed_factor(2.0);
        assert_eq!(input.travel_duration(&v, 0, 1), 5);
    }
}
