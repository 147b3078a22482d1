//! End-to-end scenarios exercising the full construct → local-search →
//! assembly pipeline (spec.md §8 Testable Properties).

use std::collections::HashMap;

use vrp_core::amount::Amount;
use vrp_core::compatibility::Compatibility;
use vrp_core::construction::{construct, ConstructionConfig, InitMode};
use vrp_core::ls_engine::optimize;
use vrp_core::models::{Input, Job, Matrix, ProfileMatrices, Vehicle};
use vrp_core::solution::assemble_solution;

fn solve(input: &Input) -> vrp_core::Solution {
    let compat = Compatibility::build(input);
    let config = ConstructionConfig { mode: InitMode::Furthest, lambda: 1.0 };
    let (routes, state) = construct(input, &compat, config, true);
    let (routes, state) = optimize(input, &compat, routes, state, 2, None, true);
    let unassigned: Vec<usize> = state.unassigned().iter().copied().collect();
    assemble_solution(input, &routes, unassigned)
}

/// spec.md §8 scenario 1: one vehicle, three jobs on a Euclidean-like
/// matrix — every job should end up assigned on the single route.
#[test]
fn test_single_vehicle_three_jobs_all_assigned() {
    let durations = Matrix::from_data(
        4,
        vec![
            0, 10, 20, 30, //
            10, 0, 12, 22, //
            20, 12, 0, 11, //
            30, 22, 11, 0, //
        ],
    )
    .unwrap();
    let distances = durations.clone();
    let mut matrices = HashMap::new();
    matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));

    let jobs = vec![
        Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
        Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
        Job::single(3, 3, Amount::zero(1), Amount::zero(1)),
    ];
    let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0)];
    let input = Input::new(jobs, vehicles, matrices, 1);

    let solution = solve(&input);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.routes.len(), 1);
    let served: std::collections::HashSet<u64> = solution.routes[0]
        .steps
        .iter()
        .filter_map(|s| match s.kind {
            vrp_core::solution::StepKind::Job { job_id, .. } => Some(job_id),
            _ => None,
        })
        .collect();
    assert_eq!(served, [1, 2, 3].into_iter().collect());
}

/// spec.md §8 scenario 2: capacity forces the job set to split across two
/// vehicles rather than overloading one.
#[test]
fn test_two_vehicle_capacity_constraint_splits_jobs() {
    let durations = Matrix::from_data(
        3,
        vec![
            0, 10, 10, //
            10, 0, 15, //
            10, 15, 0, //
        ],
    )
    .unwrap();
    let distances = durations.clone();
    let mut matrices = HashMap::new();
    matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));

    let jobs = vec![
        Job::single(1, 1, Amount::from_vec(vec![7]), Amount::zero(1)),
        Job::single(2, 2, Amount::from_vec(vec![7]), Amount::zero(1)),
    ];
    let vehicles = vec![
        Vehicle::new(0, Amount::from_vec(vec![7])).with_start(0).with_end(0),
        Vehicle::new(1, Amount::from_vec(vec![7])).with_start(0).with_end(0),
    ];
    let input = Input::new(jobs, vehicles, matrices, 1);

    let solution = solve(&input);
    assert!(solution.unassigned.is_empty());
    assert_eq!(solution.routes.len(), 2);
    for route in &solution.routes {
        assert_eq!(route.steps.iter().filter(|s| matches!(s.kind, vrp_core::solution::StepKind::Job { .. })).count(), 1);
    }
}

/// spec.md §8 Conservation property: `assigned ⊎ unassigned == jobs(input)`.
#[test]
fn test_conservation_of_jobs() {
    let durations = Matrix::from_data(
        3,
        vec![
            0, 5, 5, //
            5, 0, 5, //
            5, 5, 0, //
        ],
    )
    .unwrap();
    let distances = durations.clone();
    let mut matrices = HashMap::new();
    matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));

    let jobs = vec![
        Job::single(1, 1, Amount::zero(1), Amount::zero(1)),
        Job::single(2, 2, Amount::zero(1), Amount::zero(1)),
    ];
    let vehicles = vec![Vehicle::new(0, Amount::from_vec(vec![10])).with_start(0).with_end(0)];
    let input = Input::new(jobs, vehicles, matrices, 1);

    let solution = solve(&input);
    let mut assigned: Vec<u64> = solution
        .routes
        .iter()
        .flat_map(|r| r.steps.iter())
        .filter_map(|s| match s.kind {
            vrp_core::solution::StepKind::Job { job_id, .. } => Some(job_id),
            _ => None,
        })
        .collect();
    assigned.extend(solution.unassigned.iter().copied());
    assigned.sort_unstable();
    assert_eq!(assigned, vec![1, 2]);
}
