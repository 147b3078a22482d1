//! Randomized conservation check (spec.md §8 Testable Properties:
//! `assigned ⊎ unassigned == jobs(input)`, with no job id appearing twice).

use std::collections::HashMap;

use proptest::prelude::*;

use vrp_core::amount::Amount;
use vrp_core::compatibility::Compatibility;
use vrp_core::construction::{construct, ConstructionConfig, InitMode};
use vrp_core::ls_engine::optimize;
use vrp_core::models::{Input, Job, Matrix, ProfileMatrices, Vehicle};
use vrp_core::solution::{assemble_solution, StepKind};

fn build_input(n_jobs: usize, n_vehicles: usize, capacities: Vec<i64>, amounts: Vec<i64>) -> Input {
    let size = n_jobs + 1;
    let mut flat = vec![0i64; size * size];
    for i in 0..size {
        for j in 0..size {
            flat[i * size + j] = (i as i64 - j as i64).unsigned_abs() as i64 * 7;
        }
    }
    let durations = Matrix::from_data(size, flat).unwrap();
    let distances = durations.clone();
    let mut matrices = HashMap::new();
    matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));

    let jobs: Vec<Job> = (0..n_jobs)
        .map(|i| Job::single((i + 1) as u64, i + 1, Amount::from_vec(vec![amounts[i]]), Amount::zero(1)))
        .collect();

    let vehicles: Vec<Vehicle> = (0..n_vehicles)
        .map(|v| Vehicle::new(v as u64, Amount::from_vec(vec![capacities[v]])).with_start(0).with_end(0))
        .collect();

    Input::new(jobs, vehicles, matrices, 1)
}

proptest! {
    #[test]
    fn conservation_holds_for_small_random_instances(
        n_jobs in 1usize..5,
        n_vehicles in 1usize..3,
        capacities in prop::collection::vec(1i64..20, 1..3),
        amounts in prop::collection::vec(1i64..5, 1..5),
    ) {
        let n_vehicles = n_vehicles.min(capacities.len()).max(1);
        let n_jobs = n_jobs.min(amounts.len()).max(1);
        let input = build_input(n_jobs, n_vehicles, capacities, amounts);

        let compat = Compatibility::build(&input);
        let config = ConstructionConfig { mode: InitMode::HigherAmount, lambda: 1.0 };
        let (routes, state) = construct(&input, &compat, config, true);
        let (routes, state) = optimize(&input, &compat, routes, state, 1, None, false);

        let unassigned: Vec<usize> = state.unassigned().iter().copied().collect();
        let solution = assemble_solution(&input, &routes, unassigned);

        let mut seen: Vec<u64> = solution
            .routes
            .iter()
            .flat_map(|r| r.steps.iter())
            .filter_map(|s| match s.kind {
                StepKind::Job { job_id, .. } => Some(job_id),
                _ => None,
            })
            .collect();
        seen.extend(solution.unassigned.iter().copied());
        seen.sort_unstable();

        let mut expected: Vec<u64> = (1..=n_jobs as u64).collect();
        expected.sort_unstable();

        prop_assert_eq!(seen, expected);
    }
}
