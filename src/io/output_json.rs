//! Output JSON mirror types, built from an assembled [`Solution`]
//! (spec.md §6 Output JSON).

use serde::Serialize;

use crate::models::{Input, JobType};
use crate::solution::{Solution, SolutionRoute, StepKind};

/// Wall-clock breakdown reported in `summary.computing_times` (spec.md §6).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ComputingTimes {
    pub loading: u64,
    pub solving: u64,
    pub routing: u64,
}

#[derive(Debug, Serialize)]
pub struct OutputDoc {
    pub code: i32,
    pub summary: SummaryDoc,
    pub routes: Vec<RouteDoc>,
    pub unassigned: Vec<UnassignedDoc>,
}

#[derive(Debug, Serialize)]
pub struct SummaryDoc {
    pub cost: f64,
    pub unassigned: usize,
    pub routes: usize,
    pub delivery: Vec<i64>,
    pub pickup: Vec<i64>,
    pub priority: u32,
    pub distance: i64,
    pub duration: i64,
    pub setup: i64,
    pub service: i64,
    pub waiting_time: i64,
    pub computing_times: ComputingTimes,
}

#[derive(Debug, Serialize)]
pub struct RouteDoc {
    pub vehicle: u64,
    pub cost: f64,
    pub duration: i64,
    pub distance: i64,
    pub priority: u32,
    pub steps: Vec<StepDoc>,
}

#[derive(Debug, Serialize)]
pub struct StepDoc {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
    pub arrival: i64,
    pub duration: i64,
    pub setup: i64,
    pub service: i64,
    pub waiting_time: i64,
    pub load: Vec<i64>,
    pub distance: i64,
}

#[derive(Debug, Serialize)]
pub struct UnassignedDoc {
    pub id: u64,
}

fn step_kind_label(step: &crate::solution::SolutionStep) -> &'static str {
    match step.kind {
        StepKind::Start => "start",
        StepKind::End => "end",
        StepKind::Break { .. } => "break",
        StepKind::Job { job_type: JobType::Single, .. } => "job",
        StepKind::Job { job_type: JobType::Pickup, .. } => "pickup",
        StepKind::Job { job_type: JobType::Delivery, .. } => "delivery",
    }
}

fn step_id(step: &crate::solution::SolutionStep) -> Option<u64> {
    match step.kind {
        StepKind::Job { job_id, .. } => Some(job_id),
        StepKind::Break { break_id } => Some(break_id),
        StepKind::Start | StepKind::End => None,
    }
}

fn step_setup_service(input: &Input, route: &SolutionRoute, step: &crate::solution::SolutionStep) -> (i64, i64) {
    match step.kind {
        StepKind::Job { job_id, .. } => {
            let vehicle = input.vehicles().iter().find(|v| v.id() == route.vehicle_id);
            let job = input.jobs().iter().find(|j| j.id() == job_id);
            match (vehicle, job) {
                (Some(v), Some(j)) => (j.setup_for(v.profile()), j.service_for(v.profile())),
                _ => (0, 0),
            }
        }
        StepKind::Break { break_id } => {
            let vehicle = input.vehicles().iter().find(|v| v.id() == route.vehicle_id);
            let service = vehicle
                .and_then(|v| v.breaks().iter().find(|b| b.id() == break_id))
                .map(|b| b.service())
                .unwrap_or(0);
            (0, service)
        }
        StepKind::Start | StepKind::End => (0, 0),
    }
}

fn build_route_doc(input: &Input, route: &SolutionRoute) -> RouteDoc {
    let steps = route
        .steps
        .iter()
        .map(|step| {
            let (setup, service) = step_setup_service(input, route, step);
            StepDoc {
                kind: step_kind_label(step),
                id: step_id(step),
                location: step.location,
                arrival: step.arrival,
                duration: step.duration,
                setup,
                service,
                waiting_time: step.waiting_time,
                load: step.load.as_slice().to_vec(),
                distance: step.distance,
            }
        })
        .collect();

    RouteDoc {
        vehicle: route.vehicle_id,
        cost: route.cost,
        duration: route.duration,
        distance: route.distance,
        priority: route.priority,
        steps,
    }
}

fn sum_amount_into(
    total: &mut crate::amount::Amount,
    input: &Input,
    route: &SolutionRoute,
    getter: impl Fn(&crate::models::Job) -> &crate::amount::Amount,
) {
    for step in &route.steps {
        if let StepKind::Job { job_id, .. } = step.kind {
            if let Some(job) = input.jobs().iter().find(|j| j.id() == job_id) {
                *total = &*total + getter(job);
            }
        }
    }
}

/// Builds the reportable output document from an assembled solution
/// (spec.md §6 Output JSON).
pub fn build_output(input: &Input, solution: &Solution, code: i32, computing_times: ComputingTimes) -> OutputDoc {
    let routes: Vec<RouteDoc> = solution.routes.iter().map(|r| build_route_doc(input, r)).collect();

    let mut delivery = crate::amount::Amount::zero(input.amount_size());
    let mut pickup = crate::amount::Amount::zero(input.amount_size());
    let mut priority = 0u32;
    let mut distance = 0i64;
    let mut duration = 0i64;
    let mut setup = 0i64;
    let mut service = 0i64;
    let mut waiting_time = 0i64;

    for route in &solution.routes {
        sum_amount_into(&mut delivery, input, route, |j| j.delivery());
        sum_amount_into(&mut pickup, input, route, |j| j.pickup());

        priority += route.priority;
        distance += route.distance;
        duration += route.duration;
        for step in &route.steps {
            let (s, sv) = step_setup_service(input, route, step);
            setup += s;
            service += sv;
            waiting_time += step.waiting_time;
        }
    }

    let summary = SummaryDoc {
        cost: solution.cost,
        unassigned: solution.unassigned.len(),
        routes: solution.routes.len(),
        delivery: delivery.as_slice().to_vec(),
        pickup: pickup.as_slice().to_vec(),
        priority,
        distance,
        duration,
        setup,
        service,
        waiting_time,
        computing_times,
    };

    let unassigned = solution.unassigned.iter().map(|&id| UnassignedDoc { id }).collect();

    OutputDoc { code, summary, routes, unassigned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::models::{Job, Matrix, ProfileMatrices, Vehicle};
    use crate::routes::{RouteStep, TWRoute};
    use std::collections::HashMap;

    fn sample_input() -> Input {
        let durations = Matrix::from_data(2, vec![0, 10, 10, 0]).unwrap();
        let distances = durations.clone();
        let mut matrices = HashMap::new();
        matrices.insert("car".to_string(), ProfileMatrices::new(durations, distances, None));
        let jobs = vec![Job::single(1, 1, Amount::zero(1), Amount::from_vec(vec![2])).with_priority(10)];
        let vehicles = vec![Vehicle::new(5, Amount::from_vec(vec![10])).with_start(0).with_end(0)];
        Input::new(jobs, vehicles, matrices, 1)
    }

    #[test]
    fn test_build_output_shapes_summary() {
        let input = sample_input();
        let v0 = &input.vehicles()[0];
        let mut route = TWRoute::new(0, 1);
        route.add(&input, v0, RouteStep::Job(0), 0);
        let solution = crate::solution::assemble_solution(&input, &[route], Vec::new());

        let doc = build_output(&input, &solution, 0, ComputingTimes::default());
        assert_eq!(doc.code, 0);
        assert_eq!(doc.routes.len(), 1);
        assert_eq!(doc.routes[0].vehicle, 5);
        assert_eq!(doc.summary.priority, 10);
        assert!(doc.unassigned.is_empty());
    }
}
