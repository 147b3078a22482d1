//! Input JSON mirror types and their conversion into a frozen [`Input`]
//! (spec.md §6 Input JSON, §7 Input error conditions).

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::amount::Amount;
use crate::error::VrpError;
use crate::models::{Break, Job, Matrix, ProfileMatrices, TimeWindow, Vehicle, VehicleCosts};
use crate::models::Input;

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub vehicles: Vec<VehicleDoc>,
    #[serde(default)]
    pub jobs: Vec<JobDoc>,
    #[serde(default)]
    pub shipments: Vec<ShipmentDoc>,
    #[serde(default)]
    pub matrices: HashMap<String, MatrixSetDoc>,
    #[serde(default)]
    pub locations: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
pub struct TimeWindowDoc(pub i64, pub i64);

#[derive(Debug, Deserialize)]
pub struct CostsDoc {
    #[serde(default)]
    pub fixed: Option<i64>,
    #[serde(default)]
    pub per_hour: Option<i64>,
    #[serde(default)]
    pub per_km: Option<i64>,
    #[serde(default)]
    pub per_task_hour: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BreakDoc {
    pub id: u64,
    #[serde(default)]
    pub service: i64,
    #[serde(default)]
    pub time_windows: Vec<TimeWindowDoc>,
    #[serde(default)]
    pub max_load: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleDoc {
    pub id: u64,
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub end_index: Option<usize>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub capacity: Vec<i64>,
    #[serde(default)]
    pub skills: Vec<usize>,
    #[serde(default)]
    pub time_window: Option<TimeWindowDoc>,
    #[serde(default)]
    pub breaks: Vec<BreakDoc>,
    #[serde(default)]
    pub costs: Option<CostsDoc>,
    #[serde(default)]
    pub speed_factor: Option<f64>,
    #[serde(default)]
    pub max_tasks: Option<usize>,
    #[serde(default)]
    pub max_travel_time: Option<i64>,
    #[serde(default)]
    pub max_distance: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct JobDoc {
    pub id: u64,
    #[serde(default)]
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: i64,
    #[serde(default)]
    pub service: i64,
    #[serde(default)]
    pub delivery: Vec<i64>,
    #[serde(default)]
    pub pickup: Vec<i64>,
    #[serde(default)]
    pub skills: Vec<usize>,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub time_windows: Vec<TimeWindowDoc>,
    #[serde(default)]
    pub setup_per_type: HashMap<String, i64>,
    #[serde(default)]
    pub service_per_type: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentStepDoc {
    pub id: u64,
    #[serde(default)]
    pub location_index: Option<usize>,
    #[serde(default)]
    pub setup: i64,
    #[serde(default)]
    pub service: i64,
    #[serde(default)]
    pub time_windows: Vec<TimeWindowDoc>,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentDoc {
    pub pickup: ShipmentStepDoc,
    pub delivery: ShipmentStepDoc,
    #[serde(default)]
    pub amount: Vec<i64>,
    #[serde(default)]
    pub skills: Vec<usize>,
    #[serde(default)]
    pub priority: u8,
}

#[derive(Debug, Deserialize)]
pub struct MatrixSetDoc {
    #[serde(default)]
    pub durations: Vec<Vec<i64>>,
    #[serde(default)]
    pub distances: Vec<Vec<i64>>,
    #[serde(default)]
    pub costs: Vec<Vec<i64>>,
}

fn to_time_windows(docs: &[TimeWindowDoc]) -> Result<Vec<TimeWindow>, VrpError> {
    let mut windows = Vec::with_capacity(docs.len());
    for d in docs {
        let tw = TimeWindow::new(d.0, d.1)
            .ok_or_else(|| VrpError::input(format!("invalid time window [{}, {}]", d.0, d.1)))?;
        windows.push(tw);
    }
    for pair in windows.windows(2) {
        if pair[0].end() > pair[1].start() {
            return Err(VrpError::input("overlapping time windows"));
        }
    }
    Ok(windows)
}

fn flatten_matrix(rows: &[Vec<i64>]) -> Result<Matrix, VrpError> {
    let size = rows.len();
    let mut flat = Vec::with_capacity(size * size);
    for row in rows {
        if row.len() != size {
            return Err(VrpError::input("non-square travel matrix"));
        }
        for &v in row {
            if v < 0 {
                return Err(VrpError::input("negative matrix entry"));
            }
            flat.push(v);
        }
    }
    Matrix::from_data(size, flat).ok_or_else(|| VrpError::input("malformed travel matrix"))
}

fn build_matrices(doc: &HashMap<String, MatrixSetDoc>) -> Result<HashMap<String, ProfileMatrices>, VrpError> {
    let mut out = HashMap::with_capacity(doc.len());
    for (profile, set) in doc {
        if set.durations.is_empty() {
            return Err(VrpError::input(format!("profile '{profile}' missing durations matrix")));
        }
        let durations = flatten_matrix(&set.durations)?;
        let distances = if set.distances.is_empty() {
            Matrix::new(durations.size())
        } else {
            flatten_matrix(&set.distances)?
        };
        let costs = if set.costs.is_empty() { None } else { Some(flatten_matrix(&set.costs)?) };
        out.insert(profile.clone(), ProfileMatrices::new(durations, distances, costs));
    }
    Ok(out)
}

fn build_break(doc: &BreakDoc, amount_size: usize) -> Result<Break, VrpError> {
    let windows = to_time_windows(&doc.time_windows)?;
    let mut b = Break::new(doc.id, windows, doc.service);
    if let Some(max_load) = &doc.max_load {
        if max_load.len() != amount_size {
            return Err(VrpError::input("break max_load dimension mismatch"));
        }
        b = b.with_max_load(Amount::from_vec(max_load.clone()));
    }
    Ok(b)
}

fn build_vehicle(doc: &VehicleDoc, amount_size: usize) -> Result<Vehicle, VrpError> {
    let capacity = if doc.capacity.is_empty() {
        Amount::zero(amount_size)
    } else {
        if doc.capacity.len() != amount_size {
            return Err(VrpError::input("inconsistent amount size in vehicle capacity"));
        }
        Amount::from_vec(doc.capacity.clone())
    };

    let mut vehicle = Vehicle::new(doc.id, capacity);
    if let Some(profile) = &doc.profile {
        vehicle = vehicle.with_profile(profile.clone());
    }
    if let Some(start) = doc.start_index {
        vehicle = vehicle.with_start(start);
    }
    if let Some(end) = doc.end_index {
        vehicle = vehicle.with_end(end);
    }
    if !doc.skills.is_empty() {
        vehicle = vehicle.with_skills(doc.skills.iter().copied().collect::<HashSet<_>>());
    }
    if let Some(tw) = &doc.time_window {
        let window = TimeWindow::new(tw.0, tw.1)
            .ok_or_else(|| VrpError::input(format!("invalid vehicle time window [{}, {}]", tw.0, tw.1)))?;
        vehicle = vehicle.with_time_window(window);
    }
    if !doc.breaks.is_empty() {
        let breaks = doc
            .breaks
            .iter()
            .map(|b| build_break(b, amount_size))
            .collect::<Result<Vec<_>, _>>()?;
        vehicle = vehicle.with_breaks(breaks);
    }
    if let Some(costs) = &doc.costs {
        let defaults = VehicleCosts::default();
        vehicle = vehicle.with_costs(VehicleCosts {
            fixed: costs.fixed.unwrap_or(defaults.fixed),
            per_hour: costs.per_hour.unwrap_or(defaults.per_hour),
            per_km: costs.per_km.unwrap_or(defaults.per_km),
            per_task_hour: costs.per_task_hour.unwrap_or(defaults.per_task_hour),
        });
    }
    if let Some(factor) = doc.speed_factor {
        vehicle = vehicle.with_speed_factor(factor);
    }
    if let Some(max_tasks) = doc.max_tasks {
        vehicle = vehicle.with_max_tasks(max_tasks);
    }
    if let Some(max_travel_time) = doc.max_travel_time {
        vehicle = vehicle.with_max_travel_time(max_travel_time);
    }
    if let Some(max_distance) = doc.max_distance {
        vehicle = vehicle.with_max_distance(max_distance);
    }
    Ok(vehicle)
}

fn amount_or_zero(values: &[i64], amount_size: usize, what: &str) -> Result<Amount, VrpError> {
    if values.is_empty() {
        return Ok(Amount::zero(amount_size));
    }
    if values.len() != amount_size {
        return Err(VrpError::input(format!("inconsistent amount size in {what}")));
    }
    Ok(Amount::from_vec(values.to_vec()))
}

fn require_location(location_index: Option<usize>, what: &str) -> Result<usize, VrpError> {
    location_index.ok_or_else(|| VrpError::input(format!("{what} is missing location_index")))
}

fn build_single_job(doc: &JobDoc, amount_size: usize) -> Result<Job, VrpError> {
    if doc.priority > 100 {
        return Err(VrpError::input("priority outside [0, 100]"));
    }
    let location = require_location(doc.location_index, "job")?;
    let pickup = amount_or_zero(&doc.pickup, amount_size, "job pickup")?;
    let delivery = amount_or_zero(&doc.delivery, amount_size, "job delivery")?;
    let mut job = Job::single(doc.id, location, pickup, delivery)
        .with_setup(doc.setup)
        .with_service(doc.service)
        .with_priority(doc.priority);
    if !doc.skills.is_empty() {
        job = job.with_skills(doc.skills.iter().copied().collect());
    }
    if !doc.time_windows.is_empty() {
        job = job.with_time_windows(to_time_windows(&doc.time_windows)?);
    }
    for (profile, setup) in &doc.setup_per_type {
        job = job.with_setup_for_profile(profile.clone(), *setup);
    }
    for (profile, service) in &doc.service_per_type {
        job = job.with_service_for_profile(profile.clone(), *service);
    }
    Ok(job)
}

fn build_shipment_pair(doc: &ShipmentDoc, amount_size: usize) -> Result<(Job, Job), VrpError> {
    if doc.priority > 100 {
        return Err(VrpError::input("priority outside [0, 100]"));
    }
    let amount = amount_or_zero(&doc.amount, amount_size, "shipment amount")?;
    let skills: HashSet<usize> = doc.skills.iter().copied().collect();

    let pickup_loc = require_location(doc.pickup.location_index, "shipment pickup")?;
    let mut pickup = Job::pickup(doc.pickup.id, pickup_loc, amount.clone())
        .with_setup(doc.pickup.setup)
        .with_service(doc.pickup.service)
        .with_priority(doc.priority);
    if !skills.is_empty() {
        pickup = pickup.with_skills(skills.clone());
    }
    if !doc.pickup.time_windows.is_empty() {
        pickup = pickup.with_time_windows(to_time_windows(&doc.pickup.time_windows)?);
    }

    let delivery_loc = require_location(doc.delivery.location_index, "shipment delivery")?;
    let mut delivery = Job::delivery(doc.delivery.id, delivery_loc, amount)
        .with_setup(doc.delivery.setup)
        .with_service(doc.delivery.service)
        .with_priority(doc.priority);
    if !skills.is_empty() {
        delivery = delivery.with_skills(skills);
    }
    if !doc.delivery.time_windows.is_empty() {
        delivery = delivery.with_time_windows(to_time_windows(&doc.delivery.time_windows)?);
    }

    Ok((pickup, delivery))
}

impl InputDoc {
    /// Validates and converts this document into a frozen [`Input`] (spec.md
    /// §7 Input error conditions).
    pub fn into_input(self) -> Result<Input, VrpError> {
        if self.vehicles.is_empty() {
            return Err(VrpError::input("no vehicles"));
        }
        if self.jobs.is_empty() && self.shipments.is_empty() {
            return Err(VrpError::input("no jobs"));
        }

        let amount_size = self
            .vehicles
            .iter()
            .map(|v| v.capacity.len())
            .find(|&n| n > 0)
            .or_else(|| self.jobs.iter().map(|j| j.delivery.len().max(j.pickup.len())).find(|&n| n > 0))
            .or_else(|| self.shipments.iter().map(|s| s.amount.len()).find(|&n| n > 0))
            .unwrap_or(0);

        let mut seen_ids = HashSet::new();
        for v in &self.vehicles {
            if !seen_ids.insert(v.id) {
                return Err(VrpError::input(format!("duplicate vehicle id {}", v.id)));
            }
        }

        let vehicles = self
            .vehicles
            .iter()
            .map(|v| build_vehicle(v, amount_size))
            .collect::<Result<Vec<_>, _>>()?;

        let mut jobs = Vec::with_capacity(self.jobs.len() + self.shipments.len() * 2);
        let mut seen_job_ids = HashSet::new();
        for j in &self.jobs {
            if !seen_job_ids.insert(j.id) {
                return Err(VrpError::input(format!("duplicate job id {}", j.id)));
            }
            jobs.push(build_single_job(j, amount_size)?);
        }
        for s in &self.shipments {
            if !seen_job_ids.insert(s.pickup.id) || !seen_job_ids.insert(s.delivery.id) {
                return Err(VrpError::input("duplicate shipment id"));
            }
            let (pickup, delivery) = build_shipment_pair(s, amount_size)?;
            jobs.push(pickup);
            jobs.push(delivery);
        }

        let matrices = build_matrices(&self.matrices)?;

        let mut input = Input::new(jobs, vehicles, matrices, amount_size);
        if !self.locations.is_empty() {
            input = input.with_coordinates(self.locations);
        }
        Ok(input)
    }
}

/// Parses and validates a solver input document from JSON text.
pub fn parse_input(text: &str) -> Result<Input, VrpError> {
    let doc: InputDoc =
        serde_json::from_str(text).map_err(|e| VrpError::input(format!("malformed input JSON: {e}")))?;
    doc.into_input()
}
