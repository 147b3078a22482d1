//! Vehicle, break, and cost-parameter types.

use std::collections::HashSet;

use crate::amount::Amount;
use crate::models::TimeWindow;

/// Per-distance/per-time cost parameters for one vehicle (spec.md §3/§4.1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleCosts {
    /// Flat cost for using the vehicle at all, charged once per route.
    pub fixed: i64,
    /// Cost per hour of travel (applied to `duration / 3600`).
    pub per_hour: i64,
    /// Cost per kilometer of travel (applied to `distance / 1000`).
    pub per_km: i64,
    /// Cost per hour of task time (setup + service), if the vehicle is
    /// billed for task time distinctly from travel time.
    pub per_task_hour: i64,
}

impl Default for VehicleCosts {
    fn default() -> Self {
        Self {
            fixed: 0,
            per_hour: 3600,
            per_km: 0,
            per_task_hour: 0,
        }
    }
}

/// A mandatory pause within a vehicle's route (spec.md §3).
#[derive(Debug, Clone)]
pub struct Break {
    id: u64,
    time_windows: Vec<TimeWindow>,
    service: i64,
    max_load: Option<Amount>,
}

impl Break {
    /// Creates a break with the given allowed windows and service duration.
    pub fn new(id: u64, time_windows: Vec<TimeWindow>, service: i64) -> Self {
        Self {
            id,
            time_windows,
            service,
            max_load: None,
        }
    }

    /// Restricts this break to only be taken while the vehicle's current
    /// load is at or below `max_load` (componentwise).
    pub fn with_max_load(mut self, max_load: Amount) -> Self {
        self.max_load = Some(max_load);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn service(&self) -> i64 {
        self.service
    }

    pub fn max_load(&self) -> Option<&Amount> {
        self.max_load.as_ref()
    }
}

/// One step of a user-supplied initial route, used in check mode (spec.md
/// §6 input `steps`, §9 "exception-for-control-flow" note). The core keeps
/// this shape but does not itself assign clock times to it — that is the
/// external ETA-assignment collaborator's job (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleStep {
    Start,
    End,
    Job { id: u64 },
    Pickup { id: u64 },
    Delivery { id: u64 },
    Break { id: u64 },
}

/// A vehicle available to serve jobs (spec.md §3).
///
/// Immutable during solve.
///
/// # Examples
///
/// ```
/// use vrp_core::amount::Amount;
/// use vrp_core::models::Vehicle;
///
/// let v = Vehicle::new(0, Amount::from_vec(vec![100]))
///     .with_profile("car")
///     .with_start(0)
///     .with_end(0);
/// assert_eq!(v.id(), 0);
/// assert_eq!(v.profile(), "car");
/// ```
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: u64,
    start_index: Option<usize>,
    end_index: Option<usize>,
    profile: String,
    capacity: Amount,
    skills: HashSet<usize>,
    time_window: Option<TimeWindow>,
    breaks: Vec<Break>,
    costs: VehicleCosts,
    max_tasks: usize,
    max_travel_time: Option<i64>,
    max_distance: Option<i64>,
    speed_factor: f64,
    steps: Option<Vec<VehicleStep>>,
}

impl Vehicle {
    /// Creates a vehicle with default cost parameters, the `"car"` profile,
    /// no start/end, no skills, and `max_tasks = usize::MAX`.
    pub fn new(id: u64, capacity: Amount) -> Self {
        Self {
            id,
            start_index: None,
            end_index: None,
            profile: "car".to_string(),
            capacity,
            skills: HashSet::new(),
            time_window: None,
            breaks: Vec::new(),
            costs: VehicleCosts::default(),
            max_tasks: usize::MAX,
            max_travel_time: None,
            max_distance: None,
            speed_factor: 1.0,
            steps: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_start(mut self, location_index: usize) -> Self {
        self.start_index = Some(location_index);
        self
    }

    pub fn with_end(mut self, location_index: usize) -> Self {
        self.end_index = Some(location_index);
        self
    }

    pub fn with_skills(mut self, skills: HashSet<usize>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_time_window(mut self, tw: TimeWindow) -> Self {
        self.time_window = Some(tw);
        self
    }

    pub fn with_breaks(mut self, breaks: Vec<Break>) -> Self {
        self.breaks = breaks;
        self
    }

    pub fn with_costs(mut self, costs: VehicleCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    pub fn with_max_travel_time(mut self, max: i64) -> Self {
        self.max_travel_time = Some(max);
        self
    }

    pub fn with_max_distance(mut self, max: i64) -> Self {
        self.max_distance = Some(max);
        self
    }

    pub fn with_speed_factor(mut self, factor: f64) -> Self {
        self.speed_factor = factor;
        self
    }

    pub fn with_steps(mut self, steps: Vec<VehicleStep>) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn start_index(&self) -> Option<usize> {
        self.start_index
    }

    pub fn end_index(&self) -> Option<usize> {
        self.end_index
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &HashSet<usize> {
        &self.skills
    }

    /// The vehicle's overall time window. Unbounded (`[0, i64::MAX]`) if
    /// none was set.
    pub fn time_window(&self) -> TimeWindow {
        self.time_window
            .unwrap_or_else(|| TimeWindow::new(0, i64::MAX).expect("valid unbounded window"))
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_travel_time(&self) -> Option<i64> {
        self.max_travel_time
    }

    pub fn max_distance(&self) -> Option<i64> {
        self.max_distance
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn steps(&self) -> Option<&[VehicleStep]> {
        self.steps.as_deref()
    }

    /// `true` if this vehicle has neither a start nor an end location
    /// (which would make it unable to serve anything).
    pub fn is_depotless(&self) -> bool {
        self.start_index.is_none() && self.end_index.is_none()
    }
}
