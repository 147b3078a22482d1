//! Job (task) types: single visits and pickup/delivery shipment halves.

use std::collections::{HashMap, HashSet};

use crate::amount::Amount;
use crate::models::TimeWindow;

/// The kind of task a [`Job`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    /// A standalone visit with no pairing constraint.
    Single,
    /// The first half of a shipment; its matching `Delivery` is the next
    /// job in [`crate::models::Input::jobs`] (spec.md §3 invariant).
    Pickup,
    /// The second half of a shipment; its matching `Pickup` is the previous
    /// job in [`crate::models::Input::jobs`].
    Delivery,
}

/// A single visitable task: a `Single` job, or one half of a
/// pickup/delivery shipment.
///
/// Immutable once built. A `Pickup` at rank `k` of
/// [`crate::models::Input::jobs`] always pairs with the `Delivery` at rank
/// `k + 1`; they share `pickup == previous.delivery`, `priority`, and
/// `skills` (spec.md §3).
///
/// # Examples
///
/// ```
/// use vrp_core::amount::Amount;
/// use vrp_core::models::{Job, JobType};
///
/// let j = Job::single(1, 0, Amount::from_vec(vec![5]), Amount::zero(1));
/// assert_eq!(j.id(), 1);
/// assert_eq!(j.job_type(), JobType::Single);
/// ```
#[derive(Debug, Clone)]
pub struct Job {
    id: u64,
    job_type: JobType,
    location: usize,
    setup: i64,
    service: i64,
    setup_per_profile: HashMap<String, i64>,
    service_per_profile: HashMap<String, i64>,
    pickup: Amount,
    delivery: Amount,
    skills: HashSet<usize>,
    priority: u8,
    time_windows: Vec<TimeWindow>,
}

impl Job {
    /// Creates a `Single` job with zero setup/service and no time window.
    pub fn single(id: u64, location: usize, pickup: Amount, delivery: Amount) -> Self {
        Self {
            id,
            job_type: JobType::Single,
            location,
            setup: 0,
            service: 0,
            setup_per_profile: HashMap::new(),
            service_per_profile: HashMap::new(),
            pickup,
            delivery,
            skills: HashSet::new(),
            priority: 0,
            time_windows: Vec::new(),
        }
    }

    /// Creates a `Pickup` job carrying `amount`.
    pub fn pickup(id: u64, location: usize, amount: Amount) -> Self {
        let zero = Amount::zero(amount.size());
        Self {
            id,
            job_type: JobType::Pickup,
            location,
            setup: 0,
            service: 0,
            setup_per_profile: HashMap::new(),
            service_per_profile: HashMap::new(),
            pickup: amount,
            delivery: zero,
            skills: HashSet::new(),
            priority: 0,
            time_windows: Vec::new(),
        }
    }

    /// Creates a `Delivery` job carrying `amount` (must equal the matching
    /// pickup's amount per spec.md §3).
    pub fn delivery(id: u64, location: usize, amount: Amount) -> Self {
        let zero = Amount::zero(amount.size());
        Self {
            id,
            job_type: JobType::Delivery,
            location,
            setup: 0,
            service: 0,
            setup_per_profile: HashMap::new(),
            service_per_profile: HashMap::new(),
            pickup: zero,
            delivery: amount,
            skills: HashSet::new(),
            priority: 0,
            time_windows: Vec::new(),
        }
    }

    /// Sets the default setup duration (seconds).
    pub fn with_setup(mut self, setup: i64) -> Self {
        self.setup = setup;
        self
    }

    /// Sets the default service duration (seconds).
    pub fn with_service(mut self, service: i64) -> Self {
        self.service = service;
        self
    }

    /// Overrides setup duration for a specific vehicle profile.
    pub fn with_setup_for_profile(mut self, profile: impl Into<String>, setup: i64) -> Self {
        self.setup_per_profile.insert(profile.into(), setup);
        self
    }

    /// Overrides service duration for a specific vehicle profile.
    pub fn with_service_for_profile(mut self, profile: impl Into<String>, service: i64) -> Self {
        self.service_per_profile.insert(profile.into(), service);
        self
    }

    /// Sets the required skill set.
    pub fn with_skills(mut self, skills: HashSet<usize>) -> Self {
        self.skills = skills;
        self
    }

    /// Sets the priority (0..=100, higher is more important).
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the ordered, non-overlapping list of allowed time windows.
    pub fn with_time_windows(mut self, windows: Vec<TimeWindow>) -> Self {
        self.time_windows = windows;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn location(&self) -> usize {
        self.location
    }

    /// Setup duration for the given profile, falling back to the default.
    pub fn setup_for(&self, profile: &str) -> i64 {
        *self.setup_per_profile.get(profile).unwrap_or(&self.setup)
    }

    /// Service duration for the given profile, falling back to the default.
    pub fn service_for(&self, profile: &str) -> i64 {
        *self
            .service_per_profile
            .get(profile)
            .unwrap_or(&self.service)
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn skills(&self) -> &HashSet<usize> {
        &self.skills
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    /// `true` if this job has no time window (always serviceable).
    pub fn has_no_time_window(&self) -> bool {
        self.time_windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_job() {
        let j = Job::single(1, 3, Amount::from_vec(vec![1]), Amount::from_vec(vec![2]));
        assert_eq!(j.job_type(), JobType::Single);
        assert_eq!(j.location(), 3);
        assert_eq!(j.pickup().get(0), 1);
        assert_eq!(j.delivery().get(0), 2);
    }

    #[test]
    fn test_pickup_delivery_pair() {
        let amt = Amount::from_vec(vec![5]);
        let p = Job::pickup(1, 0, amt.clone());
        let d = Job::delivery(2, 1, amt.clone());
        assert_eq!(p.job_type(), JobType::Pickup);
        assert_eq!(d.job_type(), JobType::Delivery);
        assert_eq!(p.pickup(), &amt);
        assert_eq!(d.delivery(), &amt);
    }

    #[test]
    fn test_profile_overrides() {
        let j = Job::single(1, 0, Amount::zero(1), Amount::zero(1))
            .with_setup(10)
            .with_service(20)
            .with_setup_for_profile("truck", 5)
            .with_service_for_profile("truck", 15);
        assert_eq!(j.setup_for("truck"), 5);
        assert_eq!(j.service_for("truck"), 15);
        assert_eq!(j.setup_for("car"), 10);
        assert_eq!(j.service_for("car"), 20);
    }

    #[test]
    fn test_priority_and_skills() {
        let mut skills = HashSet::new();
        skills.insert(1);
        let j = Job::single(1, 0, Amount::zero(1), Amount::zero(1))
            .with_priority(80)
            .with_skills(skills.clone());
        assert_eq!(j.priority(), 80);
        assert_eq!(j.skills(), &skills);
    }

    #[test]
    fn test_no_time_window_by_default() {
        let j = Job::single(1, 0, Amount::zero(1), Amount::zero(1));
        assert!(j.has_no_time_window());
    }
}
