//! Additive, lexicographically-ordered `(cost, duration, distance)` triple.
//!
//! Used throughout the solver as the unit of comparison for insertions,
//! operator gains, and route totals. Comparison is lexicographic on
//! `(cost, duration, distance)`, matching the lexicographic objective in
//! spec.md §1: unassigned priority and assigned count are compared outside
//! `Eval`, but cost/duration/distance tie-breaking happens here.

use std::ops::{Add, Sub};

use crate::models::Vehicle;

/// A `(cost, duration, distance)` triple. All three are fixed-precision
/// integers (seconds for duration, meters for distance, solver-defined cost
/// units for cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Eval {
    pub cost: i64,
    pub duration: i64,
    pub distance: i64,
}

/// Sentinel representing "no feasible insertion" or "no feasible move".
/// Always compares greater than any real `Eval` produced by the solver
/// (costs are bounded well below `i64::MAX`; see [`Eval::checked_add`]).
pub const NO_EVAL: Eval = Eval {
    cost: i64::MAX,
    duration: i64::MAX,
    distance: i64::MAX,
};

impl Eval {
    /// The zero element of the additive monoid.
    pub const fn zero() -> Self {
        Eval {
            cost: 0,
            duration: 0,
            distance: 0,
        }
    }

    /// Constructs an `Eval` from raw components.
    pub const fn new(cost: i64, duration: i64, distance: i64) -> Self {
        Eval {
            cost,
            duration,
            distance,
        }
    }

    /// `true` if this is the [`NO_EVAL`] sentinel.
    pub fn is_no_eval(&self) -> bool {
        self.cost == i64::MAX
    }

    /// `true` if `self`, taken as a route's total `Eval`, respects `vehicle`'s
    /// range bounds (spec.md §3/§8 "vehicle range bounds": total travel
    /// duration ≤ `max_travel_time` and total distance ≤ `max_distance`,
    /// each only when set).
    pub fn within_vehicle_range(&self, vehicle: &Vehicle) -> bool {
        if self.is_no_eval() {
            return false;
        }
        if let Some(max_travel_time) = vehicle.max_travel_time() {
            if self.duration > max_travel_time {
                return false;
            }
        }
        if let Some(max_distance) = vehicle.max_distance() {
            if self.distance > max_distance {
                return false;
            }
        }
        true
    }

    /// Componentwise checked addition; `None` on overflow of any field.
    /// Used to detect the "cost overflow" error kind of spec.md §7 before
    /// it could wrap around.
    pub fn checked_add(self, rhs: Eval) -> Option<Eval> {
        if self.is_no_eval() || rhs.is_no_eval() {
            return Some(NO_EVAL);
        }
        Some(Eval {
            cost: self.cost.checked_add(rhs.cost)?,
            duration: self.duration.checked_add(rhs.duration)?,
            distance: self.distance.checked_add(rhs.distance)?,
        })
    }

    /// `true` if `self` is a strict improvement (lower) than `other`.
    pub fn improves_on(&self, other: Eval) -> bool {
        *self < other
    }
}

impl Add for Eval {
    type Output = Eval;

    fn add(self, rhs: Eval) -> Eval {
        if self.is_no_eval() || rhs.is_no_eval() {
            return NO_EVAL;
        }
        Eval {
            cost: self.cost + rhs.cost,
            duration: self.duration + rhs.duration,
            distance: self.distance + rhs.distance,
        }
    }
}

impl Sub for Eval {
    type Output = Eval;

    /// Componentwise subtraction, used to compute gains (`before - after`).
    /// Never called with a [`NO_EVAL`] operand in practice — callers must
    /// check `is_no_eval()` first.
    fn sub(self, rhs: Eval) -> Eval {
        debug_assert!(!self.is_no_eval() && !rhs.is_no_eval());
        Eval {
            cost: self.cost - rhs.cost,
            duration: self.duration - rhs.duration,
            distance: self.distance - rhs.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_identity() {
        let e = Eval::new(10, 20, 30);
        assert_eq!(e + Eval::zero(), e);
    }

    #[test]
    fn test_ordering_lex_on_cost_first() {
        let cheap_slow = Eval::new(10, 1000, 0);
        let expensive_fast = Eval::new(20, 1, 0);
        assert!(cheap_slow < expensive_fast);
    }

    #[test]
    fn test_ordering_tie_breaks_on_duration() {
        let a = Eval::new(10, 5, 100);
        let b = Eval::new(10, 6, 0);
        assert!(a < b);
    }

    #[test]
    fn test_no_eval_is_max() {
        let e = Eval::new(1_000_000, 1_000_000, 1_000_000);
        assert!(e < NO_EVAL);
    }

    #[test]
    fn test_no_eval_propagates_through_add() {
        let e = Eval::new(5, 5, 5);
        assert_eq!(e + NO_EVAL, NO_EVAL);
        assert_eq!(NO_EVAL + e, NO_EVAL);
    }

    #[test]
    fn test_checked_add_overflow() {
        let e = Eval::new(i64::MAX - 1, 0, 0);
        assert!(e.checked_add(Eval::new(10, 0, 0)).is_none());
    }

    #[test]
    fn test_sub_gain() {
        let before = Eval::new(100, 50, 10);
        let after = Eval::new(80, 40, 10);
        let gain = before - after;
        assert_eq!(gain, Eval::new(20, 10, 0));
    }

    #[test]
    fn test_improves_on() {
        let a = Eval::new(10, 0, 0);
        let b = Eval::new(20, 0, 0);
        assert!(a.improves_on(b));
        assert!(!b.improves_on(a));
    }
}
