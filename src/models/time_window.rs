//! Time window constraint type.

/// A `[start, end]` interval during which service may begin.
///
/// Jobs, breaks, and vehicles may each carry an ordered, non-overlapping
/// sequence of these (spec.md §3). Bounds are integer seconds.
///
/// # Examples
///
/// ```
/// use vrp_core::models::TimeWindow;
///
/// let tw = TimeWindow::new(100, 200).unwrap();
/// assert!(tw.start() <= tw.end());
/// assert!(tw.contains(150));
/// assert!(!tw.contains(250));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow {
    start: i64,
    end: i64,
}

impl TimeWindow {
    /// Creates a new time window. Returns `None` if `start > end`.
    pub fn new(start: i64, end: i64) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Earliest allowable service start.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Latest allowable service start.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// `true` if `time` falls within `[start, end]`.
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }

    /// `true` if arriving at `time` is impossible to serve within this
    /// window (arrival strictly after `end`).
    pub fn is_violated(&self, time: i64) -> bool {
        time > self.end
    }

    /// Waiting time incurred if arriving at `time` (zero if not early).
    pub fn waiting_time(&self, arrival: i64) -> i64 {
        if arrival < self.start {
            self.start - arrival
        } else {
            0
        }
    }
}

/// Checks that a sequence of time windows is sorted and non-overlapping, as
/// required by spec.md §3's job/break/vehicle invariant.
pub fn is_ordered_disjoint(windows: &[TimeWindow]) -> bool {
    windows
        .windows(2)
        .all(|pair| pair[0].end() < pair[1].start())
}

/// Returns the earliest feasible start at or after `earliest_from` across
/// `windows`, or `None` if no window can still be reached (i.e.
/// `earliest_from` is past every window's end).
pub fn next_feasible_start(windows: &[TimeWindow], earliest_from: i64) -> Option<i64> {
    for tw in windows {
        if !tw.is_violated(earliest_from) {
            return Some(earliest_from.max(tw.start()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        let tw = TimeWindow::new(10, 20).expect("valid");
        assert_eq!(tw.start(), 10);
        assert_eq!(tw.end(), 20);
    }

    #[test]
    fn test_invalid() {
        assert!(TimeWindow::new(20, 10).is_none());
    }

    #[test]
    fn test_contains_bounds_inclusive() {
        let tw = TimeWindow::new(10, 20).expect("valid");
        assert!(tw.contains(10));
        assert!(tw.contains(20));
        assert!(!tw.contains(9));
        assert!(!tw.contains(21));
    }

    #[test]
    fn test_waiting_time() {
        let tw = TimeWindow::new(10, 20).expect("valid");
        assert_eq!(tw.waiting_time(5), 5);
        assert_eq!(tw.waiting_time(10), 0);
        assert_eq!(tw.waiting_time(15), 0);
    }

    #[test]
    fn test_is_violated() {
        let tw = TimeWindow::new(10, 20).expect("valid");
        assert!(!tw.is_violated(20));
        assert!(tw.is_violated(21));
    }

    #[test]
    fn test_ordered_disjoint() {
        let a = TimeWindow::new(0, 10).unwrap();
        let b = TimeWindow::new(20, 30).unwrap();
        assert!(is_ordered_disjoint(&[a, b]));
        assert!(!is_ordered_disjoint(&[b, a]));
        let touching = TimeWindow::new(10, 15).unwrap();
        assert!(!is_ordered_disjoint(&[a, touching]));
    }

    #[test]
    fn test_next_feasible_start() {
        let a = TimeWindow::new(0, 10).unwrap();
        let b = TimeWindow::new(20, 30).unwrap();
        let windows = [a, b];
        assert_eq!(next_feasible_start(&windows, 5), Some(5));
        assert_eq!(next_feasible_start(&windows, 15), Some(20));
        assert_eq!(next_feasible_start(&windows, 35), None);
    }
}
