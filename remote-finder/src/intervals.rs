use serde::Serialize;

/// Closed-open time range `[start, end)` in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    /// An inverted range collapses to the empty interval at `start`
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn size(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Overlapping or touching
    fn joins(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Ordered, non-overlapping set of intervals where data is known to exist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Sorts and coalesces overlapping or touching intervals
    pub fn new(mut intervals: Vec<Interval>) -> Self {
        intervals.sort();
        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if last.joins(&interval) => last.end = last.end.max(interval.end),
                _ => merged.push(interval),
            }
        }
        Self { intervals: merged }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total covered seconds
    pub fn size(&self) -> i64 {
        self.intervals
            .iter()
            .map(Interval::size)
            .fold(0, i64::saturating_add)
    }

    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        let mut all = self.intervals.clone();
        all.extend_from_slice(&other.intervals);
        IntervalSet::new(all)
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
