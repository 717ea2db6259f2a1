//! Interval labels of the reachability tree and the per-block reachability record.
//!
//! Intervals are half-open: `[start, end)`. A tree node owns the last slot
//! `end - 1` of its interval and allocates its children from `[start, end - 1)`.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Hash;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl From<Interval> for (u64, u64) {
    fn from(val: Interval) -> Self {
        (val.start, val.end)
    }
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Interval { start, end }
    }

    pub fn empty() -> Self {
        Self::new(1, 1)
    }

    /// The largest interval the tree root may own. Slot 0 is left unused.
    pub fn maximal() -> Self {
        Self::new(1, u64::MAX)
    }

    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The slot owned by a node labeled with this interval
    pub fn own_slot(&self) -> u64 {
        self.end - 1
    }

    /// The part of the interval available for allocating children
    pub fn children_capacity(&self) -> Interval {
        Interval::new(self.start, self.end.saturating_sub(1).max(self.start))
    }

    pub fn increase(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn decrease(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end - offset)
    }

    pub fn increase_start(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end)
    }

    pub fn decrease_start(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end)
    }

    pub fn increase_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end + offset)
    }

    pub fn decrease_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end - offset)
    }

    /// Splits the interval into two halves. The left half gets the extra slot when the size is odd.
    pub fn split_half(&self) -> (Self, Self) {
        let left_size = self.size().div_ceil(2);
        (Self::new(self.start, self.start + left_size), Self::new(self.start + left_size, self.end))
    }

    /// Splits the interval into consecutive parts of exactly the given sizes.
    /// The sizes must sum to the interval size.
    pub fn split_exact(&self, sizes: &[u64]) -> Vec<Self> {
        debug_assert_eq!(sizes.iter().sum::<u64>(), self.size(), "sizes must sum to the interval size");
        let mut start = self.start;
        sizes
            .iter()
            .map(|size| {
                let interval = Self::new(start, start + size);
                start += size;
                interval
            })
            .collect()
    }

    /// Splits the interval so that each part fits the requested size, and spreads
    /// the surplus with an exponential bias towards the largest requests. Larger
    /// subtrees are the ones expected to keep growing.
    pub fn split_exponential(&self, sizes: &[u64]) -> Vec<Self> {
        let interval_size = self.size();
        let sizes_sum = sizes.iter().sum::<u64>();
        debug_assert!(interval_size >= sizes_sum, "interval too small for the requested sizes");
        if interval_size <= sizes_sum {
            return self.split_exact(sizes);
        }

        let mut remaining_bias = interval_size - sizes_sum;
        let total_bias = remaining_bias as f64;
        let fractions = exponential_fractions(sizes);
        let mut biased_sizes = Vec::with_capacity(sizes.len());
        for (i, fraction) in fractions.iter().enumerate() {
            let bias = if i == fractions.len() - 1 {
                remaining_bias
            } else {
                remaining_bias.min((total_bias * fraction).round() as u64)
            };
            biased_sizes.push(sizes[i] + bias);
            remaining_bias -= bias;
        }
        self.split_exact(&biased_sizes)
    }

    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Containment of a strict tree descendant's interval
    pub fn strictly_contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end < self.end
    }

    pub fn contains_slot(&self, slot: u64) -> bool {
        self.start <= slot && slot < self.end
    }
}

/// Fractions proportional to `2^(size - max_size)`, normalized to sum to 1
fn exponential_fractions(sizes: &[u64]) -> Vec<f64> {
    let max_size = sizes.iter().copied().max().unwrap_or_default();
    let mut fractions = sizes.iter().map(|s| 1f64 / 2f64.powf((max_size - s) as f64)).collect::<Vec<f64>>();
    let fractions_sum = fractions.iter().sum::<f64>();
    for fraction in fractions.iter_mut() {
        *fraction /= fractions_sum;
    }
    fractions
}

/// Reachability record of a single block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityData {
    /// Tree parent, i.e. the selected parent
    pub parent: Hash,
    /// Tree children in interval order
    pub children: Vec<Hash>,
    pub interval: Interval,
    pub height: u64,
    /// Mergeset descendants not covered by tree descendants, ordered by interval start
    pub future_covering_set: Vec<Hash>,
}

impl ReachabilityData {
    pub fn new(parent: Hash, interval: Interval, height: u64) -> Self {
        Self { parent, children: Vec::new(), interval, height, future_covering_set: Vec::new() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityError {
    #[error("data store error: {0}")]
    StoreError(String),

    #[error("reachability data key not found: {0}")]
    KeyNotFound(Hash),

    #[error("data overflow error: {0}")]
    DataOverflow(String),

    #[error("data inconsistency error: {0}")]
    DataInconsistency(String),

    #[error("query is inconsistent")]
    BadQuery,
}

pub type ReachabilityResult<T> = std::result::Result<T, ReachabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_half() {
        let (l, r) = Interval::new(1, 100).split_half();
        assert_eq!((l, r), (Interval::new(1, 51), Interval::new(51, 100)));
        let (l, r) = Interval::new(4, 5).split_half();
        assert_eq!((l.size(), r.size()), (1, 0));
        assert!(Interval::new(7, 7).split_half().0.is_empty());
    }

    #[test]
    fn test_split_exact() {
        let parts = Interval::new(10, 20).split_exact(&[3, 0, 7]);
        assert_eq!(parts, vec![Interval::new(10, 13), Interval::new(13, 13), Interval::new(13, 20)]);
    }

    #[test]
    fn test_split_exponential_covers_and_fits() {
        let interval = Interval::new(1, 1001);
        let sizes = [5u64, 40, 1, 12];
        let parts = interval.split_exponential(&sizes);
        assert_eq!(parts.len(), sizes.len());
        assert_eq!(parts.first().map(|p| p.start), Some(1));
        assert_eq!(parts.last().map(|p| p.end), Some(1001));
        for (part, size) in parts.iter().zip(sizes) {
            assert!(part.size() >= size);
        }
        // The largest request receives the largest share
        assert!(parts[1].size() > parts[0].size() && parts[1].size() > parts[3].size());
    }

    #[test]
    fn test_containment() {
        let parent = Interval::new(1, 100);
        let child = Interval::new(1, 50);
        assert!(parent.contains(child) && parent.strictly_contains(child));
        assert!(parent.contains(parent) && !parent.strictly_contains(parent));
        assert!(parent.contains_slot(parent.own_slot()) && !child.contains_slot(parent.own_slot()));
        assert_eq!(parent.children_capacity(), Interval::new(1, 99));
    }
}
