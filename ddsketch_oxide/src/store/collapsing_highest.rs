//! Dense bin store that collapses its highest bins when capped

use std::collections::VecDeque;

use crate::common::validation::validate_bin_limit;
use crate::common::Result;

/// Mirror image of [`CollapsingLowestDenseStore`](super::CollapsingLowestDenseStore):
/// the window slides left and the displaced *high* bins fold into the highest
/// retained bin
///
/// Use this variant when low quantiles must stay exact while the upper tail
/// may degrade.
#[derive(Debug, Clone)]
pub struct CollapsingHighestDenseStore {
    bins: VecDeque<f64>,
    offset: i32,
    bin_limit: usize,
    total: f64,
    is_collapsed: bool,
}

impl CollapsingHighestDenseStore {
    /// Creates an empty store capped at `bin_limit` bins
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `bin_limit` is zero.
    pub fn new(bin_limit: usize) -> Result<Self> {
        validate_bin_limit(bin_limit)?;
        Ok(Self {
            bins: VecDeque::new(),
            offset: 0,
            bin_limit,
            total: 0.0,
            is_collapsed: false,
        })
    }

    /// Adds `count` to the bin at `key`, collapsing the high tail if needed
    pub fn add(&mut self, key: i32, count: f64) {
        let index = self.bin_index(key);
        self.bins[index] += count;
        self.total += count;
    }

    /// Adds every bin of `other` into this store
    ///
    /// The window is extended to the union key range up front, so at most one
    /// collapse happens per merge instead of one per source bin.
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            self.is_collapsed |= other.is_collapsed;
            return;
        }
        if let Some(min_key) = other.min_key() {
            self.bin_index(min_key);
        }
        if let Some(max_key) = other.max_key() {
            self.bin_index(max_key);
        }
        for (key, count) in other.bins() {
            self.add(key, count);
        }
        self.is_collapsed |= other.is_collapsed;
    }

    /// Maps a key to its position in `bins`, growing or collapsing the window
    fn bin_index(&mut self, key: i32) -> usize {
        if self.bins.is_empty() {
            self.offset = key;
            self.bins.push_back(0.0);
            return 0;
        }

        let top = self.offset as i64 + self.bins.len() as i64 - 1;
        if key as i64 > top {
            if self.is_collapsed {
                return self.bins.len() - 1;
            }
            let needed = key as i64 - top;
            let room = (self.bin_limit - self.bins.len()) as i64;
            let growth = needed.min(room);
            for _ in 0..growth {
                self.bins.push_back(0.0);
            }
            if growth < needed {
                // Cap reached before the key fit; the highest retained bin
                // absorbs it from now on.
                self.is_collapsed = true;
                return self.bins.len() - 1;
            }
            return (key - self.offset) as usize;
        }

        if key < self.offset {
            let width = top - key as i64 + 1;
            if width > self.bin_limit as i64 {
                self.collapse_highest(key + (self.bin_limit as i32 - 1));
            }
            let needed = (self.offset - key) as usize;
            for _ in 0..needed {
                self.bins.push_front(0.0);
            }
            self.offset = key;
            return 0;
        }

        (key - self.offset) as usize
    }

    /// Folds every bin above `new_top` into the bin at `new_top`, which
    /// becomes the sentinel of the shrunk window
    fn collapse_highest(&mut self, new_top: i32) {
        if new_top < self.offset {
            // The whole current window sits above the new one; it folds into
            // a single bin at the new window's top.
            let collapsed: f64 = self.bins.iter().sum();
            self.bins.clear();
            self.bins.push_back(collapsed);
            self.offset = new_top;
        } else {
            let shift = (self.offset + self.bins.len() as i32 - 1 - new_top) as usize;
            let mut collapsed = 0.0;
            for _ in 0..shift {
                collapsed += self.bins.pop_back().unwrap_or(0.0);
            }
            if let Some(highest) = self.bins.back_mut() {
                *highest += collapsed;
            }
        }
        self.is_collapsed = true;
    }

    /// Sum of all counts
    pub fn total_count(&self) -> f64 {
        self.total
    }

    /// Whether no count has been added
    pub fn is_empty(&self) -> bool {
        self.total <= 0.0
    }

    /// Whether high bins have been folded into the sentinel
    pub fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    /// Restores the collapsed flag when rebuilding from serialized form
    pub(crate) fn mark_collapsed(&mut self) {
        self.is_collapsed = true;
    }

    /// The configured cap on live bins
    pub fn bin_limit(&self) -> usize {
        self.bin_limit
    }

    /// Number of live bins
    pub fn bin_count(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0.0).count()
    }

    /// Smallest live key
    pub fn min_key(&self) -> Option<i32> {
        self.bins
            .iter()
            .position(|&c| c > 0.0)
            .map(|i| self.offset + i as i32)
    }

    /// Largest live key
    pub fn max_key(&self) -> Option<i32> {
        self.bins
            .iter()
            .rposition(|&c| c > 0.0)
            .map(|i| self.offset + i as i32)
    }

    /// Live bins in ascending key order
    pub fn bins(&self) -> Vec<(i32, f64)> {
        self.bins
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0.0)
            .map(|(i, &c)| (self.offset + i as i32, c))
            .collect()
    }

    /// Smallest live key whose cumulative count reaches `rank`, clamped to
    /// the largest live key; `None` when the store is empty
    pub fn key_at_rank(&self, rank: f64) -> Option<i32> {
        let mut cumulative = 0.0;
        for (i, &count) in self.bins.iter().enumerate() {
            if count <= 0.0 {
                continue;
            }
            cumulative += count;
            if cumulative >= rank {
                return Some(self.offset + i as i32);
            }
        }
        self.max_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_key_collapses_high_bins() {
        let mut store = CollapsingHighestDenseStore::new(5).unwrap();
        for key in 10..15 {
            store.add(key, 1.0);
        }
        store.add(8, 1.0);

        // Window is now [8, 12]; keys 13 and 14 folded into bin 12.
        assert!(store.is_collapsed());
        assert_eq!(store.total_count(), 6.0);
        assert_eq!(store.bins(), vec![(8, 1.0), (10, 1.0), (11, 1.0), (12, 3.0)]);
    }

    #[test]
    fn test_high_key_folds_into_sentinel_when_collapsed() {
        let mut store = CollapsingHighestDenseStore::new(5).unwrap();
        for key in 10..15 {
            store.add(key, 1.0);
        }
        store.add(8, 1.0); // collapse; window [8, 12]
        store.add(100, 2.5);

        assert_eq!(store.total_count(), 8.5);
        let bins = store.bins();
        assert_eq!(bins.last().copied(), Some((12, 5.5)));
    }

    #[test]
    fn test_high_extension_hits_cap() {
        let mut store = CollapsingHighestDenseStore::new(3).unwrap();
        store.add(10, 1.0);
        store.add(11, 1.0);
        // Room for one more bin above; 15 does not fit, so the top bin
        // absorbs the overflow and the store marks itself collapsed.
        store.add(15, 1.0);

        assert!(store.is_collapsed());
        assert_eq!(store.bins(), vec![(10, 1.0), (11, 1.0), (12, 1.0)]);
    }

    #[test]
    fn test_never_exceeds_bin_limit() {
        let mut store = CollapsingHighestDenseStore::new(8).unwrap();
        for key in (0..1000).rev() {
            store.add(key * 3, 1.0);
            assert!(store.bin_count() <= 8);
        }
        assert_eq!(store.total_count(), 1000.0);
        assert_eq!(store.min_key(), Some(0));
    }

    #[test]
    fn test_merge_keeps_low_tail_exact() {
        let mut a = CollapsingHighestDenseStore::new(4).unwrap();
        let mut b = CollapsingHighestDenseStore::new(4).unwrap();
        for key in 0..4 {
            a.add(key, 1.0);
        }
        for key in 6..10 {
            b.add(key, 1.0);
        }

        a.merge(&b);

        assert_eq!(a.total_count(), 8.0);
        assert!(a.is_collapsed());
        assert!(a.bin_count() <= 4);
        // Bottom of the union survives exactly; everything above folds down.
        assert_eq!(a.min_key(), Some(0));
    }
}
