//! Dense bin store that collapses its lowest bins when capped

use std::collections::VecDeque;

use crate::common::validation::validate_bin_limit;
use crate::common::Result;

/// Contiguous bin store covering `[offset, offset + len)`, at most `bin_limit`
/// bins wide
///
/// Bin for key `k` lives at `bins[k - offset]`. When a key arrives above the
/// window and the window is already `bin_limit` wide, the window shifts right
/// and the displaced low bins fold into the new lowest bin, which becomes the
/// collapsed sentinel. Keys below a collapsed window fold into that sentinel
/// too. High quantiles therefore stay accurate no matter how many distinct
/// low keys arrive.
#[derive(Debug, Clone)]
pub struct CollapsingLowestDenseStore {
    bins: VecDeque<f64>,
    offset: i32,
    bin_limit: usize,
    total: f64,
    is_collapsed: bool,
}

impl CollapsingLowestDenseStore {
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

    /// Adds `count` to the bin at `key`, collapsing the low tail if needed
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
        if let Some(max_key) = other.max_key() {
            self.bin_index(max_key);
        }
        if let Some(min_key) = other.min_key() {
            self.bin_index(min_key);
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

        if key < self.offset {
            if self.is_collapsed {
                return 0;
            }
            let needed = self.offset as i64 - key as i64;
            let room = (self.bin_limit - self.bins.len()) as i64;
            let growth = needed.min(room);
            for _ in 0..growth {
                self.bins.push_front(0.0);
            }
            self.offset -= growth as i32;
            if growth < needed {
                // Cap reached before the key fit; the lowest retained bin
                // absorbs it from now on.
                self.is_collapsed = true;
            }
            return 0;
        }

        let top = self.offset as i64 + self.bins.len() as i64 - 1;
        if key as i64 > top {
            let width = key as i64 - self.offset as i64 + 1;
            if width > self.bin_limit as i64 {
                self.collapse_lowest(key - (self.bin_limit as i32 - 1));
            }
            while (key - self.offset) as usize >= self.bins.len() {
                self.bins.push_back(0.0);
            }
        }
        (key - self.offset) as usize
    }

    /// Folds every bin below `new_offset` into the bin at `new_offset`, which
    /// becomes the sentinel of the shrunk window
    fn collapse_lowest(&mut self, new_offset: i32) {
        let top = self.offset as i64 + self.bins.len() as i64 - 1;
        if new_offset as i64 > top {
            // The whole current window sits below the new one; it folds into
            // a single bin at the new window's bottom.
            let collapsed: f64 = self.bins.iter().sum();
            self.bins.clear();
            self.bins.push_back(collapsed);
        } else {
            let shift = (new_offset as i64 - self.offset as i64) as usize;
            let mut collapsed = 0.0;
            for _ in 0..shift {
                collapsed += self.bins.pop_front().unwrap_or(0.0);
            }
            if let Some(lowest) = self.bins.front_mut() {
                *lowest += collapsed;
            }
        }
        self.offset = new_offset;
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

    /// Whether low bins have been folded into the sentinel
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
