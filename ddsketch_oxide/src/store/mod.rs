//! Bin stores: bucket-key to count maps with optional memory caps
//!
//! A store holds non-negative counts for integer bucket keys. The three
//! variants trade memory bounds against tail fidelity:
//!
//! - [`SparseStore`] - unbounded, exact everywhere
//! - [`CollapsingLowestDenseStore`] - capped; the low tail degrades first
//! - [`CollapsingHighestDenseStore`] - capped; the high tail degrades first
//!
//! Collapse is the normal bounding mechanism, not an error: folded bins lose
//! their individual keys but never their counts, so totals and every rank
//! query outside the collapsed tail stay intact.

mod collapsing_highest;
mod collapsing_lowest;
mod sparse;

pub use collapsing_highest::CollapsingHighestDenseStore;
pub use collapsing_lowest::CollapsingLowestDenseStore;
pub use sparse::SparseStore;

use crate::common::Result;

/// Tag identifying a store variant in serialized form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreVariant {
    /// Unbounded sparse store
    Sparse,
    /// Dense store collapsing the low tail
    CollapsingLowest,
    /// Dense store collapsing the high tail
    CollapsingHighest,
}

/// A bin store, one of the three closed variants
///
/// Like the mappings, the variant set is closed: serialization tags and the
/// collapse policies enumerate exactly these three, dispatched by `match`.
#[derive(Debug, Clone)]
pub enum BinStore {
    /// Unbounded sparse bins
    Sparse(SparseStore),
    /// Capped dense bins, low tail collapses
    CollapsingLowest(CollapsingLowestDenseStore),
    /// Capped dense bins, high tail collapses
    CollapsingHighest(CollapsingHighestDenseStore),
}

impl BinStore {
    /// Creates an unbounded sparse store
    pub fn sparse() -> Self {
        Self::Sparse(SparseStore::new())
    }

    /// Creates a dense store that collapses its lowest bins past `bin_limit`
    pub fn collapsing_lowest(bin_limit: usize) -> Result<Self> {
        Ok(Self::CollapsingLowest(CollapsingLowestDenseStore::new(
            bin_limit,
        )?))
    }

    /// Creates a dense store that collapses its highest bins past `bin_limit`
    pub fn collapsing_highest(bin_limit: usize) -> Result<Self> {
        Ok(Self::CollapsingHighest(CollapsingHighestDenseStore::new(
            bin_limit,
        )?))
    }

    /// Returns the variant tag for serialization
    pub fn variant(&self) -> StoreVariant {
        match self {
            Self::Sparse(_) => StoreVariant::Sparse,
            Self::CollapsingLowest(_) => StoreVariant::CollapsingLowest,
            Self::CollapsingHighest(_) => StoreVariant::CollapsingHighest,
        }
    }

    /// The cap on live bins, if this variant has one
    pub fn bin_limit(&self) -> Option<usize> {
        match self {
            Self::Sparse(_) => None,
            Self::CollapsingLowest(s) => Some(s.bin_limit()),
            Self::CollapsingHighest(s) => Some(s.bin_limit()),
        }
    }

    /// Adds `count` to the bin at `key`
    pub fn add(&mut self, key: i32, count: f64) {
        match self {
            Self::Sparse(s) => s.add(key, count),
            Self::CollapsingLowest(s) => s.add(key, count),
            Self::CollapsingHighest(s) => s.add(key, count),
        }
    }

    /// Adds every bin of `other` into this store
    ///
    /// The receiver's own collapse policy governs the merged bins; the source
    /// may be any variant. Dense-to-dense merges of the same variant rebase
    /// the window once instead of collapsing per bin.
    pub fn merge(&mut self, other: &BinStore) {
        match (self, other) {
            (Self::Sparse(a), Self::Sparse(b)) => a.merge(b),
            (Self::CollapsingLowest(a), Self::CollapsingLowest(b)) => a.merge(b),
            (Self::CollapsingHighest(a), Self::CollapsingHighest(b)) => a.merge(b),
            (receiver, source) => {
                for (key, count) in source.bins() {
                    receiver.add(key, count);
                }
            }
        }
    }

    /// Sum of all counts
    pub fn total_count(&self) -> f64 {
        match self {
            Self::Sparse(s) => s.total_count(),
            Self::CollapsingLowest(s) => s.total_count(),
            Self::CollapsingHighest(s) => s.total_count(),
        }
    }

    /// Whether no count has been added
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sparse(s) => s.is_empty(),
            Self::CollapsingLowest(s) => s.is_empty(),
            Self::CollapsingHighest(s) => s.is_empty(),
        }
    }

    /// Number of live bins
    pub fn bin_count(&self) -> usize {
        match self {
            Self::Sparse(s) => s.bin_count(),
            Self::CollapsingLowest(s) => s.bin_count(),
            Self::CollapsingHighest(s) => s.bin_count(),
        }
    }

    /// Smallest live key
    pub fn min_key(&self) -> Option<i32> {
        match self {
            Self::Sparse(s) => s.min_key(),
            Self::CollapsingLowest(s) => s.min_key(),
            Self::CollapsingHighest(s) => s.min_key(),
        }
    }

    /// Largest live key
    pub fn max_key(&self) -> Option<i32> {
        match self {
            Self::Sparse(s) => s.max_key(),
            Self::CollapsingLowest(s) => s.max_key(),
            Self::CollapsingHighest(s) => s.max_key(),
        }
    }

    /// Live bins in ascending key order
    pub fn bins(&self) -> Vec<(i32, f64)> {
        match self {
            Self::Sparse(s) => s.bins(),
            Self::CollapsingLowest(s) => s.bins(),
            Self::CollapsingHighest(s) => s.bins(),
        }
    }

    /// Smallest live key whose cumulative count reaches `rank`, clamped to
    /// the largest live key; `None` when the store is empty
    pub fn key_at_rank(&self, rank: f64) -> Option<i32> {
        match self {
            Self::Sparse(s) => s.key_at_rank(rank),
            Self::CollapsingLowest(s) => s.key_at_rank(rank),
            Self::CollapsingHighest(s) => s.key_at_rank(rank),
        }
    }

    /// Whether the low tail has been folded into a sentinel bin
    pub fn is_collapsed_lo(&self) -> bool {
        match self {
            Self::CollapsingLowest(s) => s.is_collapsed(),
            _ => false,
        }
    }

    /// Whether the high tail has been folded into a sentinel bin
    pub fn is_collapsed_hi(&self) -> bool {
        match self {
            Self::CollapsingHighest(s) => s.is_collapsed(),
            _ => false,
        }
    }
}
