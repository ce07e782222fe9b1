//! ddsketch_oxide: DDSketch quantile estimation with relative error guarantees
//!
//! An implementation of the DDSketch algorithm (VLDB 2019): ingest a stream
//! of samples, answer any quantile with bounded *relative* error, and merge
//! sketches built on separate shards as if the streams had been concatenated.
//!
//! # Quick start
//!
//! ```
//! use ddsketch_oxide::DDSketch;
//!
//! let mut latencies = DDSketch::new(0.01).unwrap(); // 1% relative error
//!
//! for i in 1..=10_000 {
//!     latencies.add(i as f64 * 0.1).unwrap();
//! }
//!
//! let p99 = latencies.quantile(0.99).unwrap();
//! assert!((p99 - 990.0).abs() / 990.0 <= 0.01);
//! ```
//!
//! # Bounded memory
//!
//! With a collapsing policy the stores never hold more than `bin_limit` live
//! bins; the far tail folds into a sentinel bin while the quantiles you care
//! about keep their accuracy:
//!
//! ```
//! use ddsketch_oxide::DDSketch;
//!
//! let mut sketch = DDSketch::collapsing_lowest(0.01, 1024).unwrap();
//! for i in 1..=100_000 {
//!     sketch.add(i as f64).unwrap();
//! }
//! assert!(sketch.bin_count() <= 1024);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod common;
pub mod mapping;
pub mod record;
pub mod sketch;
pub mod store;

// Re-export core types for convenience
pub use common::{Mergeable, Result, Sketch, SketchError};
pub use mapping::{
    CubicallyInterpolatedMapping, IndexMapping, LinearlyInterpolatedMapping, LogarithmicMapping,
    MappingVariant,
};
pub use record::{MappingRecord, SketchRecord, StoreRecord};
pub use sketch::{CollapsePolicy, DDSketch, DEFAULT_MIN_INDEXABLE_VALUE};
pub use store::{
    BinStore, CollapsingHighestDenseStore, CollapsingLowestDenseStore, SparseStore, StoreVariant,
};

/// Error types and result aliases for sketch operations
pub mod error {
    pub use crate::common::{Result, SketchError};
}
