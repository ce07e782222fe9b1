//! Core traits for sketch implementations

use super::error::SketchError;

/// Core trait that all sketches must implement
///
/// Defines the fundamental operations any data sketch supports: updating
/// with new data, estimating results, checking emptiness, and serialization.
pub trait Sketch {
    /// The type of items this sketch can process
    type Item;

    /// Update the sketch with a new item
    ///
    /// Items the sketch cannot represent (for quantile sketches: NaN or
    /// infinite values) are ignored; use the sketch's inherent fallible
    /// methods to observe rejection.
    fn update(&mut self, item: &Self::Item);

    /// Get the estimated result from the sketch
    ///
    /// The meaning of this value depends on the sketch type; for quantile
    /// sketches it is the total count of values.
    fn estimate(&self) -> f64;

    /// Check if the sketch is empty (no items added)
    fn is_empty(&self) -> bool;

    /// Serialize the sketch to bytes
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize a sketch from bytes
    ///
    /// # Errors
    /// Returns `SketchError::DeserializationError` if bytes are invalid
    fn deserialize(bytes: &[u8]) -> Result<Self, SketchError>
    where
        Self: Sized;
}

/// Trait for sketches that support merging
///
/// Merging is essential for distributed aggregation: sketches are built
/// independently per shard and combined at query time. Kept separate from
/// [`Sketch`] because not every sketch can be merged.
pub trait Mergeable: Sketch {
    /// Merge another sketch into this one
    ///
    /// After merging, this sketch represents the union of both inputs; the
    /// argument is unchanged.
    ///
    /// # Errors
    /// Returns `SketchError::IncompatibleSketches` if the sketches have
    /// different configurations (e.g. different accuracy or bucketing).
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;
}
