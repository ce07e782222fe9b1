//! Index mappings: value-to-bucket translation with relative error guarantees
//!
//! A mapping assigns every positive value `x` an integer key `k` such that
//! consecutive bucket boundaries differ by a factor of `gamma = (1 + alpha) / (1 - alpha)`,
//! where `alpha` is the configured relative accuracy. The representative value
//! returned for a key is within `alpha * x` of every `x` in the bucket.
//!
//! # Variants
//!
//! - [`LogarithmicMapping`] - one `ln` call per key, exact gamma-sized buckets
//! - [`LinearlyInterpolatedMapping`] - approximates `log2` by linear
//!   interpolation of the mantissa; faster, slightly more buckets
//! - [`CubicallyInterpolatedMapping`] - cubic interpolation of the mantissa;
//!   nearly as compact as the logarithmic mapping without the `ln` call
//!
//! The interpolated variants pick their multiplier from the *worst-case* slope
//! of the interpolation, not the endpoint slope, so the requested accuracy is
//! honoured for every value (see the module docs of each variant).

mod cubic;
mod linear;
mod logarithmic;

pub use cubic::CubicallyInterpolatedMapping;
pub use linear::LinearlyInterpolatedMapping;
pub use logarithmic::LogarithmicMapping;

use crate::common::{Result, SketchError};

/// Tag identifying a mapping variant in serialized form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingVariant {
    /// Exact logarithmic indexing
    Logarithmic,
    /// Linear interpolation of `log2` between powers of two
    LinearlyInterpolated,
    /// Cubic interpolation of `log2` between powers of two
    CubicallyInterpolated,
}

/// A gamma-index mapping, one of the three closed variants
///
/// The variant set is closed on purpose: the serialization tags, the merge
/// compatibility check, and the accuracy analysis all enumerate exactly these
/// three. Dispatch is by `match`, not trait objects.
#[derive(Debug, Clone)]
pub enum IndexMapping {
    /// Exact logarithmic mapping
    Logarithmic(LogarithmicMapping),
    /// Linearly interpolated mapping
    LinearlyInterpolated(LinearlyInterpolatedMapping),
    /// Cubically interpolated mapping
    CubicallyInterpolated(CubicallyInterpolatedMapping),
}

impl IndexMapping {
    /// Creates a logarithmic mapping with the given relative accuracy
    pub fn logarithmic(relative_accuracy: f64) -> Result<Self> {
        Ok(Self::Logarithmic(LogarithmicMapping::new(relative_accuracy)?))
    }

    /// Creates a linearly interpolated mapping with the given relative accuracy
    pub fn linearly_interpolated(relative_accuracy: f64) -> Result<Self> {
        Ok(Self::LinearlyInterpolated(LinearlyInterpolatedMapping::new(
            relative_accuracy,
        )?))
    }

    /// Creates a cubically interpolated mapping with the given relative accuracy
    pub fn cubically_interpolated(relative_accuracy: f64) -> Result<Self> {
        Ok(Self::CubicallyInterpolated(CubicallyInterpolatedMapping::new(
            relative_accuracy,
        )?))
    }

    /// Reconstructs a mapping from its serialized parts
    ///
    /// `gamma` and `index_offset` must come from a previously serialized
    /// mapping; the rebuilt mapping produces bit-identical keys and values.
    pub fn from_parts(variant: MappingVariant, gamma: f64, index_offset: f64) -> Result<Self> {
        match variant {
            MappingVariant::Logarithmic => Ok(Self::Logarithmic(LogarithmicMapping::from_gamma(
                gamma,
                index_offset,
            )?)),
            MappingVariant::LinearlyInterpolated => Ok(Self::LinearlyInterpolated(
                LinearlyInterpolatedMapping::from_gamma(gamma, index_offset)?,
            )),
            MappingVariant::CubicallyInterpolated => Ok(Self::CubicallyInterpolated(
                CubicallyInterpolatedMapping::from_gamma(gamma, index_offset)?,
            )),
        }
    }

    /// Returns the variant tag for serialization
    pub fn variant(&self) -> MappingVariant {
        match self {
            Self::Logarithmic(_) => MappingVariant::Logarithmic,
            Self::LinearlyInterpolated(_) => MappingVariant::LinearlyInterpolated,
            Self::CubicallyInterpolated(_) => MappingVariant::CubicallyInterpolated,
        }
    }

    /// Returns the bucket key for a value in `[min_indexable_value, max_indexable_value]`
    ///
    /// Behaviour outside that interval is undefined at this layer; the sketch
    /// facade filters values before calling.
    pub fn key(&self, value: f64) -> i32 {
        match self {
            Self::Logarithmic(m) => m.key(value),
            Self::LinearlyInterpolated(m) => m.key(value),
            Self::CubicallyInterpolated(m) => m.key(value),
        }
    }

    /// Returns the representative value of the bucket with the given key
    pub fn value(&self, key: i32) -> f64 {
        match self {
            Self::Logarithmic(m) => m.value(key),
            Self::LinearlyInterpolated(m) => m.value(key),
            Self::CubicallyInterpolated(m) => m.value(key),
        }
    }

    /// The relative accuracy honoured by this mapping
    pub fn relative_accuracy(&self) -> f64 {
        match self {
            Self::Logarithmic(m) => m.relative_accuracy(),
            Self::LinearlyInterpolated(m) => m.relative_accuracy(),
            Self::CubicallyInterpolated(m) => m.relative_accuracy(),
        }
    }

    /// The bucket boundary ratio `(1 + alpha) / (1 - alpha)`
    pub fn gamma(&self) -> f64 {
        match self {
            Self::Logarithmic(m) => m.gamma(),
            Self::LinearlyInterpolated(m) => m.gamma(),
            Self::CubicallyInterpolated(m) => m.gamma(),
        }
    }

    /// The constant added to every key before rounding
    pub fn index_offset(&self) -> f64 {
        match self {
            Self::Logarithmic(m) => m.index_offset(),
            Self::LinearlyInterpolated(m) => m.index_offset(),
            Self::CubicallyInterpolated(m) => m.index_offset(),
        }
    }

    /// Smallest positive value whose key is representable
    pub fn min_indexable_value(&self) -> f64 {
        match self {
            Self::Logarithmic(m) => m.min_indexable_value(),
            Self::LinearlyInterpolated(m) => m.min_indexable_value(),
            Self::CubicallyInterpolated(m) => m.min_indexable_value(),
        }
    }

    /// Largest value whose key is representable
    pub fn max_indexable_value(&self) -> f64 {
        match self {
            Self::Logarithmic(m) => m.max_indexable_value(),
            Self::LinearlyInterpolated(m) => m.max_indexable_value(),
            Self::CubicallyInterpolated(m) => m.max_indexable_value(),
        }
    }
}

/// Two mappings are equal when they bucket identically: same variant, same
/// gamma bits, same offset bits. This is the merge compatibility test.
impl PartialEq for IndexMapping {
    fn eq(&self, other: &Self) -> bool {
        self.variant() == other.variant()
            && self.gamma().to_bits() == other.gamma().to_bits()
            && self.index_offset().to_bits() == other.index_offset().to_bits()
    }
}

/// Validates a relative accuracy parameter and derives gamma from it
pub(crate) fn gamma_from_accuracy(relative_accuracy: f64) -> Result<f64> {
    crate::common::validation::validate_probability(relative_accuracy, "relative_accuracy")?;
    Ok((1.0 + relative_accuracy) / (1.0 - relative_accuracy))
}

/// Validates a gamma read back from serialized form
pub(crate) fn validate_gamma(gamma: f64) -> Result<()> {
    if !(gamma.is_finite() && gamma > 1.0) {
        return Err(SketchError::InvalidParameter {
            param: "gamma".to_string(),
            value: gamma.to_string(),
            constraint: "must be finite and greater than 1".to_string(),
        });
    }
    Ok(())
}

/// Splits a positive, normal `f64` into `(significand, exponent)` with
/// significand in `[1, 2)`, so `value = significand * 2^exponent`
///
/// Subnormal inputs are never seen here: the sketch folds magnitudes below
/// the indexable minimum into the zero bucket first.
#[inline]
pub(crate) fn decompose(value: f64) -> (f64, i32) {
    const EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
    const SIGNIFICAND_MASK: u64 = 0x000f_ffff_ffff_ffff;
    const EXPONENT_BIAS: i32 = 1023;
    const ONE_BITS: u64 = 0x3ff0_0000_0000_0000;

    let bits = value.to_bits();
    let exponent = ((bits & EXPONENT_MASK) >> 52) as i32 - EXPONENT_BIAS;
    let significand = f64::from_bits((bits & SIGNIFICAND_MASK) | ONE_BITS);
    (significand, exponent)
}

/// Rebuilds `significand * 2^exponent` from [`decompose`] parts
#[inline]
pub(crate) fn recompose(significand: f64, exponent: i32) -> f64 {
    significand * (exponent as f64).exp2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_recompose() {
        for &v in &[1.0, 1.5, 2.0, 3.75, 1e-9, 1e9, 123.456] {
            let (m, e) = decompose(v);
            assert!((1.0..2.0).contains(&m), "significand {} out of range", m);
            assert_eq!(recompose(m, e), v);
        }
    }

    #[test]
    fn test_variant_tags() {
        let log = IndexMapping::logarithmic(0.01).unwrap();
        let lin = IndexMapping::linearly_interpolated(0.01).unwrap();
        let cub = IndexMapping::cubically_interpolated(0.01).unwrap();

        assert_eq!(log.variant(), MappingVariant::Logarithmic);
        assert_eq!(lin.variant(), MappingVariant::LinearlyInterpolated);
        assert_eq!(cub.variant(), MappingVariant::CubicallyInterpolated);
    }

    #[test]
    fn test_equality_is_bucketing_equality() {
        let a = IndexMapping::logarithmic(0.01).unwrap();
        let b = IndexMapping::logarithmic(0.01).unwrap();
        let c = IndexMapping::logarithmic(0.02).unwrap();
        let d = IndexMapping::linearly_interpolated(0.01).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_from_parts_round_trip() {
        let mappings = [
            IndexMapping::logarithmic(0.015).unwrap(),
            IndexMapping::linearly_interpolated(0.015).unwrap(),
            IndexMapping::cubically_interpolated(0.015).unwrap(),
        ];

        for mapping in &mappings {
            let rebuilt =
                IndexMapping::from_parts(mapping.variant(), mapping.gamma(), mapping.index_offset())
                    .unwrap();
            assert_eq!(mapping, &rebuilt);
            for &v in &[0.25, 1.0, 42.0, 1e6] {
                assert_eq!(mapping.key(v), rebuilt.key(v));
                assert_eq!(
                    mapping.value(mapping.key(v)).to_bits(),
                    rebuilt.value(rebuilt.key(v)).to_bits()
                );
            }
        }
    }

    #[test]
    fn test_invalid_accuracy_rejected() {
        assert!(IndexMapping::logarithmic(0.0).is_err());
        assert!(IndexMapping::logarithmic(1.0).is_err());
        assert!(IndexMapping::linearly_interpolated(-0.5).is_err());
        assert!(IndexMapping::cubically_interpolated(1.5).is_err());
    }
}
