//! Linearly interpolated index mapping

use super::{decompose, gamma_from_accuracy, recompose, validate_gamma};
use crate::common::Result;

/// Approximates `log2(x)` by linear interpolation between powers of two:
/// for `x = m * 2^e` with `m` in `[1, 2)`, `l(x) = e + (m - 1)`.
///
/// No transcendental call on the key path, at the price of buckets that are
/// not all the same ratio wide. The interpolation's slope against the true
/// `log2` bottoms out at `ln 2` (as `m -> 1`), so the multiplier is chosen as
/// `1 / ln(gamma)` rather than the endpoint-exact `1 / log2(gamma)`: the
/// widest bucket is then exactly gamma wide and the requested accuracy holds
/// everywhere, not just at the powers of two.
#[derive(Debug, Clone)]
pub struct LinearlyInterpolatedMapping {
    gamma: f64,
    /// `1 / ln(gamma)`; sized for the worst-case interpolation slope.
    multiplier: f64,
    index_offset: f64,
    relative_accuracy: f64,
    min_indexable: f64,
    max_indexable: f64,
}

impl LinearlyInterpolatedMapping {
    /// Creates a mapping honouring the given relative accuracy
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless `relative_accuracy` is in (0, 1).
    pub fn new(relative_accuracy: f64) -> Result<Self> {
        Self::from_gamma(gamma_from_accuracy(relative_accuracy)?, 0.0)
    }

    /// Creates a mapping with an explicit key offset
    pub fn with_offset(relative_accuracy: f64, index_offset: f64) -> Result<Self> {
        Self::from_gamma(gamma_from_accuracy(relative_accuracy)?, index_offset)
    }

    /// Rebuilds a mapping from serialized `gamma` and `index_offset`
    pub fn from_gamma(gamma: f64, index_offset: f64) -> Result<Self> {
        validate_gamma(gamma)?;
        let multiplier = 1.0 / gamma.ln();
        Ok(Self {
            gamma,
            multiplier,
            index_offset,
            relative_accuracy: 1.0 - 2.0 / (1.0 + gamma),
            min_indexable: f64::max(
                f64::MIN_POSITIVE * gamma,
                (((i32::MIN as f64) + 1.0 - index_offset) / multiplier).exp2(),
            ),
            max_indexable: f64::min(
                f64::MAX / gamma,
                (((i32::MAX as f64) - 1.0 - index_offset) / multiplier).exp2(),
            ),
        })
    }

    /// Interpolated `log2`
    #[inline]
    fn log2_approx(value: f64) -> f64 {
        let (significand, exponent) = decompose(value);
        exponent as f64 + (significand - 1.0)
    }

    /// Exact inverse of [`Self::log2_approx`]
    #[inline]
    fn exp2_approx(ell: f64) -> f64 {
        let exponent = ell.floor();
        recompose(1.0 + (ell - exponent), exponent as i32)
    }

    /// Bucket key for a positive value
    pub fn key(&self, value: f64) -> i32 {
        (Self::log2_approx(value) * self.multiplier + self.index_offset).ceil() as i32
    }

    /// Representative value of a bucket
    pub fn value(&self, key: i32) -> f64 {
        Self::exp2_approx((key as f64 - self.index_offset) / self.multiplier) * 2.0
            / (1.0 + self.gamma)
    }

    /// The accuracy honoured by this mapping, derived from gamma
    pub fn relative_accuracy(&self) -> f64 {
        self.relative_accuracy
    }

    /// The bucket boundary ratio bound
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// The constant added to every key before rounding
    pub fn index_offset(&self) -> f64 {
        self.index_offset
    }

    /// Smallest positive value with a representable key
    pub fn min_indexable_value(&self) -> f64 {
        self.min_indexable
    }

    /// Largest value with a representable key
    pub fn max_indexable_value(&self) -> f64 {
        self.max_indexable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_approx_exact_at_powers_of_two() {
        for e in [-20, -1, 0, 1, 10, 40] {
            let v = (e as f64).exp2();
            assert_eq!(LinearlyInterpolatedMapping::log2_approx(v), e as f64);
        }
    }

    #[test]
    fn test_exp2_approx_inverts_log2_approx() {
        for &v in &[0.001, 0.7, 1.0, 1.5, 3.9, 1e7] {
            let ell = LinearlyInterpolatedMapping::log2_approx(v);
            let back = LinearlyInterpolatedMapping::exp2_approx(ell);
            assert!(
                (back - v).abs() / v < 1e-12,
                "round-trip of {} gave {}",
                v,
                back
            );
        }
    }

    #[test]
    fn test_key_value_within_accuracy() {
        // The multiplier derivation claims the worst case sits at significands
        // near 1; sweep densely across the whole mantissa range to check it.
        let mapping = LinearlyInterpolatedMapping::new(0.01).unwrap();

        for i in 0..4000 {
            let value = 1.0 + (i as f64) * 3e5;
            let recovered = mapping.value(mapping.key(value));
            let relative_error = (recovered - value).abs() / value;
            assert!(
                relative_error <= 0.01 + 1e-9,
                "value {}: recovered {}, error {}",
                value,
                recovered,
                relative_error
            );
        }
    }

    #[test]
    fn test_keys_monotonic_in_value() {
        let mapping = LinearlyInterpolatedMapping::new(0.05).unwrap();
        let mut previous = mapping.key(1e-3);
        let mut value = 1e-3;
        while value < 1e3 {
            value *= 1.01;
            let key = mapping.key(value);
            assert!(key >= previous, "keys went backwards at {}", value);
            previous = key;
        }
    }
}
