//! Cubically interpolated index mapping

use super::{decompose, gamma_from_accuracy, recompose, validate_gamma};
use crate::common::Result;

/// Cubic polynomial coefficients approximating `log2(1 + u)` for `u` in `[0, 1)`.
///
/// Chosen to match `log2` at both interval endpoints while equalizing the
/// worst-case slope deviation, which lands at `u = 0` and `u ~= 0.67`.
const A: f64 = 6.0 / 35.0;
const B: f64 = -3.0 / 5.0;
const C: f64 = 10.0 / 7.0;

/// Approximates `log2(x)` by a cubic in the mantissa: for `x = m * 2^e`,
/// `l(x) = e + A*u^3 + B*u^2 + C*u` with `u = m - 1`.
///
/// The cubic tracks `log2` closely enough that the multiplier only needs a
/// `7 / 10` correction over the ideal `1 / ln(gamma)`: the interpolation's
/// slope against the true logarithm bottoms out at `10/7 * ln 2`, so
/// `multiplier = 7 / (10 * ln(gamma))` makes the widest bucket exactly gamma
/// wide. Bucket count comes within about 1% of the logarithmic mapping
/// without any transcendental call on the key path.
#[derive(Debug, Clone)]
pub struct CubicallyInterpolatedMapping {
    gamma: f64,
    /// `7 / (10 * ln(gamma))`; sized for the worst-case interpolation slope.
    multiplier: f64,
    index_offset: f64,
    relative_accuracy: f64,
    min_indexable: f64,
    max_indexable: f64,
}

impl CubicallyInterpolatedMapping {
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
        let multiplier = 7.0 / (10.0 * gamma.ln());
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
        let u = significand - 1.0;
        exponent as f64 + ((A * u + B) * u + C) * u
    }

    /// Exact inverse of [`Self::log2_approx`]: solves the monotonic cubic
    /// `A*u^3 + B*u^2 + C*u = d` for the fractional part via Cardano's formula.
    #[inline]
    fn exp2_approx(ell: f64) -> f64 {
        let exponent = ell.floor();
        let d = ell - exponent;

        let d0 = B * B - 3.0 * A * C;
        let d1 = 2.0 * B * B * B - 9.0 * A * B * C - 27.0 * A * A * d;
        // d1^2 - 4*d0^3 stays positive for every d in [0, 1), and p never
        // vanishes, so no branch is needed.
        let p = ((d1 - (d1 * d1 - 4.0 * d0 * d0 * d0).sqrt()) / 2.0).cbrt();
        let u = -(B + p + d0 / p) / (3.0 * A);

        recompose(1.0 + u, exponent as i32)
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
