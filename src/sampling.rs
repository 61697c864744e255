//! Sampling primitives shared by parameter adaptation and ensemble selection.
//!
//! - [`roulette_wheel`]: pick an index with probability proportional to its weight.
//! - [`TruncatedNormal`]: a normal distribution restricted to a closed interval.
//!
//! Both take the RNG explicitly so that callers control seeding and runs are
//! reproducible.

use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Error, Result};

/// Number of rejection rounds before [`TruncatedNormal`] falls back to a uniform draw.
const MAX_REJECTION_ATTEMPTS: usize = 1_000;

/// Roulette-wheel (proportional) selection.
///
/// Returns index `i` with probability `weights[i] / sum(weights)`.
///
/// Errors instead of returning an arbitrary index when the wheel is unusable:
/// - [`Error::EmptyWeights`] for an empty slice,
/// - [`Error::InvalidWeights`] for a negative or non-finite entry,
/// - [`Error::ZeroTotalWeight`] when every entry is zero.
///
/// ```rust
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let i = streamtune::roulette_wheel(&[0.0, 2.0, 0.0], &mut rng).unwrap();
/// assert_eq!(i, 1);
/// ```
pub fn roulette_wheel<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    if weights.is_empty() {
        return Err(Error::EmptyWeights);
    }
    let mut total = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeights { index, weight });
        }
        total += weight;
    }
    if total <= 0.0 || !total.is_finite() {
        return Err(Error::ZeroTotalWeight);
    }
    let wheel = WeightedIndex::new(weights).map_err(|_| Error::ZeroTotalWeight)?;
    Ok(wheel.sample(rng))
}

/// Normal distribution truncated to the closed interval `[low, high]`.
///
/// Sampling is by rejection against `N(mean, std)`. If no draw lands inside the
/// interval after a bounded number of attempts (the interval sits far in a tail),
/// the sample falls back to a uniform draw on `[low, high]`. Every returned value
/// lies in `[low, high]`.
#[derive(Debug, Clone, Copy)]
pub struct TruncatedNormal {
    low: f64,
    high: f64,
    mean: f64,
    normal: Option<Normal<f64>>,
}

impl TruncatedNormal {
    /// Create a truncated normal centered at `mean` with spread `std`.
    ///
    /// `mean` is clamped into the interval. A non-positive or non-finite `std`
    /// yields a degenerate distribution that always returns the clamped mean.
    pub fn new(mean: f64, std: f64, low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(Error::InvalidSettings(format!(
                "truncated normal needs a finite interval with low <= high, got [{low}, {high}]"
            )));
        }
        let mean = if mean.is_finite() {
            mean.clamp(low, high)
        } else {
            low + (high - low) / 2.0
        };
        let normal = if std.is_finite() && std > 0.0 {
            Normal::new(mean, std).ok()
        } else {
            None
        };
        Ok(Self {
            low,
            high,
            mean,
            normal,
        })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Distribution<f64> for TruncatedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.low == self.high {
            return self.low;
        }
        let Some(normal) = self.normal else {
            return self.mean;
        };
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let x = normal.sample(rng);
            if x >= self.low && x <= self.high {
                return x;
            }
        }
        rng.random_range(self.low..=self.high)
    }
}
