//! Performance surrogate: predicts the quality of an untrained configuration.
//!
//! The regression model is pluggable ([`Regressor`]). [`Surrogate`] wraps it with
//! the gate the optimizer relies on: no prediction until at least two distinct
//! `(parameter vector, quality)` samples have been seen, and any non-finite
//! prediction reads as "unavailable".

use std::collections::VecDeque;

use crate::EvaluationRecord;

/// Online regression model mapping parameter vectors to quality.
pub trait Regressor {
    /// Incorporate one `(x, y)` sample.
    fn train(&mut self, x: &[f64], y: f64);

    /// Predict `y` for `x`. Return `NaN` when no prediction can be made.
    fn predict(&self, x: &[f64]) -> f64;

    /// Forget all samples.
    fn reset(&mut self);
}

/// Gatekeeping wrapper around a [`Regressor`].
#[derive(Debug, Clone)]
pub struct Surrogate<R> {
    regressor: R,
    samples_seen: u64,
    first: Option<(Vec<f64>, f64)>,
    distinct: bool,
}

impl<R: Regressor> Surrogate<R> {
    pub fn new(regressor: R) -> Self {
        Self {
            regressor,
            samples_seen: 0,
            first: None,
            distinct: false,
        }
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Whether two distinct samples have been seen.
    pub fn is_ready(&self) -> bool {
        self.distinct
    }

    /// Feed one cycle's scored members, one sample per record.
    pub fn fit(&mut self, records: &[EvaluationRecord]) {
        for r in records {
            self.fit_one(&r.parameter_vector, r.score);
        }
    }

    /// Feed a single sample. Non-finite targets are ignored.
    pub fn fit_one(&mut self, x: &[f64], y: f64) {
        if !y.is_finite() {
            return;
        }
        match &self.first {
            None => self.first = Some((x.to_vec(), y)),
            Some((fx, fy)) => {
                if !self.distinct && (fx.as_slice() != x || *fy != y) {
                    self.distinct = true;
                }
            }
        }
        self.regressor.train(x, y);
        self.samples_seen += 1;
    }

    /// Predicted quality for `x`, or `None` when unavailable.
    pub fn predict(&self, x: &[f64]) -> Option<f64> {
        if !self.distinct {
            return None;
        }
        let y = self.regressor.predict(x);
        y.is_finite().then_some(y)
    }

    pub fn reset(&mut self) {
        self.regressor.reset();
        self.samples_seen = 0;
        self.first = None;
        self.distinct = false;
    }
}

/// Bounded-memory k-nearest-neighbour regressor.
///
/// Keeps the most recent `capacity` samples. Prediction is the inverse-distance
/// weighted mean of the `k` nearest stored samples, with each dimension scaled by
/// its observed range so wide-domain parameters do not dominate. Exact matches
/// short-circuit to the mean of their targets. Fewer than two stored samples
/// predicts `NaN`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearestNeighbourRegressor {
    k: usize,
    capacity: usize,
    samples: VecDeque<(Vec<f64>, f64)>,
}

impl NearestNeighbourRegressor {
    pub const DEFAULT_K: usize = 5;
    pub const DEFAULT_CAPACITY: usize = 1_000;

    pub fn new(k: usize, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            k: k.max(1),
            capacity,
            samples: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn scales(&self, width: usize) -> Vec<f64> {
        let mut lo = vec![f64::INFINITY; width];
        let mut hi = vec![f64::NEG_INFINITY; width];
        for (x, _) in &self.samples {
            for (j, &v) in x.iter().take(width).enumerate() {
                lo[j] = lo[j].min(v);
                hi[j] = hi[j].max(v);
            }
        }
        lo.iter()
            .zip(&hi)
            .map(|(l, h)| {
                let r = h - l;
                if r.is_finite() && r > 0.0 {
                    r
                } else {
                    1.0
                }
            })
            .collect()
    }
}

impl Default for NearestNeighbourRegressor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_K, Self::DEFAULT_CAPACITY)
    }
}

impl Regressor for NearestNeighbourRegressor {
    fn train(&mut self, x: &[f64], y: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((x.to_vec(), y));
    }

    fn predict(&self, x: &[f64]) -> f64 {
        if self.samples.len() < 2 {
            return f64::NAN;
        }
        let scales = self.scales(x.len());
        let mut dists: Vec<(f64, f64)> = self
            .samples
            .iter()
            .map(|(sx, sy)| {
                let d2: f64 = sx
                    .iter()
                    .zip(x)
                    .zip(&scales)
                    .map(|((a, b), s)| ((a - b) / s).powi(2))
                    .sum();
                (d2.sqrt(), *sy)
            })
            .collect();
        dists.sort_by(|a, b| a.0.total_cmp(&b.0));
        dists.truncate(self.k);

        let exact: Vec<f64> = dists.iter().filter(|(d, _)| *d == 0.0).map(|(_, y)| *y).collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }
        let mut num = 0.0;
        let mut den = 0.0;
        for (d, y) in dists {
            let w = 1.0 / d;
            num += w * y;
            den += w;
        }
        if den > 0.0 {
            num / den
        } else {
            f64::NAN
        }
    }

    fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_is_unavailable() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        s.fit_one(&[0.1], 0.5);
        assert!(!s.is_ready());
        assert_eq!(s.predict(&[0.1]), None);
    }

    #[test]
    fn two_distinct_samples_predict() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        s.fit_one(&[0.1], 0.5);
        s.fit_one(&[0.9], 0.1);
        let y = s.predict(&[0.2]).unwrap();
        assert!(y > 0.1 && y < 0.5, "y={y}");
    }

    #[test]
    fn repeated_identical_samples_are_not_enough() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        for _ in 0..5 {
            s.fit_one(&[0.3, 1.0], 0.7);
        }
        assert_eq!(s.samples_seen(), 5);
        assert_eq!(s.predict(&[0.3, 1.0]), None);
    }

    #[test]
    fn non_finite_targets_are_ignored() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        s.fit_one(&[0.1], f64::NAN);
        s.fit_one(&[0.2], f64::INFINITY);
        assert_eq!(s.samples_seen(), 0);
    }

    #[test]
    fn fit_takes_one_sample_per_record() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        s.fit(&[
            EvaluationRecord { slot: 0, parameter_vector: vec![1.0], score: 0.2 },
            EvaluationRecord { slot: 1, parameter_vector: vec![2.0], score: 0.4 },
        ]);
        assert_eq!(s.samples_seen(), 2);
        assert!(s.is_ready());
    }

    #[test]
    fn reset_closes_the_gate() {
        let mut s = Surrogate::new(NearestNeighbourRegressor::default());
        s.fit_one(&[0.1], 0.5);
        s.fit_one(&[0.9], 0.1);
        s.reset();
        assert!(!s.is_ready());
        assert!(s.regressor().is_empty());
    }

    #[test]
    fn nan_from_regressor_reads_as_unavailable() {
        struct Never;
        impl Regressor for Never {
            fn train(&mut self, _x: &[f64], _y: f64) {}
            fn predict(&self, _x: &[f64]) -> f64 {
                f64::NAN
            }
            fn reset(&mut self) {}
        }
        let mut s = Surrogate::new(Never);
        s.fit_one(&[0.0], 0.0);
        s.fit_one(&[1.0], 1.0);
        assert_eq!(s.predict(&[0.5]), None);
    }

    #[test]
    fn knn_exact_match_returns_mean_target() {
        let mut r = NearestNeighbourRegressor::new(3, 10);
        r.train(&[1.0, 1.0], 0.2);
        r.train(&[1.0, 1.0], 0.4);
        r.train(&[5.0, 5.0], 0.9);
        assert!((r.predict(&[1.0, 1.0]) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn knn_scales_dimensions_by_range() {
        let mut r = NearestNeighbourRegressor::new(1, 10);
        // Dimension 1 spans 0..100, dimension 0 spans 0..1.
        r.train(&[0.0, 0.0], 1.0);
        r.train(&[1.0, 100.0], 2.0);
        r.train(&[1.0, 0.0], 3.0);
        // Unscaled, [0.9, 10] would be nearest to [1, 0]; scaled it is still [1, 0]
        // because 10 / 100 is small relative to the unit-range gap.
        assert_eq!(r.predict(&[0.9, 10.0]), 3.0);
    }

    #[test]
    fn knn_capacity_is_bounded() {
        let mut r = NearestNeighbourRegressor::new(2, 3);
        for i in 0..10 {
            r.train(&[i as f64], i as f64);
        }
        assert_eq!(r.len(), 3);
    }
}
