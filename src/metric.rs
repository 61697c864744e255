//! Clustering-quality metrics.
//!
//! The optimizer only needs "score this clustering against this window, higher is
//! better". [`QualityMetric`] is that contract; closures implement it too.
//! [`SimplifiedSilhouette`] over [`CentroidClustering`] is a ready-made metric for
//! centroid-based algorithms.

use crate::Window;

/// Scores a clustering against the points of the current window.
///
/// Higher is better. A non-finite score marks the clustering as unscorable for
/// this cycle.
pub trait QualityMetric<K> {
    fn score(&mut self, clustering: &K, window: &Window) -> f64;
}

impl<K, F> QualityMetric<K> for F
where
    F: FnMut(&K, &Window) -> f64,
{
    fn score(&mut self, clustering: &K, window: &Window) -> f64 {
        self(clustering, window)
    }
}

/// A clustering described by its cluster centres.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CentroidClustering {
    pub centers: Vec<Vec<f64>>,
}

impl CentroidClustering {
    pub fn new(centers: Vec<Vec<f64>>) -> Self {
        Self { centers }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Index of the closest centre and its distance.
    pub fn nearest(&self, point: &[f64]) -> Option<(usize, f64)> {
        self.centers
            .iter()
            .enumerate()
            .map(|(i, c)| (i, euclidean(c, point)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
    }

    /// Distances to the closest and second-closest centres.
    fn two_nearest(&self, point: &[f64]) -> Option<(f64, f64)> {
        let mut first = f64::INFINITY;
        let mut second = f64::INFINITY;
        for c in &self.centers {
            let d = euclidean(c, point);
            if d < first {
                second = first;
                first = d;
            } else if d < second {
                second = d;
            }
        }
        (second.is_finite()).then_some((first, second))
    }
}

/// Euclidean distance over the shared prefix of two vectors.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Centroid form of the silhouette coefficient, in `[-1, 1]`.
///
/// Each window point is assigned to its nearest centre; with `a` the distance to
/// that centre and `b` the distance to the next closest one, the point scores
/// `(b - a) / max(a, b)`. The metric is the mean over the window.
///
/// An empty window scores `NaN` (unscorable); a clustering with fewer than two
/// centres scores `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifiedSilhouette;

impl QualityMetric<CentroidClustering> for SimplifiedSilhouette {
    fn score(&mut self, clustering: &CentroidClustering, window: &Window) -> f64 {
        if window.is_empty() {
            return f64::NAN;
        }
        if clustering.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut n = 0usize;
        for p in window.iter() {
            let Some((a, b)) = clustering.two_nearest(&p.values) else {
                continue;
            };
            let denom = a.max(b);
            total += if denom > 0.0 { (b - a) / denom } else { 0.0 };
            n += 1;
        }
        if n == 0 {
            f64::NAN
        } else {
            total / n as f64
        }
    }
}
