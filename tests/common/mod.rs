#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use streamtune::{
    AlgorithmDeclaration, CentroidClustering, Clusterer, ClustererFactory, CommandToken,
    ParameterDeclaration, QualityMetric, Regressor, Window,
};

/// Sequential k-means: the first `k` points seed the centres, later points pull
/// their nearest centre toward them by `rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqKMeans {
    pub k: usize,
    pub rate: f64,
    pub centers: Vec<Vec<f64>>,
    pub seen: u64,
    pub adjusted: u32,
}

impl SeqKMeans {
    pub fn new(k: usize, rate: f64) -> Self {
        Self {
            k: k.max(1),
            rate,
            centers: Vec::new(),
            seen: 0,
            adjusted: 0,
        }
    }
}

impl Clusterer for SeqKMeans {
    type Clustering = CentroidClustering;

    fn train_on_point(&mut self, point: &[f64]) {
        self.seen += 1;
        if self.centers.len() < self.k {
            self.centers.push(point.to_vec());
            return;
        }
        let clustering = CentroidClustering::new(self.centers.clone());
        if let Some((i, _)) = clustering.nearest(point) {
            for (c, x) in self.centers[i].iter_mut().zip(point) {
                *c += self.rate * (x - *c);
            }
        }
    }

    fn clustering(&self) -> Option<CentroidClustering> {
        (!self.centers.is_empty()).then(|| CentroidClustering::new(self.centers.clone()))
    }

    fn reset_learning(&mut self) {
        self.centers.clear();
        self.seen = 0;
    }

    fn supports_in_place_update(&self) -> bool {
        true
    }

    fn try_set_option(&mut self, name: &str, value: &str) -> bool {
        match name {
            "k" => value.parse::<usize>().map(|k| self.k = k.max(1)).is_ok(),
            "rate" => value.parse::<f64>().map(|r| self.rate = r).is_ok(),
            _ => false,
        }
    }

    fn adjust_internal_caches(&mut self) -> bool {
        self.centers.truncate(self.k);
        self.adjusted += 1;
        true
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot build `{algorithm}`: {reason}")]
pub struct BuildError {
    pub algorithm: String,
    pub reason: String,
}

/// Builds [`SeqKMeans`] from `-k N -rate R` tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansFactory;

impl ClustererFactory for KMeansFactory {
    type Clusterer = SeqKMeans;
    type Error = BuildError;

    fn build(&self, algorithm: &str, tokens: &[CommandToken]) -> Result<SeqKMeans, BuildError> {
        let fail = |reason: String| BuildError {
            algorithm: algorithm.to_string(),
            reason,
        };
        if algorithm != "kmeans" {
            return Err(fail("unknown algorithm".to_string()));
        }
        let mut km = SeqKMeans::new(2, 0.05);
        for t in tokens {
            let value = t.value.as_deref().unwrap_or_default();
            if !km.try_set_option(&t.flag, value) {
                return Err(fail(format!("bad option {t}")));
            }
        }
        Ok(km)
    }
}

pub fn kmeans(k: i64, rate: f64) -> AlgorithmDeclaration {
    AlgorithmDeclaration::new(
        "kmeans",
        vec![
            ParameterDeclaration::integer("k", k, 1, 8),
            ParameterDeclaration::numeric("rate", rate, 0.001, 0.5),
        ],
    )
}

/// Predicts the same value everywhere.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub f64);

impl Regressor for Constant {
    fn train(&mut self, _x: &[f64], _y: f64) {}
    fn predict(&self, _x: &[f64]) -> f64 {
        self.0
    }
    fn reset(&mut self) {}
}

/// Counts how many clusterings it has scored and scores them all `score`.
#[derive(Debug, Clone, Copy)]
pub struct Flat {
    pub score: f64,
    pub calls: usize,
}

impl QualityMetric<CentroidClustering> for Flat {
    fn score(&mut self, _c: &CentroidClustering, _w: &Window) -> f64 {
        self.calls += 1;
        self.score
    }
}

/// `n` points drawn round-robin from isotropic Gaussian blobs.
pub fn blobs(seed: u64, n: usize, centres: &[[f64; 2]], sd: f64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sd).unwrap();
    (0..n)
        .map(|i| {
            let c = centres[i % centres.len()];
            vec![c[0] + noise.sample(&mut rng), c[1] + noise.sample(&mut rng)]
        })
        .collect()
}

/// Same as [`blobs`] but with the blob order shuffled.
pub fn shuffled_blobs(seed: u64, n: usize, centres: &[[f64; 2]], sd: f64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9);
    let noise = Normal::new(0.0, sd).unwrap();
    (0..n)
        .map(|_| {
            let c = centres[rng.random_range(0..centres.len())];
            vec![c[0] + noise.sample(&mut rng), c[1] + noise.sample(&mut rng)]
        })
        .collect()
}

pub const THREE_BLOBS: [[f64; 2]; 3] = [[0.0, 0.0], [8.0, 8.0], [-8.0, 8.0]];
