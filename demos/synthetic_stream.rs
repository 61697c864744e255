//! Tune a sequential k-means over a drifting Gaussian-blob stream.
//!
//! ```text
//! cargo run --example synthetic_stream                  # built-in settings
//! cargo run --example synthetic_stream -- settings.json # settings file
//! RUST_LOG=streamtune=debug cargo run --example synthetic_stream
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use streamtune::{
    CentroidClustering, Clusterer, ClustererFactory, CommandToken, EnsembleOptimizer,
    NearestNeighbourRegressor, ProposalOutcome, Settings, SimplifiedSilhouette,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SETTINGS: &str = r#"{
    "windowSize": 500,
    "ensembleSize": 6,
    "newConfigurations": 3,
    "seed": 7,
    "algorithms": [
        { "algorithm": "kmeans", "parameters": [
            { "parameter": "k", "type": "integer", "value": 2, "range": [1, 10] },
            { "parameter": "rate", "type": "numeric", "value": 0.05, "range": [0.001, 0.5] },
            { "parameter": "seeding", "type": "categorical", "value": "first", "range": ["first", "spread"] } ] },
        { "algorithm": "kmeans", "parameters": [
            { "parameter": "k", "type": "integer", "value": 6, "range": [1, 10] },
            { "parameter": "rate", "type": "numeric", "value": 0.2, "range": [0.001, 0.5] },
            { "parameter": "seeding", "type": "categorical", "value": "spread", "range": ["first", "spread"] } ] }
    ]
}"#;

/// Sequential k-means. With `spread` seeding a point within distance 1 of an
/// existing centre updates that centre instead of seeding a new one.
#[derive(Debug, Clone)]
struct KMeans {
    k: usize,
    rate: f64,
    spread: bool,
    centers: Vec<Vec<f64>>,
}

impl Clusterer for KMeans {
    type Clustering = CentroidClustering;

    fn train_on_point(&mut self, point: &[f64]) {
        let view = CentroidClustering::new(self.centers.clone());
        let nearest = view.nearest(point);
        if self.centers.len() < self.k {
            let crowded = self.spread && nearest.is_some_and(|(_, d)| d < 1.0);
            if !crowded {
                self.centers.push(point.to_vec());
                return;
            }
        }
        if let Some((i, _)) = nearest {
            for (c, x) in self.centers[i].iter_mut().zip(point) {
                *c += self.rate * (x - *c);
            }
        }
    }

    fn clustering(&self) -> Option<CentroidClustering> {
        (self.centers.len() >= 2).then(|| CentroidClustering::new(self.centers.clone()))
    }

    fn reset_learning(&mut self) {
        self.centers.clear();
    }

    fn supports_in_place_update(&self) -> bool {
        true
    }

    fn try_set_option(&mut self, name: &str, value: &str) -> bool {
        match (name, value) {
            ("k", v) => v.parse::<usize>().map(|k| self.k = k.max(1)).is_ok(),
            ("rate", v) => v.parse::<f64>().map(|r| self.rate = r).is_ok(),
            ("seeding", "first") => {
                self.spread = false;
                true
            }
            ("seeding", "spread") => {
                self.spread = true;
                true
            }
            _ => false,
        }
    }

    fn adjust_internal_caches(&mut self) -> bool {
        self.centers.truncate(self.k);
        true
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported option {0}")]
struct UnsupportedOption(String);

struct KMeansFactory;

impl ClustererFactory for KMeansFactory {
    type Clusterer = KMeans;
    type Error = UnsupportedOption;

    fn build(&self, algorithm: &str, tokens: &[CommandToken]) -> Result<KMeans, UnsupportedOption> {
        if algorithm != "kmeans" {
            return Err(UnsupportedOption(algorithm.to_string()));
        }
        let mut km = KMeans {
            k: 2,
            rate: 0.05,
            spread: false,
            centers: Vec::new(),
        };
        for t in tokens {
            if !km.try_set_option(&t.flag, t.value.as_deref().unwrap_or_default()) {
                return Err(UnsupportedOption(t.to_string()));
            }
        }
        Ok(km)
    }
}

/// Four blobs whose centres slowly rotate; a fifth blob appears halfway.
fn stream(seed: u64, n: usize, noise: Normal<f64>) -> impl Iterator<Item = [f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(move |i| {
        let blobs = if i < n / 2 { 4 } else { 5 };
        let b = rng.random_range(0..blobs);
        let angle = b as f64 * std::f64::consts::TAU / blobs as f64 + i as f64 * 1e-4;
        [
            8.0 * angle.cos() + noise.sample(&mut rng),
            8.0 * angle.sin() + noise.sample(&mut rng),
        ]
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_path(path)?,
        None => Settings::from_json_str(SETTINGS)?,
    };
    let mut opt = EnsembleOptimizer::from_settings(
        settings,
        KMeansFactory,
        SimplifiedSilhouette,
        NearestNeighbourRegressor::default(),
    )?;

    for point in stream(3, 20_000, Normal::new(0.0, 0.6)?) {
        let Some(report) = opt.train_on_point(&point)? else {
            continue;
        };
        let replaced = report
            .proposals
            .iter()
            .filter(|p| matches!(p, ProposalOutcome::Replaced { .. }))
            .count();
        info!(
            cycle = report.cycle,
            best_score = ?report.best_score,
            admitted = report.admitted(),
            replaced,
            ensemble = report.ensemble_size,
            "cycle"
        );
    }

    if let Some(best) = opt.best_configuration() {
        info!(command = %best.command_line(), "best configuration");
    }
    for (slot, (cfg, score)) in opt.ensemble().iter().zip(opt.scores()).enumerate() {
        println!("{slot}: {:<40} {:?}", cfg.command_line(), score);
    }
    Ok(())
}
