//! `streamtune`: online ensemble hyperparameter search for streaming clustering.
//!
//! A bounded pool of candidate algorithm configurations trains on the same
//! stream. Every `window_size` points the pool is scored against the points seen
//! since the last cycle, a regression surrogate is refit on
//! `(parameter vector, score)` pairs, and new candidates are proposed by mutating
//! score-proportionally chosen parents. A candidate joins only if there is spare
//! capacity or the surrogate predicts it beats the weakest live member. The
//! stream never stops for tuning.
//!
//! **Pieces:**
//! - [`Parameter`]: one sum type over numeric, integer, categorical, boolean and
//!   ordinal knobs. Numeric-like kinds resample from a truncated normal with a
//!   shrinking spread; finite kinds spin a roulette wheel and reinforce.
//! - [`Configuration`]: algorithm identifier + ordered parameters + the live
//!   instance they configure, kept consistent by in-place update or rebuild.
//! - [`Window`], [`Evaluator`], [`QualityMetric`]: per-cycle scoring.
//! - [`Surrogate`] / [`Regressor`]: gated quality prediction for untrained candidates.
//! - [`EnsembleOptimizer`]: the windowed evaluate / propose cycle.
//! - [`roulette_wheel`] / [`TruncatedNormal`]: the sampling primitives.
//!
//! **Collaborators** are traits: [`Clusterer`] / [`ClustererFactory`] for the
//! algorithms, [`QualityMetric`] for scoring, [`Regressor`] for the surrogate.
//! [`SimplifiedSilhouette`] and [`NearestNeighbourRegressor`] are bundled.
//!
//! **Determinism:** the optimizer owns a seeded [`rand::rngs::StdRng`]; the same
//! seed, population and stream give the same trajectory.
//!
//! **Non-goals:**
//! - No clustering algorithms and no stream sources.
//! - Single-threaded: one point is processed to completion before the next.
//!
//! ```rust
//! use streamtune::{
//!     AlgorithmDeclaration, CentroidClustering, Clusterer, ClustererFactory, CommandToken,
//!     EnsembleOptimizer, NearestNeighbourRegressor, OptimizerConfig, ParameterDeclaration,
//!     SimplifiedSilhouette,
//! };
//!
//! /// Two fixed centres `spread` apart.
//! #[derive(Clone)]
//! struct Pair { spread: f64, seen: bool }
//!
//! impl Clusterer for Pair {
//!     type Clustering = CentroidClustering;
//!     fn train_on_point(&mut self, _p: &[f64]) { self.seen = true; }
//!     fn clustering(&self) -> Option<CentroidClustering> {
//!         self.seen.then(|| CentroidClustering::new(vec![vec![0.0], vec![self.spread]]))
//!     }
//!     fn reset_learning(&mut self) { self.seen = false; }
//! }
//!
//! struct Pairs;
//!
//! impl ClustererFactory for Pairs {
//!     type Clusterer = Pair;
//!     type Error = std::num::ParseFloatError;
//!     fn build(&self, _algorithm: &str, tokens: &[CommandToken]) -> Result<Pair, Self::Error> {
//!         let spread = tokens[0].value.as_deref().unwrap_or("1").parse()?;
//!         Ok(Pair { spread, seen: false })
//!     }
//! }
//!
//! let config = OptimizerConfig::default()
//!     .with_window_size(50)
//!     .with_ensemble_size(4)
//!     .with_new_configurations(2);
//! let initial = [
//!     AlgorithmDeclaration::new("pair", vec![ParameterDeclaration::numeric("s", 2.0, 0.5, 12.0)]),
//!     AlgorithmDeclaration::new("pair", vec![ParameterDeclaration::numeric("s", 8.0, 0.5, 12.0)]),
//! ];
//! let mut opt = EnsembleOptimizer::new(
//!     config,
//!     &initial,
//!     Pairs,
//!     SimplifiedSilhouette,
//!     NearestNeighbourRegressor::default(),
//! )
//! .unwrap();
//!
//! let stream = (0..200).map(|i| [if i % 2 == 0 { 0.1 } else { 9.9 }]);
//! let reports = opt.train_on_stream(stream).unwrap();
//! assert_eq!(reports.len(), 4);
//! assert!(opt.ensemble().len() <= 4);
//! assert!(opt.best_configuration().is_some());
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod sampling;
pub use sampling::*;

mod parameter;
pub use parameter::*;

mod schema;
pub use schema::*;

mod clusterer;
pub use clusterer::*;

mod configuration;
pub use configuration::*;

mod window;
pub use window::*;

mod metric;
pub use metric::*;

mod evaluator;
pub use evaluator::*;

mod surrogate;
pub use surrogate::*;

mod settings;
pub use settings::*;

mod optimizer;
pub use optimizer::*;
