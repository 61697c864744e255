//! The ensemble optimizer: windowed evaluate / propose cycle.
//!
//! Every point trains every live member and lands in the [`Window`]. When the
//! window has collected `window_size` points the optimizer runs one cycle:
//!
//! 1. score every member against the window, track the best one, and feed the
//!    scored `(parameter vector, score)` pairs to the [`Surrogate`];
//! 2. `new_configurations_per_cycle` times: pick a parent by roulette wheel over
//!    live scores, duplicate and resample it, ask the surrogate for a predicted
//!    score, then add it (spare capacity) or replace a member (prediction beats
//!    the minimum live score);
//! 3. clear the window.
//!
//! An unavailable prediction abandons the rest of the proposal loop for that
//! cycle, and so does a candidate that cannot be built; both are recorded in the
//! [`CycleReport`]. A cycle with no scored member proposes nothing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::sampling::roulette_wheel;
use crate::{
    AlgorithmDeclaration, Clusterer, ClustererFactory, Configuration, Error, EvictionPolicy,
    Evaluator, OptimizerConfig, QualityMetric, Regressor, Result, Surrogate, Window, WindowPoint,
};

#[cfg(feature = "serde")]
use crate::Settings;

/// Where the optimizer is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptimizerState {
    /// Accumulating points into the window.
    Idle,
    /// Scoring members and refitting the surrogate.
    Evaluating,
    /// Generating and admitting candidates.
    Proposing,
}

/// What happened to one proposal attempt.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProposalOutcome {
    /// Appended into spare capacity at `slot`.
    Added {
        slot: usize,
        parent: usize,
        predicted: f64,
    },
    /// Overwrote `slot`; `predicted` beat `min_score`.
    Replaced {
        slot: usize,
        parent: usize,
        predicted: f64,
        min_score: f64,
    },
    /// Ensemble full and `predicted` did not beat `min_score`.
    Rejected {
        parent: usize,
        predicted: f64,
        min_score: f64,
    },
    /// The surrogate could not predict; the rest of the cycle's proposals were dropped.
    Abandoned { parent: usize },
    /// The candidate could not be resampled or rebuilt; the rest of the cycle's
    /// proposals were dropped.
    Failed { parent: usize, error: String },
    /// No scored member to select a parent from; nothing was proposed.
    Skipped,
}

impl ProposalOutcome {
    /// Whether the ensemble changed.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Replaced { .. })
    }
}

/// Summary of one evaluate / propose cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleReport {
    /// One-based cycle number.
    pub cycle: u64,
    /// Measured scores in ensemble order, before any proposal.
    pub scores: Vec<Option<f64>>,
    pub best: Option<usize>,
    pub best_score: Option<f64>,
    pub proposals: Vec<ProposalOutcome>,
    /// Ensemble size after the cycle.
    pub ensemble_size: usize,
}

impl CycleReport {
    pub fn admitted(&self) -> usize {
        self.proposals.iter().filter(|p| p.is_admitted()).count()
    }
}

/// Online ensemble search over clusterer configurations.
///
/// Owns the ensemble, the window, the surrogate and the generator; nothing is
/// shared, so every mutation happens inside [`EnsembleOptimizer::train_on_point`].
pub struct EnsembleOptimizer<F, M, R>
where
    F: ClustererFactory,
{
    config: OptimizerConfig,
    factory: F,
    evaluator: Evaluator<M>,
    surrogate: Surrogate<R>,
    ensemble: Vec<Configuration<F::Clusterer>>,
    /// Live score table, aligned with `ensemble`. Admitted candidates carry their
    /// predicted score until the next evaluation.
    scores: Vec<Option<f64>>,
    window: Window,
    rng: StdRng,
    points_seen: u64,
    since_cycle: usize,
    cycles: u64,
    best: Option<usize>,
    state: OptimizerState,
    vector_width: usize,
}

impl<F, M, R> EnsembleOptimizer<F, M, R>
where
    F: ClustererFactory,
    M: QualityMetric<<F::Clusterer as Clusterer>::Clustering>,
    R: Regressor,
{
    /// Build the initial population and validate the configuration.
    ///
    /// The population must be non-empty and no larger than `ensemble_size`.
    pub fn new(
        config: OptimizerConfig,
        initial: &[AlgorithmDeclaration],
        factory: F,
        metric: M,
        regressor: R,
    ) -> Result<Self> {
        config.validate()?;
        if initial.is_empty() {
            return Err(Error::InvalidSettings(
                "initial population must contain at least one configuration".to_string(),
            ));
        }
        if initial.len() > config.ensemble_size {
            return Err(Error::InvalidSettings(format!(
                "initial population of {} exceeds ensembleSize {}",
                initial.len(),
                config.ensemble_size
            )));
        }
        let ensemble = initial
            .iter()
            .map(|decl| Configuration::from_declaration(decl, &factory))
            .collect::<Result<Vec<_>>>()?;
        let vector_width = ensemble.iter().map(Configuration::len).max().unwrap_or(0);
        for (slot, cfg) in ensemble.iter().enumerate() {
            debug!(slot, command = %cfg.command_line(), "initial configuration");
        }

        Ok(Self {
            scores: vec![None; ensemble.len()],
            window: Window::new(config.window_size),
            rng: StdRng::seed_from_u64(config.seed),
            evaluator: Evaluator::new(metric),
            surrogate: Surrogate::new(regressor),
            config,
            factory,
            ensemble,
            points_seen: 0,
            since_cycle: 0,
            cycles: 0,
            best: None,
            state: OptimizerState::Idle,
            vector_width,
        })
    }

    /// Build from a parsed settings file.
    #[cfg(feature = "serde")]
    pub fn from_settings(settings: Settings, factory: F, metric: M, regressor: R) -> Result<Self> {
        let (config, algorithms) = settings.into_parts();
        Self::new(config, &algorithms, factory, metric, regressor)
    }

    /// Train every member on `point`; run a cycle when the window fills.
    pub fn train_on_point(&mut self, point: &[f64]) -> Result<Option<CycleReport>> {
        for cfg in self.ensemble.iter_mut() {
            cfg.train_on_point(point);
        }
        self.window
            .push(WindowPoint::new(self.points_seen, point.to_vec()));
        self.points_seen += 1;
        self.since_cycle += 1;

        if self.since_cycle < self.config.window_size {
            return Ok(None);
        }
        self.run_cycle().map(Some)
    }

    /// Feed a sequence of points, collecting the reports of every cycle it triggers.
    pub fn train_on_stream<I, P>(&mut self, points: I) -> Result<Vec<CycleReport>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[f64]>,
    {
        let mut reports = Vec::new();
        for p in points {
            if let Some(report) = self.train_on_point(p.as_ref())? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycles += 1;
        self.state = OptimizerState::Evaluating;

        let evaluation = self
            .evaluator
            .evaluate(&self.ensemble, &self.window, self.vector_width);
        if evaluation.best().is_some() {
            self.best = evaluation.best();
        }
        self.surrogate.fit(evaluation.records());
        self.scores = evaluation.scores().to_vec();

        self.state = OptimizerState::Proposing;
        let proposals = self.propose(evaluation.scores());

        self.window.clear();
        self.since_cycle = 0;
        self.state = OptimizerState::Idle;
        let proposals = proposals?;

        info!(
            cycle = self.cycles,
            scored = evaluation.scored_count(),
            best = ?evaluation.best(),
            best_score = ?evaluation.best_score(),
            admitted = proposals.iter().filter(|p| p.is_admitted()).count(),
            ensemble = self.ensemble.len(),
            "cycle complete"
        );
        Ok(CycleReport {
            cycle: self.cycles,
            best: evaluation.best(),
            best_score: evaluation.best_score(),
            scores: evaluation.into_scores(),
            proposals,
            ensemble_size: self.ensemble.len(),
        })
    }

    /// `measured` holds this cycle's evaluated scores; it moves the best index off
    /// a slot that gets overwritten.
    fn propose(&mut self, measured: &[Option<f64>]) -> Result<Vec<ProposalOutcome>> {
        let mut outcomes = Vec::with_capacity(self.config.new_configurations_per_cycle);
        let mut overwritten = Vec::new();
        for _ in 0..self.config.new_configurations_per_cycle {
            let Some(parent) = self.spin()? else {
                debug!("no scored member, skipping proposals");
                outcomes.push(ProposalOutcome::Skipped);
                break;
            };

            let mut candidate = self.ensemble[parent].duplicate(self.config.keep_current_model);
            let path = match candidate.sample_new_config(
                self.config.shrink_factor(),
                self.config.categorical_learning_rate,
                self.config.keep_current_model,
                &self.factory,
                &mut self.rng,
            ) {
                Ok(path) => path,
                Err(e) => {
                    let error = error_chain(&e);
                    warn!(parent, command = %candidate.command_line(), %error, "candidate failed, abandoning proposals");
                    outcomes.push(ProposalOutcome::Failed { parent, error });
                    break;
                }
            };
            let x = candidate.padded_parameter_vector(self.vector_width);
            let Some(predicted) = self.surrogate.predict(&x) else {
                debug!(parent, command = %candidate.command_line(), "surrogate unavailable, abandoning proposals");
                outcomes.push(ProposalOutcome::Abandoned { parent });
                break;
            };
            debug!(parent, predicted, ?path, command = %candidate.command_line(), "candidate");

            if self.ensemble.len() < self.config.ensemble_size {
                let slot = self.ensemble.len();
                self.ensemble.push(candidate);
                self.scores.push(Some(predicted));
                debug!(slot, predicted, "added candidate");
                outcomes.push(ProposalOutcome::Added {
                    slot,
                    parent,
                    predicted,
                });
                continue;
            }

            let Some(min_score) = self.min_live_score() else {
                outcomes.push(ProposalOutcome::Skipped);
                break;
            };
            if predicted <= min_score {
                debug!(predicted, min_score, "rejected candidate");
                outcomes.push(ProposalOutcome::Rejected {
                    parent,
                    predicted,
                    min_score,
                });
                continue;
            }
            let slot = match self.config.eviction {
                EvictionPolicy::ScoreProportional => self.spin()?,
                EvictionPolicy::WorstMember => self.worst_member(),
            };
            let Some(slot) = slot else {
                outcomes.push(ProposalOutcome::Skipped);
                break;
            };
            debug!(slot, predicted, min_score, evicted = %self.ensemble[slot].command_line(), "replaced member");
            self.ensemble[slot] = candidate;
            self.scores[slot] = Some(predicted);
            overwritten.push(slot);
            if self.best == Some(slot) {
                self.best = runner_up(measured, &overwritten);
            }
            outcomes.push(ProposalOutcome::Replaced {
                slot,
                parent,
                predicted,
                min_score,
            });
        }
        Ok(outcomes)
    }

    /// Roulette wheel over live scores.
    ///
    /// Scored members weigh `max(score, 0)`, unscored ones zero. Weights are
    /// divided by their maximum so that large finite scores cannot overflow the
    /// wheel's total. When every scored member weighs zero the draw is uniform over
    /// scored members. `None` when no member is scored.
    fn spin(&mut self) -> Result<Option<usize>> {
        let scored: Vec<usize> = self
            .scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|_| i))
            .collect();
        if scored.is_empty() {
            return Ok(None);
        }
        let mut weights: Vec<f64> = self
            .scores
            .iter()
            .map(|s| s.map_or(0.0, |v| v.max(0.0)))
            .collect();
        let top = weights.iter().copied().fold(0.0, f64::max);
        if top > 0.0 {
            for w in weights.iter_mut() {
                *w /= top;
            }
            return roulette_wheel(&weights, &mut self.rng).map(Some);
        }
        Ok(Some(scored[self.rng.random_range(0..scored.len())]))
    }

    /// Lowest-scoring member; ties go to the lower slot.
    fn worst_member(&self) -> Option<usize> {
        self.scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|v| (i, v)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(i, _)| i)
    }

    fn min_live_score(&self) -> Option<f64> {
        self.scores.iter().flatten().copied().reduce(f64::min)
    }

    /// Forget everything learned: member models, surrogate, window, counters and
    /// the best index. Membership and parameter values are kept.
    pub fn reset_learning(&mut self) {
        for cfg in self.ensemble.iter_mut() {
            cfg.reset_learning();
        }
        self.surrogate.reset();
        self.window.clear();
        self.scores = vec![None; self.ensemble.len()];
        self.points_seen = 0;
        self.since_cycle = 0;
        self.cycles = 0;
        self.best = None;
        self.state = OptimizerState::Idle;
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn evaluator(&self) -> &Evaluator<M> {
        &self.evaluator
    }

    pub fn surrogate(&self) -> &Surrogate<R> {
        &self.surrogate
    }

    pub fn ensemble(&self) -> &[Configuration<F::Clusterer>] {
        &self.ensemble
    }

    /// Live score table, aligned with [`EnsembleOptimizer::ensemble`].
    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn state(&self) -> OptimizerState {
        self.state
    }

    pub fn points_seen(&self) -> u64 {
        self.points_seen
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Width every parameter vector is padded to.
    pub fn vector_width(&self) -> usize {
        self.vector_width
    }

    /// Slot of the best member as of the last cycle that scored anything.
    ///
    /// If that slot was overwritten during the same cycle's proposals, this is the
    /// runner-up among the members measured in that cycle.
    pub fn best_index(&self) -> Option<usize> {
        self.best
    }

    pub fn best_configuration(&self) -> Option<&Configuration<F::Clusterer>> {
        self.best.and_then(|i| self.ensemble.get(i))
    }

    /// Current clustering of the best member.
    pub fn best_clustering(&self) -> Option<<F::Clusterer as Clusterer>::Clustering> {
        self.best_configuration().and_then(|c| c.clustering())
    }
}

/// `e` followed by each of its sources, `: `-separated.
fn error_chain(e: &Error) -> String {
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

/// Highest measured score among slots not in `excluded`; ties go to the lower slot.
fn runner_up(measured: &[Option<f64>], excluded: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, s) in measured.iter().enumerate() {
        let Some(v) = *s else { continue };
        if excluded.contains(&i) {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}
