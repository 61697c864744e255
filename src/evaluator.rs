//! Per-cycle scoring of the live ensemble against the window.

use tracing::{debug, trace};

use crate::{Clusterer, Configuration, QualityMetric, Window};

/// Score of one ensemble member in one cycle, with the vector it was scored under.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationRecord {
    /// Ensemble slot of the member.
    pub slot: usize,
    pub parameter_vector: Vec<f64>,
    pub score: f64,
}

/// Outcome of scoring every member once.
///
/// `scores` is aligned with ensemble order; `None` marks a member that produced
/// no clustering (or a non-finite score) and is absent from this cycle's ranking.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    scores: Vec<Option<f64>>,
    records: Vec<EvaluationRecord>,
    best: Option<usize>,
}

impl Evaluation {
    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }

    /// Scored members only, in ensemble order.
    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Slot with the highest score; ties go to the lower slot.
    pub fn best(&self) -> Option<usize> {
        self.best
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.and_then(|i| self.scores[i])
    }

    /// Lowest score among scored members.
    pub fn min_score(&self) -> Option<f64> {
        self.scores.iter().flatten().copied().reduce(f64::min)
    }

    pub fn scored_count(&self) -> usize {
        self.records.len()
    }

    pub fn into_scores(self) -> Vec<Option<f64>> {
        self.scores
    }
}

/// Applies a [`QualityMetric`] to every ensemble member.
#[derive(Debug, Clone)]
pub struct Evaluator<M> {
    metric: M,
}

impl<M> Evaluator<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn metric_mut(&mut self) -> &mut M {
        &mut self.metric
    }

    /// Score every member against `window`.
    ///
    /// Parameter vectors in the records are zero-padded to `vector_width`.
    pub fn evaluate<C>(
        &mut self,
        ensemble: &[Configuration<C>],
        window: &Window,
        vector_width: usize,
    ) -> Evaluation
    where
        C: Clusterer,
        M: QualityMetric<C::Clustering>,
    {
        let mut out = Evaluation {
            scores: Vec::with_capacity(ensemble.len()),
            records: Vec::with_capacity(ensemble.len()),
            best: None,
        };
        let mut best_score = f64::NEG_INFINITY;

        for (slot, cfg) in ensemble.iter().enumerate() {
            let Some(clustering) = cfg.clustering() else {
                trace!(slot, algorithm = cfg.algorithm(), "no clustering yet");
                out.scores.push(None);
                continue;
            };
            let score = self.metric.score(&clustering, window);
            if !score.is_finite() {
                debug!(slot, score, command = %cfg.command_line(), "unscorable clustering");
                out.scores.push(None);
                continue;
            }
            debug!(slot, score, command = %cfg.command_line(), "scored configuration");

            if out.best.is_none() || score > best_score {
                best_score = score;
                out.best = Some(slot);
            }
            out.scores.push(Some(score));
            out.records.push(EvaluationRecord {
                slot,
                parameter_vector: cfg.padded_parameter_vector(vector_width),
                score,
            });
        }
        out
    }
}
