//! Collaborator contracts for the clustering algorithms being tuned.
//!
//! The optimizer never looks inside an algorithm. It only needs to build one from
//! an identifier plus rendered [`CommandToken`]s, feed it points, ask it for its
//! current clustering, and clone it (to continue training from learned state).

use crate::CommandToken;

/// A streaming clustering algorithm instance.
///
/// `Clone` must produce an independent copy with the same learned state: feeding
/// the clone and the original the same subsequent points must yield the same
/// clusterings.
pub trait Clusterer: Clone {
    /// Clustering produced by the algorithm, consumed by a [`crate::QualityMetric`].
    type Clustering;

    /// Update the model with one stream point.
    fn train_on_point(&mut self, point: &[f64]);

    /// Current clustering, or `None` if the algorithm has not produced one yet.
    fn clustering(&self) -> Option<Self::Clustering>;

    /// Forget everything learned so far, keeping the current options.
    fn reset_learning(&mut self);

    /// Whether [`Clusterer::try_set_option`] can change options on a live instance.
    ///
    /// When this returns `false`, a parameter change always rebuilds the instance.
    fn supports_in_place_update(&self) -> bool {
        false
    }

    /// Set option `name` to `value` on the live instance. Returns `false` if the
    /// option is unknown or the value was refused.
    fn try_set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }

    /// Reconcile state derived from options after one or more
    /// [`Clusterer::try_set_option`] calls. Returns `false` if the learned state
    /// cannot be carried over to the new options; the caller then rebuilds.
    fn adjust_internal_caches(&mut self) -> bool {
        true
    }
}

/// Builds algorithm instances from an identifier and rendered parameter tokens.
pub trait ClustererFactory {
    type Clusterer: Clusterer;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a fresh, untrained instance of `algorithm` configured by `tokens`.
    fn build(&self, algorithm: &str, tokens: &[CommandToken]) -> Result<Self::Clusterer, Self::Error>;
}
