//! Error type shared by every fallible operation in the crate.
//!
//! Configuration-time problems (unknown parameter types, malformed domains, bad
//! settings) and logic errors (sampling from an empty wheel) are all surfaced as
//! [`Error`]. Recoverable runtime conditions, such as a surrogate that cannot
//! predict yet, are not errors: they show up as `None` / [`crate::ProposalOutcome`].

/// Boxed error returned by an algorithm-construction collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by `streamtune`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter declaration carried a type tag that is not one of the five kinds.
    #[error(
        "unknown parameter type '{kind}' for parameter '{parameter}'; \
         available options are 'numeric', 'integer', 'categorical' (or 'nominal'), 'boolean' and 'ordinal'"
    )]
    UnknownParameterType { parameter: String, kind: String },

    /// A parameter declaration had a malformed domain or an initial value outside it.
    #[error("invalid declaration for parameter '{parameter}': {reason}")]
    InvalidDeclaration { parameter: String, reason: String },

    /// Roulette-wheel sampling was asked to pick from no weights at all.
    #[error("cannot sample from an empty weight set")]
    EmptyWeights,

    /// A roulette-wheel weight was negative or not finite.
    #[error("invalid weight {weight} at index {index}; weights must be finite and non-negative")]
    InvalidWeights { index: usize, weight: f64 },

    /// Every roulette-wheel weight was zero.
    #[error("cannot sample from a weight set whose total is zero")]
    ZeroTotalWeight,

    /// Optimizer settings violate a structural bound.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The algorithm-construction collaborator could not build an instance.
    #[error("failed to materialize algorithm '{algorithm}'")]
    Materialize {
        algorithm: String,
        #[source]
        source: BoxError,
    },

    /// The settings file could not be read.
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),

    /// The settings file was not valid JSON for the settings contract.
    #[cfg(feature = "serde")]
    #[error("malformed settings file")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_declaration(parameter: &str, reason: impl Into<String>) -> Self {
        Error::InvalidDeclaration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
