//! A candidate configuration: algorithm identifier, parameters, live instance.
//!
//! The owned instance always reflects the current parameter values. Any change
//! to the parameters is followed either by an in-place option update on the live
//! instance or by a full rebuild through the [`ClustererFactory`].

use rand::Rng;
use std::sync::Arc;

use crate::parameter::Adaptation;
use crate::schema::AttributeSchema;
use crate::{Clusterer, ClustererFactory, CommandToken, Error, Parameter, ParameterDeclaration, Result};

/// Declaration of one initial configuration (the settings-file shape).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmDeclaration {
    pub algorithm: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parameters: Vec<ParameterDeclaration>,
}

impl AlgorithmDeclaration {
    pub fn new(algorithm: impl Into<String>, parameters: Vec<ParameterDeclaration>) -> Self {
        Self {
            algorithm: algorithm.into(),
            parameters,
        }
    }
}

/// Which branch [`Configuration::sample_new_config`] took to apply new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdatePath {
    /// Options were set on the live instance, which kept its learned state.
    InPlace,
    /// The instance was rebuilt from scratch.
    Reinitialized,
}

/// One candidate: identifier, ordered parameters and the instance they configure.
#[derive(Debug, Clone)]
pub struct Configuration<C> {
    algorithm: String,
    parameters: Vec<Parameter>,
    schema: Arc<AttributeSchema>,
    clusterer: Option<C>,
}

impl<C: Clusterer> Configuration<C> {
    /// Parse a declaration without building an instance.
    pub fn new(decl: &AlgorithmDeclaration) -> Result<Self> {
        if decl.algorithm.trim().is_empty() {
            return Err(Error::InvalidSettings(
                "algorithm identifier must not be empty".to_string(),
            ));
        }
        let mut parameters: Vec<Parameter> = Vec::with_capacity(decl.parameters.len());
        for p in &decl.parameters {
            let param = Parameter::from_declaration(p)?;
            if parameters.iter().any(|q| q.name() == param.name()) {
                return Err(Error::invalid_declaration(
                    param.name(),
                    format!("declared twice for algorithm '{}'", decl.algorithm),
                ));
            }
            parameters.push(param);
        }
        let schema = AttributeSchema::from_parameters(&parameters);
        Ok(Self {
            algorithm: decl.algorithm.clone(),
            parameters,
            schema,
            clusterer: None,
        })
    }

    /// Parse a declaration and build its instance.
    pub fn from_declaration<F>(decl: &AlgorithmDeclaration, factory: &F) -> Result<Self>
    where
        F: ClustererFactory<Clusterer = C>,
    {
        let mut cfg = Self::new(decl)?;
        cfg.materialize(factory)?;
        Ok(cfg)
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of parameters (the parameter-vector width).
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    pub fn clusterer(&self) -> Option<&C> {
        self.clusterer.as_ref()
    }

    pub fn is_materialized(&self) -> bool {
        self.clusterer.is_some()
    }

    /// Rendered tokens in declaration order (`false` booleans are omitted).
    pub fn command_tokens(&self) -> Vec<CommandToken> {
        self.parameters
            .iter()
            .filter_map(Parameter::command_token)
            .collect()
    }

    /// `algorithm -a 1 -b x -flag`, as handed to the factory.
    pub fn command_line(&self) -> String {
        let mut line = self.algorithm.clone();
        for token in self.command_tokens() {
            line.push(' ');
            line.push_str(&token.to_string());
        }
        line
    }

    /// Build a fresh instance from the current parameter values, replacing any
    /// previously owned one.
    pub fn materialize<F>(&mut self, factory: &F) -> Result<()>
    where
        F: ClustererFactory<Clusterer = C>,
    {
        let tokens = self.command_tokens();
        let clusterer = factory
            .build(&self.algorithm, &tokens)
            .map_err(|e| Error::Materialize {
                algorithm: self.algorithm.clone(),
                source: Box::new(e),
            })?;
        self.clusterer = Some(clusterer);
        Ok(())
    }

    /// Deep-copy the configuration.
    ///
    /// Parameters (values and adaptation state) are copied; the schema is shared.
    /// With `preserve_model` the trained instance is cloned so training continues
    /// from the learned state; otherwise the copy has no instance until
    /// [`Configuration::materialize`] or [`Configuration::sample_new_config`] runs.
    pub fn duplicate(&self, preserve_model: bool) -> Self {
        Self {
            algorithm: self.algorithm.clone(),
            parameters: self.parameters.clone(),
            schema: Arc::clone(&self.schema),
            clusterer: if preserve_model {
                self.clusterer.clone()
            } else {
                None
            },
        }
    }

    /// Resample every parameter and bring the instance in line with the new values.
    ///
    /// Spreads contract by `shrink_factor^(1 / len())`. With `keep_current_model`,
    /// a live instance that supports in-place updates gets its options set and its
    /// caches adjusted; in every other case (including a refused adjustment) the
    /// instance is rebuilt.
    pub fn sample_new_config<F, R>(
        &mut self,
        shrink_factor: f64,
        learning_rate: f64,
        keep_current_model: bool,
        factory: &F,
        rng: &mut R,
    ) -> Result<UpdatePath>
    where
        F: ClustererFactory<Clusterer = C>,
        R: Rng + ?Sized,
    {
        let adaptation = Adaptation::new(shrink_factor, self.parameters.len())
            .with_learning_rate(learning_rate);
        for p in self.parameters.iter_mut() {
            p.resample(adaptation, rng)?;
        }
        if keep_current_model && self.try_update_in_place() {
            return Ok(UpdatePath::InPlace);
        }
        self.materialize(factory)?;
        Ok(UpdatePath::Reinitialized)
    }

    /// Push current values into the live instance. `false` means the caller must
    /// rebuild: no instance, no in-place support, a refused option, or caches that
    /// could not be adjusted.
    fn try_update_in_place(&mut self) -> bool {
        let Some(clusterer) = self.clusterer.as_mut() else {
            return false;
        };
        if !clusterer.supports_in_place_update() {
            return false;
        }
        for p in &self.parameters {
            if !clusterer.try_set_option(p.name(), &p.command_value()) {
                return false;
            }
        }
        clusterer.adjust_internal_caches()
    }

    /// Parameter values in declaration order; finite kinds contribute their index.
    pub fn parameter_vector(&self) -> Vec<f64> {
        self.parameters.iter().map(Parameter::scalar).collect()
    }

    /// [`Configuration::parameter_vector`] zero-padded (or truncated) to `width`.
    pub fn padded_parameter_vector(&self, width: usize) -> Vec<f64> {
        let mut v = self.parameter_vector();
        v.resize(width, 0.0);
        v
    }

    pub fn train_on_point(&mut self, point: &[f64]) {
        if let Some(c) = self.clusterer.as_mut() {
            c.train_on_point(point);
        }
    }

    pub fn clustering(&self) -> Option<C::Clustering> {
        self.clusterer.as_ref().and_then(|c| c.clustering())
    }

    pub fn reset_learning(&mut self) {
        if let Some(c) = self.clusterer.as_mut() {
            c.reset_learning();
        }
    }
}
