//! Tunable parameters: one sum type over the five parameter kinds.
//!
//! A [`Parameter`] carries its current value, its legal domain, and its
//! adaptation state:
//!
//! - numeric / integer / ordinal: a spread `std` for truncated-normal resampling
//!   around the current value. The spread contracts on every resample.
//! - categorical / boolean: a probability vector over the domain. Resampling spins
//!   a roulette wheel over it and then reinforces the value that came up.
//!
//! Parameters are built from [`ParameterDeclaration`]s (the settings-file shape)
//! and rendered to [`CommandToken`]s for the algorithm-construction collaborator.

use rand::Rng;
use rand_distr::Distribution;
use std::fmt;

use crate::sampling::{roulette_wheel, TruncatedNormal};
use crate::schema::{Attribute, AttributeKind};
use crate::{Error, Result};

/// Default reinforcement rate for categorical / boolean probability vectors.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// The five parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParameterKind {
    Numeric,
    Integer,
    Categorical,
    Boolean,
    Ordinal,
}

impl ParameterKind {
    /// Parse a declared type tag. `nominal` is accepted as an alias of `categorical`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "numeric" => Some(Self::Numeric),
            "integer" => Some(Self::Integer),
            "categorical" | "nominal" => Some(Self::Categorical),
            "boolean" => Some(Self::Boolean),
            "ordinal" => Some(Self::Ordinal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Categorical => "categorical",
            Self::Boolean => "boolean",
            Self::Ordinal => "ordinal",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as written in a declaration (initial value or domain entry).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DeclaredValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl DeclaredValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Number(_) => None,
        }
    }

    /// Render the value the way it is passed to an algorithm.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(x) => x.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for DeclaredValue {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<bool> for DeclaredValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for DeclaredValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Declaration of one tunable parameter.
///
/// `kind` stays a free-form tag so an unrecognized type is reported as
/// [`Error::UnknownParameterType`] when the parameter is built.
///
/// `range` is `[low, high]` for numeric and integer parameters and the full
/// enumerated list of values for categorical ones. Booleans may omit it or give
/// `[false, true]`. Ordinals take either numeric bounds `[low, high]` (the levels
/// are the integers in between) or the ordered list of level labels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterDeclaration {
    pub parameter: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    pub value: DeclaredValue,
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: Vec<DeclaredValue>,
}

impl ParameterDeclaration {
    pub fn new(
        parameter: impl Into<String>,
        kind: impl Into<String>,
        value: impl Into<DeclaredValue>,
        range: Vec<DeclaredValue>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            kind: kind.into(),
            value: value.into(),
            range,
        }
    }

    pub fn numeric(parameter: &str, value: f64, low: f64, high: f64) -> Self {
        Self::new(parameter, "numeric", value, vec![low.into(), high.into()])
    }

    pub fn integer(parameter: &str, value: i64, low: i64, high: i64) -> Self {
        Self::new(
            parameter,
            "integer",
            value as f64,
            vec![(low as f64).into(), (high as f64).into()],
        )
    }

    pub fn categorical(parameter: &str, value: &str, values: &[&str]) -> Self {
        Self::new(
            parameter,
            "categorical",
            value,
            values.iter().map(|v| DeclaredValue::from(*v)).collect(),
        )
    }

    pub fn boolean(parameter: &str, value: bool) -> Self {
        Self::new(parameter, "boolean", value, vec![false.into(), true.into()])
    }

    pub fn ordinal(parameter: &str, value: &str, levels: &[&str]) -> Self {
        Self::new(
            parameter,
            "ordinal",
            value,
            levels.iter().map(|v| DeclaredValue::from(*v)).collect(),
        )
    }

    /// Ordinal over the integer levels `low..=high`.
    pub fn ordinal_range(parameter: &str, value: i64, low: i64, high: i64) -> Self {
        Self::new(
            parameter,
            "ordinal",
            value as f64,
            vec![(low as f64).into(), (high as f64).into()],
        )
    }
}

/// A `-flag value` pair handed to the algorithm-construction collaborator.
///
/// Boolean parameters render as a bare flag (`value == None`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandToken {
    pub flag: String,
    pub value: Option<String>,
}

impl fmt::Display for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "-{} {}", self.flag, v),
            None => write!(f, "-{}", self.flag),
        }
    }
}

/// Knobs applied to every parameter of a configuration during one resample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adaptation {
    /// Multiplicative spread contraction, `1 / new_configurations_per_cycle`.
    pub shrink_factor: f64,
    /// Number of parameters in the owning configuration.
    pub dimensions: usize,
    /// Reinforcement rate for categorical / boolean probability vectors.
    pub learning_rate: f64,
}

impl Adaptation {
    pub fn new(shrink_factor: f64, dimensions: usize) -> Self {
        Self {
            shrink_factor,
            dimensions,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// `shrink_factor^(1 / dimensions)`, or `1.0` when the factor is unusable.
    fn spread_multiplier(&self) -> f64 {
        let factor = if self.shrink_factor.is_finite() && self.shrink_factor > 0.0 {
            self.shrink_factor.min(1.0)
        } else {
            1.0
        };
        factor.powf(1.0 / self.dimensions.max(1) as f64)
    }

    fn rate(&self) -> f64 {
        if self.learning_rate.is_finite() {
            self.learning_rate.clamp(0.0, 1.0)
        } else {
            DEFAULT_LEARNING_RATE
        }
    }
}

/// Real-valued parameter on `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericParameter {
    name: String,
    value: f64,
    low: f64,
    high: f64,
    std: f64,
}

/// Integer-valued parameter on `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegerParameter {
    name: String,
    value: i64,
    low: i64,
    high: i64,
    std: f64,
}

/// Levels of an ordinal parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrdinalLevels {
    /// The integers `low..=high`.
    Range { low: i64, high: i64 },
    /// Named levels, in order.
    Labels(Vec<String>),
}

impl OrdinalLevels {
    pub fn len(&self) -> usize {
        match self {
            Self::Range { low, high } => (high - low) as usize + 1,
            Self::Labels(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rendered level at `index`.
    pub fn level(&self, index: usize) -> String {
        match self {
            Self::Range { low, .. } => (low + index as i64).to_string(),
            Self::Labels(labels) => labels[index].clone(),
        }
    }
}

/// Ordered set of levels; the tuned quantity is the level index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrdinalParameter {
    name: String,
    levels: OrdinalLevels,
    index: usize,
    std: f64,
}

/// Unordered finite set of values with a selection distribution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoricalParameter {
    name: String,
    values: Vec<String>,
    index: usize,
    probabilities: Vec<f64>,
}

/// On/off flag with a selection distribution over `[false, true]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BooleanParameter {
    name: String,
    value: bool,
    probabilities: [f64; 2],
}

/// One tunable knob of a configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parameter {
    Numeric(NumericParameter),
    Integer(IntegerParameter),
    Categorical(CategoricalParameter),
    Boolean(BooleanParameter),
    Ordinal(OrdinalParameter),
}

fn initial_spread(width: f64) -> f64 {
    (width / 2.0).max(f64::MIN_POSITIVE)
}

fn shrink(std: &mut f64, adaptation: &Adaptation) {
    *std = (*std * adaptation.spread_multiplier()).max(f64::MIN_POSITIVE);
}

fn uniform(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

/// Move probability mass toward `chosen` and renormalize to sum 1.
fn reinforce(probabilities: &mut [f64], chosen: usize, rate: f64) {
    for p in probabilities.iter_mut() {
        *p *= 1.0 - rate;
    }
    probabilities[chosen] += rate;
    let total: f64 = probabilities.iter().sum();
    if total > 0.0 && total.is_finite() {
        for p in probabilities.iter_mut() {
            *p /= total;
        }
    } else {
        let n = probabilities.len() as f64;
        for p in probabilities.iter_mut() {
            *p = 1.0 / n;
        }
    }
}

fn bounds(decl: &ParameterDeclaration) -> Result<(f64, f64)> {
    let [low, high] = decl.range.as_slice() else {
        return Err(Error::invalid_declaration(
            &decl.parameter,
            format!("expected a [low, high] range, got {} entries", decl.range.len()),
        ));
    };
    let (Some(low), Some(high)) = (low.as_f64(), high.as_f64()) else {
        return Err(Error::invalid_declaration(&decl.parameter, "range bounds must be numbers"));
    };
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(Error::invalid_declaration(
            &decl.parameter,
            format!("range [{low}, {high}] is not a finite interval"),
        ));
    }
    Ok((low, high))
}

fn levels(decl: &ParameterDeclaration) -> Result<Vec<String>> {
    if decl.range.is_empty() {
        return Err(Error::invalid_declaration(&decl.parameter, "range must list at least one value"));
    }
    let out: Vec<String> = decl.range.iter().map(DeclaredValue::render).collect();
    for (i, v) in out.iter().enumerate() {
        if out[..i].contains(v) {
            return Err(Error::invalid_declaration(
                &decl.parameter,
                format!("value '{v}' is listed twice"),
            ));
        }
    }
    Ok(out)
}

/// Numeric ordinal bounds: the value and both range entries are numbers.
fn ordinal_bounds(decl: &ParameterDeclaration) -> Result<Option<(i64, i64, i64)>> {
    let numeric = matches!(
        decl.range.as_slice(),
        [DeclaredValue::Number(_), DeclaredValue::Number(_)]
    );
    let DeclaredValue::Number(value) = decl.value else {
        return Ok(None);
    };
    if !numeric {
        return Ok(None);
    }
    let (low, high) = bounds(decl)?;
    if high - low > u32::MAX as f64 {
        return Err(Error::invalid_declaration(
            &decl.parameter,
            format!("ordinal range [{low}, {high}] has too many levels"),
        ));
    }
    if low.fract() != 0.0 || high.fract() != 0.0 || value.fract() != 0.0 {
        return Err(Error::invalid_declaration(
            &decl.parameter,
            "ordinal value and bounds must be whole numbers",
        ));
    }
    if value < low || value > high {
        return Err(Error::invalid_declaration(
            &decl.parameter,
            format!("initial value {value} outside [{low}, {high}]"),
        ));
    }
    Ok(Some((value as i64, low as i64, high as i64)))
}

fn position(decl: &ParameterDeclaration, domain: &[String]) -> Result<usize> {
    let rendered = decl.value.render();
    domain.iter().position(|v| *v == rendered).ok_or_else(|| {
        Error::invalid_declaration(
            &decl.parameter,
            format!("initial value '{rendered}' is not one of {domain:?}"),
        )
    })
}

impl Parameter {
    /// Build a parameter from its declaration.
    ///
    /// Fails with [`Error::UnknownParameterType`] for an unrecognized type tag and
    /// with [`Error::InvalidDeclaration`] when the domain is malformed or the
    /// initial value lies outside it.
    pub fn from_declaration(decl: &ParameterDeclaration) -> Result<Self> {
        let kind = ParameterKind::from_tag(&decl.kind).ok_or_else(|| Error::UnknownParameterType {
            parameter: decl.parameter.clone(),
            kind: decl.kind.clone(),
        })?;
        if decl.parameter.is_empty() {
            return Err(Error::invalid_declaration("", "parameter name must not be empty"));
        }
        let name = decl.parameter.clone();

        match kind {
            ParameterKind::Numeric => {
                let (low, high) = bounds(decl)?;
                let value = decl.value.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
                    Error::invalid_declaration(&name, "numeric value must be a finite number")
                })?;
                if value < low || value > high {
                    return Err(Error::invalid_declaration(
                        &name,
                        format!("initial value {value} outside [{low}, {high}]"),
                    ));
                }
                Ok(Self::Numeric(NumericParameter {
                    name,
                    value,
                    low,
                    high,
                    std: initial_spread(high - low),
                }))
            }
            ParameterKind::Integer => {
                let (low, high) = bounds(decl)?;
                let value = decl.value.as_f64().ok_or_else(|| {
                    Error::invalid_declaration(&name, "integer value must be a number")
                })?;
                if low.fract() != 0.0 || high.fract() != 0.0 || value.fract() != 0.0 {
                    return Err(Error::invalid_declaration(
                        &name,
                        "integer value and range must be whole numbers",
                    ));
                }
                if value < low || value > high {
                    return Err(Error::invalid_declaration(
                        &name,
                        format!("initial value {value} outside [{low}, {high}]"),
                    ));
                }
                Ok(Self::Integer(IntegerParameter {
                    name,
                    value: value as i64,
                    low: low as i64,
                    high: high as i64,
                    std: initial_spread(high - low),
                }))
            }
            ParameterKind::Ordinal => {
                let (levels, index) = match ordinal_bounds(decl)? {
                    Some((value, low, high)) => {
                        (OrdinalLevels::Range { low, high }, (value - low) as usize)
                    }
                    None => {
                        let labels = levels(decl)?;
                        let index = position(decl, &labels)?;
                        (OrdinalLevels::Labels(labels), index)
                    }
                };
                let std = initial_spread((levels.len() - 1) as f64);
                Ok(Self::Ordinal(OrdinalParameter {
                    name,
                    levels,
                    index,
                    std,
                }))
            }
            ParameterKind::Categorical => {
                let values = levels(decl)?;
                let index = position(decl, &values)?;
                let probabilities = uniform(values.len());
                Ok(Self::Categorical(CategoricalParameter {
                    name,
                    values,
                    index,
                    probabilities,
                }))
            }
            ParameterKind::Boolean => {
                let value = decl.value.as_bool().ok_or_else(|| {
                    Error::invalid_declaration(&name, "boolean value must be true or false")
                })?;
                let domain: Vec<Option<bool>> = decl.range.iter().map(DeclaredValue::as_bool).collect();
                if !domain.is_empty() && domain != [Some(false), Some(true)] {
                    return Err(Error::invalid_declaration(
                        &name,
                        "boolean range must be omitted or [false, true]",
                    ));
                }
                Ok(Self::Boolean(BooleanParameter {
                    name,
                    value,
                    probabilities: [0.5, 0.5],
                }))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Numeric(p) => &p.name,
            Self::Integer(p) => &p.name,
            Self::Categorical(p) => &p.name,
            Self::Boolean(p) => &p.name,
            Self::Ordinal(p) => &p.name,
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Numeric(_) => ParameterKind::Numeric,
            Self::Integer(_) => ParameterKind::Integer,
            Self::Categorical(_) => ParameterKind::Categorical,
            Self::Boolean(_) => ParameterKind::Boolean,
            Self::Ordinal(_) => ParameterKind::Ordinal,
        }
    }

    /// Current sampling spread (numeric, integer and ordinal kinds only).
    pub fn std(&self) -> Option<f64> {
        match self {
            Self::Numeric(p) => Some(p.std),
            Self::Integer(p) => Some(p.std),
            Self::Ordinal(p) => Some(p.std),
            Self::Categorical(_) | Self::Boolean(_) => None,
        }
    }

    /// Current selection distribution (categorical and boolean kinds only).
    pub fn probabilities(&self) -> Option<&[f64]> {
        match self {
            Self::Categorical(p) => Some(&p.probabilities),
            Self::Boolean(p) => Some(&p.probabilities),
            Self::Numeric(_) | Self::Integer(_) | Self::Ordinal(_) => None,
        }
    }

    /// Closed numeric domain of the tuned scalar: `[low, high]`, or the index range
    /// `[0, n - 1]` for the finite kinds.
    pub fn scalar_domain(&self) -> (f64, f64) {
        match self {
            Self::Numeric(p) => (p.low, p.high),
            Self::Integer(p) => (p.low as f64, p.high as f64),
            Self::Ordinal(p) => (0.0, (p.levels.len() - 1) as f64),
            Self::Categorical(p) => (0.0, (p.values.len() - 1) as f64),
            Self::Boolean(_) => (0.0, 1.0),
        }
    }

    /// Current value as a number.
    ///
    /// Finite kinds contribute their selected index (booleans: `0` / `1`), not the
    /// symbolic value.
    pub fn scalar(&self) -> f64 {
        match self {
            Self::Numeric(p) => p.value,
            Self::Integer(p) => p.value as f64,
            Self::Ordinal(p) => p.index as f64,
            Self::Categorical(p) => p.index as f64,
            Self::Boolean(p) => {
                if p.value {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Current value rendered as an option value string.
    pub fn command_value(&self) -> String {
        match self {
            Self::Numeric(p) => p.value.to_string(),
            Self::Integer(p) => p.value.to_string(),
            Self::Ordinal(p) => p.levels.level(p.index),
            Self::Categorical(p) => p.values[p.index].clone(),
            Self::Boolean(p) => p.value.to_string(),
        }
    }

    /// Render as a command token. A `false` boolean renders as nothing.
    pub fn command_token(&self) -> Option<CommandToken> {
        match self {
            Self::Boolean(p) if !p.value => None,
            Self::Boolean(p) => Some(CommandToken {
                flag: p.name.clone(),
                value: None,
            }),
            _ => Some(CommandToken {
                flag: self.name().to_string(),
                value: Some(self.command_value()),
            }),
        }
    }

    /// Schema attribute describing this parameter's slot in a parameter vector.
    pub fn attribute(&self) -> Attribute {
        let kind = match self {
            Self::Numeric(_) | Self::Integer(_) | Self::Ordinal(_) => AttributeKind::Numeric,
            Self::Categorical(p) => AttributeKind::Nominal(p.values.clone()),
            Self::Boolean(_) => AttributeKind::Nominal(vec!["false".to_string(), "true".to_string()]),
        };
        Attribute {
            name: self.name().to_string(),
            kind,
        }
    }

    /// Draw a new current value and update the adaptation state.
    ///
    /// - numeric / integer / ordinal: truncated-normal draw around the current value
    ///   (integers and ordinal indices rounded), then
    ///   `std <- std * shrink_factor^(1 / dimensions)`.
    /// - categorical / boolean: roulette-wheel draw over the probabilities, then
    ///   every entry is scaled by `1 - rate`, `rate` is added to the drawn entry and
    ///   the vector is renormalized.
    pub fn resample<R: Rng + ?Sized>(&mut self, adaptation: Adaptation, rng: &mut R) -> Result<()> {
        match self {
            Self::Numeric(p) => {
                let dist = TruncatedNormal::new(p.value, p.std, p.low, p.high)?;
                p.value = dist.sample(rng).clamp(p.low, p.high);
                shrink(&mut p.std, &adaptation);
            }
            Self::Integer(p) => {
                let dist = TruncatedNormal::new(p.value as f64, p.std, p.low as f64, p.high as f64)?;
                p.value = (dist.sample(rng).round() as i64).clamp(p.low, p.high);
                shrink(&mut p.std, &adaptation);
            }
            Self::Ordinal(p) => {
                let top = p.levels.len() - 1;
                let dist = TruncatedNormal::new(p.index as f64, p.std, 0.0, top as f64)?;
                p.index = (dist.sample(rng).round().max(0.0) as usize).min(top);
                shrink(&mut p.std, &adaptation);
            }
            Self::Categorical(p) => {
                let chosen = roulette_wheel(&p.probabilities, rng)?;
                p.index = chosen;
                reinforce(&mut p.probabilities, chosen, adaptation.rate());
            }
            Self::Boolean(p) => {
                let chosen = roulette_wheel(&p.probabilities, rng)?;
                p.value = chosen == 1;
                reinforce(&mut p.probabilities, chosen, adaptation.rate());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(decl: ParameterDeclaration) -> Parameter {
        Parameter::from_declaration(&decl).unwrap()
    }

    fn all_kinds() -> Vec<Parameter> {
        vec![
            build(ParameterDeclaration::numeric("e", 0.08, 0.001, 1.0)),
            build(ParameterDeclaration::integer("k", 5, 2, 20)),
            build(ParameterDeclaration::categorical("m", "b", &["a", "b", "c"])),
            build(ParameterDeclaration::boolean("n", true)),
            build(ParameterDeclaration::ordinal("o", "med", &["low", "med", "high", "max"])),
        ]
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let decl = ParameterDeclaration::new("e", "float", 0.1, vec![0.0.into(), 1.0.into()]);
        match Parameter::from_declaration(&decl) {
            Err(Error::UnknownParameterType { parameter, kind }) => {
                assert_eq!(parameter, "e");
                assert_eq!(kind, "float");
            }
            other => panic!("expected UnknownParameterType, got {other:?}"),
        }
    }

    #[test]
    fn nominal_is_an_alias_for_categorical() {
        let decl = ParameterDeclaration::new("m", "nominal", "x", vec!["x".into(), "y".into()]);
        let p = Parameter::from_declaration(&decl).unwrap();
        assert_eq!(p.kind(), ParameterKind::Categorical);
    }

    #[test]
    fn initial_value_outside_domain_is_rejected() {
        let decl = ParameterDeclaration::numeric("e", 2.0, 0.0, 1.0);
        assert!(matches!(
            Parameter::from_declaration(&decl),
            Err(Error::InvalidDeclaration { .. })
        ));
        let decl = ParameterDeclaration::categorical("m", "z", &["a", "b"]);
        assert!(matches!(
            Parameter::from_declaration(&decl),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn fractional_integer_bounds_are_rejected() {
        let decl = ParameterDeclaration::new("k", "integer", 3.0, vec![1.5.into(), 9.0.into()]);
        assert!(Parameter::from_declaration(&decl).is_err());
    }

    #[test]
    fn numeric_ordinal_bounds_enumerate_integer_levels() {
        let decl = ParameterDeclaration::new("o", "ordinal", 3.0, vec![1.0.into(), 10.0.into()]);
        let mut p = Parameter::from_declaration(&decl).unwrap();
        assert_eq!(p.scalar_domain(), (0.0, 9.0));
        assert_eq!(p.scalar(), 2.0);
        assert_eq!(p.std(), Some(4.5));
        assert_eq!(p.command_token().unwrap().to_string(), "-o 3");

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            p.resample(Adaptation::new(1.0, 1), &mut rng).unwrap();
            let level: i64 = p.command_value().parse().unwrap();
            assert!((1..=10).contains(&level), "level {level}");
            assert_eq!(level - 1, p.scalar() as i64);
        }
    }

    #[test]
    fn labelled_ordinal_keeps_its_level_order() {
        let p = build(ParameterDeclaration::ordinal("o", "mid", &["low", "mid", "high"]));
        assert_eq!(p.scalar_domain(), (0.0, 2.0));
        assert_eq!(p.scalar(), 1.0);
        assert_eq!(p.command_value(), "mid");
    }

    #[test]
    fn numeric_ordinal_rejects_fractions_and_outliers() {
        let outside = ParameterDeclaration::ordinal_range("o", 12, 1, 10);
        assert!(matches!(
            Parameter::from_declaration(&outside),
            Err(Error::InvalidDeclaration { .. })
        ));
        let fractional = ParameterDeclaration::new("o", "ordinal", 2.0, vec![1.5.into(), 4.0.into()]);
        assert!(matches!(
            Parameter::from_declaration(&fractional),
            Err(Error::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn boolean_range_must_be_false_then_true() {
        let bare = ParameterDeclaration::new("n", "boolean", true, Vec::new());
        assert!(Parameter::from_declaration(&bare).is_ok());
        assert!(Parameter::from_declaration(&ParameterDeclaration::boolean("n", false)).is_ok());

        let reversed = ParameterDeclaration::new("n", "boolean", true, vec![true.into(), false.into()]);
        let words = ParameterDeclaration::new("n", "boolean", true, vec!["yes".into(), "no".into()]);
        let single = ParameterDeclaration::new("n", "boolean", true, vec![true.into()]);
        for decl in [reversed, words, single] {
            assert!(
                matches!(Parameter::from_declaration(&decl), Err(Error::InvalidDeclaration { .. })),
                "{:?} accepted",
                decl.range
            );
        }
    }

    #[test]
    fn initial_spread_is_half_the_domain() {
        let p = build(ParameterDeclaration::numeric("e", 0.5, 0.0, 1.0));
        assert_eq!(p.std(), Some(0.5));
        let p = build(ParameterDeclaration::integer("k", 5, 2, 12));
        assert_eq!(p.std(), Some(5.0));
        let p = build(ParameterDeclaration::ordinal("o", "b", &["a", "b", "c"]));
        assert_eq!(p.std(), Some(1.0));
    }

    #[test]
    fn boolean_renders_bare_flag_only_when_true() {
        let on = build(ParameterDeclaration::boolean("n", true));
        let off = build(ParameterDeclaration::boolean("n", false));
        assert_eq!(on.command_token().unwrap().to_string(), "-n");
        assert!(off.command_token().is_none());
    }

    #[test]
    fn tokens_render_flag_and_value() {
        let p = build(ParameterDeclaration::numeric("e", 0.08, 0.0, 1.0));
        assert_eq!(p.command_token().unwrap().to_string(), "-e 0.08");
        let p = build(ParameterDeclaration::integer("k", 5, 2, 20));
        assert_eq!(p.command_token().unwrap().to_string(), "-k 5");
        let p = build(ParameterDeclaration::ordinal("o", "med", &["low", "med"]));
        assert_eq!(p.command_token().unwrap().to_string(), "-o med");
    }

    #[test]
    fn finite_kinds_contribute_their_index() {
        let p = build(ParameterDeclaration::categorical("m", "c", &["a", "b", "c"]));
        assert_eq!(p.scalar(), 2.0);
        let p = build(ParameterDeclaration::boolean("n", true));
        assert_eq!(p.scalar(), 1.0);
        let p = build(ParameterDeclaration::ordinal("o", "med", &["low", "med", "high"]));
        assert_eq!(p.scalar(), 1.0);
    }

    #[test]
    fn clone_does_not_share_adaptation_state() {
        let mut rng = StdRng::seed_from_u64(0);
        let original = build(ParameterDeclaration::categorical("m", "a", &["a", "b", "c"]));
        let mut copy = original.clone();
        for _ in 0..10 {
            copy.resample(Adaptation::new(0.5, 1), &mut rng).unwrap();
        }
        assert_eq!(original.probabilities().unwrap(), &[1.0 / 3.0; 3]);
        assert_ne!(copy.probabilities(), original.probabilities());
    }

    #[test]
    fn spread_contracts_by_root_of_shrink_factor() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = build(ParameterDeclaration::numeric("e", 0.5, 0.0, 1.0));
        p.resample(Adaptation::new(0.25, 2), &mut rng).unwrap();
        let std = p.std().unwrap();
        assert!((std - 0.25).abs() < 1e-12, "std={std}");
    }

    #[test]
    fn shrink_factor_of_one_keeps_spread() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = build(ParameterDeclaration::integer("k", 5, 0, 10));
        p.resample(Adaptation::new(1.0, 3), &mut rng).unwrap();
        assert_eq!(p.std(), Some(5.0));
    }

    #[test]
    fn repeated_draws_make_a_value_more_likely() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = build(ParameterDeclaration::categorical("m", "a", &["a", "b"]));
        p.resample(Adaptation::new(1.0, 1).with_learning_rate(0.5), &mut rng).unwrap();
        let chosen = p.scalar() as usize;
        let probs = p.probabilities().unwrap();
        assert!((probs[chosen] - 0.75).abs() < 1e-12, "probs={probs:?}");
    }

    proptest! {
        #[test]
        fn resample_stays_in_domain(seed in any::<u64>(), rounds in 1usize..60, shrink in 0.01f64..=1.0) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut params = all_kinds();
            let dims = params.len();
            for _ in 0..rounds {
                for p in params.iter_mut() {
                    p.resample(Adaptation::new(shrink, dims), &mut rng).unwrap();
                    let (low, high) = p.scalar_domain();
                    let x = p.scalar();
                    prop_assert!(x >= low && x <= high, "{}: {} not in [{}, {}]", p.name(), x, low, high);
                    if matches!(p.kind(), ParameterKind::Integer | ParameterKind::Ordinal | ParameterKind::Categorical) {
                        prop_assert_eq!(x.fract(), 0.0);
                    }
                }
            }
        }

        #[test]
        fn spread_strictly_decreases_below_unit_shrink(
            seed in any::<u64>(),
            shrink in 0.05f64..0.95,
            dims in 1usize..8,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            for mut p in all_kinds().into_iter().filter(|p| p.std().is_some()) {
                let mut prev = p.std().unwrap();
                for _ in 0..25 {
                    p.resample(Adaptation::new(shrink, dims), &mut rng).unwrap();
                    let next = p.std().unwrap();
                    prop_assert!(next < prev, "{}: std {} -> {}", p.name(), prev, next);
                    prop_assert!(next > 0.0);
                    prev = next;
                }
            }
        }

        #[test]
        fn probabilities_always_sum_to_one(
            seed in any::<u64>(),
            rounds in 1usize..200,
            rate in 0.0f64..=1.0,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut params: Vec<Parameter> = all_kinds()
                .into_iter()
                .filter(|p| p.probabilities().is_some())
                .collect();
            for _ in 0..rounds {
                for p in params.iter_mut() {
                    p.resample(Adaptation::new(0.5, 2).with_learning_rate(rate), &mut rng).unwrap();
                    let probs = p.probabilities().unwrap();
                    let sum: f64 = probs.iter().sum();
                    prop_assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
                    prop_assert!(probs.iter().all(|&x| (0.0..=1.0 + 1e-12).contains(&x)));
                }
            }
        }
    }
}
