//! Attribute schema labelling the slots of a parameter vector.
//!
//! A schema is derived once from a configuration's parameters and then shared
//! read-only (behind an `Arc`) by every duplicate of that configuration. It is
//! never copied per duplicate and has no mutating API.

use std::sync::Arc;

use crate::Parameter;

/// How a parameter-vector slot should be read by a regressor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeKind {
    /// A real number (numeric, integer and ordinal parameters).
    Numeric,
    /// An index into the listed values (categorical and boolean parameters).
    Nominal(Vec<String>),
}

/// One labelled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

/// Ordered attribute list, one entry per parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSchema {
    attributes: Vec<Attribute>,
}

impl AttributeSchema {
    /// Derive a schema from parameters in declaration order.
    pub fn from_parameters(parameters: &[Parameter]) -> Arc<Self> {
        Arc::new(Self {
            attributes: parameters.iter().map(Parameter::attribute).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Slot index of the attribute called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }
}
