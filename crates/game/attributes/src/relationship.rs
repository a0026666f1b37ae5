//! Relationships - declarative formulas tying a target to live inputs.
//!
//! `target += combinator(Σ inputs, operand)`
//!
//! A relationship is a descriptor only. The [`AttributeSystem`] consumes it
//! once and materializes a relationship node in its arena, attached as one
//! contribution of the target's composable attribute. The operand is either
//! a fixed number or another attribute read live on every evaluation.
//!
//! [`AttributeSystem`]: crate::AttributeSystem

use crate::definition::AttributeDefinition;
use crate::element::ContributionKind;

/// Operator merging the input sum with the operand.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Combinator {
    Add,
    #[default]
    Multiply,
    Exponentiate,
}

impl Combinator {
    /// Apply the operator. Non-real results (negative base with a
    /// fractional exponent) come back as NaN.
    pub fn apply(self, input_sum: f64, operand: f64) -> f64 {
        match self {
            Combinator::Add => input_sum + operand,
            Combinator::Multiply => input_sum * operand,
            Combinator::Exponentiate => input_sum.powf(operand),
        }
    }
}

/// Right-hand side of a relationship.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationshipOperand {
    Fixed(f64),
    /// Resolved live through the system on every evaluation
    Attribute(AttributeDefinition),
}

impl From<f64> for RelationshipOperand {
    fn from(value: f64) -> Self {
        RelationshipOperand::Fixed(value)
    }
}

impl From<AttributeDefinition> for RelationshipOperand {
    fn from(definition: AttributeDefinition) -> Self {
        RelationshipOperand::Attribute(definition)
    }
}

/// Declarative descriptor: `target += combinator(Σ inputs, operand)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeRelationship {
    pub target: AttributeDefinition,
    pub inputs: Vec<AttributeDefinition>,
    pub operand: RelationshipOperand,
    #[cfg_attr(feature = "serde", serde(default))]
    pub combinator: Combinator,
    /// How the computed value contributes to the target
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: ContributionKind,
}

impl AttributeRelationship {
    pub fn new(
        target: AttributeDefinition,
        inputs: Vec<AttributeDefinition>,
        operand: impl Into<RelationshipOperand>,
        combinator: Combinator,
    ) -> Self {
        Self {
            target,
            inputs,
            operand: operand.into(),
            combinator,
            kind: ContributionKind::RawAdditive,
        }
    }

    /// `target += factor × input`, the common "base × bonus factor" form.
    pub fn scaling(
        target: AttributeDefinition,
        input: AttributeDefinition,
        factor: impl Into<RelationshipOperand>,
    ) -> Self {
        Self::new(target, vec![input], factor, Combinator::Multiply)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ContributionKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }
}

/// Evaluate a relationship from resolved input values and operand value.
pub fn evaluate(
    inputs: impl IntoIterator<Item = f64>,
    operand: f64,
    combinator: Combinator,
) -> f64 {
    let input_sum: f64 = inputs.into_iter().sum();
    combinator.apply(input_sum, operand)
}
