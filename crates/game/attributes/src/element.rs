//! Leaf values and inline contribution elements.
//!
//! Leaves ([`StatValue`], [`ConstantValue`]) are handed to the
//! [`AttributeSystem`] by the owning entity at setup. [`Element`]s are
//! definition-less contributions injected into a derived attribute at
//! runtime (temporary buffs, item rolls).
//!
//! [`AttributeSystem`]: crate::AttributeSystem

use rand::Rng;

use crate::definition::AttributeDefinition;

/// How a contribution participates in aggregation.
///
/// `value = (Σ RawAdditive) × (Π Multiplicative) + (Σ FinalAdditive)`
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
pub enum ContributionKind {
    /// Summed before multipliers apply
    #[default]
    RawAdditive,
    /// Multiplies the raw sum
    Multiplicative,
    /// Added after multipliers apply
    FinalAdditive,
}

/// A freely settable leaf stat (strength, skill level, ...).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatValue {
    pub definition: AttributeDefinition,
    pub value: f64,
}

impl StatValue {
    pub fn new(definition: AttributeDefinition, value: f64) -> Self {
        Self { definition, value }
    }
}

/// An immutable leaf literal tied to a definition.
///
/// Always contributes as [`ContributionKind::RawAdditive`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantValue {
    pub definition: AttributeDefinition,
    pub value: f64,
}

impl ConstantValue {
    pub fn new(definition: AttributeDefinition, value: f64) -> Self {
        Self { definition, value }
    }
}

/// A value sampled once, uniformly in `[minimum, maximum]`, and kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomElement {
    minimum: f64,
    maximum: f64,
    value: f64,
}

impl RandomElement {
    /// Sample from `rng`.
    ///
    /// Reversed bounds are swapped. Non-finite bounds, or a span too wide
    /// to represent, yield NaN.
    pub fn sample<R: Rng>(minimum: f64, maximum: f64, rng: &mut R) -> Self {
        let (low, high) = if minimum <= maximum {
            (minimum, maximum)
        } else {
            (maximum, minimum)
        };
        let span = high - low;
        let value = if span.is_finite() {
            // Unit draw: any finite span stays representable.
            let t: f64 = rng.gen_range(0.0..=1.0);
            (low + t * span).clamp(low, high)
        } else {
            f64::NAN
        };
        Self {
            minimum: low,
            maximum: high,
            value,
        }
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A definition-less contribution to a derived attribute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Element {
    /// Fixed literal, always raw-additive.
    Constant(f64),

    /// Settable value with a settable contribution kind.
    Simple { value: f64, kind: ContributionKind },

    /// Sampled once on construction, always raw-additive.
    Random(RandomElement),
}

impl Element {
    pub fn constant(value: f64) -> Self {
        Element::Constant(value)
    }

    /// Raw-additive simple element.
    pub fn simple(value: f64) -> Self {
        Element::Simple {
            value,
            kind: ContributionKind::RawAdditive,
        }
    }

    pub fn multiplicative(value: f64) -> Self {
        Element::Simple {
            value,
            kind: ContributionKind::Multiplicative,
        }
    }

    pub fn final_additive(value: f64) -> Self {
        Element::Simple {
            value,
            kind: ContributionKind::FinalAdditive,
        }
    }

    /// Random element sampled from the thread-local generator.
    pub fn random(minimum: f64, maximum: f64) -> Self {
        Self::random_with(minimum, maximum, &mut rand::thread_rng())
    }

    pub fn random_with<R: Rng>(minimum: f64, maximum: f64, rng: &mut R) -> Self {
        Element::Random(RandomElement::sample(minimum, maximum, rng))
    }

    pub fn value(&self) -> f64 {
        match self {
            Element::Constant(value) | Element::Simple { value, .. } => *value,
            Element::Random(random) => random.value(),
        }
    }

    pub fn kind(&self) -> ContributionKind {
        match self {
            Element::Simple { kind, .. } => *kind,
            Element::Constant(_) | Element::Random(_) => ContributionKind::RawAdditive,
        }
    }
}
