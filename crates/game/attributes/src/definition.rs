//! Attribute definitions - identity and numeric bounds.
//!
//! A definition names one kind of measurable quantity (strength, base
//! defense, final attack speed). Equality and hashing use the identifier
//! only, so any two instances carrying the same [`DefinitionId`] are
//! interchangeable for lookup.

use core::fmt;
use core::hash::{Hash, Hasher};

/// Unique identifier of an attribute definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DefinitionId(pub u32);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inclusive numeric bounds applied when a value is read.
///
/// Either side may be absent. Clamping leaves NaN untouched so tuning errors
/// stay visible instead of collapsing onto a bound.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl Bounds {
    /// No bounds (unclamped)
    pub const UNBOUNDED: Self = Self {
        minimum: None,
        maximum: None,
    };

    pub const fn new(minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self { minimum, maximum }
    }

    /// Returns true when neither side is set.
    pub const fn is_unbounded(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none()
    }

    /// Returns true when both sides are set and the minimum exceeds the maximum.
    pub fn is_reversed(&self) -> bool {
        matches!((self.minimum, self.maximum), (Some(min), Some(max)) if min > max)
    }

    /// Restrict `value` to `[minimum, maximum]`.
    pub fn clamp(&self, value: f64) -> f64 {
        let mut clamped = value;
        if let Some(min) = self.minimum {
            if clamped < min {
                clamped = min;
            }
        }
        if let Some(max) = self.maximum {
            if clamped > max {
                clamped = max;
            }
        }
        clamped
    }
}

/// Identity and metadata for one kind of game quantity.
///
/// Only [`id`](Self::id) takes part in equality and hashing. The bounds
/// recorded on the instance an [`AttributeSystem`] stores at registration
/// are the ones applied on every read, whatever instance the caller later
/// passes in.
///
/// [`AttributeSystem`]: crate::AttributeSystem
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bounds: Bounds,
}

impl AttributeDefinition {
    /// Create an unbounded definition.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: DefinitionId(id),
            name: name.into(),
            description: String::new(),
            bounds: Bounds::UNBOUNDED,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.bounds.minimum = Some(minimum);
        self
    }

    #[must_use]
    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.bounds.maximum = Some(maximum);
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn minimum_value(&self) -> Option<f64> {
        self.bounds.minimum
    }

    pub fn maximum_value(&self) -> Option<f64> {
        self.bounds.maximum
    }

    /// Clamp `value` to this instance's bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        self.bounds.clamp(value)
    }
}

impl PartialEq for AttributeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AttributeDefinition {}

impl Hash for AttributeDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
