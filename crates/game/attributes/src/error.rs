//! Error infrastructure for game-attributes.
//!
//! Every failure the engine can report is structural: a configuration that
//! would leave the graph ambiguous or cyclic, or a handle that does not name
//! what the caller thinks it names. Reads never fail.
//!
//! # Design Principles
//!
//! - **Atomic**: a rejected call leaves the [`AttributeSystem`] untouched
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Stable codes**: each variant carries a static identifier for logs and tests
//!
//! [`AttributeSystem`]: crate::AttributeSystem

use crate::definition::DefinitionId;
use crate::graph::AttributeId;

/// How the owning entity should treat a rejected call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Stale or mismatched handle; the same call with another handle may succeed.
    Recoverable,

    /// Rejected input (duplicate leaf, empty inputs, reversed bounds).
    Validation,

    /// The relationship graph has no evaluation order.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// True when the entity's attribute configuration itself is unusable.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Common trait for errors surfaced to the owning game entity.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Errors raised while building or mutating an [`AttributeSystem`].
///
/// [`AttributeSystem`]: crate::AttributeSystem
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AttributeError {
    /// Two leaves (or a leaf and a derived attribute) claim the same identifier.
    #[error("attribute {0} is already registered")]
    DuplicateDefinition(DefinitionId),

    /// A relationship was declared without any input definition.
    #[error("relationship targeting {target} has no inputs")]
    EmptyRelationshipInputs { target: DefinitionId },

    /// A relationship or element targets a leaf stat/constant instead of a
    /// derived attribute.
    #[error("attribute {target} is a leaf and cannot receive contributions")]
    TargetIsLeaf { target: DefinitionId },

    /// Attaching the relationship would make `target` depend on itself.
    #[error("relationship {input} -> {target} closes a dependency cycle")]
    CyclicRelationship {
        target: DefinitionId,
        input: DefinitionId,
    },

    /// The handle does not name a live attribute.
    #[error("attribute handle {0} does not exist")]
    UnknownAttribute(AttributeId),

    /// The handle names an attribute that is not an injected element.
    #[error("attribute handle {0} is not an injected element")]
    NotAnElement(AttributeId),

    /// The attribute cannot be assigned (constants, derived values, random rolls).
    #[error("attribute {0} is not settable")]
    NotSettable(AttributeId),

    /// No attribute or definition has been registered under the identifier.
    #[error("attribute {0} is not registered")]
    UnknownDefinition(DefinitionId),

    /// Minimum bound is greater than the maximum bound.
    #[error("bounds for {id} are reversed: minimum {minimum} > maximum {maximum}")]
    InvalidBounds {
        id: DefinitionId,
        minimum: f64,
        maximum: f64,
    },
}

impl GameError for AttributeError {
    fn severity(&self) -> ErrorSeverity {
        use AttributeError::*;
        match self {
            // A cycle means no evaluation order exists
            CyclicRelationship { .. } => ErrorSeverity::Fatal,

            DuplicateDefinition(_)
            | EmptyRelationshipInputs { .. }
            | TargetIsLeaf { .. }
            | InvalidBounds { .. } => ErrorSeverity::Validation,

            UnknownAttribute(_) | NotAnElement(_) | NotSettable(_) | UnknownDefinition(_) => {
                ErrorSeverity::Recoverable
            }
        }
    }

    fn error_code(&self) -> &'static str {
        use AttributeError::*;
        match self {
            DuplicateDefinition(_) => "ATTRIBUTE_DUPLICATE_DEFINITION",
            EmptyRelationshipInputs { .. } => "ATTRIBUTE_EMPTY_RELATIONSHIP_INPUTS",
            TargetIsLeaf { .. } => "ATTRIBUTE_TARGET_IS_LEAF",
            CyclicRelationship { .. } => "ATTRIBUTE_CYCLIC_RELATIONSHIP",
            UnknownAttribute(_) => "ATTRIBUTE_UNKNOWN_HANDLE",
            NotAnElement(_) => "ATTRIBUTE_NOT_AN_ELEMENT",
            NotSettable(_) => "ATTRIBUTE_NOT_SETTABLE",
            UnknownDefinition(_) => "ATTRIBUTE_UNKNOWN_DEFINITION",
            InvalidBounds { .. } => "ATTRIBUTE_INVALID_BOUNDS",
        }
    }
}
