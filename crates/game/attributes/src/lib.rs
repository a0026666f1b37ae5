//! Reactive attribute engine for game entities.
//!
//! `game-attributes` turns an entity's raw values (strength, base defense,
//! skill level, item bonuses, temporary buffs) into the derived values combat
//! reads every tick. Each entity owns one [`AttributeSystem`]; every
//! mutation propagates synchronously to all dependent attributes before the
//! call returns, and reads are clamped by the bounds configured on the
//! definition registered for that identifier.
pub mod composable;
pub mod config;
pub mod definition;
pub mod element;
pub mod error;
pub mod graph;
pub mod relationship;
pub mod system;

pub use config::{AttributeConfig, MultiplierPolicy};
pub use definition::{AttributeDefinition, Bounds, DefinitionId};
pub use element::{ConstantValue, ContributionKind, Element, RandomElement, StatValue};
pub use error::{AttributeError, ErrorSeverity, GameError};
pub use graph::{AttributeId, Listener, ListenerId, ValueChanged};
pub use relationship::{AttributeRelationship, Combinator, RelationshipOperand};
pub use system::{AttributeSnapshot, AttributeSystem};
