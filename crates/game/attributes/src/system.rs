//! AttributeSystem - the per-entity orchestrator.
//!
//! Built once from the entity's stat leaves, constant leaves, and
//! relationship descriptors; afterwards it is the single entry point the
//! game logic reads from and mutates through.
//!
//! # Architecture
//!
//! ```text
//! [ Leaves: stats, constants ]
//!      ↓
//! [ Relationship nodes ]  ← operands read live
//!      ↓
//! [ Composable attributes ] ← injected elements (buffs)
//!      ↓
//! [ Further relationships ... ]
//!      ↓
//! [ Clamped read: authoritative definition bounds ]
//! ```
//!
//! ## Principles
//!
//! 1. **Identifier lookup**: definitions are matched by [`DefinitionId`] only
//! 2. **Authoritative bounds**: reads clamp with the definition stored at
//!    registration, never the instance passed to the read
//! 3. **Eager propagation**: every mutation has been applied to the whole
//!    dependent subgraph, listeners included, before it returns
//! 4. **Acyclic**: edges that would close a cycle are rejected up front
//! 5. **Atomic setup**: a rejected call leaves the system unchanged

use std::collections::{BTreeMap, HashMap};

use crate::config::AttributeConfig;
use crate::definition::{AttributeDefinition, Bounds, DefinitionId};
use crate::element::{ConstantValue, ContributionKind, Element, StatValue};
use crate::error::{AttributeError, GameError};
use crate::graph::{AttributeId, Graph, ListenerId, NodeKind, Operand, ValueChanged};
use crate::relationship::{AttributeRelationship, RelationshipOperand};

/// What an identifier is registered as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Registered {
    Stat(AttributeId),
    Constant(AttributeId),
    Derived(AttributeId),
}

impl Registered {
    fn id(self) -> AttributeId {
        match self {
            Registered::Stat(id) | Registered::Constant(id) | Registered::Derived(id) => id,
        }
    }

    fn is_leaf(self) -> bool {
        !matches!(self, Registered::Derived(_))
    }
}

fn rejected(error: AttributeError) -> AttributeError {
    tracing::warn!(code = error.error_code(), "rejected attribute change: {error}");
    error
}

/// Reactive stat graph scoped to one game entity.
///
/// # Example
/// ```
/// # use game_attributes::*;
/// let strength = AttributeDefinition::new(1, "Strength");
/// let attack = AttributeDefinition::new(2, "Attack").with_maximum(500.0);
///
/// let mut system = AttributeSystem::new(
///     [StatValue::new(strength.clone(), 40.0)],
///     [],
///     [AttributeRelationship::scaling(attack.clone(), strength.clone(), 3.0)],
/// )?;
/// assert_eq!(system.get(&attack), 120.0);
///
/// system.set(&strength, 200.0)?;
/// assert_eq!(system.get(&attack), 500.0); // clamped
/// # Ok::<(), AttributeError>(())
/// ```
#[derive(Debug)]
pub struct AttributeSystem {
    config: AttributeConfig,
    graph: Graph,
    /// Authoritative definition per identifier (first registration wins)
    definitions: HashMap<DefinitionId, AttributeDefinition>,
    attributes: HashMap<DefinitionId, Registered>,
    relationships: Vec<AttributeRelationship>,
    /// Injected element → identifier of the attribute it contributes to
    elements: HashMap<AttributeId, DefinitionId>,
}

impl Default for AttributeSystem {
    fn default() -> Self {
        Self::empty(AttributeConfig::default())
    }
}

impl AttributeSystem {
    /// Build a system with the default configuration.
    pub fn new(
        stats: impl IntoIterator<Item = StatValue>,
        constants: impl IntoIterator<Item = ConstantValue>,
        relationships: impl IntoIterator<Item = AttributeRelationship>,
    ) -> Result<Self, AttributeError> {
        Self::with_config(AttributeConfig::default(), stats, constants, relationships)
    }

    /// Build a system from the three setup collections.
    ///
    /// Leaves are indexed first, then each relationship is attached to its
    /// target. Any structural error aborts construction; no partially built
    /// system escapes.
    pub fn with_config(
        config: AttributeConfig,
        stats: impl IntoIterator<Item = StatValue>,
        constants: impl IntoIterator<Item = ConstantValue>,
        relationships: impl IntoIterator<Item = AttributeRelationship>,
    ) -> Result<Self, AttributeError> {
        let mut system = Self::empty(config);
        for stat in stats {
            system.register_stat(stat)?;
        }
        for constant in constants {
            system.register_constant(constant)?;
        }
        for relationship in relationships {
            system.add_relationship(relationship)?;
        }
        tracing::debug!(
            attributes = system.attributes.len(),
            relationships = system.relationships.len(),
            "attribute system built"
        );
        Ok(system)
    }

    /// A system with nothing registered.
    pub fn empty(config: AttributeConfig) -> Self {
        Self {
            config,
            graph: Graph::new(config.multiplier_policy),
            definitions: HashMap::new(),
            attributes: HashMap::new(),
            relationships: Vec::new(),
            elements: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AttributeConfig {
        &self.config
    }

    // ===== registration =====

    /// Publish a definition (and its bounds) without attaching a value.
    ///
    /// Reads of the identifier return `0` clamped to these bounds until a
    /// value is registered or derived.
    pub fn register_definition(
        &mut self,
        definition: AttributeDefinition,
    ) -> Result<(), AttributeError> {
        if self.definitions.contains_key(&definition.id) {
            return Err(rejected(AttributeError::DuplicateDefinition(definition.id)));
        }
        Self::check_bounds(&definition)?;
        self.definitions.insert(definition.id, definition);
        Ok(())
    }

    /// Register a settable leaf stat.
    pub fn register_stat(&mut self, stat: StatValue) -> Result<AttributeId, AttributeError> {
        self.check_leaf(&stat.definition)?;
        let id = self.graph.insert_stat(stat.value);
        tracing::debug!(definition = %stat.definition, value = stat.value, "registered stat");
        self.attributes
            .insert(stat.definition.id, Registered::Stat(id));
        self.remember(&stat.definition);
        Ok(id)
    }

    /// Register an immutable leaf constant.
    pub fn register_constant(
        &mut self,
        constant: ConstantValue,
    ) -> Result<AttributeId, AttributeError> {
        self.check_leaf(&constant.definition)?;
        let id = self.graph.insert_constant(constant.value);
        tracing::debug!(
            definition = %constant.definition,
            value = constant.value,
            "registered constant"
        );
        self.attributes
            .insert(constant.definition.id, Registered::Constant(id));
        self.remember(&constant.definition);
        Ok(id)
    }

    /// Attach a relationship to its target's composable attribute.
    ///
    /// Inputs and operand definitions that have no attribute yet are
    /// materialized as empty derived attributes, so a later relationship or
    /// injected element can feed them. Returns the handle of the new
    /// relationship node.
    pub fn add_relationship(
        &mut self,
        relationship: AttributeRelationship,
    ) -> Result<AttributeId, AttributeError> {
        let target = &relationship.target;
        if relationship.inputs.is_empty() {
            return Err(rejected(AttributeError::EmptyRelationshipInputs {
                target: target.id,
            }));
        }
        let existing_target = match self.attributes.get(&target.id) {
            Some(registered) if registered.is_leaf() => {
                return Err(rejected(AttributeError::TargetIsLeaf { target: target.id }));
            }
            Some(registered) => Some(registered.id()),
            None => None,
        };

        // Validate every new edge before touching the arena
        let operand_definition = match &relationship.operand {
            RelationshipOperand::Attribute(definition) => Some(definition),
            RelationshipOperand::Fixed(_) => None,
        };
        for source in relationship.inputs.iter().chain(operand_definition) {
            let closes_cycle = source.id == target.id
                || match (existing_target, self.attributes.get(&source.id)) {
                    (Some(target_node), Some(registered)) => {
                        self.graph.reaches(target_node, registered.id())
                    }
                    _ => false,
                };
            if closes_cycle {
                return Err(rejected(AttributeError::CyclicRelationship {
                    target: target.id,
                    input: source.id,
                }));
            }
        }

        let target_node = self.materialize(target);
        let inputs: Vec<AttributeId> = relationship
            .inputs
            .iter()
            .map(|input| self.materialize(input))
            .collect();
        let operand = match &relationship.operand {
            RelationshipOperand::Fixed(value) => Operand::Fixed(*value),
            RelationshipOperand::Attribute(definition) => {
                Operand::Attribute(self.materialize(definition))
            }
        };

        let node = self.graph.insert_relationship(
            inputs,
            operand,
            relationship.combinator,
            relationship.kind,
        );
        self.graph.attach(target_node, node);
        tracing::debug!(
            attribute = %relationship.target,
            inputs = relationship.inputs.len(),
            combinator = %relationship.combinator,
            kind = %relationship.kind,
            "attached relationship"
        );
        self.relationships.push(relationship);
        Ok(node)
    }

    /// Inject an ad-hoc contribution (a buff, an item roll) into `target`.
    pub fn add_element(
        &mut self,
        element: Element,
        target: &AttributeDefinition,
    ) -> Result<AttributeId, AttributeError> {
        if let Some(registered) = self.attributes.get(&target.id) {
            if registered.is_leaf() {
                return Err(rejected(AttributeError::TargetIsLeaf { target: target.id }));
            }
        }
        let composable = self.materialize(target);
        let id = self.graph.insert_element(element);
        self.graph.attach(composable, id);
        self.elements.insert(id, target.id);
        tracing::debug!(
            attribute = %target,
            element = %id,
            value = element.value(),
            kind = %element.kind(),
            "injected element"
        );
        Ok(id)
    }

    /// Detach an injected element. Its handle is invalid afterwards.
    pub fn remove_element(&mut self, element: AttributeId) -> Result<Element, AttributeError> {
        let target = self.element_target(element)?;
        let Some(Registered::Derived(composable)) = self.attributes.get(&target).copied() else {
            return Err(rejected(AttributeError::UnknownDefinition(target)));
        };
        let removed = self.graph.detach(composable, element)?;
        self.elements.remove(&element);
        tracing::debug!(attribute = %target, element = %element, "removed element");
        Ok(removed)
    }

    /// Change the value of an injected simple element.
    pub fn set_element_value(
        &mut self,
        element: AttributeId,
        value: f64,
    ) -> Result<(), AttributeError> {
        self.element_target(element)?;
        self.graph.set_value(element, value).map_err(rejected)
    }

    /// Reclassify an injected simple element.
    pub fn set_element_kind(
        &mut self,
        element: AttributeId,
        kind: ContributionKind,
    ) -> Result<(), AttributeError> {
        self.element_target(element)?;
        self.graph.set_contribution(element, kind).map_err(rejected)
    }

    /// Replace the authoritative bounds recorded for `id`.
    pub fn set_bounds(&mut self, id: DefinitionId, bounds: Bounds) -> Result<(), AttributeError> {
        if bounds.is_reversed() {
            return Err(rejected(AttributeError::InvalidBounds {
                id,
                minimum: bounds.minimum.unwrap_or(f64::NEG_INFINITY),
                maximum: bounds.maximum.unwrap_or(f64::INFINITY),
            }));
        }
        let definition = self
            .definitions
            .get_mut(&id)
            .ok_or_else(|| rejected(AttributeError::UnknownDefinition(id)))?;
        definition.bounds = bounds;
        Ok(())
    }

    // ===== reads =====

    /// Clamped value of the attribute registered under `definition`'s id.
    ///
    /// Unknown identifiers read as `0`. Bounds come from the definition
    /// stored at registration; those on `definition` itself are ignored.
    pub fn get(&self, definition: &AttributeDefinition) -> f64 {
        self.get_by_id(definition.id)
    }

    pub fn get_by_id(&self, id: DefinitionId) -> f64 {
        let value = self.raw_by_id(id);
        match self.definitions.get(&id) {
            Some(authoritative) => authoritative.clamp(value),
            None => value,
        }
    }

    /// Unclamped value.
    pub fn raw(&self, definition: &AttributeDefinition) -> f64 {
        self.raw_by_id(definition.id)
    }

    fn raw_by_id(&self, id: DefinitionId) -> f64 {
        self.attributes
            .get(&id)
            .and_then(|registered| self.graph.value(registered.id()))
            .unwrap_or(0.0)
    }

    /// Assign a leaf stat.
    ///
    /// Listeners fire only if the value actually changes.
    pub fn set(
        &mut self,
        definition: &AttributeDefinition,
        value: f64,
    ) -> Result<(), AttributeError> {
        match self.attributes.get(&definition.id).copied() {
            Some(Registered::Stat(id)) => {
                tracing::trace!(definition = %definition, value, "set stat");
                self.graph.set_value(id, value)
            }
            Some(registered) => Err(rejected(AttributeError::NotSettable(registered.id()))),
            None => Err(rejected(AttributeError::UnknownDefinition(definition.id))),
        }
    }

    /// Handle of the attribute registered under `definition`'s id.
    pub fn attribute_id(&self, definition: &AttributeDefinition) -> Option<AttributeId> {
        self.attributes.get(&definition.id).map(|registered| registered.id())
    }

    /// Raw value of any live node: leaf, derived attribute, relationship, element.
    pub fn value_of(&self, id: AttributeId) -> Result<f64, AttributeError> {
        self.graph
            .value(id)
            .ok_or(AttributeError::UnknownAttribute(id))
    }

    /// Authoritative definition for `id`.
    pub fn definition(&self, id: DefinitionId) -> Option<&AttributeDefinition> {
        self.definitions.get(&id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.values()
    }

    /// Relationship descriptors in the order they were attached.
    pub fn relationships(&self) -> &[AttributeRelationship] {
        &self.relationships
    }

    /// Number of identifiers backed by an attribute.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Clamped values of every known definition at this instant.
    pub fn snapshot(&self) -> AttributeSnapshot {
        let values = self
            .definitions
            .keys()
            .map(|&id| (id, self.get_by_id(id)))
            .collect();
        AttributeSnapshot { values }
    }

    // ===== listeners =====

    /// Register a change listener on any live node.
    pub fn subscribe<F>(
        &mut self,
        id: AttributeId,
        listener: F,
    ) -> Result<ListenerId, AttributeError>
    where
        F: FnMut(&ValueChanged) + Send + 'static,
    {
        self.graph.subscribe(id, Box::new(listener))
    }

    /// Returns false if the listener was not registered on `id`.
    pub fn unsubscribe(&mut self, id: AttributeId, listener: ListenerId) -> bool {
        self.graph.unsubscribe(id, listener)
    }

    // ===== internals =====

    fn check_bounds(definition: &AttributeDefinition) -> Result<(), AttributeError> {
        if definition.bounds.is_reversed() {
            return Err(rejected(AttributeError::InvalidBounds {
                id: definition.id,
                minimum: definition.bounds.minimum.unwrap_or(f64::NEG_INFINITY),
                maximum: definition.bounds.maximum.unwrap_or(f64::INFINITY),
            }));
        }
        Ok(())
    }

    fn check_leaf(&self, definition: &AttributeDefinition) -> Result<(), AttributeError> {
        if self.attributes.contains_key(&definition.id) {
            return Err(rejected(AttributeError::DuplicateDefinition(definition.id)));
        }
        if !self.definitions.contains_key(&definition.id) {
            Self::check_bounds(definition)?;
        }
        Ok(())
    }

    /// Keep the first instance seen for an identifier.
    fn remember(&mut self, definition: &AttributeDefinition) {
        if !self.definitions.contains_key(&definition.id) {
            self.definitions.insert(definition.id, definition.clone());
        }
    }

    /// Resolve an identifier, creating an empty derived attribute if needed.
    fn materialize(&mut self, definition: &AttributeDefinition) -> AttributeId {
        if let Some(registered) = self.attributes.get(&definition.id) {
            return registered.id();
        }
        let id = self.graph.insert_composable();
        self.attributes
            .insert(definition.id, Registered::Derived(id));
        self.remember(definition);
        tracing::debug!(definition = %definition, "materialized derived attribute");
        id
    }

    fn element_target(&self, element: AttributeId) -> Result<DefinitionId, AttributeError> {
        if let Some(target) = self.elements.get(&element) {
            return Ok(*target);
        }
        let error = match self.graph.kind(element) {
            Some(NodeKind::Element(_)) | None => AttributeError::UnknownAttribute(element),
            Some(_) => AttributeError::NotAnElement(element),
        };
        Err(rejected(error))
    }
}

/// Clamped values of every known definition, captured at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSnapshot {
    values: BTreeMap<DefinitionId, f64>,
}

impl AttributeSnapshot {
    /// Value captured for `definition`, `0` if it was unknown.
    pub fn get(&self, definition: &AttributeDefinition) -> f64 {
        self.values.get(&definition.id).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefinitionId, f64)> + '_ {
        self.values.iter().map(|(id, value)| (*id, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MultiplierPolicy;
    use crate::relationship::Combinator;

    fn def(id: u32, name: &str) -> AttributeDefinition {
        AttributeDefinition::new(id, name)
    }

    #[test]
    fn unknown_definition_reads_zero() {
        let system = AttributeSystem::default();
        assert_eq!(system.get(&def(1, "A")), 0.0);
        assert!(system.is_empty());
    }

    #[test]
    fn published_bounds_clamp_unknown_reads() {
        let mut system = AttributeSystem::default();
        system
            .register_definition(def(1, "Floor").with_minimum(5.0))
            .unwrap();
        assert_eq!(system.get(&def(1, "Floor")), 5.0);
        assert_eq!(system.raw(&def(1, "Floor")), 0.0);
    }

    #[test]
    fn reversed_published_bounds_rejected() {
        let mut system = AttributeSystem::default();
        let reversed = def(1, "Armor").with_minimum(10.0).with_maximum(1.0);
        assert_eq!(
            system.register_definition(reversed),
            Err(AttributeError::InvalidBounds {
                id: DefinitionId(1),
                minimum: 10.0,
                maximum: 1.0,
            })
        );
        assert!(system.definition(DefinitionId(1)).is_none());

        system
            .register_definition(def(1, "Armor").with_maximum(1.0))
            .unwrap();
        assert_eq!(system.get(&def(1, "Armor")), 0.0);
    }

    #[test]
    fn duplicate_leaf_rejected() {
        let a = def(1, "A");
        let err = AttributeSystem::new(
            [StatValue::new(a.clone(), 1.0)],
            [ConstantValue::new(a.clone(), 2.0)],
            [],
        )
        .unwrap_err();
        assert_eq!(err, AttributeError::DuplicateDefinition(a.id));
    }

    #[test]
    fn relationship_into_leaf_rejected() {
        let a = def(1, "A");
        let b = def(2, "B");
        let err = AttributeSystem::new(
            [StatValue::new(a.clone(), 1.0), StatValue::new(b.clone(), 2.0)],
            [],
            [AttributeRelationship::scaling(b.clone(), a.clone(), 1.0)],
        )
        .unwrap_err();
        assert_eq!(err, AttributeError::TargetIsLeaf { target: b.id });
    }

    #[test]
    fn empty_inputs_rejected() {
        let target = def(3, "T");
        let relationship =
            AttributeRelationship::new(target.clone(), Vec::new(), 2.0, Combinator::Add);
        let err = AttributeSystem::new([], [], [relationship]).unwrap_err();
        assert_eq!(
            err,
            AttributeError::EmptyRelationshipInputs { target: target.id }
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let a = def(1, "A");
        let err = AttributeSystem::new(
            [],
            [],
            [AttributeRelationship::scaling(a.clone(), a.clone(), 2.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            AttributeError::CyclicRelationship {
                target: a.id,
                input: a.id
            }
        );
    }

    #[test]
    fn rejected_relationship_leaves_system_unchanged() {
        let a = def(1, "A");
        let b = def(2, "B");
        let c = def(3, "C");
        let mut system = AttributeSystem::new(
            [StatValue::new(a.clone(), 10.0)],
            [],
            [
                AttributeRelationship::scaling(b.clone(), a.clone(), 2.0),
                AttributeRelationship::scaling(c.clone(), b.clone(), 2.0),
            ],
        )
        .unwrap();
        let before = system.snapshot();

        let err = system
            .add_relationship(AttributeRelationship::scaling(b.clone(), c.clone(), 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            AttributeError::CyclicRelationship {
                target: b.id,
                input: c.id
            }
        );
        assert_eq!(system.snapshot(), before);
        assert_eq!(system.relationships().len(), 2);

        system.set(&a, 1.0).unwrap();
        assert_eq!(system.get(&c), 4.0);
    }

    #[test]
    fn operand_cycle_detected() {
        let a = def(1, "A");
        let b = def(2, "B");
        let c = def(3, "C");
        let mut system = AttributeSystem::new(
            [StatValue::new(a.clone(), 1.0)],
            [],
            [AttributeRelationship::scaling(b.clone(), a.clone(), 1.0)],
        )
        .unwrap();
        system
            .add_relationship(AttributeRelationship::scaling(c.clone(), a.clone(), b.clone()))
            .unwrap();

        let err = system
            .add_relationship(AttributeRelationship::scaling(b.clone(), a.clone(), c.clone()))
            .unwrap_err();
        assert_eq!(
            err,
            AttributeError::CyclicRelationship {
                target: b.id,
                input: c.id
            }
        );
    }

    #[test]
    fn constants_and_derived_are_not_settable() {
        let k = def(1, "K");
        let d = def(2, "D");
        let mut system = AttributeSystem::new(
            [],
            [ConstantValue::new(k.clone(), 9999.0)],
            [AttributeRelationship::scaling(d.clone(), k.clone(), 1.0)],
        )
        .unwrap();
        assert!(matches!(
            system.set(&k, 1.0),
            Err(AttributeError::NotSettable(_))
        ));
        assert!(matches!(
            system.set(&d, 1.0),
            Err(AttributeError::NotSettable(_))
        ));
        assert_eq!(
            system.set(&def(9, "missing"), 1.0),
            Err(AttributeError::UnknownDefinition(DefinitionId(9)))
        );
        assert_eq!(system.get(&d), 9999.0);
    }

    #[test]
    fn element_handles_are_checked() {
        let a = def(1, "A");
        let d = def(2, "D");
        let mut system = AttributeSystem::new(
            [StatValue::new(a.clone(), 1.0)],
            [],
            [],
        )
        .unwrap();
        let leaf = system.attribute_id(&a).unwrap();
        assert_eq!(
            system.remove_element(leaf),
            Err(AttributeError::NotAnElement(leaf))
        );
        assert!(matches!(
            system.add_element(Element::constant(1.0), &a),
            Err(AttributeError::TargetIsLeaf { .. })
        ));

        let buff = system.add_element(Element::simple(5.0), &d).unwrap();
        assert_eq!(system.get(&d), 5.0);
        assert_eq!(system.remove_element(buff), Ok(Element::simple(5.0)));
        assert_eq!(system.get(&d), 0.0);
        assert_eq!(
            system.remove_element(buff),
            Err(AttributeError::UnknownAttribute(buff))
        );
    }

    #[test]
    fn fixed_elements_reject_assignment() {
        let d = def(2, "D");
        let mut system = AttributeSystem::default();
        let constant = system.add_element(Element::constant(3.0), &d).unwrap();
        assert_eq!(
            system.set_element_value(constant, 4.0),
            Err(AttributeError::NotSettable(constant))
        );
        assert_eq!(
            system.set_element_kind(constant, ContributionKind::Multiplicative),
            Err(AttributeError::NotSettable(constant))
        );
        assert_eq!(system.get(&d), 3.0);
    }

    #[test]
    fn set_bounds_applies_to_later_reads() {
        let a = def(1, "A");
        let mut system =
            AttributeSystem::new([StatValue::new(a.clone(), 5000.0)], [], []).unwrap();
        assert_eq!(system.get(&a), 5000.0);

        system
            .set_bounds(a.id, Bounds::new(None, Some(300.0)))
            .unwrap();
        assert_eq!(system.get(&a), 300.0);

        assert!(matches!(
            system.set_bounds(a.id, Bounds::new(Some(10.0), Some(1.0))),
            Err(AttributeError::InvalidBounds { .. })
        ));
        assert_eq!(
            system.set_bounds(DefinitionId(77), Bounds::UNBOUNDED),
            Err(AttributeError::UnknownDefinition(DefinitionId(77)))
        );
    }

    #[test]
    fn latest_only_policy() {
        let d = def(1, "D");
        let mut system = AttributeSystem::empty(
            AttributeConfig::new().with_multiplier_policy(MultiplierPolicy::LatestOnly),
        );
        system.add_element(Element::constant(10.0), &d).unwrap();
        system.add_element(Element::multiplicative(2.0), &d).unwrap();
        let latest = system.add_element(Element::multiplicative(3.0), &d).unwrap();
        assert_eq!(system.get(&d), 30.0);

        system.remove_element(latest).unwrap();
        assert_eq!(system.get(&d), 20.0);
    }

    #[test]
    fn snapshot_captures_clamped_values() {
        let a = def(1, "A").with_maximum(100.0);
        let b = def(2, "B");
        let system = AttributeSystem::new(
            [StatValue::new(a.clone(), 250.0)],
            [],
            [AttributeRelationship::scaling(b.clone(), a.clone(), 2.0)],
        )
        .unwrap();

        let snapshot = system.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&a), 100.0);
        // Relationships read raw values, bounds only apply at the read boundary
        assert_eq!(snapshot.get(&b), 500.0);
        assert_eq!(
            snapshot.iter().collect::<Vec<_>>(),
            vec![(a.id, 100.0), (b.id, 500.0)]
        );
    }
}
