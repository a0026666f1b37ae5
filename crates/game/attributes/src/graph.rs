//! Attribute arena - nodes, dependency edges, and push-based propagation.
//!
//! Every attribute of one [`AttributeSystem`] lives in a slot of this arena
//! and is addressed by a generational [`AttributeId`]. Edges point from a
//! dependency to its dependents; a node holds no reference to anything, so
//! dropping the arena tears the whole graph down.
//!
//! # Propagation
//!
//! ```text
//! [ mutated node ] → affected subgraph → topological order → recompute once each → listeners
//! ```
//!
//! The walk uses an explicit work list, so stack usage does not grow with
//! graph depth. Acyclicity is enforced by the system before any edge is
//! added (see [`Graph::reaches`]).
//!
//! [`AttributeSystem`]: crate::AttributeSystem

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::composable::{Contribution, aggregate};
use crate::config::MultiplierPolicy;
use crate::element::{ContributionKind, Element};
use crate::error::AttributeError;
use crate::relationship::{self, Combinator};

/// Handle to one node of the arena.
///
/// Handles of removed elements go stale: the slot may be reused, but under a
/// new generation, so the old handle never aliases the new occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeId {
    index: u32,
    generation: u32,
}

impl AttributeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.index, self.generation)
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Notification delivered to listeners.
///
/// Values are raw: bounds are only applied at the system's read boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueChanged {
    pub attribute: AttributeId,
    pub previous: f64,
    pub current: f64,
}

/// Change callback. Runs synchronously inside the mutating call.
pub type Listener = Box<dyn FnMut(&ValueChanged) + Send>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Operand {
    Fixed(f64),
    Attribute(AttributeId),
}

/// Evaluation variant of a node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeKind {
    Stat,
    Constant,
    Element(Element),
    Composable {
        elements: Vec<AttributeId>,
    },
    Relationship {
        inputs: Vec<AttributeId>,
        operand: Operand,
        combinator: Combinator,
    },
}

struct Node {
    kind: NodeKind,
    contribution: ContributionKind,
    value: f64,
    dependents: Vec<AttributeId>,
    listeners: Vec<(ListenerId, Listener)>,
}

impl Node {
    fn new(kind: NodeKind, contribution: ContributionKind, value: f64) -> Self {
        Self {
            kind,
            contribution,
            value,
            dependents: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("contribution", &self.contribution)
            .field("value", &self.value)
            .field("dependents", &self.dependents)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// NaN compares equal to NaN so a NaN-valued node does not re-notify forever.
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[derive(Debug, Default)]
pub(crate) struct Graph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_listener: u64,
    policy: MultiplierPolicy,
}

impl Graph {
    pub(crate) fn new(policy: MultiplierPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    // ===== slots =====

    fn insert(&mut self, node: Node) -> AttributeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return AttributeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        AttributeId::new(index, 0)
    }

    fn node(&self, id: AttributeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: AttributeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn contains(&self, id: AttributeId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn value(&self, id: AttributeId) -> Option<f64> {
        self.node(id).map(|node| node.value)
    }

    pub(crate) fn kind(&self, id: AttributeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    fn dependents(&self, id: AttributeId) -> &[AttributeId] {
        self.node(id)
            .map(|node| node.dependents.as_slice())
            .unwrap_or(&[])
    }

    fn add_dependent(&mut self, source: AttributeId, dependent: AttributeId) {
        if let Some(node) = self.node_mut(source) {
            if !node.dependents.contains(&dependent) {
                node.dependents.push(dependent);
            }
        }
    }

    // ===== construction =====

    pub(crate) fn insert_stat(&mut self, value: f64) -> AttributeId {
        self.insert(Node::new(NodeKind::Stat, ContributionKind::RawAdditive, value))
    }

    pub(crate) fn insert_constant(&mut self, value: f64) -> AttributeId {
        self.insert(Node::new(
            NodeKind::Constant,
            ContributionKind::RawAdditive,
            value,
        ))
    }

    pub(crate) fn insert_element(&mut self, element: Element) -> AttributeId {
        self.insert(Node::new(
            NodeKind::Element(element),
            element.kind(),
            element.value(),
        ))
    }

    pub(crate) fn insert_composable(&mut self) -> AttributeId {
        self.insert(Node::new(
            NodeKind::Composable {
                elements: Vec::new(),
            },
            ContributionKind::RawAdditive,
            0.0,
        ))
    }

    /// Insert a relationship node subscribed to its inputs and operand.
    ///
    /// Nothing depends on the new node yet, so its value is computed in
    /// place without a propagation walk.
    pub(crate) fn insert_relationship(
        &mut self,
        inputs: Vec<AttributeId>,
        operand: Operand,
        combinator: Combinator,
        contribution: ContributionKind,
    ) -> AttributeId {
        let mut sources = inputs.clone();
        if let Operand::Attribute(attribute) = operand {
            sources.push(attribute);
        }

        let id = self.insert(Node::new(
            NodeKind::Relationship {
                inputs,
                operand,
                combinator,
            },
            contribution,
            0.0,
        ));
        for source in sources {
            self.add_dependent(source, id);
        }

        let value = self.compute(id);
        if let Some(node) = self.node_mut(id) {
            node.value = value;
        }
        id
    }

    /// Append `element` to a composable node and propagate.
    pub(crate) fn attach(&mut self, composable: AttributeId, element: AttributeId) {
        if let Some(Node {
            kind: NodeKind::Composable { elements },
            ..
        }) = self.node_mut(composable)
        {
            elements.push(element);
        }
        self.add_dependent(element, composable);
        self.refresh(&[composable], Vec::new());
    }

    /// Remove an injected element node, free its slot, and propagate.
    pub(crate) fn detach(
        &mut self,
        composable: AttributeId,
        element: AttributeId,
    ) -> Result<Element, AttributeError> {
        let removed = match self.kind(element) {
            Some(NodeKind::Element(removed)) => *removed,
            Some(_) => return Err(AttributeError::NotAnElement(element)),
            None => return Err(AttributeError::UnknownAttribute(element)),
        };

        if let Some(Node {
            kind: NodeKind::Composable { elements },
            ..
        }) = self.node_mut(composable)
        {
            elements.retain(|id| *id != element);
        }

        let slot = &mut self.slots[element.index()];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(element.index);

        self.refresh(&[composable], Vec::new());
        Ok(removed)
    }

    // ===== mutation =====

    /// Assign a stat or simple element. No-op when the value is unchanged.
    pub(crate) fn set_value(&mut self, id: AttributeId, value: f64) -> Result<(), AttributeError> {
        let node = self
            .node_mut(id)
            .ok_or(AttributeError::UnknownAttribute(id))?;
        match &mut node.kind {
            NodeKind::Stat => {}
            NodeKind::Element(Element::Simple { value: stored, .. }) => *stored = value,
            _ => return Err(AttributeError::NotSettable(id)),
        }

        let previous = node.value;
        if same_value(previous, value) {
            return Ok(());
        }
        node.value = value;

        let dependents = node.dependents.clone();
        let change = ValueChanged {
            attribute: id,
            previous,
            current: value,
        };
        self.refresh(&dependents, vec![change]);
        Ok(())
    }

    /// Reclassify a simple element. Its listeners fire even though the
    /// numeric value is unchanged.
    pub(crate) fn set_contribution(
        &mut self,
        id: AttributeId,
        kind: ContributionKind,
    ) -> Result<(), AttributeError> {
        let node = self
            .node_mut(id)
            .ok_or(AttributeError::UnknownAttribute(id))?;
        match &mut node.kind {
            NodeKind::Element(Element::Simple { kind: stored, .. }) => *stored = kind,
            _ => return Err(AttributeError::NotSettable(id)),
        }
        if node.contribution == kind {
            return Ok(());
        }
        node.contribution = kind;

        let dependents = node.dependents.clone();
        let change = ValueChanged {
            attribute: id,
            previous: node.value,
            current: node.value,
        };
        self.refresh(&dependents, vec![change]);
        Ok(())
    }

    // ===== listeners =====

    pub(crate) fn subscribe(
        &mut self,
        id: AttributeId,
        listener: Listener,
    ) -> Result<ListenerId, AttributeError> {
        let listener_id = ListenerId(self.next_listener);
        let node = self
            .node_mut(id)
            .ok_or(AttributeError::UnknownAttribute(id))?;
        node.listeners.push((listener_id, listener));
        self.next_listener += 1;
        Ok(listener_id)
    }

    pub(crate) fn unsubscribe(&mut self, id: AttributeId, listener: ListenerId) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners.retain(|(existing, _)| *existing != listener);
        node.listeners.len() != before
    }

    fn notify(&mut self, changes: &[ValueChanged]) {
        for change in changes {
            if let Some(node) = self.node_mut(change.attribute) {
                for (_, listener) in node.listeners.iter_mut() {
                    listener(change);
                }
            }
        }
    }

    // ===== evaluation =====

    /// Evaluate one node from the cached values of its dependencies.
    fn compute(&self, id: AttributeId) -> f64 {
        let Some(node) = self.node(id) else {
            return 0.0;
        };
        match &node.kind {
            NodeKind::Stat | NodeKind::Constant | NodeKind::Element(_) => node.value,
            NodeKind::Composable { elements } => {
                let contributions: Vec<Contribution> = elements
                    .iter()
                    .filter_map(|element| self.node(*element))
                    .map(|element| Contribution::new(element.contribution, element.value))
                    .collect();
                aggregate(&contributions, self.policy)
            }
            NodeKind::Relationship {
                inputs,
                operand,
                combinator,
            } => {
                let operand = match operand {
                    Operand::Fixed(value) => *value,
                    Operand::Attribute(attribute) => self.value(*attribute).unwrap_or(0.0),
                };
                relationship::evaluate(
                    inputs.iter().map(|input| self.value(*input).unwrap_or(0.0)),
                    operand,
                    *combinator,
                )
            }
        }
    }

    /// Recompute `starts` and everything downstream of them, then notify.
    ///
    /// `changes` carries notifications for nodes mutated directly by the
    /// caller; they fire before the recomputed ones.
    fn refresh(&mut self, starts: &[AttributeId], mut changes: Vec<ValueChanged>) {
        let order = self.topological_order(starts);
        tracing::trace!(affected = order.len(), "propagating attribute change");

        for id in order {
            let current = self.compute(id);
            if let Some(node) = self.node_mut(id) {
                let previous = node.value;
                node.value = current;
                if !same_value(previous, current) {
                    changes.push(ValueChanged {
                        attribute: id,
                        previous,
                        current,
                    });
                }
            }
        }

        self.notify(&changes);
    }

    /// Kahn ordering of the subgraph reachable from `starts` (inclusive).
    fn topological_order(&self, starts: &[AttributeId]) -> Vec<AttributeId> {
        let mut roots = Vec::with_capacity(starts.len());
        let mut visited = HashSet::new();
        for &start in starts {
            if self.contains(start) && visited.insert(start) {
                roots.push(start);
            }
        }

        let mut in_degree: HashMap<AttributeId, usize> = HashMap::new();
        let mut stack = roots.clone();
        while let Some(id) = stack.pop() {
            in_degree.entry(id).or_insert(0);
            for &dependent in self.dependents(id) {
                *in_degree.entry(dependent).or_insert(0) += 1;
                if visited.insert(dependent) {
                    stack.push(dependent);
                }
            }
        }

        // Only roots can have no incoming edge inside the subgraph
        let mut ready: VecDeque<AttributeId> = roots
            .into_iter()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for &dependent in self.dependents(id) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(dependent);
                    }
                }
            }
        }
        order
    }

    /// Returns true if `to` is `from` or is downstream of it.
    ///
    /// Adding an edge `to → from` is safe exactly when this is false.
    pub(crate) fn reaches(&self, from: AttributeId, to: AttributeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::from([from]);
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            for &dependent in self.dependents(id) {
                if dependent == to {
                    return true;
                }
                if visited.insert(dependent) {
                    stack.push(dependent);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(graph: &mut Graph, id: AttributeId) -> Arc<Mutex<Vec<ValueChanged>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        graph
            .subscribe(
                id,
                Box::new(move |change: &ValueChanged| {
                    sink.lock().unwrap().push(*change)
                }),
            )
            .unwrap();
        seen
    }

    fn scaled(graph: &mut Graph, input: AttributeId, factor: f64) -> AttributeId {
        graph.insert_relationship(
            vec![input],
            Operand::Fixed(factor),
            Combinator::Multiply,
            ContributionKind::RawAdditive,
        )
    }

    #[test]
    fn stat_set_notifies_only_on_change() {
        let mut graph = Graph::default();
        let stat = graph.insert_stat(10.0);
        let seen = recorder(&mut graph, stat);

        graph.set_value(stat, 10.0).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        graph.set_value(stat, 12.0).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ValueChanged {
                attribute: stat,
                previous: 10.0,
                current: 12.0
            }]
        );
    }

    #[test]
    fn diamond_recomputes_bottom_once() {
        // a → left → [L]  ┐
        //                  ├→ sum → [D]
        // a → right → [R] ┘
        let mut graph = Graph::default();
        let a = graph.insert_stat(1.0);

        let left = graph.insert_composable();
        let to_left = scaled(&mut graph, a, 2.0);
        graph.attach(left, to_left);

        let right = graph.insert_composable();
        let to_right = scaled(&mut graph, a, 3.0);
        graph.attach(right, to_right);

        let bottom = graph.insert_composable();
        let sum = graph.insert_relationship(
            vec![left, right],
            Operand::Fixed(1.0),
            Combinator::Multiply,
            ContributionKind::RawAdditive,
        );
        graph.attach(bottom, sum);
        assert_eq!(graph.value(bottom), Some(5.0));

        let seen = recorder(&mut graph, bottom);
        graph.set_value(a, 2.0).unwrap();

        assert_eq!(graph.value(bottom), Some(10.0));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "bottom must be recomputed exactly once");
        assert_eq!(seen[0].previous, 5.0);
        assert_eq!(seen[0].current, 10.0);
    }

    #[test]
    fn attribute_operand_is_live() {
        let mut graph = Graph::default();
        let input = graph.insert_stat(1234.0);
        let factor = graph.insert_stat(2.0);
        let relation = graph.insert_relationship(
            vec![input],
            Operand::Attribute(factor),
            Combinator::Multiply,
            ContributionKind::RawAdditive,
        );
        assert_eq!(graph.value(relation), Some(2468.0));

        graph.set_value(factor, 0.5).unwrap();
        assert_eq!(graph.value(relation), Some(617.0));
    }

    #[test]
    fn reaches_follows_dependents() {
        let mut graph = Graph::default();
        let a = graph.insert_stat(1.0);
        let composable = graph.insert_composable();
        let relation = scaled(&mut graph, a, 1.0);
        graph.attach(composable, relation);

        assert!(graph.reaches(a, composable));
        assert!(graph.reaches(composable, composable));
        assert!(!graph.reaches(composable, a));
    }

    #[test]
    fn detached_slot_is_reused_under_new_generation() {
        let mut graph = Graph::default();
        let composable = graph.insert_composable();
        let first = graph.insert_element(Element::constant(5.0));
        graph.attach(composable, first);
        assert_eq!(graph.value(composable), Some(5.0));

        assert_eq!(
            graph.detach(composable, first),
            Ok(Element::Constant(5.0))
        );
        assert_eq!(graph.value(composable), Some(0.0));

        let second = graph.insert_element(Element::constant(7.0));
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(!graph.contains(first));
        assert_eq!(
            graph.set_value(first, 1.0),
            Err(AttributeError::UnknownAttribute(first))
        );
    }

    #[test]
    fn constants_and_derived_nodes_are_not_settable() {
        let mut graph = Graph::default();
        let constant = graph.insert_constant(9999.0);
        let composable = graph.insert_composable();
        assert_eq!(
            graph.set_value(constant, 1.0),
            Err(AttributeError::NotSettable(constant))
        );
        assert_eq!(
            graph.set_value(composable, 1.0),
            Err(AttributeError::NotSettable(composable))
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut graph = Graph::default();
        let stat = graph.insert_stat(0.0);
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let listener = graph
            .subscribe(
                stat,
                Box::new(move |_: &ValueChanged| *sink.lock().unwrap() += 1),
            )
            .unwrap();

        graph.set_value(stat, 1.0).unwrap();
        assert!(graph.unsubscribe(stat, listener));
        assert!(!graph.unsubscribe(stat, listener));
        graph.set_value(stat, 2.0).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn nan_does_not_renotify() {
        let mut graph = Graph::default();
        let stat = graph.insert_stat(f64::NAN);
        let seen = recorder(&mut graph, stat);
        graph.set_value(stat, f64::NAN).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }
}
