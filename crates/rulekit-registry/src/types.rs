//! TypeRegistry - storage for type descriptors.
//!
//! Descriptors are stored in registration order and indexed by code name and
//! by hash. The registry also maintains the *parse order*: the order in which
//! untyped literals try descriptors. Parse order is a topological order of
//! the `before`/`after` hints, with ties broken by registration order. Hints
//! naming types that are not registered (yet) are ignored until they are.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use rulekit_core::{RegistrationError, TypeHash};

use crate::{TypeDescriptor, TypeHierarchy};

/// Descriptor storage with name/hash indexes and parse ordering.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Descriptors in registration order.
    descriptors: Vec<TypeDescriptor>,
    by_name: FxHashMap<String, usize>,
    by_hash: FxHashMap<TypeHash, usize>,
    /// Indexes into `descriptors`, in parse order.
    parse_order: Vec<usize>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Fails on an invalid or duplicate code name, a descriptor defect, or
    /// ordering hints that create a cycle. On failure nothing is stored.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<usize, RegistrationError> {
        descriptor.validate()?;

        if self.by_name.contains_key(descriptor.code_name())
            || self.by_hash.contains_key(&descriptor.type_hash())
        {
            return Err(RegistrationError::DuplicateCodeName(
                descriptor.code_name().to_string(),
            ));
        }

        let index = self.descriptors.len();
        let code_name = descriptor.code_name().to_string();
        self.by_name.insert(code_name.clone(), index);
        self.by_hash.insert(descriptor.type_hash(), index);
        self.descriptors.push(descriptor);

        match self.compute_parse_order() {
            Some(order) => {
                self.parse_order = order;
                Ok(index)
            }
            None => {
                self.descriptors.pop();
                self.by_name.remove(&code_name);
                self.by_hash.retain(|_, &mut i| i != index);
                Err(RegistrationError::OrderingCycle(code_name))
            }
        }
    }

    /// Get a descriptor by code name.
    pub fn get_by_name(&self, code_name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(code_name).map(|&i| &self.descriptors[i])
    }

    /// Get the descriptor registered for exactly this type.
    pub fn get_exact(&self, ty: TypeHash) -> Option<&TypeDescriptor> {
        self.by_hash.get(&ty).map(|&i| &self.descriptors[i])
    }

    /// Get the most specific descriptor for `ty`.
    ///
    /// If `ty` has no descriptor, all descriptors of its supertypes are
    /// candidates. A candidate that is a subtype of another candidate always
    /// wins; among unrelated candidates the earlier one in parse order wins.
    /// Falls back to the `object` descriptor when one is registered.
    pub fn get_most_specific(
        &self,
        hierarchy: &TypeHierarchy,
        ty: TypeHash,
    ) -> Option<&TypeDescriptor> {
        if let Some(exact) = self.get_exact(ty) {
            return Some(exact);
        }

        let candidates: Vec<TypeHash> = hierarchy
            .supertypes(ty)
            .iter()
            .copied()
            .filter(|t| self.by_hash.contains_key(t))
            .collect();

        let most_specific = candidates.iter().copied().filter(|&c| {
            !candidates
                .iter()
                .any(|&other| other != c && hierarchy.is_assignable(other, c))
        });

        most_specific
            .min_by_key(|t| self.parse_rank(self.by_hash[t]))
            .and_then(|t| self.get_exact(t))
            .or_else(|| self.get_exact(rulekit_core::builtins::OBJECT))
    }

    /// Code name of `ty`, or its hash if it has no descriptor.
    pub fn name_of(&self, ty: TypeHash) -> String {
        self.get_exact(ty)
            .map(|d| d.code_name().to_string())
            .unwrap_or_else(|| ty.to_string())
    }

    /// Descriptors in parse order.
    pub fn in_parse_order(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.parse_order.iter().map(|&i| &self.descriptors[i])
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn parse_rank(&self, index: usize) -> usize {
        self.parse_order
            .iter()
            .position(|&i| i == index)
            .unwrap_or(usize::MAX)
    }

    /// Kahn's algorithm over the hint graph; the min-heap keeps ties in
    /// registration order. `None` on a cycle.
    fn compute_parse_order(&self) -> Option<Vec<usize>> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.descriptors.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.descriptors.len())
            .map(|i| graph.add_node(i))
            .collect();

        for (i, descriptor) in self.descriptors.iter().enumerate() {
            for name in descriptor.before_hints() {
                if let Some(&j) = self.by_name.get(name) {
                    graph.update_edge(nodes[i], nodes[j], ());
                }
            }
            for name in descriptor.after_hints() {
                if let Some(&j) = self.by_name.get(name) {
                    graph.update_edge(nodes[j], nodes[i], ());
                }
            }
        }

        let mut in_degree: Vec<usize> = nodes
            .iter()
            .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for next in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
                let j = graph[next];
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        (order.len() == nodes.len()).then_some(order)
    }
}
