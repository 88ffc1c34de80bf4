//! Type Hierarchy - explicit supertype DAG.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: `TypeHash` of every declared type
//! - Edges: `sub -> super` for each declared supertype link
//!
//! Assignability never relies on reflection: a type is assignable to another
//! only through declared edges, or because the target is
//! [`builtins::OBJECT`], the universal supertype. Transitive supertype sets
//! are materialized whenever a link is added so that `is_assignable` is a
//! hash lookup on evaluation paths.

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use rustc_hash::{FxHashMap, FxHashSet};

use rulekit_core::{TypeHash, builtins};

/// Explicit supertype graph keyed by `TypeHash`.
#[derive(Debug, Default)]
pub struct TypeHierarchy {
    graph: DiGraph<TypeHash, ()>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
    /// Transitive supertypes per type, nearest first (excluding the type).
    ancestors: FxHashMap<TypeHash, Vec<TypeHash>>,
    /// Same as `ancestors`, as a set.
    ancestor_sets: FxHashMap<TypeHash, FxHashSet<TypeHash>>,
}

impl TypeHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type node. Idempotent.
    pub fn declare(&mut self, ty: TypeHash) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&ty) {
            return node;
        }
        let node = self.graph.add_node(ty);
        self.nodes.insert(ty, node);
        node
    }

    /// Check if a type node exists.
    pub fn contains(&self, ty: TypeHash) -> bool {
        self.nodes.contains_key(&ty)
    }

    /// Add a `subtype -> supertype` link.
    ///
    /// Returns `false` (and changes nothing) if the link is a self-link or
    /// would make the graph cyclic. Linking to `OBJECT` is accepted and
    /// redundant.
    pub fn add_supertype(&mut self, subtype: TypeHash, supertype: TypeHash) -> bool {
        if !self.can_link(subtype, supertype) {
            return false;
        }
        let sub = self.declare(subtype);
        let sup = self.declare(supertype);
        if self.graph.find_edge(sub, sup).is_none() {
            self.graph.add_edge(sub, sup, ());
            self.rebuild_closure(sub);
        }
        true
    }

    /// Would `add_supertype(subtype, supertype)` succeed?
    pub fn can_link(&self, subtype: TypeHash, supertype: TypeHash) -> bool {
        if subtype == supertype || subtype == builtins::OBJECT {
            return false;
        }
        match (self.nodes.get(&subtype), self.nodes.get(&supertype)) {
            (Some(&sub), Some(&sup)) => !has_path_connecting(&self.graph, sup, sub, None),
            _ => true,
        }
    }

    /// Can a value of type `from` be used where `to` is expected?
    #[inline]
    pub fn is_assignable(&self, from: TypeHash, to: TypeHash) -> bool {
        from == to
            || to == builtins::OBJECT
            || self
                .ancestor_sets
                .get(&from)
                .is_some_and(|set| set.contains(&to))
    }

    /// Direct supertypes, in declaration order.
    pub fn direct_supertypes(&self, ty: TypeHash) -> Vec<TypeHash> {
        let Some(&node) = self.nodes.get(&ty) else {
            return Vec::new();
        };
        // petgraph yields most recently added edges first
        let mut out: Vec<TypeHash> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        out.reverse();
        out
    }

    /// All transitive supertypes, nearest first. Does not include `ty` itself
    /// or the implicit `OBJECT`.
    pub fn supertypes(&self, ty: TypeHash) -> &[TypeHash] {
        self.ancestors.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recompute closures for `node` and every type below it.
    fn rebuild_closure(&mut self, node: NodeIndex) {
        let mut below = Bfs::new(petgraph::visit::Reversed(&self.graph), node);
        let mut affected = Vec::new();
        while let Some(n) = below.next(petgraph::visit::Reversed(&self.graph)) {
            affected.push(n);
        }

        for n in affected {
            let ty = self.graph[n];
            let mut order = Vec::new();
            let mut bfs = Bfs::new(&self.graph, n);
            while let Some(up) = bfs.next(&self.graph) {
                if up != n {
                    order.push(self.graph[up]);
                }
            }
            self.ancestor_sets.insert(ty, order.iter().copied().collect());
            self.ancestors.insert(ty, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> TypeHash {
        TypeHash::from_name(name)
    }

    #[test]
    fn everything_is_assignable_to_object() {
        let hierarchy = TypeHierarchy::new();
        assert!(hierarchy.is_assignable(ty("player"), builtins::OBJECT));
        assert!(hierarchy.is_assignable(builtins::OBJECT, builtins::OBJECT));
        assert!(!hierarchy.is_assignable(builtins::OBJECT, ty("player")));
    }

    #[test]
    fn transitive_assignability() {
        let mut hierarchy = TypeHierarchy::new();
        assert!(hierarchy.add_supertype(ty("player"), ty("living-entity")));
        assert!(hierarchy.add_supertype(ty("living-entity"), ty("entity")));

        assert!(hierarchy.is_assignable(ty("player"), ty("entity")));
        assert!(hierarchy.is_assignable(ty("player"), ty("living-entity")));
        assert!(!hierarchy.is_assignable(ty("entity"), ty("player")));
        assert_eq!(
            hierarchy.supertypes(ty("player")),
            &[ty("living-entity"), ty("entity")]
        );
    }

    #[test]
    fn late_link_updates_descendants() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_supertype(ty("player"), ty("living-entity"));
        // Linking the parent afterwards must reach the existing child.
        hierarchy.add_supertype(ty("living-entity"), ty("entity"));
        assert!(hierarchy.is_assignable(ty("player"), ty("entity")));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut hierarchy = TypeHierarchy::new();
        assert!(hierarchy.add_supertype(ty("a"), ty("b")));
        assert!(hierarchy.add_supertype(ty("b"), ty("c")));
        assert!(!hierarchy.add_supertype(ty("c"), ty("a")));
        assert!(!hierarchy.add_supertype(ty("a"), ty("a")));
        assert!(!hierarchy.is_assignable(ty("c"), ty("a")));
    }

    #[test]
    fn diamond() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_supertype(ty("slime"), ty("monster"));
        hierarchy.add_supertype(ty("slime"), ty("bouncy"));
        hierarchy.add_supertype(ty("monster"), ty("entity"));
        hierarchy.add_supertype(ty("bouncy"), ty("entity"));

        assert_eq!(hierarchy.direct_supertypes(ty("slime")), vec![ty("monster"), ty("bouncy")]);
        let supers = hierarchy.supertypes(ty("slime"));
        assert_eq!(supers.len(), 3);
        assert_eq!(supers[2], ty("entity"));
    }

    #[test]
    fn unknown_types_are_only_assignable_to_themselves() {
        let hierarchy = TypeHierarchy::new();
        assert!(hierarchy.is_assignable(ty("x"), ty("x")));
        assert!(!hierarchy.is_assignable(ty("x"), ty("y")));
        assert!(hierarchy.supertypes(ty("x")).is_empty());
    }
}
