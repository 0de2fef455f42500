//! Selector Axes
//!
//! The three traversal relations between compound selectors:
//! - descendant (whitespace)
//! - child (`>`)
//! - ancestor (`^`)
//!
//! Forward navigation is used by queries; reverse navigation walks the same
//! relation the other way for `is` tests.

use super::lexer::Combinator;
use crate::component::{ComponentAccess, NodeId};
use std::collections::HashSet;

/// Axis step between two filter groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Descendant,
    Child,
    Ancestor,
}

impl From<Combinator> for Axis {
    fn from(combinator: Combinator) -> Self {
        match combinator {
            Combinator::Descendant => Axis::Descendant,
            Combinator::Child => Axis::Child,
            Combinator::Ancestor => Axis::Ancestor,
        }
    }
}

/// Navigate along an axis from a context component
pub fn navigate<D: ComponentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Descendant => descendant_axis(doc, context),
        Axis::Child => child_axis(doc, context),
        Axis::Ancestor => ancestor_axis(doc, context),
    }
}

/// Walk an axis backwards: the nodes from which `context` is reachable
pub fn navigate_reverse<D: ComponentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Descendant => ancestor_axis(doc, context),
        Axis::Child => parent_axis(doc, context),
        Axis::Ancestor => descendant_axis(doc, context),
    }
}

/// Union of an axis over every node in `nodes`, first-seen order, no duplicates
pub fn step<D: ComponentAccess>(
    doc: &D,
    nodes: &[NodeId],
    axis: Axis,
    reverse: bool,
) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut result = Vec::with_capacity(nodes.len());
    for &node in nodes {
        let reached = if reverse {
            navigate_reverse(doc, node, axis)
        } else {
            navigate(doc, node, axis)
        };
        for candidate in reached {
            if seen.insert(candidate) {
                result.push(candidate);
            }
        }
    }
    result
}

/// Direct children
fn child_axis<D: ComponentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    doc.children_vec(context)
}

/// All descendants in pre-order
fn descendant_axis<D: ComponentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    doc.descendants_vec(context)
}

/// Owning container (at most one)
fn parent_axis<D: ComponentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    doc.parent_of(context).into_iter().collect()
}

/// All owners up to the top, nearest first
fn ancestor_axis<D: ComponentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;

    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentTree};

    fn tree() -> (ComponentTree, [NodeId; 4]) {
        let mut tree = ComponentTree::new();
        let root = tree.add(None, Component::new("root", "container"));
        let a = tree.add(Some(root), Component::new("a", "panel"));
        let b = tree.add(Some(a), Component::new("b", "button"));
        let c = tree.add(Some(root), Component::new("c", "button"));
        (tree, [root, a, b, c])
    }

    #[test]
    fn test_forward_axes() {
        let (tree, [root, a, b, c]) = tree();
        assert_eq!(navigate(&tree, root, Axis::Child), vec![a, c]);
        assert_eq!(navigate(&tree, root, Axis::Descendant), vec![a, b, c]);
        assert_eq!(navigate(&tree, b, Axis::Ancestor), vec![a, root]);
    }

    #[test]
    fn test_reverse_axes() {
        let (tree, [root, a, b, _]) = tree();
        assert_eq!(navigate_reverse(&tree, b, Axis::Child), vec![a]);
        assert_eq!(navigate_reverse(&tree, b, Axis::Descendant), vec![a, root]);
        assert_eq!(navigate_reverse(&tree, a, Axis::Ancestor), vec![b]);
        assert!(navigate_reverse(&tree, root, Axis::Child).is_empty());
    }

    #[test]
    fn test_step_deduplicates_in_first_seen_order() {
        let (tree, [root, a, b, c]) = tree();
        assert_eq!(step(&tree, &[b, c], Axis::Ancestor, false), vec![a, root]);
        assert_eq!(step(&tree, &[root, a], Axis::Descendant, false), vec![a, b, c]);
    }
}
