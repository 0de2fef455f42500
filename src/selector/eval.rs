//! Selector Evaluation Engine
//!
//! Runs compiled queries forward over a scope (`execute`) or backward from a
//! single candidate (`is_match`).

use super::axes::{self, Axis};
use super::compiler::{CompiledBranch, Filter, Op, Query};
use crate::component::{ComponentAccess, ComponentRegistry, NodeId};
use std::collections::HashSet;

/// Where a forward query starts reading candidates
#[derive(Debug, Clone, Copy)]
pub enum Scope<'s> {
    /// Every registered component
    Registry,
    /// Descendants of a root (or its children / ancestors under a leading axis)
    Root(NodeId),
    /// An explicit candidate list, filtered directly
    Items(&'s [NodeId]),
}

/// Execute a query, concatenating branch results.
///
/// Results of multi-branch queries are deduplicated, keeping the first
/// occurrence. The empty query yields nothing here; callers decide what the
/// empty selector means for them.
pub fn execute<D: ComponentRegistry>(doc: &D, query: &Query, scope: Scope<'_>) -> Vec<NodeId> {
    let mut results = Vec::new();
    for branch in query.branches() {
        results.extend(execute_branch(doc, branch, scope));
    }

    if query.is_multi_match() {
        let mut seen = HashSet::with_capacity(results.len());
        results.retain(|id| seen.insert(*id));
    }
    results
}

/// Execute one branch left to right
pub fn execute_branch<D: ComponentRegistry>(
    doc: &D,
    branch: &CompiledBranch,
    scope: Scope<'_>,
) -> Vec<NodeId> {
    let (root, mut working) = match scope {
        Scope::Registry => (None, Some(doc.all_components())),
        Scope::Items(items) => (None, Some(items.to_vec())),
        Scope::Root(root) => (Some(root), None),
    };

    for op in &branch.ops {
        let next = match (op, working.as_deref()) {
            (Op::Axis(axis), Some(items)) => axes::step(doc, items, *axis, false),
            (Op::Axis(axis), None) => axes::step(doc, &root_set(root), *axis, false),
            (Op::Filter(filter), Some(items)) => apply_filter(doc, filter, items),
            (Op::Filter(filter), None) => {
                let candidates = axes::step(doc, &root_set(root), Axis::Descendant, false);
                apply_filter(doc, filter, &candidates)
            }
        };
        if next.is_empty() {
            tracing::trace!(branch = %branch.source, "selector branch matched nothing");
            return next;
        }
        working = Some(next);
    }

    let result = working.unwrap_or_default();
    tracing::trace!(branch = %branch.source, matched = result.len(), "executed selector branch");
    result
}

fn root_set(root: Option<NodeId>) -> Vec<NodeId> {
    root.into_iter().collect()
}

/// Test whether a single candidate matches any branch of `query`.
///
/// The empty query matches everything.
pub fn is_match<D: ComponentAccess>(doc: &D, query: &Query, candidate: NodeId) -> bool {
    query.is_empty()
        || query
            .branches()
            .iter()
            .any(|branch| branch_matches(doc, branch, candidate))
}

/// Walk one branch backward from `candidate`
fn branch_matches<D: ComponentAccess>(doc: &D, branch: &CompiledBranch, candidate: NodeId) -> bool {
    let mut active = vec![candidate];
    for op in branch.ops.iter().rev() {
        active = match op {
            Op::Axis(axis) => axes::step(doc, &active, *axis, true),
            Op::Filter(filter) => apply_filter(doc, filter, &active),
        };
        if active.is_empty() {
            return false;
        }
    }
    true
}

/// Apply one filter to a candidate list, preserving order
pub fn apply_filter<D: ComponentAccess>(doc: &D, filter: &Filter, items: &[NodeId]) -> Vec<NodeId> {
    match filter {
        Filter::Type { name, .. } if name == "*" => items.to_vec(),
        Filter::Type { name, exact } => keep(items, |id| doc.is_xtype(id, name, *exact)),
        Filter::Id(expected) => keep(items, |id| doc.item_id(id) == Some(expected.as_str())),
        Filter::Attribute(attribute) => attribute.filter(doc, items),
        Filter::Pseudo(pseudo) => pseudo.apply(doc, items),
        Filter::Member(expr) => keep(items, |id| expr.matches(doc, id)),
    }
}

fn keep(items: &[NodeId], predicate: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
    items.iter().copied().filter(|&id| predicate(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentTree};
    use crate::selector::compiler::compile;

    /// root(container)
    ///   a(panel, title=A)
    ///     b(button)
    ///     c(button, text=OK)
    ///   d(panel)
    ///     e(toolbar)
    ///       f(button)
    fn tree() -> (ComponentTree, Vec<NodeId>) {
        let mut tree = ComponentTree::new();
        let root = tree.add(None, Component::new("root", "component/container"));
        let a = tree.add(
            Some(root),
            Component::new("a", "component/container/panel").prop("title", "A"),
        );
        let b = tree.add(Some(a), Component::new("b", "component/button"));
        let c = tree.add(Some(a), Component::new("c", "component/button").prop("text", "OK"));
        let d = tree.add(Some(root), Component::new("d", "component/container/panel"));
        let e = tree.add(Some(d), Component::new("e", "component/container/toolbar"));
        let f = tree.add(Some(e), Component::new("f", "component/button"));
        (tree, vec![root, a, b, c, d, e, f])
    }

    fn run(tree: &ComponentTree, selector: &str, scope: Scope<'_>) -> Vec<NodeId> {
        execute(tree, &compile(selector).unwrap(), scope)
    }

    #[test]
    fn test_descendant_and_child() {
        let (tree, n) = tree();
        assert_eq!(run(&tree, "panel button", Scope::Root(n[0])), vec![n[2], n[3], n[6]]);
        assert_eq!(run(&tree, "panel > button", Scope::Root(n[0])), vec![n[2], n[3]]);
        assert_eq!(run(&tree, "> panel", Scope::Root(n[0])), vec![n[1], n[4]]);
    }

    #[test]
    fn test_ancestor_axis() {
        let (tree, n) = tree();
        assert_eq!(run(&tree, "button ^ panel", Scope::Registry), vec![n[1], n[4]]);
        assert_eq!(run(&tree, "^ container", Scope::Root(n[6])), vec![n[5], n[4], n[0]]);
    }

    #[test]
    fn test_items_scope_filters_directly() {
        let (tree, n) = tree();
        let items = [n[2], n[4], n[6]];
        assert_eq!(run(&tree, "button", Scope::Items(&items)), vec![n[2], n[6]]);
    }

    #[test]
    fn test_multi_branch_dedup() {
        let (tree, n) = tree();
        assert_eq!(
            run(&tree, "button[text=OK], panel button", Scope::Root(n[0])),
            vec![n[3], n[2], n[6]]
        );
    }

    #[test]
    fn test_is_match_reverse_walk() {
        let (tree, n) = tree();
        let query = compile("panel > button").unwrap();
        assert!(is_match(&tree, &query, n[2]));
        assert!(!is_match(&tree, &query, n[6]));
        let query = compile("panel button").unwrap();
        assert!(is_match(&tree, &query, n[6]));
        let query = compile("toolbar ^ panel").unwrap();
        assert!(is_match(&tree, &query, n[4]));
        assert!(!is_match(&tree, &query, n[1]));
    }

    #[test]
    fn test_empty_query_is_vacuously_true() {
        let (tree, n) = tree();
        let query = compile("").unwrap();
        assert!(is_match(&tree, &query, n[3]));
        assert!(execute(&tree, &query, Scope::Registry).is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let (tree, n) = tree();
        assert!(run(&tree, "grid", Scope::Root(n[0])).is_empty());
        assert!(run(&tree, "button", Scope::Root(n[6])).is_empty());
    }
}
