//! Component Tree - Arena-based component registry
//!
//! A reference host for the engine:
//! - Arena allocation for components
//! - NodeId indices with parent/child/sibling links
//! - Registration order doubles as the global registry order
//! - Own properties layered over inherited defaults

use super::value::PropertyValue;
use super::{ComponentAccess, ComponentRegistry, NodeId};
use std::collections::HashMap;

/// Description of a component to insert into a `ComponentTree`
#[derive(Debug, Clone, Default)]
pub struct Component {
    id: String,
    item_id: Option<String>,
    xtypes: Vec<String>,
    own: HashMap<String, PropertyValue>,
    defaults: HashMap<String, PropertyValue>,
    methods: HashMap<String, PropertyValue>,
    focusable: bool,
}

impl Component {
    /// Create a component with an id and a `/`-separated type hierarchy
    /// (`"component/container/panel"`; the last entry is the most derived).
    pub fn new(id: impl Into<String>, xtypes: &str) -> Self {
        Component {
            id: id.into(),
            xtypes: xtypes
                .split('/')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            ..Default::default()
        }
    }

    pub fn item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Set an own property
    pub fn prop(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.own.insert(name.to_string(), value.into());
        self
    }

    /// Set an inherited (class-level) default
    pub fn default_prop(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.defaults.insert(name.to_string(), value.into());
        self
    }

    /// Register the result of a zero-argument method
    pub fn method(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.methods.insert(name.to_string(), value.into());
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }
}

/// A component stored in the arena
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub component: Component,
    /// Owning container (None for top-level components)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

/// Arena of components, usable as both `ComponentAccess` and `ComponentRegistry`
#[derive(Debug, Default)]
pub struct ComponentTree {
    nodes: Vec<ComponentNode>,
    by_id: HashMap<String, NodeId>,
}

impl ComponentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component as the last child of `parent` (or top-level)
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn add(&mut self, parent: Option<NodeId>, component: Component) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let prev_sibling = parent.and_then(|p| self.get_node(p)).and_then(|p| p.last_child);
        self.by_id.insert(component.id.clone(), id);
        self.nodes.push(ComponentNode {
            component,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling,
            next_sibling: None,
        });

        if let Some(prev) = prev_sibling {
            self.nodes[prev as usize].next_sibling = Some(id);
        }
        if let Some(p) = parent {
            let parent_node = &mut self.nodes[p as usize];
            if parent_node.first_child.is_none() {
                parent_node.first_child = Some(id);
            }
            parent_node.last_child = Some(id);
        }
        id
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&ComponentNode> {
        self.nodes.get(id as usize)
    }

    /// Look a node up by component id
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over direct children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { tree: self, next: first }
    }

    /// Iterate over all descendants of a node in pre-order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        // Initialize stack with all children in reverse order (so first is processed first)
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { tree: self, stack }
    }

    fn component(&self, id: NodeId) -> Option<&Component> {
        self.get_node(id).map(|n| &n.component)
    }

    fn is_hidden(&self, id: NodeId) -> bool {
        self.property(id, "hidden")
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }
}

/// Iterator over child components
pub struct ChildIter<'a> {
    tree: &'a ComponentTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant components
pub struct DescendantIter<'a> {
    tree: &'a ComponentTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.tree.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.tree.get_node(id).and_then(|n| n.prev_sibling);
            }
        }
        Some(current)
    }
}

impl ComponentAccess for ComponentTree {
    fn xtype(&self, id: NodeId) -> Option<&str> {
        self.component(id)?.xtypes.last().map(String::as_str)
    }

    fn is_xtype(&self, id: NodeId, name: &str, exact: bool) -> bool {
        let Some(component) = self.component(id) else {
            return false;
        };
        if exact {
            component.xtypes.last().map(String::as_str) == Some(name)
        } else {
            component.xtypes.iter().any(|t| t == name)
        }
    }

    fn component_id(&self, id: NodeId) -> Option<&str> {
        self.component(id).map(|c| c.id.as_str())
    }

    fn item_id(&self, id: NodeId) -> Option<&str> {
        let component = self.component(id)?;
        Some(component.item_id.as_deref().unwrap_or(&component.id))
    }

    fn own_property(&self, id: NodeId, name: &str) -> Option<PropertyValue> {
        self.component(id)?.own.get(name).cloned()
    }

    fn property(&self, id: NodeId, name: &str) -> Option<PropertyValue> {
        let component = self.component(id)?;
        if let Some(value) = component.own.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = component.defaults.get(name) {
            return Some(value.clone());
        }
        match name {
            "id" => Some(PropertyValue::String(component.id.clone())),
            "itemId" => self.item_id(id).map(PropertyValue::from),
            "xtype" => self.xtype(id).map(PropertyValue::from),
            _ => None,
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id).collect()
    }

    fn is_focusable(&self, id: NodeId) -> bool {
        self.component(id).map(|c| c.focusable).unwrap_or(false) && !self.is_hidden(id)
    }

    fn is_visible(&self, id: NodeId, deep: bool) -> bool {
        if self.is_hidden(id) {
            return false;
        }
        if deep {
            let mut current = self.parent_of(id);
            while let Some(parent) = current {
                if self.is_hidden(parent) {
                    return false;
                }
                current = self.parent_of(parent);
            }
        }
        true
    }

    fn call_method(&self, id: NodeId, name: &str) -> Option<PropertyValue> {
        if let Some(value) = self.component(id)?.methods.get(name) {
            return Some(value.clone());
        }
        match name {
            "isHidden" => Some(PropertyValue::Bool(self.is_hidden(id))),
            "isVisible" => Some(PropertyValue::Bool(self.is_visible(id, false))),
            "isFocusable" => Some(PropertyValue::Bool(self.is_focusable(id))),
            "getId" => self.component_id(id).map(PropertyValue::from),
            "getItemId" => self.item_id(id).map(PropertyValue::from),
            "getXType" => self.xtype(id).map(PropertyValue::from),
            _ => None,
        }
    }
}

impl ComponentRegistry for ComponentTree {
    fn all_components(&self) -> Vec<NodeId> {
        (0..self.nodes.len() as NodeId).collect()
    }

    fn component_by_id(&self, id: &str) -> Option<NodeId> {
        self.by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ComponentTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = ComponentTree::new();
        let root = tree.add(None, Component::new("root", "component/container"));
        let a = tree.add(Some(root), Component::new("a", "component/panel"));
        let b = tree.add(Some(a), Component::new("b", "component/button"));
        let c = tree.add(Some(root), Component::new("c", "component/button"));
        (tree, root, a, b, c)
    }

    #[test]
    fn test_children_and_descendants() {
        let (tree, root, a, b, c) = sample();
        assert_eq!(tree.children_vec(root), vec![a, c]);
        assert_eq!(tree.descendants_vec(root), vec![a, b, c]);
        assert_eq!(tree.parent_of(b), Some(a));
        assert_eq!(tree.get_node(c).and_then(|n| n.prev_sibling), Some(a));
    }

    #[test]
    fn test_xtype_hierarchy() {
        let (tree, _, a, _, _) = sample();
        assert_eq!(tree.xtype(a), Some("panel"));
        assert!(tree.is_xtype(a, "component", false));
        assert!(!tree.is_xtype(a, "component", true));
        assert!(tree.is_xtype(a, "panel", true));
    }

    #[test]
    fn test_own_versus_default_properties() {
        let mut tree = ComponentTree::new();
        let id = tree.add(
            None,
            Component::new("x", "component")
                .prop("foo", "bar")
                .default_prop("bletch", 0),
        );
        assert_eq!(tree.own_property(id, "foo"), Some(PropertyValue::from("bar")));
        assert_eq!(tree.own_property(id, "bletch"), None);
        assert_eq!(tree.property(id, "bletch"), Some(PropertyValue::Number(0.0)));
        assert_eq!(tree.property(id, "id"), Some(PropertyValue::from("x")));
    }

    #[test]
    fn test_visibility_and_focus() {
        let mut tree = ComponentTree::new();
        let parent = tree.add(None, Component::new("p", "container").prop("hidden", true));
        let child = tree.add(Some(parent), Component::new("c", "field").focusable(true));
        assert!(tree.is_visible(child, false));
        assert!(!tree.is_visible(child, true));
        assert!(tree.is_focusable(child));
        assert_eq!(tree.call_method(parent, "isHidden"), Some(PropertyValue::Bool(true)));
    }

    #[test]
    fn test_registry_order() {
        let (tree, root, a, b, c) = sample();
        assert_eq!(tree.all_components(), vec![root, a, b, c]);
        assert_eq!(tree.component_by_id("b"), Some(b));
        assert_eq!(tree.component_by_id("missing"), None);
    }

    #[test]
    #[should_panic]
    fn test_add_under_unknown_parent_panics() {
        let mut tree = ComponentTree::new();
        tree.add(Some(7), Component::new("orphan", "component"));
    }
}
