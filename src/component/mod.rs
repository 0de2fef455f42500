//! Component Model
//!
//! The engine never owns components. It reads them through two traits:
//! - `ComponentAccess` - per-node reads (type, id, properties, tree links)
//! - `ComponentRegistry` - the set of all live components, used when a query
//!   has no root
//!
//! Components are referenced by `NodeId` (u32) handles, the same way the
//! arena-backed `ComponentTree` stores them.

pub mod tree;
pub mod value;

pub use tree::{Component, ComponentNode, ComponentTree};
pub use value::PropertyValue;

/// Compact component identifier (index into the host's arena)
pub type NodeId = u32;

/// Read access to a component tree - enables selectors to run over any host
pub trait ComponentAccess {
    /// Most-derived type name (xtype) of a component
    fn xtype(&self, id: NodeId) -> Option<&str>;

    /// Check whether a component is of type `name`.
    ///
    /// With `exact` only the most-derived type counts; otherwise any type in
    /// the component's hierarchy matches.
    fn is_xtype(&self, id: NodeId, name: &str, exact: bool) -> bool {
        let _ = exact;
        self.xtype(id) == Some(name)
    }

    /// Stable component id
    fn component_id(&self, id: NodeId) -> Option<&str>;

    /// Id used by `#id` selectors; defaults to the component id
    fn item_id(&self, id: NodeId) -> Option<&str> {
        self.component_id(id)
    }

    /// Property set directly on the component (not inherited or defaulted)
    fn own_property(&self, id: NodeId, name: &str) -> Option<PropertyValue>;

    /// Property value including inherited defaults and computed configs
    fn property(&self, id: NodeId, name: &str) -> Option<PropertyValue>;

    /// Owning container of a component
    fn parent_of(&self, id: NodeId) -> Option<NodeId>;

    /// Direct children - returns collected Vec for trait object compatibility
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// All descendants in pre-order - returns collected Vec for trait object compatibility
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Whether the component can currently receive focus
    fn is_focusable(&self, id: NodeId) -> bool {
        let _ = id;
        false
    }

    /// Whether the component is visible; `deep` also checks every ancestor
    fn is_visible(&self, id: NodeId, deep: bool) -> bool {
        let _ = (id, deep);
        true
    }

    /// Invoke a zero-argument method used by `{member()}` expressions
    fn call_method(&self, id: NodeId, name: &str) -> Option<PropertyValue> {
        let _ = (id, name);
        None
    }
}

/// The set of all live components, searched when a query has no root
pub trait ComponentRegistry: ComponentAccess {
    /// Every registered component, in registration order
    fn all_components(&self) -> Vec<NodeId>;

    /// Look a component up by its component id
    fn component_by_id(&self, id: &str) -> Option<NodeId>;
}
