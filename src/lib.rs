//! RustyQuery - Compiled CSS-style selector queries over component trees
//!
//! Layers:
//! A: Matcher registry and lexer (selector text to tokens)
//! B: Compiler (tokens to cached, immutable queries)
//! C: Executor (forward queries and backward `is` tests)
//! D: Pseudo-class library (built-in and registered at runtime)
//! E: Parallel evaluation of several selectors (feature `parallel`)
//!
//! The engine never owns components. Hosts expose their tree through
//! [`ComponentAccess`] and [`ComponentRegistry`]; [`ComponentTree`] is an
//! arena-backed host that works out of the box.
//!
//! ```
//! use rustyquery::{Component, ComponentTree, SelectorEngine};
//!
//! let mut tree = ComponentTree::new();
//! let form = tree.add(None, Component::new("form", "container/form"));
//! tree.add(Some(form), Component::new("save", "button").prop("action", "save"));
//! tree.add(Some(form), Component::new("cancel", "button"));
//!
//! let engine = SelectorEngine::new(tree);
//! let saves = engine.query("form > button[action=save]", None).unwrap();
//! assert_eq!(saves.len(), 1);
//! assert!(engine.is(saves[0], "button:first").unwrap());
//! ```

pub mod cache;
pub mod component;
pub mod config;
mod engine;
pub mod error;
#[cfg(feature = "parallel")]
mod parallel;
pub mod selector;

pub use cache::CacheStats;
pub use component::{
    Component, ComponentAccess, ComponentRegistry, ComponentTree, NodeId, PropertyValue,
};
pub use config::EngineConfig;
pub use engine::SelectorEngine;
pub use error::{Result, SelectorSyntaxError};
pub use selector::{compile, parse, PseudoFn, Query};
