//! Pseudo-class Library
//!
//! Implements the built-in pseudo-classes:
//!
//! Positional (index within the current candidate list):
//! - first, last, nth(N), odd, even, nth-child(An+B)
//!
//! Structural (position within the owning container):
//! - first-child, last-child, only-child, empty
//!
//! Selector-taking:
//! - not(sel), any(a|b|...), has(sel), next(sel), prev(sel)
//!
//! State:
//! - focusable, visible, visible(deep)
//!
//! Custom pseudo-classes are registered by name in a [`PseudoRegistry`] and
//! take precedence over the built-ins.

use super::compiler::Query;
use super::eval::is_match;
use crate::component::{ComponentAccess, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A custom pseudo-class: filters `items` given the (unescaped) argument text
pub type PseudoFn =
    Arc<dyn Fn(&dyn ComponentAccess, &[NodeId], &str) -> Vec<NodeId> + Send + Sync>;

/// An+B expression for `:nth-child`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i64,
    /// Offset (B in An+B)
    pub b: i64,
}

impl NthExpression {
    /// "odd" (2n+1)
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// "even" (2n)
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    /// A single 1-based position
    pub fn index(n: i64) -> Self {
        Self { a: 0, b: n }
    }

    pub fn new(a: i64, b: i64) -> Self {
        Self { a, b }
    }

    /// Parse "odd", "even", "3", "2n+1", "-n+3", "n"
    pub fn parse(s: &str) -> Option<Self> {
        let s: String = s.trim().to_ascii_lowercase().split_whitespace().collect();

        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            _ => {}
        }

        if let Ok(n) = s.parse::<i64>() {
            return Some(Self::index(n));
        }

        let n_pos = s.find('n')?;
        let a_str = &s[..n_pos];
        let a = match a_str {
            "" | "+" => 1,
            "-" => -1,
            _ => a_str.parse().ok()?,
        };

        let rest = &s[n_pos + 1..];
        let b = if rest.is_empty() {
            0
        } else if rest.starts_with('+') || rest.starts_with('-') {
            rest.parse().ok()?
        } else {
            return None;
        };

        Some(Self::new(a, b))
    }

    /// Check if position `n` (1-based) satisfies `(n - b) mod a == 0`
    ///
    /// The quotient may be negative, so `2n+4` keeps positions 2 and 4.
    /// Coefficients whose arithmetic overflows never match.
    pub fn matches(&self, n: i64) -> bool {
        if self.a == 0 {
            return n == self.b;
        }
        n.checked_sub(self.b)
            .and_then(|offset| offset.checked_rem(self.a))
            .is_some_and(|rem| rem == 0)
    }
}

/// A registered custom pseudo-class bound to its argument
#[derive(Clone)]
pub struct CustomPseudo {
    pub name: String,
    pub arg: String,
    pub function: PseudoFn,
}

impl fmt::Debug for CustomPseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPseudo")
            .field("name", &self.name)
            .field("arg", &self.arg)
            .finish_non_exhaustive()
    }
}

/// A compiled pseudo-class filter
#[derive(Debug, Clone)]
pub enum PseudoFilter {
    Not(Arc<Query>),
    Any(Vec<Arc<Query>>),
    Has(Arc<Query>),
    Next(Arc<Query>),
    Prev(Arc<Query>),
    First,
    Last,
    /// 1-based position within the candidate list
    Nth(usize),
    Odd,
    Even,
    NthChild(NthExpression),
    Focusable,
    Visible { deep: bool },
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Custom(CustomPseudo),
}

/// Names of the built-in pseudo-classes
pub const BUILTIN_PSEUDOS: &[&str] = &[
    "not",
    "any",
    "has",
    "next",
    "prev",
    "first",
    "last",
    "nth",
    "odd",
    "even",
    "nth-child",
    "focusable",
    "visible",
    "first-child",
    "last-child",
    "only-child",
    "empty",
];

/// Built-ins whose argument is itself a selector
pub fn takes_selector(name: &str) -> bool {
    matches!(name, "not" | "any" | "has" | "next" | "prev")
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_PSEUDOS.contains(&name)
}

impl PseudoFilter {
    /// Apply the filter to a candidate list, preserving order
    pub fn apply<D: ComponentAccess>(&self, doc: &D, items: &[NodeId]) -> Vec<NodeId> {
        match self {
            PseudoFilter::Not(query) => keep(items, |id| !is_match(doc, query, id)),
            PseudoFilter::Any(queries) => {
                keep(items, |id| queries.iter().any(|q| is_match(doc, q, id)))
            }
            PseudoFilter::Has(query) => keep(items, |id| {
                doc.descendants_vec(id)
                    .into_iter()
                    .any(|d| is_match(doc, query, d))
            }),
            PseudoFilter::Next(query) => keep(items, |id| {
                sibling(doc, id, 1).is_some_and(|s| is_match(doc, query, s))
            }),
            PseudoFilter::Prev(query) => keep(items, |id| {
                sibling(doc, id, -1).is_some_and(|s| is_match(doc, query, s))
            }),
            PseudoFilter::First => items.first().copied().into_iter().collect(),
            PseudoFilter::Last => items.last().copied().into_iter().collect(),
            PseudoFilter::Nth(n) => items
                .get(n.saturating_sub(1))
                .filter(|_| *n > 0)
                .copied()
                .into_iter()
                .collect(),
            PseudoFilter::Odd => by_position(items, |i| i % 2 == 1),
            PseudoFilter::Even => by_position(items, |i| i % 2 == 0),
            PseudoFilter::NthChild(expr) => by_position(items, |i| expr.matches(i)),
            PseudoFilter::Focusable => keep(items, |id| doc.is_focusable(id)),
            PseudoFilter::Visible { deep } => keep(items, |id| doc.is_visible(id, *deep)),
            PseudoFilter::FirstChild => keep(items, |id| {
                siblings(doc, id).and_then(|s| s.first().copied()) == Some(id)
            }),
            PseudoFilter::LastChild => keep(items, |id| {
                siblings(doc, id).and_then(|s| s.last().copied()) == Some(id)
            }),
            PseudoFilter::OnlyChild => {
                keep(items, |id| siblings(doc, id).is_some_and(|s| s == [id]))
            }
            PseudoFilter::Empty => keep(items, |id| doc.children_vec(id).is_empty()),
            PseudoFilter::Custom(custom) => {
                let access: &dyn ComponentAccess = doc;
                (custom.function)(access, items, &custom.arg)
            }
        }
    }
}

fn keep(items: &[NodeId], mut predicate: impl FnMut(NodeId) -> bool) -> Vec<NodeId> {
    items.iter().copied().filter(|&id| predicate(id)).collect()
}

/// Keep items whose 1-based position satisfies `predicate`
fn by_position(items: &[NodeId], predicate: impl Fn(i64) -> bool) -> Vec<NodeId> {
    items
        .iter()
        .enumerate()
        .filter(|(i, _)| predicate(*i as i64 + 1))
        .map(|(_, &id)| id)
        .collect()
}

/// Children of the component's owner (None for top-level components)
fn siblings<D: ComponentAccess>(doc: &D, id: NodeId) -> Option<Vec<NodeId>> {
    doc.parent_of(id).map(|parent| doc.children_vec(parent))
}

/// The sibling `offset` places away from `id`
fn sibling<D: ComponentAccess>(doc: &D, id: NodeId, offset: isize) -> Option<NodeId> {
    let siblings = siblings(doc, id)?;
    let pos = siblings.iter().position(|&s| s == id)?;
    let target = pos.checked_add_signed(offset)?;
    siblings.get(target).copied()
}

/// Runtime-registered pseudo-classes, shared by every query an engine compiles
#[derive(Default)]
pub struct PseudoRegistry {
    custom: RwLock<HashMap<String, PseudoFn>>,
}

impl PseudoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a pseudo-class
    pub fn register(&self, name: &str, function: PseudoFn) {
        let mut custom = self.custom.write().unwrap_or_else(PoisonError::into_inner);
        if custom.insert(name.to_string(), function).is_some() || is_builtin(name) {
            tracing::debug!(pseudo = name, "pseudo-class registration replaces an existing one");
        }
    }

    pub fn get(&self, name: &str) -> Option<PseudoFn> {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        custom.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PseudoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = custom.keys().collect();
        names.sort();
        f.debug_struct("PseudoRegistry").field("custom", &names).finish()
    }
}
