//! Attribute Filters
//!
//! `[prop]`, `[@prop]`, `[?prop]` and `[prop op value]` tests against
//! component properties.

use super::lexer::AttrOp;
use crate::component::{ComponentAccess, NodeId, PropertyValue};
use regex_automata::meta::Regex;
use std::sync::Arc;

/// Literal compared against when a property is missing entirely
const UNDEFINED: &str = "undefined";

/// How the property is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccess {
    /// Own property, then inherited defaults
    Inherited,
    /// `@prop`: the component must carry the property itself
    Own,
    /// `?prop`: presence of the own property is enough
    Presence,
}

/// The test applied to the property value
#[derive(Debug, Clone)]
pub enum AttributeTest {
    /// No operator: the value must be truthy
    Truthy,
    /// `=`, `!=`, `^=`, `$=`, `*=`
    Compare(AttrOp, String),
    /// `%=`
    Modulo(String),
    /// `~=`
    Token(String),
    /// `/=`
    Regex(Arc<Regex>),
}

/// A compiled attribute filter
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    pub property: String,
    pub access: PropertyAccess,
    pub test: AttributeTest,
}

impl AttributeFilter {
    /// Build a filter from a raw property name (with its `@`/`?` prefix)
    pub fn new(raw_property: &str, test: AttributeTest) -> Self {
        let (access, property) = if let Some(name) = raw_property.strip_prefix('@') {
            (PropertyAccess::Own, name)
        } else if let Some(name) = raw_property.strip_prefix('?') {
            (PropertyAccess::Presence, name)
        } else {
            (PropertyAccess::Inherited, raw_property)
        };
        AttributeFilter {
            property: property.to_string(),
            access,
            test,
        }
    }

    /// Test a single component
    pub fn matches<D: ComponentAccess + ?Sized>(&self, doc: &D, id: NodeId) -> bool {
        let value = match self.access {
            PropertyAccess::Inherited => doc.property(id, &self.property),
            PropertyAccess::Own | PropertyAccess::Presence => {
                match doc.own_property(id, &self.property) {
                    Some(value) => Some(value),
                    None => return false,
                }
            }
        };

        if self.access == PropertyAccess::Presence {
            return true;
        }

        match &self.test {
            AttributeTest::Truthy => value.map(|v| v.is_truthy()).unwrap_or(false),
            AttributeTest::Compare(op, literal) => match value {
                Some(value) => compare(*op, &value, literal),
                None => match op {
                    AttrOp::Eq => literal == UNDEFINED,
                    AttrOp::NotEq => literal != UNDEFINED,
                    _ => false,
                },
            },
            AttributeTest::Modulo(literal) => value
                .map(|v| {
                    let divisor = v.coerce_literal(literal).to_number();
                    let remainder = v.to_number() % divisor;
                    remainder == 0.0
                })
                .unwrap_or(false),
            AttributeTest::Token(literal) => match value {
                Some(v) if v.is_truthy() => v.tokens().iter().any(|token| {
                    let token = PropertyValue::String(token.clone());
                    token.loose_eq(&token.coerce_literal(literal))
                }),
                _ => false,
            },
            AttributeTest::Regex(regex) => match value {
                None | Some(PropertyValue::Null) => false,
                Some(v) => regex.is_match(v.to_string_value().as_str()),
            },
        }
    }

    /// Keep the candidates that pass the filter, preserving order
    pub fn filter<D: ComponentAccess + ?Sized>(&self, doc: &D, items: &[NodeId]) -> Vec<NodeId> {
        items
            .iter()
            .copied()
            .filter(|&id| self.matches(doc, id))
            .collect()
    }
}

fn compare(op: AttrOp, value: &PropertyValue, literal: &str) -> bool {
    match op {
        AttrOp::Eq => value.loose_eq(&value.coerce_literal(literal)),
        AttrOp::NotEq => !value.loose_eq(&value.coerce_literal(literal)),
        AttrOp::StartsWith | AttrOp::EndsWith | AttrOp::Contains => {
            if !value.is_truthy() {
                return false;
            }
            let text = value.to_string_value();
            match op {
                AttrOp::StartsWith => text.starts_with(literal),
                AttrOp::EndsWith => text.ends_with(literal),
                _ => text.contains(literal),
            }
        }
        // Routed to their own tests at compile time
        AttrOp::Modulo | AttrOp::Token | AttrOp::Regex => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentTree};

    fn tree() -> (ComponentTree, NodeId, NodeId) {
        let mut tree = ComponentTree::new();
        let a = tree.add(
            None,
            Component::new("a", "panel")
                .prop("cls", "foo-cls my-cls bar-cls")
                .prop("width", 300)
                .prop("collapsed", false)
                .default_prop("title", "Inherited"),
        );
        let b = tree.add(
            None,
            Component::new("b", "panel")
                .prop("cls", vec!["my-cls", "other"])
                .prop("width", 250)
                .prop("title", "Sales data"),
        );
        (tree, a, b)
    }

    fn compare_filter(prop: &str, op: AttrOp, literal: &str) -> AttributeFilter {
        AttributeFilter::new(prop, AttributeTest::Compare(op, literal.to_string()))
    }

    #[test]
    fn test_equality_is_exact() {
        let (tree, a, b) = tree();
        let f = compare_filter("cls", AttrOp::Eq, "my-cls");
        assert!(f.filter(&tree, &[a, b]).is_empty());
    }

    #[test]
    fn test_token_list() {
        let (tree, a, b) = tree();
        let f = AttributeFilter::new("cls", AttributeTest::Token("my-cls".to_string()));
        assert_eq!(f.filter(&tree, &[a, b]), vec![a, b]);
    }

    #[test]
    fn test_numeric_coercion_and_modulo() {
        let (tree, a, b) = tree();
        assert_eq!(compare_filter("width", AttrOp::Eq, "300").filter(&tree, &[a, b]), vec![a]);
        let f = AttributeFilter::new("width", AttributeTest::Modulo("100".to_string()));
        assert_eq!(f.filter(&tree, &[a, b]), vec![a]);
    }

    #[test]
    fn test_bool_coercion() {
        let (tree, a, b) = tree();
        assert_eq!(
            compare_filter("collapsed", AttrOp::Eq, "false").filter(&tree, &[a, b]),
            vec![a]
        );
    }

    #[test]
    fn test_string_operators() {
        let (tree, a, b) = tree();
        let run = |op, value| compare_filter("title", op, value).filter(&tree, &[a, b]);
        assert_eq!(run(AttrOp::StartsWith, "Sales"), vec![b]);
        assert_eq!(run(AttrOp::EndsWith, "data"), vec![b]);
        assert_eq!(run(AttrOp::Contains, "herit"), vec![a]);
    }

    #[test]
    fn test_own_property_prefixes() {
        let (tree, a, b) = tree();
        let inherited = AttributeFilter::new("title", AttributeTest::Truthy);
        assert_eq!(inherited.filter(&tree, &[a, b]), vec![a, b]);
        let own = AttributeFilter::new("@title", AttributeTest::Truthy);
        assert_eq!(own.filter(&tree, &[a, b]), vec![b]);
        let presence = AttributeFilter::new("?collapsed", AttributeTest::Truthy);
        assert_eq!(presence.filter(&tree, &[a, b]), vec![a]);
    }

    #[test]
    fn test_missing_property() {
        let (tree, a, _) = tree();
        assert!(compare_filter("nope", AttrOp::NotEq, "x").matches(&tree, a));
        assert!(compare_filter("nope", AttrOp::Eq, "undefined").matches(&tree, a));
        assert!(!compare_filter("nope", AttrOp::Eq, "x").matches(&tree, a));
    }

    #[test]
    fn test_regex() {
        let (tree, a, b) = tree();
        let regex = Arc::new(Regex::new("^Sales|^Inh").unwrap());
        let f = AttributeFilter::new("title", AttributeTest::Regex(regex));
        assert_eq!(f.filter(&tree, &[a, b]), vec![a, b]);
    }
}
