//! Selector Compiler
//!
//! Compiles parsed selectors into flat operation lists, one per branch.
//! Nested selectors inside `:not`, `:any`, `:has`, `:next` and `:prev` are
//! compiled here too, so every syntax error surfaces at compile time.

use super::attribute::{AttributeFilter, AttributeTest};
use super::axes::Axis;
use super::expr::{self, MemberExpr};
use super::lexer::{unescape, AttrOp, Token};
use super::parser::{self, split_top_level, BranchAst};
use super::pseudos::{self, CustomPseudo, NthExpression, PseudoFilter, PseudoRegistry};
use crate::cache::{QueryCache, RegexCache};
use crate::config::EngineConfig;
use crate::error::{Result, SelectorSyntaxError};
use std::sync::Arc;

/// Compiled selector: one operation list per comma-separated branch
#[derive(Debug, Clone)]
pub struct Query {
    selector: String,
    branches: Vec<CompiledBranch>,
}

/// Operations of one branch, in left-to-right order
#[derive(Debug, Clone)]
pub struct CompiledBranch {
    pub source: String,
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Replace the working set by navigating an axis
    Axis(Axis),
    /// Narrow the working set
    Filter(Filter),
}

/// Filter operations
#[derive(Debug, Clone)]
pub enum Filter {
    /// Type test; `*` matches everything
    Type { name: String, exact: bool },
    /// `#id` against the item id
    Id(String),
    Attribute(AttributeFilter),
    Pseudo(PseudoFilter),
    Member(MemberExpr),
}

impl Query {
    /// Trimmed selector text this query was compiled from
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn branches(&self) -> &[CompiledBranch] {
        &self.branches
    }

    /// True for the empty selector, which matches everything
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Results of several branches may overlap and need deduplication
    pub fn is_multi_match(&self) -> bool {
        self.branches.len() > 1
    }
}

/// Selector compiler bound to a pseudo-class registry and caches
pub struct Compiler<'a> {
    pseudos: &'a PseudoRegistry,
    regexes: &'a RegexCache,
    queries: Option<&'a QueryCache>,
}

impl<'a> Compiler<'a> {
    pub fn new(pseudos: &'a PseudoRegistry, regexes: &'a RegexCache) -> Self {
        Compiler {
            pseudos,
            regexes,
            queries: None,
        }
    }

    /// Look up and store compiled queries (including nested ones) in `cache`
    pub fn with_query_cache(mut self, cache: &'a QueryCache) -> Self {
        self.queries = Some(cache);
        self
    }

    /// Compile a selector, going through the query cache when one is attached
    pub fn compile(&self, selector: &str) -> Result<Arc<Query>> {
        let key = selector.trim();
        if let Some(cache) = self.queries {
            if let Some(query) = cache.get(key) {
                return Ok(query);
            }
        }

        let query = Arc::new(self.build(key)?);
        tracing::debug!(
            selector = key,
            branches = query.branches.len(),
            "compiled selector"
        );
        if let Some(cache) = self.queries {
            cache.insert(key, Arc::clone(&query));
        }
        Ok(query)
    }

    fn build(&self, selector: &str) -> Result<Query> {
        let ast = parser::parse(selector)?;
        let branches = ast
            .branches
            .iter()
            .map(|branch| self.compile_branch(&ast.source, branch))
            .collect::<Result<Vec<_>>>()?;
        Ok(Query {
            selector: ast.source,
            branches,
        })
    }

    fn compile_branch(&self, selector: &str, branch: &BranchAst) -> Result<CompiledBranch> {
        let mut ops = Vec::with_capacity(branch.tokens.len());
        for token in &branch.tokens {
            let op = match token {
                Token::Combinator(combinator) => Op::Axis(Axis::from(*combinator)),
                Token::Type { name, exact } => Op::Filter(Filter::Type {
                    name: name.clone(),
                    exact: *exact,
                }),
                Token::Id(id) => Op::Filter(Filter::Id(id.clone())),
                Token::Attribute {
                    property,
                    op,
                    value,
                } => Op::Filter(Filter::Attribute(self.compile_attribute(
                    selector,
                    property,
                    *op,
                    value.as_deref(),
                )?)),
                Token::Pseudo { name, arg } => {
                    Op::Filter(Filter::Pseudo(self.compile_pseudo(selector, name, arg.as_deref())?))
                }
                Token::Member(source) => {
                    let expr = expr::parse(source).map_err(|message| {
                        SelectorSyntaxError::InvalidExpression {
                            selector: selector.to_string(),
                            expression: source.clone(),
                            message,
                        }
                    })?;
                    Op::Filter(Filter::Member(expr))
                }
            };
            ops.push(op);
        }
        Ok(CompiledBranch {
            source: branch.source.clone(),
            ops,
        })
    }

    fn compile_attribute(
        &self,
        selector: &str,
        property: &str,
        op: Option<AttrOp>,
        value: Option<&str>,
    ) -> Result<AttributeFilter> {
        let test = match (op, value) {
            (None, _) | (_, None) => AttributeTest::Truthy,
            (Some(AttrOp::Modulo), Some(value)) => AttributeTest::Modulo(value.to_string()),
            (Some(AttrOp::Token), Some(value)) => AttributeTest::Token(value.to_string()),
            (Some(AttrOp::Regex), Some(pattern)) => {
                let regex = self.regexes.get_or_compile(pattern).map_err(|message| {
                    SelectorSyntaxError::InvalidRegex {
                        selector: selector.to_string(),
                        pattern: pattern.to_string(),
                        message,
                    }
                })?;
                AttributeTest::Regex(regex)
            }
            (Some(op), Some(value)) => AttributeTest::Compare(op, value.to_string()),
        };
        Ok(AttributeFilter::new(property, test))
    }

    fn compile_pseudo(
        &self,
        selector: &str,
        name: &str,
        arg: Option<&str>,
    ) -> Result<PseudoFilter> {
        if let Some(function) = self.pseudos.get(name) {
            return Ok(PseudoFilter::Custom(CustomPseudo {
                name: name.to_string(),
                arg: arg.map(|a| unescape(a).into_owned()).unwrap_or_default(),
                function,
            }));
        }

        let invalid = |argument: &str| SelectorSyntaxError::InvalidPseudoArgument {
            selector: selector.to_string(),
            name: name.to_string(),
            argument: argument.to_string(),
        };

        if pseudos::takes_selector(name) {
            let arg = arg.map(str::trim).unwrap_or_default();
            if arg.is_empty() {
                return Err(invalid(arg));
            }
            if name == "any" {
                let alternatives = split_top_level(arg, '|')
                    .into_iter()
                    .map(|alt| {
                        if alt.trim().is_empty() {
                            Err(invalid(arg))
                        } else {
                            self.compile(alt)
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                return Ok(PseudoFilter::Any(alternatives));
            }
            let query = self.compile(arg)?;
            return Ok(match name {
                "not" => PseudoFilter::Not(query),
                "has" => PseudoFilter::Has(query),
                "next" => PseudoFilter::Next(query),
                _ => PseudoFilter::Prev(query),
            });
        }

        let arg = arg.map(unescape);
        let filter = match name {
            "first" => PseudoFilter::First,
            "last" => PseudoFilter::Last,
            "odd" => PseudoFilter::Odd,
            "even" => PseudoFilter::Even,
            "focusable" => PseudoFilter::Focusable,
            "first-child" => PseudoFilter::FirstChild,
            "last-child" => PseudoFilter::LastChild,
            "only-child" => PseudoFilter::OnlyChild,
            "empty" => PseudoFilter::Empty,
            "nth" => {
                let text = arg.as_deref().unwrap_or_default();
                match text.trim().parse::<usize>() {
                    Ok(n) if n > 0 => PseudoFilter::Nth(n),
                    _ => return Err(invalid(text)),
                }
            }
            "nth-child" => {
                let text = arg.as_deref().unwrap_or_default();
                match NthExpression::parse(text) {
                    Some(expr) => PseudoFilter::NthChild(expr),
                    None => return Err(invalid(text)),
                }
            }
            "visible" => match arg.as_deref().map(str::trim) {
                None | Some("") | Some("false") => PseudoFilter::Visible { deep: false },
                Some("deep") | Some("true") => PseudoFilter::Visible { deep: true },
                Some(other) => return Err(invalid(other)),
            },
            _ => {
                return Err(SelectorSyntaxError::UnknownPseudo {
                    selector: selector.to_string(),
                    name: name.to_string(),
                })
            }
        };
        Ok(filter)
    }
}

/// Compile a selector with only the built-in pseudo-classes and no caching
pub fn compile(selector: &str) -> Result<Query> {
    let pseudos = PseudoRegistry::new();
    let regexes = RegexCache::new(EngineConfig::default().regex_capacity());
    let query = Compiler::new(&pseudos, &regexes).compile(selector)?;
    Ok(Arc::unwrap_or_clone(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentAccess, NodeId};

    #[test]
    fn test_compile_compound() {
        let query = compile("panel#main[title] > button:first").unwrap();
        assert_eq!(query.branches().len(), 1);
        let ops = &query.branches()[0].ops;
        assert_eq!(ops.len(), 6);
        assert!(matches!(
            &ops[0],
            Op::Filter(Filter::Type { name, exact: false }) if name == "panel"
        ));
        assert!(matches!(&ops[1], Op::Filter(Filter::Id(id)) if id == "main"));
        assert!(matches!(&ops[3], Op::Axis(Axis::Child)));
        assert!(matches!(&ops[5], Op::Filter(Filter::Pseudo(PseudoFilter::First))));
    }

    #[test]
    fn test_leading_axis() {
        let query = compile("> panel").unwrap();
        assert!(matches!(query.branches()[0].ops[0], Op::Axis(Axis::Child)));
    }

    #[test]
    fn test_multiple_branches() {
        let query = compile("panel, button").unwrap();
        assert!(query.is_multi_match());
        assert_eq!(query.selector(), "panel, button");
    }

    #[test]
    fn test_empty_selector() {
        let query = compile("  ").unwrap();
        assert!(query.is_empty());
        assert!(!query.is_multi_match());
    }

    #[test]
    fn test_nested_selectors_compile_eagerly() {
        let query = compile("button:not(panel[foo])").unwrap();
        assert!(matches!(
            &query.branches()[0].ops[1],
            Op::Filter(Filter::Pseudo(PseudoFilter::Not(_)))
        ));
        let err = compile("button:not(panel[)").unwrap_err();
        assert!(matches!(err, SelectorSyntaxError::Unterminated { .. }));
        let query = compile(":any(panel|button)").unwrap();
        assert!(matches!(
            &query.branches()[0].ops[0],
            Op::Filter(Filter::Pseudo(PseudoFilter::Any(alts))) if alts.len() == 2
        ));
    }

    #[test]
    fn test_pseudo_errors() {
        assert!(matches!(
            compile("panel:bogus").unwrap_err(),
            SelectorSyntaxError::UnknownPseudo { ref name, .. } if name == "bogus"
        ));
        assert!(matches!(
            compile("panel:nth-child(x2)").unwrap_err(),
            SelectorSyntaxError::InvalidPseudoArgument { .. }
        ));
        assert!(matches!(
            compile("panel:not()").unwrap_err(),
            SelectorSyntaxError::InvalidPseudoArgument { .. }
        ));
        assert!(matches!(
            compile("panel:nth(0)").unwrap_err(),
            SelectorSyntaxError::InvalidPseudoArgument { .. }
        ));
    }

    #[test]
    fn test_regex_and_expression_errors() {
        assert!(matches!(
            compile("[title/=\"(\"]").unwrap_err(),
            SelectorSyntaxError::InvalidRegex { .. }
        ));
        assert!(matches!(
            compile("{width >}").unwrap_err(),
            SelectorSyntaxError::InvalidExpression { .. }
        ));
    }

    #[test]
    fn test_custom_pseudo_overrides_builtin() {
        let pseudos = PseudoRegistry::new();
        pseudos.register(
            "first",
            Arc::new(|_: &dyn ComponentAccess, items: &[NodeId], _: &str| items.to_vec()),
        );
        let regexes = RegexCache::new(EngineConfig::default().regex_capacity());
        let query = Compiler::new(&pseudos, &regexes).compile("panel:first").unwrap();
        assert!(matches!(
            &query.branches()[0].ops[1],
            Op::Filter(Filter::Pseudo(PseudoFilter::Custom(c))) if c.name == "first"
        ));
    }

    #[test]
    fn test_query_cache_is_used() {
        let pseudos = PseudoRegistry::new();
        let regexes = RegexCache::new(EngineConfig::default().regex_capacity());
        let cache = QueryCache::new(EngineConfig::default().query_capacity());
        let compiler = Compiler::new(&pseudos, &regexes).with_query_cache(&cache);
        let first = compiler.compile(" panel ").unwrap();
        let second = compiler.compile("panel").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
    }
}
