//! Selector Parser
//!
//! Splits a selector into comma-separated branches and tokenizes each one.

use super::lexer::{Lexer, Token};
use crate::error::{Result, SelectorSyntaxError};

/// One comma-separated alternative
#[derive(Debug, Clone, PartialEq)]
pub struct BranchAst {
    /// Trimmed branch text
    pub source: String,
    pub tokens: Vec<Token>,
}

/// A parsed selector
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorAst {
    /// Trimmed selector text
    pub source: String,
    pub branches: Vec<BranchAst>,
}

/// Parse a selector string.
///
/// An empty (or all-whitespace) selector parses to zero branches.
pub fn parse(selector: &str) -> Result<SelectorAst> {
    let source = selector.trim();
    if source.is_empty() {
        return Ok(SelectorAst {
            source: String::new(),
            branches: Vec::new(),
        });
    }

    let mut branches = Vec::new();
    for segment in split_branches(source) {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(SelectorSyntaxError::EmptySegment {
                selector: source.to_string(),
            });
        }
        let tokens = Lexer::new(source, segment).tokenize()?;
        branches.push(BranchAst {
            source: segment.to_string(),
            tokens,
        });
    }

    Ok(SelectorAst {
        source: source.to_string(),
        branches,
    })
}

/// Split on commas that are not escaped and not nested inside brackets,
/// parentheses, braces or quotes.
pub fn split_branches(selector: &str) -> Vec<&str> {
    split_top_level(selector, ',')
}

/// Split on `separator` outside of escapes, nesting and quotes
pub fn split_top_level(selector: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = selector.char_indices();

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if depth > 0 => quote = Some(c),
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&selector[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&selector[start..]);
    parts
}
