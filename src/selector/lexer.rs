//! Selector Lexer
//!
//! Tokenizes one comma-free selector segment. Simple selectors are recognized
//! by an ordered matcher registry: at the start of a compound the head matcher
//! (type or `#id`) gets the first try, then the matchers in `MATCHERS` are
//! tried in order and the first one that accepts the input wins.

use crate::error::{Result, SelectorSyntaxError};
use memchr::memchr;
use std::borrow::Cow;

/// Combinator between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any descendant
    Descendant,
    /// `>`: direct child
    Child,
    /// `^`: any ancestor
    Ancestor,
}

/// Attribute comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Eq,         // =
    NotEq,      // !=
    StartsWith, // ^=
    EndsWith,   // $=
    Contains,   // *=
    Modulo,     // %=
    Token,      // ~=
    Regex,      // /=
}

impl AttrOp {
    /// Operator whose symbol is `c` followed by `=`
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '!' => Some(AttrOp::NotEq),
            '^' => Some(AttrOp::StartsWith),
            '$' => Some(AttrOp::EndsWith),
            '*' => Some(AttrOp::Contains),
            '%' => Some(AttrOp::Modulo),
            '~' => Some(AttrOp::Token),
            '/' => Some(AttrOp::Regex),
            _ => None,
        }
    }
}

/// Selector token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Combinator between compounds
    Combinator(Combinator),
    /// Type (xtype) name or `*`, with the exact-type flag
    Type { name: String, exact: bool },
    /// `#id`
    Id(String),
    /// `[prop op value]`; `property` keeps its `@`/`?` prefix
    Attribute {
        property: String,
        op: Option<AttrOp>,
        value: Option<String>,
    },
    /// `:name` or `:name(arg)`; the argument is kept raw (still escaped)
    Pseudo { name: String, arg: Option<String> },
    /// `{expression}`
    Member(String),
}

/// One entry of the matcher registry
type Matcher = fn(&mut Lexer<'_>) -> Result<Option<Token>>;

/// Matchers tried after the compound head, in priority order
const MATCHERS: [(&str, Matcher); 5] = [
    ("dotted-type", |lx| lx.match_dotted_type()),
    ("attribute", |lx| lx.match_attribute()),
    ("id", |lx| lx.match_id()),
    ("pseudo", |lx| lx.match_pseudo()),
    ("member", |lx| lx.match_member()),
];

/// Selector lexer over one segment
pub struct Lexer<'a> {
    /// Full selector text, for diagnostics
    selector: &'a str,
    input: &'a str,
    pos: usize,
    /// True at the start of the segment and right after a combinator
    compound_start: bool,
    last_was_combinator: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `segment`, reporting errors against `selector`
    pub fn new(selector: &'a str, segment: &'a str) -> Self {
        Lexer {
            selector,
            input: segment,
            pos: 0,
            compound_start: true,
            last_was_combinator: false,
        }
    }

    /// Get the remaining input
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Peek at current character
    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advance by n bytes
    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace, returning whether any was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        self.pos != start
    }

    fn unmatched(&self) -> SelectorSyntaxError {
        SelectorSyntaxError::Unmatched {
            selector: self.selector.to_string(),
            remainder: self.remaining().to_string(),
        }
    }

    fn unterminated(&self, from: usize, delimiter: char) -> SelectorSyntaxError {
        SelectorSyntaxError::Unterminated {
            selector: self.selector.to_string(),
            remainder: self.input[from..].to_string(),
            delimiter,
        }
    }

    /// Get the next token, or `None` at the end of the segment
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let skipped = self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => {
                if self.last_was_combinator {
                    return Err(self.dangling());
                }
                return Ok(None);
            }
        };

        // `>>` and `> ^` chain one axis step per symbol
        if c == '>' || c == '^' {
            self.advance(1);
            self.skip_whitespace();
            let combinator = if c == '>' {
                Combinator::Child
            } else {
                Combinator::Ancestor
            };
            return Ok(Some(self.combinator(combinator)));
        }

        if skipped && !self.compound_start {
            return Ok(Some(self.combinator(Combinator::Descendant)));
        }

        let start = self.pos;
        let token = self.match_simple()?;
        if self.pos == start {
            // A matcher that consumes nothing would loop forever
            return Err(self.unmatched());
        }
        self.compound_start = false;
        self.last_was_combinator = false;
        Ok(Some(token))
    }

    /// Tokenize the entire segment
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn combinator(&mut self, combinator: Combinator) -> Token {
        self.compound_start = true;
        self.last_was_combinator = true;
        Token::Combinator(combinator)
    }

    fn dangling(&self) -> SelectorSyntaxError {
        let combinator = self.input.trim_end().chars().last().unwrap_or(' ');
        SelectorSyntaxError::DanglingCombinator {
            selector: self.selector.to_string(),
            combinator,
        }
    }

    /// Run the head matcher (at compound start) and then the registry
    fn match_simple(&mut self) -> Result<Token> {
        if self.compound_start {
            if let Some(token) = self.match_head() {
                return Ok(token);
            }
        }

        for (name, matcher) in MATCHERS {
            if let Some(token) = matcher(self)? {
                tracing::trace!(matcher = name, ?token, "matched selector fragment");
                return Ok(token);
            }
        }

        Err(self.unmatched())
    }

    /// Compound head: `type`, `*`, or `#id`, with optional `(true|false)`
    fn match_head(&mut self) -> Option<Token> {
        let rest = self.remaining();
        if let Some(after) = rest.strip_prefix('#') {
            let (len, name) = scan_name(after)?;
            self.advance(1 + len);
            return Some(Token::Id(name));
        }
        if rest.starts_with('*') {
            self.advance(1);
            let exact = self.scan_exact_flag();
            return Some(Token::Type {
                name: "*".to_string(),
                exact,
            });
        }
        let (len, name) = scan_name(rest)?;
        self.advance(len);
        let exact = self.scan_exact_flag();
        Some(Token::Type { name, exact })
    }

    /// Deprecated `.type` form
    fn match_dotted_type(&mut self) -> Result<Option<Token>> {
        let Some(after) = self.remaining().strip_prefix('.') else {
            return Ok(None);
        };
        let Some((len, name)) = scan_name(after) else {
            return Ok(None);
        };
        self.advance(1 + len);
        let exact = self.scan_exact_flag();
        tracing::warn!(
            selector = self.selector,
            "\".{}\" selector style is deprecated, use \"{}\" without the leading dot instead",
            name,
            name
        );
        Ok(Some(Token::Type { name, exact }))
    }

    /// `[prop]`, `[prop op value]`, `[prop op "value"]`
    fn match_attribute(&mut self) -> Result<Option<Token>> {
        if self.peek() != Some('[') {
            return Ok(None);
        }
        let open = self.pos;
        self.advance(1);
        self.skip_whitespace();

        let mut property = String::new();
        if let Some(c @ ('@' | '?' | '$')) = self.peek() {
            property.push(c);
            self.advance(1);
        }
        match scan_name(self.remaining()) {
            Some((len, name)) => {
                property.push_str(&name);
                self.advance(len);
            }
            None if property == "$" => {}
            None => {
                if self.remaining().is_empty() {
                    return Err(self.unterminated(open, ']'));
                }
                self.pos = open;
                return Err(self.unmatched());
            }
        }
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.advance(1);
            return Ok(Some(Token::Attribute {
                property,
                op: None,
                value: None,
            }));
        }

        let mut chars = self.remaining().chars();
        let operator = match (chars.next(), chars.next()) {
            (Some('='), _) => Some((AttrOp::Eq, 1)),
            (Some(c), Some('=')) => AttrOp::from_prefix(c).map(|op| (op, 2)),
            _ => None,
        };
        let Some((op, op_len)) = operator else {
            return self.bad_attribute(open);
        };
        self.advance(op_len);
        self.skip_whitespace();

        let value = self.scan_attribute_value(open)?;
        Ok(Some(Token::Attribute {
            property,
            op: Some(op),
            value: Some(value),
        }))
    }

    fn bad_attribute(&mut self, open: usize) -> Result<Option<Token>> {
        if !self.remaining().contains(']') {
            return Err(self.unterminated(open, ']'));
        }
        self.pos = open;
        Err(self.unmatched())
    }

    /// Attribute value up to the closing `]`; quotes are optional.
    fn scan_attribute_value(&mut self, open: usize) -> Result<String> {
        let rest = self.remaining();

        if let Some(quote @ ('"' | '\'')) = rest.chars().next() {
            if let Some(end) = find_unescaped(&rest[1..], quote) {
                let after = rest[1 + end + 1..].trim_start();
                if after.starts_with(']') {
                    let value = unescape(&rest[1..1 + end]).into_owned();
                    let consumed = rest.len() - after.len() + 1;
                    self.advance(consumed);
                    return Ok(value);
                }
            }
        }

        let Some(end) = find_unescaped(rest, ']') else {
            return Err(self.unterminated(open, ']'));
        };
        let raw = rest[..end].trim_end();
        self.warn_unbalanced_quote(raw);
        let value = unescape(raw).into_owned();
        self.advance(end + 1);
        Ok(value)
    }

    fn warn_unbalanced_quote(&self, raw: &str) {
        let first = raw.chars().next();
        let last = raw.chars().last();
        let is_quote = |c: Option<char>| matches!(c, Some('"' | '\''));
        if raw.len() == 1 && is_quote(first) {
            return;
        }
        if is_quote(first) && !is_quote(last) {
            tracing::warn!(
                selector = self.selector,
                "selector has an unescaped ({}) character at the beginning of the attribute \
                 value pattern; escape the quote if it should be matched literally",
                first.unwrap_or('"')
            );
        } else if !is_quote(first)
            && is_quote(last)
            && !raw.ends_with("\\\"")
            && !raw.ends_with("\\'")
        {
            tracing::warn!(
                selector = self.selector,
                "selector has an unescaped ({}) character at the end of the attribute \
                 value pattern; escape the quote if it should be matched literally",
                last.unwrap_or('"')
            );
        }
    }

    /// `#id` anywhere in a compound
    fn match_id(&mut self) -> Result<Option<Token>> {
        let Some(after) = self.remaining().strip_prefix('#') else {
            return Ok(None);
        };
        let Some((len, name)) = scan_name(after) else {
            return Ok(None);
        };
        self.advance(1 + len);
        Ok(Some(Token::Id(name)))
    }

    /// `:name` or `:name(arg)` with balanced parentheses
    fn match_pseudo(&mut self) -> Result<Option<Token>> {
        let Some(after) = self.remaining().strip_prefix(':') else {
            return Ok(None);
        };
        let name_len = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        if name_len == 0 {
            return Ok(None);
        }
        let name = after[..name_len].to_string();
        let open = self.pos;
        self.advance(1 + name_len);

        if self.peek() != Some('(') {
            return Ok(Some(Token::Pseudo { name, arg: None }));
        }

        let body = &self.remaining()[1..];
        let Some(end) = find_closing_paren(body) else {
            return Err(self.unterminated(open, ')'));
        };
        let arg = body[..end].trim().to_string();
        self.advance(1 + end + 1);
        Ok(Some(Token::Pseudo {
            name,
            arg: Some(arg),
        }))
    }

    /// `{expression}`
    fn match_member(&mut self) -> Result<Option<Token>> {
        if self.peek() != Some('{') {
            return Ok(None);
        }
        let body = &self.remaining()[1..];
        let Some(end) = memchr(b'}', body.as_bytes()) else {
            return Err(self.unterminated(self.pos, '}'));
        };
        let expr = body[..end].trim().to_string();
        if expr.is_empty() {
            return Err(self.unmatched());
        }
        self.advance(1 + end + 1);
        Ok(Some(Token::Member(expr)))
    }

    /// Optional `(true)` / `(false)` exact-type flag after a type name
    fn scan_exact_flag(&mut self) -> bool {
        let rest = self.remaining();
        if rest.starts_with("(true)") {
            self.advance(6);
            true
        } else if rest.starts_with("(false)") {
            self.advance(7);
            false
        } else {
            false
        }
    }
}

/// Scan a name of word characters and `-`, allowing `\.` for a literal dot.
///
/// Returns the consumed byte length and the unescaped name.
pub fn scan_name(input: &str) -> Option<(usize, String)> {
    let mut name = String::new();
    let mut chars = input.char_indices();
    let mut end = 0;

    while let Some((i, c)) = chars.next() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            name.push(c);
            end = i + c.len_utf8();
        } else if c == '\\' && input[i + 1..].starts_with('.') {
            chars.next();
            name.push('.');
            end = i + 2;
        } else {
            break;
        }
    }

    if end == 0 {
        None
    } else {
        Some((end, name))
    }
}

/// Remove backslash escapes (`\x` becomes `x`)
pub fn unescape(input: &str) -> Cow<'_, str> {
    if memchr(b'\\', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Byte offset of the first unescaped `target` in `input`
pub fn find_unescaped(input: &str, target: char) -> Option<usize> {
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == target {
            return Some(i);
        }
    }
    None
}

/// Byte offset of the `)` closing an already-opened parenthesis.
///
/// Nested parentheses, brackets, braces, quotes and escapes are skipped.
fn find_closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = input.char_indices();

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
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}
