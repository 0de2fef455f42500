//! Member Expressions
//!
//! `{expr}` filters keep components for which a boolean expression is truthy.
//! Expressions use a small closed grammar and are parsed once at compile time:
//!
//! ```text
//! expr    := and ("||" and)*
//! and     := unary ("&&" unary)*
//! unary   := "!" unary | compare
//! compare := primary (("==" | "===" | "!=" | "!==" | "<" | "<=" | ">" | ">=") primary)?
//! primary := ident "(" ")" | ident ("." ident)* | number | string
//!          | "true" | "false" | "null" | "(" expr ")"
//! ```
//!
//! A leading `this.` is ignored. `name()` calls
//! [`ComponentAccess::call_method`]; anything else reads a property.

use crate::component::{ComponentAccess, NodeId, PropertyValue};
use std::cmp::Ordering;

/// Expression token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Or,        // ||
    And,       // &&
    Not,       // !
    Eq,        // ==
    StrictEq,  // ===
    NotEq,     // !=
    StrictNe,  // !==
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Dot,       // .
    LeftParen,
    RightParen,
    Number(f64),
    String(String),
    Ident(String),
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
    }

    /// Consume `text` if the input starts with it
    fn eat(&mut self, text: &str) -> bool {
        if self.remaining().starts_with(text) {
            self.advance(text.len());
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '|' if self.eat("||") => Token::Or,
            '&' if self.eat("&&") => Token::And,
            '=' if self.eat("===") => Token::StrictEq,
            '=' if self.eat("==") => Token::Eq,
            '!' if self.eat("!==") => Token::StrictNe,
            '!' if self.eat("!=") => Token::NotEq,
            '!' if self.eat("!") => Token::Not,
            '<' if self.eat("<=") => Token::LtEq,
            '<' if self.eat("<") => Token::Lt,
            '>' if self.eat(">=") => Token::GtEq,
            '>' if self.eat(">") => Token::Gt,
            '(' if self.eat("(") => Token::LeftParen,
            ')' if self.eat(")") => Token::RightParen,
            '"' | '\'' => self.read_string(c)?,
            c if c.is_ascii_digit() => self.read_number()?,
            '.' if self.eat(".") => Token::Dot,
            c if c.is_alphabetic() || c == '_' || c == '$' => self.read_ident(),
            other => return Err(format!("unexpected character '{}'", other)),
        };
        Ok(token)
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        self.advance(1);
        let mut value = String::new();
        let mut chars = self.remaining().char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            } else if c == quote {
                self.advance(i + 1);
                return Ok(Token::String(value));
            } else {
                value.push(c);
            }
        }
        Err("unterminated string literal".to_string())
    }

    fn read_number(&mut self) -> Result<Token, String> {
        let rest = self.remaining();
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let text = &rest[..len];
        let number = text
            .parse::<f64>()
            .map_err(|_| format!("invalid number '{}'", text))?;
        self.advance(len);
        Ok(Token::Number(number))
    }

    fn read_ident(&mut self) -> Token {
        let rest = self.remaining();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        self.advance(len);
        Token::Ident(rest[..len].to_string())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    StrictEq,
    NotEq,
    StrictNe,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Member expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum MemberExpr {
    Or(Box<MemberExpr>, Box<MemberExpr>),
    And(Box<MemberExpr>, Box<MemberExpr>),
    Not(Box<MemberExpr>),
    Compare(Box<MemberExpr>, CompareOp, Box<MemberExpr>),
    /// Property read; dotted paths are passed to the host verbatim
    Property(String),
    /// Zero-argument method call
    Call(String),
    Literal(PropertyValue),
    Undefined,
}

/// Parse an expression body (the text between `{` and `}`)
pub fn parse(source: &str) -> Result<MemberExpr, String> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_or()?;
    if parser.current != Token::Eof {
        return Err(format!("unexpected token {:?}", parser.current));
    }
    Ok(expr)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, String> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, String> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        if self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(format!("expected {:?}, found {:?}", expected, self.current))
        }
    }

    fn parse_or(&mut self) -> Result<MemberExpr, String> {
        let mut left = self.parse_and()?;
        while self.current == Token::Or {
            self.advance()?;
            let right = self.parse_and()?;
            left = MemberExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<MemberExpr, String> {
        let mut left = self.parse_unary()?;
        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_unary()?;
            left = MemberExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<MemberExpr, String> {
        if self.current == Token::Not {
            self.advance()?;
            let inner = self.parse_unary()?;
            return Ok(MemberExpr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<MemberExpr, String> {
        let left = self.parse_primary()?;
        let op = match self.current {
            Token::Eq => CompareOp::Eq,
            Token::StrictEq => CompareOp::StrictEq,
            Token::NotEq => CompareOp::NotEq,
            Token::StrictNe => CompareOp::StrictNe,
            Token::Lt => CompareOp::Lt,
            Token::LtEq => CompareOp::LtEq,
            Token::Gt => CompareOp::Gt,
            Token::GtEq => CompareOp::GtEq,
            _ => return Ok(left),
        };
        self.advance()?;
        let right = self.parse_primary()?;
        Ok(MemberExpr::Compare(Box::new(left), op, Box::new(right)))
    }

    fn parse_primary(&mut self) -> Result<MemberExpr, String> {
        match self.advance()? {
            Token::Number(n) => Ok(MemberExpr::Literal(PropertyValue::Number(n))),
            Token::String(s) => Ok(MemberExpr::Literal(PropertyValue::String(s))),
            Token::LeftParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Token::Ident(name) => self.parse_member(name),
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn parse_member(&mut self, first: String) -> Result<MemberExpr, String> {
        match first.as_str() {
            "true" => return Ok(MemberExpr::Literal(PropertyValue::Bool(true))),
            "false" => return Ok(MemberExpr::Literal(PropertyValue::Bool(false))),
            "null" => return Ok(MemberExpr::Literal(PropertyValue::Null)),
            "undefined" => return Ok(MemberExpr::Undefined),
            _ => {}
        }

        let mut path = Vec::new();
        if first != "this" {
            path.push(first);
        }
        while self.current == Token::Dot {
            self.advance()?;
            match self.advance()? {
                Token::Ident(name) => path.push(name),
                other => return Err(format!("expected member name, found {:?}", other)),
            }
        }
        if path.is_empty() {
            return Err("bare 'this' is not a member".to_string());
        }

        let name = path.join(".");
        if self.current == Token::LeftParen {
            self.advance()?;
            self.expect(Token::RightParen)?;
            if path.len() > 1 {
                return Err(format!("cannot call nested member '{}'", name));
            }
            return Ok(MemberExpr::Call(name));
        }
        Ok(MemberExpr::Property(name))
    }
}

impl MemberExpr {
    /// Evaluate against one component; `None` is an undefined value
    pub fn evaluate<D: ComponentAccess + ?Sized>(
        &self,
        doc: &D,
        id: NodeId,
    ) -> Option<PropertyValue> {
        match self {
            MemberExpr::Or(left, right) => {
                let l = left.evaluate(doc, id);
                if truthy(&l) {
                    l
                } else {
                    right.evaluate(doc, id)
                }
            }
            MemberExpr::And(left, right) => {
                let l = left.evaluate(doc, id);
                if truthy(&l) {
                    right.evaluate(doc, id)
                } else {
                    l
                }
            }
            MemberExpr::Not(inner) => Some(PropertyValue::Bool(!truthy(&inner.evaluate(doc, id)))),
            MemberExpr::Compare(left, op, right) => {
                let l = left.evaluate(doc, id);
                let r = right.evaluate(doc, id);
                Some(PropertyValue::Bool(compare(&l, *op, &r)))
            }
            MemberExpr::Property(name) => doc.property(id, name),
            MemberExpr::Call(name) => doc.call_method(id, name),
            MemberExpr::Literal(value) => Some(value.clone()),
            MemberExpr::Undefined => None,
        }
    }

    /// Whether the expression is truthy for a component
    pub fn matches<D: ComponentAccess + ?Sized>(&self, doc: &D, id: NodeId) -> bool {
        truthy(&self.evaluate(doc, id))
    }
}

fn truthy(value: &Option<PropertyValue>) -> bool {
    value.as_ref().map(PropertyValue::is_truthy).unwrap_or(false)
}

fn compare(left: &Option<PropertyValue>, op: CompareOp, right: &Option<PropertyValue>) -> bool {
    match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::NotEq => !loose_eq(left, right),
        CompareOp::StrictEq => left == right,
        CompareOp::StrictNe => left != right,
        CompareOp::Lt | CompareOp::LtEq | CompareOp::Gt | CompareOp::GtEq => {
            let (Some(l), Some(r)) = (left, right) else {
                return false;
            };
            let ordering = match (l, r) {
                (PropertyValue::String(a), PropertyValue::String(b)) => Some(a.cmp(b)),
                _ => l.to_number().partial_cmp(&r.to_number()),
            };
            match ordering {
                Some(Ordering::Less) => matches!(op, CompareOp::Lt | CompareOp::LtEq),
                Some(Ordering::Equal) => matches!(op, CompareOp::LtEq | CompareOp::GtEq),
                Some(Ordering::Greater) => matches!(op, CompareOp::Gt | CompareOp::GtEq),
                None => false,
            }
        }
    }
}

/// `undefined` and `null` are loosely equal to each other and nothing else
fn loose_eq(left: &Option<PropertyValue>, right: &Option<PropertyValue>) -> bool {
    match (left, right) {
        (None, None) => true,
        (None, Some(v)) | (Some(v), None) => *v == PropertyValue::Null,
        (Some(l), Some(r)) => l.loose_eq(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentTree};

    fn tree() -> (ComponentTree, NodeId) {
        let mut tree = ComponentTree::new();
        let id = tree.add(
            None,
            Component::new("textfield-1024", "field/textfield")
                .prop("width", 200)
                .prop("title", "Orders")
                .method("getValue", "abc")
                .prop("hidden", true),
        );
        (tree, id)
    }

    fn eval(source: &str) -> bool {
        let (tree, id) = tree();
        parse(source).unwrap().matches(&tree, id)
    }

    #[test]
    fn test_property_and_method() {
        assert!(eval("title"));
        assert!(eval("isHidden()"));
        assert!(eval("this.isHidden()"));
        assert!(!eval("missing"));
        assert!(eval("getValue() === 'abc'"));
    }

    #[test]
    fn test_comparisons() {
        assert!(eval("id=='textfield-1024'"));
        assert!(eval("width > 100 && width <= 200"));
        assert!(!eval("width < 100"));
        assert!(eval("width == '200'"));
        assert!(!eval("width === '200'"));
        assert!(eval("missing == null"));
        assert!(!eval("missing === null"));
    }

    #[test]
    fn test_logic_and_grouping() {
        assert!(eval("!missing"));
        assert!(eval("missing || title"));
        assert!(eval("!(width > 300) && (title != 'x')"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("width >").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("foo(").is_err());
        assert!(parse("'open").is_err());
        assert!(parse("x + 1").is_err());
        assert!(parse("this").is_err());
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(
            parse("this.store.count").unwrap(),
            MemberExpr::Property("store.count".to_string())
        );
    }
}
