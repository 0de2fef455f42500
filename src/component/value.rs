//! Component Property Values
//!
//! Attribute filters and member expressions read component properties as one
//! of a closed set of runtime types. Selector literals are always text; they
//! are coerced to the type of the live property before comparison.

/// A property value read from a component
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Explicit null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Floating-point number
    Number(f64),
    /// Text
    String(String),
    /// Timestamp in milliseconds since the Unix epoch
    Date(i64),
    /// List of tokens (e.g. a class list)
    List(Vec<String>),
}

impl PropertyValue {
    /// JavaScript-style truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Null => false,
            PropertyValue::Bool(b) => *b,
            PropertyValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropertyValue::String(s) => !s.is_empty(),
            PropertyValue::Date(_) => true,
            PropertyValue::List(_) => true,
        }
    }

    /// Numeric view of the value
    pub fn to_number(&self) -> f64 {
        match self {
            PropertyValue::Null => 0.0,
            PropertyValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            PropertyValue::Number(n) => *n,
            PropertyValue::String(s) => parse_number(s),
            PropertyValue::Date(ms) => *ms as f64,
            PropertyValue::List(list) => match list.as_slice() {
                [] => 0.0,
                [single] => parse_number(single),
                _ => f64::NAN,
            },
        }
    }

    /// Text view of the value, used by the string operators and regex tests
    pub fn to_string_value(&self) -> String {
        match self {
            PropertyValue::Null => "null".to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Number(n) => format_number(*n),
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Date(ms) => ms.to_string(),
            PropertyValue::List(list) => list.join(","),
        }
    }

    /// Coerce selector text to this value's runtime type.
    ///
    /// - Number: parsed as `f64` (unparseable text becomes NaN)
    /// - Bool: `""` and `"false"` are false, anything else true
    /// - Null: `""` and `"null"` become null, anything else stays text
    /// - Date: numeric text is a millisecond timestamp, anything else stays text
    /// - String and List: unchanged text
    pub fn coerce_literal(&self, literal: &str) -> PropertyValue {
        match self {
            PropertyValue::Number(_) => PropertyValue::Number(parse_number(literal)),
            PropertyValue::Bool(_) => {
                PropertyValue::Bool(!(literal.is_empty() || literal == "false"))
            }
            PropertyValue::Null => {
                if literal.is_empty() || literal == "null" {
                    PropertyValue::Null
                } else {
                    PropertyValue::String(literal.to_string())
                }
            }
            PropertyValue::Date(_) => match literal.trim().parse::<i64>() {
                Ok(ms) => PropertyValue::Date(ms),
                Err(_) => PropertyValue::String(literal.to_string()),
            },
            PropertyValue::String(_) | PropertyValue::List(_) => {
                PropertyValue::String(literal.to_string())
            }
        }
    }

    /// Equality after coercion: `other` is first brought to this value's type.
    pub fn loose_eq(&self, other: &PropertyValue) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Null, _) | (_, PropertyValue::Null) => false,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Date(a), PropertyValue::Date(b)) => a == b,
            (PropertyValue::List(a), PropertyValue::List(b)) => a == b,
            (PropertyValue::Number(_), _)
            | (_, PropertyValue::Number(_))
            | (PropertyValue::Bool(_), _)
            | (_, PropertyValue::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.to_string_value() == other.to_string_value(),
        }
    }

    /// Whitespace-separated tokens of the value (split on ASCII space only)
    pub fn tokens(&self) -> Vec<String> {
        match self {
            PropertyValue::List(list) => list.clone(),
            PropertyValue::String(s) => s.split(' ').map(str::to_string).collect(),
            other => vec![other.to_string_value()],
        }
    }
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(list: Vec<&str>) -> Self {
        PropertyValue::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(list: Vec<String>) -> Self {
        PropertyValue::List(list)
    }
}
