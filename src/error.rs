//! Selector Errors
//!
//! Every failure the engine can report is a compile-time syntax error.
//! Execution never fails: an empty match is an empty result.

/// A selector string could not be compiled.
///
/// Every variant carries the full selector text that was being compiled so
/// the message is useful without further context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorSyntaxError {
    #[error("Invalid selector \"{selector}\": unrecognized input at \"{remainder}\"")]
    Unmatched { selector: String, remainder: String },

    #[error("Invalid selector \"{selector}\": empty selector segment")]
    EmptySegment { selector: String },

    #[error("Invalid selector \"{selector}\": missing closing '{delimiter}' in \"{remainder}\"")]
    Unterminated {
        selector: String,
        remainder: String,
        delimiter: char,
    },

    #[error(
        "Invalid selector \"{selector}\": combinator '{combinator}' is not followed by a selector"
    )]
    DanglingCombinator { selector: String, combinator: char },

    #[error("Invalid selector \"{selector}\": unknown pseudo-class \":{name}\"")]
    UnknownPseudo { selector: String, name: String },

    #[error("Invalid selector \"{selector}\": bad argument \"{argument}\" for \":{name}\"")]
    InvalidPseudoArgument {
        selector: String,
        name: String,
        argument: String,
    },

    #[error("Invalid selector \"{selector}\": bad regular expression /{pattern}/: {message}")]
    InvalidRegex {
        selector: String,
        pattern: String,
        message: String,
    },

    #[error("Invalid selector \"{selector}\": bad member expression {{{expression}}}: {message}")]
    InvalidExpression {
        selector: String,
        expression: String,
        message: String,
    },
}

impl SelectorSyntaxError {
    /// The selector text that failed to compile
    pub fn selector(&self) -> &str {
        match self {
            Self::Unmatched { selector, .. }
            | Self::EmptySegment { selector }
            | Self::Unterminated { selector, .. }
            | Self::DanglingCombinator { selector, .. }
            | Self::UnknownPseudo { selector, .. }
            | Self::InvalidPseudoArgument { selector, .. }
            | Self::InvalidRegex { selector, .. }
            | Self::InvalidExpression { selector, .. } => selector,
        }
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SelectorSyntaxError>;
