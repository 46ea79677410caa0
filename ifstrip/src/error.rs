use thiserror::Error;

use crate::token::TokenKind;

/// Broad class of an expression error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The characters could not be split into tokens
    Lexical,
    /// The tokens do not form a valid expression
    Grammar,
}

/// A token sequence that breaks the expression grammar
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarViolation {
    /// A token that may not follow the previous one
    #[error("expected {expected} after {previous}, but got {found}")]
    UnexpectedToken {
        /// The previous token, or the start of the expression
        previous: PreviousToken,
        /// Kind of the rejected token
        found: TokenKind,
        /// Human-readable list of the kinds that would have been accepted
        expected: &'static str,
    },
    /// A `)` without a matching `(`
    #[error("unexpected close bracket")]
    UnexpectedCloseBracket,
    /// More `(` than `)` at the end of the expression
    #[error("there are {0} more open than close brackets")]
    UnclosedBrackets(usize),
    /// No tokens at all
    #[error("the expression is empty")]
    Empty,
    /// The expression ends with an operator or open bracket
    #[error("the expression is not finished")]
    Unfinished,
    /// A lone token that is not a symbol
    #[error("an expression with a single token must be a symbol")]
    SingleTokenNotSymbol,
}

/// Token preceding a rejected one, used in diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviousToken {
    /// Nothing was added yet
    Start,
    /// A token of the given kind
    Token(TokenKind),
}

impl std::fmt::Display for PreviousToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviousToken::Start => f.write_str("the start of the expression"),
            PreviousToken::Token(kind) => write!(f, "{kind}"),
        }
    }
}

/// Errors raised while tokenizing or parsing a guard expression
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character inside a symbol that is not a letter, digit, or underscore
    #[error("the expression \"{expression}\" contains an invalid symbol character '{character}' at position {position}")]
    InvalidSymbolCharacter {
        /// Full expression text
        expression: String,
        /// Character position (0-based) of the offending character
        position: usize,
        /// The offending character
        character: char,
    },
    /// A character that cannot start any token
    #[error("the expression \"{expression}\" contains an unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// Full expression text
        expression: String,
        /// Character position (0-based) of the offending character
        position: usize,
        /// The offending character
        character: char,
    },
    /// `&` or `|` followed by a different character
    #[error("the expression \"{expression}\" contains no second character for {operator} at position {position}")]
    MalformedOperator {
        /// Full expression text
        expression: String,
        /// Operator that was expected (`&&` or `||`)
        operator: &'static str,
        /// Character position (0-based) where the second character was expected
        position: usize,
    },
    /// `&` or `|` as the last character
    #[error("the expression \"{expression}\" ends with an incomplete {operator} at position {position}")]
    UnterminatedOperator {
        /// Full expression text
        expression: String,
        /// Operator that was expected (`&&` or `||`)
        operator: &'static str,
        /// Character position (0-based) of the lone operator character
        position: usize,
    },
    /// The token sequence breaks the grammar
    #[error("the expression \"{expression}\" is erroneous: {violation}")]
    Grammar {
        /// Full expression text
        expression: String,
        /// What was wrong
        violation: GrammarViolation,
    },
    /// The tree builder found no operator or removable brackets in a sub-range
    #[error("\"{expression}\" cannot be parsed to a valid preprocessor expression")]
    Unparsable {
        /// Full expression text
        expression: String,
    },
    /// Brackets nest deeper than the configured limit
    #[error("the expression \"{expression}\" nests deeper than the limit of {limit}")]
    NestingTooDeep {
        /// Full expression text
        expression: String,
        /// The configured limit
        limit: usize,
    },
}

impl ParseError {
    /// Whether this is a lexical or a grammar error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            ParseError::InvalidSymbolCharacter { .. }
            | ParseError::UnexpectedCharacter { .. }
            | ParseError::MalformedOperator { .. }
            | ParseError::UnterminatedOperator { .. } => ErrorCategory::Lexical,
            ParseError::Grammar { .. }
            | ParseError::Unparsable { .. }
            | ParseError::NestingTooDeep { .. } => ErrorCategory::Grammar,
        }
    }

    /// The expression text this error refers to
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            ParseError::InvalidSymbolCharacter { expression, .. }
            | ParseError::UnexpectedCharacter { expression, .. }
            | ParseError::MalformedOperator { expression, .. }
            | ParseError::UnterminatedOperator { expression, .. }
            | ParseError::Grammar { expression, .. }
            | ParseError::Unparsable { expression }
            | ParseError::NestingTooDeep { expression, .. } => expression,
        }
    }

    /// The grammar violation, if this is a token-sequence error
    #[must_use]
    pub const fn violation(&self) -> Option<&GrammarViolation> {
        match self {
            ParseError::Grammar { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// Errors raised while scanning directive lines or resolving `#if` chains
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// A `#` line that is none of `if`, `elif`, `else`, `endif`
    #[error("\"{text}\" on line {line} cannot be parsed to a valid preprocessor directive")]
    UnknownDirective {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
    },
    /// `#if` or `#elif` without an expression
    #[error("\"{text}\" on line {line} has no expression")]
    MissingExpression {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
    },
    /// The guard expression is invalid
    #[error("invalid expression in \"{text}\" on line {line}")]
    InvalidExpression {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
        /// Underlying expression error
        #[source]
        source: ParseError,
    },
    /// `#elif`/`#else`/`#endif` without an open `#if`, or after an `#else`
    #[error("unexpected preprocessor directive \"{text}\" on line {line}")]
    UnexpectedDirective {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
    },
    /// End of input inside an open `#if`
    #[error("could not find #endif directive for \"{text}\" on line {line}")]
    MissingEndIf {
        /// 1-based line number of the opening `#if`
        line: usize,
        /// Text of the opening `#if` line
        text: String,
    },
    /// Non-whitespace text after `#else`/`#endif` with trailing text rejected
    #[error("unexpected text after directive \"{text}\" on line {line}")]
    TrailingText {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
    },
    /// Directive blocks nest deeper than the configured limit
    #[error("\"{text}\" on line {line} nests deeper than the limit of {limit}")]
    NestingTooDeep {
        /// 1-based line number
        line: usize,
        /// Line text without terminator
        text: String,
        /// The configured limit
        limit: usize,
    },
}

impl DirectiveError {
    /// 1-based line number the error refers to
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            DirectiveError::UnknownDirective { line, .. }
            | DirectiveError::MissingExpression { line, .. }
            | DirectiveError::InvalidExpression { line, .. }
            | DirectiveError::UnexpectedDirective { line, .. }
            | DirectiveError::MissingEndIf { line, .. }
            | DirectiveError::TrailingText { line, .. }
            | DirectiveError::NestingTooDeep { line, .. } => *line,
        }
    }

    /// The underlying expression error, if any
    #[must_use]
    pub const fn parse_error(&self) -> Option<&ParseError> {
        match self {
            DirectiveError::InvalidExpression { source, .. } => Some(source),
            _ => None,
        }
    }
}
