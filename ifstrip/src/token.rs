use std::fmt;

/// The logical NOT operator
pub const NOT_OPERATOR: &str = "!";
/// The logical AND operator
pub const AND_OPERATOR: &str = "&&";
/// The logical OR operator
pub const OR_OPERATOR: &str = "||";
/// Bracket opening a sub-expression
pub const OPEN_BRACKET: &str = "(";
/// Bracket closing a sub-expression
pub const CLOSE_BRACKET: &str = ")";

pub(crate) const AND_CHARACTER: char = '&';
pub(crate) const OR_CHARACTER: char = '|';
pub(crate) const NOT_CHARACTER: char = '!';
pub(crate) const OPEN_BRACKET_CHARACTER: char = '(';
pub(crate) const CLOSE_BRACKET_CHARACTER: char = ')';

/// Check if a character can start a symbol (letter or underscore)
pub fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue a symbol (letter, digit, or underscore)
pub fn is_symbol_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check if a character ends a symbol without being part of it
pub(crate) fn is_symbol_terminator(c: char) -> bool {
    c.is_whitespace()
        || c == AND_CHARACTER
        || c == OR_CHARACTER
        || c == CLOSE_BRACKET_CHARACTER
}

/// Kind of a lexeme in a guard expression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A preprocessor symbol such as `DEBUG`
    Symbol,
    /// `!`
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `(`
    OpenBracket,
    /// `)`
    CloseBracket,
}

impl TokenKind {
    /// How loosely an operator binds; higher splits an expression first.
    /// Brackets and symbols are not operators.
    pub(crate) const fn binding_rank(self) -> Option<u8> {
        match self {
            TokenKind::Not => Some(1),
            TokenKind::And => Some(2),
            TokenKind::Or => Some(3),
            TokenKind::Symbol | TokenKind::OpenBracket | TokenKind::CloseBracket => None,
        }
    }

    /// Fixed spelling of an operator or bracket, `None` for symbols
    #[must_use]
    pub const fn spelling(self) -> Option<&'static str> {
        match self {
            TokenKind::Symbol => None,
            TokenKind::Not => Some(NOT_OPERATOR),
            TokenKind::And => Some(AND_OPERATOR),
            TokenKind::Or => Some(OR_OPERATOR),
            TokenKind::OpenBracket => Some(OPEN_BRACKET),
            TokenKind::CloseBracket => Some(CLOSE_BRACKET),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Symbol => f.write_str("symbol"),
            TokenKind::Not => f.write_str("not operator"),
            TokenKind::And => f.write_str("and operator"),
            TokenKind::Or => f.write_str("or operator"),
            TokenKind::OpenBracket => f.write_str("open bracket"),
            TokenKind::CloseBracket => f.write_str("close bracket"),
        }
    }
}

/// One classified lexeme, borrowing symbol text from the expression source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token<'a> {
    kind: TokenKind,
    text: Option<&'a str>,
}

impl<'a> Token<'a> {
    /// Create a symbol token
    #[must_use]
    pub const fn symbol(text: &'a str) -> Self {
        Token {
            kind: TokenKind::Symbol,
            text: Some(text),
        }
    }

    /// Create an operator or bracket token.
    ///
    /// # Panics
    /// Panics in debug builds when called with [`TokenKind::Symbol`]; use
    /// [`Token::symbol`] for those.
    #[must_use]
    pub const fn operator(kind: TokenKind) -> Self {
        debug_assert!(!matches!(kind, TokenKind::Symbol));
        Token { kind, text: None }
    }

    /// The kind of this token
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Symbol text, present only for symbol tokens
    #[must_use]
    pub const fn symbol_text(&self) -> Option<&'a str> {
        self.text
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.text, self.kind.spelling()) {
            (Some(text), _) => write!(f, "symbol \"{text}\""),
            (None, Some(spelling)) => write!(f, "{} \"{spelling}\"", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}
