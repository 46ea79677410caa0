use std::fmt;
use std::ops::Index;

use crate::error::{GrammarViolation, PreviousToken};
use crate::token::{Token, TokenKind};

/// Default number of token slots reserved by [`TokenListBuilder::new`]
pub const DEFAULT_TOKEN_CAPACITY: usize = 32;

/// Incrementally filled token buffer that validates adjacency and bracket
/// balance as tokens arrive.
///
/// The backing storage is kept across [`reset`](Self::reset) calls so one
/// builder can serve every expression of a transformation run. It grows
/// when an expression has more tokens than the current capacity.
#[derive(Debug)]
pub struct TokenListBuilder<'a> {
    tokens: Vec<Token<'a>>,
    previous: Option<TokenKind>,
    bracket_balance: usize,
}

impl Default for TokenListBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TokenListBuilder<'a> {
    /// Create a builder with [`DEFAULT_TOKEN_CAPACITY`] slots
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOKEN_CAPACITY)
    }

    /// Create a builder with room for `capacity` tokens before growing
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TokenListBuilder {
            tokens: Vec::with_capacity(capacity),
            previous: None,
            bracket_balance: 0,
        }
    }

    /// Forget all tokens so a new expression can be assembled
    pub fn reset(&mut self) -> &mut Self {
        self.tokens.clear();
        self.previous = None;
        self.bracket_balance = 0;
        self
    }

    /// Number of tokens added since the last reset
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens were added since the last reset
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append a token if it may follow the previous one.
    ///
    /// # Errors
    /// Returns the violated rule when the token is not a legal successor or
    /// closes a bracket that was never opened. The builder is unchanged then.
    pub fn try_add(&mut self, token: Token<'a>) -> Result<(), GrammarViolation> {
        self.check_successor(token.kind())?;
        match token.kind() {
            TokenKind::OpenBracket => self.bracket_balance += 1,
            TokenKind::CloseBracket => {
                self.bracket_balance = self
                    .bracket_balance
                    .checked_sub(1)
                    .ok_or(GrammarViolation::UnexpectedCloseBracket)?;
            }
            _ => {}
        }
        self.previous = Some(token.kind());
        self.tokens.push(token);
        Ok(())
    }

    /// Finish the expression and hand out a view over its tokens.
    ///
    /// # Errors
    /// Fails when nothing was added, brackets are unbalanced, the last token
    /// is a dangling operator, or a single token is not a symbol.
    pub fn build(&self) -> Result<TokenList<'_, 'a>, GrammarViolation> {
        let Some(last) = self.previous else {
            return Err(GrammarViolation::Empty);
        };
        if self.bracket_balance != 0 {
            return Err(GrammarViolation::UnclosedBrackets(self.bracket_balance));
        }
        if !matches!(last, TokenKind::Symbol | TokenKind::CloseBracket) {
            return Err(GrammarViolation::Unfinished);
        }
        if self.tokens.len() == 1 && last != TokenKind::Symbol {
            return Err(GrammarViolation::SingleTokenNotSymbol);
        }
        Ok(TokenList {
            tokens: &self.tokens,
        })
    }

    fn check_successor(&self, next: TokenKind) -> Result<(), GrammarViolation> {
        use TokenKind::*;

        let (allowed, expected): (&[TokenKind], &'static str) = match self.previous {
            None => (
                &[Symbol, Not, OpenBracket],
                "symbol, open bracket, or not operator",
            ),
            Some(Symbol) => (
                &[CloseBracket, And, Or],
                "close bracket, and operator, or or operator",
            ),
            Some(Not) => (&[Symbol, OpenBracket], "symbol or open bracket"),
            Some(OpenBracket) => (
                &[Symbol, Not, OpenBracket],
                "symbol, not operator, or open bracket",
            ),
            Some(CloseBracket) => (
                &[And, Or, CloseBracket],
                "and operator, or operator, or close bracket",
            ),
            Some(And | Or) => (
                &[Symbol, OpenBracket, Not],
                "symbol, open bracket, or not operator",
            ),
        };

        if allowed.contains(&next) {
            Ok(())
        } else {
            Err(GrammarViolation::UnexpectedToken {
                previous: self
                    .previous
                    .map_or(PreviousToken::Start, PreviousToken::Token),
                found: next,
                expected,
            })
        }
    }
}

/// Immutable view over validated tokens.
///
/// Sub-ranges share the builder's storage, so the parser can split and
/// recurse without copying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenList<'t, 'a> {
    tokens: &'t [Token<'a>],
}

/// Where the outermost operator of a token range sits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OperatorAnalysis {
    /// Index and kind of the top-level operator, if any
    pub(crate) operator: Option<(usize, TokenKind)>,
    /// The first and last tokens are one bracket pair around everything
    pub(crate) outer_brackets_removable: bool,
}

impl<'t, 'a> TokenList<'t, 'a> {
    /// Number of tokens in this view
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether this view has no tokens
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens as a slice
    #[must_use]
    pub const fn as_slice(&self) -> &'t [Token<'a>] {
        self.tokens
    }

    /// Iterate over the tokens
    pub fn iter(&self) -> std::slice::Iter<'t, Token<'a>> {
        self.tokens.iter()
    }

    /// View of the tokens from `from` to the end.
    ///
    /// # Panics
    /// Panics if `from` is out of range.
    #[must_use]
    pub fn slice_from(&self, from: usize) -> Self {
        TokenList {
            tokens: &self.tokens[from..],
        }
    }

    /// View of the tokens in `from..to`.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Self {
        TokenList {
            tokens: &self.tokens[from..to],
        }
    }

    /// Find the operator that binds outermost and whether the whole range is
    /// wrapped in one removable bracket pair.
    ///
    /// Shallower bracket depth wins; at equal depth a strictly looser operator
    /// (`||` over `&&` over `!`) replaces the candidate, so the leftmost of
    /// equals is kept.
    pub(crate) fn analyze(&self) -> OperatorAnalysis {
        let last_index = self.tokens.len().saturating_sub(1);
        let mut candidate: Option<(usize, TokenKind, usize, u8)> = None;
        let mut depth = 0usize;
        let mut first_is_open = false;
        let mut last_is_close = false;
        let mut closed_early = false;

        for (index, token) in self.tokens.iter().enumerate() {
            match token.kind() {
                TokenKind::OpenBracket => {
                    depth += 1;
                    if index == 0 {
                        first_is_open = true;
                    }
                }
                TokenKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                    if index == last_index {
                        last_is_close = true;
                    } else if depth == 0 {
                        closed_early = true;
                    }
                }
                kind => {
                    let Some(rank) = kind.binding_rank() else {
                        continue;
                    };
                    let replace = match candidate {
                        None => true,
                        Some((_, _, best_depth, best_rank)) => {
                            depth < best_depth || (depth == best_depth && rank > best_rank)
                        }
                    };
                    if replace {
                        candidate = Some((index, kind, depth, rank));
                    }
                }
            }
        }

        OperatorAnalysis {
            operator: candidate.map(|(index, kind, _, _)| (index, kind)),
            outer_brackets_removable: first_is_open && last_is_close && !closed_early,
        }
    }
}

impl<'a> Index<usize> for TokenList<'_, 'a> {
    type Output = Token<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

impl<'t, 'a> IntoIterator for TokenList<'t, 'a> {
    type Item = &'t Token<'a>;
    type IntoIter = std::slice::Iter<'t, Token<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl fmt::Display for TokenList<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, token) in self.tokens.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            match (token.symbol_text(), token.kind().spelling()) {
                (Some(text), _) => f.write_str(text)?,
                (None, Some(spelling)) => f.write_str(spelling)?,
                (None, None) => {}
            }
        }
        Ok(())
    }
}
