use crate::config::DEFAULT_NESTING_LIMIT;
use crate::error::ParseError;
use crate::expression::Expression;
use crate::token::{Token, TokenKind};
use crate::token_list::{TokenList, TokenListBuilder};
use crate::tokenizer::tokenize;

/// Parses guard expressions into [`Expression`] trees.
///
/// Owns a [`TokenListBuilder`] that is reset and reused for every
/// expression, so parsing all guards of one document allocates token
/// storage once.
#[derive(Debug)]
pub struct ExpressionParser<'a> {
    builder: TokenListBuilder<'a>,
    nesting_limit: usize,
}

impl Default for ExpressionParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExpressionParser<'a> {
    /// Create a parser with default token capacity and nesting limit
    #[must_use]
    pub fn new() -> Self {
        Self::with_builder(TokenListBuilder::new())
    }

    /// Create a parser around an existing token builder
    #[must_use]
    pub fn with_builder(builder: TokenListBuilder<'a>) -> Self {
        ExpressionParser {
            builder,
            nesting_limit: DEFAULT_NESTING_LIMIT,
        }
    }

    /// Set how deeply brackets may nest; flat `||`/`&&` chains are not counted
    #[must_use]
    pub const fn with_nesting_limit(mut self, limit: usize) -> Self {
        self.nesting_limit = limit;
        self
    }

    /// Parse one expression (without the `#if`/`#elif` keyword).
    ///
    /// # Errors
    /// Returns a lexical or grammar `ParseError` naming the full expression.
    pub fn parse(&mut self, expression: &'a str) -> Result<Expression, ParseError> {
        let tokens = tokenize(expression, &mut self.builder)?;
        TreeBuilder {
            expression,
            nesting_limit: self.nesting_limit,
        }
        .build(tokens, 0)
    }
}

struct TreeBuilder<'a> {
    expression: &'a str,
    nesting_limit: usize,
}

impl TreeBuilder<'_> {
    fn build(&self, tokens: TokenList<'_, '_>, depth: usize) -> Result<Expression, ParseError> {
        if depth > self.nesting_limit {
            return Err(ParseError::NestingTooDeep {
                expression: self.expression.to_string(),
                limit: self.nesting_limit,
            });
        }

        match tokens.as_slice() {
            [] => Err(self.unparsable()),
            [single] => self.symbol(single),
            [not, operand] if not.kind() == TokenKind::Not => {
                Ok(Expression::not(self.symbol(operand)?))
            }
            [_, _] => Err(self.unparsable()),
            [left, middle, right] => self.build_three(left, middle, right),
            _ => self.build_complex(tokens, depth),
        }
    }

    fn build_three(
        &self,
        left: &Token<'_>,
        middle: &Token<'_>,
        right: &Token<'_>,
    ) -> Result<Expression, ParseError> {
        match (left.kind(), middle.kind(), right.kind()) {
            (TokenKind::Symbol, TokenKind::And, TokenKind::Symbol) => {
                Ok(Expression::and(self.symbol(left)?, self.symbol(right)?))
            }
            (TokenKind::Symbol, TokenKind::Or, TokenKind::Symbol) => {
                Ok(Expression::or(self.symbol(left)?, self.symbol(right)?))
            }
            (TokenKind::OpenBracket, TokenKind::Symbol, TokenKind::CloseBracket) => {
                self.symbol(middle)
            }
            _ => Err(self.unparsable()),
        }
    }

    /// `depth` counts stripped bracket pairs only, so long flat chains of
    /// `||`/`&&` are not limited.
    fn build_complex(&self, tokens: TokenList<'_, '_>, depth: usize) -> Result<Expression, ParseError> {
        let analysis = tokens.analyze();
        if analysis.outer_brackets_removable {
            return self.build(tokens.slice(1, tokens.len() - 1), depth + 1);
        }

        match analysis.operator {
            Some((index, TokenKind::Or)) if index > 0 => Ok(Expression::or(
                self.build(tokens.slice(0, index), depth)?,
                self.build(tokens.slice_from(index + 1), depth)?,
            )),
            Some((index, TokenKind::And)) if index > 0 => Ok(Expression::and(
                self.build(tokens.slice(0, index), depth)?,
                self.build(tokens.slice_from(index + 1), depth)?,
            )),
            // `!` binds tightest, so it only ends up on top when it leads the range
            Some((0, TokenKind::Not)) => Ok(Expression::not(self.build(tokens.slice_from(1), depth)?)),
            _ => Err(self.unparsable()),
        }
    }

    fn symbol(&self, token: &Token<'_>) -> Result<Expression, ParseError> {
        token
            .symbol_text()
            .map(Expression::symbol)
            .ok_or_else(|| self.unparsable())
    }

    fn unparsable(&self) -> ParseError {
        ParseError::Unparsable {
            expression: self.expression.to_string(),
        }
    }
}

/// Parse a guard expression into its tree
///
/// # Errors
/// Returns a `ParseError` when `expression` is not a valid guard.
pub fn parse_expression(expression: &str) -> Result<Expression, ParseError> {
    ExpressionParser::new().parse(expression)
}
