use crate::error::{GrammarViolation, ParseError};
use crate::token::{
    AND_CHARACTER, AND_OPERATOR, CLOSE_BRACKET_CHARACTER, NOT_CHARACTER, OPEN_BRACKET_CHARACTER,
    OR_CHARACTER, OR_OPERATOR, Token, TokenKind, is_symbol_continue, is_symbol_start,
    is_symbol_terminator,
};
use crate::token_list::{TokenList, TokenListBuilder};

/// Splits one guard expression (without the `#if`/`#elif` keyword) into
/// tokens, feeding each one through the builder's grammar checks.
pub struct Tokenizer<'a, 'b> {
    expression: &'a str,
    builder: &'b mut TokenListBuilder<'a>,
    // byte offset into `expression`
    position: usize,
}

impl<'a, 'b> Tokenizer<'a, 'b> {
    /// Prepare tokenizing `expression` into a freshly reset `builder`
    pub fn new(expression: &'a str, builder: &'b mut TokenListBuilder<'a>) -> Self {
        builder.reset();
        Tokenizer {
            expression,
            builder,
            position: 0,
        }
    }

    /// Run the tokenizer to completion.
    ///
    /// # Errors
    /// Returns a lexical `ParseError` for characters that do not form tokens
    /// and a grammar `ParseError` for illegal token sequences.
    pub fn tokenize(mut self) -> Result<TokenList<'b, 'a>, ParseError> {
        while let Some(current) = self.skip_whitespace() {
            match current {
                AND_CHARACTER => self.two_character_operator(AND_CHARACTER, AND_OPERATOR, TokenKind::And)?,
                OR_CHARACTER => self.two_character_operator(OR_CHARACTER, OR_OPERATOR, TokenKind::Or)?,
                NOT_CHARACTER => self.single_character_token(TokenKind::Not)?,
                OPEN_BRACKET_CHARACTER => self.single_character_token(TokenKind::OpenBracket)?,
                CLOSE_BRACKET_CHARACTER => self.single_character_token(TokenKind::CloseBracket)?,
                c if is_symbol_start(c) => self.symbol()?,
                character => {
                    return Err(ParseError::UnexpectedCharacter {
                        expression: self.expression.to_string(),
                        position: self.character_position(self.position),
                        character,
                    });
                }
            }
        }

        let expression = self.expression;
        let builder: &'b TokenListBuilder<'a> = self.builder;
        builder.build().map_err(|violation| grammar_error(expression, violation))
    }

    fn skip_whitespace(&mut self) -> Option<char> {
        let rest = &self.expression[self.position..];
        let trimmed = rest.trim_start();
        self.position += rest.len() - trimmed.len();
        trimmed.chars().next()
    }

    fn symbol(&mut self) -> Result<(), ParseError> {
        let start = self.position;
        let mut end = self.expression.len();
        for (offset, c) in self.expression[start..].char_indices() {
            if is_symbol_terminator(c) {
                end = start + offset;
                break;
            }
            if !is_symbol_continue(c) {
                return Err(ParseError::InvalidSymbolCharacter {
                    expression: self.expression.to_string(),
                    position: self.character_position(start + offset),
                    character: c,
                });
            }
        }
        self.position = end;
        self.add(Token::symbol(&self.expression[start..end]))
    }

    fn two_character_operator(
        &mut self,
        character: char,
        operator: &'static str,
        kind: TokenKind,
    ) -> Result<(), ParseError> {
        let second_position = self.position + character.len_utf8();
        match self.expression[second_position..].chars().next() {
            None => Err(ParseError::UnterminatedOperator {
                expression: self.expression.to_string(),
                operator,
                position: self.character_position(self.position),
            }),
            Some(second) if second != character => Err(ParseError::MalformedOperator {
                expression: self.expression.to_string(),
                operator,
                position: self.character_position(second_position),
            }),
            Some(_) => {
                self.position = second_position + character.len_utf8();
                self.add(Token::operator(kind))
            }
        }
    }

    fn single_character_token(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        // brackets and `!` are all one byte
        self.position += 1;
        self.add(Token::operator(kind))
    }

    fn add(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        self.builder
            .try_add(token)
            .map_err(|violation| grammar_error(self.expression, violation))
    }

    fn character_position(&self, byte_offset: usize) -> usize {
        self.expression[..byte_offset].chars().count()
    }
}

fn grammar_error(expression: &str, violation: GrammarViolation) -> ParseError {
    ParseError::Grammar {
        expression: expression.to_string(),
        violation,
    }
}

/// Tokenize `expression` into `builder`, returning the validated list
///
/// # Errors
/// See [`Tokenizer::tokenize`].
pub fn tokenize<'a, 'b>(
    expression: &'a str,
    builder: &'b mut TokenListBuilder<'a>,
) -> Result<TokenList<'b, 'a>, ParseError> {
    Tokenizer::new(expression, builder).tokenize()
}
