use std::ops::Range;

use log::debug;

use crate::config::{LineEnding, TrailingText, UndefineConfig, UnknownDirectives};
use crate::error::DirectiveError;
use crate::expression::Expression;
use crate::parser::ExpressionParser;
use crate::token::is_symbol_continue;

const IF: &str = "if";
const ELSE_IF: &str = "elif";
const ELSE: &str = "else";
const END_IF: &str = "endif";

/// Classification of one physical line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Anything that is not a conditional directive
    Source,
    /// `#if <expression>`
    If(Expression),
    /// `#elif <expression>`
    ElseIf(Expression),
    /// `#else`
    Else,
    /// `#endif`
    EndIf,
}

/// A classified view over one line of the source, terminator included
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineOfCode<'a> {
    /// What the line is
    pub kind: LineKind,
    /// The full line, including its terminator if it has one
    pub text: &'a str,
    /// 1-based line number in the top-level input
    pub line_number: usize,
    /// Byte offset of the line in the top-level input
    pub start: usize,
    terminator_len: usize,
}

impl<'a> LineOfCode<'a> {
    /// Byte offset just past the line's terminator
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// The line without its terminator
    #[must_use]
    pub fn content(&self) -> &'a str {
        &self.text[..self.text.len() - self.terminator_len]
    }
}

/// Walks a source text line by line, classifying each line and parsing the
/// guards of `#if`/`#elif` lines.
#[derive(Clone, Debug)]
pub struct LineScanner<'a> {
    source: &'a str,
    position: usize,
    end: usize,
    line_number: usize,
    line_ending: LineEnding,
    trailing_text: TrailingText,
    unknown_directives: UnknownDirectives,
}

impl<'a> LineScanner<'a> {
    /// Scan all of `source`
    #[must_use]
    pub fn new(source: &'a str, config: &UndefineConfig) -> Self {
        Self::for_span(source, 0..source.len(), 1, config)
    }

    /// Scan the byte range `span` of `source`, numbering its first line
    /// `first_line`. `span` must start and end on line boundaries.
    ///
    /// # Panics
    /// [`next_line`](Self::next_line) panics if `span` reaches past the end
    /// of `source` or does not start and end on char boundaries.
    #[must_use]
    pub fn for_span(
        source: &'a str,
        span: Range<usize>,
        first_line: usize,
        config: &UndefineConfig,
    ) -> Self {
        LineScanner {
            source,
            position: span.start,
            end: span.end,
            line_number: first_line.saturating_sub(1),
            line_ending: config.line_ending,
            trailing_text: config.trailing_text,
            unknown_directives: config.unknown_directives,
        }
    }

    /// Byte offset of the next line to be scanned
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of the line most recently returned, 0 before the first
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// Classify the next line, or return `None` at the end of the span.
    ///
    /// # Errors
    /// Fails on unknown directives (unless passed through), `#if`/`#elif`
    /// without or with an invalid expression, and rejected trailing text.
    pub fn next_line(
        &mut self,
        parser: &mut ExpressionParser<'a>,
    ) -> Result<Option<LineOfCode<'a>>, DirectiveError> {
        if self.position >= self.end {
            return Ok(None);
        }

        let source = self.source;
        let rest = &source[self.position..self.end];
        let (length, terminator_len) = match self.line_ending.find_in(rest) {
            Some((at, terminator_len)) => (at + terminator_len, terminator_len),
            None => (rest.len(), 0),
        };
        let start = self.position;
        self.position += length;
        self.line_number += 1;

        let mut line = LineOfCode {
            kind: LineKind::Source,
            text: &rest[..length],
            line_number: self.line_number,
            start,
            terminator_len,
        };
        line.kind = self.classify(&line, parser)?;
        Ok(Some(line))
    }

    fn classify(
        &self,
        line: &LineOfCode<'a>,
        parser: &mut ExpressionParser<'a>,
    ) -> Result<LineKind, DirectiveError> {
        let content = line.content();
        let Some(directive) = content.trim_start().strip_prefix('#') else {
            return Ok(LineKind::Source);
        };
        let directive = directive.trim_start();
        let keyword_len = directive
            .find(|c: char| !is_symbol_continue(c))
            .unwrap_or(directive.len());
        let (keyword, rest) = directive.split_at(keyword_len);

        match keyword {
            IF => Ok(LineKind::If(Self::expression(line, rest, parser)?)),
            ELSE_IF => Ok(LineKind::ElseIf(Self::expression(line, rest, parser)?)),
            ELSE => {
                self.check_trailing_text(line, rest)?;
                Ok(LineKind::Else)
            }
            END_IF => {
                self.check_trailing_text(line, rest)?;
                Ok(LineKind::EndIf)
            }
            _ => match self.unknown_directives {
                UnknownDirectives::Reject => Err(DirectiveError::UnknownDirective {
                    line: line.line_number,
                    text: content.to_string(),
                }),
                UnknownDirectives::PassThrough => Ok(LineKind::Source),
            },
        }
    }

    fn expression(
        line: &LineOfCode<'a>,
        rest: &'a str,
        parser: &mut ExpressionParser<'a>,
    ) -> Result<Expression, DirectiveError> {
        if rest.trim().is_empty() {
            return Err(DirectiveError::MissingExpression {
                line: line.line_number,
                text: line.content().to_string(),
            });
        }
        parser
            .parse(rest)
            .map_err(|source| DirectiveError::InvalidExpression {
                line: line.line_number,
                text: line.content().to_string(),
                source,
            })
    }

    fn check_trailing_text(&self, line: &LineOfCode<'a>, rest: &str) -> Result<(), DirectiveError> {
        if rest.trim().is_empty() {
            return Ok(());
        }
        match self.trailing_text {
            TrailingText::Ignore => {
                debug!(
                    "line {}: ignoring text after directive: {:?}",
                    line.line_number,
                    rest.trim()
                );
                Ok(())
            }
            TrailingText::Reject => Err(DirectiveError::TrailingText {
                line: line.line_number,
                text: line.content().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan<'a>(source: &'a str, config: &UndefineConfig) -> Result<Vec<LineOfCode<'a>>, DirectiveError> {
        let mut parser = ExpressionParser::new();
        let mut scanner = LineScanner::new(source, config);
        let mut lines = Vec::new();
        while let Some(line) = scanner.next_line(&mut parser)? {
            lines.push(line);
        }
        Ok(lines)
    }

    fn kinds(source: &str) -> Vec<LineKind> {
        scan(source, &UndefineConfig::new())
            .unwrap()
            .into_iter()
            .map(|line| line.kind)
            .collect()
    }

    #[test]
    fn lines_keep_their_terminators() {
        let source = "a\nb\r\nc\rd";
        let lines = scan(source, &UndefineConfig::new()).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["a\n", "b\r\n", "c\r", "d"]);
        assert_eq!(lines[1].content(), "b");
        assert_eq!(lines[2].start, 5);
        assert_eq!(lines[3].line_number, 4);
        assert_eq!(lines[3].end(), source.len());
    }

    #[test]
    fn explicit_line_ending_ignores_others() {
        let config = UndefineConfig::new().with_line_ending(LineEnding::CrLf);
        let lines = scan("a\nb\r\nc", &config).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a\nb\r\n");
    }

    #[test]
    fn classifies_directives() {
        let source = "int x;\n  #if DEBUG\n#  elif (A || B)\n\t#else\n#endif\n";
        assert_eq!(
            kinds(source),
            vec![
                LineKind::Source,
                LineKind::If(Expression::symbol("DEBUG")),
                LineKind::ElseIf(Expression::or(
                    Expression::symbol("A"),
                    Expression::symbol("B")
                )),
                LineKind::Else,
                LineKind::EndIf,
            ]
        );
    }

    #[test]
    fn keyword_directly_followed_by_bracket() {
        assert_eq!(
            kinds("#if(A)\n"),
            vec![LineKind::If(Expression::symbol("A"))]
        );
    }

    #[test]
    fn blank_and_hash_free_lines_are_source() {
        assert_eq!(
            kinds("\n   \nx # y\n"),
            vec![LineKind::Source, LineKind::Source, LineKind::Source]
        );
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let err = scan("a\n#ifdef DEBUG\n", &UndefineConfig::new()).unwrap_err();
        assert_eq!(
            err,
            DirectiveError::UnknownDirective {
                line: 2,
                text: "#ifdef DEBUG".to_string(),
            }
        );
        assert!(scan("#\n", &UndefineConfig::new()).is_err());
    }

    #[test]
    fn unknown_directive_passes_through_when_configured() {
        let config = UndefineConfig::new().with_unknown_directives(UnknownDirectives::PassThrough);
        let lines = scan("#region Fields\n#pragma warning disable\n", &config).unwrap();
        assert!(lines.iter().all(|line| line.kind == LineKind::Source));
    }

    #[test]
    fn missing_and_invalid_expressions() {
        assert!(matches!(
            scan("#if   \n", &UndefineConfig::new()),
            Err(DirectiveError::MissingExpression { line: 1, .. })
        ));
        let err = scan("x\n#elif A &&\n", &UndefineConfig::new()).unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.parse_error().map(|e| e.expression()), Some(" A &&"));
    }

    #[test]
    fn trailing_text_after_endif() {
        assert_eq!(kinds("#endif // DEBUG\n"), vec![LineKind::EndIf]);
        assert!(matches!(
            scan("#else DEBUG\n", &UndefineConfig::strict()),
            Err(DirectiveError::TrailingText { line: 1, .. })
        ));
        assert!(scan("#endif   \r\n", &UndefineConfig::strict()).is_ok());
    }

    #[test]
    fn span_scanning_numbers_from_first_line() {
        let source = "a\nb\nc\n";
        let mut parser = ExpressionParser::new();
        let mut scanner = LineScanner::for_span(source, 2..4, 2, &UndefineConfig::new());
        let line = scanner.next_line(&mut parser).unwrap().unwrap();
        assert_eq!((line.text, line.line_number, line.start), ("b\n", 2, 2));
        assert_eq!(scanner.next_line(&mut parser).unwrap(), None);
    }

    #[test]
    #[should_panic]
    fn span_past_end_of_source_panics() {
        let mut parser = ExpressionParser::new();
        let mut scanner = LineScanner::for_span("a\n", 0..10, 1, &UndefineConfig::new());
        let _ = scanner.next_line(&mut parser);
    }
}
