use std::ops::Range;

use log::{debug, trace};

use crate::config::UndefineConfig;
use crate::error::DirectiveError;
use crate::expression::SymbolSet;
use crate::line::{LineKind, LineOfCode, LineScanner};
use crate::parser::ExpressionParser;
use crate::sink::SourceSink;
use crate::token_list::TokenListBuilder;

/// Removes conditional-compilation blocks from source text, keeping only
/// the branches whose guards hold for a set of defined symbols
#[derive(Clone, Debug, Default)]
pub struct Undefiner {
    config: UndefineConfig,
}

impl Undefiner {
    /// Create a transformer with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Undefiner {
            config: UndefineConfig::new(),
        }
    }

    /// Create a transformer with the given configuration
    #[must_use]
    pub fn with_config(config: &UndefineConfig) -> Self {
        let mut undefiner = Self::new();
        undefiner.apply_config(config);
        undefiner
    }

    /// Replace the configuration
    pub fn apply_config(&mut self, config: &UndefineConfig) {
        self.config.clone_from(config);
    }

    /// The active configuration
    #[must_use]
    pub const fn config(&self) -> &UndefineConfig {
        &self.config
    }

    /// Strip directives from `source`, keeping the branches selected by
    /// `symbols`.
    ///
    /// # Errors
    /// Returns `DirectiveError` for unknown or misplaced directives, invalid
    /// guard expressions, missing `#endif`, or nesting beyond the limit.
    /// Nothing is returned on error, not even partial output.
    pub fn process<S: SymbolSet + ?Sized>(
        &self,
        source: &str,
        symbols: &S,
    ) -> Result<String, DirectiveError> {
        let parser = ExpressionParser::with_builder(TokenListBuilder::with_capacity(
            self.config.token_capacity,
        ))
        .with_nesting_limit(self.config.nesting_limit);

        let mut transformation = Transformation {
            source,
            config: &self.config,
            symbols,
            parser,
            sink: SourceSink::with_capacity(source.len()),
        };
        transformation.undefine_span(0..source.len(), 1, 0)?;

        let output = transformation.sink.into_string();
        debug!(
            "kept {} of {} bytes ({} removed)",
            output.len(),
            source.len(),
            source.len() - output.len()
        );
        Ok(output)
    }
}

/// State of one `process` call, threaded through the recursion
struct Transformation<'a, 'c, S: ?Sized> {
    source: &'a str,
    config: &'c UndefineConfig,
    symbols: &'c S,
    parser: ExpressionParser<'a>,
    sink: SourceSink,
}

impl<'a, S: SymbolSet + ?Sized> Transformation<'a, '_, S> {
    fn undefine_span(
        &mut self,
        span: Range<usize>,
        first_line: usize,
        depth: usize,
    ) -> Result<(), DirectiveError> {
        trace!("depth {depth}: resolving bytes {span:?} from line {first_line}");
        let mut scanner = LineScanner::for_span(self.source, span, first_line, self.config);

        while let Some(line) = scanner.next_line(&mut self.parser)? {
            match &line.kind {
                LineKind::Source => self.sink.append(line.text),
                LineKind::If(guard) => {
                    let taken = guard.evaluate(self.symbols);
                    debug!("line {}: #if {guard} is {taken}", line.line_number);
                    if taken {
                        self.take_branch(&line, &mut scanner, false, depth)?;
                    } else {
                        self.skip_to_taken_branch(&line, &mut scanner, depth)?;
                    }
                }
                LineKind::ElseIf(_) | LineKind::Else | LineKind::EndIf => {
                    return Err(unexpected_directive(&line));
                }
            }
        }
        Ok(())
    }

    /// Discard lines of a false `#if` until a true `#elif`, an `#else`, or
    /// the matching `#endif`.
    fn skip_to_taken_branch(
        &mut self,
        opening: &LineOfCode<'a>,
        scanner: &mut LineScanner<'a>,
        depth: usize,
    ) -> Result<(), DirectiveError> {
        let mut nested = 0usize;
        while let Some(line) = scanner.next_line(&mut self.parser)? {
            match &line.kind {
                LineKind::Source => {}
                LineKind::If(_) => nested += 1,
                LineKind::EndIf if nested > 0 => nested -= 1,
                LineKind::EndIf => {
                    debug!(
                        "line {}: no branch taken for #if on line {}",
                        line.line_number, opening.line_number
                    );
                    return Ok(());
                }
                LineKind::ElseIf(_) | LineKind::Else if nested > 0 => {}
                LineKind::ElseIf(guard) => {
                    let taken = guard.evaluate(self.symbols);
                    debug!("line {}: #elif {guard} is {taken}", line.line_number);
                    if taken {
                        return self.take_branch(opening, scanner, false, depth);
                    }
                }
                LineKind::Else => {
                    debug!("line {}: #else taken", line.line_number);
                    return self.take_branch(opening, scanner, true, depth);
                }
            }
        }
        Err(missing_end_if(opening))
    }

    /// Capture the body of the branch that was just selected, drop the rest
    /// of the chain up to the matching `#endif`, then emit the body.
    fn take_branch(
        &mut self,
        opening: &LineOfCode<'a>,
        scanner: &mut LineScanner<'a>,
        mut found_else: bool,
        depth: usize,
    ) -> Result<(), DirectiveError> {
        let body_start = scanner.position();
        let body_first_line = scanner.line_number() + 1;
        let mut body_end: Option<usize> = None;
        let mut contains_directive = false;
        let mut nested = 0usize;

        while let Some(line) = scanner.next_line(&mut self.parser)? {
            match &line.kind {
                LineKind::Source => {}
                LineKind::If(_) => {
                    if body_end.is_none() {
                        contains_directive = true;
                    }
                    nested += 1;
                }
                LineKind::EndIf if nested > 0 => nested -= 1,
                LineKind::EndIf => {
                    let body_end = *body_end.get_or_insert(line.start);
                    return self.emit_branch(
                        opening,
                        body_start..body_end,
                        body_first_line,
                        contains_directive,
                        depth,
                    );
                }
                LineKind::ElseIf(_) | LineKind::Else if nested > 0 => {}
                LineKind::ElseIf(_) | LineKind::Else => {
                    if found_else {
                        return Err(unexpected_directive(&line));
                    }
                    found_else = matches!(line.kind, LineKind::Else);
                    body_end.get_or_insert(line.start);
                }
            }
        }
        Err(missing_end_if(opening))
    }

    fn emit_branch(
        &mut self,
        opening: &LineOfCode<'a>,
        body: Range<usize>,
        first_line: usize,
        contains_directive: bool,
        depth: usize,
    ) -> Result<(), DirectiveError> {
        trace!(
            "keeping bytes {body:?} of the chain opened on line {}",
            opening.line_number
        );
        if !contains_directive {
            let source = self.source;
            self.sink.append(&source[body]);
            return Ok(());
        }
        if depth >= self.config.nesting_limit {
            return Err(DirectiveError::NestingTooDeep {
                line: opening.line_number,
                text: opening.content().to_string(),
                limit: self.config.nesting_limit,
            });
        }
        self.undefine_span(body, first_line, depth + 1)
    }
}

fn unexpected_directive(line: &LineOfCode<'_>) -> DirectiveError {
    DirectiveError::UnexpectedDirective {
        line: line.line_number,
        text: line.content().to_string(),
    }
}

fn missing_end_if(opening: &LineOfCode<'_>) -> DirectiveError {
    DirectiveError::MissingEndIf {
        line: opening.line_number,
        text: opening.content().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    fn undefine(source: &str, symbols: &[&str]) -> Result<String, DirectiveError> {
        Undefiner::new().process(source, symbols)
    }

    #[test]
    fn plain_text_is_untouched() {
        let source = "line one\r\n  line two\n# \t\nlast";
        let config = UndefineConfig::new()
            .with_unknown_directives(crate::config::UnknownDirectives::PassThrough);
        assert_eq!(
            Undefiner::with_config(&config).process(source, &NONE).unwrap(),
            source
        );
    }

    #[test]
    fn simple_if_directive() {
        let source =
            "#if NETSTANDARD2_0\n        [MethodImpl(MethodImplOptions.AggressiveInlining)]\n#endif";
        assert_eq!(
            undefine(source, &["NETSTANDARD2_0"]).unwrap(),
            "        [MethodImpl(MethodImplOptions.AggressiveInlining)]\n"
        );
        assert_eq!(undefine(source, &[]).unwrap(), "");
    }

    #[test]
    fn else_branch_when_guard_false() {
        let source = "#if DEBUG\nX\n#else\nY\n#endif";
        assert_eq!(undefine(source, &[]).unwrap(), "Y\n");
        assert_eq!(undefine(source, &["DEBUG"]).unwrap(), "X\n");
    }

    #[test]
    fn first_true_elif_wins() {
        let source = "a\n#if A\n1\n#elif B\n2\n#elif C\n3\n#else\n4\n#endif\nz\n";
        assert_eq!(undefine(source, &["B", "C"]).unwrap(), "a\n2\nz\n");
        assert_eq!(undefine(source, &["C"]).unwrap(), "a\n3\nz\n");
        assert_eq!(undefine(source, &["A", "C"]).unwrap(), "a\n1\nz\n");
        assert_eq!(undefine(source, &[]).unwrap(), "a\n4\nz\n");
    }

    #[test]
    fn text_after_taken_elif_chain_is_kept() {
        let source = "#if A\n1\n#elif B\n2\n#endif\nafter\n#if C\n3\n#endif\n";
        assert_eq!(undefine(source, &["B"]).unwrap(), "2\nafter\n");
    }

    #[test]
    fn nested_blocks_resolve_recursively() {
        let source = "\
#if OUTER
outer start
#if INNER
inner
#else
not inner
#endif
outer end
#endif
tail
";
        assert_eq!(
            undefine(source, &["OUTER"]).unwrap(),
            "outer start\nnot inner\nouter end\ntail\n"
        );
        assert_eq!(
            undefine(source, &["OUTER", "INNER"]).unwrap(),
            "outer start\ninner\nouter end\ntail\n"
        );
        assert_eq!(undefine(source, &["INNER"]).unwrap(), "tail\n");
    }

    #[test]
    fn nested_blocks_in_skipped_branches_do_not_end_the_chain() {
        let source = "\
#if A
#if B
b
#else
not b
#endif
#elif C
c
#endif
";
        assert_eq!(undefine(source, &["C"]).unwrap(), "c\n");
        assert_eq!(undefine(source, &["A", "C"]).unwrap(), "not b\n");
    }

    #[test]
    fn nested_directives_after_first_branch_are_skipped() {
        let source = "#if A\na\n#else\n#if B\nb\n#endif\n#endif\n";
        assert_eq!(undefine(source, &["A", "B"]).unwrap(), "a\n");
        assert_eq!(undefine(source, &["B"]).unwrap(), "b\n");
    }

    #[test]
    fn crlf_terminators_survive() {
        let source = "keep\r\n#if A\r\nyes\r\n#else\r\nno\r\n#endif\r\nend";
        assert_eq!(undefine(source, &["A"]).unwrap(), "keep\r\nyes\r\nend");
    }

    #[test]
    fn elif_without_if() {
        assert_eq!(
            undefine("#elif A", &[]).unwrap_err(),
            DirectiveError::UnexpectedDirective {
                line: 1,
                text: "#elif A".to_string(),
            }
        );
        assert!(matches!(
            undefine("x\n#endif\n", &[]),
            Err(DirectiveError::UnexpectedDirective { line: 2, .. })
        ));
    }

    #[test]
    fn second_else_is_unexpected() {
        let source = "#if A\n1\n#else\n2\n#else\n3\n#endif\n";
        for symbols in [&["A"][..], &[][..]] {
            assert!(matches!(
                undefine(source, symbols),
                Err(DirectiveError::UnexpectedDirective { line: 5, .. })
            ));
        }
        let source = "#if A\n1\n#else\n2\n#elif B\n3\n#endif\n";
        assert!(matches!(
            undefine(source, &["A"]),
            Err(DirectiveError::UnexpectedDirective { line: 5, .. })
        ));
    }

    #[test]
    fn missing_end_if_names_the_opening_line() {
        for symbols in [&["A"][..], &[][..]] {
            assert_eq!(
                undefine("x\n#if A\ny\n#else\nz\n", symbols).unwrap_err(),
                DirectiveError::MissingEndIf {
                    line: 2,
                    text: "#if A".to_string(),
                }
            );
        }
    }

    #[test]
    fn errors_inside_branches_report_absolute_lines() {
        let source = "#if A\nx\n#if B\n#else\n#else\n#endif\n#endif\n";
        assert!(matches!(
            undefine(source, &["A"]),
            Err(DirectiveError::UnexpectedDirective { line: 5, .. })
        ));
    }

    #[test]
    fn nesting_limit_stops_deep_recursion() {
        let depth = 6;
        let source = format!("{}x\n{}", "#if A\n".repeat(depth), "#endif\n".repeat(depth));
        assert_eq!(undefine(&source, &["A"]).unwrap(), "x\n");

        let config = UndefineConfig::new().with_nesting_limit(3);
        assert!(matches!(
            Undefiner::with_config(&config).process(&source, &["A"]),
            Err(DirectiveError::NestingTooDeep { limit: 3, .. })
        ));
    }

    #[test]
    fn invalid_expression_in_dropped_branch_is_still_reported() {
        let source = "#if A\n#elif B &&\n#endif\n";
        assert!(matches!(
            undefine(source, &["A"]),
            Err(DirectiveError::InvalidExpression { line: 2, .. })
        ));
    }
}
