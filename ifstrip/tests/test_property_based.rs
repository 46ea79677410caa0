//! Property-based tests for ifstrip
//!
//! Random expressions and nested directive documents are checked against a
//! reference model of which branches survive.


use ifstrip::*;
use proptest::prelude::*;
use proptest_strategies::*;

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut haystack = haystack.chars();
    needle.chars().all(|c| haystack.any(|h| h == c))
}

// ════════════════════════════════════════════════════════════
// Expression Property Tests
// ════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The bracketed display form parses back to the same tree
    #[test]
    fn display_round_trips(expr in expression()) {
        let text = expr.to_string();
        prop_assert_eq!(parse_expression(&text).unwrap(), expr, "via {}", text);
    }

    #[test]
    fn not_inverts(expr in expression(), symbols in symbol_set()) {
        prop_assert_eq!(
            evaluate(&Expression::not(expr.clone()), &symbols),
            !evaluate(&expr, &symbols)
        );
    }

    #[test]
    fn and_or_follow_boolean_logic(
        left in expression(),
        right in expression(),
        symbols in symbol_set()
    ) {
        let l = evaluate(&left, &symbols);
        let r = evaluate(&right, &symbols);
        prop_assert_eq!(evaluate(&Expression::and(left.clone(), right.clone()), &symbols), l && r);
        prop_assert_eq!(evaluate(&Expression::or(left, right), &symbols), l || r);
    }

    /// `&&` binds tighter than `||` whichever side it is on
    #[test]
    fn and_binds_tighter_than_or(a in symbol(), b in symbol(), c in symbol()) {
        let sym = |name: &String| Expression::symbol(name.as_str());
        prop_assert_eq!(
            parse_expression(&format!("{a} && {b} || {c}")).unwrap(),
            Expression::or(Expression::and(sym(&a), sym(&b)), sym(&c))
        );
        prop_assert_eq!(
            parse_expression(&format!("{a} || {b} && {c}")).unwrap(),
            Expression::or(sym(&a), Expression::and(sym(&b), sym(&c)))
        );
        prop_assert_eq!(
            parse_expression(&format!("!{a} && {b}")).unwrap(),
            Expression::and(Expression::not(sym(&a)), sym(&b))
        );
    }

    #[test]
    fn redundant_brackets_are_stripped(expr in expression(), extra in 1usize..6) {
        let text = format!("{}{expr}{}", "(".repeat(extra), ")".repeat(extra));
        prop_assert_eq!(parse_expression(&text).unwrap(), expr);
    }

    /// Only bracket nesting counts toward the limit, not chain length
    #[test]
    fn flat_chains_of_any_length_parse(
        terms in prop::collection::vec(symbol(), 1..400),
        use_or in any::<bool>()
    ) {
        let operator = if use_or { " || " } else { " && " };
        let parsed = parse_expression(&terms.join(operator)).unwrap();
        prop_assert_eq!(parsed.symbols().len(), terms.len());
    }

    /// Bracket pairs around a binary expression are counted against the limit
    #[test]
    fn bracket_depth_is_limited(a in symbol(), b in symbol(), depth in 0usize..12) {
        let text = format!("{}{a} && {b}{}", "(".repeat(depth), ")".repeat(depth));
        let result = ExpressionParser::new().with_nesting_limit(6).parse(&text);
        if depth <= 6 {
            prop_assert!(result.is_ok());
        } else {
            let is_nesting_error = matches!(result, Err(ParseError::NestingTooDeep { limit: 6, .. }));
            prop_assert!(is_nesting_error);
        }
    }

    /// Arbitrary input yields a tree or an error, never a panic
    #[test]
    fn parser_never_panics(text in "\\PC{0,40}") {
        let _ = parse_expression(&text);
    }
}

// ════════════════════════════════════════════════════════════
// Transformation Property Tests
// ════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The taken branches, and only those, survive
    #[test]
    fn output_matches_reference_model(doc in document(), symbols in symbol_set()) {
        let source = render(&doc, "\n");
        let output = undefine(&source, &symbols).unwrap();
        prop_assert_eq!(output, expected(&doc, &symbols, "\n"));
    }

    #[test]
    fn terminators_are_preserved(doc in document(), symbols in symbol_set()) {
        for terminator in ["\r\n", "\r"] {
            let source = render(&doc, terminator);
            prop_assert_eq!(
                undefine(&source, &symbols).unwrap(),
                expected(&doc, &symbols, terminator)
            );
        }
    }

    #[test]
    fn output_is_a_subsequence(doc in document(), symbols in symbol_set()) {
        let source = render(&doc, "\n");
        let output = undefine(&source, &symbols).unwrap();
        prop_assert!(is_subsequence(&output, &source));
    }

    #[test]
    fn stripping_is_idempotent(doc in document(), symbols in symbol_set()) {
        let once = undefine(&render(&doc, "\n"), &symbols).unwrap();
        let twice = undefine(&once, &symbols).unwrap();
        prop_assert_eq!(twice, once);
    }

    /// Text without directive lines is returned unchanged
    #[test]
    fn plain_text_is_identity(lines in prop::collection::vec(plain_line(), 0..20)) {
        let source = lines.join("\n");
        prop_assert_eq!(undefine(&source, &SYMBOL_POOL).unwrap(), source);
    }

    /// Dropping the final `#endif` of a document always fails
    #[test]
    fn truncated_document_is_rejected(doc in document(), symbols in symbol_set()) {
        let source = render(&doc, "\n");
        if let Some(cut) = source.rfind("#endif\n") {
            let truncated = &source[..cut];
            prop_assert!(undefine(truncated, &symbols).is_err());
        }
    }
}
