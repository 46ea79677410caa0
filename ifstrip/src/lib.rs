#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # Conditional Directive Stripper
//!
//! This library removes `#if`/`#elif`/`#else`/`#endif` blocks from source
//! text, keeping only the branches that hold for a given set of defined
//! symbols. Guards are boolean expressions over bare symbols with `!`, `&&`,
//! `||` and brackets, as found in C# and similar source files.
//!
//! ## Features
//!
//! - Byte-exact output: kept lines are copied verbatim, terminators included
//! - Nested blocks and `#elif` chains
//! - Guard expressions validated token by token, with typed errors
//! - Any line ending convention, or a fixed one
//! - Symbol sets from `HashSet`, `BTreeSet`, slices, arrays or `Vec`
//!
//! ## Example
//!
//! ```rust
//! use ifstrip::undefine;
//!
//! let code = "\
//! #if NETSTANDARD2_0 || NET45
//! [MethodImpl(MethodImplOptions.AggressiveInlining)]
//! #endif
//! public void Run() { }
//! ";
//!
//! let result = undefine(code, &["NET45"]).unwrap();
//! assert_eq!(
//!     result,
//!     "[MethodImpl(MethodImplOptions.AggressiveInlining)]\npublic void Run() { }\n"
//! );
//! ```

mod config;
mod error;
mod expression;
mod line;
mod parser;
mod sink;
mod token;
mod token_list;
mod tokenizer;
mod transform;

pub use config::{DEFAULT_NESTING_LIMIT, LineEnding, TrailingText, UndefineConfig, UnknownDirectives};
pub use error::{DirectiveError, ErrorCategory, GrammarViolation, ParseError, PreviousToken};
pub use expression::{Expression, SymbolSet};
pub use line::{LineKind, LineOfCode, LineScanner};
pub use parser::{ExpressionParser, parse_expression};
pub use token::{Token, TokenKind};
pub use token_list::{DEFAULT_TOKEN_CAPACITY, TokenList, TokenListBuilder};
pub use tokenizer::{Tokenizer, tokenize};
pub use transform::Undefiner;

/// Evaluate a guard expression against a set of defined symbols
pub fn evaluate<S: SymbolSet + ?Sized>(expression: &Expression, symbols: &S) -> bool {
    expression.evaluate(symbols)
}

/// Strip conditional directives from `source` with the default configuration.
///
/// # Errors
/// Returns `DirectiveError` if a directive is unknown, misplaced, unterminated
/// or has an invalid guard expression.
pub fn undefine<S: SymbolSet + ?Sized>(source: &str, symbols: &S) -> Result<String, DirectiveError> {
    Undefiner::new().process(source, symbols)
}

/// Strip conditional directives from `source` with the given configuration.
///
/// # Errors
/// Same as [`undefine`], plus the errors the configuration enables, such as
/// trailing text after `#else`/`#endif` or nesting beyond the limit.
pub fn undefine_with_config<S: SymbolSet + ?Sized>(
    source: &str,
    symbols: &S,
    config: &UndefineConfig,
) -> Result<String, DirectiveError> {
    Undefiner::with_config(config).process(source, symbols)
}
