#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default bound on directive nesting and expression recursion
pub const DEFAULT_NESTING_LIMIT: usize = 128;

/// Which character sequences end a physical line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineEnding {
    /// `\n` only
    Lf,
    /// `\r\n` only
    CrLf,
    /// Bare `\r` only
    Cr,
    /// Any of `\n`, `\r\n`, or bare `\r`
    #[default]
    Auto,
}

impl LineEnding {
    /// Byte offset and byte length of the first terminator in `text`,
    /// `None` if there is none.
    #[must_use]
    pub fn find_in(self, text: &str) -> Option<(usize, usize)> {
        match self {
            LineEnding::Lf => text.find('\n').map(|at| (at, 1)),
            LineEnding::CrLf => text.find("\r\n").map(|at| (at, 2)),
            LineEnding::Cr => text.find('\r').map(|at| (at, 1)),
            LineEnding::Auto => {
                let at = text.find(['\r', '\n'])?;
                let bytes = text.as_bytes();
                if bytes[at] == b'\r' && bytes.get(at + 1) == Some(&b'\n') {
                    Some((at, 2))
                } else {
                    Some((at, 1))
                }
            }
        }
    }
}

/// What to do with text after `#else` or `#endif`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrailingText {
    /// Drop the whole line, whatever follows the keyword
    #[default]
    Ignore,
    /// Fail with a directive error
    Reject,
}

/// What to do with `#` lines that are not `if`/`elif`/`else`/`endif`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum UnknownDirectives {
    /// Fail with a directive error
    #[default]
    Reject,
    /// Treat them as plain source lines, e.g. `#region` or `#pragma`
    PassThrough,
}

/// Configuration for the transformation
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UndefineConfig {
    /// Line terminator convention
    pub line_ending: LineEnding,
    /// Handling of text after `#else`/`#endif`
    pub trailing_text: TrailingText,
    /// Handling of unrecognized directives
    pub unknown_directives: UnknownDirectives,
    /// Maximum directive nesting depth and expression recursion depth
    pub nesting_limit: usize,
    /// Initial number of token slots for the reusable token buffer
    pub token_capacity: usize,
}

impl Default for UndefineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UndefineConfig {
    /// Default configuration: any line ending, lenient trailing text,
    /// unknown directives rejected
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line_ending: LineEnding::Auto,
            trailing_text: TrailingText::Ignore,
            unknown_directives: UnknownDirectives::Reject,
            nesting_limit: DEFAULT_NESTING_LIMIT,
            token_capacity: crate::token_list::DEFAULT_TOKEN_CAPACITY,
        }
    }

    /// Strict configuration: trailing text after `#else`/`#endif` is an error
    #[must_use]
    pub const fn strict() -> Self {
        Self::new().with_trailing_text(TrailingText::Reject)
    }

    /// Override the line terminator convention
    #[must_use]
    pub const fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Override trailing text handling
    #[must_use]
    pub const fn with_trailing_text(mut self, trailing_text: TrailingText) -> Self {
        self.trailing_text = trailing_text;
        self
    }

    /// Override unknown directive handling
    #[must_use]
    pub const fn with_unknown_directives(mut self, unknown_directives: UnknownDirectives) -> Self {
        self.unknown_directives = unknown_directives;
        self
    }

    /// Override the nesting limit
    #[must_use]
    pub const fn with_nesting_limit(mut self, nesting_limit: usize) -> Self {
        self.nesting_limit = nesting_limit;
        self
    }

    /// Override the initial token capacity
    #[must_use]
    pub const fn with_token_capacity(mut self, token_capacity: usize) -> Self {
        self.token_capacity = token_capacity;
        self
    }
}
