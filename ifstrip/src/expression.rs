use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::BuildHasher;

/// Membership query over the symbols defined for one transformation
pub trait SymbolSet {
    /// Whether `name` is defined; comparison is exact and case-sensitive
    fn is_defined(&self, name: &str) -> bool;
}

impl<S, H> SymbolSet for HashSet<S, H>
where
    S: std::borrow::Borrow<str> + Eq + std::hash::Hash,
    H: BuildHasher,
{
    fn is_defined(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<S> SymbolSet for BTreeSet<S>
where
    S: std::borrow::Borrow<str> + Ord,
{
    fn is_defined(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<S: AsRef<str>> SymbolSet for [S] {
    fn is_defined(&self, name: &str) -> bool {
        self.iter().any(|symbol| symbol.as_ref() == name)
    }
}

impl<S: AsRef<str>, const N: usize> SymbolSet for [S; N] {
    fn is_defined(&self, name: &str) -> bool {
        self.as_slice().is_defined(name)
    }
}

impl<S: AsRef<str>> SymbolSet for Vec<S> {
    fn is_defined(&self, name: &str) -> bool {
        self.as_slice().is_defined(name)
    }
}

impl<T: SymbolSet + ?Sized> SymbolSet for &T {
    fn is_defined(&self, name: &str) -> bool {
        (**self).is_defined(name)
    }
}

/// Boolean expression tree of a guard such as `DEBUG && !TRACE`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expression {
    /// True iff the symbol is defined
    Symbol(String),
    /// Logical negation
    Not(Box<Expression>),
    /// Short-circuit conjunction
    And(Box<Expression>, Box<Expression>),
    /// Short-circuit disjunction
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Leaf referring to `name`
    pub fn symbol(name: impl Into<String>) -> Self {
        Expression::Symbol(name.into())
    }

    /// `!inner`
    #[must_use]
    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    /// `left && right`
    #[must_use]
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    /// `left || right`
    #[must_use]
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    /// Evaluate against the defined symbols. The right operand of `&&`/`||`
    /// is only looked at when the left one does not decide the result.
    pub fn evaluate<S: SymbolSet + ?Sized>(&self, symbols: &S) -> bool {
        match self {
            Expression::Symbol(name) => symbols.is_defined(name),
            Expression::Not(inner) => !inner.evaluate(symbols),
            Expression::And(left, right) => left.evaluate(symbols) && right.evaluate(symbols),
            Expression::Or(left, right) => left.evaluate(symbols) || right.evaluate(symbols),
        }
    }

    /// Visit every symbol name in left-to-right order
    pub fn for_each_symbol<'e>(&'e self, f: &mut impl FnMut(&'e str)) {
        match self {
            Expression::Symbol(name) => f(name),
            Expression::Not(inner) => inner.for_each_symbol(f),
            Expression::And(left, right) | Expression::Or(left, right) => {
                left.for_each_symbol(f);
                right.for_each_symbol(f);
            }
        }
    }

    /// Symbol names in left-to-right order, duplicates included
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.for_each_symbol(&mut |name| names.push(name));
        names
    }
}

/// Renders a fully bracketed form, e.g. `((A && B) || !C)`, that parses
/// back to the same tree
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Symbol(name) => f.write_str(name),
            // `!!` is not a legal token sequence
            Expression::Not(inner) if matches!(**inner, Expression::Not(_)) => {
                write!(f, "!({inner})")
            }
            Expression::Not(inner) => write!(f, "!{inner}"),
            Expression::And(left, right) => write!(f, "({left} && {right})"),
            Expression::Or(left, right) => write!(f, "({left} || {right})"),
        }
    }
}
