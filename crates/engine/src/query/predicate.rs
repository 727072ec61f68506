//! WHERE-clause building blocks.

use std::fmt;

use crate::storage::SqlArg;

/// A column known at compile time, optionally qualified by a table alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl ColumnRef {
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }

    /// Unquoted `table.column`, for use inside backend expression fragments.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// Comparison operator for [`Predicate::RawComparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single filtering condition. Values are always carried as bound
/// arguments; only static identifiers and backend fragments reach the text.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = $n`
    Equals { column: ColumnRef, value: SqlArg },
    /// `column LIKE $n`
    Like { column: ColumnRef, pattern: String },
    /// Disjunction of the inner predicates. Must not be empty.
    Or(Vec<Predicate>),
    /// `<lhs> <op> $n` where `lhs` is a backend expression fragment.
    RawComparison {
        lhs: String,
        op: CompareOp,
        value: SqlArg,
    },
}

/// Backend expression that counts whitespace-separated words in a column.
///
/// The composer only knows it needs "word count of content"; how that is
/// spelled depends on the backend.
pub trait WordCountExpr: fmt::Debug + Send + Sync {
    fn render(&self, column: ColumnRef) -> String;
}

/// PostgreSQL regex split over trimmed text; empty or NULL text counts as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexWordCount;

impl WordCountExpr for RegexWordCount {
    fn render(&self, column: ColumnRef) -> String {
        format!(
            r"COALESCE(array_length(regexp_split_to_array(NULLIF(btrim({}), ''), '\s+'), 1), 0)",
            column.qualified()
        )
    }
}

/// Portable space counting: `LENGTH(c) - LENGTH(REPLACE(c, ' ', '')) + 1`.
///
/// Counts single spaces only, so runs of spaces inflate the count and empty
/// text counts as one word.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceDelimitedWordCount;

impl WordCountExpr for SpaceDelimitedWordCount {
    fn render(&self, column: ColumnRef) -> String {
        let col = column.qualified();
        format!("LENGTH({col}) - LENGTH(REPLACE({col}, ' ', '')) + 1")
    }
}

/// Pattern matching `term` anywhere in the column.
///
/// The term is wrapped as-is, so `%` and `_` inside it keep their LIKE
/// meaning. It is still only ever bound, never written into the text.
pub fn contains_pattern(term: &str) -> String {
    format!("%{term}%")
}
