//! Storage boundary.
//!
//! The engine never talks to a driver directly. It hands a rendered
//! [`Statement`] to a [`Storage`] implementation and reads rows back through
//! the [`ResultRow`] accessor trait, which keeps decoding independent of the
//! concrete row type.

use chrono::{DateTime, Utc};
use futures_core::stream::BoxStream;
use serde::Serialize;

use crate::error::EngineResult;

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlArg {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl From<i64> for SqlArg {
    fn from(value: i64) -> Self {
        SqlArg::Int(value)
    }
}

impl From<bool> for SqlArg {
    fn from(value: bool) -> Self {
        SqlArg::Bool(value)
    }
}

impl From<String> for SqlArg {
    fn from(value: String) -> Self {
        SqlArg::Text(value)
    }
}

impl From<&str> for SqlArg {
    fn from(value: &str) -> Self {
        SqlArg::Text(value.to_string())
    }
}

/// Rendered statement text plus its arguments, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text using `$1..$n` placeholders.
    pub sql: String,
    /// Argument `i` binds placeholder `$(i + 1)`.
    pub args: Vec<SqlArg>,
}

/// Positional access to a single result row.
///
/// Accessors return [`crate::EngineError::RowDecode`] when the column is
/// missing or holds an incompatible type.
pub trait ResultRow {
    fn column_count(&self) -> usize;
    fn int(&self, idx: usize) -> EngineResult<i64>;
    fn text(&self, idx: usize) -> EngineResult<String>;
    fn boolean(&self, idx: usize) -> EngineResult<bool>;
    fn float(&self, idx: usize) -> EngineResult<f64>;
    fn timestamp(&self, idx: usize) -> EngineResult<DateTime<Utc>>;
    fn opt_timestamp(&self, idx: usize) -> EngineResult<Option<DateTime<Utc>>>;
}

/// A relational store that executes parameterized statements.
///
/// Implementations must be safe to share between concurrent calls (e.g. a
/// pooled connection handle). Dropping the returned stream before it ends
/// must abort the statement on the server and release its connection.
pub trait Storage: Send + Sync {
    type Row: ResultRow + Send;

    fn fetch<'a>(
        &'a self,
        statement: &'a Statement,
    ) -> BoxStream<'a, Result<Self::Row, sqlx::Error>>;
}
