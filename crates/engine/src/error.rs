//! Engine error types.

use thiserror::Error;

/// Errors produced while composing, executing or decoding a search query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected by caller-side validation. The composer itself never raises
    /// this; it falls back to safe defaults instead.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The plan could not be rendered into a complete statement.
    #[error("failed to build query: {0}")]
    QueryBuild(String),

    #[error("query execution failed")]
    Execution(#[from] sqlx::Error),

    /// A returned row did not match the projection it was decoded against.
    #[error("failed to decode row at column {column}: {reason}")]
    RowDecode { column: usize, reason: String },

    #[error("query cancelled")]
    Cancelled,
}

impl EngineError {
    /// Build a row decode error for the given zero-based column.
    pub fn decode(column: usize, reason: impl Into<String>) -> Self {
        EngineError::RowDecode {
            column,
            reason: reason.into(),
        }
    }
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
