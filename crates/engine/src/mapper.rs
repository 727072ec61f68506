//! Result mapper.
//!
//! Executes a rendered statement through a [`Storage`] and decodes each row
//! into a typed record. A call either returns every row or an error; rows
//! decoded before a failure are discarded.

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::storage::{ResultRow, Statement, Storage};

/// A record decoded positionally from a result row.
pub trait FromResultRow: Sized {
    /// Number of columns the projection for this record produces.
    const WIDTH: usize;

    /// Decode a row whose width has already been checked.
    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self>;

    /// Check the row width, then decode.
    fn from_row<R: ResultRow>(row: &R) -> EngineResult<Self> {
        let count = row.column_count();
        if count != Self::WIDTH {
            return Err(EngineError::decode(
                count.min(Self::WIDTH),
                format!("expected {} columns, found {count}", Self::WIDTH),
            ));
        }
        Self::decode(row)
    }
}

/// Scalar `COUNT(*)` style results.
impl FromResultRow for i64 {
    const WIDTH: usize = 1;

    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self> {
        row.int(0)
    }
}

/// Execute `statement` and decode every row.
///
/// The row stream is dropped on every return path, which releases the
/// cursor and aborts a statement that is still running; when `cancel` fires
/// first [`EngineError::Cancelled`] is returned.
pub async fn fetch_all<S, T>(
    storage: &S,
    statement: &Statement,
    cancel: Option<&CancellationToken>,
) -> EngineResult<Vec<T>>
where
    S: Storage,
    T: FromResultRow,
{
    let mut rows = storage.fetch(statement);
    let mut records = Vec::new();

    loop {
        let next = tokio::select! {
            biased;
            () = cancelled(cancel) => {
                debug!(decoded = records.len(), "query cancelled; discarding rows");
                return Err(EngineError::Cancelled);
            }
            next = rows.next() => next,
        };

        match next {
            None => break,
            Some(Err(e)) => return Err(EngineError::Execution(e)),
            Some(Ok(row)) => match T::from_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(error = %e, row = records.len(), "row decode failed; aborting result set");
                    return Err(e);
                }
            },
        }
    }

    debug!(rows = records.len(), "result set decoded");
    Ok(records)
}

/// Execute a statement expected to yield exactly one row (aggregates).
///
/// The first row is decoded; any further rows are read and discarded so the
/// statement runs to completion instead of being cancelled on drop.
pub async fn fetch_one<S, T>(
    storage: &S,
    statement: &Statement,
    cancel: Option<&CancellationToken>,
) -> EngineResult<T>
where
    S: Storage,
    T: FromResultRow,
{
    let mut rows = storage.fetch(statement);
    let mut first = None;

    loop {
        let next = tokio::select! {
            biased;
            () = cancelled(cancel) => return Err(EngineError::Cancelled),
            next = rows.next() => next,
        };

        match next {
            None => break,
            Some(Err(e)) => return Err(EngineError::Execution(e)),
            Some(Ok(row)) if first.is_none() => first = Some(T::from_row(&row)?),
            Some(Ok(_)) => {}
        }
    }

    first.ok_or(EngineError::Execution(sqlx::Error::RowNotFound))
}

/// Resolves when the token fires; never resolves without one.
async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    struct Cells(Vec<i64>);

    impl ResultRow for Cells {
        fn column_count(&self) -> usize {
            self.0.len()
        }
        fn int(&self, idx: usize) -> EngineResult<i64> {
            self.0
                .get(idx)
                .copied()
                .ok_or_else(|| EngineError::decode(idx, "missing"))
        }
        fn text(&self, idx: usize) -> EngineResult<String> {
            Err(EngineError::decode(idx, "not text"))
        }
        fn boolean(&self, idx: usize) -> EngineResult<bool> {
            Err(EngineError::decode(idx, "not bool"))
        }
        fn float(&self, idx: usize) -> EngineResult<f64> {
            Err(EngineError::decode(idx, "not float"))
        }
        fn timestamp(&self, idx: usize) -> EngineResult<DateTime<Utc>> {
            Err(EngineError::decode(idx, "not timestamp"))
        }
        fn opt_timestamp(&self, idx: usize) -> EngineResult<Option<DateTime<Utc>>> {
            Err(EngineError::decode(idx, "not timestamp"))
        }
    }

    #[test]
    fn scalar_decodes_single_column() {
        assert_eq!(i64::from_row(&Cells(vec![42])).unwrap(), 42);
    }

    #[test]
    fn width_mismatch_is_decode_error() {
        let err = i64::from_row(&Cells(vec![1, 2])).unwrap_err();
        assert!(
            matches!(err, EngineError::RowDecode { column: 1, .. }),
            "{err:?}"
        );

        let err = i64::from_row(&Cells(vec![])).unwrap_err();
        assert!(
            matches!(err, EngineError::RowDecode { column: 0, .. }),
            "{err:?}"
        );
    }
}
