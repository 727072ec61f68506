#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`FixtureStorage`] plays back canned rows through the real mapper and
//! search service, recording every statement it receives and whether the
//! row stream was released.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use futures_core::stream::BoxStream;
use parking_lot::Mutex;

use postsearch_engine::{EngineError, EngineResult, ResultRow, Statement, Storage};

/// A single cell of a fixture row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Float(f64),
    Time(DateTime<Utc>),
}

/// A row of cells, decoded with strict type checks.
#[derive(Debug, Clone)]
pub struct FixtureRow(pub Vec<Cell>);

impl FixtureRow {
    fn cell(&self, idx: usize) -> EngineResult<&Cell> {
        self.0
            .get(idx)
            .ok_or_else(|| EngineError::decode(idx, "column index out of bounds"))
    }
}

fn mismatch(idx: usize, expected: &str, found: &Cell) -> EngineError {
    EngineError::decode(idx, format!("expected {expected}, found {found:?}"))
}

impl ResultRow for FixtureRow {
    fn column_count(&self) -> usize {
        self.0.len()
    }

    fn int(&self, idx: usize) -> EngineResult<i64> {
        match self.cell(idx)? {
            Cell::Int(v) => Ok(*v),
            other => Err(mismatch(idx, "integer", other)),
        }
    }

    fn text(&self, idx: usize) -> EngineResult<String> {
        match self.cell(idx)? {
            Cell::Text(s) => Ok(s.clone()),
            other => Err(mismatch(idx, "text", other)),
        }
    }

    fn boolean(&self, idx: usize) -> EngineResult<bool> {
        match self.cell(idx)? {
            Cell::Bool(b) => Ok(*b),
            other => Err(mismatch(idx, "boolean", other)),
        }
    }

    fn float(&self, idx: usize) -> EngineResult<f64> {
        match self.cell(idx)? {
            Cell::Float(f) => Ok(*f),
            other => Err(mismatch(idx, "float", other)),
        }
    }

    fn timestamp(&self, idx: usize) -> EngineResult<DateTime<Utc>> {
        match self.cell(idx)? {
            Cell::Time(t) => Ok(*t),
            other => Err(mismatch(idx, "timestamp", other)),
        }
    }

    fn opt_timestamp(&self, idx: usize) -> EngineResult<Option<DateTime<Utc>>> {
        match self.cell(idx)? {
            Cell::Null => Ok(None),
            Cell::Time(t) => Ok(Some(*t)),
            other => Err(mismatch(idx, "timestamp or null", other)),
        }
    }
}

/// What the fixture stream yields, in order.
#[derive(Debug, Clone)]
pub enum Step {
    Row(FixtureRow),
    /// Yield a driver error.
    Fail,
    /// Never yield again (a statement that does not finish).
    Hang,
}

/// In-memory [`Storage`] returning scripted rows.
#[derive(Default)]
pub struct FixtureStorage {
    steps: Vec<Step>,
    pub statements: Mutex<Vec<Statement>>,
    pub rows_pulled: Arc<AtomicUsize>,
    pub released: Arc<AtomicBool>,
}

impl FixtureStorage {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    pub fn rows(rows: Vec<FixtureRow>) -> Self {
        Self::new(rows.into_iter().map(Step::Row).collect())
    }

    pub fn last_statement(&self) -> Statement {
        self.statements
            .lock()
            .last()
            .cloned()
            .expect("no statement executed")
    }

    pub fn was_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Flags the stream as released when dropped.
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Storage for FixtureStorage {
    type Row = FixtureRow;

    fn fetch<'a>(
        &'a self,
        statement: &'a Statement,
    ) -> BoxStream<'a, Result<FixtureRow, sqlx::Error>> {
        self.statements.lock().push(statement.clone());
        self.released.store(false, Ordering::SeqCst);

        let steps = self.steps.clone();
        let guard = ReleaseGuard(self.released.clone());
        let pulled = self.rows_pulled.clone();

        Box::pin(async_stream::stream! {
            let _guard = guard;
            for step in steps {
                match step {
                    Step::Row(row) => {
                        pulled.fetch_add(1, Ordering::SeqCst);
                        yield Ok(row);
                    }
                    Step::Fail => yield Err(sqlx::Error::PoolTimedOut),
                    Step::Hang => std::future::pending::<()>().await,
                }
            }
        })
    }
}

pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

pub fn post_row(id: i64, user_id: i64, title: &str, content: &str, published: bool) -> FixtureRow {
    FixtureRow(vec![
        Cell::Int(id),
        Cell::Int(user_id),
        Cell::Text(title.to_string()),
        Cell::Text(content.to_string()),
        Cell::Bool(published),
        Cell::Time(ts(1)),
        Cell::Time(ts(2)),
    ])
}

pub fn user_row(id: i64, name: &str) -> FixtureRow {
    FixtureRow(vec![
        Cell::Int(id),
        Cell::Text(name.to_string()),
        Cell::Text(format!("{}@example.com", name.to_lowercase())),
        Cell::Time(ts(1)),
        Cell::Time(ts(1)),
    ])
}
