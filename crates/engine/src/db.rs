//! PostgreSQL storage and connection pool management.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_core::stream::BoxStream;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Executor, Postgres, Row};
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::storage::{ResultRow, SqlArg, Statement, Storage};

/// Create a PostgreSQL connection pool.
///
/// When a statement timeout is configured it is applied to every pooled
/// connection, so a runaway query fails with a driver error instead of
/// holding the connection.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let statement_timeout_ms = config.statement_timeout_ms;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if let Some(ms) = statement_timeout_ms {
                    conn.execute(format!("SET statement_timeout = {ms}").as_str())
                        .await?;
                }
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// [`Storage`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Storage for PgStorage {
    type Row = PgRow;

    /// Stream rows over a dedicated pooled connection.
    ///
    /// Dropping the stream before it is exhausted cancels the statement on
    /// the server before the connection goes back to the pool.
    fn fetch<'a>(&'a self, statement: &'a Statement) -> BoxStream<'a, Result<PgRow, sqlx::Error>> {
        Box::pin(async_stream::stream! {
            let mut conn = match self.pool.acquire().await {
                Ok(conn) => conn,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let pid = match sqlx::query_scalar::<Postgres, i32>("SELECT pg_backend_pid()")
                .fetch_one(&mut *conn)
                .await
            {
                Ok(pid) => pid,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut in_flight = InFlight {
                conn: Some(conn),
                pid,
                options: self.pool.connect_options(),
            };
            let mut failure = None;
            if let Some(conn) = in_flight.conn.as_deref_mut() {
                let mut query = sqlx::query::<Postgres>(&statement.sql);
                for arg in &statement.args {
                    query = match arg {
                        SqlArg::Int(v) => query.bind(*v),
                        SqlArg::Bool(b) => query.bind(*b),
                        SqlArg::Text(s) => query.bind(s.as_str()),
                    };
                }
                let mut rows = query.fetch(conn);
                while let Some(row) = rows.next().await {
                    match row {
                        Ok(row) => yield Ok(row),
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            in_flight.finish();

            if let Some(e) = failure {
                yield Err(e);
            }
        })
    }
}

/// A pooled connection with a statement that may still be running.
///
/// Unless [`InFlight::finish`] is called, dropping it asks the server to
/// cancel the backend's current statement and only then releases the
/// connection, so the cancel can never reach a later statement.
struct InFlight {
    conn: Option<PoolConnection<Postgres>>,
    pid: i32,
    options: Arc<PgConnectOptions>,
}

impl InFlight {
    /// The statement completed; release the connection as is.
    fn finish(&mut self) {
        drop(self.conn.take());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let pid = self.pid;
        let options = self.options.clone();
        debug!(pid, "statement abandoned; cancelling backend");
        runtime.spawn(async move {
            if let Err(e) = cancel_backend(&options, pid).await {
                warn!(error = %e, pid, "failed to cancel backend statement");
            }
            drop(conn);
        });
    }
}

/// Cancel whatever `pid` is running, over a connection outside the pool.
async fn cancel_backend(options: &PgConnectOptions, pid: i32) -> Result<(), sqlx::Error> {
    let mut conn = PgConnection::connect_with(options).await?;
    sqlx::query("SELECT pg_cancel_backend($1)")
        .bind(pid)
        .execute(&mut conn)
        .await?;
    conn.close().await
}

fn column<'r, T>(row: &'r PgRow, idx: usize) -> EngineResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(idx)
        .map_err(|e| EngineError::decode(idx, e.to_string()))
}

impl ResultRow for PgRow {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn int(&self, idx: usize) -> EngineResult<i64> {
        column(self, idx)
    }

    fn text(&self, idx: usize) -> EngineResult<String> {
        column(self, idx)
    }

    fn boolean(&self, idx: usize) -> EngineResult<bool> {
        column(self, idx)
    }

    fn float(&self, idx: usize) -> EngineResult<f64> {
        column(self, idx)
    }

    fn timestamp(&self, idx: usize) -> EngineResult<DateTime<Utc>> {
        column(self, idx)
    }

    fn opt_timestamp(&self, idx: usize) -> EngineResult<Option<DateTime<Utc>>> {
        column(self, idx)
    }
}
