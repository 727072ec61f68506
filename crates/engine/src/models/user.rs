//! User record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::mapper::FromResultRow;
use crate::storage::ResultRow;

/// A user as projected by user searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromResultRow for User {
    const WIDTH: usize = 5;

    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self> {
        Ok(Self {
            id: row.int(0)?,
            name: row.text(1)?,
            email: row.text(2)?,
            created_at: row.timestamp(3)?,
            updated_at: row.timestamp(4)?,
        })
    }
}
