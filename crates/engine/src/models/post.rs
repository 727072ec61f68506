//! Post record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::mapper::FromResultRow;
use crate::storage::ResultRow;

/// A post as projected by post searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Number of whitespace-separated words in the content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

impl FromResultRow for Post {
    const WIDTH: usize = 7;

    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self> {
        Ok(Self {
            id: row.int(0)?,
            user_id: row.int(1)?,
            title: row.text(2)?,
            content: row.text(3)?,
            published: row.boolean(4)?,
            created_at: row.timestamp(5)?,
            updated_at: row.timestamp(6)?,
        })
    }
}
