//! Aggregate views computed per query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::mapper::FromResultRow;
use crate::storage::ResultRow;

/// Totals across all posts that have an owning user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostStats {
    pub total_posts: i64,
    pub published_posts: i64,
    /// Distinct users with at least one post.
    pub active_users: i64,
    /// Mean content length in characters; 0 when there are no posts.
    pub avg_content_length: f64,
}

impl FromResultRow for PostStats {
    const WIDTH: usize = 4;

    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self> {
        Ok(Self {
            total_posts: row.int(0)?,
            published_posts: row.int(1)?,
            active_users: row.int(2)?,
            avg_content_length: row.float(3)?,
        })
    }
}

/// A user with post counts, as returned by the top users ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithStats {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub post_count: i64,
    pub published_count: i64,
    /// Creation time of the newest post; `None` for users without posts.
    pub last_post_date: Option<DateTime<Utc>>,
}

impl FromResultRow for UserWithStats {
    const WIDTH: usize = 6;

    fn decode<R: ResultRow>(row: &R) -> EngineResult<Self> {
        Ok(Self {
            id: row.int(0)?,
            name: row.text(1)?,
            email: row.text(2)?,
            post_count: row.int(3)?,
            published_count: row.int(4)?,
            last_post_date: row.opt_timestamp(5)?,
        })
    }
}
