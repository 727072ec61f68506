//! Search request types.
//!
//! Provides the caller-facing filter values:
//! - SearchFilters: post search/count filters, ordering and pagination
//! - UserSearch: name search over users
//! - SearchRequest: one variant per supported query shape

use serde::{Deserialize, Serialize};

use super::allow_list::{POST_ORDER_FIELDS, SORT_DIRECTIONS};
use crate::error::{EngineError, EngineResult};

/// Page size used when the caller supplies a non-positive limit.
pub const DEFAULT_LIMIT: u64 = 50;

/// Filters for searching and counting posts.
///
/// Optional filters are applied only when present, so `published:
/// Some(false)` selects drafts while `None` leaves the flag unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Substring matched against title or content.
    #[serde(default)]
    pub query: Option<String>,

    /// Owning user.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Published flag.
    #[serde(default)]
    pub published: Option<bool>,

    /// Minimum number of whitespace-separated words in the content.
    #[serde(default)]
    pub min_word_count: Option<i64>,

    /// Requested order field; unknown values fall back to `created_at`.
    #[serde(default)]
    pub order_by: String,

    /// `ASC` or `DESC` (any case); anything else means `DESC`.
    #[serde(default)]
    pub order_dir: String,

    /// Page size; values <= 0 mean [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: i64,

    /// Rows to skip; negative values are treated as 0.
    #[serde(default)]
    pub offset: i64,
}

impl SearchFilters {
    /// Page size that will be rendered for this request.
    pub fn effective_limit(&self) -> u64 {
        normalize_limit(self.limit)
    }

    /// Offset that will be rendered for this request.
    pub fn effective_offset(&self) -> u64 {
        u64::try_from(self.offset).unwrap_or(0)
    }

    /// Strict validation for callers that prefer rejecting bad input over
    /// the composer's silent fallbacks.
    ///
    /// `max_limit` bounds the page size; the composer itself enforces no
    /// upper bound.
    pub fn validate(&self, max_limit: i64) -> EngineResult<()> {
        if self.limit > max_limit {
            return Err(EngineError::InvalidFilter(format!(
                "limit {} exceeds maximum of {max_limit}",
                self.limit
            )));
        }
        if self.offset < 0 {
            return Err(EngineError::InvalidFilter(
                "offset must not be negative".to_string(),
            ));
        }
        if self.user_id.is_some_and(|id| id <= 0) {
            return Err(EngineError::InvalidFilter(
                "user_id must be positive".to_string(),
            ));
        }
        if self.min_word_count.is_some_and(|n| n < 0) {
            return Err(EngineError::InvalidFilter(
                "min_word_count must not be negative".to_string(),
            ));
        }
        if !self.order_by.is_empty() && !POST_ORDER_FIELDS.contains(&self.order_by) {
            return Err(EngineError::InvalidFilter(format!(
                "cannot order by '{}'; expected one of: {}",
                self.order_by,
                POST_ORDER_FIELDS.entries().join(", ")
            )));
        }
        if !self.order_dir.is_empty()
            && !SORT_DIRECTIONS.contains(&self.order_dir.to_ascii_uppercase())
        {
            return Err(EngineError::InvalidFilter(format!(
                "order direction must be ASC or DESC, got '{}'",
                self.order_dir
            )));
        }
        Ok(())
    }
}

/// Name search over users, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSearch {
    /// Substring matched against the user's name. Empty matches everyone.
    #[serde(default)]
    pub name: String,

    /// Page size; values <= 0 mean [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: i64,
}

impl UserSearch {
    pub fn new(name: impl Into<String>, limit: i64) -> Self {
        Self {
            name: name.into(),
            limit,
        }
    }

    pub fn validate(&self, max_limit: i64) -> EngineResult<()> {
        if self.limit > max_limit {
            return Err(EngineError::InvalidFilter(format!(
                "limit {} exceeds maximum of {max_limit}",
                self.limit
            )));
        }
        Ok(())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// One request per supported query shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRequest {
    /// Filtered, ordered, paginated post list.
    Posts(SearchFilters),
    /// Number of posts matching the filters; ordering and paging are ignored.
    PostCount(SearchFilters),
    /// Users whose name contains a substring.
    Users(UserSearch),
    /// Aggregate statistics across all posts.
    PostStats,
    /// Users ranked by number of posts.
    TopUsers { limit: i64 },
}

/// Map a caller-supplied page size onto the rendered one.
pub fn normalize_limit(limit: i64) -> u64 {
    u64::try_from(limit)
        .ok()
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LIMIT)
}
