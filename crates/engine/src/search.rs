//! Search service.
//!
//! Composes statements for each query shape, runs them through the storage
//! collaborator and returns typed records.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::EngineResult;
use crate::mapper::{fetch_all, fetch_one};
use crate::models::{Post, PostStats, User, UserWithStats};
use crate::query::{QueryComposer, SearchFilters, SearchRequest, UserSearch};
use crate::storage::Storage;

/// Search, count and ranking over posts and users.
///
/// Stateless apart from its collaborators; share one instance across tasks
/// when the storage is a pooled handle.
#[derive(Debug, Clone)]
pub struct SearchService<S> {
    storage: S,
    composer: QueryComposer,
}

impl<S: Storage> SearchService<S> {
    /// Create a service with the default composer.
    pub fn new(storage: S) -> Self {
        Self::with_composer(storage, QueryComposer::default())
    }

    pub fn with_composer(storage: S, composer: QueryComposer) -> Self {
        Self { storage, composer }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Posts matching `filters`, ordered and paginated.
    pub async fn search_posts(
        &self,
        filters: &SearchFilters,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<Vec<Post>> {
        let statement = self
            .composer
            .compose(&SearchRequest::Posts(filters.clone()))?;
        let posts: Vec<Post> = fetch_all(&self.storage, &statement, cancel).await?;
        debug!(returned = posts.len(), "post search completed");
        Ok(posts)
    }

    /// Number of posts matching `filters`, ignoring ordering and pagination.
    pub async fn count_posts(
        &self,
        filters: &SearchFilters,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<i64> {
        let statement = self
            .composer
            .compose(&SearchRequest::PostCount(filters.clone()))?;
        fetch_one(&self.storage, &statement, cancel).await
    }

    /// Users whose name contains `search.name`, ordered by name.
    pub async fn search_users(
        &self,
        search: &UserSearch,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<Vec<User>> {
        let statement = self
            .composer
            .compose(&SearchRequest::Users(search.clone()))?;
        let users: Vec<User> = fetch_all(&self.storage, &statement, cancel).await?;
        debug!(returned = users.len(), "user search completed");
        Ok(users)
    }

    /// Aggregate statistics across all posts.
    pub async fn post_stats(&self, cancel: Option<&CancellationToken>) -> EngineResult<PostStats> {
        let statement = self.composer.compose(&SearchRequest::PostStats)?;
        fetch_one(&self.storage, &statement, cancel).await
    }

    /// Users ranked by post count, most active first.
    pub async fn top_users(
        &self,
        limit: i64,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<Vec<UserWithStats>> {
        let statement = self
            .composer
            .compose(&SearchRequest::TopUsers { limit })?;
        fetch_all(&self.storage, &statement, cancel).await
    }
}
