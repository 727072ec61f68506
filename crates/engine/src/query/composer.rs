//! Query composer.
//!
//! Turns a [`SearchRequest`] into a [`QueryPlan`] for one of the fixed query
//! shapes and renders it. Each shape declares its projection and joins
//! statically; caller input only ever adds bound predicates, selects an
//! allow-listed ORDER BY entry, or sets pagination.

use std::sync::Arc;

use tracing::debug;

use super::allow_list::{POST_ORDER_FIELDS, resolve_direction};
use super::plan::{JoinKind, OrderTarget, QueryPlan, TableRef};
use super::predicate::{
    ColumnRef, CompareOp, Predicate, RegexWordCount, WordCountExpr, contains_pattern,
};
use super::render::render;
use super::types::{SearchFilters, SearchRequest, SortDirection, UserSearch, normalize_limit};
use crate::error::EngineResult;
use crate::storage::{SqlArg, Statement};

const POSTS: &str = "posts";
const USERS: &str = "users";

/// Columns of a post row, in decode order.
pub const POST_COLUMNS: [ColumnRef; 7] = [
    ColumnRef::new(POSTS, "id"),
    ColumnRef::new(POSTS, "user_id"),
    ColumnRef::new(POSTS, "title"),
    ColumnRef::new(POSTS, "content"),
    ColumnRef::new(POSTS, "published"),
    ColumnRef::new(POSTS, "created_at"),
    ColumnRef::new(POSTS, "updated_at"),
];

/// Columns of a user row, in decode order.
pub const USER_COLUMNS: [ColumnRef; 5] = [
    ColumnRef::new(USERS, "id"),
    ColumnRef::new(USERS, "name"),
    ColumnRef::new(USERS, "email"),
    ColumnRef::new(USERS, "created_at"),
    ColumnRef::new(USERS, "updated_at"),
];

const TITLE: ColumnRef = ColumnRef::new(POSTS, "title");
const CONTENT: ColumnRef = ColumnRef::new(POSTS, "content");
const OWNER: ColumnRef = ColumnRef::new(POSTS, "user_id");
const PUBLISHED: ColumnRef = ColumnRef::new(POSTS, "published");
const USER_NAME: ColumnRef = ColumnRef::new(USERS, "name");

// Aliased columns used by the aggregate shapes (`posts p`, `users u`).
const P_USER_ID: ColumnRef = ColumnRef::new("p", "user_id");
const U_ID: ColumnRef = ColumnRef::new("u", "id");
const U_NAME: ColumnRef = ColumnRef::new("u", "name");
const U_EMAIL: ColumnRef = ColumnRef::new("u", "email");

/// Builds statements for the supported query shapes.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    word_count: Arc<dyn WordCountExpr>,
}

impl Default for QueryComposer {
    fn default() -> Self {
        Self::new(Arc::new(RegexWordCount))
    }
}

impl QueryComposer {
    /// Create a composer using `word_count` for minimum word count filters.
    pub fn new(word_count: Arc<dyn WordCountExpr>) -> Self {
        Self { word_count }
    }

    /// Compose and render a request.
    ///
    /// Deterministic: the same request always yields the same text and
    /// arguments.
    pub fn compose(&self, request: &SearchRequest) -> EngineResult<Statement> {
        let plan = self.plan(request);
        let statement = render(&plan)?;
        debug!(
            sql = %statement.sql,
            args = statement.args.len(),
            "rendered statement"
        );
        Ok(statement)
    }

    /// Build the plan for a request without rendering it.
    pub fn plan(&self, request: &SearchRequest) -> QueryPlan {
        match request {
            SearchRequest::Posts(filters) => self.post_search_plan(filters),
            SearchRequest::PostCount(filters) => self.post_count_plan(filters),
            SearchRequest::Users(search) => user_search_plan(search),
            SearchRequest::PostStats => post_stats_plan(),
            SearchRequest::TopUsers { limit } => top_users_plan(*limit),
        }
    }

    fn post_search_plan(&self, filters: &SearchFilters) -> QueryPlan {
        let mut plan = QueryPlan::select_from(TableRef::named(POSTS)).columns(&POST_COLUMNS);
        self.apply_post_filters(&mut plan, filters);

        let field = POST_ORDER_FIELDS.resolve(&filters.order_by);
        if !filters.order_by.is_empty() && field != filters.order_by {
            debug!(
                requested = %filters.order_by,
                fallback = field,
                "order field not allowed; using default"
            );
        }
        let direction = resolve_direction(&filters.order_dir);

        plan.order_by(
            OrderTarget::Column(ColumnRef::new(POSTS, field)),
            direction,
        )
        .paginate(filters.effective_limit(), Some(filters.effective_offset()))
    }

    fn post_count_plan(&self, filters: &SearchFilters) -> QueryPlan {
        let mut plan =
            QueryPlan::select_from(TableRef::named(POSTS)).aggregate("COUNT(*)", "total");
        self.apply_post_filters(&mut plan, filters);
        plan
    }

    /// Add the caller's post filters, in a fixed order, as bound predicates.
    fn apply_post_filters(&self, plan: &mut QueryPlan, filters: &SearchFilters) {
        if let Some(term) = filters.query.as_deref().filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            plan.push_predicate(Predicate::Or(vec![
                Predicate::Like {
                    column: TITLE,
                    pattern: pattern.clone(),
                },
                Predicate::Like {
                    column: CONTENT,
                    pattern,
                },
            ]));
        }
        if let Some(user_id) = filters.user_id {
            plan.push_predicate(Predicate::Equals {
                column: OWNER,
                value: SqlArg::Int(user_id),
            });
        }
        if let Some(published) = filters.published {
            plan.push_predicate(Predicate::Equals {
                column: PUBLISHED,
                value: SqlArg::Bool(published),
            });
        }
        if let Some(min_words) = filters.min_word_count {
            plan.push_predicate(Predicate::RawComparison {
                lhs: self.word_count.render(CONTENT),
                op: CompareOp::Gte,
                value: SqlArg::Int(min_words),
            });
        }
    }
}

fn user_search_plan(search: &UserSearch) -> QueryPlan {
    let mut plan = QueryPlan::select_from(TableRef::named(USERS)).columns(&USER_COLUMNS);
    plan.push_predicate(Predicate::Like {
        column: USER_NAME,
        pattern: contains_pattern(&search.name),
    });
    plan.order_by(OrderTarget::Column(USER_NAME), SortDirection::Asc)
        .paginate(normalize_limit(search.limit), None)
}

fn post_stats_plan() -> QueryPlan {
    QueryPlan::select_from(TableRef::aliased(POSTS, "p"))
        .aggregate("COUNT(p.id)", "total_posts")
        .aggregate(
            "COUNT(CASE WHEN p.published = true THEN 1 END)",
            "published_posts",
        )
        .aggregate("COUNT(DISTINCT p.user_id)", "active_users")
        .aggregate(
            "CAST(COALESCE(AVG(LENGTH(p.content)), 0) AS DOUBLE PRECISION)",
            "avg_content_length",
        )
        .join(JoinKind::Inner, TableRef::aliased(USERS, "u"), P_USER_ID, U_ID)
}

fn top_users_plan(limit: i64) -> QueryPlan {
    QueryPlan::select_from(TableRef::aliased(USERS, "u"))
        .columns(&[U_ID, U_NAME, U_EMAIL])
        .aggregate("COUNT(p.id)", "post_count")
        .aggregate(
            "COUNT(CASE WHEN p.published = true THEN 1 END)",
            "published_count",
        )
        .aggregate("MAX(p.created_at)", "last_post_date")
        .join(JoinKind::Left, TableRef::aliased(POSTS, "p"), U_ID, P_USER_ID)
        .group_by(&[U_ID, U_NAME, U_EMAIL])
        .order_by(OrderTarget::Alias("post_count"), SortDirection::Desc)
        .order_by(OrderTarget::Column(U_ID), SortDirection::Asc)
        .paginate(normalize_limit(limit), None)
}
