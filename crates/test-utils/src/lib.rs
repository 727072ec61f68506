#![allow(clippy::expect_used)]
//! Postsearch test utilities.
//!
//! Helpers for integration testing: a disposable PostgreSQL schema, user
//! and post fixture builders, and assertion helpers for rendered SQL.

use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Row};
use uuid::Uuid;

/// Tables the engine queries.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE posts (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    published BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// A PostgreSQL schema private to one test.
///
/// Every pooled connection has its `search_path` pointed at the schema, so
/// tests can run concurrently against one database without seeing each
/// other's rows.
pub struct TestDatabase {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDatabase {
    /// Create a fresh schema with the engine tables.
    ///
    /// Returns `None` when `DATABASE_URL` is not set so callers can skip.
    pub async fn connect() -> Option<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").ok()?;

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("Failed to connect to DATABASE_URL");

        let schema = format!("test_{}", Uuid::now_v7().simple());
        admin
            .execute(format!("CREATE SCHEMA {schema}").as_str())
            .await
            .expect("Failed to create test schema");

        let search_path = format!("SET search_path TO {schema}");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .expect("Failed to connect test pool");

        pool.execute(SCHEMA_SQL)
            .await
            .expect("Failed to create test tables");

        Some(Self {
            pool,
            admin,
            schema,
        })
    }

    /// Drop the schema and everything in it.
    pub async fn cleanup(self) {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .expect("Failed to drop test schema");
    }
}

/// Create a test user with default values.
pub fn test_user(name: &str) -> TestUser {
    TestUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub name: String,
    pub email: String,
}

impl TestUser {
    /// Set the email.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    /// Insert the user and return its id.
    pub async fn insert(&self, pool: &PgPool) -> i64 {
        sqlx::query("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id")
            .bind(&self.name)
            .bind(&self.email)
            .fetch_one(pool)
            .await
            .expect("Failed to insert test user")
            .get(0)
    }
}

/// Create a test post with default values: unpublished, empty content,
/// created now.
pub fn test_post(user_id: i64, title: &str) -> TestPost {
    TestPost {
        user_id,
        title: title.to_string(),
        content: String::new(),
        published: false,
        created_at: Utc::now(),
    }
}

/// A test post builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPost {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl TestPost {
    /// Set the content.
    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    /// Set as published.
    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    /// Set as unpublished.
    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    /// Set creation time relative to now.
    pub fn created_days_ago(mut self, days: i64) -> Self {
        self.created_at = Utc::now() - Duration::days(days);
        self
    }

    /// Insert the post and return its id.
    pub async fn insert(&self, pool: &PgPool) -> i64 {
        sqlx::query(
            r#"
            INSERT INTO posts (user_id, title, content, published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(self.user_id)
        .bind(&self.title)
        .bind(&self.content)
        .bind(self.published)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .expect("Failed to insert test post")
        .get(0)
    }
}

/// Assertion helpers for rendered statements.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_builder() {
        let post = test_post(3, "Hello")
            .with_content("some words here")
            .published()
            .created_days_ago(2);

        assert_eq!(post.user_id, 3);
        assert_eq!(post.title, "Hello");
        assert!(post.published);
        assert!(post.created_at < Utc::now() - Duration::days(1));
    }

    #[test]
    fn test_post_defaults_to_unpublished() {
        let post = test_post(1, "Draft");
        assert!(!post.published);
        assert!(post.content.is_empty());
        assert!(!post.clone().published().unpublished().published);
    }

    #[test]
    fn test_user_builder() {
        let user = test_user("Ada Lovelace");
        assert_eq!(user.email, "ada.lovelace@example.com");

        let user = user.with_email("ada@example.org");
        assert_eq!(user.email, "ada@example.org");
    }

    #[test]
    fn test_assertions() {
        assert::contains("SELECT 1", "SELECT");
        assert::not_contains("SELECT 1", "DROP");
    }
}
