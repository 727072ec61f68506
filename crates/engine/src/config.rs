//! Configuration loaded from environment variables.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::query::{QueryComposer, RegexWordCount, SpaceDelimitedWordCount, WordCountExpr};

/// Which backend expression counts words for `min_word_count` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCountStrategy {
    /// Regex split on whitespace runs (default).
    Regex,
    /// Single-space arithmetic on string lengths.
    Space,
}

impl WordCountStrategy {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "regex" => Ok(Self::Regex),
            "space" => Ok(Self::Space),
            other => bail!("WORD_COUNT_STRATEGY must be 'regex' or 'space', got '{other}'"),
        }
    }

    fn expr(self) -> Arc<dyn WordCountExpr> {
        match self {
            Self::Regex => Arc::new(RegexWordCount),
            Self::Space => Arc::new(SpaceDelimitedWordCount),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-connection `statement_timeout` in milliseconds (default: unset).
    pub statement_timeout_ms: Option<u64>,

    /// Largest page size accepted by request validation (default: 500).
    pub max_page_size: i64,

    /// Word count expression for minimum word count filters (default: regex).
    pub word_count: WordCountStrategy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let statement_timeout_ms = env::var("STATEMENT_TIMEOUT_MS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("STATEMENT_TIMEOUT_MS must be a valid u64")?;

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid i64")?;

        let word_count = env::var("WORD_COUNT_STRATEGY")
            .map(|v| WordCountStrategy::parse(&v))
            .unwrap_or(Ok(WordCountStrategy::Regex))?;

        Ok(Self {
            database_url,
            database_max_connections,
            statement_timeout_ms,
            max_page_size,
            word_count,
        })
    }

    /// Composer configured with this word count strategy.
    pub fn composer(&self) -> QueryComposer {
        QueryComposer::new(self.word_count.expr())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn word_count_strategy_parsing() {
        assert_eq!(
            WordCountStrategy::parse("regex").unwrap(),
            WordCountStrategy::Regex
        );
        assert_eq!(
            WordCountStrategy::parse(" Space ").unwrap(),
            WordCountStrategy::Space
        );
        assert!(WordCountStrategy::parse("tokens").is_err());
    }
}
