//! Postsearch command-line front end.
//!
//! Runs one search against the configured database and prints the result
//! as JSON. Ctrl-C cancels the running query.
//!
//! Usage:
//!   postsearch posts --query rust --published true --limit 10
//!   postsearch top-users --limit 5

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use postsearch_engine::db::{self, PgStorage};
use postsearch_engine::query::{SearchFilters, UserSearch};
use postsearch_engine::{Config, SearchService};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search posts.
    Posts(FilterArgs),
    /// Count posts matching the filters.
    Count(FilterArgs),
    /// Search users by name.
    Users {
        /// Substring of the user's name.
        #[arg(long, default_value = "")]
        name: String,
        /// Page size (<= 0 means 50).
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        limit: i64,
    },
    /// Aggregate post statistics.
    Stats,
    /// Users ranked by number of posts.
    TopUsers {
        /// Number of users to return (<= 0 means 50).
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        limit: i64,
    },
    /// Check database connectivity.
    Health,
}

/// Post filters as command-line flags.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Substring matched against title or content.
    #[arg(long)]
    query: Option<String>,
    /// Owning user id.
    #[arg(long)]
    user_id: Option<i64>,
    /// Published flag (true or false).
    #[arg(long)]
    published: Option<bool>,
    /// Minimum number of words in the content.
    #[arg(long)]
    min_words: Option<i64>,
    /// title, created_at or updated_at.
    #[arg(long, default_value = "")]
    order_by: String,
    /// ASC or DESC.
    #[arg(long, default_value = "")]
    order_dir: String,
    /// Page size (<= 0 means 50).
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    limit: i64,
    /// Rows to skip.
    #[arg(long, default_value = "0")]
    offset: i64,
}

impl From<FilterArgs> for SearchFilters {
    fn from(args: FilterArgs) -> Self {
        Self {
            query: args.query,
            user_id: args.user_id,
            published: args.published,
            min_word_count: args.min_words,
            order_by: args.order_by,
            order_dir: args.order_dir,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    let pool = db::create_pool(&config)
        .await
        .context("failed to create database pool")?;
    info!(
        max_connections = config.database_max_connections,
        "Database connection established"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling query");
            ctrl_c.cancel();
        }
    });

    let service = SearchService::with_composer(PgStorage::new(pool), config.composer());
    let cancel = Some(&cancel);

    match cli.command {
        Command::Posts(args) => {
            let filters = SearchFilters::from(args);
            filters.validate(config.max_page_size)?;
            print_json(&service.search_posts(&filters, cancel).await?)
        }
        Command::Count(args) => {
            let filters = SearchFilters::from(args);
            filters.validate(config.max_page_size)?;
            print_json(&service.count_posts(&filters, cancel).await?)
        }
        Command::Users { name, limit } => {
            let search = UserSearch::new(name, limit);
            search.validate(config.max_page_size)?;
            print_json(&service.search_users(&search, cancel).await?)
        }
        Command::Stats => print_json(&service.post_stats(cancel).await?),
        Command::TopUsers { limit } => print_json(&service.top_users(limit, cancel).await?),
        Command::Health => {
            let healthy = db::check_health(service.storage().pool()).await;
            print_json(&serde_json::json!({ "healthy": healthy }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
