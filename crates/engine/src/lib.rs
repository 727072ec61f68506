//! Postsearch Engine Library
//!
//! Parameterized query composition, search and ranking over posts and
//! users. The `postsearch` binary is a thin command-line caller.

pub mod config;
pub mod db;
pub mod error;
pub mod mapper;
pub mod models;
pub mod query;
pub mod search;
pub mod storage;

pub use config::Config;
pub use db::PgStorage;
pub use error::{EngineError, EngineResult};
pub use search::SearchService;
pub use storage::{ResultRow, SqlArg, Statement, Storage};
