//! Query composition module.
//!
//! This module provides:
//! - QueryComposer: plans and renders each supported query shape
//! - QueryPlan / Predicate: the explicit intermediate representation
//! - AllowList: static sets for values that cannot be bound
//! - Types: SearchFilters, UserSearch, SearchRequest, SortDirection

pub mod allow_list;
mod composer;
pub mod plan;
pub mod predicate;
mod render;
pub mod types;

pub use allow_list::{AllowList, POST_ORDER_FIELDS, SORT_DIRECTIONS, resolve_direction};
pub use composer::{POST_COLUMNS, QueryComposer, USER_COLUMNS};
pub use plan::QueryPlan;
pub use predicate::{
    ColumnRef, CompareOp, Predicate, RegexWordCount, SpaceDelimitedWordCount, WordCountExpr,
};
pub use render::{placeholder_positions, render};
pub use types::{
    DEFAULT_LIMIT, SearchFilters, SearchRequest, SortDirection, UserSearch, normalize_limit,
};
