//! Query plan: the composer's description of a statement before rendering.

use super::predicate::{ColumnRef, Predicate};
use super::types::SortDirection;

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Column(ColumnRef),
    /// Static aggregate expression with an output alias.
    Aggregate {
        expr: &'static str,
        alias: &'static str,
    },
}

/// A table in FROM or JOIN position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub name: &'static str,
    pub alias: Option<&'static str>,
}

impl TableRef {
    pub const fn named(name: &'static str) -> Self {
        Self { name, alias: None }
    }

    pub const fn aliased(name: &'static str, alias: &'static str) -> Self {
        Self {
            name,
            alias: Some(alias),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// `<kind> JOIN table ON left = right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// What an ORDER BY entry sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTarget {
    Column(ColumnRef),
    /// Output alias of an aggregate projection.
    Alias(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderClause {
    pub target: OrderTarget,
    pub direction: SortDirection,
}

/// Everything needed to render one SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub projection: Vec<Projection>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    /// AND-combined in order.
    pub predicates: Vec<Predicate>,
    pub group_by: Vec<ColumnRef>,
    pub order: Vec<OrderClause>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryPlan {
    /// Empty plan selecting from `from`.
    pub fn select_from(from: TableRef) -> Self {
        Self {
            projection: Vec::new(),
            from,
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn columns(mut self, columns: &[ColumnRef]) -> Self {
        self.projection
            .extend(columns.iter().copied().map(Projection::Column));
        self
    }

    pub fn aggregate(mut self, expr: &'static str, alias: &'static str) -> Self {
        self.projection.push(Projection::Aggregate { expr, alias });
        self
    }

    pub fn join(mut self, kind: JoinKind, table: TableRef, left: ColumnRef, right: ColumnRef) -> Self {
        self.joins.push(JoinClause {
            kind,
            table,
            left,
            right,
        });
        self
    }

    pub fn group_by(mut self, columns: &[ColumnRef]) -> Self {
        self.group_by.extend_from_slice(columns);
        self
    }

    pub fn order_by(mut self, target: OrderTarget, direction: SortDirection) -> Self {
        self.order.push(OrderClause { target, direction });
        self
    }

    pub fn paginate(mut self, limit: u64, offset: Option<u64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn push_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }
}
