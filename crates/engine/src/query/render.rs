//! Plan rendering using SeaQuery.
//!
//! A single pass turns a [`QueryPlan`] into a SeaQuery `SelectStatement`,
//! builds it for PostgreSQL and converts the collected values into the
//! statement's argument list. The result is then checked so that the
//! placeholders in the text are exactly `$1..$n` with one argument each.

use sea_query::{
    Alias, Cond, Condition, Expr, ExprTrait, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Value,
};

use super::plan::{JoinKind, OrderTarget, Projection, QueryPlan};
use super::predicate::{ColumnRef, CompareOp, Predicate};
use super::types::SortDirection;
use crate::error::{EngineError, EngineResult};
use crate::storage::{SqlArg, Statement};

/// Render a plan into statement text and ordered arguments.
pub fn render(plan: &QueryPlan) -> EngineResult<Statement> {
    if plan.projection.is_empty() {
        return Err(EngineError::QueryBuild(
            "plan has an empty projection".to_string(),
        ));
    }

    let mut query = Query::select();

    for projection in &plan.projection {
        match projection {
            Projection::Column(col) => {
                query.column(column_iden(*col));
            }
            Projection::Aggregate { expr, alias } => {
                query.expr_as(Expr::cust(*expr), Alias::new(*alias));
            }
        }
    }

    match plan.from.alias {
        Some(alias) => query.from_as(Alias::new(plan.from.name), Alias::new(alias)),
        None => query.from(Alias::new(plan.from.name)),
    };

    for join in &plan.joins {
        let join_type = match join.kind {
            JoinKind::Inner => sea_query::JoinType::InnerJoin,
            JoinKind::Left => sea_query::JoinType::LeftJoin,
        };
        let on_condition = Expr::col(column_iden(join.left)).equals(column_iden(join.right));
        match join.table.alias {
            Some(alias) => query.join_as(
                join_type,
                Alias::new(join.table.name),
                Alias::new(alias),
                on_condition,
            ),
            None => query.join(join_type, Alias::new(join.table.name), on_condition),
        };
    }

    add_predicates(&mut query, &plan.predicates)?;

    for col in &plan.group_by {
        query.group_by_col(column_iden(*col));
    }

    for clause in &plan.order {
        let order = match clause.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        match clause.target {
            OrderTarget::Column(col) => query.order_by(column_iden(col), order),
            OrderTarget::Alias(alias) => query.order_by(Alias::new(alias), order),
        };
    }

    if let Some(limit) = plan.limit {
        query.limit(limit);
    }
    if let Some(offset) = plan.offset {
        query.offset(offset);
    }

    let (sql, values) = query.build(PostgresQueryBuilder);
    let args = values
        .0
        .into_iter()
        .map(bound_arg)
        .collect::<EngineResult<Vec<_>>>()?;

    let statement = Statement { sql, args };
    check_placeholders(&statement)?;
    Ok(statement)
}

/// AND all predicates into a single WHERE condition.
fn add_predicates(query: &mut SelectStatement, predicates: &[Predicate]) -> EngineResult<()> {
    if predicates.is_empty() {
        return Ok(());
    }
    let mut all = Cond::all();
    for predicate in predicates {
        all = add_predicate(all, predicate)?;
    }
    query.cond_where(all);
    Ok(())
}

fn add_predicate(cond: Condition, predicate: &Predicate) -> EngineResult<Condition> {
    let cond = match predicate {
        Predicate::Equals { column, value } => {
            cond.add(Expr::col(column_iden(*column)).eq(sea_value(value)))
        }
        Predicate::Like { column, pattern } => {
            cond.add(Expr::col(column_iden(*column)).like(pattern.clone()))
        }
        Predicate::Or(items) => {
            if items.is_empty() {
                return Err(EngineError::QueryBuild(
                    "OR predicate has no alternatives".to_string(),
                ));
            }
            let mut any = Cond::any();
            for item in items {
                any = add_predicate(any, item)?;
            }
            cond.add(any)
        }
        Predicate::RawComparison { lhs, op, value } => {
            cond.add(raw_comparison(lhs, *op, value))
        }
    };
    Ok(cond)
}

fn raw_comparison(lhs: &str, op: CompareOp, value: &SqlArg) -> SimpleExpr {
    let lhs = Expr::cust(lhs.to_string());
    let value = sea_value(value);
    match op {
        CompareOp::Gt => lhs.gt(value),
        CompareOp::Gte => lhs.gte(value),
        CompareOp::Lt => lhs.lt(value),
        CompareOp::Lte => lhs.lte(value),
    }
}

fn column_iden(col: ColumnRef) -> (Alias, Alias) {
    (Alias::new(col.table), Alias::new(col.column))
}

fn sea_value(arg: &SqlArg) -> Value {
    match arg {
        SqlArg::Int(v) => Value::from(*v),
        SqlArg::Bool(b) => Value::from(*b),
        SqlArg::Text(s) => Value::from(s.clone()),
    }
}

/// Convert a value collected by the builder back into an argument.
fn bound_arg(value: Value) -> EngineResult<SqlArg> {
    match value {
        Value::Bool(Some(b)) => Ok(SqlArg::Bool(b)),
        Value::Int(Some(v)) => Ok(SqlArg::Int(i64::from(v))),
        Value::BigInt(Some(v)) => Ok(SqlArg::Int(v)),
        Value::Unsigned(Some(v)) => Ok(SqlArg::Int(i64::from(v))),
        Value::BigUnsigned(Some(v)) => i64::try_from(v).map(SqlArg::Int).map_err(|_| {
            EngineError::QueryBuild(format!("bound value {v} does not fit in BIGINT"))
        }),
        Value::String(Some(s)) => Ok(SqlArg::Text(s.to_string())),
        other => Err(EngineError::QueryBuild(format!(
            "unsupported bound value: {other:?}"
        ))),
    }
}

/// Verify placeholders appear as `$1..$n` in order, one per argument.
fn check_placeholders(statement: &Statement) -> EngineResult<()> {
    let found = placeholder_positions(&statement.sql);
    let expected: Vec<usize> = (1..=statement.args.len()).collect();
    if found != expected {
        return Err(EngineError::QueryBuild(format!(
            "placeholders {found:?} do not match {} bound arguments",
            statement.args.len()
        )));
    }
    Ok(())
}

/// Indices of `$n` placeholders in order of appearance, ignoring anything
/// inside single-quoted literals or double-quoted identifiers.
pub fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;
    let mut in_ident = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_ident => in_literal = !in_literal,
            '"' if !in_literal => in_ident = !in_ident,
            '$' if !in_literal && !in_ident => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                if let Ok(n) = digits.parse() {
                    positions.push(n);
                }
            }
            _ => {}
        }
    }
    positions
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::plan::TableRef;

    const TITLE: ColumnRef = ColumnRef::new("posts", "title");
    const PUBLISHED: ColumnRef = ColumnRef::new("posts", "published");

    fn posts_plan() -> QueryPlan {
        QueryPlan::select_from(TableRef::named("posts")).columns(&[TITLE])
    }

    #[test]
    fn placeholder_scan_skips_quoted_text() {
        assert_eq!(placeholder_positions("a = $1 AND b = $2"), vec![1, 2]);
        assert_eq!(placeholder_positions("a = '$1' AND b = $1"), vec![1]);
        assert_eq!(placeholder_positions(r#"SELECT "$3" FROM t"#), Vec::<usize>::new());
        assert_eq!(placeholder_positions("x = $10"), vec![10]);
        assert_eq!(placeholder_positions("price $ only"), Vec::<usize>::new());
    }

    #[test]
    fn renders_without_where_when_no_predicates() {
        let stmt = render(&posts_plan()).unwrap();
        assert!(!stmt.sql.contains("WHERE"), "{}", stmt.sql);
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn equality_value_is_bound() {
        let mut plan = posts_plan();
        plan.push_predicate(Predicate::Equals {
            column: PUBLISHED,
            value: SqlArg::Bool(false),
        });
        let stmt = render(&plan).unwrap();
        assert!(stmt.sql.contains(r#""posts"."published" = $1"#), "{}", stmt.sql);
        assert_eq!(stmt.args, vec![SqlArg::Bool(false)]);
    }

    #[test]
    fn or_is_grouped_inside_and() {
        let mut plan = posts_plan();
        plan.push_predicate(Predicate::Or(vec![
            Predicate::Like {
                column: TITLE,
                pattern: "%a%".to_string(),
            },
            Predicate::Like {
                column: ColumnRef::new("posts", "content"),
                pattern: "%a%".to_string(),
            },
        ]));
        plan.push_predicate(Predicate::Equals {
            column: PUBLISHED,
            value: SqlArg::Bool(true),
        });
        let stmt = render(&plan).unwrap();
        assert!(stmt.sql.contains(" OR "), "{}", stmt.sql);
        assert!(stmt.sql.contains(" AND "), "{}", stmt.sql);
        assert!(stmt.sql.contains('('), "OR must be parenthesized: {}", stmt.sql);
        assert_eq!(stmt.args.len(), 3);
    }

    #[test]
    fn empty_or_is_a_build_error() {
        let mut plan = posts_plan();
        plan.push_predicate(Predicate::Or(Vec::new()));
        assert!(matches!(render(&plan), Err(EngineError::QueryBuild(_))));
    }

    #[test]
    fn empty_projection_is_a_build_error() {
        let plan = QueryPlan::select_from(TableRef::named("posts"));
        assert!(matches!(render(&plan), Err(EngineError::QueryBuild(_))));
    }

    #[test]
    fn raw_comparison_binds_value() {
        let mut plan = posts_plan();
        plan.push_predicate(Predicate::RawComparison {
            lhs: "LENGTH(posts.content)".to_string(),
            op: CompareOp::Gte,
            value: SqlArg::Int(3),
        });
        let stmt = render(&plan).unwrap();
        assert!(stmt.sql.contains("(LENGTH(posts.content)) >= $1"), "{}", stmt.sql);
        assert_eq!(stmt.args, vec![SqlArg::Int(3)]);
    }

    #[test]
    fn limit_and_offset_are_bound() {
        let plan = posts_plan().paginate(10, Some(20));
        let stmt = render(&plan).unwrap();
        assert!(stmt.sql.contains("LIMIT $1"), "{}", stmt.sql);
        assert!(stmt.sql.contains("OFFSET $2"), "{}", stmt.sql);
        assert_eq!(stmt.args, vec![SqlArg::Int(10), SqlArg::Int(20)]);
    }

    #[test]
    fn oversized_limit_is_a_build_error() {
        let plan = posts_plan().paginate(u64::MAX, None);
        assert!(matches!(render(&plan), Err(EngineError::QueryBuild(_))));
    }
}
