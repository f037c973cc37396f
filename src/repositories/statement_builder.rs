//! Composition of parameterized statements whose shape depends on the request:
//! partial updates and ownership-filtered selects/deletes.

use sqlx::{Postgres, QueryBuilder};

use crate::repositories::OwnerScope;

/// A single `column = value` pair of an UPDATE statement.
pub trait Assignment {
    /// Column written by this assignment
    fn column(&self) -> &'static str;

    /// Bind the assigned value onto the statement
    fn push_value(self, builder: &mut QueryBuilder<'_, Postgres>);
}

/// Returned when an update would not assign any column
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("update contains no fields")]
pub struct EmptyUpdate;

/// Build `UPDATE <table> SET .. WHERE id = $n [AND owner_id = $m] RETURNING <columns>`
/// touching only the given assignments.
pub fn compose_update<'args, A: Assignment>(
    table: &str,
    returning: &str,
    id: i32,
    scope: OwnerScope,
    assignments: Vec<A>,
) -> Result<QueryBuilder<'args, Postgres>, EmptyUpdate> {
    if assignments.is_empty() {
        return Err(EmptyUpdate);
    }

    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", table));
    for (index, assignment) in assignments.into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push(assignment.column());
        builder.push(" = ");
        assignment.push_value(&mut builder);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    push_owner_predicate(&mut builder, scope, " AND ");
    builder.push(" RETURNING ");
    builder.push(returning);

    Ok(builder)
}

/// Build `SELECT <columns> FROM <table> [WHERE owner_id = $1] ORDER BY <order_by>`
pub fn compose_list<'args>(
    table: &str,
    columns: &str,
    scope: OwnerScope,
    order_by: &str,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", columns, table));
    push_owner_predicate(&mut builder, scope, " WHERE ");
    builder.push(" ORDER BY ");
    builder.push(order_by);
    builder
}

/// Build `SELECT <columns> FROM <table> WHERE id = $1 [AND owner_id = $2]`
pub fn compose_find<'args>(
    table: &str,
    columns: &str,
    id: i32,
    scope: OwnerScope,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {} WHERE id = ", columns, table));
    builder.push_bind(id);
    push_owner_predicate(&mut builder, scope, " AND ");
    builder
}

/// Build `DELETE FROM <table> WHERE id = $1 [AND owner_id = $2] RETURNING id`
pub fn compose_delete<'args>(table: &str, id: i32, scope: OwnerScope) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", table));
    builder.push_bind(id);
    push_owner_predicate(&mut builder, scope, " AND ");
    builder.push(" RETURNING id");
    builder
}

fn push_owner_predicate(builder: &mut QueryBuilder<'_, Postgres>, scope: OwnerScope, joiner: &str) {
    if let OwnerScope::Owner(owner_id) = scope {
        builder.push(joiner);
        builder.push("owner_id = ");
        builder.push_bind(owner_id);
    }
}
