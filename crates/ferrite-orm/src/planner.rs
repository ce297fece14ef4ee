//! Recursive-delete planning.
//!
//! Deleting a row must first delete every row that transitively references
//! it. The planner walks the dependency graph outward from the target
//! model, builds one DELETE per dependent table, and orders the statements
//! so that no statement runs before the rows referencing its table are
//! gone.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;

use ferrite_sql_core::{
    ColumnAccess, DeleteQuery, Expr, ForeignKey, QueryError, SelectQuery, SqlValue, Table,
};

use crate::error::{OrmError, Result};
use crate::registry::Registry;

/// Identity of the row being deleted: column name to value. Must cover the
/// primary key and any column a dependent's foreign key targets directly.
pub type RowIdentity = HashMap<String, SqlValue>;

/// Plans the statements that delete one row and everything referencing it.
///
/// Each table joins the plan through the first foreign-key chain that
/// reaches it; a direct dependent filters by equality on the referenced
/// value, a transitive one by `IN` over a subquery chain back to the root.
/// The root's own DELETE comes last.
pub fn recursive_delete_plan(
    registry: &Registry,
    root: &Arc<Table>,
    row: &RowIdentity,
) -> Result<Vec<DeleteQuery>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(root.name.clone());
    let mut discovered: Vec<(Arc<Table>, Expr)> = Vec::new();
    let mut queue: VecDeque<(Arc<Table>, Option<Expr>)> = VecDeque::new();
    queue.push_back((Arc::clone(root), None));

    while let Some((parent, parent_pred)) = queue.pop_front() {
        for (dependent, fk) in registry.dependents(&parent.name) {
            if visited.contains(&dependent.name) {
                continue;
            }
            let target_col = referenced_column(&fk, &parent)?;
            let pred = match &parent_pred {
                None => {
                    let value = row.get(&target_col).cloned().ok_or_else(|| {
                        OrmError::Query(QueryError::SchemaConsistency(format!(
                            "row identity for {:?} is missing column {:?}",
                            parent.name, target_col
                        )))
                    })?;
                    dependent.col(&fk.column).eq(Expr::Literal(value))
                }
                Some(parent_pred) => {
                    let subquery = SelectQuery::new(&parent)
                        .columns(vec![parent.col(&target_col)])
                        .where_clause(parent_pred.clone());
                    dependent.col(&fk.column).in_(subquery)
                }
            };
            visited.insert(dependent.name.clone());
            discovered.push((Arc::clone(&dependent), pred.clone()));
            queue.push_back((dependent, Some(pred)));
        }
    }

    // Emit a table only once nothing still pending references it. Ties and
    // cycles fall back to discovery order; a table's own self-reference
    // never blocks it.
    let mut remaining = discovered;
    let mut plan = Vec::with_capacity(remaining.len() + 1);
    while !remaining.is_empty() {
        let idx = remaining
            .iter()
            .position(|(table, _)| {
                !remaining.iter().any(|(other, _)| {
                    other.name != table.name && !other.keys_to(&table.name).is_empty()
                })
            })
            .unwrap_or(0);
        let (table, pred) = remaining.remove(idx);
        plan.push(DeleteQuery::new(&table).where_clause(pred));
    }

    plan.push(DeleteQuery::new(root).where_clause(identity_predicate(root, row)?));
    debug!(
        model = %root.name,
        statements = plan.len(),
        "planned recursive delete"
    );
    Ok(plan)
}

/// The column a foreign key references on its target.
fn referenced_column(fk: &ForeignKey, target: &Table) -> Result<String> {
    if let Some(col) = &fk.target_column {
        return Ok(col.clone());
    }
    target
        .pk_columns()
        .first()
        .map(|c| (*c).to_string())
        .ok_or_else(|| {
            OrmError::Query(QueryError::SchemaConsistency(format!(
                "foreign key {:?} references {:?}, which has no primary key",
                fk.column, target.name
            )))
        })
}

/// Equality over the primary key, AND-composed for composite keys.
fn identity_predicate(table: &Arc<Table>, row: &RowIdentity) -> Result<Expr> {
    let pk = table.pk_columns();
    if pk.is_empty() {
        return Err(OrmError::Query(QueryError::SchemaConsistency(format!(
            "cannot delete from {:?}: no primary key",
            table.name
        ))));
    }
    let mut pred: Option<Expr> = None;
    for column in pk {
        let value = row.get(column).cloned().ok_or_else(|| {
            OrmError::Query(QueryError::SchemaConsistency(format!(
                "row identity for {:?} is missing key column {column:?}",
                table.name
            )))
        })?;
        let term = table.col(column).eq(Expr::Literal(value));
        pred = Some(match pred {
            Some(existing) => existing & term,
            None => term,
        });
    }
    Ok(pred.unwrap_or(Expr::Literal(SqlValue::Bool(true))))
}
