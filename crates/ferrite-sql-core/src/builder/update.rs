//! UPDATE builder.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::builder::source::{ColumnAccess, Source};
use crate::schema::Table;

/// An UPDATE statement under construction. Assignment targets render bare;
/// columns of the updated table elsewhere in the statement render under the
/// table name.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    pub(crate) table: Arc<Table>,
    pub(crate) set: Vec<(String, Expr)>,
    pub(crate) from: Vec<Source>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) returning: Option<Vec<Expr>>,
}

impl UpdateQuery {
    /// Starts an UPDATE of `table`.
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            set: Vec::new(),
            from: Vec::new(),
            where_clause: None,
            returning: None,
        }
    }

    /// Adds an assignment. Literal values run through the column's coercion
    /// hook.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Expr>) -> Self {
        let value = match (self.table.column(column), value.into()) {
            (Some(col), Expr::Literal(v)) => Expr::Literal(col.coerce_value(v)),
            (_, other) => other,
        };
        self.set.push((column.to_string(), value));
        self
    }

    /// Adds an auxiliary FROM source for join-style updates.
    #[must_use]
    pub fn from(mut self, source: &impl ColumnAccess) -> Self {
        self.from.push(source.source());
        self
    }

    /// AND-composes a predicate into the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing & predicate,
            None => predicate,
        });
        self
    }

    /// Replaces the RETURNING list.
    #[must_use]
    pub fn returning(mut self, columns: Vec<Expr>) -> Self {
        self.returning = Some(columns);
        self
    }
}
