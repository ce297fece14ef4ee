//! DELETE builder.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::schema::Table;

/// A DELETE statement under construction.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    pub(crate) table: Arc<Table>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) returning: Option<Vec<Expr>>,
}

impl DeleteQuery {
    /// Starts a DELETE from `table`.
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            where_clause: None,
            returning: None,
        }
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
