//! CREATE INDEX builder.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::schema::Table;

/// A CREATE INDEX statement under construction. Column references render
/// bare; the statement always carries `IF NOT EXISTS`.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub(crate) table: Arc<Table>,
    pub(crate) name: Option<String>,
    pub(crate) columns: Vec<Expr>,
    pub(crate) unique: bool,
    pub(crate) where_clause: Option<Expr>,
}

impl IndexQuery {
    /// Starts an index over `columns` of `table`.
    pub fn new(table: &Arc<Table>, columns: Vec<Expr>) -> Self {
        Self {
            table: Arc::clone(table),
            name: None,
            columns,
            unique: false,
            where_clause: None,
        }
    }

    /// Overrides the derived index name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Makes the index partial.
    #[must_use]
    pub fn where_clause(mut self, predicate: Expr) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    /// The index name: the override if set, otherwise the table name joined
    /// with the storage names of the plain column terms.
    pub(crate) fn derived_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut parts = vec![self.table.name.clone()];
        for expr in &self.columns {
            if let Some(col) = expr.column_ref() {
                parts.push(col.storage());
            }
        }
        parts.join("_")
    }
}
