//! INSERT builder: literal rows, query-sourced rows and conflict handling.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::builder::Query;
use crate::error::{QueryError, Result};
use crate::schema::Table;

/// What to do when an insert hits a uniqueness violation.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    /// `DO NOTHING`.
    Nothing,
    /// `DO UPDATE SET ...`.
    Update {
        /// Explicit assignments.
        set: Vec<(String, Expr)>,
        /// Columns whose proposed value is kept (`"c" = EXCLUDED."c"`).
        preserve: Vec<String>,
        /// Post-update guard predicate.
        where_clause: Option<Expr>,
    },
}

/// An `ON CONFLICT` clause.
#[derive(Debug, Clone)]
pub struct OnConflict {
    pub(crate) targets: Vec<Expr>,
    pub(crate) conflict_where: Option<Expr>,
    pub(crate) action: ConflictAction,
}

impl OnConflict {
    /// `ON CONFLICT ... DO NOTHING`.
    pub fn do_nothing() -> Self {
        Self {
            targets: Vec::new(),
            conflict_where: None,
            action: ConflictAction::Nothing,
        }
    }

    /// `ON CONFLICT ... DO UPDATE`.
    pub fn update() -> Self {
        Self {
            targets: Vec::new(),
            conflict_where: None,
            action: ConflictAction::Update {
                set: Vec::new(),
                preserve: Vec::new(),
                where_clause: None,
            },
        }
    }

    /// Conflict-target columns.
    #[must_use]
    pub fn targets(mut self, targets: Vec<Expr>) -> Self {
        self.targets = targets;
        self
    }

    /// Predicate selecting the partial unique index the conflict target
    /// refers to.
    #[must_use]
    pub fn conflict_where(mut self, predicate: Expr) -> Self {
        self.conflict_where = Some(predicate);
        self
    }

    /// Adds an assignment to the update action. No-op for `do_nothing`.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Expr>) -> Self {
        if let ConflictAction::Update { set, .. } = &mut self.action {
            set.push((column.to_string(), value.into()));
        }
        self
    }

    /// Keeps the proposed value for `column` on conflict.
    #[must_use]
    pub fn preserve(mut self, column: &str) -> Self {
        if let ConflictAction::Update { preserve, .. } = &mut self.action {
            preserve.push(column.to_string());
        }
        self
    }

    /// Guard predicate on the update action.
    #[must_use]
    pub fn update_where(mut self, predicate: Expr) -> Self {
        if let ConflictAction::Update { where_clause, .. } = &mut self.action {
            *where_clause = Some(predicate);
        }
        self
    }
}

/// Row payload of an insert.
#[derive(Debug, Clone)]
pub(crate) enum InsertRows {
    /// Literal rows as column/value pairs.
    Maps(Vec<Vec<(String, Expr)>>),
    /// Rows produced by a query.
    Query {
        columns: Vec<String>,
        query: Box<Query>,
    },
    /// `DEFAULT VALUES`.
    Defaults,
}

/// An INSERT statement under construction.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    pub(crate) table: Arc<Table>,
    pub(crate) rows: InsertRows,
    pub(crate) on_conflict: Option<OnConflict>,
    pub(crate) replace: bool,
    pub(crate) returning: Option<Vec<Expr>>,
}

impl InsertQuery {
    /// Inserts a single row.
    pub fn row(table: &Arc<Table>, values: Vec<(&str, Expr)>) -> Self {
        Self::rows(table, vec![values])
    }

    /// Inserts several rows. Column order and per-row padding are inferred
    /// when the statement is compiled.
    pub fn rows(table: &Arc<Table>, rows: Vec<Vec<(&str, Expr)>>) -> Self {
        Self {
            table: Arc::clone(table),
            rows: InsertRows::Maps(
                rows.into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|(name, expr)| (name.to_string(), expr))
                            .collect()
                    })
                    .collect(),
            ),
            on_conflict: None,
            replace: false,
            returning: None,
        }
    }

    /// Inserts positional rows. When `columns` is `None` the target list is
    /// every column in key-first order, minus an auto-increment surrogate
    /// key. Every row must match that width.
    pub fn tuples(
        table: &Arc<Table>,
        columns: Option<&[&str]>,
        rows: Vec<Vec<Expr>>,
    ) -> Result<Self> {
        let names: Vec<String> = match columns {
            Some(names) => names.iter().map(|c| (*c).to_string()).collect(),
            None => table
                .sorted_columns()
                .into_iter()
                .filter(|col| !table.is_auto_column(&col.name))
                .map(|col| col.name.clone())
                .collect(),
        };
        let mut maps = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != names.len() {
                return Err(QueryError::SchemaConsistency(format!(
                    "row carries {} values for {} columns on table {:?}",
                    row.len(),
                    names.len(),
                    table.name
                )));
            }
            maps.push(names.iter().cloned().zip(row).collect());
        }
        Ok(Self {
            table: Arc::clone(table),
            rows: InsertRows::Maps(maps),
            on_conflict: None,
            replace: false,
            returning: None,
        })
    }

    /// Inserts the rows a query produces into the named columns.
    pub fn from_query(table: &Arc<Table>, columns: &[&str], query: impl Into<Query>) -> Self {
        Self {
            table: Arc::clone(table),
            rows: InsertRows::Query {
                columns: columns.iter().map(|c| (*c).to_string()).collect(),
                query: Box::new(query.into()),
            },
            on_conflict: None,
            replace: false,
            returning: None,
        }
    }

    /// Inserts a row made entirely of defaults.
    pub fn defaults(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            rows: InsertRows::Defaults,
            on_conflict: None,
            replace: false,
            returning: None,
        }
    }

    /// Attaches an `ON CONFLICT` clause.
    #[must_use]
    pub fn on_conflict(mut self, clause: OnConflict) -> Self {
        self.on_conflict = Some(clause);
        self
    }

    /// Compiles as `INSERT OR REPLACE`.
    #[must_use]
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Replaces the RETURNING list. An empty list disables the clause even
    /// where the dialect would emit a default one.
    #[must_use]
    pub fn returning(mut self, columns: Vec<Expr>) -> Self {
        self.returning = Some(columns);
        self
    }

    /// Resolves literal rows into a rectangular grid: the inferred column
    /// order plus one padded value row per input row.
    pub(crate) fn grid(&self) -> Result<(Vec<String>, Vec<Vec<Expr>>)> {
        let rows = match &self.rows {
            InsertRows::Maps(rows) => rows,
            InsertRows::Query { columns, .. } => return Ok((columns.clone(), Vec::new())),
            InsertRows::Defaults => return Ok((Vec::new(), Vec::new())),
        };
        if rows.is_empty() {
            return Err(QueryError::EmptyMutation(format!(
                "insert into {:?} carries no rows",
                self.table.name
            )));
        }
        let mentioned: Vec<&str> = rows
            .iter()
            .flat_map(|row| row.iter().map(|(name, _)| name.as_str()))
            .collect();
        for name in &mentioned {
            if self.table.column(name).is_none() {
                return Err(QueryError::SchemaConsistency(format!(
                    "insert names column {:?}, not declared on table {:?}",
                    name, self.table.name
                )));
            }
        }
        // Key order first, then declaration order. Columns no row mentions
        // join the grid only when they carry a default, and the surrogate
        // key only when a row provides it.
        let mut columns: Vec<String> = Vec::new();
        for col in self.table.sorted_columns() {
            let provided = mentioned.contains(&col.name.as_str());
            if provided || (col.default.is_some() && !self.table.is_auto_column(&col.name)) {
                columns.push(col.name.clone());
            }
        }
        if columns.is_empty() {
            return Err(QueryError::EmptyMutation(format!(
                "insert into {:?} resolved to no columns",
                self.table.name
            )));
        }
        let mut grid = Vec::with_capacity(rows.len());
        for row in rows {
            let mut padded = Vec::with_capacity(columns.len());
            for name in &columns {
                let col = self.table.column(name).ok_or_else(|| {
                    QueryError::SchemaConsistency(format!("unknown column {name:?}"))
                })?;
                let value = row.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
                let expr = match value {
                    Some(Expr::Literal(v)) => Expr::Literal(col.coerce_value(v)),
                    Some(other) => other,
                    None => match &col.default {
                        Some(default) => Expr::Literal(default()),
                        None => {
                            return Err(QueryError::EmptyMutation(format!(
                                "row omits column {name:?} and it has no default"
                            )))
                        }
                    },
                };
                padded.push(expr);
            }
            grid.push(padded);
        }
        Ok((columns, grid))
    }
}
