//! Row sources: tables, explicit aliases and derived (subquery / VALUES)
//! sources, plus the column-access entry points used by every builder.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::builder::value::SqlValue;
use crate::builder::Query;
use crate::schema::{Column, Table, TableAlias};

/// Anything a query can select rows from.
///
/// Sources are identity-keyed: two clones of an `Arc<Table>` are the same
/// source, two distinct `Arc`s over equal descriptors are not. Alias
/// assignment in the compiler relies on this.
#[derive(Debug, Clone)]
pub enum Source {
    /// A plain table.
    Table(Arc<Table>),
    /// A table under an explicit, caller-chosen alias.
    Alias(Arc<TableAlias>),
    /// A derived source: a parenthesized subquery or VALUES list.
    Derived(Arc<DerivedSource>),
}

impl Source {
    /// Stable identity key for alias assignment.
    pub fn key(&self) -> usize {
        match self {
            Source::Table(t) => Arc::as_ptr(t) as usize,
            Source::Alias(a) => Arc::as_ptr(a) as usize,
            Source::Derived(d) => Arc::as_ptr(d) as usize,
        }
    }

    /// The caller-chosen alias, when one exists. Explicit aliases render
    /// verbatim and never consume an allocator number.
    pub fn explicit_alias(&self) -> Option<&str> {
        match self {
            Source::Table(_) => None,
            Source::Alias(a) => Some(&a.alias),
            Source::Derived(d) => d.alias.as_deref(),
        }
    }

    /// The underlying table descriptor, when the source is table-backed.
    pub fn table(&self) -> Option<&Arc<Table>> {
        match self {
            Source::Table(t) => Some(t),
            Source::Alias(a) => Some(&a.table),
            Source::Derived(_) => None,
        }
    }

    /// Looks up a column descriptor by logical name on a table-backed
    /// source.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table().and_then(|t| t.column(name))
    }
}

impl From<&Arc<Table>> for Source {
    fn from(table: &Arc<Table>) -> Self {
        Source::Table(Arc::clone(table))
    }
}

impl From<&Arc<TableAlias>> for Source {
    fn from(alias: &Arc<TableAlias>) -> Self {
        Source::Alias(Arc::clone(alias))
    }
}

impl From<&Arc<DerivedSource>> for Source {
    fn from(derived: &Arc<DerivedSource>) -> Self {
        Source::Derived(Arc::clone(derived))
    }
}

/// Body of a derived source.
#[derive(Debug, Clone)]
pub enum DerivedKind {
    /// A subquery in FROM position.
    Subquery(Query),
    /// An inline VALUES list.
    Values(Vec<Vec<SqlValue>>),
}

/// A derived row source with an optional alias and exposed column names.
#[derive(Debug, Clone)]
pub struct DerivedSource {
    /// What produces the rows.
    pub kind: DerivedKind,
    /// Alias for the derived rows.
    pub alias: Option<String>,
    /// Column names exposed to the enclosing query.
    pub columns: Vec<String>,
}

impl DerivedSource {
    /// Wraps a query as a derived source.
    pub fn subquery(query: impl Into<Query>, alias: &str, columns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            kind: DerivedKind::Subquery(query.into()),
            alias: Some(alias.to_string()),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        })
    }

    /// Wraps an inline VALUES list as a derived source.
    pub fn values(rows: Vec<Vec<SqlValue>>, alias: &str, columns: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            kind: DerivedKind::Values(rows),
            alias: Some(alias.to_string()),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        })
    }
}

/// A column referenced through a specific source. Rendering context decides
/// whether the qualifier is an alias, the table name, or nothing at all.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    /// The owning source.
    pub source: Source,
    /// Logical column name.
    pub name: String,
}

impl ColumnRef {
    /// The column descriptor, when the source is table-backed.
    pub fn descriptor(&self) -> Option<&Column> {
        self.source.column(&self.name)
    }

    /// Name used in emitted SQL.
    pub fn storage(&self) -> String {
        match self.descriptor() {
            Some(col) => col.storage().to_string(),
            None => self.name.clone(),
        }
    }

    /// Applies this column's coercion hook to literal operands.
    pub fn coerce_operand(&self, expr: Expr) -> Expr {
        let Some(col) = self.descriptor() else { return expr };
        if col.coerce.is_none() {
            return expr;
        }
        match expr {
            Expr::Literal(v) => Expr::Literal(col.coerce_value(v)),
            Expr::List(items) => Expr::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Expr::Literal(v) => Expr::Literal(col.coerce_value(v)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Column access on any source. Implemented for the `Arc`-wrapped schema
/// types so `table.col("name")` works directly.
pub trait ColumnAccess {
    /// This object as a [`Source`].
    fn source(&self) -> Source;

    /// A column expression bound to this source.
    fn col(&self, name: &str) -> Expr {
        Expr::Column(ColumnRef {
            source: self.source(),
            name: name.to_string(),
        })
    }

    /// All declared columns as expressions, in declaration order.
    fn all_cols(&self) -> Vec<Expr> {
        match self.source().table() {
            Some(table) => table
                .columns
                .iter()
                .map(|c| self.col(&c.name))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl ColumnAccess for Arc<Table> {
    fn source(&self) -> Source {
        Source::Table(Arc::clone(self))
    }
}

impl ColumnAccess for Arc<TableAlias> {
    fn source(&self) -> Source {
        Source::Alias(Arc::clone(self))
    }
}

impl ColumnAccess for Arc<DerivedSource> {
    fn source(&self) -> Source {
        Source::Derived(Arc::clone(self))
    }

    fn all_cols(&self) -> Vec<Expr> {
        self.columns.iter().map(|c| self.col(c)).collect()
    }
}
