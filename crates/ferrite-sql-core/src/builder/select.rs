//! SELECT builder: projection, joins, filtering, grouping and ordering.

use std::sync::Arc;

use crate::ast::expression::Expr;
use crate::builder::source::{ColumnAccess, ColumnRef, Source};
use crate::error::{QueryError, Result};
use crate::schema::{ForeignKey, Table};

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// One resolved join edge.
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub(crate) source: Source,
    pub(crate) kind: JoinKind,
    pub(crate) on: Option<Expr>,
    /// Attribute name the joined rows surface under, when the condition
    /// carried a projection alias.
    pub(crate) attr: Option<String>,
}

/// A SELECT statement under construction.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub(crate) columns: Vec<Expr>,
    pub(crate) from: Vec<Source>,
    pub(crate) joins: Vec<JoinStep>,
    pub(crate) where_clause: Option<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Option<Expr>,
    pub(crate) order_by: Vec<Expr>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) distinct: bool,
    cursor: Source,
}

impl SelectQuery {
    /// Starts a SELECT over one source, projecting all of its columns.
    pub fn new(from: &impl ColumnAccess) -> Self {
        Self::from_source(from.source())
    }

    /// Starts a SELECT over a [`Source`].
    pub fn from_source(source: Source) -> Self {
        let columns = default_columns(&source);
        Self {
            columns,
            cursor: source.clone(),
            from: vec![source],
            joins: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    /// Replaces the projection outright. An empty list compiles to a
    /// syntactically empty select list.
    #[must_use]
    pub fn columns(mut self, columns: Vec<Expr>) -> Self {
        self.columns = columns;
        self
    }

    /// Appends to the projection.
    #[must_use]
    pub fn columns_extend(mut self, columns: Vec<Expr>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Replaces the FROM source list. The join cursor moves to the first
    /// replacement source.
    #[must_use]
    pub fn from_(mut self, sources: Vec<Source>) -> Self {
        if let Some(first) = sources.first() {
            self.cursor = first.clone();
        }
        self.from = sources;
        self
    }

    /// Inner join on the single declared foreign key between the current
    /// source and `target`, in either direction.
    pub fn join(self, target: &impl ColumnAccess) -> Result<Self> {
        self.join_kind(target, JoinKind::Inner)
    }

    /// Join with an explicit flavor, condition still resolved from the
    /// schema. Exactly one candidate foreign key must exist.
    pub fn join_kind(mut self, target: &impl ColumnAccess, kind: JoinKind) -> Result<Self> {
        let target_source = target.source();
        let on = if kind == JoinKind::Cross {
            None
        } else {
            Some(resolve_join(&self.cursor, &target_source)?)
        };
        self.joins.push(JoinStep {
            source: target_source.clone(),
            kind,
            on,
            attr: None,
        });
        self.cursor = target_source;
        Ok(self)
    }

    /// Join with an explicit condition. Wrapping the condition in a
    /// projection alias names the attribute the joined rows surface under;
    /// that name must not shadow a foreign-key column of the join pair.
    pub fn join_on(mut self, target: &impl ColumnAccess, kind: JoinKind, on: Expr) -> Result<Self> {
        let target_source = target.source();
        let (on, attr) = match on {
            Expr::Alias { expr, alias } => {
                check_alias_conflict(&self.cursor, &target_source, &alias)?;
                (*expr, Some(alias))
            }
            other => (other, None),
        };
        self.joins.push(JoinStep {
            source: target_source.clone(),
            kind,
            on: Some(on),
            attr,
        });
        self.cursor = target_source;
        Ok(self)
    }

    /// Moves the join anchor back to a source that is already part of the
    /// query, so the next `join` hangs off it.
    pub fn switch(self, to: &impl ColumnAccess) -> Result<Self> {
        let source = to.source();
        self.switch_to(&source)
    }

    /// `switch` for a [`Source`] held directly.
    pub fn switch_to(mut self, source: &Source) -> Result<Self> {
        let known = self.from.iter().any(|s| s.key() == source.key())
            || self.joins.iter().any(|j| j.source.key() == source.key());
        if !known {
            return Err(QueryError::SchemaConsistency(format!(
                "cannot switch to {:?}: not a source of this query",
                source_name(source)
            )));
        }
        self.cursor = source.clone();
        Ok(self)
    }

    /// The source joined under an explicit attribute name.
    pub fn joined_attr(&self, attr: &str) -> Option<&Source> {
        self.joins
            .iter()
            .find(|j| j.attr.as_deref() == Some(attr))
            .map(|j| &j.source)
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

    /// Replaces the GROUP BY list.
    #[must_use]
    pub fn group_by(mut self, terms: Vec<Expr>) -> Self {
        self.group_by = terms;
        self
    }

    /// Appends to the GROUP BY list.
    #[must_use]
    pub fn group_by_extend(mut self, terms: Vec<Expr>) -> Self {
        self.group_by.extend(terms);
        self
    }

    /// AND-composes a predicate into the HAVING clause.
    #[must_use]
    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing & predicate,
            None => predicate,
        });
        self
    }

    /// Replaces the ORDER BY list.
    #[must_use]
    pub fn order_by(mut self, terms: Vec<Expr>) -> Self {
        self.order_by = terms;
        self
    }

    /// Appends to the ORDER BY list.
    #[must_use]
    pub fn order_by_extend(mut self, terms: Vec<Expr>) -> Self {
        self.order_by.extend(terms);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// The first FROM source.
    pub fn primary_source(&self) -> &Source {
        &self.from[0]
    }

    /// Sources this query reads from, FROM entries first, then joins in
    /// join order.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.from.iter().chain(self.joins.iter().map(|j| &j.source))
    }
}

/// All columns of a source, in declaration order.
pub(crate) fn default_columns(source: &Source) -> Vec<Expr> {
    match source {
        Source::Derived(d) => d
            .columns
            .iter()
            .map(|name| {
                Expr::Column(ColumnRef {
                    source: source.clone(),
                    name: name.clone(),
                })
            })
            .collect(),
        _ => match source.table() {
            Some(table) => table
                .columns
                .iter()
                .map(|c| {
                    Expr::Column(ColumnRef {
                        source: source.clone(),
                        name: c.name.clone(),
                    })
                })
                .collect(),
            None => Vec::new(),
        },
    }
}

fn source_col(source: &Source, name: &str) -> Expr {
    Expr::Column(ColumnRef {
        source: source.clone(),
        name: name.to_string(),
    })
}

fn source_name(source: &Source) -> String {
    if let Some(alias) = source.explicit_alias() {
        return alias.to_string();
    }
    match source.table() {
        Some(t) => t.name.clone(),
        None => "<derived>".to_string(),
    }
}

/// The column a foreign key points at: the explicit target column, or the
/// target table's primary key.
fn fk_target_column<'a>(fk: &'a ForeignKey, target: &'a Table) -> Result<&'a str> {
    if let Some(col) = &fk.target_column {
        return Ok(col);
    }
    match target.pk_columns().first() {
        Some(pk) => Ok(pk),
        None => Err(QueryError::SchemaConsistency(format!(
            "foreign key {:?} on {:?} references {:?}, which has no primary key",
            fk.column, fk.relation, target.name
        ))),
    }
}

/// Resolves the single foreign key between two table-backed sources and
/// builds the join equality.
pub(crate) fn resolve_join(lhs: &Source, rhs: &Source) -> Result<Expr> {
    let (Some(lhs_table), Some(rhs_table)) = (lhs.table(), rhs.table()) else {
        return Err(QueryError::JoinResolution {
            lhs: source_name(lhs),
            rhs: source_name(rhs),
            candidates: 0,
        });
    };
    let forward = lhs_table.keys_to(&rhs_table.name);
    let reverse = rhs_table.keys_to(&lhs_table.name);
    if forward.len() + reverse.len() != 1 {
        return Err(QueryError::JoinResolution {
            lhs: lhs_table.name.clone(),
            rhs: rhs_table.name.clone(),
            candidates: forward.len() + reverse.len(),
        });
    }
    if let Some(fk) = forward.first() {
        let target_col = fk_target_column(fk, rhs_table)?;
        Ok(source_col(lhs, &fk.column).eq(source_col(rhs, target_col)))
    } else {
        let fk = reverse[0];
        let target_col = fk_target_column(fk, lhs_table)?;
        Ok(source_col(rhs, &fk.column).eq(source_col(lhs, target_col)))
    }
}

/// An explicit join attribute must not shadow a foreign-key column linking
/// the two sources.
fn check_alias_conflict(lhs: &Source, rhs: &Source, alias: &str) -> Result<()> {
    for (owner, other) in [(lhs, rhs), (rhs, lhs)] {
        let (Some(owner_table), Some(other_table)) = (owner.table(), other.table()) else {
            continue;
        };
        for fk in owner_table.keys_to(&other_table.name) {
            if let Some(col) = owner_table.column(&fk.column) {
                if col.storage() == alias {
                    return Err(QueryError::AliasConflict {
                        alias: alias.to_string(),
                        column: col.storage().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
