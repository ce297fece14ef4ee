//! Model-level select wrapper: resolves lookup-path filters into joins and
//! predicates on the underlying builder.

pub mod filter;

use std::collections::HashMap;
use std::sync::Arc;

use ferrite_sql_core::{
    ColumnAccess, ColumnRef, Expr, ForeignKey, JoinKind, Query, QueryError, SelectQuery, Source,
    Table,
};

use crate::error::{OrmError, Result};
use crate::query::filter::{Dq, FilterOp};
use crate::registry::Registry;

/// A select over a registered model. Filters traverse relation paths,
/// joining each (source, relation) pair once; traversing the same pair
/// again reuses the earlier join.
#[derive(Debug, Clone)]
pub struct ModelSelect<'r> {
    registry: &'r Registry,
    root: Arc<Table>,
    query: SelectQuery,
    joined: HashMap<(usize, String), Source>,
}

impl<'r> ModelSelect<'r> {
    /// Starts a select over the named model.
    pub fn new(registry: &'r Registry, model: &str) -> Result<Self> {
        let root = Arc::clone(registry.get(model)?);
        let query = SelectQuery::new(&root);
        Ok(Self {
            registry,
            root,
            query,
            joined: HashMap::new(),
        })
    }

    /// The root model's table.
    pub fn model(&self) -> &Arc<Table> {
        &self.root
    }

    /// Resolves a filter tree and AND-composes it into the WHERE clause.
    pub fn filter(mut self, dq: Dq) -> Result<Self> {
        let expr = self.resolve_node(&dq)?;
        self.query = self.query.where_clause(expr);
        Ok(self)
    }

    /// Shorthand for filtering on the negation of a tree.
    pub fn exclude(self, dq: Dq) -> Result<Self> {
        self.filter(!dq)
    }

    /// Joins an explicit target with an ON predicate. Aliasing the
    /// predicate names the join, and filter paths may traverse that name
    /// as if it were a relation.
    pub fn join_on(mut self, target: &impl ColumnAccess, kind: JoinKind, on: Expr) -> Result<Self> {
        self.query = self.query.clone().join_on(target, kind, on)?;
        Ok(self)
    }

    /// Replaces the projection.
    #[must_use]
    pub fn columns(mut self, columns: Vec<Expr>) -> Self {
        self.query = self.query.columns(columns);
        self
    }

    /// Replaces the ORDER BY list.
    #[must_use]
    pub fn order_by(mut self, terms: Vec<Expr>) -> Self {
        self.query = self.query.order_by(terms);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    /// Unwraps into the underlying builder.
    pub fn into_select(self) -> SelectQuery {
        self.query
    }

    fn resolve_node(&mut self, node: &Dq) -> Result<Expr> {
        match node {
            Dq::Cond { path, value } => self.resolve_cond(path, value.clone()),
            Dq::And(lhs, rhs) => Ok(self.resolve_node(lhs)? & self.resolve_node(rhs)?),
            Dq::Or(lhs, rhs) => Ok(self.resolve_node(lhs)? | self.resolve_node(rhs)?),
            Dq::Not(inner) => Ok(self.resolve_node(inner)?.negate()),
        }
    }

    fn resolve_cond(&mut self, path: &str, value: Expr) -> Result<Expr> {
        let segments: Vec<&str> = path.split("__").collect();
        // An operator suffix needs at least one segment before it; a lone
        // segment is always a column name.
        let (op, lookup) = match segments.split_last() {
            Some((last, rest)) if !rest.is_empty() => match FilterOp::parse(last) {
                Some(op) => (op, rest.to_vec()),
                None => (FilterOp::Eq, segments.clone()),
            },
            _ => (FilterOp::Eq, segments.clone()),
        };
        let Some((terminal, relations)) = lookup.split_last() else {
            return Err(OrmError::Path {
                path: path.to_string(),
                reason: "empty lookup".to_string(),
            });
        };
        let mut current = self.query.primary_source().clone();
        for segment in relations {
            current = self.traverse(&current, segment, path)?;
        }
        // A terminal relation name compares against its key column.
        let column_name = match current.table().and_then(|t| t.relation(terminal)) {
            Some(fk) => fk.column.clone(),
            None => {
                if current.column(terminal).is_none() {
                    return Err(OrmError::Path {
                        path: path.to_string(),
                        reason: format!(
                            "{:?} is not a column of {:?}",
                            terminal,
                            source_label(&current)
                        ),
                    });
                }
                (*terminal).to_string()
            }
        };
        let column = col_of(&current, &column_name);
        op.apply(column, value).ok_or_else(|| OrmError::Path {
            path: path.to_string(),
            reason: "isnull takes a boolean".to_string(),
        })
    }

    fn traverse(&mut self, current: &Source, segment: &str, path: &str) -> Result<Source> {
        // An explicitly named join wins over schema relations, so aliased
        // joins of the same table stay addressable.
        if let Some(joined) = self.query.joined_attr(segment) {
            return Ok(joined.clone());
        }
        let key = (current.key(), segment.to_string());
        if let Some(existing) = self.joined.get(&key) {
            return Ok(existing.clone());
        }
        if let Some(table) = current.table().cloned() {
            if let Some(fk) = table.relation(segment).cloned() {
                let target = self.fresh_target(self.registry.get(&fk.target_table)?);
                self.add_join(current, &target, &fk, true)?;
                let source = Source::from(&target);
                self.joined.insert(key, source.clone());
                return Ok(source);
            }
            if let Some((dependent, fk)) = self.registry.backref(&table.name, segment) {
                let dependent = self.fresh_target(&dependent);
                self.add_join(current, &dependent, &fk, false)?;
                let source = Source::from(&dependent);
                self.joined.insert(key, source.clone());
                return Ok(source);
            }
        }
        Err(OrmError::Path {
            path: path.to_string(),
            reason: format!(
                "{:?} is not a relation of {:?}",
                segment,
                source_label(current)
            ),
        })
    }

    /// A second relation into an already-joined table gets its own table
    /// identity, so the two joins keep distinct aliases and ON predicates.
    fn fresh_target(&self, table: &Arc<Table>) -> Arc<Table> {
        let key = Arc::as_ptr(table) as usize;
        if self.query.sources().any(|s| s.key() == key) {
            Arc::new(Table::clone(table))
        } else {
            Arc::clone(table)
        }
    }

    fn add_join(
        &mut self,
        from: &Source,
        to: &Arc<Table>,
        fk: &ForeignKey,
        forward: bool,
    ) -> Result<()> {
        let target_table = if forward { to } else { from.table().unwrap_or(to) };
        let target_col = match &fk.target_column {
            Some(col) => col.clone(),
            None => target_table
                .pk_columns()
                .first()
                .map(|c| (*c).to_string())
                .ok_or_else(|| {
                    OrmError::Query(QueryError::SchemaConsistency(format!(
                        "foreign key {:?} references {:?}, which has no primary key",
                        fk.column, target_table.name
                    )))
                })?,
        };
        let to_source = Source::from(to);
        let on = if forward {
            col_of(from, &fk.column).eq(col_of(&to_source, &target_col))
        } else {
            col_of(&to_source, &fk.column).eq(col_of(from, &target_col))
        };
        self.query = self
            .query
            .clone()
            .switch_to(from)?
            .join_on(to, JoinKind::Inner, on)?;
        Ok(())
    }
}

fn col_of(source: &Source, name: &str) -> Expr {
    Expr::Column(ColumnRef {
        source: source.clone(),
        name: name.to_string(),
    })
}

fn source_label(source: &Source) -> String {
    match source {
        Source::Table(t) => t.name.clone(),
        Source::Alias(a) => a.alias.clone(),
        Source::Derived(d) => d.alias.clone().unwrap_or_else(|| "subquery".to_string()),
    }
}

impl From<ModelSelect<'_>> for Query {
    fn from(select: ModelSelect<'_>) -> Query {
        Query::Select(select.query)
    }
}
