//! Statement compiler: walks a [`Query`] and produces the SQL text plus its
//! ordered parameter list.
//!
//! Alias numbering is deterministic: sources are numbered `t1`, `t2`, ... in
//! the order they are assigned, FROM entries before joins, outer query
//! before embedded ones. Explicit aliases render verbatim and never consume
//! a number. Mutation statements register their target under the bare table
//! name, so predicate columns of the target qualify by table name while
//! assignment targets and insert column lists render unqualified.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::ast::expression::Expr;
use crate::builder::compound::CompoundSelect;
use crate::builder::delete::DeleteQuery;
use crate::builder::index::IndexQuery;
use crate::builder::insert::{ConflictAction, InsertQuery, InsertRows, OnConflict};
use crate::builder::select::SelectQuery;
use crate::builder::source::{ColumnRef, DerivedKind, Source};
use crate::builder::update::UpdateQuery;
use crate::builder::value::SqlValue;
use crate::builder::Query;
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::schema::Table;

/// Compiles queries against one dialect.
pub struct Compiler<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> Compiler<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Compiles a statement into SQL text and its ordered parameters.
    pub fn compile(&self, query: impl Into<Query>) -> Result<(String, Vec<SqlValue>)> {
        let query = query.into();
        let mut ctx = Context::new(self.dialect);
        ctx.statement(&query)?;
        debug!(
            dialect = self.dialect.name(),
            params = ctx.params.len(),
            sql = %ctx.sql,
            "compiled statement"
        );
        Ok((ctx.sql, ctx.params))
    }
}

/// Scoped `tN` numbering, keyed by source identity.
struct AliasAllocator {
    counter: usize,
    scopes: Vec<HashMap<usize, String>>,
    depth: usize,
}

impl AliasAllocator {
    fn new() -> Self {
        Self {
            counter: 0,
            scopes: vec![HashMap::new()],
            depth: 0,
        }
    }

    /// Enters an embedded scope. Re-entering at a depth already visited
    /// reuses that depth's map, so sibling subqueries over the same source
    /// share a number.
    fn push(&mut self) {
        self.depth += 1;
        if self.depth >= self.scopes.len() {
            self.scopes.push(HashMap::new());
        }
    }

    fn pop(&mut self) {
        self.depth -= 1;
    }

    /// Registers `key` under a fixed name in the current scope.
    fn seed(&mut self, key: usize, name: &str) {
        self.scopes[self.depth].insert(key, name.to_string());
    }

    /// Numbers `key` in the current scope, ignoring outer scopes.
    fn assign(&mut self, key: usize) -> String {
        if let Some(existing) = self.scopes[self.depth].get(&key) {
            return existing.clone();
        }
        self.counter += 1;
        let name = format!("t{}", self.counter);
        self.scopes[self.depth].insert(key, name.clone());
        name
    }

    /// Looks `key` up innermost-first, numbering it here when no scope
    /// knows it.
    fn resolve(&mut self, key: usize) -> String {
        for scope in self.scopes[..=self.depth].iter().rev() {
            if let Some(name) = scope.get(&key) {
                return name.clone();
            }
        }
        self.assign(key)
    }
}

struct Context<'a> {
    dialect: &'a dyn Dialect,
    sql: String,
    params: Vec<SqlValue>,
    aliases: AliasAllocator,
    bare_columns: bool,
}

impl<'a> Context<'a> {
    fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            aliases: AliasAllocator::new(),
            bare_columns: false,
        }
    }

    fn push_sql(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn quoted(&mut self, ident: &str) {
        let quoted = self.dialect.quote_identifier(ident);
        self.sql.push_str(&quoted);
    }

    fn param(&mut self, value: SqlValue) {
        self.sql.push_str(self.dialect.parameter_placeholder());
        self.params.push(value);
    }

    fn bare<F: FnOnce(&mut Self) -> Result<()>>(&mut self, f: F) -> Result<()> {
        let saved = self.bare_columns;
        self.bare_columns = true;
        let out = f(self);
        self.bare_columns = saved;
        out
    }

    fn statement(&mut self, query: &Query) -> Result<()> {
        match query {
            Query::Select(q) => self.select(q),
            Query::Insert(q) => self.insert(q),
            Query::Update(q) => self.update(q),
            Query::Delete(q) => self.delete(q),
            Query::Compound(q) => self.compound(q),
            Query::Index(q) => self.index(q),
        }
    }

    // -- expressions ------------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Column(col) => {
                self.column(col);
                Ok(())
            }
            Expr::Literal(value) => {
                self.param(value.clone());
                Ok(())
            }
            Expr::List(items) => {
                self.push_sql("(");
                self.comma_exprs(items)?;
                self.push_sql(")");
                Ok(())
            }
            Expr::Function { name, args } => {
                self.push_sql(name);
                // A lone subquery argument supplies the call parentheses.
                if let [Expr::Subquery(q)] = args.as_slice() {
                    self.embedded(q)
                } else {
                    self.push_sql("(");
                    self.comma_exprs(args)?;
                    self.push_sql(")");
                    Ok(())
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                self.push_sql("(");
                self.expr(lhs)?;
                self.push_sql(" ");
                self.push_sql(op.as_str());
                self.push_sql(" ");
                self.expr(rhs)?;
                self.push_sql(")");
                Ok(())
            }
            Expr::Unary { op, expr } => {
                self.push_sql(op.as_str());
                self.expr(expr)
            }
            Expr::Alias { expr, alias } => {
                self.expr(expr)?;
                self.push_sql(" AS ");
                self.quoted(alias);
                Ok(())
            }
            Expr::Ordered { expr, direction } => {
                self.expr(expr)?;
                self.push_sql(" ");
                self.push_sql(direction.as_str());
                Ok(())
            }
            Expr::Subquery(query) => self.embedded(query),
            Expr::Raw { sql, params } => {
                self.push_sql(sql);
                self.params.extend(params.iter().cloned());
                Ok(())
            }
            Expr::CompositeKey { source, columns } => {
                self.push_sql("(");
                for (i, name) in columns.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.column(&ColumnRef {
                        source: source.clone(),
                        name: name.clone(),
                    });
                }
                self.push_sql(")");
                Ok(())
            }
        }
    }

    fn comma_exprs(&mut self, items: &[Expr]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push_sql(", ");
            }
            self.expr(item)?;
        }
        Ok(())
    }

    fn column(&mut self, col: &ColumnRef) {
        let storage = col.storage();
        if self.bare_columns {
            self.quoted(&storage);
            return;
        }
        let qualifier = match col.source.explicit_alias() {
            Some(alias) => alias.to_string(),
            None => self.aliases.resolve(col.source.key()),
        };
        self.quoted(&qualifier);
        self.push_sql(".");
        self.quoted(&storage);
    }

    /// An embedded select-like query. Compounds restart alias numbering in
    /// a private allocator; plain selects share the statement counter
    /// inside a nested scope.
    fn embedded(&mut self, query: &Query) -> Result<()> {
        self.push_sql("(");
        if matches!(query, Query::Compound(_)) {
            let outer = std::mem::replace(&mut self.aliases, AliasAllocator::new());
            let out = self.statement(query);
            self.aliases = outer;
            out?;
        } else {
            self.aliases.push();
            let out = self.statement(query);
            self.aliases.pop();
            out?;
        }
        self.push_sql(")");
        Ok(())
    }

    // -- sources ----------------------------------------------------------

    fn table_name(&mut self, table: &Table) {
        if let Some(schema) = &table.schema {
            self.quoted(schema);
            self.push_sql(".");
        }
        self.quoted(&table.name);
    }

    fn source(&mut self, source: &Source) -> Result<()> {
        match source {
            Source::Table(table) => {
                self.table_name(table);
                let alias = self.aliases.resolve(source.key());
                self.push_sql(" AS ");
                self.quoted(&alias);
                Ok(())
            }
            Source::Alias(aliased) => {
                self.table_name(&aliased.table);
                self.push_sql(" AS ");
                self.quoted(&aliased.alias);
                Ok(())
            }
            Source::Derived(derived) => {
                match &derived.kind {
                    DerivedKind::Subquery(query) => self.embedded(query)?,
                    DerivedKind::Values(rows) => {
                        self.push_sql("(VALUES ");
                        for (i, row) in rows.iter().enumerate() {
                            if i > 0 {
                                self.push_sql(", ");
                            }
                            self.push_sql("(");
                            for (j, value) in row.iter().enumerate() {
                                if j > 0 {
                                    self.push_sql(", ");
                                }
                                self.param(value.clone());
                            }
                            self.push_sql(")");
                        }
                        self.push_sql(")");
                    }
                }
                let alias = match &derived.alias {
                    Some(alias) => alias.clone(),
                    None => self.aliases.resolve(source.key()),
                };
                self.push_sql(" AS ");
                self.quoted(&alias);
                if matches!(derived.kind, DerivedKind::Values(_)) && !derived.columns.is_empty() {
                    self.push_sql("(");
                    for (i, name) in derived.columns.iter().enumerate() {
                        if i > 0 {
                            self.push_sql(", ");
                        }
                        self.quoted(name);
                    }
                    self.push_sql(")");
                }
                Ok(())
            }
        }
    }

    // -- statements -------------------------------------------------------

    fn select(&mut self, query: &SelectQuery) -> Result<()> {
        // Number row sources before anything that might reference them:
        // FROM entries first, joins in join order.
        for src in query.sources() {
            if src.explicit_alias().is_none() {
                self.aliases.assign(src.key());
            }
        }
        self.push_sql("SELECT ");
        if query.distinct {
            self.push_sql("DISTINCT ");
        }
        self.comma_exprs(&query.columns)?;
        self.push_sql(" FROM ");
        for (i, src) in query.from.iter().enumerate() {
            if i > 0 {
                self.push_sql(", ");
            }
            self.source(src)?;
        }
        for join in &query.joins {
            self.push_sql(" ");
            self.push_sql(join.kind.as_str());
            self.push_sql(" ");
            self.source(&join.source)?;
            if let Some(on) = &join.on {
                self.push_sql(" ON ");
                self.expr(on)?;
            }
        }
        if let Some(predicate) = &query.where_clause {
            self.push_sql(" WHERE ");
            self.expr(predicate)?;
        }
        if !query.group_by.is_empty() {
            self.push_sql(" GROUP BY ");
            self.comma_exprs(&query.group_by)?;
        }
        if let Some(predicate) = &query.having {
            self.push_sql(" HAVING ");
            self.expr(predicate)?;
        }
        if !query.order_by.is_empty() {
            self.push_sql(" ORDER BY ");
            self.comma_exprs(&query.order_by)?;
        }
        self.limit_offset(query.limit, query.offset)
    }

    /// `LIMIT`/`OFFSET`, both bound as parameters. An offset without a
    /// limit binds `LIMIT -1` so the clause stays valid everywhere.
    fn limit_offset(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<()> {
        if limit.is_some() || offset.is_some() {
            self.push_sql(" LIMIT ");
            self.param(SqlValue::Int(limit.unwrap_or(-1)));
        }
        if let Some(offset) = offset {
            self.push_sql(" OFFSET ");
            self.param(SqlValue::Int(offset));
        }
        Ok(())
    }

    fn compound(&mut self, query: &CompoundSelect) -> Result<()> {
        let wrap = self.dialect.parenthesize_compound_branches();
        for (i, branch) in query.branches.iter().enumerate() {
            if i > 0 {
                self.push_sql(" ");
                self.push_sql(query.op.as_str());
                self.push_sql(" ");
            }
            if !wrap && !self.dialect.compound_branches_may_order() && branch_has_trailers(branch)
            {
                return Err(QueryError::UnsupportedFeature {
                    dialect: self.dialect.name(),
                    feature: "ORDER BY / LIMIT inside a compound branch",
                });
            }
            if wrap {
                self.push_sql("(");
            }
            if i == 0 {
                self.statement(branch)?;
            } else {
                self.aliases.push();
                let out = self.statement(branch);
                self.aliases.pop();
                out?;
            }
            if wrap {
                self.push_sql(")");
            }
        }
        if !query.order_by.is_empty() {
            self.push_sql(" ORDER BY ");
            self.comma_exprs(&query.order_by)?;
        }
        self.limit_offset(query.limit, query.offset)
    }

    fn update(&mut self, query: &UpdateQuery) -> Result<()> {
        if query.set.is_empty() {
            return Err(QueryError::EmptyMutation(format!(
                "update of {:?} assigns no columns",
                query.table.name
            )));
        }
        self.aliases.seed(table_key(&query.table), &query.table.name);
        self.push_sql("UPDATE ");
        self.table_name(&query.table);
        self.push_sql(" SET ");
        for (i, (column, value)) in query.set.iter().enumerate() {
            if i > 0 {
                self.push_sql(", ");
            }
            let storage = storage_of(&query.table, column);
            self.quoted(&storage);
            self.push_sql(" = ");
            self.expr(value)?;
        }
        if !query.from.is_empty() {
            for src in &query.from {
                if src.explicit_alias().is_none() {
                    self.aliases.assign(src.key());
                }
            }
            self.push_sql(" FROM ");
            for (i, src) in query.from.iter().enumerate() {
                if i > 0 {
                    self.push_sql(", ");
                }
                self.source(src)?;
            }
        }
        if let Some(predicate) = &query.where_clause {
            self.push_sql(" WHERE ");
            self.expr(predicate)?;
        }
        self.returning(query.returning.as_deref(), None)
    }

    fn delete(&mut self, query: &DeleteQuery) -> Result<()> {
        self.aliases.seed(table_key(&query.table), &query.table.name);
        self.push_sql("DELETE FROM ");
        self.table_name(&query.table);
        if let Some(predicate) = &query.where_clause {
            self.push_sql(" WHERE ");
            self.expr(predicate)?;
        }
        self.returning(query.returning.as_deref(), None)
    }

    fn insert(&mut self, query: &InsertQuery) -> Result<()> {
        self.aliases.seed(table_key(&query.table), &query.table.name);
        if query.replace {
            self.push_sql("INSERT OR REPLACE INTO ");
        } else {
            self.push_sql("INSERT INTO ");
        }
        self.table_name(&query.table);
        let (columns, grid) = query.grid()?;
        match &query.rows {
            InsertRows::Defaults => self.push_sql(" DEFAULT VALUES"),
            InsertRows::Maps(_) => {
                self.insert_columns(&query.table, &columns)?;
                self.push_sql(" VALUES ");
                for (i, row) in grid.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.push_sql("(");
                    self.comma_exprs(row)?;
                    self.push_sql(")");
                }
            }
            InsertRows::Query { query: inner, .. } => {
                self.insert_columns(&query.table, &columns)?;
                self.push_sql(" ");
                self.aliases.push();
                let out = self.statement(inner);
                self.aliases.pop();
                out?;
            }
        }
        if let Some(conflict) = &query.on_conflict {
            self.on_conflict(&query.table, conflict)?;
        }
        let default_pk = default_returning(&query.table);
        self.returning(query.returning.as_deref(), Some(&default_pk))
    }

    fn insert_columns(&mut self, table: &Table, columns: &[String]) -> Result<()> {
        self.push_sql(" (");
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                self.push_sql(", ");
            }
            let storage = storage_of(table, name);
            self.quoted(&storage);
        }
        self.push_sql(")");
        Ok(())
    }

    fn on_conflict(&mut self, table: &Table, clause: &OnConflict) -> Result<()> {
        if !self.dialect.supports_on_conflict() {
            return Err(QueryError::UnsupportedFeature {
                dialect: self.dialect.name(),
                feature: "ON CONFLICT",
            });
        }
        self.push_sql(" ON CONFLICT");
        if !clause.targets.is_empty() {
            self.push_sql(" (");
            let targets = clause.targets.clone();
            self.bare(|ctx| ctx.comma_exprs(&targets))?;
            self.push_sql(")");
        }
        if let Some(predicate) = &clause.conflict_where {
            self.push_sql(" WHERE ");
            let predicate = predicate.clone();
            self.bare(|ctx| ctx.expr(&predicate))?;
        }
        match &clause.action {
            ConflictAction::Nothing => {
                self.push_sql(" DO NOTHING");
                Ok(())
            }
            ConflictAction::Update {
                set,
                preserve,
                where_clause,
            } => {
                if set.is_empty() && preserve.is_empty() {
                    return Err(QueryError::EmptyMutation(format!(
                        "conflict update on {:?} assigns no columns",
                        table.name
                    )));
                }
                self.push_sql(" DO UPDATE SET ");
                let mut first = true;
                for (column, value) in set {
                    if !first {
                        self.push_sql(", ");
                    }
                    first = false;
                    let storage = storage_of(table, column);
                    self.quoted(&storage);
                    self.push_sql(" = ");
                    self.expr(value)?;
                }
                for column in preserve {
                    if !first {
                        self.push_sql(", ");
                    }
                    first = false;
                    let storage = storage_of(table, column);
                    self.quoted(&storage);
                    self.push_sql(" = EXCLUDED.");
                    self.quoted(&storage);
                }
                if let Some(predicate) = where_clause {
                    self.push_sql(" WHERE ");
                    self.expr(predicate)?;
                }
                Ok(())
            }
        }
    }

    /// RETURNING policy: an explicit empty list disables the clause, an
    /// absent list falls back to `default` (the insert's primary key), and
    /// the whole clause is silently dropped on dialects without support.
    fn returning(&mut self, requested: Option<&[Expr]>, default: Option<&[Expr]>) -> Result<()> {
        if !self.dialect.supports_returning() {
            return Ok(());
        }
        let columns: &[Expr] = match (requested, default) {
            (Some(columns), _) => columns,
            (None, Some(columns)) => columns,
            (None, None) => &[],
        };
        if columns.is_empty() {
            return Ok(());
        }
        self.push_sql(" RETURNING ");
        self.comma_exprs(columns)
    }

    fn index(&mut self, query: &IndexQuery) -> Result<()> {
        self.push_sql("CREATE ");
        if query.unique {
            self.push_sql("UNIQUE ");
        }
        self.push_sql("INDEX IF NOT EXISTS ");
        let name = query.derived_name();
        self.quoted(&name);
        self.push_sql(" ON ");
        self.table_name(&query.table);
        self.push_sql(" (");
        let columns = query.columns.clone();
        self.bare(|ctx| ctx.comma_exprs(&columns))?;
        self.push_sql(")");
        if let Some(predicate) = &query.where_clause {
            self.push_sql(" WHERE ");
            let predicate = predicate.clone();
            self.bare(|ctx| ctx.expr(&predicate))?;
        }
        Ok(())
    }
}

fn table_key(table: &Arc<Table>) -> usize {
    Arc::as_ptr(table) as usize
}

fn storage_of(table: &Table, column: &str) -> String {
    match table.column(column) {
        Some(col) => col.storage().to_string(),
        None => column.to_string(),
    }
}

/// Primary-key expressions qualified under the table name, for the default
/// insert RETURNING list.
fn default_returning(table: &Arc<Table>) -> Vec<Expr> {
    let source = Source::Table(Arc::clone(table));
    table
        .pk_columns()
        .iter()
        .map(|name| {
            Expr::Column(ColumnRef {
                source: source.clone(),
                name: (*name).to_string(),
            })
        })
        .collect()
}

fn branch_has_trailers(branch: &Query) -> bool {
    match branch {
        Query::Select(q) => {
            !q.order_by.is_empty() || q.limit.is_some() || q.offset.is_some()
        }
        Query::Compound(q) => q.has_trailers(),
        _ => false,
    }
}
