//! Schema descriptors: tables, columns, keys and foreign keys.
//!
//! A schema is described by plain values built once at startup and shared by
//! reference (`Arc`) between the query builders and the compiler. No
//! reflection or derive machinery is involved; the descriptors carry
//! everything the compiler needs, including per-column coercion hooks and
//! default-value providers.

use std::fmt;
use std::sync::Arc;

use crate::builder::value::SqlValue;
use crate::error::{QueryError, Result};

/// Per-column coercion hook applied when a literal is bound against the
/// column in a comparison or assignment.
pub type CoerceFn = Arc<dyn Fn(SqlValue) -> SqlValue + Send + Sync>;

/// Per-column default-value provider, consulted when a multi-row insert
/// omits the column for a given row.
pub type DefaultFn = Arc<dyn Fn() -> SqlValue + Send + Sync>;

/// A column descriptor.
#[derive(Clone)]
pub struct Column {
    /// Logical name used by the query builders.
    pub name: String,
    /// Storage name, when it differs from the logical name. Preserved
    /// verbatim in emitted SQL; aliasing never re-derives it.
    pub storage_name: Option<String>,
    /// Default-value provider.
    pub default: Option<DefaultFn>,
    /// Coercion hook for literals bound against this column.
    pub coerce: Option<CoerceFn>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("storage_name", &self.storage_name)
            .field("default", &self.default.is_some())
            .field("coerce", &self.coerce.is_some())
            .finish()
    }
}

impl Column {
    /// Creates a column with no coercion and no default.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            storage_name: None,
            default: None,
            coerce: None,
        }
    }

    /// Creates an integer-typed column: text and float literals compared
    /// against it bind as integers.
    pub fn integer(name: &str) -> Self {
        Self::new(name).with_coerce(Arc::new(coerce_integer))
    }

    /// Creates a float-typed column.
    pub fn float(name: &str) -> Self {
        Self::new(name).with_coerce(Arc::new(coerce_float))
    }

    /// Creates a text-typed column: blob and numeric literals compared
    /// against it bind as text.
    pub fn text(name: &str) -> Self {
        Self::new(name).with_coerce(Arc::new(coerce_text))
    }

    /// Sets a storage name distinct from the logical name.
    #[must_use]
    pub fn with_storage(mut self, storage: &str) -> Self {
        self.storage_name = Some(storage.to_string());
        self
    }

    /// Sets the default-value provider.
    #[must_use]
    pub fn with_default(mut self, default: DefaultFn) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the coercion hook.
    #[must_use]
    pub fn with_coerce(mut self, coerce: CoerceFn) -> Self {
        self.coerce = Some(coerce);
        self
    }

    /// Returns the name used in emitted SQL.
    pub fn storage(&self) -> &str {
        self.storage_name.as_deref().unwrap_or(&self.name)
    }

    /// Applies the coercion hook to a literal, if one is installed.
    pub fn coerce_value(&self, value: SqlValue) -> SqlValue {
        match &self.coerce {
            Some(hook) => hook(value),
            None => value,
        }
    }
}

fn coerce_integer(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => match s.trim().parse::<i64>() {
            Ok(n) => SqlValue::Int(n),
            Err(_) => SqlValue::Text(s),
        },
        SqlValue::Float(f) => SqlValue::Int(f as i64),
        SqlValue::Bool(b) => SqlValue::Int(i64::from(b)),
        other => other,
    }
}

fn coerce_float(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) => SqlValue::Float(f),
            Err(_) => SqlValue::Text(s),
        },
        SqlValue::Int(n) => SqlValue::Float(n as f64),
        other => other,
    }
}

fn coerce_text(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Blob(b) => SqlValue::Text(String::from_utf8_lossy(&b).into_owned()),
        SqlValue::Int(n) => SqlValue::Text(n.to_string()),
        SqlValue::Float(f) => SqlValue::Text(f.to_string()),
        other => other,
    }
}

/// Primary-key shape of a table.
#[derive(Debug, Clone)]
pub enum PrimaryKey {
    /// No primary key declared.
    None,
    /// A single-column key.
    Single {
        /// The key column's logical name.
        column: String,
        /// Whether the key is an auto-incrementing surrogate.
        auto_increment: bool,
    },
    /// An ordered set of two or more columns with no surrogate id.
    Composite(Vec<String>),
}

/// A declared foreign key: a column on this table referencing a column on a
/// target table (the target's primary key by default).
#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// The referencing column's logical name on the declaring table.
    pub column: String,
    /// Name of the referenced table.
    pub target_table: String,
    /// Referenced column; `None` means the target's primary key.
    pub target_column: Option<String>,
    /// Relation name used for forward joins and dotted lookups.
    pub relation: String,
    /// Reverse-direction relation name; defaults to the declaring table's
    /// name when left empty.
    pub backref: String,
}

impl ForeignKey {
    /// Declares a foreign key referencing `target_table`'s primary key.
    pub fn new(column: &str, target_table: &str, relation: &str) -> Self {
        Self {
            column: column.to_string(),
            target_table: target_table.to_string(),
            target_column: None,
            relation: relation.to_string(),
            backref: String::new(),
        }
    }

    /// References an explicit target column instead of the primary key.
    #[must_use]
    pub fn target_column(mut self, column: &str) -> Self {
        self.target_column = Some(column.to_string());
        self
    }

    /// Sets the reverse-direction relation name.
    #[must_use]
    pub fn backref(mut self, backref: &str) -> Self {
        self.backref = backref.to_string();
        self
    }
}

/// A table descriptor.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Optional schema/namespace qualifier.
    pub schema: Option<String>,
    /// Ordered column list.
    pub columns: Vec<Column>,
    /// Primary key.
    pub primary_key: PrimaryKey,
    /// Declared foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Starts building a table descriptor.
    pub fn build(name: &str) -> TableBuilder {
        TableBuilder {
            name: name.to_string(),
            schema: None,
            columns: Vec::new(),
            primary_key: PrimaryKey::None,
            foreign_keys: Vec::new(),
            auto_requested: false,
        }
    }

    /// Looks up a column by logical name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Logical names of the primary-key columns, in key order.
    pub fn pk_columns(&self) -> Vec<&str> {
        match &self.primary_key {
            PrimaryKey::None => Vec::new(),
            PrimaryKey::Single { column, .. } => vec![column.as_str()],
            PrimaryKey::Composite(cols) => cols.iter().map(String::as_str).collect(),
        }
    }

    /// Whether `name` is the auto-incrementing surrogate key column.
    pub fn is_auto_column(&self, name: &str) -> bool {
        matches!(&self.primary_key,
                 PrimaryKey::Single { column, auto_increment: true } if column == name)
    }

    /// Columns in insert order: primary-key columns first, then the rest in
    /// declaration order.
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let pk = self.pk_columns();
        let mut out: Vec<&Column> = Vec::with_capacity(self.columns.len());
        out.extend(self.columns.iter().filter(|c| pk.contains(&c.name.as_str())));
        out.extend(self.columns.iter().filter(|c| !pk.contains(&c.name.as_str())));
        out
    }

    /// The foreign key whose relation name is `relation`, if declared.
    pub fn relation(&self, relation: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.relation == relation)
    }

    /// Foreign keys on this table that reference `target`.
    pub fn keys_to(&self, target: &str) -> Vec<&ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(|fk| fk.target_table == target)
            .collect()
    }
}

/// Builder for [`Table`]. `finish` validates the descriptor.
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    schema: Option<String>,
    columns: Vec<Column>,
    primary_key: PrimaryKey,
    foreign_keys: Vec<ForeignKey>,
    auto_requested: bool,
}

impl TableBuilder {
    /// Sets the schema qualifier.
    #[must_use]
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Declares an auto-incrementing integer surrogate key, adding the
    /// column if it was not declared explicitly.
    #[must_use]
    pub fn auto_primary_key(mut self, name: &str) -> Self {
        if !self.columns.iter().any(|c| c.name == name) {
            self.columns.insert(0, Column::integer(name));
        }
        self.primary_key = PrimaryKey::Single {
            column: name.to_string(),
            auto_increment: true,
        };
        self.auto_requested = true;
        self
    }

    /// Declares a non-surrogate single-column primary key.
    #[must_use]
    pub fn primary_key(mut self, name: &str) -> Self {
        self.primary_key = PrimaryKey::Single {
            column: name.to_string(),
            auto_increment: false,
        };
        self
    }

    /// Declares a composite primary key over two or more columns.
    #[must_use]
    pub fn composite_key(mut self, columns: &[&str]) -> Self {
        self.primary_key =
            PrimaryKey::Composite(columns.iter().map(|c| (*c).to_string()).collect());
        self
    }

    /// Declares a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Validates and finishes the descriptor.
    pub fn finish(mut self) -> Result<Arc<Table>> {
        if self.auto_requested && matches!(self.primary_key, PrimaryKey::Composite(_)) {
            return Err(QueryError::SchemaConsistency(format!(
                "table {:?} combines a composite key with an auto-increment id",
                self.name
            )));
        }
        for pk in match &self.primary_key {
            PrimaryKey::None => Vec::new(),
            PrimaryKey::Single { column, .. } => vec![column.clone()],
            PrimaryKey::Composite(cols) => cols.clone(),
        } {
            if !self.columns.iter().any(|c| c.name == pk) {
                return Err(QueryError::SchemaConsistency(format!(
                    "primary-key column {:?} is not declared on table {:?}",
                    pk, self.name
                )));
            }
        }
        for fk in &mut self.foreign_keys {
            if !self.columns.iter().any(|c| c.name == fk.column) {
                return Err(QueryError::SchemaConsistency(format!(
                    "foreign-key column {:?} is not declared on table {:?}",
                    fk.column, self.name
                )));
            }
            if fk.backref.is_empty() {
                fk.backref = self.name.clone();
            }
        }
        Ok(Arc::new(Table {
            name: self.name,
            schema: self.schema,
            columns: self.columns,
            primary_key: self.primary_key,
            foreign_keys: self.foreign_keys,
        }))
    }
}

/// An explicit table alias. Columns referenced through the alias render
/// under the given name verbatim; the compiler never renumbers it.
#[derive(Debug, Clone)]
pub struct TableAlias {
    /// The aliased table.
    pub table: Arc<Table>,
    /// The alias, used exactly as written.
    pub alias: String,
}

impl TableAlias {
    /// Aliases `table` under `alias`.
    pub fn new(table: &Arc<Table>, alias: &str) -> Arc<Self> {
        Arc::new(Self {
            table: Arc::clone(table),
            alias: alias.to_string(),
        })
    }
}
