//! Model registry: named tables and the foreign-key edges between them.

use std::sync::Arc;

use ferrite_sql_core::{ForeignKey, QueryError, Table};

use crate::error::{OrmError, Result};

/// A set of registered tables. Registration order is preserved and drives
/// every deterministic traversal (dependent discovery, delete planning).
#[derive(Debug, Default)]
pub struct Registry {
    tables: Vec<Arc<Table>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table. Names must be unique.
    pub fn register(&mut self, table: Arc<Table>) -> Result<()> {
        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(OrmError::Query(QueryError::SchemaConsistency(format!(
                "model {:?} is already registered",
                table.name
            ))));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Looks a table up by name.
    pub fn get(&self, name: &str) -> Result<&Arc<Table>> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }

    /// Tables declaring a foreign key that targets `name`, with the key, in
    /// registration order. A table with several keys to `name` appears once
    /// per key.
    pub fn dependents(&self, name: &str) -> Vec<(Arc<Table>, ForeignKey)> {
        let mut out = Vec::new();
        for table in &self.tables {
            for fk in table.keys_to(name) {
                out.push((Arc::clone(table), fk.clone()));
            }
        }
        out
    }

    /// Resolves a reverse-relation name on `target`: the table whose
    /// foreign key to `target` carries `backref` as its reverse name.
    pub fn backref(&self, target: &str, backref: &str) -> Option<(Arc<Table>, ForeignKey)> {
        for table in &self.tables {
            for fk in table.keys_to(target) {
                if fk.backref == backref {
                    return Some((Arc::clone(table), fk.clone()));
                }
            }
        }
        None
    }
}
