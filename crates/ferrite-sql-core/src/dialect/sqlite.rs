//! SQLite dialect.

use crate::dialect::Dialect;

/// SQLite: supports `ON CONFLICT` and `INSERT OR REPLACE`, forbids ordered
/// or limited branches inside a compound select.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }

    fn compound_branches_may_order(&self) -> bool {
        false
    }
}
