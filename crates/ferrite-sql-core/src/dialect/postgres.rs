//! PostgreSQL dialect.

use crate::dialect::Dialect;

/// PostgreSQL: supports `RETURNING` and `ON CONFLICT`, and wraps compound
/// branches in parentheses so each branch may order and limit itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_on_conflict(&self) -> bool {
        true
    }

    fn parenthesize_compound_branches(&self) -> bool {
        true
    }
}
