//! Baseline dialect: standard quoting, no optional clauses.

use crate::dialect::Dialect;

/// Lowest-common-denominator dialect. Every capability flag keeps its
/// default, so optional clauses are never emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}
