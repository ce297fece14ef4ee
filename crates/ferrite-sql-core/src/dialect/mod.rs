//! Dialect capability flags consulted during compilation.

mod generic;
mod postgres;
mod sqlite;

pub use generic::GenericDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Capabilities and lexical conventions of a SQL dialect.
///
/// The compiler owns all rendering; a dialect only answers questions.
pub trait Dialect {
    /// Dialect name, used in error messages.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Parameter placeholder.
    fn parameter_placeholder(&self) -> &'static str {
        "?"
    }

    /// Whether `RETURNING` may be emitted.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Whether `ON CONFLICT` may be emitted.
    fn supports_on_conflict(&self) -> bool {
        false
    }

    /// Whether compound branches are wrapped in parentheses.
    fn parenthesize_compound_branches(&self) -> bool {
        false
    }

    /// Whether a compound branch may carry its own ORDER BY / LIMIT.
    fn compound_branches_may_order(&self) -> bool {
        true
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, ident: &str) -> String {
        let q = self.identifier_quote();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for ch in ident.chars() {
            out.push(ch);
            if ch == q {
                out.push(q);
            }
        }
        out.push(q);
        out
    }
}
