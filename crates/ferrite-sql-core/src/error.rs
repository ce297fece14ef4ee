//! Error types for query construction and compilation.
//!
//! Every error is raised synchronously while building or compiling a query;
//! nothing is deferred to statement execution.

use thiserror::Error;

/// Errors raised while building or compiling queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Automatic join resolution found zero or multiple candidate foreign
    /// keys between two sources.
    #[error("unable to resolve join between {lhs} and {rhs}: {candidates} candidate foreign keys")]
    JoinResolution {
        /// Table on the current side of the join cursor.
        lhs: String,
        /// Table being joined.
        rhs: String,
        /// Number of candidate foreign keys found.
        candidates: usize,
    },

    /// An explicit join alias collides with a reserved object-id accessor.
    #[error("join alias {alias:?} collides with the object-id accessor {column:?}")]
    AliasConflict {
        /// The rejected alias.
        alias: String,
        /// The foreign-key column whose accessor name it shadows.
        column: String,
    },

    /// An insert or update resolved to an empty effective field set.
    #[error("mutation resolved to an empty field set: {0}")]
    EmptyMutation(String),

    /// The schema description is inconsistent, or a relation path names no
    /// declared relation.
    #[error("schema inconsistency: {0}")]
    SchemaConsistency(String),

    /// A clause requires a capability the active dialect does not declare.
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedFeature {
        /// Name of the active dialect.
        dialect: &'static str,
        /// The capability the query requires.
        feature: &'static str,
    },
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
