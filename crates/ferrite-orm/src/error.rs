//! Error type for the model layer.

use thiserror::Error;

use ferrite_sql_core::QueryError;

#[derive(Debug, Error)]
pub enum OrmError {
    /// An error surfaced by the query builders or the compiler.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A model name the registry does not know.
    #[error("unknown model {0:?}")]
    UnknownModel(String),

    /// A lookup path that does not resolve against the schema.
    #[error("cannot resolve lookup path {path:?}: {reason}")]
    Path { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, OrmError>;
