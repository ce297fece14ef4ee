//! Relational query construction and dialect-aware SQL compilation.
//!
//! Queries are built from shared schema descriptors ([`schema::Table`]) and
//! an expression tree ([`ast::Expr`]), then compiled against a
//! [`dialect::Dialect`] into a SQL string plus its ordered parameters.
//! Nothing in this crate talks to a database.
//!
//! ```
//! use std::sync::Arc;
//! use ferrite_sql_core::builder::source::ColumnAccess;
//! use ferrite_sql_core::builder::SelectQuery;
//! use ferrite_sql_core::compiler::Compiler;
//! use ferrite_sql_core::dialect::GenericDialect;
//! use ferrite_sql_core::schema::{Column, Table};
//!
//! let users = Table::build("users")
//!     .auto_primary_key("id")
//!     .column(Column::text("username"))
//!     .finish()
//!     .unwrap();
//! let query = SelectQuery::new(&users).where_clause(users.col("username").eq("huey"));
//! let (sql, params) = Compiler::new(&GenericDialect).compile(query).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT \"t1\".\"id\", \"t1\".\"username\" FROM \"users\" AS \"t1\" \
//!      WHERE (\"t1\".\"username\" = ?)"
//! );
//! assert_eq!(params.len(), 1);
//! ```

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod schema;

pub use ast::{BinaryOp, Expr, OrderDirection, UnaryOp};
pub use builder::source::{ColumnAccess, ColumnRef, DerivedKind, DerivedSource, Source};
pub use builder::value::{SqlValue, ToSqlValue};
pub use builder::{
    CompoundOp, CompoundSelect, ConflictAction, DeleteQuery, IndexQuery, InsertQuery, JoinKind,
    OnConflict, Query, SelectQuery, UpdateQuery,
};
pub use compiler::Compiler;
pub use dialect::{Dialect, GenericDialect, PostgresDialect, SqliteDialect};
pub use error::{QueryError, Result};
pub use schema::{Column, ForeignKey, PrimaryKey, Table, TableAlias, TableBuilder};
