//! Model layer on top of `ferrite-sql-core`: a registry of named tables,
//! lookup-path filters that resolve relation traversals into joins, and a
//! planner for recursive deletes.

pub mod error;
pub mod planner;
pub mod query;
pub mod registry;

pub use error::{OrmError, Result};
pub use planner::{recursive_delete_plan, RowIdentity};
pub use query::filter::{Dq, FilterOp};
pub use query::ModelSelect;
pub use registry::Registry;
