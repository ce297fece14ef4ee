//! Query builders.
//!
//! Each statement kind has a dedicated builder; [`Query`] is the closed sum
//! the compiler consumes. Builders are cheap to clone and never touch a
//! database: compiling one yields a SQL string plus its ordered parameters.

pub mod compound;
pub mod delete;
pub mod index;
pub mod insert;
pub mod select;
pub mod source;
pub mod update;
pub mod value;

pub use compound::{CompoundOp, CompoundSelect};
pub use delete::DeleteQuery;
pub use index::IndexQuery;
pub use insert::{ConflictAction, InsertQuery, OnConflict};
pub use select::{JoinKind, SelectQuery};
pub use update::UpdateQuery;

/// Any compilable statement.
#[derive(Debug, Clone)]
pub enum Query {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
    Compound(CompoundSelect),
    Index(IndexQuery),
}

impl From<SelectQuery> for Query {
    fn from(q: SelectQuery) -> Self {
        Query::Select(q)
    }
}

impl From<InsertQuery> for Query {
    fn from(q: InsertQuery) -> Self {
        Query::Insert(q)
    }
}

impl From<UpdateQuery> for Query {
    fn from(q: UpdateQuery) -> Self {
        Query::Update(q)
    }
}

impl From<DeleteQuery> for Query {
    fn from(q: DeleteQuery) -> Self {
        Query::Delete(q)
    }
}

impl From<CompoundSelect> for Query {
    fn from(q: CompoundSelect) -> Self {
        Query::Compound(q)
    }
}

impl From<IndexQuery> for Query {
    fn from(q: IndexQuery) -> Self {
        Query::Index(q)
    }
}
