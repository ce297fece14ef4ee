//! Set operations over selects: UNION, UNION ALL, INTERSECT, EXCEPT.

use std::ops;

use crate::ast::expression::Expr;
use crate::builder::select::SelectQuery;
use crate::builder::source::{DerivedSource, Source};
use crate::builder::Query;

/// Set operator joining compound branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompoundOp::Union => "UNION",
            CompoundOp::UnionAll => "UNION ALL",
            CompoundOp::Intersect => "INTERSECT",
            CompoundOp::Except => "EXCEPT",
        }
    }
}

/// A compound select. Branches combined with the same operator flatten into
/// one linear list; a branch that already carries its own ordering or limit
/// stays nested.
#[derive(Debug, Clone)]
pub struct CompoundSelect {
    pub(crate) op: CompoundOp,
    pub(crate) branches: Vec<Query>,
    pub(crate) order_by: Vec<Expr>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

impl CompoundSelect {
    /// Combines two select-like queries under one operator.
    pub fn combine(op: CompoundOp, lhs: impl Into<Query>, rhs: impl Into<Query>) -> Self {
        let mut branches = Vec::new();
        absorb(&mut branches, lhs.into(), op);
        absorb(&mut branches, rhs.into(), op);
        Self {
            op,
            branches,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Replaces the trailing ORDER BY list.
    #[must_use]
    pub fn order_by(mut self, terms: Vec<Expr>) -> Self {
        self.order_by = terms;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether this compound carries its own trailing clauses.
    pub(crate) fn has_trailers(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }
}

fn absorb(branches: &mut Vec<Query>, query: Query, op: CompoundOp) {
    match query {
        Query::Compound(c) if c.op == op && !c.has_trailers() => branches.extend(c.branches),
        other => branches.push(other),
    }
}

/// Wraps a select-like query as a derived source named `_wrapped` and
/// counts its rows.
pub(crate) fn wrap_count(query: Query) -> SelectQuery {
    let derived = DerivedSource::subquery(query, "_wrapped", &[]);
    SelectQuery::from_source(Source::Derived(derived)).columns(vec![Expr::count_rows()])
}

macro_rules! compound_api {
    ($ty:ty) => {
        impl $ty {
            /// `UNION` with another select-like query.
            pub fn union(self, rhs: impl Into<Query>) -> CompoundSelect {
                CompoundSelect::combine(CompoundOp::Union, self, rhs)
            }

            /// `UNION ALL` with another select-like query.
            pub fn union_all(self, rhs: impl Into<Query>) -> CompoundSelect {
                CompoundSelect::combine(CompoundOp::UnionAll, self, rhs)
            }

            /// `INTERSECT` with another select-like query.
            pub fn intersect(self, rhs: impl Into<Query>) -> CompoundSelect {
                CompoundSelect::combine(CompoundOp::Intersect, self, rhs)
            }

            /// `EXCEPT` with another select-like query.
            pub fn except(self, rhs: impl Into<Query>) -> CompoundSelect {
                CompoundSelect::combine(CompoundOp::Except, self, rhs)
            }

            /// `SELECT COUNT(1)` over this query as a derived source.
            pub fn wrapped_count(&self) -> SelectQuery {
                wrap_count(self.clone().into())
            }
        }

        impl<R: Into<Query>> ops::Add<R> for $ty {
            type Output = CompoundSelect;

            fn add(self, rhs: R) -> CompoundSelect {
                self.union_all(rhs)
            }
        }

        impl<R: Into<Query>> ops::BitOr<R> for $ty {
            type Output = CompoundSelect;

            fn bitor(self, rhs: R) -> CompoundSelect {
                self.union(rhs)
            }
        }

        impl<R: Into<Query>> ops::BitAnd<R> for $ty {
            type Output = CompoundSelect;

            fn bitand(self, rhs: R) -> CompoundSelect {
                self.intersect(rhs)
            }
        }

        impl<R: Into<Query>> ops::Sub<R> for $ty {
            type Output = CompoundSelect;

            fn sub(self, rhs: R) -> CompoundSelect {
                self.except(rhs)
            }
        }
    };
}

compound_api!(SelectQuery);
compound_api!(CompoundSelect);
