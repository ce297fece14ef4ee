//! Lookup-path filters.
//!
//! A filter condition names a column through double-underscore paths:
//! relation segments first, then the column, then optionally one of the
//! closed operator suffixes (`user__username__ilike`). Conditions compose
//! with `&`, `|` and `!` before being resolved against the schema.

use std::ops;

use ferrite_sql_core::Expr;

/// A composable filter tree, resolved by
/// [`ModelSelect::filter`](crate::query::ModelSelect::filter).
#[derive(Debug, Clone)]
pub enum Dq {
    /// A single `path -> value` condition.
    Cond { path: String, value: Expr },
    And(Box<Dq>, Box<Dq>),
    Or(Box<Dq>, Box<Dq>),
    Not(Box<Dq>),
}

impl Dq {
    /// A condition on a lookup path. With no operator suffix the condition
    /// is an equality.
    pub fn new(path: &str, value: impl Into<Expr>) -> Self {
        Dq::Cond {
            path: path.to_string(),
            value: value.into(),
        }
    }
}

impl ops::BitAnd for Dq {
    type Output = Dq;

    fn bitand(self, rhs: Dq) -> Dq {
        Dq::And(Box::new(self), Box::new(rhs))
    }
}

impl ops::BitOr for Dq {
    type Output = Dq;

    fn bitor(self, rhs: Dq) -> Dq {
        Dq::Or(Box::new(self), Box::new(rhs))
    }
}

impl ops::Not for Dq {
    type Output = Dq;

    fn not(self) -> Dq {
        Dq::Not(Box::new(self))
    }
}

/// Operator suffix of a lookup path. The set is closed; unknown suffixes
/// are treated as column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    IsNull,
    Like,
    ILike,
    Regexp,
}

impl FilterOp {
    /// Parses an operator suffix.
    pub fn parse(segment: &str) -> Option<Self> {
        Some(match segment {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "in" => FilterOp::In,
            "isnull" => FilterOp::IsNull,
            "like" => FilterOp::Like,
            "ilike" => FilterOp::ILike,
            "regexp" => FilterOp::Regexp,
            _ => return None,
        })
    }

    /// Applies the operator to a resolved column. `IsNull` wants a boolean
    /// literal; `None` signals the mismatch.
    pub fn apply(self, column: Expr, value: Expr) -> Option<Expr> {
        Some(match self {
            FilterOp::Eq => column.eq(value),
            FilterOp::Ne => column.ne(value),
            FilterOp::Gt => column.gt(value),
            FilterOp::Gte => column.gte(value),
            FilterOp::Lt => column.lt(value),
            FilterOp::Lte => column.lte(value),
            FilterOp::In => column.in_(value),
            FilterOp::IsNull => match value {
                Expr::Literal(ferrite_sql_core::SqlValue::Bool(b)) => column.is_null(b),
                _ => return None,
            },
            FilterOp::Like => column.like(value),
            FilterOp::ILike => column.ilike(value),
            FilterOp::Regexp => column.regexp(value),
        })
    }
}
