//! The expression tree.
//!
//! Every predicate, projection item, ordering term and assignment value is
//! an [`Expr`]. Comparison constructors run the column's coercion hook on
//! literal operands at construction time, so the tree already carries the
//! values that will be bound.

use std::ops;

use crate::builder::source::{ColumnRef, Source};
use crate::builder::value::{SqlValue, ToSqlValue};
use crate::builder::Query;

/// Binary operator. Binary expressions always render fully parenthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Like,
    ILike,
    Regexp,
    In,
    NotIn,
    Is,
    IsNot,
    Concat,
}

impl BinaryOp {
    /// SQL spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Like => "LIKE",
            BinaryOp::ILike => "ILIKE",
            BinaryOp::Regexp => "REGEXP",
            BinaryOp::In => "IN",
            BinaryOp::NotIn => "NOT IN",
            BinaryOp::Is => "IS",
            BinaryOp::IsNot => "IS NOT",
            BinaryOp::Concat => "||",
        }
    }
}

/// Prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT ",
            UnaryOp::Neg => "-",
        }
    }
}

/// Sort direction for an ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// A node in the expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A column bound to a source.
    Column(ColumnRef),
    /// A literal, bound as a parameter.
    Literal(SqlValue),
    /// A parenthesized, comma-separated list (the rhs of `IN`).
    List(Vec<Expr>),
    /// A function call.
    Function { name: String, args: Vec<Expr> },
    /// A binary expression.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A prefix expression.
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// An aliased projection item (`expr AS "name"`).
    Alias { expr: Box<Expr>, alias: String },
    /// An expression with an explicit sort direction.
    Ordered {
        expr: Box<Expr>,
        direction: OrderDirection,
    },
    /// A parenthesized scalar subquery.
    Subquery(Box<Query>),
    /// A raw fragment spliced verbatim, with any parameters it binds.
    Raw { sql: String, params: Vec<SqlValue> },
    /// The composite key of a source, rendered as a column tuple.
    CompositeKey { source: Source, columns: Vec<String> },
}

impl Expr {
    /// A raw SQL fragment.
    pub fn raw(sql: &str, params: Vec<SqlValue>) -> Expr {
        Expr::Raw {
            sql: sql.to_string(),
            params,
        }
    }

    /// A function call.
    pub fn function(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Function {
            name: name.to_string(),
            args,
        }
    }

    /// `COUNT(1)`.
    pub fn count_rows() -> Expr {
        Expr::function("COUNT", vec![Expr::raw("1", Vec::new())])
    }

    /// A literal list for the rhs of `IN`.
    pub fn list<T: Into<Expr>>(items: Vec<T>) -> Expr {
        Expr::List(items.into_iter().map(Into::into).collect())
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        // Run the coercion hook of whichever side is a column against the
        // other side's literals.
        let rhs = match &lhs {
            Expr::Column(col) => col.coerce_operand(rhs),
            _ => rhs,
        };
        let lhs = match &rhs {
            Expr::Column(col) => col.coerce_operand(lhs),
            _ => lhs,
        };
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Eq, self, rhs.into())
    }

    #[must_use]
    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ne, self, rhs.into())
    }

    #[must_use]
    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lt, self, rhs.into())
    }

    #[must_use]
    pub fn lte(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lte, self, rhs.into())
    }

    #[must_use]
    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gt, self, rhs.into())
    }

    #[must_use]
    pub fn gte(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gte, self, rhs.into())
    }

    #[must_use]
    pub fn like(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Like, self, rhs.into())
    }

    #[must_use]
    pub fn ilike(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::ILike, self, rhs.into())
    }

    #[must_use]
    pub fn regexp(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Regexp, self, rhs.into())
    }

    /// Membership test against a list or subquery.
    #[must_use]
    pub fn in_(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::In, self, rhs.into())
    }

    #[must_use]
    pub fn not_in(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::NotIn, self, rhs.into())
    }

    /// `IS NULL` / `IS NOT NULL`, with the null bound as a parameter.
    #[must_use]
    pub fn is_null(self, null: bool) -> Expr {
        let op = if null { BinaryOp::Is } else { BinaryOp::IsNot };
        Expr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(Expr::Literal(SqlValue::Null)),
        }
    }

    #[must_use]
    pub fn concat(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Concat, self, rhs.into())
    }

    /// Logical negation.
    #[must_use]
    pub fn negate(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    /// Projection alias (`AS "name"`).
    #[must_use]
    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }

    #[must_use]
    pub fn asc(self) -> Expr {
        Expr::Ordered {
            expr: Box::new(self),
            direction: OrderDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(self) -> Expr {
        Expr::Ordered {
            expr: Box::new(self),
            direction: OrderDirection::Desc,
        }
    }

    /// The column reference inside this expression, unwrapping aliases and
    /// ordering terms.
    pub fn column_ref(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(col) => Some(col),
            Expr::Alias { expr, .. } | Expr::Ordered { expr, .. } => expr.column_ref(),
            _ => None,
        }
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Expr::Literal(value)
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for Expr {
            fn from(value: $ty) -> Self {
                Expr::Literal(value.to_sql_value())
            }
        })*
    };
}

literal_from!(bool, i16, i32, i64, u32, f32, f64, &str, String, Vec<u8>);

impl From<Query> for Expr {
    fn from(query: Query) -> Self {
        Expr::Subquery(Box::new(query))
    }
}

impl From<crate::builder::SelectQuery> for Expr {
    fn from(query: crate::builder::SelectQuery) -> Self {
        Expr::Subquery(Box::new(Query::Select(query)))
    }
}

impl From<crate::builder::CompoundSelect> for Expr {
    fn from(query: crate::builder::CompoundSelect) -> Self {
        Expr::Subquery(Box::new(Query::Compound(query)))
    }
}

impl<R: Into<Expr>> ops::BitAnd<R> for Expr {
    type Output = Expr;

    fn bitand(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::And, self, rhs.into())
    }
}

impl<R: Into<Expr>> ops::BitOr<R> for Expr {
    type Output = Expr;

    fn bitor(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::Or, self, rhs.into())
    }
}

impl<R: Into<Expr>> ops::Add<R> for Expr {
    type Output = Expr;

    fn add(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs.into())
    }
}

impl<R: Into<Expr>> ops::Sub<R> for Expr {
    type Output = Expr;

    fn sub(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs.into())
    }
}

impl<R: Into<Expr>> ops::Mul<R> for Expr {
    type Output = Expr;

    fn mul(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs.into())
    }
}

impl<R: Into<Expr>> ops::Div<R> for Expr {
    type Output = Expr;

    fn div(self, rhs: R) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs.into())
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(self),
        }
    }
}
