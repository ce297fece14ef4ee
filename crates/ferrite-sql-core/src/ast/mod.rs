//! Expression tree shared by every query kind.

pub mod expression;

pub use expression::{BinaryOp, Expr, OrderDirection, UnaryOp};
