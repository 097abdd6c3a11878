//! Table and column expressions
//!
//! Expressions are immutable trees of [`Node`]s built through
//! [`TableExpr`] and [`ValueExpr`]. Every builder validates its operands
//! and returns a new expression.

pub mod node;
pub mod table;
pub mod value;

pub use node::{
    AggregateFunction, ArithmeticOp, ComparisonOp, Node, SourceId,
};
pub use table::TableExpr;
pub use value::{literal, typed_literal, IntoValueExpr, ValueExpr};

use std::sync::Arc;

/// Anything that wraps an expression node and can be compiled or executed
pub trait Expr {
    fn node(&self) -> &Arc<Node>;
}

impl Expr for TableExpr {
    fn node(&self) -> &Arc<Node> {
        TableExpr::node(self)
    }
}

impl Expr for ValueExpr {
    fn node(&self) -> &Arc<Node> {
        ValueExpr::node(self)
    }
}

impl Expr for Arc<Node> {
    fn node(&self) -> &Arc<Node> {
        self
    }
}
