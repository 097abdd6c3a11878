//! Scalar expression builders

use super::node::{AggregateFunction, ArithmeticOp, ComparisonOp, Node};
use crate::error::{Error, Result};
use crate::types::{DataType, Value};
use std::sync::Arc;

/// A value-producing expression: a column, literal, comparison,
/// arithmetic or aggregate
#[derive(Debug, Clone)]
pub struct ValueExpr {
    node: Arc<Node>,
    dtype: DataType,
}

/// Conversion into an operand of a scalar operator
pub trait IntoValueExpr {
    fn into_value_expr(self) -> Result<ValueExpr>;
}

impl IntoValueExpr for ValueExpr {
    fn into_value_expr(self) -> Result<ValueExpr> {
        Ok(self)
    }
}

impl IntoValueExpr for &ValueExpr {
    fn into_value_expr(self) -> Result<ValueExpr> {
        Ok(self.clone())
    }
}

impl IntoValueExpr for Value {
    fn into_value_expr(self) -> Result<ValueExpr> {
        literal(self)
    }
}

macro_rules! literal_operand {
    ($($ty:ty),*) => {
        $(
            impl IntoValueExpr for $ty {
                fn into_value_expr(self) -> Result<ValueExpr> {
                    literal(Value::from(self))
                }
            }
        )*
    };
}

literal_operand!(bool, i32, i64, f64, &str, String);

/// Literal with the natural type of `value`
pub fn literal(value: impl Into<Value>) -> Result<ValueExpr> {
    ValueExpr::from_node(Node::literal(value.into())?)
}

/// Literal with an explicit type; the only way to build a typed null
pub fn typed_literal(value: impl Into<Value>, dtype: DataType) -> Result<ValueExpr> {
    ValueExpr::from_node(Node::typed_literal(value.into(), dtype)?)
}

impl ValueExpr {
    pub fn from_node(node: Arc<Node>) -> Result<Self> {
        let dtype = node.dtype().ok_or_else(|| {
            Error::unsupported(node.kind_name(), "expected a value expression")
        })?;
        Ok(Self { node, dtype })
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Output column name when executed on its own
    pub fn name(&self) -> &str {
        self.node.output_name()
    }

    pub fn equals(&self, other: &ValueExpr) -> bool {
        self.node == other.node
    }

    fn compare(&self, op: ComparisonOp, other: impl IntoValueExpr) -> Result<ValueExpr> {
        let other = other.into_value_expr()?;
        Self::from_node(Node::comparison(self.node.clone(), op, other.node)?)
    }

    fn arith(&self, op: ArithmeticOp, other: impl IntoValueExpr) -> Result<ValueExpr> {
        let other = other.into_value_expr()?;
        Self::from_node(Node::arithmetic(self.node.clone(), op, other.node)?)
    }

    fn reduce(&self, function: AggregateFunction) -> Result<ValueExpr> {
        Self::from_node(Node::aggregate(function, self.node.clone())?)
    }

    pub fn eq(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Eq, other)
    }

    pub fn ne(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Ne, other)
    }

    pub fn lt(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Lt, other)
    }

    pub fn gt(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Gt, other)
    }

    pub fn le(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Le, other)
    }

    pub fn ge(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.compare(ComparisonOp::Ge, other)
    }

    pub fn add(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.arith(ArithmeticOp::Add, other)
    }

    pub fn sub(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.arith(ArithmeticOp::Sub, other)
    }

    pub fn mul(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.arith(ArithmeticOp::Mul, other)
    }

    pub fn div(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.arith(ArithmeticOp::Div, other)
    }

    pub fn pow(&self, other: impl IntoValueExpr) -> Result<ValueExpr> {
        self.arith(ArithmeticOp::Pow, other)
    }

    pub fn sum(&self) -> Result<ValueExpr> {
        self.reduce(AggregateFunction::Sum)
    }

    pub fn count(&self) -> Result<ValueExpr> {
        self.reduce(AggregateFunction::Count)
    }

    pub fn mean(&self) -> Result<ValueExpr> {
        self.reduce(AggregateFunction::Mean)
    }

    pub fn min(&self) -> Result<ValueExpr> {
        self.reduce(AggregateFunction::Min)
    }

    pub fn max(&self) -> Result<ValueExpr> {
        self.reduce(AggregateFunction::Max)
    }
}
