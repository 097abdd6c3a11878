//! Expression IR
//!
//! Nodes are immutable and shared through `Arc`. Equality and hashing are
//! structural: two nodes are equal when their kind and every field are
//! equal, recursively. A filter without predicates is indistinguishable
//! from its input.

use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::types::{DataType, TypeKind, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a physical resource (file, directory or in-memory store)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Le => "le",
            ComparisonOp::Ge => "ge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl ArithmeticOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Mul => "mul",
            ArithmeticOp::Div => "div",
            ArithmeticOp::Pow => "pow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Count,
    Mean,
    Min,
    Max,
}

impl AggregateFunction {
    /// Name of the function, also used as the output column name
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Mean => "mean",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: String,
    pub schema: Schema,
    pub source: Option<SourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Arc<Node>,
    pub name: String,
    pub dtype: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: Value,
    pub dtype: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparison {
    pub left: Arc<Node>,
    pub op: ComparisonOp,
    pub right: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arithmetic {
    pub left: Arc<Node>,
    pub op: ArithmeticOp,
    pub right: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub input: Arc<Node>,
    pub predicates: Vec<Arc<Node>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection {
    pub input: Arc<Node>,
    pub columns: Vec<Arc<Node>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    pub input: Arc<Node>,
    pub function: AggregateFunction,
    pub column: Arc<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Limit {
    pub input: Arc<Node>,
    pub n: u64,
    pub offset: u64,
}

/// A node of the expression tree.
///
/// Build nodes through the associated constructors, which validate types
/// and column references. The payloads are public for inspection; the
/// compiler re-validates column references so hand-built trees fail at
/// compile time instead of producing bad SQL.
#[derive(Debug, Clone)]
pub enum Node {
    Table(TableRef),
    Column(ColumnRef),
    Literal(Literal),
    Comparison(Comparison),
    Arithmetic(Arithmetic),
    Filter(Filter),
    Projection(Projection),
    Aggregate(Aggregate),
    Limit(Limit),
}

impl Node {
    pub fn table(name: impl Into<String>, schema: Schema, source: Option<SourceId>) -> Arc<Node> {
        Arc::new(Node::Table(TableRef {
            name: name.into(),
            schema,
            source,
        }))
    }

    /// Reference a column of `table`, taking its type from the schema
    pub fn column(table: &Arc<Node>, name: &str) -> Result<Arc<Node>> {
        let schema = table.relation_schema("ColumnRef")?;
        let field = schema.field(name).ok_or_else(|| Error::UnknownColumn {
            table: table.display_name(),
            column: name.to_string(),
        })?;
        Ok(Arc::new(Node::Column(ColumnRef {
            table: table.clone(),
            name: field.name.clone(),
            dtype: field.dtype,
        })))
    }

    /// Reference a column with an expected type, which must match the schema
    pub fn typed_column(table: &Arc<Node>, name: &str, dtype: DataType) -> Result<Arc<Node>> {
        let node = Self::column(table, name)?;
        let actual = node.dtype().unwrap_or(dtype);
        if actual != dtype {
            return Err(Error::mismatch(format!("column {}", name), dtype, actual));
        }
        Ok(node)
    }

    pub fn literal(value: Value) -> Result<Arc<Node>> {
        let dtype = value.dtype().ok_or_else(|| {
            Error::unsupported("Literal", "a null literal needs an explicit type")
        })?;
        Ok(Arc::new(Node::Literal(Literal { value, dtype })))
    }

    pub fn typed_literal(value: Value, dtype: DataType) -> Result<Arc<Node>> {
        let value = match (value, dtype.kind()) {
            (Value::Null, _) => Value::Null,
            (Value::Int64(v), TypeKind::Integer) => {
                let (min, max) = dtype.integer_range().unwrap_or((i64::MIN, i64::MAX));
                if v < min || v > max {
                    return Err(Error::mismatch("literal", v, dtype));
                }
                Value::Int64(v)
            }
            (Value::Int64(v), TypeKind::Floating) => Value::Float64(v as f64),
            (v @ Value::Float64(_), TypeKind::Floating)
            | (v @ Value::Boolean(_), TypeKind::Boolean)
            | (v @ Value::String(_), TypeKind::String) => v,
            (v, _) => return Err(Error::mismatch("literal", v, dtype)),
        };
        Ok(Arc::new(Node::Literal(Literal { value, dtype })))
    }

    pub fn comparison(left: Arc<Node>, op: ComparisonOp, right: Arc<Node>) -> Result<Arc<Node>> {
        let context = format!("comparison {}", op.name());
        let (l, r) = (left.value_type(&context)?, right.value_type(&context)?);
        if !l.kind().comparable_with(r.kind()) {
            return Err(Error::mismatch(context, l, r));
        }
        Ok(Arc::new(Node::Comparison(Comparison { left, op, right })))
    }

    pub fn arithmetic(left: Arc<Node>, op: ArithmeticOp, right: Arc<Node>) -> Result<Arc<Node>> {
        let context = format!("arithmetic {}", op.name());
        let (l, r) = (left.value_type(&context)?, right.value_type(&context)?);
        if !l.is_numeric() || !r.is_numeric() {
            return Err(Error::mismatch(context, l, r));
        }
        Ok(Arc::new(Node::Arithmetic(Arithmetic { left, op, right })))
    }

    /// Filter a relation. Filters over filters flatten into one node with
    /// the inner predicates first; an empty predicate list returns the input.
    pub fn filter(input: &Arc<Node>, predicates: Vec<Arc<Node>>) -> Result<Arc<Node>> {
        input.relation_schema("Filter")?;
        for predicate in &predicates {
            let dtype = predicate.value_type("filter predicate")?;
            if dtype != DataType::Boolean {
                return Err(Error::mismatch("filter predicate", dtype, DataType::Boolean));
            }
        }
        if predicates.is_empty() {
            return Ok(input.clone());
        }
        let node = match input.as_ref() {
            Node::Filter(inner) => {
                let mut merged = inner.predicates.clone();
                merged.extend(predicates);
                Filter {
                    input: inner.input.clone(),
                    predicates: merged,
                }
            }
            _ => Filter {
                input: input.clone(),
                predicates,
            },
        };
        Ok(Arc::new(Node::Filter(node)))
    }

    pub fn projection(input: &Arc<Node>, columns: Vec<Arc<Node>>) -> Result<Arc<Node>> {
        input.relation_schema("Projection")?;
        if columns.is_empty() {
            return Err(Error::unsupported("Projection", "no columns selected"));
        }
        let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
        for column in &columns {
            let Node::Column(col) = column.as_ref() else {
                return Err(Error::unsupported(
                    "Projection",
                    format!("only column references can be selected, got {}", column.kind_name()),
                ));
            };
            if seen.contains(&col.name.as_str()) {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
            seen.push(&col.name);
        }
        Ok(Arc::new(Node::Projection(Projection {
            input: input.clone(),
            columns,
        })))
    }

    pub fn aggregate(function: AggregateFunction, column: Arc<Node>) -> Result<Arc<Node>> {
        let context = format!("aggregate {}", function.name());
        let dtype = column.value_type(&context)?;
        if matches!(function, AggregateFunction::Sum | AggregateFunction::Mean) && !dtype.is_numeric() {
            return Err(Error::mismatch(context, dtype, "numeric"));
        }
        let input = column.base_relation().ok_or_else(|| {
            Error::unsupported("Aggregate", "the aggregated expression has no input relation")
        })?;
        Ok(Arc::new(Node::Aggregate(Aggregate {
            input,
            function,
            column,
        })))
    }

    pub fn limit(input: &Arc<Node>, n: u64, offset: u64) -> Result<Arc<Node>> {
        input.relation_schema("Limit")?;
        Ok(Arc::new(Node::Limit(Limit {
            input: input.clone(),
            n,
            offset,
        })))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Table(_) => "TableRef",
            Node::Column(_) => "ColumnRef",
            Node::Literal(_) => "Literal",
            Node::Comparison(_) => "Comparison",
            Node::Arithmetic(_) => "Arithmetic",
            Node::Filter(_) => "Filter",
            Node::Projection(_) => "Projection",
            Node::Aggregate(_) => "Aggregate",
            Node::Limit(_) => "Limit",
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            Node::Table(_) | Node::Filter(_) | Node::Projection(_) | Node::Limit(_)
        )
    }

    /// Schema of a relation node, None for value nodes
    pub fn schema(&self) -> Option<Schema> {
        match self {
            Node::Table(t) => Some(t.schema.clone()),
            Node::Filter(f) => f.input.schema(),
            Node::Limit(l) => l.input.schema(),
            Node::Projection(p) => {
                let fields = p
                    .columns
                    .iter()
                    .filter_map(|c| match c.as_ref() {
                        Node::Column(col) => Some(Field::new(col.name.clone(), col.dtype)),
                        _ => None,
                    })
                    .collect();
                Schema::new(fields).ok()
            }
            _ => None,
        }
    }

    /// Type of a value node, None for relations
    pub fn dtype(&self) -> Option<DataType> {
        match self {
            Node::Column(c) => Some(c.dtype),
            Node::Literal(l) => Some(l.dtype),
            Node::Comparison(_) => Some(DataType::Boolean),
            Node::Arithmetic(a) => {
                let l = a.left.dtype()?;
                let r = a.right.dtype()?;
                Some(arithmetic_type(a.op, l, r))
            }
            Node::Aggregate(a) => {
                let input = a.column.dtype()?;
                Some(match a.function {
                    AggregateFunction::Count => DataType::Int64,
                    AggregateFunction::Mean => DataType::Float64,
                    AggregateFunction::Sum if input.kind() == TypeKind::Floating => {
                        DataType::Float64
                    }
                    AggregateFunction::Sum => DataType::Int64,
                    AggregateFunction::Min | AggregateFunction::Max => input,
                })
            }
            _ => None,
        }
    }

    /// Name of the single output column of a value node
    pub fn output_name(&self) -> &str {
        match self {
            Node::Column(c) => &c.name,
            Node::Aggregate(a) => a.function.name(),
            _ => "tmp",
        }
    }

    /// Schema of the rows produced by executing this node
    pub fn output_schema(&self) -> Schema {
        match (self.schema(), self.dtype()) {
            (Some(schema), _) => schema,
            (None, Some(dtype)) => Schema::new(vec![Field::new(self.output_name(), dtype)])
                .unwrap_or_default(),
            (None, None) => Schema::default(),
        }
    }

    /// The table at the bottom of a relation chain
    pub fn root_table(&self) -> Option<&TableRef> {
        match self {
            Node::Table(t) => Some(t),
            Node::Filter(f) => f.input.root_table(),
            Node::Limit(l) => l.input.root_table(),
            Node::Projection(p) => p.input.root_table(),
            _ => None,
        }
    }

    /// The relation a value node reads from: the table of its first column
    /// reference, or the input of an aggregate
    pub fn base_relation(&self) -> Option<Arc<Node>> {
        match self {
            Node::Column(c) => Some(c.table.clone()),
            Node::Literal(_) => None,
            Node::Comparison(Comparison { left, right, .. })
            | Node::Arithmetic(Arithmetic { left, right, .. }) => {
                left.base_relation().or_else(|| right.base_relation())
            }
            Node::Aggregate(a) => Some(a.input.clone()),
            _ => None,
        }
    }

    /// Name used for this relation in error messages
    pub fn display_name(&self) -> String {
        self.root_table()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| self.kind_name().to_string())
    }

    fn relation_schema(&self, context: &'static str) -> Result<Schema> {
        self.schema().ok_or_else(|| {
            Error::unsupported(context, format!("expected a relation, got {}", self.kind_name()))
        })
    }

    fn value_type(&self, context: &str) -> Result<DataType> {
        self.dtype()
            .ok_or_else(|| Error::mismatch(context, self.kind_name(), "a value expression"))
    }

    fn canonical(&self) -> &Node {
        let mut node = self;
        while let Node::Filter(f) = node {
            if !f.predicates.is_empty() {
                break;
            }
            node = &f.input;
        }
        node
    }
}

fn arithmetic_type(op: ArithmeticOp, left: DataType, right: DataType) -> DataType {
    let floating = left.kind() == TypeKind::Floating || right.kind() == TypeKind::Floating;
    match op {
        ArithmeticOp::Div | ArithmeticOp::Pow => DataType::Float64,
        _ if left == DataType::Float32 && right == DataType::Float32 => DataType::Float32,
        _ if floating => DataType::Float64,
        _ => DataType::Int64,
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self.canonical(), other.canonical()) {
            (Node::Table(a), Node::Table(b)) => a == b,
            (Node::Column(a), Node::Column(b)) => a == b,
            (Node::Literal(a), Node::Literal(b)) => a == b,
            (Node::Comparison(a), Node::Comparison(b)) => a == b,
            (Node::Arithmetic(a), Node::Arithmetic(b)) => a == b,
            (Node::Filter(a), Node::Filter(b)) => a == b,
            (Node::Projection(a), Node::Projection(b)) => a == b,
            (Node::Aggregate(a), Node::Aggregate(b)) => a == b,
            (Node::Limit(a), Node::Limit(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let node = self.canonical();
        std::mem::discriminant(node).hash(state);
        match node {
            Node::Table(t) => t.hash(state),
            Node::Column(c) => c.hash(state),
            Node::Literal(l) => l.hash(state),
            Node::Comparison(c) => c.hash(state),
            Node::Arithmetic(a) => a.hash(state),
            Node::Filter(f) => f.hash(state),
            Node::Projection(p) => p.hash(state),
            Node::Aggregate(a) => a.hash(state),
            Node::Limit(l) => l.hash(state),
        }
    }
}
