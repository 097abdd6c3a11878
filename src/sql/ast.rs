// Abstract Syntax Tree for SQL
use super::types::{ColumnDef, SqlValue};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    CreateTable(CreateTableStatement),
    CreateTableAs(CreateTableAsStatement),
    DropTable(DropTableStatement),
}

/// Possibly database-qualified object name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub database: Option<String>,
    pub name: String,
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub columns: Vec<SelectItem>,
    pub from: Option<TableReference>,
    pub where_clause: Option<Expression>,
    pub limit: Option<Expression>,
    pub offset: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Expression {
        expr: Expression,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub name: ObjectName,
    pub alias: Option<String>,
}

impl TableReference {
    /// Name columns are qualified with
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(SqlValue),
    /// Zero-based parameter index
    Placeholder(usize),
    Identifier(String),
    QualifiedIdentifier { table: String, column: String },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    },
    /// `*` argument of `count(*)`
    Wildcard,
}

impl Expression {
    /// Column name given to the expression when it has no alias
    pub fn default_name(&self) -> String {
        match self {
            Expression::Identifier(name) => name.clone(),
            Expression::QualifiedIdentifier { column, .. } => column.clone(),
            Expression::FunctionCall { name, .. } => name.to_lowercase(),
            _ => "expr".to_string(),
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::FunctionCall { name, args } => {
                is_aggregate(name) || args.iter().any(|a| a.contains_aggregate())
            }
            Expression::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::UnaryOp { expr, .. } | Expression::IsNull { expr, .. } => {
                expr.contains_aggregate()
            }
            _ => false,
        }
    }
}

pub fn is_aggregate(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "sum" | "count" | "avg" | "min" | "max"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Less
                | BinaryOperator::Greater
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: ObjectName,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: ObjectName,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableAsStatement {
    pub name: ObjectName,
    pub query: SelectStatement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub name: ObjectName,
    pub if_exists: bool,
}
