//! Per-engine rendering rules

use crate::expr::{AggregateFunction, ArithmeticOp, ComparisonOp};
use crate::types::DataType;
use std::fmt;

/// Words the engine parser reserves; identifiers spelled like one are quoted
const KEYWORDS: &[&str] = &[
    "all", "and", "as", "asc", "by", "create", "delete", "desc", "distinct", "drop", "exists",
    "false", "from", "group", "having", "if", "in", "insert", "into", "is", "join", "like",
    "limit", "not", "null", "offset", "on", "or", "order", "select", "set", "table", "true",
    "union", "update", "values", "where",
];

pub fn is_keyword(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    KEYWORDS.contains(&lower.as_str())
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    fn comparison_operator(&self, op: ComparisonOp) -> &'static str {
        match op {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        }
    }

    /// Render a binary arithmetic operation, None when the engine lacks it
    fn arithmetic(&self, op: ArithmeticOp, left: &str, right: &str) -> Option<String> {
        let symbol = match op {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Pow => return None,
        };
        Some(format!("{} {} {}", left, symbol, right))
    }

    fn aggregate_function(&self, function: AggregateFunction) -> Option<&'static str> {
        Some(match function {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Mean => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        })
    }

    /// Separator placed before FROM and WHERE
    fn clause_separator(&self) -> &'static str;

    /// Separator placed before LIMIT
    fn limit_separator(&self) -> &'static str;

    fn type_name(&self, dtype: DataType) -> &'static str {
        match dtype {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 => "TINYINT",
            DataType::Int16 => "SMALLINT",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "REAL",
            DataType::Float64 => "DOUBLE",
            DataType::String => "TEXT",
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        if is_plain_identifier(name) && !is_keyword(name) {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }
}

/// Dialect of the embedded file engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn clause_separator(&self) -> &'static str {
        " \n"
    }

    fn limit_separator(&self) -> &'static str {
        "\n "
    }
}

/// Dialect of the columnar engine
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnarDialect;

impl Dialect for ColumnarDialect {
    fn name(&self) -> &'static str {
        "columnar"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn comparison_operator(&self, op: ComparisonOp) -> &'static str {
        match op {
            ComparisonOp::Ne => "<>",
            ComparisonOp::Eq => "=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        }
    }

    fn arithmetic(&self, op: ArithmeticOp, left: &str, right: &str) -> Option<String> {
        let symbol = match op {
            ArithmeticOp::Pow => return Some(format!("power({}, {})", left, right)),
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        };
        Some(format!("{} {} {}", left, symbol, right))
    }

    fn clause_separator(&self) -> &'static str {
        "\n"
    }

    fn limit_separator(&self) -> &'static str {
        "\n"
    }

    fn type_name(&self, dtype: DataType) -> &'static str {
        match dtype {
            DataType::Float64 => "FLOAT",
            DataType::String => "VARCHAR",
            DataType::Boolean => "BOOL",
            DataType::Int8 => "TINYINT",
            DataType::Int16 => "SMALLINT",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "REAL",
        }
    }
}
