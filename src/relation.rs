//! Materialized query results
//!
//! A [`Relation`] is a schema-typed table of [`Value`]s. Results coming
//! back from an engine are decoded against the schema the expression
//! declared, so callers always see the semantic types they asked for.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::sql::{ResultSet, SqlValue};
use crate::types::{DataType, TypeKind, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Relation {
    /// Build a relation, checking every row against `schema`
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        for row in &rows {
            if row.len() != schema.len() {
                return Err(Error::mismatch(
                    "relation row",
                    format!("{} values", row.len()),
                    format!("{} columns", schema.len()),
                ));
            }
            for (field, value) in schema.fields().iter().zip(row) {
                check_value(field.dtype, value).map_err(|reason| {
                    Error::mismatch(format!("column {}", field.name), reason, field.dtype)
                })?;
            }
        }
        Ok(Self { schema, rows })
    }

    /// Decode an engine result into the declared `schema`
    pub fn decode(schema: Schema, result: ResultSet) -> Result<Self> {
        if result.columns.len() != schema.len() {
            return Err(Error::EngineExecution(format!(
                "engine returned {} columns, expected {}",
                result.columns.len(),
                schema.len()
            )));
        }
        let rows = result
            .rows
            .into_iter()
            .map(|row| {
                schema
                    .fields()
                    .iter()
                    .zip(row)
                    .map(|(field, value)| {
                        coerce(field.dtype, value).map_err(|reason| {
                            Error::EngineExecution(format!(
                                "cannot decode column {} as {}: {}",
                                field.name, field.dtype, reason
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.schema.index_of(name).ok_or_else(|| Error::UnknownColumn {
            table: "relation".to_string(),
            column: name.to_string(),
        })?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// The only value of a one-row, one-column relation
    pub fn scalar(&self) -> Option<&Value> {
        match (self.schema.len(), self.rows.as_slice()) {
            (1, [row]) => row.first(),
            _ => None,
        }
    }
}

fn check_value(dtype: DataType, value: &Value) -> std::result::Result<(), String> {
    match (dtype.kind(), value) {
        (_, Value::Null) => Ok(()),
        (TypeKind::Integer, Value::Int64(v)) => check_range(dtype, *v),
        (TypeKind::Floating, Value::Float64(_))
        | (TypeKind::Boolean, Value::Boolean(_))
        | (TypeKind::String, Value::String(_)) => Ok(()),
        (_, other) => Err(other.to_string()),
    }
}

fn check_range(dtype: DataType, v: i64) -> std::result::Result<(), String> {
    match dtype.integer_range() {
        Some((min, max)) if v < min || v > max => Err(format!("{} out of range", v)),
        _ => Ok(()),
    }
}

fn coerce(dtype: DataType, value: SqlValue) -> std::result::Result<Value, String> {
    let decoded = match (dtype.kind(), value) {
        (_, SqlValue::Null) => Value::Null,
        (TypeKind::Integer, SqlValue::Integer(v)) => {
            check_range(dtype, v)?;
            Value::Int64(v)
        }
        (TypeKind::Integer, SqlValue::Real(v)) if v.fract() == 0.0 && v.abs() < 9.0e18 => {
            check_range(dtype, v as i64)?;
            Value::Int64(v as i64)
        }
        (TypeKind::Integer, SqlValue::Boolean(v)) => Value::Int64(v as i64),
        (TypeKind::Floating, SqlValue::Real(v)) => Value::Float64(v),
        (TypeKind::Floating, SqlValue::Integer(v)) => Value::Float64(v as f64),
        (TypeKind::Boolean, SqlValue::Boolean(v)) => Value::Boolean(v),
        (TypeKind::Boolean, SqlValue::Integer(v)) if v == 0 || v == 1 => Value::Boolean(v == 1),
        (TypeKind::String, SqlValue::Text(v)) => Value::String(v),
        (_, other) => return Err(format!("unexpected value {}", other)),
    };
    Ok(decoded)
}
