// SQL Type System
use super::EngineError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Runtime value of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

/// How a column stores its values, derived from the declared type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    Integer,
    Real,
    Text,
    Boolean,
}

impl StorageClass {
    /// Affinity of a declared type name, e.g. `BIGINT` or `VARCHAR(20)`
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_uppercase();
        if upper.contains("BOOL") {
            StorageClass::Boolean
        } else if upper.contains("INT") {
            StorageClass::Integer
        } else if upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("STRING") || upper.contains("CLOB") {
            StorageClass::Text
        } else {
            StorageClass::Real
        }
    }

    /// Declared type used for computed result columns
    pub fn default_declared(&self) -> &'static str {
        match self {
            StorageClass::Integer => "BIGINT",
            StorageClass::Real => "DOUBLE",
            StorageClass::Text => "TEXT",
            StorageClass::Boolean => "BOOLEAN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub declared_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }

    pub fn storage_class(&self) -> StorageClass {
        StorageClass::from_declared(&self.declared_type)
    }

    /// Convert a value to this column's storage class
    pub fn coerce(&self, value: SqlValue) -> Result<SqlValue, EngineError> {
        let class = self.storage_class();
        let coerced = match (class, value) {
            (_, SqlValue::Null) => Some(SqlValue::Null),
            (StorageClass::Integer, SqlValue::Integer(v)) => Some(SqlValue::Integer(v)),
            (StorageClass::Integer, SqlValue::Real(v)) if v.fract() == 0.0 && v.abs() < 9.0e18 => {
                Some(SqlValue::Integer(v as i64))
            }
            (StorageClass::Integer, SqlValue::Boolean(v)) => Some(SqlValue::Integer(v as i64)),
            (StorageClass::Real, SqlValue::Integer(v)) => Some(SqlValue::Real(v as f64)),
            (StorageClass::Real, SqlValue::Real(v)) => Some(SqlValue::Real(v)),
            (StorageClass::Text, SqlValue::Text(v)) => Some(SqlValue::Text(v)),
            (StorageClass::Boolean, SqlValue::Boolean(v)) => Some(SqlValue::Boolean(v)),
            (StorageClass::Boolean, SqlValue::Integer(v)) if v == 0 || v == 1 => {
                Some(SqlValue::Boolean(v == 1))
            }
            _ => None,
        };
        coerced.ok_or_else(|| {
            EngineError::Type(format!(
                "cannot store value in column {} of type {}",
                self.name, self.declared_type
            ))
        })
    }
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn storage_class(&self) -> Option<StorageClass> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(_) => Some(StorageClass::Integer),
            SqlValue::Real(_) => Some(StorageClass::Real),
            SqlValue::Text(_) => Some(StorageClass::Text),
            SqlValue::Boolean(_) => Some(StorageClass::Boolean),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(v) => Some(*v as f64),
            SqlValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Truth value in a WHERE clause; NULL is not true
    pub fn is_truthy(&self) -> bool {
        match self {
            SqlValue::Boolean(v) => *v,
            SqlValue::Integer(v) => *v != 0,
            SqlValue::Real(v) => *v != 0.0,
            _ => false,
        }
    }

    /// SQL ordering; None when either side is NULL or the types differ
    pub fn compare(&self, other: &SqlValue) -> Result<Option<Ordering>, EngineError> {
        match (self, other) {
            (SqlValue::Null, _) | (_, SqlValue::Null) => Ok(None),
            (SqlValue::Integer(a), SqlValue::Integer(b)) => Ok(Some(a.cmp(b))),
            (SqlValue::Text(a), SqlValue::Text(b)) => Ok(Some(a.cmp(b))),
            (SqlValue::Boolean(a), SqlValue::Boolean(b)) => Ok(Some(a.cmp(b))),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
                _ => Err(EngineError::Type(format!("cannot compare {} with {}", a, b))),
            },
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v),
            SqlValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Boolean(v) => SqlValue::Boolean(*v),
            Value::Int64(v) => SqlValue::Integer(*v),
            Value::Float64(v) => SqlValue::Real(*v),
            Value::String(v) => SqlValue::Text(v.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity() {
        assert_eq!(StorageClass::from_declared("BIGINT"), StorageClass::Integer);
        assert_eq!(StorageClass::from_declared("smallint"), StorageClass::Integer);
        assert_eq!(StorageClass::from_declared("VARCHAR(20)"), StorageClass::Text);
        assert_eq!(StorageClass::from_declared("DOUBLE"), StorageClass::Real);
        assert_eq!(StorageClass::from_declared("BOOLEAN"), StorageClass::Boolean);
    }

    #[test]
    fn test_coerce() {
        let col = ColumnDef::new("x", "DOUBLE");
        assert_eq!(col.coerce(SqlValue::Integer(2)).unwrap(), SqlValue::Real(2.0));
        assert!(col.coerce(SqlValue::Text("a".into())).is_err());

        let col = ColumnDef::new("b", "BOOLEAN");
        assert_eq!(col.coerce(SqlValue::Integer(1)).unwrap(), SqlValue::Boolean(true));
        assert!(col.coerce(SqlValue::Integer(2)).is_err());
    }

    #[test]
    fn test_compare_mixed_numeric() {
        let ord = SqlValue::Integer(1).compare(&SqlValue::Real(1.5)).unwrap();
        assert_eq!(ord, Some(Ordering::Less));
        assert_eq!(SqlValue::Null.compare(&SqlValue::Integer(1)).unwrap(), None);
        assert!(SqlValue::Text("a".into()).compare(&SqlValue::Integer(1)).is_err());
    }
}
