//! Shared fixtures for backend tests

#![allow(dead_code)]

use tablexpr::{BackendConfig, Relation, Schema, Value};

pub const ALLTYPES_ROWS: i64 = 50;

pub fn alltypes_schema() -> Schema {
    Schema::parse([
        ("id", "int32"),
        ("bool_col", "boolean"),
        ("tinyint_col", "int8"),
        ("smallint_col", "int16"),
        ("int_col", "int32"),
        ("bigint_col", "int64"),
        ("float_col", "float32"),
        ("double_col", "float64"),
        ("string_col", "string"),
        ("year", "int32"),
        ("month", "int32"),
    ])
    .unwrap()
}

/// Deterministic stand-in for the functional_alltypes test table
pub fn alltypes() -> Relation {
    let rows = (0..ALLTYPES_ROWS)
        .map(|i| {
            let d = i % 10;
            vec![
                Value::Int64(i),
                Value::Boolean(i % 2 == 0),
                Value::Int64(d),
                Value::Int64(d),
                Value::Int64(d),
                Value::Int64(d * 10),
                Value::Float64(d as f64 * 1.5),
                Value::Float64(d as f64 * 10.1),
                Value::String(d.to_string()),
                Value::Int64(2009 + i % 2),
                Value::Int64(1 + i % 12),
            ]
        })
        .collect();
    Relation::new(alltypes_schema(), rows).unwrap()
}

pub fn batting() -> Relation {
    let schema = Schema::parse([("playerID", "string"), ("yearID", "int64"), ("G", "int64")]).unwrap();
    let rows = vec![
        vec![Value::from("aardsda01"), Value::Int64(2004), Value::Int64(11)],
        vec![Value::from("aardsda01"), Value::Int64(2006), Value::Int64(45)],
        vec![Value::from("aaronha01"), Value::Int64(1954), Value::Int64(122)],
    ];
    Relation::new(schema, rows).unwrap()
}

/// Configuration independent of the process environment
pub fn config() -> BackendConfig {
    BackendConfig::default()
}

pub fn column_f64(relation: &Relation, name: &str) -> Vec<f64> {
    relation
        .column(name)
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect()
}
