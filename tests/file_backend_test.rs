//! End-to-end tests of the file backend

mod common;

use std::path::Path;
use tablexpr::backend::file::{self, FileBackend};
use tablexpr::{literal, Error, Relation, Schema, TraceContext, Value};
use tempfile::TempDir;

fn connect(path: &Path, create: bool) -> FileBackend {
    file::connect_with(path, create, common::config())
        .unwrap()
        .with_trace(TraceContext::new())
}

fn setup() -> (TempDir, FileBackend) {
    let dir = TempDir::new().unwrap();
    let con = connect(&dir.path().join("test.db"), true);
    con.create_table("functional_alltypes", common::alltypes()).unwrap();
    con.create_table("batting", common::batting()).unwrap();
    (dir, con)
}

#[test]
fn test_connect_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.db");

    let err = file::connect_with(&path, false, common::config()).err().unwrap();
    assert!(matches!(err, Error::ResourceNotFound(_)));
    assert!(!path.exists());

    let con = file::connect_with(&path, true, common::config()).unwrap();
    assert!(path.exists());
    assert!(con.list_tables(None, None).unwrap().is_empty());
}

#[test]
fn test_list_tables() {
    let (_dir, con) = setup();
    assert_eq!(
        con.list_tables(None, None).unwrap(),
        vec!["batting".to_string(), "functional_alltypes".to_string()]
    );
    assert_eq!(
        con.list_tables(None, Some("functional")).unwrap(),
        vec!["functional_alltypes".to_string()]
    );
    assert_eq!(con.list_tables(None, Some("^b")).unwrap(), vec!["batting".to_string()]);
    assert!(matches!(con.list_tables(None, Some("(")), Err(Error::InvalidPattern(_))));
    assert!(matches!(
        con.list_tables(Some("nope"), None),
        Err(Error::DatabaseNotFound(_))
    ));
}

#[test]
fn test_table_schema_round_trips() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();
    assert_eq!(t.schema(), &common::alltypes_schema());
    assert_eq!(t.name(), "functional_alltypes");
    assert!(matches!(con.table("missing"), Err(Error::TableNotFound(_))));
}

#[test]
fn test_structural_equality_across_connections() {
    let (dir, con) = setup();
    let other = connect(&dir.path().join("test.db"), false);

    let a = con.table("functional_alltypes").unwrap();
    let b = other.table("functional_alltypes").unwrap();
    assert_eq!(a, b);
    assert!(a.equals(&b));
    assert!(a.column("id").unwrap().equals(&b.column("id").unwrap()));

    assert_ne!(a, con.table("batting").unwrap());

    let elsewhere = connect(&dir.path().join("other.db"), true);
    elsewhere
        .create_table("functional_alltypes", common::alltypes())
        .unwrap();
    assert_ne!(a, elsewhere.table("functional_alltypes").unwrap());
}

#[test]
fn test_compile_qualifies_tables() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();

    let query = con.compile(&t.column("year").unwrap()).unwrap();
    assert_eq!(query.sql, "SELECT t0.year \nFROM base.functional_alltypes AS t0");

    let query = con.compile(&t.select(&["year"]).unwrap().limit(5)).unwrap();
    assert_eq!(
        query.sql,
        "SELECT t0.year \nFROM base.functional_alltypes AS t0\n LIMIT ? OFFSET ?"
    );
    assert_eq!(query.params, vec![Value::Int64(5), Value::Int64(0)]);

    // Same text and parameters every time
    assert_eq!(query, con.compile(&t.select(&["year"]).unwrap().limit(5)).unwrap());
}

#[test]
fn test_execute_column_matches_stored_data() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();
    let result = con.execute(&t.column("double_col").unwrap()).unwrap();
    assert_eq!(
        result.column("double_col").unwrap(),
        common::alltypes().column("double_col").unwrap()
    );

    let result = con.execute(&t.column("tinyint_col").unwrap()).unwrap();
    assert_eq!(result.rows()[3], vec![Value::Int64(3)]);
}

#[test]
fn test_execute_literal() {
    let (_dir, con) = setup();
    let result = con.execute(&literal(5).unwrap()).unwrap();
    assert_eq!(result.scalar(), Some(&Value::Int64(5)));

    let result = con.execute(&literal("hello").unwrap()).unwrap();
    assert_eq!(result.scalar(), Some(&Value::from("hello")));
}

#[test]
fn test_aggregates_match_reference() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();
    let reference = common::column_f64(&common::alltypes(), "double_col");
    let total: f64 = reference.iter().sum();

    let double_col = t.column("double_col").unwrap();
    let sum = con.execute(&double_col.sum().unwrap()).unwrap();
    let sum = sum.scalar().and_then(Value::as_f64).unwrap();
    assert!((sum - total).abs() < 1e-9);

    let mean = con.execute(&double_col.mean().unwrap()).unwrap();
    let mean = mean.scalar().and_then(Value::as_f64).unwrap();
    assert!((mean - total / reference.len() as f64).abs() < 1e-9);

    let count = con.execute(&double_col.count().unwrap()).unwrap();
    assert_eq!(count.scalar(), Some(&Value::Int64(common::ALLTYPES_ROWS)));

    let string_col = t.column("string_col").unwrap();
    let min = con.execute(&string_col.min().unwrap()).unwrap();
    assert_eq!(min.scalar(), Some(&Value::from("0")));
    let max = con.execute(&string_col.max().unwrap()).unwrap();
    assert_eq!(max.scalar(), Some(&Value::from("9")));

    let int_sum = con.execute(&t.column("bigint_col").unwrap().sum().unwrap()).unwrap();
    assert_eq!(int_sum.scalar(), Some(&Value::Int64(45 * 10 * 5)));
}

#[test]
fn test_filter_and_limit() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();
    let expr = t
        .filter([
            t.column("bool_col").unwrap().eq(true).unwrap(),
            t.column("int_col").unwrap().gt(4).unwrap(),
        ])
        .unwrap()
        .limit(3);
    let result = con.execute(&expr).unwrap();
    assert_eq!(result.schema(), t.schema());
    assert_eq!(
        result.column("id").unwrap(),
        vec![Value::Int64(6), Value::Int64(8), Value::Int64(16)]
    );

    let page = con.execute(&t.select(&["id"]).unwrap().limit_offset(2, 10)).unwrap();
    assert_eq!(page.rows(), &[vec![Value::Int64(10)], vec![Value::Int64(11)]]);
}

#[test]
fn test_arithmetic() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();
    let id = t.column("id").unwrap();

    let result = con
        .execute(&t.filter([id.eq(7).unwrap()]).unwrap().select(&["id"]).unwrap())
        .unwrap();
    assert_eq!(result.num_rows(), 1);

    let halves = con.execute(&id.div(2).unwrap()).unwrap();
    assert_eq!(halves.rows()[7], vec![Value::Float64(3.5)]);

    let pow = id.pow(2).unwrap();
    assert!(matches!(
        con.execute(&pow),
        Err(Error::UnsupportedExpression { kind: "Arithmetic", .. })
    ));
}

#[test]
fn test_create_table_from_expression_round_trip() {
    let (_dir, con) = setup();
    let t = con.table("functional_alltypes").unwrap();

    let created = con.create_table("t5", &t.limit(5)).unwrap();
    assert_eq!(created.schema(), t.schema());
    assert_eq!(
        con.execute(&con.table("t5").unwrap()).unwrap(),
        con.execute(&t.limit(5)).unwrap()
    );
    assert!(con.list_tables(None, None).unwrap().contains(&"t5".to_string()));

    con.drop_table("t5").unwrap();
    assert!(!con.list_tables(None, None).unwrap().contains(&"t5".to_string()));
    assert!(matches!(con.drop_table("t5"), Err(Error::TableNotFound(_))));
}

#[test]
fn test_create_table_from_schema() {
    let (_dir, con) = setup();
    let schema = Schema::parse([("a", "int64"), ("b", "string")]).unwrap();
    let t = con.create_table("empty", schema.clone()).unwrap();
    assert_eq!(t.schema(), &schema);
    assert!(con.execute(&t).unwrap().is_empty());
}

#[test]
fn test_create_existing_table_fails_cleanly() {
    let (_dir, con) = setup();
    let err = con.create_table("batting", common::batting()).unwrap_err();
    assert!(matches!(err, Error::EngineExecution(_)));

    let batting = con.table("batting").unwrap();
    assert_eq!(con.execute(&batting).unwrap(), common::batting());
}

#[test]
fn test_attach() {
    let (dir, con) = setup();

    let other_path = dir.path().join("other.db");
    {
        let other = connect(&other_path, true);
        other.create_table("people", common::batting()).unwrap();
    }

    con.attach("other", &other_path).unwrap();
    assert_eq!(con.list_tables(Some("other"), None).unwrap(), vec!["people".to_string()]);
    let people = con.table_in(Some("other"), "people").unwrap();
    assert_eq!(con.execute(&people).unwrap().num_rows(), 3);
    assert!(con
        .compile(&people)
        .unwrap()
        .sql
        .contains("FROM other.people AS t0"));

    // A second alias of the default database sees the same tables
    con.attach("again", dir.path().join("test.db")).unwrap();
    assert_eq!(
        con.list_tables(Some("again"), None).unwrap(),
        con.list_tables(Some("base"), None).unwrap()
    );
    assert_eq!(
        con.table_in(Some("again"), "batting").unwrap(),
        con.table("batting").unwrap()
    );

    assert!(matches!(
        con.attach("other", &other_path),
        Err(Error::EngineExecution(_))
    ));
    assert!(matches!(
        con.attach("ghost", dir.path().join("ghost.db")),
        Err(Error::ResourceNotFound(_))
    ));
    assert_eq!(
        con.list_databases().unwrap(),
        vec!["base".to_string(), "other".to_string(), "again".to_string()]
    );
}

#[test]
fn test_attach_same_file_twice() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.db");
    {
        let con = connect(&path, true);
        con.create_table("batting", common::batting()).unwrap();
        con.create_table("functional_alltypes", common::alltypes()).unwrap();
    }

    let con = file::in_memory().unwrap().with_trace(TraceContext::new());
    con.attach("foo", &path).unwrap();
    con.attach("bar", &path).unwrap();

    let foo_tables = con.list_tables(Some("foo"), None).unwrap();
    assert_eq!(foo_tables, vec!["batting".to_string(), "functional_alltypes".to_string()]);
    assert_eq!(foo_tables, con.list_tables(Some("bar"), None).unwrap());

    let via_foo = con.table_in(Some("foo"), "batting").unwrap();
    let via_bar = con.table_in(Some("bar"), "batting").unwrap();
    assert_eq!(via_foo, via_bar);
    assert_eq!(
        con.compile(&via_bar).unwrap().sql,
        "SELECT * \nFROM foo.batting AS t0"
    );
    assert_eq!(con.execute(&via_bar).unwrap(), common::batting());
}

#[test]
fn test_table_from_unattached_file_rejected() {
    let dir = TempDir::new().unwrap();
    let a = connect(&dir.path().join("a.db"), true);
    let c = connect(&dir.path().join("c.db"), true);
    a.create_table("batting", common::batting()).unwrap();
    c.create_table("batting", common::batting()).unwrap();

    let foreign = a.table("batting").unwrap();
    assert!(matches!(
        c.execute(&foreign),
        Err(Error::UnsupportedExpression { kind: "TableRef", .. })
    ));
    assert!(matches!(
        c.compile(&foreign),
        Err(Error::UnsupportedExpression { kind: "TableRef", .. })
    ));
    assert!(c.create_table("copy", &foreign).is_err());
    assert!(!c.list_tables(None, None).unwrap().contains(&"copy".to_string()));

    // Attaching the file makes the same expression usable
    c.attach("a", dir.path().join("a.db")).unwrap();
    assert_eq!(c.compile(&foreign).unwrap().sql, "SELECT * \nFROM a.batting AS t0");
    assert_eq!(c.execute(&foreign).unwrap(), common::batting());
}

#[test]
fn test_failed_insert_drops_created_table() {
    let (_dir, con) = setup();

    // Rows that bypass validation, as a relation read back from JSON can
    let mut json = serde_json::to_value(common::batting()).unwrap();
    json["rows"][1][1] = serde_json::to_value(Value::from("not a year")).unwrap();
    let corrupt: Relation = serde_json::from_value(json).unwrap();

    let err = con.create_table("broken", corrupt).unwrap_err();
    assert!(matches!(err, Error::EngineExecution(_)));
    assert!(!con.list_tables(None, None).unwrap().contains(&"broken".to_string()));
    assert!(matches!(con.table("broken"), Err(Error::TableNotFound(_))));

    // The name is free again
    con.create_table("broken", common::batting()).unwrap();
    assert_eq!(con.execute(&con.table("broken").unwrap()).unwrap(), common::batting());
}

#[test]
fn test_data_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("persist.db");
    {
        let con = connect(&path, true);
        con.create_table("batting", common::batting()).unwrap();
        con.close().unwrap();
    }

    let con = connect(&path, false);
    let batting = con.table("batting").unwrap();
    assert_eq!(con.execute(&batting).unwrap(), common::batting());
}

#[test]
fn test_closed_connection() {
    let (_dir, con) = setup();
    let t = con.table("batting").unwrap();
    con.close().unwrap();
    assert!(con.is_closed());
    assert!(matches!(con.list_tables(None, None), Err(Error::ConnectionClosed)));
    assert!(matches!(con.execute(&t), Err(Error::ConnectionClosed)));
    assert!(matches!(con.table("batting"), Err(Error::ConnectionClosed)));
}

#[test]
fn test_in_memory() {
    let con = file::in_memory().unwrap().with_trace(TraceContext::new());
    let t = con.create_table("batting", common::batting()).unwrap();
    assert_eq!(con.list_tables(Some("main"), None).unwrap(), vec!["batting".to_string()]);
    assert!(con.compile(&t).unwrap().sql.contains("FROM main.batting AS t0"));

    let other = file::in_memory().unwrap();
    assert!(other.list_tables(None, None).unwrap().is_empty());
}
