//! Structural equality and compilation properties

use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tablexpr::backend::{columnar, file};
use tablexpr::{compile, SqliteDialect, TableExpr, ValueExpr};

fn alltypes() -> TableExpr {
    TableExpr::unbound(
        "functional_alltypes",
        &[
            ("id", "int32"),
            ("int_col", "int32"),
            ("double_col", "float64"),
            ("string_col", "string"),
        ],
    )
    .unwrap()
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// One predicate per (column selector, operator selector, threshold)
fn predicate(t: &TableExpr, column: u8, op: u8, threshold: i64) -> ValueExpr {
    let name = match column % 3 {
        0 => "id",
        1 => "int_col",
        _ => "double_col",
    };
    let col = t.column(name).unwrap();
    match op % 6 {
        0 => col.eq(threshold),
        1 => col.ne(threshold),
        2 => col.lt(threshold),
        3 => col.gt(threshold),
        4 => col.le(threshold),
        _ => col.ge(threshold),
    }
    .unwrap()
}

fn predicates() -> impl Strategy<Value = Vec<(u8, u8, i64)>> {
    prop::collection::vec((any::<u8>(), any::<u8>(), -100i64..100), 1..6)
}

proptest! {
    #[test]
    fn chained_filters_equal_list_filter(specs in predicates()) {
        let t = alltypes();
        let preds: Vec<ValueExpr> = specs.iter().map(|&(c, o, v)| predicate(&t, c, o, v)).collect();

        let listed = t.filter(preds.clone()).unwrap();
        let mut chained = t.clone();
        for pred in &preds {
            chained = chained.filter([pred.clone()]).unwrap();
        }

        prop_assert_eq!(&listed, &chained);
        prop_assert_eq!(hash_of(listed.node()), hash_of(chained.node()));
        prop_assert_eq!(
            compile(listed.node(), &SqliteDialect).unwrap(),
            compile(chained.node(), &SqliteDialect).unwrap()
        );
        prop_assert_eq!(file::compile(&listed).unwrap(), file::compile(&chained).unwrap());
    }

    #[test]
    fn predicates_on_intermediate_filters_compile_alike(specs in predicates()) {
        let t = alltypes();
        let preds: Vec<ValueExpr> = specs.iter().map(|&(c, o, v)| predicate(&t, c, o, v)).collect();
        let listed = t.filter(preds).unwrap();

        // Each predicate refers to the table filtered so far
        let mut chained = t.clone();
        for &(c, o, v) in &specs {
            let pred = predicate(&chained, c, o, v);
            chained = chained.filter([pred]).unwrap();
        }

        prop_assert_eq!(
            columnar::compile(&chained).unwrap(),
            columnar::compile(&listed).unwrap()
        );
    }

    #[test]
    fn equal_trees_hash_alike(specs in predicates()) {
        let build = || {
            let t = alltypes();
            let preds: Vec<ValueExpr> = specs.iter().map(|&(c, o, v)| predicate(&t, c, o, v)).collect();
            t.filter(preds).unwrap().limit(10)
        };
        let a = build();
        let b = build();
        prop_assert!(a.equals(&b));
        prop_assert_eq!(hash_of(a.node()), hash_of(b.node()));
    }

    #[test]
    fn different_thresholds_differ(threshold in -100i64..100, delta in 1i64..50) {
        let t = alltypes();
        let a = t.filter([predicate(&t, 0, 3, threshold)]).unwrap();
        let b = t.filter([predicate(&t, 0, 3, threshold + delta)]).unwrap();
        prop_assert_ne!(&a, &b);
    }

    #[test]
    fn compilation_is_deterministic(specs in predicates(), n in 0u64..1000, offset in 0u64..1000) {
        let t = alltypes();
        let preds: Vec<ValueExpr> = specs.iter().map(|&(c, o, v)| predicate(&t, c, o, v)).collect();
        let expr = t.filter(preds).unwrap().limit_offset(n, offset);

        let first = columnar::compile(&expr).unwrap();
        let second = columnar::compile(&expr).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.sql.contains("FROM functional_alltypes AS t0"));
        prop_assert_eq!(first.params.len(), specs.len() + 2);
    }
}

#[test]
fn test_sum_of_unbound_table() {
    let t = TableExpr::unbound("t0", &[("foo", "double")]).unwrap();
    let query = file::compile(&t.column("foo").unwrap().sum().unwrap()).unwrap();
    assert_eq!(query.sql, "SELECT sum(t0.foo) AS sum \nFROM t0 AS t0");
}

#[test]
fn test_empty_filter_is_identity() {
    let t = alltypes();
    let filtered = t.filter(Vec::<ValueExpr>::new()).unwrap();
    assert_eq!(filtered, t);
    assert_eq!(hash_of(filtered.node()), hash_of(t.node()));
}

#[test]
fn test_different_tables_differ() {
    let a = alltypes();
    let b = TableExpr::unbound(
        "other",
        &[
            ("id", "int32"),
            ("int_col", "int32"),
            ("double_col", "float64"),
            ("string_col", "string"),
        ],
    )
    .unwrap();
    assert_ne!(a, b);
}
