// Query Executor - evaluate parsed statements against mounted storage
use super::ast::*;
use super::storage::{Storage, TableData};
use super::types::*;
use super::{EngineError, ResultSet, SqlEngine};
use std::cmp::Ordering;
use std::sync::Arc;

/// Columns visible to expressions of a statement
struct Scope<'s> {
    qualifier: Option<&'s str>,
    table: Option<&'s str>,
    columns: &'s [ColumnDef],
}

impl<'s> Scope<'s> {
    fn empty() -> Self {
        Scope {
            qualifier: None,
            table: None,
            columns: &[],
        }
    }

    fn resolve(&self, table: Option<&str>, column: &str) -> Result<usize, EngineError> {
        let qualified = |t: &str| format!("{}.{}", t, column);
        if let Some(table) = table {
            if Some(table) != self.qualifier && Some(table) != self.table {
                return Err(EngineError::ColumnNotFound(qualified(table)));
            }
        }
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| match table {
                Some(t) => EngineError::ColumnNotFound(qualified(t)),
                None => EngineError::ColumnNotFound(column.to_string()),
            })
    }
}

pub struct QueryExecutor<'a> {
    engine: &'a SqlEngine,
    params: &'a [SqlValue],
}

impl<'a> QueryExecutor<'a> {
    pub fn new(engine: &'a SqlEngine, params: &'a [SqlValue]) -> Self {
        QueryExecutor { engine, params }
    }

    pub fn execute(&self, statement: &Statement) -> Result<ResultSet, EngineError> {
        match statement {
            Statement::Select(select) => self.execute_select(select),
            Statement::Insert(insert) => self.execute_insert(insert),
            Statement::CreateTable(create) => self.execute_create_table(create),
            Statement::CreateTableAs(create) => self.execute_create_table_as(create),
            Statement::DropTable(drop) => self.execute_drop_table(drop),
        }
    }

    fn storage(&self, name: &ObjectName) -> Result<&Arc<dyn Storage>, EngineError> {
        self.engine.database(name.database.as_deref())
    }

    fn execute_select(&self, select: &SelectStatement) -> Result<ResultSet, EngineError> {
        let data = match &select.from {
            Some(from) => {
                let storage = self.storage(&from.name)?;
                if storage.table_columns(&from.name.name).is_none() {
                    return Err(EngineError::TableNotFound(from.name.to_string()));
                }
                storage.scan(&from.name.name)?
            }
            None => TableData::new(Vec::new(), vec![Vec::new()]),
        };
        let scope = match &select.from {
            Some(from) => Scope {
                qualifier: Some(from.qualifier()),
                table: Some(&from.name.name),
                columns: &data.columns,
            },
            None => Scope::empty(),
        };

        let mut filtered: Vec<&[SqlValue]> = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            let keep = match &select.where_clause {
                Some(predicate) => self.evaluate(predicate, &scope, row)?.is_truthy(),
                None => true,
            };
            if keep {
                filtered.push(row.as_slice());
            }
        }

        let mut columns = Vec::new();
        for item in &select.columns {
            match item {
                SelectItem::Wildcard => {
                    if select.from.is_none() {
                        return Err(EngineError::Parse("SELECT * without FROM".to_string()));
                    }
                    columns.extend(scope.columns.iter().cloned());
                }
                SelectItem::Expression { expr, alias } => {
                    let name = alias.clone().unwrap_or_else(|| expr.default_name());
                    columns.push(ColumnDef::new(name, self.infer_type(expr, &scope)?));
                }
            }
        }

        let aggregate = select.columns.iter().any(|item| match item {
            SelectItem::Expression { expr, .. } => expr.contains_aggregate(),
            SelectItem::Wildcard => false,
        });

        let mut rows = Vec::new();
        if aggregate {
            let mut row = Vec::with_capacity(select.columns.len());
            for item in &select.columns {
                match item {
                    SelectItem::Expression { expr, .. } => {
                        row.push(self.evaluate_aggregate(expr, &scope, &filtered)?)
                    }
                    SelectItem::Wildcard => {
                        return Err(EngineError::Parse(
                            "SELECT * cannot be mixed with aggregates".to_string(),
                        ))
                    }
                }
            }
            rows.push(row);
        } else {
            for source in &filtered {
                let mut row = Vec::with_capacity(columns.len());
                for item in &select.columns {
                    match item {
                        SelectItem::Wildcard => row.extend(source.iter().cloned()),
                        SelectItem::Expression { expr, .. } => {
                            row.push(self.evaluate(expr, &scope, source)?)
                        }
                    }
                }
                rows.push(row);
            }
        }

        let offset = match &select.offset {
            Some(expr) => self.row_count(expr)?.unwrap_or(0),
            None => 0,
        };
        let limit = match &select.limit {
            Some(expr) => self.row_count(expr)?,
            None => None,
        };
        let rows: Vec<_> = rows
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(ResultSet {
            columns,
            rows,
            rows_affected: 0,
        })
    }

    /// LIMIT/OFFSET operand; negative means unbounded
    fn row_count(&self, expr: &Expression) -> Result<Option<usize>, EngineError> {
        match self.evaluate(expr, &Scope::empty(), &[])? {
            SqlValue::Integer(n) if n < 0 => Ok(None),
            SqlValue::Integer(n) => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
            other => Err(EngineError::Type(format!(
                "LIMIT and OFFSET need integers, got {}",
                other
            ))),
        }
    }

    fn execute_insert(&self, insert: &InsertStatement) -> Result<ResultSet, EngineError> {
        let storage = self.storage(&insert.table)?;
        let columns = storage
            .table_columns(&insert.table.name)
            .ok_or_else(|| EngineError::TableNotFound(insert.table.to_string()))?;

        let positions = if insert.columns.is_empty() {
            (0..columns.len()).collect::<Vec<_>>()
        } else {
            insert
                .columns
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .position(|c| &c.name == name)
                        .ok_or_else(|| EngineError::ColumnNotFound(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let scope = Scope::empty();
        let mut rows = Vec::with_capacity(insert.values.len());
        for values in &insert.values {
            if values.len() != positions.len() {
                return Err(EngineError::Type(format!(
                    "table {} expects {} values, got {}",
                    insert.table,
                    positions.len(),
                    values.len()
                )));
            }
            let mut row = vec![SqlValue::Null; columns.len()];
            for (expr, &position) in values.iter().zip(&positions) {
                row[position] = self.evaluate(expr, &scope, &[])?;
            }
            rows.push(row);
        }

        let rows = TableData::coerce_rows(&columns, rows)?;
        let inserted = storage.insert(&insert.table.name, rows)?;
        Ok(ResultSet {
            rows_affected: inserted,
            ..ResultSet::default()
        })
    }

    fn execute_create_table(&self, create: &CreateTableStatement) -> Result<ResultSet, EngineError> {
        check_unique_columns(&create.columns)?;
        let storage = self.storage(&create.name)?;
        storage.create_table(&create.name.name, create.columns.clone(), Vec::new())?;
        Ok(ResultSet::default())
    }

    fn execute_create_table_as(
        &self,
        create: &CreateTableAsStatement,
    ) -> Result<ResultSet, EngineError> {
        let storage = self.storage(&create.name)?;
        if storage.table_columns(&create.name.name).is_some() {
            return Err(EngineError::TableExists(create.name.to_string()));
        }
        let result = self.execute_select(&create.query)?;
        check_unique_columns(&result.columns)?;
        let rows = TableData::coerce_rows(&result.columns, result.rows)?;
        let count = rows.len();
        storage.create_table(&create.name.name, result.columns, rows)?;
        Ok(ResultSet {
            rows_affected: count,
            ..ResultSet::default()
        })
    }

    fn execute_drop_table(&self, drop: &DropTableStatement) -> Result<ResultSet, EngineError> {
        let storage = self.storage(&drop.name)?;
        if storage.table_columns(&drop.name.name).is_none() {
            if drop.if_exists {
                return Ok(ResultSet::default());
            }
            return Err(EngineError::TableNotFound(drop.name.to_string()));
        }
        storage.drop_table(&drop.name.name)?;
        Ok(ResultSet::default())
    }

    fn evaluate(
        &self,
        expr: &Expression,
        scope: &Scope<'_>,
        row: &[SqlValue],
    ) -> Result<SqlValue, EngineError> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Placeholder(index) => self.parameter(*index),
            Expression::Identifier(name) => Ok(row[scope.resolve(None, name)?].clone()),
            Expression::QualifiedIdentifier { table, column } => {
                Ok(row[scope.resolve(Some(table), column)?].clone())
            }
            Expression::BinaryOp { left, op, right } => {
                let left = self.evaluate(left, scope, row)?;
                let right = self.evaluate(right, scope, row)?;
                apply_binary(*op, left, right)
            }
            Expression::UnaryOp { op, expr } => apply_unary(*op, self.evaluate(expr, scope, row)?),
            Expression::IsNull { expr, negated } => {
                let value = self.evaluate(expr, scope, row)?;
                Ok(SqlValue::Boolean(value.is_null() != *negated))
            }
            Expression::FunctionCall { name, args } => {
                if is_aggregate(name) {
                    return Err(EngineError::Parse(format!(
                        "misuse of aggregate function {}",
                        name
                    )));
                }
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, scope, row))
                    .collect::<Result<Vec<_>, _>>()?;
                apply_function(name, values)
            }
            Expression::Wildcard => Err(EngineError::Parse("unexpected *".to_string())),
        }
    }

    /// Evaluate a select item over all rows of an aggregate query
    fn evaluate_aggregate(
        &self,
        expr: &Expression,
        scope: &Scope<'_>,
        rows: &[&[SqlValue]],
    ) -> Result<SqlValue, EngineError> {
        match expr {
            Expression::FunctionCall { name, args } if is_aggregate(name) => {
                self.aggregate(name, args, scope, rows)
            }
            Expression::FunctionCall { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.evaluate_aggregate(arg, scope, rows))
                    .collect::<Result<Vec<_>, _>>()?;
                apply_function(name, values)
            }
            Expression::BinaryOp { left, op, right } => {
                let left = self.evaluate_aggregate(left, scope, rows)?;
                let right = self.evaluate_aggregate(right, scope, rows)?;
                apply_binary(*op, left, right)
            }
            Expression::UnaryOp { op, expr } => {
                apply_unary(*op, self.evaluate_aggregate(expr, scope, rows)?)
            }
            Expression::IsNull { expr, negated } => {
                let value = self.evaluate_aggregate(expr, scope, rows)?;
                Ok(SqlValue::Boolean(value.is_null() != *negated))
            }
            Expression::Identifier(name) | Expression::QualifiedIdentifier { column: name, .. } => {
                Err(EngineError::Parse(format!(
                    "column {} must appear inside an aggregate function",
                    name
                )))
            }
            Expression::Literal(_) | Expression::Placeholder(_) | Expression::Wildcard => {
                self.evaluate(expr, scope, &[])
            }
        }
    }

    fn aggregate(
        &self,
        name: &str,
        args: &[Expression],
        scope: &Scope<'_>,
        rows: &[&[SqlValue]],
    ) -> Result<SqlValue, EngineError> {
        let function = name.to_lowercase();
        if function == "count" && matches!(args, [Expression::Wildcard]) {
            return Ok(SqlValue::Integer(rows.len() as i64));
        }
        let [arg] = args else {
            return Err(EngineError::Parse(format!(
                "{} takes exactly one argument",
                function
            )));
        };

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let value = self.evaluate(arg, scope, row)?;
            if !value.is_null() {
                values.push(value);
            }
        }

        match function.as_str() {
            "count" => Ok(SqlValue::Integer(values.len() as i64)),
            "sum" => sum(&values),
            "avg" => {
                if values.is_empty() {
                    return Ok(SqlValue::Null);
                }
                let total = numeric_values(&values, "avg")?.iter().sum::<f64>();
                Ok(SqlValue::Real(total / values.len() as f64))
            }
            "min" | "max" => {
                let wanted = if function == "min" {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut best: Option<SqlValue> = None;
                for value in values {
                    best = match best {
                        Some(current) if value.compare(&current)? != Some(wanted) => Some(current),
                        _ => Some(value),
                    };
                }
                Ok(best.unwrap_or(SqlValue::Null))
            }
            other => Err(EngineError::Parse(format!("unknown aggregate {}", other))),
        }
    }

    fn parameter(&self, index: usize) -> Result<SqlValue, EngineError> {
        self.params.get(index).cloned().ok_or_else(|| {
            EngineError::Parse(format!(
                "statement uses parameter {} but only {} were bound",
                index + 1,
                self.params.len()
            ))
        })
    }

    /// Declared type of a result column
    fn infer_type(&self, expr: &Expression, scope: &Scope<'_>) -> Result<String, EngineError> {
        let class = |declared: String| StorageClass::from_declared(&declared);
        let declared = match expr {
            Expression::Identifier(name) => scope.columns[scope.resolve(None, name)?]
                .declared_type
                .clone(),
            Expression::QualifiedIdentifier { table, column } => scope.columns
                [scope.resolve(Some(table), column)?]
            .declared_type
            .clone(),
            Expression::Literal(value) => value_type(value),
            Expression::Placeholder(index) => value_type(&self.parameter(*index)?),
            Expression::BinaryOp { op, .. } if op.is_comparison() || op.is_logical() => {
                "BOOLEAN".to_string()
            }
            Expression::BinaryOp { op: BinaryOperator::Divide, .. } => "DOUBLE".to_string(),
            Expression::BinaryOp { left, right, .. } => {
                let left = class(self.infer_type(left, scope)?);
                let right = class(self.infer_type(right, scope)?);
                if left == StorageClass::Integer && right == StorageClass::Integer {
                    "BIGINT".to_string()
                } else {
                    "DOUBLE".to_string()
                }
            }
            Expression::UnaryOp { op: UnaryOperator::Not, .. } | Expression::IsNull { .. } => {
                "BOOLEAN".to_string()
            }
            Expression::UnaryOp { expr, .. } => self.infer_type(expr, scope)?,
            Expression::FunctionCall { name, args } => match name.to_lowercase().as_str() {
                "count" => "BIGINT".to_string(),
                "sum" => match args.first() {
                    Some(arg) if class(self.infer_type(arg, scope)?) == StorageClass::Integer => {
                        "BIGINT".to_string()
                    }
                    _ => "DOUBLE".to_string(),
                },
                "min" | "max" => match args.first() {
                    Some(arg) => self.infer_type(arg, scope)?,
                    None => "TEXT".to_string(),
                },
                _ => "DOUBLE".to_string(),
            },
            Expression::Wildcard => "BIGINT".to_string(),
        };
        Ok(declared)
    }
}

fn value_type(value: &SqlValue) -> String {
    value
        .storage_class()
        .unwrap_or(StorageClass::Text)
        .default_declared()
        .to_string()
}

fn check_unique_columns(columns: &[ColumnDef]) -> Result<(), EngineError> {
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.name == column.name) {
            return Err(EngineError::Parse(format!(
                "duplicate column name: {}",
                column.name
            )));
        }
    }
    Ok(())
}

fn truth(value: &SqlValue) -> Result<Option<bool>, EngineError> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Boolean(v) => Ok(Some(*v)),
        SqlValue::Integer(v) => Ok(Some(*v != 0)),
        other => Err(EngineError::Type(format!("{} is not a boolean", other))),
    }
}

fn apply_binary(
    op: BinaryOperator,
    left: SqlValue,
    right: SqlValue,
) -> Result<SqlValue, EngineError> {
    if op.is_logical() {
        let (l, r) = (truth(&left)?, truth(&right)?);
        let result = match op {
            BinaryOperator::And => match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            _ => match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };
        return Ok(result.map(SqlValue::Boolean).unwrap_or(SqlValue::Null));
    }

    if op.is_comparison() {
        let ordering = match left.compare(&right)? {
            Some(ordering) => ordering,
            None => return Ok(SqlValue::Null),
        };
        let result = match op {
            BinaryOperator::Equal => ordering == Ordering::Equal,
            BinaryOperator::NotEqual => ordering != Ordering::Equal,
            BinaryOperator::Less => ordering == Ordering::Less,
            BinaryOperator::Greater => ordering == Ordering::Greater,
            BinaryOperator::LessEqual => ordering != Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(SqlValue::Boolean(result));
    }

    if left.is_null() || right.is_null() {
        return Ok(SqlValue::Null);
    }

    if let (SqlValue::Integer(a), SqlValue::Integer(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        let exact = match op {
            BinaryOperator::Add => a.checked_add(b),
            BinaryOperator::Subtract => a.checked_sub(b),
            BinaryOperator::Multiply => a.checked_mul(b),
            BinaryOperator::Modulo if b == 0 => return Ok(SqlValue::Null),
            BinaryOperator::Modulo => a.checked_rem(b),
            _ => None,
        };
        if let Some(v) = exact {
            return Ok(SqlValue::Integer(v));
        }
    }

    let (Some(x), Some(y)) = (left.as_f64(), right.as_f64()) else {
        return Err(EngineError::Type(format!(
            "cannot apply {:?} to {} and {}",
            op, left, right
        )));
    };
    let result = match op {
        BinaryOperator::Add => x + y,
        BinaryOperator::Subtract => x - y,
        BinaryOperator::Multiply => x * y,
        BinaryOperator::Divide if y == 0.0 => return Ok(SqlValue::Null),
        BinaryOperator::Divide => x / y,
        BinaryOperator::Modulo if y == 0.0 => return Ok(SqlValue::Null),
        _ => x % y,
    };
    Ok(SqlValue::Real(result))
}

fn apply_unary(op: UnaryOperator, value: SqlValue) -> Result<SqlValue, EngineError> {
    match (op, value) {
        (_, SqlValue::Null) => Ok(SqlValue::Null),
        (UnaryOperator::Not, value) => Ok(truth(&value)?
            .map(|v| SqlValue::Boolean(!v))
            .unwrap_or(SqlValue::Null)),
        (UnaryOperator::Minus, SqlValue::Integer(v)) => Ok(v
            .checked_neg()
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Real(-(v as f64)))),
        (UnaryOperator::Minus, SqlValue::Real(v)) => Ok(SqlValue::Real(-v)),
        (UnaryOperator::Minus, other) => {
            Err(EngineError::Type(format!("cannot negate {}", other)))
        }
    }
}

fn apply_function(name: &str, args: Vec<SqlValue>) -> Result<SqlValue, EngineError> {
    match (name.to_lowercase().as_str(), args.as_slice()) {
        ("power" | "pow", [base, exponent]) => {
            if base.is_null() || exponent.is_null() {
                return Ok(SqlValue::Null);
            }
            match (base.as_f64(), exponent.as_f64()) {
                (Some(b), Some(e)) => Ok(SqlValue::Real(b.powf(e))),
                _ => Err(EngineError::Type(format!(
                    "power needs numeric arguments, got {} and {}",
                    base, exponent
                ))),
            }
        }
        ("abs", [value]) => match value {
            SqlValue::Null => Ok(SqlValue::Null),
            SqlValue::Integer(v) => Ok(SqlValue::Integer(v.saturating_abs())),
            SqlValue::Real(v) => Ok(SqlValue::Real(v.abs())),
            other => Err(EngineError::Type(format!("abs needs a number, got {}", other))),
        },
        (other, args) => Err(EngineError::Parse(format!(
            "no such function: {} with {} arguments",
            other,
            args.len()
        ))),
    }
}

fn numeric_values(values: &[SqlValue], function: &str) -> Result<Vec<f64>, EngineError> {
    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                EngineError::Type(format!("{} needs numeric values, got {}", function, v))
            })
        })
        .collect()
}

fn sum(values: &[SqlValue]) -> Result<SqlValue, EngineError> {
    if values.is_empty() {
        return Ok(SqlValue::Null);
    }
    if values.iter().all(|v| matches!(v, SqlValue::Integer(_))) {
        let mut total: i64 = 0;
        let mut exact = true;
        for value in values {
            if let SqlValue::Integer(v) = value {
                match total.checked_add(*v) {
                    Some(t) => total = t,
                    None => {
                        exact = false;
                        break;
                    }
                }
            }
        }
        if exact {
            return Ok(SqlValue::Integer(total));
        }
    }
    Ok(SqlValue::Real(numeric_values(values, "sum")?.iter().sum()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_engine::FileStore;

    fn engine() -> SqlEngine {
        let store = FileStore::in_memory();
        let engine = SqlEngine::new("main", store);
        engine
            .execute("CREATE TABLE t (a BIGINT, b DOUBLE, s TEXT, f BOOLEAN)", &[])
            .unwrap();
        engine
            .execute(
                "INSERT INTO t VALUES (1, 1.5, 'x', TRUE), (2, 2.5, 'y', FALSE), (3, NULL, 'z', TRUE)",
                &[],
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_select_filter_limit() {
        let engine = engine();
        let result = engine
            .execute(
                "SELECT t0.a, t0.s FROM t AS t0 WHERE t0.a > ? LIMIT ? OFFSET ?",
                &[SqlValue::Integer(1), SqlValue::Integer(1), SqlValue::Integer(1)],
            )
            .unwrap();
        assert_eq!(result.rows, vec![vec![SqlValue::Integer(3), SqlValue::Text("z".into())]]);
        assert_eq!(result.columns[0], ColumnDef::new("a", "BIGINT"));
    }

    #[test]
    fn test_aggregates() {
        let engine = engine();
        let result = engine
            .execute("SELECT sum(t0.a) AS sum, avg(t0.b) AS mean, count(t0.b) AS count, max(t0.s) AS max FROM t AS t0", &[])
            .unwrap();
        assert_eq!(
            result.rows[0],
            vec![
                SqlValue::Integer(6),
                SqlValue::Real(2.0),
                SqlValue::Integer(2),
                SqlValue::Text("z".into())
            ]
        );
        assert_eq!(result.columns[1].declared_type, "DOUBLE");
    }

    #[test]
    fn test_true_division_and_power() {
        let engine = engine();
        let result = engine
            .execute("SELECT $1 / $2 AS tmp, power($3, $4) AS p", &[
                SqlValue::Integer(7),
                SqlValue::Integer(2),
                SqlValue::Integer(2),
                SqlValue::Integer(10),
            ])
            .unwrap();
        assert_eq!(result.rows[0], vec![SqlValue::Real(3.5), SqlValue::Real(1024.0)]);
    }

    #[test]
    fn test_create_table_as_keeps_declared_types() {
        let engine = engine();
        engine
            .execute("CREATE TABLE u AS\nSELECT * FROM t AS t0 WHERE t0.f = ? LIMIT ? OFFSET ?", &[
                SqlValue::Boolean(true),
                SqlValue::Integer(10),
                SqlValue::Integer(0),
            ])
            .unwrap();
        let result = engine.execute("SELECT * FROM u", &[]).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.columns[3], ColumnDef::new("f", "BOOLEAN"));
    }

    #[test]
    fn test_errors() {
        let engine = engine();
        assert!(matches!(
            engine.execute("SELECT * FROM missing", &[]),
            Err(EngineError::TableNotFound(_))
        ));
        assert!(matches!(
            engine.execute("SELECT * FROM other.t", &[]),
            Err(EngineError::DatabaseNotFound(_))
        ));
        assert!(matches!(
            engine.execute("SELECT nope FROM t", &[]),
            Err(EngineError::ColumnNotFound(_))
        ));
        assert!(matches!(
            engine.execute("CREATE TABLE t (a BIGINT)", &[]),
            Err(EngineError::TableExists(_))
        ));
        assert!(matches!(
            engine.execute("DROP TABLE missing", &[]),
            Err(EngineError::TableNotFound(_))
        ));
        assert!(engine.execute("DROP TABLE IF EXISTS missing", &[]).is_ok());
        assert!(engine.execute("SELECT ? AS tmp", &[]).is_err());
    }

    #[test]
    fn test_null_semantics() {
        let engine = engine();
        let result = engine
            .execute("SELECT t0.a FROM t AS t0 WHERE t0.b > 0", &[])
            .unwrap();
        assert_eq!(result.rows.len(), 2);
        let result = engine
            .execute("SELECT count(*) AS n FROM t AS t0 WHERE t0.b IS NULL", &[])
            .unwrap();
        assert_eq!(result.rows[0][0], SqlValue::Integer(1));
    }
}
