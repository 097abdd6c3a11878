//! Storage contract of the SQL engine
use super::types::{ColumnDef, SqlValue};
use super::EngineError;
use serde::{Deserialize, Serialize};

/// Row-major contents of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TableData {
    pub fn new(columns: Vec<ColumnDef>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Coerce `rows` to the column types, rejecting arity mismatches
    pub fn coerce_rows(
        columns: &[ColumnDef],
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<Vec<SqlValue>>, EngineError> {
        rows.into_iter()
            .map(|row| {
                if row.len() != columns.len() {
                    return Err(EngineError::Type(format!(
                        "expected {} values per row, got {}",
                        columns.len(),
                        row.len()
                    )));
                }
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| column.coerce(value))
                    .collect()
            })
            .collect()
    }
}

/// A mounted database: a named set of tables behind one physical resource.
///
/// Implementations are shared between connections and must apply each
/// mutation atomically: a failed call leaves no partial effect.
pub trait Storage: Send + Sync {
    /// Identity of the physical resource
    fn source_id(&self) -> &str;

    /// Table names in sorted order
    fn table_names(&self) -> Vec<String>;

    fn table_columns(&self, name: &str) -> Option<Vec<ColumnDef>>;

    fn scan(&self, name: &str) -> Result<TableData, EngineError>;

    /// Create a table holding `rows`; fails if the name exists
    fn create_table(
        &self,
        name: &str,
        columns: Vec<ColumnDef>,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<(), EngineError>;

    /// Append rows already coerced to the table's columns
    fn insert(&self, name: &str, rows: Vec<Vec<SqlValue>>) -> Result<usize, EngineError>;

    fn drop_table(&self, name: &str) -> Result<(), EngineError>;
}
