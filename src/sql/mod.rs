// SQL Engine Module
// Parser and executor for the statements the compiler emits, running over
// mounted `Storage` implementations

pub mod ast;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod storage;
pub mod types;

pub use executor::QueryExecutor;
pub use parser::Parser;
pub use storage::{Storage, TableData};
pub use types::{ColumnDef, SqlValue, StorageClass};

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("no such table: {0}")]
    TableNotFound(String),

    #[error("unknown database {0}")]
    DatabaseNotFound(String),

    #[error("database {0} is already in use")]
    DatabaseExists(String),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("no such column: {0}")]
    ColumnNotFound(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<SqlValue>>,
    pub rows_affected: usize,
}

/// A set of mounted databases, one of which is the default for
/// unqualified names
pub struct SqlEngine {
    mounts: Vec<(String, Arc<dyn Storage>)>,
    default_database: String,
}

impl SqlEngine {
    pub fn new(default_database: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let default_database = default_database.into();
        Self {
            mounts: vec![(default_database.clone(), storage)],
            default_database,
        }
    }

    pub fn mount(&mut self, alias: &str, storage: Arc<dyn Storage>) -> Result<(), EngineError> {
        if self.mounts.iter().any(|(name, _)| name == alias) {
            return Err(EngineError::DatabaseExists(alias.to_string()));
        }
        self.mounts.push((alias.to_string(), storage));
        Ok(())
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Mounted databases in mount order
    pub fn databases(&self) -> impl Iterator<Item = (&str, &Arc<dyn Storage>)> {
        self.mounts.iter().map(|(name, storage)| (name.as_str(), storage))
    }

    /// Storage mounted under `alias`, or the default database
    pub fn database(&self, alias: Option<&str>) -> Result<&Arc<dyn Storage>, EngineError> {
        let alias = alias.unwrap_or(&self.default_database);
        self.mounts
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, storage)| storage)
            .ok_or_else(|| EngineError::DatabaseNotFound(alias.to_string()))
    }

    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, EngineError> {
        let statement = Parser::new(sql)?.parse()?;
        let result = QueryExecutor::new(self, params).execute(&statement)?;
        debug!(
            target: "tablexpr::sql",
            rows = result.rows.len(),
            rows_affected = result.rows_affected,
            "executed statement"
        );
        Ok(result)
    }
}
