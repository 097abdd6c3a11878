use thiserror::Error;

use crate::sql::EngineError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Type kind mismatch in {context}: {left} is not compatible with {right}")]
    TypeKindMismatch {
        context: String,
        left: String,
        right: String,
    },

    #[error("Unsupported expression {kind}: {reason}")]
    UnsupportedExpression { kind: &'static str, reason: String },

    #[error("Engine execution error: {0}")]
    EngineExecution(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid table pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    pub(crate) fn unsupported(kind: &'static str, reason: impl Into<String>) -> Self {
        Error::UnsupportedExpression {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(
        context: impl Into<String>,
        left: impl ToString,
        right: impl ToString,
    ) -> Self {
        Error::TypeKindMismatch {
            context: context.into(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TableNotFound(name) => Error::TableNotFound(name),
            EngineError::DatabaseNotFound(name) => Error::DatabaseNotFound(name),
            other => Error::EngineExecution(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
