//! tablexpr: table expressions compiled to SQL
//!
//! Build table and column expressions, compile them for a dialect, and
//! run them on an embedded engine through a [`backend::Backend`]. Results
//! come back as schema-typed [`Relation`]s.

pub mod backend;
pub mod columnar_engine;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expr;
pub mod file_engine;
pub mod relation;
pub mod schema;
pub mod sql;
pub mod trace;
pub mod types;

pub use backend::{Backend, Driver, TableSource};
pub use compiler::{compile, ColumnarDialect, CompiledQuery, Compiler, Dialect, SqliteDialect};
pub use config::{BackendConfig, LoggingConfig};
pub use error::{Error, Result};
pub use expr::{literal, typed_literal, Expr, Node, SourceId, TableExpr, ValueExpr};
pub use relation::Relation;
pub use schema::{Field, Schema};
pub use trace::{TraceContext, TraceScope};
pub use types::{DataType, TypeKind, Value};
