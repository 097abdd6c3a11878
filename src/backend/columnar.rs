//! Backend over the columnar store
//!
//! A locator names a snapshot directory; `create` makes the directory
//! when it is missing.

use super::{Backend, Driver};
use crate::columnar_engine::ColumnStore;
use crate::compiler::{ColumnarDialect, CompiledQuery, Compiler, Dialect};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::expr::Expr;
use crate::sql::Storage;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnarDriver;

impl Driver for ColumnarDriver {
    fn name(&self) -> &'static str {
        "columnar"
    }

    fn dialect(&self) -> &dyn Dialect {
        &ColumnarDialect
    }

    fn open(&self, locator: &Path, create: bool, _config: &BackendConfig) -> Result<Arc<dyn Storage>> {
        let store: Arc<dyn Storage> = ColumnStore::open_shared(locator, create)?;
        Ok(store)
    }

    fn in_memory(&self) -> Arc<dyn Storage> {
        ColumnStore::in_memory()
    }
}

pub type ColumnarBackend = Backend<ColumnarDriver>;

pub fn connect(dir: impl AsRef<Path>, create: bool) -> Result<ColumnarBackend> {
    ColumnarBackend::connect(dir, create)
}

pub fn connect_with(dir: impl AsRef<Path>, create: bool, config: BackendConfig) -> Result<ColumnarBackend> {
    ColumnarBackend::connect_with(dir, create, config)
}

pub fn in_memory() -> Result<ColumnarBackend> {
    ColumnarBackend::in_memory()
}

/// Compile `expr` for the columnar engine without a connection
pub fn compile(expr: &impl Expr) -> Result<CompiledQuery> {
    Compiler::new(&ColumnarDialect).compile(expr.node())
}
