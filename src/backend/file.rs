//! Backend over the single-file row store

use super::{Backend, Driver};
use crate::compiler::{CompiledQuery, Compiler, Dialect, SqliteDialect};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::expr::Expr;
use crate::file_engine::FileStore;
use crate::sql::Storage;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileDriver;

impl Driver for FileDriver {
    fn name(&self) -> &'static str {
        "file"
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn open(&self, locator: &Path, create: bool, config: &BackendConfig) -> Result<Arc<dyn Storage>> {
        let store: Arc<dyn Storage> = FileStore::open_shared(locator, create, config.sync_on_write)?;
        Ok(store)
    }

    fn in_memory(&self) -> Arc<dyn Storage> {
        FileStore::in_memory()
    }
}

pub type FileBackend = Backend<FileDriver>;

/// Connect to the database file at `path`
pub fn connect(path: impl AsRef<Path>, create: bool) -> Result<FileBackend> {
    FileBackend::connect(path, create)
}

pub fn connect_with(path: impl AsRef<Path>, create: bool, config: BackendConfig) -> Result<FileBackend> {
    FileBackend::connect_with(path, create, config)
}

pub fn in_memory() -> Result<FileBackend> {
    FileBackend::in_memory()
}

/// Compile `expr` for the file engine without a connection
pub fn compile(expr: &impl Expr) -> Result<CompiledQuery> {
    Compiler::new(&SqliteDialect).compile(expr.node())
}
