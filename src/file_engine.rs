//! Single-file row store
//!
//! Every table of a resource lives in one file holding a bincode image of
//! the declared columns and rows. The image is rewritten through a
//! temporary file and a rename after each mutation, so a reader of the
//! file never observes a partially written image.

use crate::error::{Error, Result};
use crate::sql::{ColumnDef, EngineError, SqlValue, Storage, TableData};
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

lazy_static! {
    /// Open stores by canonical path, shared across connections and aliases
    static ref OPEN_STORES: Mutex<HashMap<PathBuf, Weak<FileStore>>> = Mutex::new(HashMap::new());
}

/// Row store backed by one file, or by nothing when in memory
pub struct FileStore {
    id: String,
    path: Option<PathBuf>,
    tables: RwLock<BTreeMap<String, TableData>>,
    sync_on_write: bool,
}

impl FileStore {
    /// Open the store at `path`, reusing an instance already open in this
    /// process. A missing file is created only when `create` is set.
    pub fn open_shared(path: &Path, create: bool, sync_on_write: bool) -> Result<Arc<FileStore>> {
        if !path.exists() {
            if !create {
                return Err(Error::ResourceNotFound(path.display().to_string()));
            }
            write_image(path, &BTreeMap::new(), sync_on_write)?;
            info!(path = %path.display(), "created database file");
        }
        if path.is_dir() {
            return Err(Error::EngineExecution(format!(
                "{} is a directory, not a database file",
                path.display()
            )));
        }
        let canonical = fs::canonicalize(path)?;

        let mut stores = OPEN_STORES.lock();
        if let Some(store) = stores.get(&canonical).and_then(Weak::upgrade) {
            debug!(path = %canonical.display(), "reusing open database file");
            return Ok(store);
        }

        let tables = read_image(&canonical)?;
        debug!(path = %canonical.display(), tables = tables.len(), "loaded database file");
        let store = Arc::new(FileStore {
            id: format!("file:{}", canonical.display()),
            path: Some(canonical.clone()),
            tables: RwLock::new(tables),
            sync_on_write,
        });
        stores.retain(|_, weak| weak.strong_count() > 0);
        stores.insert(canonical, Arc::downgrade(&store));
        Ok(store)
    }

    /// Private store that disappears with its last handle
    pub fn in_memory() -> Arc<FileStore> {
        Arc::new(FileStore {
            id: format!("memory:{}", uuid::Uuid::new_v4()),
            path: None,
            tables: RwLock::new(BTreeMap::new()),
            sync_on_write: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, tables: &BTreeMap<String, TableData>) -> std::result::Result<(), EngineError> {
        match &self.path {
            Some(path) => write_image(path, tables, self.sync_on_write)
                .map_err(|e| EngineError::Storage(e.to_string())),
            None => Ok(()),
        }
    }
}

fn read_image(path: &Path) -> Result<BTreeMap<String, TableData>> {
    let reader = BufReader::new(File::open(path)?);
    bincode::deserialize_from(reader).map_err(|e| {
        Error::SerializationError(format!("corrupt database file {}: {}", path.display(), e))
    })
}

fn write_image(path: &Path, tables: &BTreeMap<String, TableData>, sync: bool) -> Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    let file = File::create(&temp)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, tables)
        .map_err(|e| Error::SerializationError(e.to_string()))?;
    writer.flush()?;
    if sync {
        writer.get_ref().sync_all()?;
    }
    drop(writer);

    fs::rename(&temp, path)?;
    Ok(())
}

impl Storage for FileStore {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    fn table_columns(&self, name: &str) -> Option<Vec<ColumnDef>> {
        self.tables.read().get(name).map(|t| t.columns.clone())
    }

    fn scan(&self, name: &str) -> std::result::Result<TableData, EngineError> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))
    }

    fn create_table(
        &self,
        name: &str,
        columns: Vec<ColumnDef>,
        rows: Vec<Vec<SqlValue>>,
    ) -> std::result::Result<(), EngineError> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(EngineError::TableExists(name.to_string()));
        }
        tables.insert(name.to_string(), TableData::new(columns, rows));
        if let Err(e) = self.persist(&tables) {
            tables.remove(name);
            return Err(e);
        }
        Ok(())
    }

    fn insert(&self, name: &str, rows: Vec<Vec<SqlValue>>) -> std::result::Result<usize, EngineError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
        let before = table.rows.len();
        let count = rows.len();
        table.rows.extend(rows);
        if let Err(e) = self.persist(&tables) {
            if let Some(table) = tables.get_mut(name) {
                table.rows.truncate(before);
            }
            return Err(e);
        }
        Ok(count)
    }

    fn drop_table(&self, name: &str) -> std::result::Result<(), EngineError> {
        let mut tables = self.tables.write();
        let removed = tables
            .remove(name)
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
        if let Err(e) = self.persist(&tables) {
            tables.insert(name.to_string(), removed);
            return Err(e);
        }
        Ok(())
    }
}
