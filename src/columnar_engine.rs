//! Column-oriented storage engine
//!
//! Stores data by column in typed byte buffers with a null bitmap.
//! Integer columns without nulls are run-length encoded in snapshots.
//! A store is either purely in memory or backed by a directory holding
//! one `<table>.col` JSON snapshot per table.

use crate::error::{Error, Result};
use crate::sql::{ColumnDef, EngineError, SqlValue, StorageClass, Storage, TableData};
use ahash::AHashMap;
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

type EngineResult<T> = std::result::Result<T, EngineError>;

const SNAPSHOT_EXTENSION: &str = "col";

lazy_static! {
    static ref OPEN_STORES: Mutex<HashMap<PathBuf, Weak<ColumnStore>>> = Mutex::new(HashMap::new());
}

/// Column data with compression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnData {
    pub name: String,
    pub declared_type: String,
    pub data_type: ColumnType,
    /// Raw values stored as bytes
    pub values: Vec<u8>,
    /// Compression codec used
    pub compression: CompressionType,
    /// Number of rows
    pub row_count: usize,
    /// Null bitmap (one bit per row)
    pub null_bitmap: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Boolean,
}

impl From<StorageClass> for ColumnType {
    fn from(class: StorageClass) -> Self {
        match class {
            StorageClass::Integer => ColumnType::Int64,
            StorageClass::Real => ColumnType::Float64,
            StorageClass::Text => ColumnType::String,
            StorageClass::Boolean => ColumnType::Boolean,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CompressionType {
    None,
    /// Run-length encoding (good for repeated values)
    RLE,
}

fn corrupt(column: &str) -> EngineError {
    EngineError::Storage(format!("corrupt column data in {}", column))
}

impl ColumnData {
    pub fn new(def: &ColumnDef) -> Self {
        Self {
            name: def.name.clone(),
            declared_type: def.declared_type.clone(),
            data_type: def.storage_class().into(),
            values: Vec::new(),
            compression: CompressionType::None,
            row_count: 0,
            null_bitmap: Vec::new(),
        }
    }

    pub fn def(&self) -> ColumnDef {
        ColumnDef::new(self.name.clone(), self.declared_type.clone())
    }

    /// Append a value already coerced to the column's storage class
    pub fn append(&mut self, value: &SqlValue) -> EngineResult<()> {
        if self.compression != CompressionType::None {
            self.decompress()?;
        }
        let row_idx = self.row_count;
        match (self.data_type, value) {
            (_, SqlValue::Null) => {
                self.row_count += 1;
                self.ensure_null_bitmap_size();
                self.set_null_bit(row_idx);
                match self.data_type {
                    ColumnType::Int64 | ColumnType::Float64 => {
                        self.values.extend_from_slice(&[0u8; 8])
                    }
                    ColumnType::String => self.values.extend_from_slice(&0u32.to_le_bytes()),
                    ColumnType::Boolean => self.values.push(0),
                }
                return Ok(());
            }
            (ColumnType::Int64, SqlValue::Integer(v)) => {
                self.values.extend_from_slice(&v.to_le_bytes())
            }
            (ColumnType::Float64, SqlValue::Real(v)) => {
                self.values.extend_from_slice(&v.to_le_bytes())
            }
            (ColumnType::String, SqlValue::Text(s)) => {
                // Length-prefixed string
                let len = u32::try_from(s.len())
                    .map_err(|_| EngineError::Storage("string value too long".to_string()))?;
                self.values.extend_from_slice(&len.to_le_bytes());
                self.values.extend_from_slice(s.as_bytes());
            }
            (ColumnType::Boolean, SqlValue::Boolean(v)) => self.values.push(*v as u8),
            (expected, other) => {
                return Err(EngineError::Type(format!(
                    "column {} holds {:?}, got {}",
                    self.name, expected, other
                )))
            }
        }
        self.row_count += 1;
        self.ensure_null_bitmap_size();
        Ok(())
    }

    /// Decode every value in row order
    pub fn decode_all(&self) -> EngineResult<Vec<SqlValue>> {
        if self.compression == CompressionType::RLE {
            let mut plain = self.clone();
            plain.decompress()?;
            return plain.decode_all();
        }

        let mut out = Vec::with_capacity(self.row_count);
        let mut offset = 0;
        for index in 0..self.row_count {
            let width = match self.data_type {
                ColumnType::Int64 | ColumnType::Float64 => 8,
                ColumnType::Boolean => 1,
                ColumnType::String => {
                    let len = read_u32(&self.values, offset).ok_or_else(|| corrupt(&self.name))?;
                    offset += 4;
                    len as usize
                }
            };
            let bytes = self
                .values
                .get(offset..offset + width)
                .ok_or_else(|| corrupt(&self.name))?;
            offset += width;

            if self.is_null(index) {
                out.push(SqlValue::Null);
                continue;
            }
            let value = match self.data_type {
                ColumnType::Int64 => SqlValue::Integer(i64::from_le_bytes(eight(bytes))),
                ColumnType::Float64 => SqlValue::Real(f64::from_le_bytes(eight(bytes))),
                ColumnType::Boolean => SqlValue::Boolean(bytes[0] != 0),
                ColumnType::String => SqlValue::Text(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|e| EngineError::Storage(format!("Invalid UTF-8: {}", e)))?,
                ),
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Check if value at index is null
    pub fn is_null(&self, index: usize) -> bool {
        if index >= self.row_count {
            return false;
        }
        let byte_idx = index / 8;
        let bit_idx = index % 8;
        if byte_idx < self.null_bitmap.len() {
            (self.null_bitmap[byte_idx] & (1 << bit_idx)) != 0
        } else {
            false
        }
    }

    fn has_nulls(&self) -> bool {
        self.null_bitmap.iter().any(|b| *b != 0)
    }

    fn ensure_null_bitmap_size(&mut self) {
        let needed_bytes = (self.row_count + 7) / 8;
        while self.null_bitmap.len() < needed_bytes {
            self.null_bitmap.push(0);
        }
    }

    fn set_null_bit(&mut self, index: usize) {
        let byte_idx = index / 8;
        let bit_idx = index % 8;
        self.null_bitmap[byte_idx] |= 1 << bit_idx;
    }

    /// Run-length encode an integer column without nulls
    pub fn compress_rle(&mut self) {
        if self.compression != CompressionType::None
            || self.data_type != ColumnType::Int64
            || self.has_nulls()
        {
            return;
        }

        let mut compressed = Vec::new();
        let mut runs = self.values.chunks_exact(8).peekable();
        while let Some(value) = runs.next() {
            let mut count = 1u32;
            while runs.peek() == Some(&value) && count < u32::MAX {
                runs.next();
                count += 1;
            }
            // Write run: count + value
            compressed.extend_from_slice(&count.to_le_bytes());
            compressed.extend_from_slice(value);
        }

        if compressed.len() < self.values.len() {
            self.values = compressed;
            self.compression = CompressionType::RLE;
        }
    }

    pub fn decompress(&mut self) -> EngineResult<()> {
        if self.compression == CompressionType::None {
            return Ok(());
        }

        let mut decompressed = Vec::with_capacity(self.row_count * 8);
        for run in self.values.chunks(12) {
            let count = read_u32(run, 0).ok_or_else(|| corrupt(&self.name))?;
            let value = run.get(4..12).ok_or_else(|| corrupt(&self.name))?;
            for _ in 0..count {
                decompressed.extend_from_slice(value);
            }
        }
        if decompressed.len() != self.row_count * 8 {
            return Err(corrupt(&self.name));
        }

        self.values = decompressed;
        self.compression = CompressionType::None;
        Ok(())
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let slice = bytes.get(offset..offset + 4)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(slice);
    Some(u32::from_le_bytes(buf))
}

fn eight(bytes: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    buf
}

/// Columnar table with ordered columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnarTable {
    pub name: String,
    pub columns: Vec<ColumnData>,
    pub row_count: usize,
}

impl ColumnarTable {
    pub fn new(name: &str, columns: &[ColumnDef]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(ColumnData::new).collect(),
            row_count: 0,
        }
    }

    pub fn defs(&self) -> Vec<ColumnDef> {
        self.columns.iter().map(ColumnData::def).collect()
    }

    /// Append a row (all columns must be present)
    pub fn append_row(&mut self, row: &[SqlValue]) -> EngineResult<()> {
        if row.len() != self.columns.len() {
            return Err(EngineError::Type(format!(
                "table {} has {} columns, got {} values",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.append(value)?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Materialize as rows
    pub fn to_table_data(&self) -> EngineResult<TableData> {
        let decoded = self
            .columns
            .iter()
            .map(ColumnData::decode_all)
            .collect::<EngineResult<Vec<_>>>()?;
        let mut rows = vec![Vec::with_capacity(self.columns.len()); self.row_count];
        for column in decoded {
            if column.len() != self.row_count {
                return Err(EngineError::Storage(format!(
                    "column lengths of {} disagree",
                    self.name
                )));
            }
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
        }
        Ok(TableData::new(self.defs(), rows))
    }

    /// Compress all columns
    pub fn compress_all(&mut self) {
        for column in &mut self.columns {
            column.compress_rle();
        }
    }
}

/// Column store managing multiple tables
pub struct ColumnStore {
    id: String,
    dir: Option<PathBuf>,
    tables: RwLock<AHashMap<String, ColumnarTable>>,
}

impl ColumnStore {
    /// Open the snapshot directory at `dir`, reusing an instance already
    /// open in this process
    pub fn open_shared(dir: &Path, create: bool) -> Result<Arc<ColumnStore>> {
        if !dir.exists() {
            if !create {
                return Err(Error::ResourceNotFound(dir.display().to_string()));
            }
            fs::create_dir_all(dir)?;
            info!(path = %dir.display(), "created columnar directory");
        }
        if !dir.is_dir() {
            return Err(Error::EngineExecution(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let canonical = fs::canonicalize(dir)?;

        let mut stores = OPEN_STORES.lock();
        if let Some(store) = stores.get(&canonical).and_then(Weak::upgrade) {
            return Ok(store);
        }

        let tables = load_snapshots(&canonical)?;
        debug!(path = %canonical.display(), tables = tables.len(), "loaded columnar snapshots");
        let store = Arc::new(ColumnStore {
            id: format!("columnar:{}", canonical.display()),
            dir: Some(canonical.clone()),
            tables: RwLock::new(tables),
        });
        stores.retain(|_, weak| weak.strong_count() > 0);
        stores.insert(canonical, Arc::downgrade(&store));
        Ok(store)
    }

    pub fn in_memory() -> Arc<ColumnStore> {
        Arc::new(ColumnStore {
            id: format!("memory:{}", uuid::Uuid::new_v4()),
            dir: None,
            tables: RwLock::new(AHashMap::new()),
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn snapshot_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{}.{}", table, SNAPSHOT_EXTENSION))
    }

    fn write_snapshot(&self, table: &ColumnarTable) -> EngineResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = Self::snapshot_path(dir, &table.name);
        let temp = dir.join(format!(".{}.{}.tmp", table.name, SNAPSHOT_EXTENSION));

        let mut encoded = table.clone();
        encoded.compress_all();
        let mut writer = BufWriter::new(File::create(&temp)?);
        serde_json::to_writer(&mut writer, &encoded)
            .map_err(|e| EngineError::Storage(format!("Failed to write snapshot: {}", e)))?;
        writer.flush()?;
        drop(writer);

        // Atomic rename
        fs::rename(&temp, &path)?;
        Ok(())
    }

    fn remove_snapshot(&self, table: &str) -> EngineResult<()> {
        match &self.dir {
            Some(dir) => {
                let path = Self::snapshot_path(dir, table);
                if path.exists() {
                    fs::remove_file(path)?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn load_snapshots(dir: &Path) -> Result<AHashMap<String, ColumnarTable>> {
    let mut tables = AHashMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
            continue;
        }
        let reader = BufReader::new(File::open(&path)?);
        let mut table: ColumnarTable = serde_json::from_reader(reader).map_err(|e| {
            Error::SerializationError(format!("Failed to parse snapshot {}: {}", path.display(), e))
        })?;
        for column in &mut table.columns {
            column
                .decompress()
                .map_err(|e| Error::SerializationError(e.to_string()))?;
        }
        tables.insert(table.name.clone(), table);
    }
    Ok(tables)
}

impl Storage for ColumnStore {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn table_columns(&self, name: &str) -> Option<Vec<ColumnDef>> {
        self.tables.read().get(name).map(ColumnarTable::defs)
    }

    fn scan(&self, name: &str) -> EngineResult<TableData> {
        self.tables
            .read()
            .get(name)
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?
            .to_table_data()
    }

    fn create_table(
        &self,
        name: &str,
        columns: Vec<ColumnDef>,
        rows: Vec<Vec<SqlValue>>,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(EngineError::TableExists(name.to_string()));
        }
        let mut table = ColumnarTable::new(name, &columns);
        for row in &rows {
            table.append_row(row)?;
        }
        self.write_snapshot(&table)?;
        tables.insert(name.to_string(), table);
        Ok(())
    }

    fn insert(&self, name: &str, rows: Vec<Vec<SqlValue>>) -> EngineResult<usize> {
        let mut tables = self.tables.write();
        let current = tables
            .get(name)
            .ok_or_else(|| EngineError::TableNotFound(name.to_string()))?;
        let mut updated = current.clone();
        for row in &rows {
            updated.append_row(row)?;
        }
        self.write_snapshot(&updated)?;
        tables.insert(name.to_string(), updated);
        Ok(rows.len())
    }

    fn drop_table(&self, name: &str) -> EngineResult<()> {
        let mut tables = self.tables.write();
        if !tables.contains_key(name) {
            return Err(EngineError::TableNotFound(name.to_string()));
        }
        self.remove_snapshot(name)?;
        tables.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn int_column() -> ColumnData {
        ColumnData::new(&ColumnDef::new("test", "BIGINT"))
    }

    #[test]
    fn test_column_data_i64() {
        let mut col = int_column();

        col.append(&SqlValue::Integer(42)).unwrap();
        col.append(&SqlValue::Null).unwrap();
        col.append(&SqlValue::Integer(100)).unwrap();

        assert_eq!(
            col.decode_all().unwrap(),
            vec![SqlValue::Integer(42), SqlValue::Null, SqlValue::Integer(100)]
        );
        assert!(col.append(&SqlValue::Text("x".into())).is_err());
    }

    #[test]
    fn test_column_data_string() {
        let mut col = ColumnData::new(&ColumnDef::new("test", "TEXT"));

        col.append(&SqlValue::Text("hello".into())).unwrap();
        col.append(&SqlValue::Null).unwrap();
        col.append(&SqlValue::Text("world".into())).unwrap();

        assert_eq!(
            col.decode_all().unwrap(),
            vec![
                SqlValue::Text("hello".into()),
                SqlValue::Null,
                SqlValue::Text("world".into())
            ]
        );
    }

    #[test]
    fn test_rle_compression() {
        let mut col = int_column();

        // Add repeated values
        for _ in 0..100 {
            col.append(&SqlValue::Integer(42)).unwrap();
        }
        for _ in 0..50 {
            col.append(&SqlValue::Integer(99)).unwrap();
        }

        let original_size = col.values.len();
        col.compress_rle();
        assert_eq!(col.compression, CompressionType::RLE);
        assert!(col.values.len() < original_size);

        let values = col.decode_all().unwrap();
        assert_eq!(values[0], SqlValue::Integer(42));
        assert_eq!(values[149], SqlValue::Integer(99));

        // Appending decompresses first
        col.append(&SqlValue::Integer(7)).unwrap();
        assert_eq!(col.compression, CompressionType::None);
        assert_eq!(col.decode_all().unwrap().len(), 151);
    }

    #[test]
    fn test_columns_with_nulls_stay_plain() {
        let mut col = int_column();
        for _ in 0..20 {
            col.append(&SqlValue::Null).unwrap();
        }
        col.compress_rle();
        assert_eq!(col.compression, CompressionType::None);
    }

    #[test]
    fn test_snapshot_directory_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        assert!(matches!(
            ColumnStore::open_shared(&path, false),
            Err(Error::ResourceNotFound(_))
        ));

        let columns = vec![
            ColumnDef::new("a", "BIGINT"),
            ColumnDef::new("b", "DOUBLE"),
            ColumnDef::new("c", "BOOLEAN"),
        ];
        {
            let store = ColumnStore::open_shared(&path, true).unwrap();
            let rows = (0..10)
                .map(|i| vec![SqlValue::Integer(1), SqlValue::Real(i as f64), SqlValue::Boolean(i % 2 == 0)])
                .collect();
            store.create_table("t", columns.clone(), rows).unwrap();
        }
        assert!(path.join("t.col").exists());

        let store = ColumnStore::open_shared(&path, false).unwrap();
        let data = store.scan("t").unwrap();
        assert_eq!(data.columns, columns);
        assert_eq!(data.rows.len(), 10);
        assert_eq!(data.rows[3][1], SqlValue::Real(3.0));

        store.drop_table("t").unwrap();
        assert!(!path.join("t.col").exists());
    }
}
