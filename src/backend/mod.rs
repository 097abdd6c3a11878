//! Backend dispatch
//!
//! A [`Backend`] owns one connection: a set of mounted storages, the
//! dialect its driver compiles for, and the trace context statements are
//! reported to. Every operation compiles an expression, reports the SQL,
//! runs it on the embedded engine and decodes the result.
//!
//! Lifecycle: `connect` → `attach`* → `close`. Once closed, every
//! operation fails with [`Error::ConnectionClosed`].

pub mod columnar;
pub mod file;

use crate::compiler::{CompiledQuery, Compiler, Dialect};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::expr::{Expr, Node, SourceId, TableExpr};
use crate::relation::Relation;
use crate::schema::{Field, Schema};
use crate::sql::{ResultSet, SqlEngine, SqlValue, Storage, StorageClass};
use crate::trace::TraceContext;
use crate::types::DataType;
use parking_lot::{Mutex, MutexGuard};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens the physical resources of one engine and names its dialect
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;

    fn dialect(&self) -> &dyn Dialect;

    /// Open (or with `create`, create) the resource at `locator`
    fn open(&self, locator: &Path, create: bool, config: &BackendConfig) -> Result<Arc<dyn Storage>>;

    /// A fresh private resource
    fn in_memory(&self) -> Arc<dyn Storage>;
}

/// Where the rows of a new table come from
#[derive(Debug, Clone)]
pub enum TableSource {
    /// Result of a relation expression, created with `CREATE TABLE … AS`
    Expr(Arc<Node>),
    /// Materialized rows, created with `CREATE TABLE` then `INSERT`
    Relation(Relation),
    /// Empty table with the given columns
    Schema(Schema),
}

impl From<TableExpr> for TableSource {
    fn from(expr: TableExpr) -> Self {
        TableSource::Expr(expr.node().clone())
    }
}

impl From<&TableExpr> for TableSource {
    fn from(expr: &TableExpr) -> Self {
        TableSource::Expr(expr.node().clone())
    }
}

impl From<Relation> for TableSource {
    fn from(relation: Relation) -> Self {
        TableSource::Relation(relation)
    }
}

impl From<Schema> for TableSource {
    fn from(schema: Schema) -> Self {
        TableSource::Schema(schema)
    }
}

struct Session {
    engine: SqlEngine,
    /// First alias each resource was mounted under, in mount order
    sources: Vec<(SourceId, String)>,
}

impl Session {
    fn new(database: &str, storage: Arc<dyn Storage>) -> Self {
        let source = SourceId::new(storage.source_id());
        Self {
            engine: SqlEngine::new(database, storage),
            sources: vec![(source, database.to_string())],
        }
    }
}

pub struct Backend<D: Driver> {
    driver: D,
    config: BackendConfig,
    trace: TraceContext,
    session: Mutex<Option<Session>>,
}

impl<D: Driver + Default> Backend<D> {
    /// Connect to the resource at `locator` with the configuration from
    /// the environment
    pub fn connect(locator: impl AsRef<Path>, create: bool) -> Result<Self> {
        Self::connect_with(locator, create, BackendConfig::from_env()?)
    }

    pub fn connect_with(
        locator: impl AsRef<Path>,
        create: bool,
        config: BackendConfig,
    ) -> Result<Self> {
        config.validate()?;
        let driver = D::default();
        let locator = locator.as_ref();
        let storage = driver.open(locator, create, &config)?;
        info!(
            backend = driver.name(),
            path = %locator.display(),
            database = %config.database_name,
            "connected"
        );
        let session = Session::new(&config.database_name, storage);
        Ok(Self::from_parts(driver, config, session))
    }

    /// Connect to a fresh private resource mounted as `main`
    pub fn in_memory() -> Result<Self> {
        let driver = D::default();
        let config = BackendConfig::from_env()?.with_database_name("main");
        let session = Session::new(&config.database_name, driver.in_memory());
        debug!(backend = driver.name(), "connected to in-memory database");
        Ok(Self::from_parts(driver, config, session))
    }
}

impl<D: Driver> Backend<D> {
    fn from_parts(driver: D, config: BackendConfig, session: Session) -> Self {
        Self {
            driver,
            config,
            trace: TraceContext::global(),
            session: Mutex::new(Some(session)),
        }
    }

    /// Report statements to `trace` instead of the global context
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }

    pub fn name(&self) -> &'static str {
        self.driver.name()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.driver.dialect()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    fn session(&self) -> Result<MutexGuard<'_, Option<Session>>> {
        let guard = self.session.lock();
        if guard.is_none() {
            return Err(Error::ConnectionClosed);
        }
        Ok(guard)
    }

    /// Mount the resource at `locator` under `alias`
    pub fn attach(&self, alias: &str, locator: impl AsRef<Path>) -> Result<()> {
        let locator = locator.as_ref();
        let mut guard = self.session()?;
        let session = guard.as_mut().ok_or(Error::ConnectionClosed)?;
        if session.engine.database(Some(alias)).is_ok() {
            return Err(Error::EngineExecution(format!(
                "database {} is already in use",
                alias
            )));
        }

        let storage = self.driver.open(locator, false, &self.config)?;
        let source = SourceId::new(storage.source_id());
        session.engine.mount(alias, storage)?;
        if !session.sources.iter().any(|(id, _)| *id == source) {
            session.sources.push((source, alias.to_string()));
        }
        info!(backend = self.driver.name(), path = %locator.display(), alias, "attached database");
        Ok(())
    }

    /// Aliases of the mounted databases, in mount order
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        Ok(session.engine.databases().map(|(name, _)| name.to_string()).collect())
    }

    /// Sorted table names of `database` (default database when None),
    /// keeping those where the regex `like` matches somewhere in the name
    pub fn list_tables(&self, database: Option<&str>, like: Option<&str>) -> Result<Vec<String>> {
        let pattern = like.map(Regex::new).transpose()?;
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        let storage = session.engine.database(database)?;
        let mut names = storage.table_names();
        if let Some(pattern) = pattern {
            names.retain(|name| pattern.is_match(name));
        }
        names.sort();
        Ok(names)
    }

    pub fn table(&self, name: &str) -> Result<TableExpr> {
        self.table_in(None, name)
    }

    /// Bound expression for `name` in `database`
    pub fn table_in(&self, database: Option<&str>, name: &str) -> Result<TableExpr> {
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        let storage = session.engine.database(database)?;
        let columns = storage.table_columns(name).ok_or_else(|| {
            Error::TableNotFound(match database {
                Some(db) => format!("{}.{}", db, name),
                None => name.to_string(),
            })
        })?;
        let fields = columns
            .iter()
            .map(|c| Field::new(c.name.clone(), declared_dtype(&c.declared_type)))
            .collect();
        let schema = Schema::new(fields)?;
        Ok(TableExpr::bound(
            name,
            schema,
            Some(SourceId::new(storage.source_id())),
        ))
    }

    /// Create `name` in the default database and return an expression for it
    pub fn create_table(&self, name: &str, source: impl Into<TableSource>) -> Result<TableExpr> {
        {
            let guard = self.session()?;
            let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
            let compiler = self.compiler(session, None);

            match source.into() {
                TableSource::Expr(node) => {
                    if !node.is_relation() {
                        return Err(Error::unsupported(
                            node.kind_name(),
                            "create_table needs a relation expression",
                        ));
                    }
                    let query = compiler.compile_create_table_as(name, &node)?;
                    self.run(session, &query)?;
                }
                TableSource::Schema(schema) => {
                    let query = compiler.compile_create_table(name, &schema)?;
                    self.run(session, &query)?;
                }
                TableSource::Relation(relation) => {
                    let create = compiler.compile_create_table(name, relation.schema())?;
                    self.run(session, &create)?;
                    if !relation.is_empty() {
                        let insert = compiler.compile_insert(name, &relation)?;
                        if let Err(e) = self.run(session, &insert) {
                            let drop = compiler.compile_drop_table(name);
                            if let Err(cleanup) = self.run(session, &drop) {
                                warn!(table = name, error = %cleanup, "failed to drop partially created table");
                            }
                            return Err(e);
                        }
                    }
                }
            }
            info!(backend = self.driver.name(), table = name, "created table");
        }
        self.table(name)
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        let query = self.compiler(session, None).compile_drop_table(name);
        self.run(session, &query)?;
        info!(backend = self.driver.name(), table = name, "dropped table");
        Ok(())
    }

    /// Run `expr` and decode the rows into its output schema
    pub fn execute(&self, expr: &impl Expr) -> Result<Relation> {
        let node = expr.node();
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        let query = self
            .compiler(session, self.config.default_limit)
            .compile(node)?;
        let result = self.run(session, &query)?;
        Relation::decode(node.output_schema(), result)
    }

    /// SQL for `expr` as this connection would name its tables, without
    /// the default row limit
    pub fn compile(&self, expr: &impl Expr) -> Result<CompiledQuery> {
        let guard = self.session()?;
        let session = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        self.compiler(session, None).compile(expr.node())
    }

    pub fn close(&self) -> Result<()> {
        let mut guard = self.session.lock();
        if guard.take().is_some() {
            debug!(backend = self.driver.name(), "connection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.session.lock().is_none()
    }

    fn compiler<'a>(&'a self, session: &Session, default_limit: Option<u64>) -> Compiler<'a> {
        Compiler::new(self.driver.dialect())
            .with_sources(session.sources.iter().cloned())
            .with_default_limit(default_limit)
    }

    fn run(&self, session: &Session, query: &CompiledQuery) -> Result<ResultSet> {
        self.trace.record(&query.sql);
        let params: Vec<SqlValue> = query.params.iter().map(SqlValue::from).collect();
        debug!(target: "tablexpr::sql", sql = %query.sql, params = ?query.params, "running statement");
        Ok(session.engine.execute(&query.sql, &params)?)
    }
}

/// Semantic type of an engine-declared column type
fn declared_dtype(declared: &str) -> DataType {
    let base = declared.split('(').next().unwrap_or(declared);
    base.parse().unwrap_or(match StorageClass::from_declared(declared) {
        StorageClass::Integer => DataType::Int64,
        StorageClass::Real => DataType::Float64,
        StorageClass::Text => DataType::String,
        StorageClass::Boolean => DataType::Boolean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_dtype() {
        assert_eq!(declared_dtype("TINYINT"), DataType::Int8);
        assert_eq!(declared_dtype("DOUBLE"), DataType::Float64);
        assert_eq!(declared_dtype("REAL"), DataType::Float32);
        assert_eq!(declared_dtype("VARCHAR(20)"), DataType::String);
        assert_eq!(declared_dtype("UNSIGNED BIG INT"), DataType::Int64);
        assert_eq!(declared_dtype("NUMERIC"), DataType::Float64);
        assert_eq!(declared_dtype("BOOL"), DataType::Boolean);
    }
}
