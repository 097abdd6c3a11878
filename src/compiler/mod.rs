//! SQL compiler
//!
//! Translates an expression tree into SQL text plus bound parameters for a
//! given [`Dialect`]. Compilation is a pure recursive descent: the same
//! tree and dialect always produce the same text and parameters, and
//! aliases restart at `t0` on every call. Errors abort the whole
//! compilation; partial SQL is never returned.

mod context;
pub mod dialect;

pub use dialect::{ColumnarDialect, Dialect, SqliteDialect};

use crate::error::{Error, Result};
use crate::expr::node::Filter;
use crate::expr::{ArithmeticOp, Node, SourceId};
use crate::relation::Relation;
use crate::schema::Schema;
use crate::types::Value;
use ahash::AHashMap;
use context::CompileContext;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const PREC_COMPARISON: u8 = 3;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_ATOM: u8 = 10;

/// SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// Compile `node` for `dialect` without database qualification or default limit
pub fn compile(node: &Arc<Node>, dialect: &dyn Dialect) -> Result<CompiledQuery> {
    Compiler::new(dialect).compile(node)
}

/// The single-table SELECT a relation chain reduces to
struct SelectPlan {
    table: Arc<Node>,
    members: Vec<Arc<Node>>,
    predicates: Vec<Arc<Node>>,
    projection: Option<Vec<Arc<Node>>>,
    limit: Option<(u64, u64)>,
}

impl SelectPlan {
    fn build(node: &Arc<Node>) -> Result<Self> {
        let mut plan = match node.as_ref() {
            Node::Table(_) => SelectPlan {
                table: node.clone(),
                members: Vec::new(),
                predicates: Vec::new(),
                projection: None,
                limit: None,
            },
            Node::Filter(filter) => {
                let mut plan = Self::build(&filter.input)?;
                if plan.limit.is_some() {
                    return Err(Error::unsupported(
                        "Filter",
                        "filtering a limited relation is not supported",
                    ));
                }
                // Chained filters are flattened; columns may still point at
                // an intermediate filter, so its prefixes are members too
                for end in 1..filter.predicates.len() {
                    plan.members.push(Arc::new(Node::Filter(Filter {
                        input: filter.input.clone(),
                        predicates: filter.predicates[..end].to_vec(),
                    })));
                }
                plan.predicates.extend(filter.predicates.iter().cloned());
                plan
            }
            Node::Projection(projection) => {
                let mut plan = Self::build(&projection.input)?;
                plan.projection = Some(projection.columns.clone());
                plan
            }
            Node::Limit(limit) => {
                let mut plan = Self::build(&limit.input)?;
                plan.limit = Some(match plan.limit {
                    Some((inner_n, inner_offset)) => (
                        limit.n.min(inner_n.saturating_sub(limit.offset)),
                        inner_offset.saturating_add(limit.offset),
                    ),
                    None => (limit.n, limit.offset),
                });
                plan
            }
            other => {
                return Err(Error::unsupported(
                    other.kind_name(),
                    "expected a relation",
                ))
            }
        };
        plan.members.push(node.clone());
        Ok(plan)
    }

    fn contains(&self, relation: &Arc<Node>) -> bool {
        self.members.iter().any(|m| m == relation)
    }
}

#[derive(Debug, Clone)]
pub struct Compiler<'d> {
    dialect: &'d dyn Dialect,
    sources: AHashMap<SourceId, String>,
    require_sources: bool,
    default_limit: Option<u64>,
}

impl<'d> Compiler<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sources: AHashMap::new(),
            require_sources: false,
            default_limit: None,
        }
    }

    /// Database aliases used to qualify tables bound to each source. Once
    /// set, a table bound to a source outside this map is rejected.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = (SourceId, String)>) -> Self {
        self.sources.extend(sources);
        self.require_sources = true;
        self
    }

    /// Row limit applied to row-producing queries without an explicit limit
    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    pub fn compile(&self, node: &Arc<Node>) -> Result<CompiledQuery> {
        let mut ctx = CompileContext::new(self.dialect);
        let sql = self.compile_select(&mut ctx, node)?;
        let query = CompiledQuery {
            sql,
            params: ctx.into_params(),
        };
        debug!(
            target: "tablexpr::compiler",
            dialect = self.dialect.name(),
            sql = %query.sql,
            params = query.params.len(),
            "compiled {}",
            node.kind_name()
        );
        Ok(query)
    }

    pub fn compile_create_table_as(&self, name: &str, node: &Arc<Node>) -> Result<CompiledQuery> {
        let mut ctx = CompileContext::new(self.dialect);
        let select = self.compile_select(&mut ctx, node)?;
        Ok(CompiledQuery {
            sql: format!(
                "CREATE TABLE {} AS\n{}",
                self.dialect.quote_identifier(name),
                select
            ),
            params: ctx.into_params(),
        })
    }

    pub fn compile_create_table(&self, name: &str, schema: &Schema) -> Result<CompiledQuery> {
        if schema.is_empty() {
            return Err(Error::unsupported(
                "CreateTable",
                format!("table {} has no columns", name),
            ));
        }
        let columns: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| {
                format!(
                    "{} {}",
                    self.dialect.quote_identifier(&f.name),
                    self.dialect.type_name(f.dtype)
                )
            })
            .collect();
        Ok(CompiledQuery {
            sql: format!(
                "CREATE TABLE {} ({})",
                self.dialect.quote_identifier(name),
                columns.join(", ")
            ),
            params: Vec::new(),
        })
    }

    pub fn compile_insert(&self, name: &str, relation: &Relation) -> Result<CompiledQuery> {
        if relation.is_empty() {
            return Err(Error::unsupported(
                "Insert",
                format!("no rows to insert into {}", name),
            ));
        }
        let mut ctx = CompileContext::new(self.dialect);
        let mut tuples = Vec::with_capacity(relation.num_rows());
        for row in relation.rows() {
            let placeholders: Vec<String> = row.iter().map(|v| ctx.bind(v.clone())).collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }
        Ok(CompiledQuery {
            sql: format!(
                "INSERT INTO {} VALUES {}",
                self.dialect.quote_identifier(name),
                tuples.join(", ")
            ),
            params: ctx.into_params(),
        })
    }

    pub fn compile_drop_table(&self, name: &str) -> CompiledQuery {
        CompiledQuery {
            sql: format!("DROP TABLE {}", self.dialect.quote_identifier(name)),
            params: Vec::new(),
        }
    }

    fn compile_select(&self, ctx: &mut CompileContext<'_>, node: &Arc<Node>) -> Result<String> {
        let plan;
        let mut row_producing = true;
        let mut from = None;
        let items = if node.is_relation() {
            plan = Some(SelectPlan::build(node)?);
            if let Some(plan) = &plan {
                from = Some(self.render_from(ctx, plan)?);
            }
            match plan.as_ref().and_then(|p| p.projection.as_ref()) {
                Some(columns) => {
                    let rendered = columns
                        .iter()
                        .map(|c| self.render(ctx, plan.as_ref(), c, 0))
                        .collect::<Result<Vec<_>>>()?;
                    rendered.join(", ")
                }
                None => "*".to_string(),
            }
        } else if let Node::Aggregate(agg) = node.as_ref() {
            let built = SelectPlan::build(&agg.input)?;
            if built.limit.is_some() {
                return Err(Error::unsupported(
                    "Aggregate",
                    "aggregating a limited relation is not supported",
                ));
            }
            from = Some(self.render_from(ctx, &built)?);
            plan = Some(built);
            row_producing = false;
            let function = self.dialect.aggregate_function(agg.function).ok_or_else(|| {
                Error::unsupported(
                    "Aggregate",
                    format!(
                        "{} is not supported by the {} dialect",
                        agg.function.name(),
                        self.dialect.name()
                    ),
                )
            })?;
            let argument = self.render(ctx, plan.as_ref(), &agg.column, 0)?;
            format!(
                "{}({}) AS {}",
                function,
                argument,
                self.dialect.quote_identifier(agg.function.name())
            )
        } else {
            plan = match node.base_relation() {
                Some(base) => Some(SelectPlan::build(&base)?),
                None => None,
            };
            if let Some(plan) = &plan {
                from = Some(self.render_from(ctx, plan)?);
            } else {
                row_producing = false;
            }
            let rendered = self.render(ctx, plan.as_ref(), node, 0)?;
            match node.as_ref() {
                Node::Column(_) => rendered,
                _ => format!("{} AS tmp", rendered),
            }
        };

        let separator = self.dialect.clause_separator();
        let mut sql = format!("SELECT {}", items);
        if let Some(from) = from {
            sql.push_str(separator);
            sql.push_str("FROM ");
            sql.push_str(&from);
        }

        let Some(plan) = plan else {
            return Ok(sql);
        };

        if !plan.predicates.is_empty() {
            let predicates = plan
                .predicates
                .iter()
                .map(|p| self.render(ctx, Some(&plan), p, 0))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(separator);
            sql.push_str("WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        let limit = match (plan.limit, self.default_limit) {
            (Some(limit), _) => Some(limit),
            (None, Some(n)) if row_producing => Some((n, 0)),
            _ => None,
        };
        if let Some((n, offset)) = limit {
            let n = ctx.bind(Value::Int64(i64::try_from(n).unwrap_or(i64::MAX)));
            let offset = ctx.bind(Value::Int64(i64::try_from(offset).unwrap_or(i64::MAX)));
            sql.push_str(self.dialect.limit_separator());
            sql.push_str(&format!("LIMIT {} OFFSET {}", n, offset));
        }
        Ok(sql)
    }

    fn render_from(&self, ctx: &mut CompileContext<'_>, plan: &SelectPlan) -> Result<String> {
        let Node::Table(table) = plan.table.as_ref() else {
            return Err(Error::unsupported(
                plan.table.kind_name(),
                "expected a table at the root of the relation",
            ));
        };
        let alias = ctx.alias_for(&plan.table);
        let name = self.dialect.quote_identifier(&table.name);
        let qualified = match table.source.as_ref() {
            Some(source) => match self.sources.get(source) {
                Some(database) => format!("{}.{}", self.dialect.quote_identifier(database), name),
                None if self.require_sources => {
                    return Err(Error::unsupported(
                        "TableRef",
                        format!(
                            "table {} is bound to {}, which this connection has not attached",
                            table.name, source
                        ),
                    ))
                }
                None => name,
            },
            None => name,
        };
        Ok(format!("{} AS {}", qualified, alias))
    }

    /// Render a value, parenthesized when its precedence is below `parent`
    fn render(
        &self,
        ctx: &mut CompileContext<'_>,
        plan: Option<&SelectPlan>,
        node: &Arc<Node>,
        parent: u8,
    ) -> Result<String> {
        let (sql, precedence) = self.render_value(ctx, plan, node)?;
        if precedence < parent {
            Ok(format!("({})", sql))
        } else {
            Ok(sql)
        }
    }

    fn render_value(
        &self,
        ctx: &mut CompileContext<'_>,
        plan: Option<&SelectPlan>,
        node: &Arc<Node>,
    ) -> Result<(String, u8)> {
        match node.as_ref() {
            Node::Column(column) => {
                let plan = plan.ok_or_else(|| {
                    Error::unsupported("ColumnRef", format!("column {} has no relation", column.name))
                })?;
                if !plan.contains(&column.table) {
                    return Err(Error::unsupported(
                        "ColumnRef",
                        format!(
                            "column {} comes from a {} over {}, which is not part of the relation queried from {}",
                            column.name,
                            column.table.kind_name(),
                            column.table.display_name(),
                            plan.table.display_name()
                        ),
                    ));
                }
                let declared = column
                    .table
                    .schema()
                    .and_then(|s| s.field(&column.name).map(|f| f.dtype));
                match declared {
                    Some(dtype) if dtype == column.dtype => {}
                    Some(dtype) => {
                        return Err(Error::unsupported(
                            "ColumnRef",
                            format!(
                                "column {} is {} in {}, referenced as {}",
                                column.name,
                                dtype,
                                column.table.display_name(),
                                column.dtype
                            ),
                        ))
                    }
                    None => {
                        return Err(Error::unsupported(
                            "ColumnRef",
                            format!(
                                "column {} does not exist in {}",
                                column.name,
                                column.table.display_name()
                            ),
                        ))
                    }
                }
                let alias = ctx.alias_for(&plan.table);
                Ok((
                    format!("{}.{}", alias, self.dialect.quote_identifier(&column.name)),
                    PREC_ATOM,
                ))
            }
            Node::Literal(literal) => Ok((ctx.bind(literal.value.clone()), PREC_ATOM)),
            Node::Comparison(cmp) => {
                // Comparisons do not chain; nested ones are always parenthesized.
                let left = self.render(ctx, plan, &cmp.left, PREC_COMPARISON + 1)?;
                let right = self.render(ctx, plan, &cmp.right, PREC_COMPARISON + 1)?;
                let op = self.dialect.comparison_operator(cmp.op);
                Ok((format!("{} {} {}", left, op, right), PREC_COMPARISON))
            }
            Node::Arithmetic(arith) => {
                let precedence = match arith.op {
                    ArithmeticOp::Add | ArithmeticOp::Sub => PREC_ADDITIVE,
                    ArithmeticOp::Mul | ArithmeticOp::Div => PREC_MULTIPLICATIVE,
                    ArithmeticOp::Pow => PREC_ATOM,
                };
                let (left_min, right_min) = match arith.op {
                    ArithmeticOp::Pow => (0, 0),
                    _ => (precedence, precedence + 1),
                };
                let left = self.render(ctx, plan, &arith.left, left_min)?;
                let right = self.render(ctx, plan, &arith.right, right_min)?;
                let sql = self
                    .dialect
                    .arithmetic(arith.op, &left, &right)
                    .ok_or_else(|| {
                        Error::unsupported(
                            "Arithmetic",
                            format!(
                                "{} is not supported by the {} dialect",
                                arith.op.name(),
                                self.dialect.name()
                            ),
                        )
                    })?;
                Ok((sql, precedence))
            }
            Node::Aggregate(_) => Err(Error::unsupported(
                "Aggregate",
                "aggregates are only supported as the whole expression",
            )),
            other => Err(Error::unsupported(
                other.kind_name(),
                "a relation cannot be used as a value",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{literal, TableExpr};

    fn alltypes() -> TableExpr {
        TableExpr::unbound(
            "functional_alltypes",
            &[
                ("id", "int32"),
                ("float_col", "float32"),
                ("double_col", "float64"),
                ("string_col", "string"),
                ("year", "int32"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_sum_of_unbound_table() {
        let t = TableExpr::unbound("t0", &[("foo", "double")]).unwrap();
        let expr = t.column("foo").unwrap().sum().unwrap();
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert_eq!(query.sql, "SELECT sum(t0.foo) AS sum \nFROM t0 AS t0");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_column_with_default_limit() {
        let t = alltypes();
        let year = t.column("year").unwrap();
        let compiler = Compiler::new(&SqliteDialect).with_default_limit(Some(10_000));
        let query = compiler.compile(year.node()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT t0.year \nFROM functional_alltypes AS t0\n LIMIT ? OFFSET ?"
        );
        assert_eq!(query.params, vec![Value::Int64(10_000), Value::Int64(0)]);
    }

    #[test]
    fn test_filter_layout_per_dialect() {
        let t = alltypes();
        let expr = t
            .filter([
                t.column("float_col").unwrap().gt(0).unwrap(),
                t.column("string_col").unwrap().ne("x").unwrap(),
            ])
            .unwrap()
            .limit(5);

        let sqlite = compile(expr.node(), &SqliteDialect).unwrap();
        assert_eq!(
            sqlite.sql,
            "SELECT * \nFROM functional_alltypes AS t0 \nWHERE t0.float_col > ? AND t0.string_col != ?\n LIMIT ? OFFSET ?"
        );
        assert_eq!(
            sqlite.params,
            vec![Value::Int64(0), Value::from("x"), Value::Int64(5), Value::Int64(0)]
        );

        let columnar = compile(expr.node(), &ColumnarDialect).unwrap();
        assert_eq!(
            columnar.sql,
            "SELECT *\nFROM functional_alltypes AS t0\nWHERE t0.float_col > $1 AND t0.string_col <> $2\nLIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_bare_literal() {
        let query = compile(literal(5).unwrap().node(), &SqliteDialect).unwrap();
        assert_eq!(query.sql, "SELECT ? AS tmp");
        assert_eq!(query.params, vec![Value::Int64(5)]);
    }

    #[test]
    fn test_precedence() {
        let t = alltypes();
        let id = t.column("id").unwrap();
        let expr = id.add(1).unwrap().mul(id.sub(2).unwrap()).unwrap();
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert_eq!(
            query.sql,
            "SELECT (t0.id + ?) * (t0.id - ?) AS tmp \nFROM functional_alltypes AS t0"
        );

        let expr = id.sub(id.sub(1).unwrap()).unwrap();
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert!(query.sql.starts_with("SELECT t0.id - (t0.id - ?) AS tmp"));

        let expr = id.mul(2).unwrap().add(1).unwrap();
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert!(query.sql.starts_with("SELECT t0.id * ? + ? AS tmp"));
    }

    #[test]
    fn test_pow_per_dialect() {
        let t = alltypes();
        let expr = t.column("double_col").unwrap().pow(2).unwrap();
        let err = compile(expr.node(), &SqliteDialect).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "Arithmetic", .. }));

        let query = compile(expr.node(), &ColumnarDialect).unwrap();
        assert_eq!(
            query.sql,
            "SELECT power(t0.double_col, $1) AS tmp\nFROM functional_alltypes AS t0"
        );
    }

    #[test]
    fn test_nested_limits_compose() {
        let t = alltypes();
        let expr = t.limit_offset(10, 5).limit_offset(3, 2);
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert_eq!(query.params, vec![Value::Int64(3), Value::Int64(7)]);

        let expr = t.limit_offset(4, 0).limit_offset(10, 2);
        let query = compile(expr.node(), &SqliteDialect).unwrap();
        assert_eq!(query.params, vec![Value::Int64(2), Value::Int64(2)]);
    }

    #[test]
    fn test_filter_over_limit_rejected() {
        let t = alltypes();
        let limited = t.limit(5);
        let pred = limited.column("id").unwrap().gt(1).unwrap();
        let expr = limited.filter([pred]).unwrap();
        let err = compile(expr.node(), &SqliteDialect).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "Filter", .. }));

        let agg = limited.column("id").unwrap().max().unwrap();
        let err = compile(agg.node(), &SqliteDialect).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "Aggregate", .. }));
    }

    #[test]
    fn test_foreign_column_rejected() {
        let t = alltypes();
        let other = TableExpr::unbound("other", &[("id", "int32")]).unwrap();
        let expr = t.filter([other.column("id").unwrap().eq(1).unwrap()]).unwrap();
        let err = compile(expr.node(), &SqliteDialect).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "ColumnRef", .. }));
    }

    #[test]
    fn test_filter_on_intermediate_filter() {
        let t = alltypes();
        let f = t.filter([t.column("id").unwrap().gt(0).unwrap()]).unwrap();
        let g = f
            .filter([
                f.column("year").unwrap().lt(2010).unwrap(),
                f.column("string_col").unwrap().ne("x").unwrap(),
            ])
            .unwrap();
        let h = g.filter([g.column("double_col").unwrap().ge(1).unwrap()]).unwrap();
        let query = compile(h.node(), &SqliteDialect).unwrap();
        assert_eq!(
            query.sql,
            "SELECT * \nFROM functional_alltypes AS t0 \nWHERE t0.id > ? AND t0.year < ? AND t0.string_col != ? AND t0.double_col >= ?"
        );

        let listed = t
            .filter([
                t.column("id").unwrap().gt(0).unwrap(),
                t.column("year").unwrap().lt(2010).unwrap(),
                t.column("string_col").unwrap().ne("x").unwrap(),
                t.column("double_col").unwrap().ge(1).unwrap(),
            ])
            .unwrap();
        assert_eq!(query, compile(listed.node(), &SqliteDialect).unwrap());

        let projected = h.select(&["id"]).unwrap();
        assert!(compile(projected.node(), &SqliteDialect).is_ok());
    }

    #[test]
    fn test_unattached_source_rejected() {
        let t = TableExpr::bound(
            "functional_alltypes",
            alltypes().schema().clone(),
            Some(SourceId::new("file:/tmp/elsewhere.db")),
        );
        let compiler = Compiler::new(&SqliteDialect)
            .with_sources([(SourceId::new("file:/tmp/x.db"), "base".to_string())]);
        let err = compiler.compile(t.node()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "TableRef", .. }));
        assert!(compiler.compile_create_table_as("copy", t.node()).is_err());

        // Without a source map the table name stays unqualified
        let query = compile(t.node(), &SqliteDialect).unwrap();
        assert_eq!(query.sql, "SELECT * \nFROM functional_alltypes AS t0");
    }

    #[test]
    fn test_hand_built_bad_column_rejected() {
        use crate::expr::node::ColumnRef;
        use crate::types::DataType;

        let t = alltypes();
        let bogus = Arc::new(Node::Column(ColumnRef {
            table: t.node().clone(),
            name: "missing".to_string(),
            dtype: DataType::Int64,
        }));
        let err = compile(&bogus, &SqliteDialect).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { kind: "ColumnRef", .. }));

        let mistyped = Arc::new(Node::Column(ColumnRef {
            table: t.node().clone(),
            name: "id".to_string(),
            dtype: DataType::String,
        }));
        assert!(compile(&mistyped, &SqliteDialect).is_err());
    }

    #[test]
    fn test_projection_and_qualification() {
        let t = TableExpr::bound(
            "functional_alltypes",
            alltypes().schema().clone(),
            Some(SourceId::new("file:/tmp/x.db")),
        );
        let expr = t.select(&["string_col", "id"]).unwrap();
        let compiler = Compiler::new(&SqliteDialect)
            .with_sources([(SourceId::new("file:/tmp/x.db"), "base".to_string())]);
        let query = compiler.compile(expr.node()).unwrap();
        assert_eq!(
            query.sql,
            "SELECT t0.string_col, t0.id \nFROM base.functional_alltypes AS t0"
        );
    }

    #[test]
    fn test_statements() {
        let compiler = Compiler::new(&SqliteDialect);
        let schema = Schema::parse([("a", "int64"), ("select", "string")]).unwrap();
        assert_eq!(
            compiler.compile_create_table("t", &schema).unwrap().sql,
            "CREATE TABLE t (a BIGINT, \"select\" TEXT)"
        );
        assert_eq!(compiler.compile_drop_table("t").sql, "DROP TABLE t");

        let relation = Relation::new(
            schema,
            vec![
                vec![Value::Int64(1), Value::from("x")],
                vec![Value::Int64(2), Value::Null],
            ],
        )
        .unwrap();
        let insert = compiler.compile_insert("t", &relation).unwrap();
        assert_eq!(insert.sql, "INSERT INTO t VALUES (?, ?), (?, ?)");
        assert_eq!(insert.params.len(), 4);

        let t = alltypes();
        let ctas = compiler.compile_create_table_as("t5", t.limit(5).node()).unwrap();
        assert_eq!(
            ctas.sql,
            "CREATE TABLE t5 AS\nSELECT * \nFROM functional_alltypes AS t0\n LIMIT ? OFFSET ?"
        );
    }
}
